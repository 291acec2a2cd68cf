//! Producer-facing intent buffer.
//!
//! During the tick phase producers only record intent: "build my region if
//! it is not built" (activate) or "rebuild my region" (invalidate). The
//! coordinator drains the buffer when the build-then-draw phase starts.
//! Repeated signals for the same region collapse to one.

use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::region::{RegionAddressing, RegionCoord, WorldPos};

#[derive(Debug, Default)]
struct PendingSignals {
    activations: HashSet<RegionCoord>,
    invalidations: HashSet<RegionCoord>,
}

/// Signals drained for one frame.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct SignalBatch {
    /// Regions to build if not already compiled, sorted.
    pub activations: Vec<RegionCoord>,
    /// Regions to rebuild unconditionally, sorted.
    pub invalidations: Vec<RegionCoord>,
}

/// Cloneable handle producers use to signal the cache.
#[derive(Debug, Clone)]
pub struct CacheSignals {
    addressing: RegionAddressing,
    pending: Arc<Mutex<PendingSignals>>,
}

impl CacheSignals {
    /// Creates an empty signal buffer.
    #[must_use]
    pub fn new(addressing: RegionAddressing) -> Self {
        Self {
            addressing,
            pending: Arc::new(Mutex::new(PendingSignals::default())),
        }
    }

    /// Requests a build of the region owning `pos` if it has no compiled
    /// buffer. Safe to call every frame.
    pub fn activate(&self, pos: WorldPos) {
        let region = self.addressing.to_region(pos);
        self.pending.lock().activations.insert(region);
    }

    /// Requests a rebuild of the region owning `pos`.
    ///
    /// Forces a full re-bake of the region on the next eligible frame; call
    /// only when static geometry actually changed.
    pub fn invalidate(&self, pos: WorldPos) {
        let region = self.addressing.to_region(pos);
        self.pending.lock().invalidations.insert(region);
    }

    /// Number of distinct pending signals.
    #[must_use]
    pub fn pending(&self) -> usize {
        let pending = self.pending.lock();
        pending.activations.len() + pending.invalidations.len()
    }

    /// Takes every pending signal.
    #[must_use]
    pub fn drain(&self) -> SignalBatch {
        let mut pending = self.pending.lock();
        let mut activations: Vec<_> = pending.activations.drain().collect();
        let mut invalidations: Vec<_> = pending.invalidations.drain().collect();
        drop(pending);
        activations.sort_unstable();
        invalidations.sort_unstable();
        SignalBatch {
            activations,
            invalidations,
        }
    }

    /// Discards every pending signal.
    pub fn clear(&self) {
        let mut pending = self.pending.lock();
        pending.activations.clear();
        pending.invalidations.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signals_collapse_per_region() {
        let a = RegionAddressing::new(5, 4, 0);
        let signals = CacheSignals::new(a);
        for _ in 0..10 {
            signals.activate(WorldPos::new(10, 64, 10));
            signals.activate(WorldPos::new(20, 0, 3));
        }
        signals.invalidate(WorldPos::new(40, 0, 0));
        assert_eq!(signals.pending(), 2);

        let batch = signals.drain();
        assert_eq!(batch.activations, vec![a.region(0, 0)]);
        assert_eq!(batch.invalidations, vec![a.region(1, 0)]);
        assert_eq!(signals.pending(), 0);
    }

    #[test]
    fn test_clones_share_buffer_across_threads() {
        let signals = CacheSignals::new(RegionAddressing::default());
        let producer_side = signals.clone();
        std::thread::spawn(move || producer_side.invalidate(WorldPos::new(-1, 0, -1)))
            .join()
            .unwrap();
        assert_eq!(signals.pending(), 1);
        signals.clear();
        assert_eq!(signals.drain(), SignalBatch::default());
    }
}
