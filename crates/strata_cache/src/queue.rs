//! Rebuild queue.

use std::collections::HashSet;

use crate::region::RegionCoord;

/// Deduplicated set of regions awaiting a rebuild pass.
#[derive(Debug, Default)]
pub struct RebuildQueue {
    pending: HashSet<RegionCoord>,
}

impl RebuildQueue {
    /// Creates an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a region. Returns false if it was already queued.
    pub fn insert(&mut self, region: RegionCoord) -> bool {
        self.pending.insert(region)
    }

    /// Removes a region. Returns false if it was not queued.
    pub fn remove(&mut self, region: &RegionCoord) -> bool {
        self.pending.remove(region)
    }

    /// True if the region is queued.
    #[must_use]
    pub fn contains(&self, region: &RegionCoord) -> bool {
        self.pending.contains(region)
    }

    /// Queued regions accepted by `filter`, sorted for a stable rebuild
    /// order. The queue itself is not modified.
    #[must_use]
    pub fn eligible<F>(&self, mut filter: F) -> Vec<RegionCoord>
    where
        F: FnMut(&RegionCoord) -> bool,
    {
        let mut regions: Vec<_> = self.pending.iter().filter(|r| filter(*r)).copied().collect();
        regions.sort_unstable();
        regions
    }

    /// Iterates queued regions in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = &RegionCoord> {
        self.pending.iter()
    }

    /// Number of queued regions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// True if nothing is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Empties the queue.
    pub fn clear(&mut self) {
        self.pending.clear();
    }
}
