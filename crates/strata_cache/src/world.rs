//! World storage seam.
//!
//! The cache does not own world data. During a rebuild it asks the bound
//! [`WorldStorage`] for the producers in each of a region's chunks and for
//! the light at each producer.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::geometry::PackedLight;
use crate::producer::Producer;
use crate::region::{ChunkCoord, WorldPos};

/// Read access to the currently loaded world.
pub trait WorldStorage {
    /// Visits every producer stored in `chunk`.
    fn for_each_producer_in_chunk(&self, chunk: ChunkCoord, visit: &mut dyn FnMut(&dyn Producer));

    /// Light at a world position. Storage without lighting data reports
    /// full brightness.
    fn light_at(&self, pos: WorldPos) -> PackedLight {
        let _ = pos;
        PackedLight::FULL_BRIGHT
    }
}

/// In-memory world for tests and benchmarks.
///
/// Producers are bucketed by storage chunk. Interior locking lets a test
/// keep mutating the world after handing an `Arc` of it to the cache.
pub struct MockWorld {
    chunk_shift: u32,
    chunks: RwLock<HashMap<ChunkCoord, Vec<Arc<dyn Producer>>>>,
    lights: RwLock<HashMap<WorldPos, PackedLight>>,
}

impl MockWorld {
    /// Creates an empty world with `2^chunk_shift` chunks.
    #[must_use]
    pub fn new(chunk_shift: u32) -> Self {
        Self {
            chunk_shift,
            chunks: RwLock::new(HashMap::new()),
            lights: RwLock::new(HashMap::new()),
        }
    }

    /// Adds a producer to the chunk containing its position.
    pub fn insert(&self, producer: Arc<dyn Producer>) {
        let chunk = ChunkCoord::containing(producer.position(), self.chunk_shift);
        self.chunks.write().entry(chunk).or_default().push(producer);
    }

    /// Removes every producer at `pos`. Returns how many were removed.
    pub fn remove_at(&self, pos: WorldPos) -> usize {
        let chunk = ChunkCoord::containing(pos, self.chunk_shift);
        let mut chunks = self.chunks.write();
        let Some(list) = chunks.get_mut(&chunk) else {
            return 0;
        };
        let before = list.len();
        list.retain(|p| p.position() != pos);
        let removed = before - list.len();
        if list.is_empty() {
            chunks.remove(&chunk);
        }
        removed
    }

    /// Overrides the light reported at `pos`.
    pub fn set_light(&self, pos: WorldPos, light: PackedLight) {
        self.lights.write().insert(pos, light);
    }

    /// Total producers stored.
    #[must_use]
    pub fn producer_count(&self) -> usize {
        self.chunks.read().values().map(Vec::len).sum()
    }
}

impl WorldStorage for MockWorld {
    fn for_each_producer_in_chunk(&self, chunk: ChunkCoord, visit: &mut dyn FnMut(&dyn Producer)) {
        // Snapshot so a producer may touch the world while being visited.
        let producers: Vec<Arc<dyn Producer>> = match self.chunks.read().get(&chunk) {
            Some(list) => list.clone(),
            None => return,
        };
        for producer in &producers {
            visit(producer.as_ref());
        }
    }

    fn light_at(&self, pos: WorldPos) -> PackedLight {
        self.lights.read().get(&pos).copied().unwrap_or(PackedLight::FULL_BRIGHT)
    }
}
