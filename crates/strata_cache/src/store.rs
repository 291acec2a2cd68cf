//! Cache store: region -> compiled buffer.

use std::collections::HashMap;

use crate::compiled::CompiledRegionBuffer;
use crate::region::RegionCoord;

/// Durable mapping from region to its compiled buffer.
#[derive(Debug)]
pub struct CacheStore<H> {
    regions: HashMap<RegionCoord, CompiledRegionBuffer<H>>,
}

impl<H> CacheStore<H> {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            regions: HashMap::new(),
        }
    }

    /// True if the region has a compiled buffer.
    #[must_use]
    pub fn contains(&self, region: &RegionCoord) -> bool {
        self.regions.contains_key(region)
    }

    /// Compiled buffer for a region.
    #[must_use]
    pub fn get(&self, region: &RegionCoord) -> Option<&CompiledRegionBuffer<H>> {
        self.regions.get(region)
    }

    /// Compiled buffer for a region, created empty if absent.
    pub fn get_or_insert(&mut self, region: RegionCoord) -> &mut CompiledRegionBuffer<H> {
        self.regions.entry(region).or_default()
    }

    /// Takes a region's buffer out of the store. The caller must release it.
    pub fn remove(&mut self, region: &RegionCoord) -> Option<CompiledRegionBuffer<H>> {
        self.regions.remove(region)
    }

    /// Iterates compiled regions.
    pub fn iter(&self) -> impl Iterator<Item = (&RegionCoord, &CompiledRegionBuffer<H>)> {
        self.regions.iter()
    }

    /// Takes every buffer out of the store. The caller must release them.
    pub fn drain(&mut self) -> impl Iterator<Item = (RegionCoord, CompiledRegionBuffer<H>)> + '_ {
        self.regions.drain()
    }

    /// Number of compiled regions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.regions.len()
    }

    /// True if nothing is compiled.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }
}

impl<H> Default for CacheStore<H> {
    fn default() -> Self {
        Self::new()
    }
}
