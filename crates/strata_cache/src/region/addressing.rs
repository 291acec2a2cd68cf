//! World position <-> region mapping.
//!
//! Pure arithmetic on shifts and masks. Overflow at extreme coordinates is
//! not handled.

use super::coord::{ChunkCoord, LocalOffset, RegionCoord, WorldPos};
use crate::config::CacheConfig;

/// Stateless mapping between world positions, regions and storage chunks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegionAddressing {
    region_shift: u32,
    chunk_shift: u32,
    baseline_y: i32,
}

impl RegionAddressing {
    /// Creates an addressing scheme.
    ///
    /// `chunk_shift` must not exceed `region_shift`; [`CacheConfig::validate`]
    /// enforces this for configured caches. Debug builds assert it here;
    /// release builds treat a larger `chunk_shift` as one chunk per region.
    #[must_use]
    pub const fn new(region_shift: u32, chunk_shift: u32, baseline_y: i32) -> Self {
        debug_assert!(chunk_shift <= region_shift, "chunk_shift exceeds region_shift");
        Self {
            region_shift,
            chunk_shift,
            baseline_y,
        }
    }

    /// Addressing scheme described by a configuration.
    #[must_use]
    pub const fn from_config(config: &CacheConfig) -> Self {
        Self::new(config.region_shift, config.chunk_shift, config.baseline_y)
    }

    /// Region edge length in world units.
    #[inline]
    #[must_use]
    pub const fn region_size(&self) -> i32 {
        1 << self.region_shift
    }

    /// Region exponent.
    #[inline]
    #[must_use]
    pub const fn region_shift(&self) -> u32 {
        self.region_shift
    }

    /// Region containing a world position.
    #[inline]
    #[must_use]
    pub const fn to_region(&self, pos: WorldPos) -> RegionCoord {
        self.region(pos.x >> self.region_shift, pos.z >> self.region_shift)
    }

    /// Region containing a continuous camera position.
    ///
    /// Floors before shifting so that `-0.5` lands in region `-1`.
    #[inline]
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn region_of_camera(&self, camera: [f64; 3]) -> RegionCoord {
        let x = camera[0].floor() as i32;
        let z = camera[2].floor() as i32;
        self.region(x >> self.region_shift, z >> self.region_shift)
    }

    /// Region at explicit region coordinates.
    #[inline]
    #[must_use]
    pub const fn region(&self, x: i32, z: i32) -> RegionCoord {
        RegionCoord::new(x, z, self.region_shift, self.baseline_y)
    }

    /// Minimum corner of a region.
    #[inline]
    #[must_use]
    pub const fn origin(&self, region: RegionCoord) -> WorldPos {
        region.origin()
    }

    /// Position inside its region's local frame.
    #[inline]
    #[must_use]
    pub const fn local_offset(&self, pos: WorldPos) -> LocalOffset {
        let mask = self.region_size() - 1;
        LocalOffset {
            x: pos.x & mask,
            y: pos.y,
            z: pos.z & mask,
        }
    }

    /// Storage chunks covered by a region, row by row.
    pub fn chunks(&self, region: RegionCoord) -> impl Iterator<Item = ChunkCoord> {
        let span = self.region_shift.saturating_sub(self.chunk_shift);
        let (x0, z0) = (region.x() << span, region.z() << span);
        let (x1, z1) = ((region.x() + 1) << span, (region.z() + 1) << span);
        (x0..x1).flat_map(move |cx| (z0..z1).map(move |cz| ChunkCoord::new(cx, cz)))
    }
}

impl Default for RegionAddressing {
    fn default() -> Self {
        Self::from_config(&CacheConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addressing() -> RegionAddressing {
        RegionAddressing::new(5, 4, 0)
    }

    #[test]
    fn test_to_region() {
        let a = addressing();
        assert_eq!(a.to_region(WorldPos::new(10, 64, 10)), a.region(0, 0));
        assert_eq!(a.to_region(WorldPos::new(31, 0, 32)), a.region(0, 1));
        assert_eq!(a.to_region(WorldPos::new(-1, 0, -33)), a.region(-1, -2));
    }

    #[test]
    fn test_origin_is_minimum_corner() {
        let a = addressing();
        for pos in [WorldPos::new(10, 64, 10), WorldPos::new(-5, 7, 70), WorldPos::new(-64, 0, -1)] {
            let region = a.to_region(pos);
            let origin = a.origin(region);
            assert!(origin.x <= pos.x && pos.x < origin.x + a.region_size());
            assert!(origin.z <= pos.z && pos.z < origin.z + a.region_size());
            assert_eq!(origin.y, 0);
        }
    }

    #[test]
    fn test_local_offset_reconstructs_position() {
        let a = addressing();
        for pos in [WorldPos::new(10, 64, 10), WorldPos::new(-5, 7, 70), WorldPos::new(-33, -4, 31)] {
            let origin = a.origin(a.to_region(pos));
            let local = a.local_offset(pos);
            assert!((0..32).contains(&local.x));
            assert!((0..32).contains(&local.z));
            assert_eq!(origin.x + local.x, pos.x);
            assert_eq!(origin.z + local.z, pos.z);
            assert_eq!(local.y, pos.y);
        }
    }

    #[test]
    fn test_camera_region_floors() {
        let a = addressing();
        assert_eq!(a.region_of_camera([-0.5, 70.0, 0.5]), a.region(-1, 0));
        assert_eq!(a.region_of_camera([320.9, 0.0, 320.0]), a.region(10, 10));
    }

    #[test]
    fn test_region_chunks() {
        let a = addressing();
        let chunks: Vec<_> = a.chunks(a.region(-1, 3)).collect();
        assert_eq!(
            chunks,
            vec![
                ChunkCoord::new(-2, 6),
                ChunkCoord::new(-2, 7),
                ChunkCoord::new(-1, 6),
                ChunkCoord::new(-1, 7),
            ]
        );
    }

    #[test]
    fn test_single_chunk_regions() {
        let a = RegionAddressing::new(4, 4, 0);
        let chunks: Vec<_> = a.chunks(a.region(2, 2)).collect();
        assert_eq!(chunks, vec![ChunkCoord::new(2, 2)]);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "chunk_shift exceeds region_shift")]
    fn test_chunks_larger_than_regions_rejected() {
        let _ = RegionAddressing::new(4, 5, 0);
    }
}
