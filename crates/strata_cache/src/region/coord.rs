//! Coordinate types.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Discrete world position, in base units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WorldPos {
    /// X coordinate.
    pub x: i32,
    /// Y coordinate (vertical).
    pub y: i32,
    /// Z coordinate.
    pub z: i32,
}

impl WorldPos {
    /// Creates a new world position.
    #[inline]
    #[must_use]
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }
}

impl fmt::Display for WorldPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}, {}]", self.x, self.y, self.z)
    }
}

/// Position of a producer relative to its region's minimum corner.
///
/// X and Z lie in `0..region_size`; Y is carried through unchanged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LocalOffset {
    /// X offset inside the region.
    pub x: i32,
    /// Absolute Y.
    pub y: i32,
    /// Z offset inside the region.
    pub z: i32,
}

impl LocalOffset {
    /// Offset as a float translation.
    #[inline]
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn to_f32(self) -> [f32; 3] {
        [self.x as f32, self.y as f32, self.z as f32]
    }
}

/// Storage chunk coordinate (horizontal only).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChunkCoord {
    /// Chunk X.
    pub x: i32,
    /// Chunk Z.
    pub z: i32,
}

impl ChunkCoord {
    /// Creates a new chunk coordinate.
    #[inline]
    #[must_use]
    pub const fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// Chunk containing a world position.
    #[inline]
    #[must_use]
    pub const fn containing(pos: WorldPos, chunk_shift: u32) -> Self {
        Self::new(pos.x >> chunk_shift, pos.z >> chunk_shift)
    }
}

/// Coordinate of one square region of world space.
///
/// Identity is `(x, z)`. The origin is memoized at construction and is
/// ignored by equality, hashing and ordering.
#[derive(Debug, Clone, Copy)]
pub struct RegionCoord {
    x: i32,
    z: i32,
    origin: WorldPos,
}

impl RegionCoord {
    /// Creates a region coordinate, deriving its origin.
    #[inline]
    #[must_use]
    pub const fn new(x: i32, z: i32, region_shift: u32, baseline_y: i32) -> Self {
        Self {
            x,
            z,
            origin: WorldPos::new(x << region_shift, baseline_y, z << region_shift),
        }
    }

    /// Region X.
    #[inline]
    #[must_use]
    pub const fn x(&self) -> i32 {
        self.x
    }

    /// Region Z.
    #[inline]
    #[must_use]
    pub const fn z(&self) -> i32 {
        self.z
    }

    /// World position of the region's minimum corner.
    #[inline]
    #[must_use]
    pub const fn origin(&self) -> WorldPos {
        self.origin
    }

    /// Max-axis distance to another region, in regions.
    #[inline]
    #[must_use]
    pub fn chebyshev_distance(&self, other: &Self) -> i32 {
        (self.x - other.x).abs().max((self.z - other.z).abs())
    }
}

impl PartialEq for RegionCoord {
    fn eq(&self, other: &Self) -> bool {
        self.x == other.x && self.z == other.z
    }
}

impl Eq for RegionCoord {}

impl Hash for RegionCoord {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.x.hash(state);
        self.z.hash(state);
    }
}

impl PartialOrd for RegionCoord {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for RegionCoord {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.x, self.z).cmp(&(other.x, other.z))
    }
}

impl fmt::Display for RegionCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.z)
    }
}
