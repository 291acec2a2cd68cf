//! Region addressing.
//!
//! World space is partitioned into square columns of `2^region_shift`
//! units. A region is the unit of caching, rebuilding and eviction.

mod addressing;
mod coord;

pub use addressing::RegionAddressing;
pub use coord::{ChunkCoord, LocalOffset, RegionCoord, WorldPos};
