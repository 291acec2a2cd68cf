//! Cache configuration.
//!
//! Loaded once at startup from TOML. Every field is optional; missing fields
//! take the defaults below.
//!
//! ```toml
//! region_shift = 5      # 32-unit regions
//! chunk_shift = 4       # 16-unit storage chunks, so 2x2 chunks per region
//! view_radius = 3       # Chebyshev radius in regions
//! baseline_y = 0
//! builder_capacity_hint = 256
//! ```

use std::path::Path;

use serde::Deserialize;

use crate::error::{CacheError, CacheResult};

/// Largest accepted region exponent. Keeps `origin()` well inside `i32`.
pub const MAX_REGION_SHIFT: u32 = 24;

/// Configuration for a [`RegionCache`](crate::RegionCache).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CacheConfig {
    /// Region edge length is `2^region_shift` world units.
    pub region_shift: u32,
    /// Storage chunk edge length is `2^chunk_shift` world units.
    pub chunk_shift: u32,
    /// Chebyshev view radius, in regions.
    pub view_radius: i32,
    /// Vertical coordinate of every region origin.
    pub baseline_y: i32,
    /// Scratch vertices reserved for a layer that declares no expected size.
    pub builder_capacity_hint: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            region_shift: 5,
            chunk_shift: 4,
            view_radius: 3,
            baseline_y: 0,
            builder_capacity_hint: 256,
        }
    }
}

impl CacheConfig {
    /// Parses and validates a configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::ConfigParse`] for malformed TOML or unknown
    /// keys, and [`CacheError::InvalidConfig`] for out-of-range values.
    pub fn from_toml_str(text: &str) -> CacheResult<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::ConfigIo`] if the file cannot be read, otherwise
    /// the same errors as [`CacheConfig::from_toml_str`].
    pub fn load<P: AsRef<Path>>(path: P) -> CacheResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Checks value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::InvalidConfig`] naming the first bad field.
    pub fn validate(&self) -> CacheResult<()> {
        if self.region_shift > MAX_REGION_SHIFT {
            return Err(CacheError::InvalidConfig {
                field: "region_shift",
                reason: format!("{} exceeds maximum {MAX_REGION_SHIFT}", self.region_shift),
            });
        }
        if self.chunk_shift > self.region_shift {
            return Err(CacheError::InvalidConfig {
                field: "chunk_shift",
                reason: format!(
                    "chunks ({}) cannot be larger than regions ({})",
                    self.chunk_shift, self.region_shift
                ),
            });
        }
        if self.view_radius < 0 {
            return Err(CacheError::InvalidConfig {
                field: "view_radius",
                reason: format!("{} is negative", self.view_radius),
            });
        }
        Ok(())
    }

    /// Number of storage chunks along one edge of a region.
    #[must_use]
    pub const fn chunks_per_region_axis(&self) -> i32 {
        1 << (self.region_shift - self.chunk_shift)
    }
}
