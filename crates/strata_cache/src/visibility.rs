//! Visibility policy.
//!
//! One predicate decides rebuild eligibility, draw eligibility and eviction.
//! The coordinator takes a [`ViewWindow`] snapshot once per frame and asks it
//! about every region, so the three decisions can never disagree within a
//! frame.

use crate::region::{RegionAddressing, RegionCoord};

/// Chebyshev view radius around the camera's region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisibilityPolicy {
    addressing: RegionAddressing,
    view_radius: i32,
}

impl VisibilityPolicy {
    /// Creates a policy.
    #[must_use]
    pub const fn new(addressing: RegionAddressing, view_radius: i32) -> Self {
        Self {
            addressing,
            view_radius,
        }
    }

    /// View radius, in regions.
    #[must_use]
    pub const fn view_radius(&self) -> i32 {
        self.view_radius
    }

    /// True if `region` is within the view radius of the camera's region.
    #[must_use]
    pub fn is_visible(&self, region: RegionCoord, camera: [f64; 3]) -> bool {
        self.window(camera).contains(region)
    }

    /// Per-frame snapshot of the policy for a camera position.
    #[must_use]
    pub fn window(&self, camera: [f64; 3]) -> ViewWindow {
        ViewWindow {
            center: self.addressing.region_of_camera(camera),
            radius: self.view_radius,
        }
    }
}

/// Visibility evaluated against one camera position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewWindow {
    center: RegionCoord,
    radius: i32,
}

impl ViewWindow {
    /// Region the camera is in.
    #[must_use]
    pub const fn center(&self) -> RegionCoord {
        self.center
    }

    /// True if `region` is in view.
    #[inline]
    #[must_use]
    pub fn contains(&self, region: RegionCoord) -> bool {
        self.center.chebyshev_distance(&region) <= self.radius
    }
}
