//! Baked vertex format.

use bytemuck::{Pod, Zeroable};

/// Packed block/sky light, as sampled from the world at bake time.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Pod, Zeroable)]
pub struct PackedLight(pub u32);

impl PackedLight {
    /// Maximum block and sky light.
    pub const FULL_BRIGHT: Self = Self::pack(15, 15);

    /// Packs block and sky light levels (0-15 each).
    #[inline]
    #[must_use]
    pub const fn pack(block: u8, sky: u8) -> Self {
        Self(((block as u32 & 0xF) << 4) | ((sky as u32 & 0xF) << 20))
    }

    /// Block light level.
    #[inline]
    #[must_use]
    pub const fn block(self) -> u8 {
        ((self.0 >> 4) & 0xF) as u8
    }

    /// Sky light level.
    #[inline]
    #[must_use]
    pub const fn sky(self) -> u8 {
        ((self.0 >> 20) & 0xF) as u8
    }
}

/// Packed overlay texture coordinate (hurt flash, highlight).
#[repr(transparent)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Pod, Zeroable)]
pub struct OverlayCoord(pub u32);

impl OverlayCoord {
    /// No overlay.
    pub const DEFAULT: Self = Self::pack(0, 10);

    /// Packs overlay u/v.
    #[inline]
    #[must_use]
    pub const fn pack(u: u16, v: u16) -> Self {
        Self(u as u32 | ((v as u32) << 16))
    }
}

/// One vertex of baked geometry.
///
/// 32 bytes, no padding, so a staged buffer casts directly to bytes.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct BakedVertex {
    /// Region-local position.
    pub position: [f32; 3],
    /// RGBA color.
    pub color: [u8; 4],
    /// Texture coordinate.
    pub uv: [f32; 2],
    /// Packed light.
    pub light: PackedLight,
    /// Packed overlay.
    pub overlay: OverlayCoord,
}

impl BakedVertex {
    /// Creates a colored vertex with no texture, full light and no overlay.
    #[inline]
    #[must_use]
    pub const fn colored(position: [f32; 3], color: [u8; 4]) -> Self {
        Self {
            position,
            color,
            uv: [0.0, 0.0],
            light: PackedLight::FULL_BRIGHT,
            overlay: OverlayCoord::DEFAULT,
        }
    }

    /// Sets the texture coordinate.
    #[inline]
    #[must_use]
    pub const fn with_uv(mut self, uv: [f32; 2]) -> Self {
        self.uv = uv;
        self
    }

    /// Sets light and overlay.
    #[inline]
    #[must_use]
    pub const fn lit(mut self, light: PackedLight, overlay: OverlayCoord) -> Self {
        self.light = light;
        self.overlay = overlay;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vertex_is_tightly_packed() {
        assert_eq!(std::mem::size_of::<BakedVertex>(), 32);
        let verts = [BakedVertex::default(); 3];
        assert_eq!(bytemuck::cast_slice::<_, u8>(&verts).len(), 96);
    }

    #[test]
    fn test_light_packing() {
        assert_eq!(PackedLight::FULL_BRIGHT.0, 0x00F0_00F0);
        let light = PackedLight::pack(7, 12);
        assert_eq!(light.block(), 7);
        assert_eq!(light.sky(), 12);
    }

    #[test]
    fn test_default_overlay() {
        assert_eq!(OverlayCoord::DEFAULT.0, 10 << 16);
    }
}
