//! Render layers.
//!
//! A layer names one pipeline configuration: vertex format, primitive
//! topology, blending and depth writes. Producers declare layers as statics;
//! the cache only uses them as keys and hands them to the backend.

use std::fmt;
use std::hash::{Hash, Hasher};

/// Vertex attributes a layer's pipeline consumes from [`BakedVertex`](super::BakedVertex).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VertexFormat {
    /// Position and color.
    PositionColor,
    /// Position, color, uv and light.
    PositionColorTexLight,
    /// Position, color, uv, light and overlay.
    PositionColorTexLightOverlay,
}

/// Primitive topology.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DrawMode {
    /// Independent triangles.
    Triangles,
    /// Independent quads, four vertices each.
    Quads,
    /// Line segments.
    Lines,
}

/// Color blending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlendMode {
    /// No blending.
    Opaque,
    /// Standard alpha blending.
    Translucent,
    /// Additive blending.
    Additive,
}

/// Static description of a render layer.
#[derive(Debug, PartialEq, Eq)]
pub struct LayerDescriptor {
    /// Unique name; layer identity.
    pub name: &'static str,
    /// Vertex attributes.
    pub format: VertexFormat,
    /// Primitive topology.
    pub draw_mode: DrawMode,
    /// Blending.
    pub blend: BlendMode,
    /// Whether the layer writes depth.
    pub depth_write: bool,
    /// Vertices reserved when a builder first sees this layer. Zero defers to
    /// the configured hint.
    pub expected_vertices: usize,
}

/// Text plates and other flat translucent quads.
///
/// Writes color only, so plates never occlude what is behind them.
pub static TEXT_PLATE: LayerDescriptor = LayerDescriptor {
    name: "text_plate",
    format: VertexFormat::PositionColor,
    draw_mode: DrawMode::Quads,
    blend: BlendMode::Translucent,
    depth_write: false,
    expected_vertices: 64,
};

/// Layer identifier handed around by value.
#[derive(Clone, Copy)]
pub struct Layer(&'static LayerDescriptor);

impl Layer {
    /// Wraps a static descriptor.
    #[inline]
    #[must_use]
    pub const fn new(descriptor: &'static LayerDescriptor) -> Self {
        Self(descriptor)
    }

    /// The [`TEXT_PLATE`] layer.
    #[must_use]
    pub const fn text_plate() -> Self {
        Self(&TEXT_PLATE)
    }

    /// Layer name.
    #[inline]
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.0.name
    }

    /// Full descriptor.
    #[inline]
    #[must_use]
    pub const fn descriptor(&self) -> &'static LayerDescriptor {
        self.0
    }
}

impl PartialEq for Layer {
    fn eq(&self, other: &Self) -> bool {
        self.0.name == other.0.name
    }
}

impl Eq for Layer {}

impl Hash for Layer {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.name.hash(state);
    }
}

impl fmt::Debug for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Layer").field(&self.0.name).finish()
    }
}

impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0.name)
    }
}
