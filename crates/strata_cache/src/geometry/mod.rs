//! Geometry staging.
//!
//! Layers, the baked vertex format, the transform stack given to producers
//! and the per-region staging builder they write into.

mod layer;
mod staging;
mod transform;
mod vertex;

pub use layer::{BlendMode, DrawMode, Layer, LayerDescriptor, VertexFormat, TEXT_PLATE};
pub use staging::{GeometrySink, GeometryTarget, StagingBuilder};
pub use transform::TransformStack;
pub use vertex::{BakedVertex, OverlayCoord, PackedLight};
