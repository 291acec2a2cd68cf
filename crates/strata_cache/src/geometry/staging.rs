//! Staging builders.
//!
//! A [`StagingBuilder`] is the geometry sink for one region during one
//! rebuild pass. Scratch vertex storage survives `reset()` so repeated
//! rebuilds of the same region do not reallocate.

use std::collections::HashMap;

use super::layer::Layer;
use super::transform::TransformStack;
use super::vertex::{BakedVertex, OverlayCoord, PackedLight};

/// Append-only vertex accumulator for one layer.
#[derive(Debug)]
pub struct GeometryTarget {
    layer: Layer,
    vertices: Vec<BakedVertex>,
}

impl GeometryTarget {
    /// Creates an empty target reserving `capacity` vertices.
    #[must_use]
    pub fn with_capacity(layer: Layer, capacity: usize) -> Self {
        Self {
            layer,
            vertices: Vec::with_capacity(capacity),
        }
    }

    /// Layer this target feeds.
    #[inline]
    #[must_use]
    pub const fn layer(&self) -> Layer {
        self.layer
    }

    /// Appends a vertex as given.
    #[inline]
    pub fn push(&mut self, vertex: BakedVertex) {
        self.vertices.push(vertex);
    }

    /// Appends a vertex after transforming its position.
    #[inline]
    pub fn push_transformed(&mut self, transform: &TransformStack, mut vertex: BakedVertex) {
        vertex.position = transform.apply(vertex.position);
        self.vertices.push(vertex);
    }

    /// Appends a flat-colored quad; corners are transformed.
    pub fn quad(
        &mut self,
        transform: &TransformStack,
        corners: [[f32; 3]; 4],
        color: [u8; 4],
        light: PackedLight,
        overlay: OverlayCoord,
    ) {
        const UVS: [[f32; 2]; 4] = [[0.0, 0.0], [0.0, 1.0], [1.0, 1.0], [1.0, 0.0]];
        for (corner, uv) in corners.into_iter().zip(UVS) {
            let vertex = BakedVertex::colored(corner, color).with_uv(uv).lit(light, overlay);
            self.push_transformed(transform, vertex);
        }
    }

    /// Staged vertices.
    #[inline]
    #[must_use]
    pub fn vertices(&self) -> &[BakedVertex] {
        &self.vertices
    }

    /// Staged vertices as raw bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    /// Number of staged vertices.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    /// True if nothing has been staged.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Reserved scratch capacity, in vertices.
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.vertices.capacity()
    }

    /// Discards staged vertices, keeping the allocation.
    fn rewind(&mut self) {
        self.vertices.clear();
    }
}

/// Where producers write geometry, one target per layer.
pub trait GeometrySink {
    /// Returns the target for `layer`, creating it on first use.
    fn buffer(&mut self, layer: Layer) -> &mut GeometryTarget;
}

/// Per-region geometry accumulator for a rebuild pass.
#[derive(Debug)]
pub struct StagingBuilder {
    targets: HashMap<Layer, GeometryTarget>,
    /// Layers written since the last reset.
    used: Vec<Layer>,
    capacity_hint: usize,
}

impl StagingBuilder {
    /// Creates an empty builder. `capacity_hint` is reserved for layers whose
    /// descriptor declares no expected size.
    #[must_use]
    pub fn new(capacity_hint: usize) -> Self {
        Self {
            targets: HashMap::new(),
            used: Vec::new(),
            capacity_hint,
        }
    }

    /// Returns the target for `layer` and marks the layer used this pass.
    ///
    /// The first request in a pass rewinds scratch storage left over from the
    /// previous pass.
    pub fn get_buffer(&mut self, layer: Layer) -> &mut GeometryTarget {
        let first_use = !self.used.contains(&layer);
        if first_use {
            self.used.push(layer);
        }
        let hint = match layer.descriptor().expected_vertices {
            0 => self.capacity_hint,
            n => n,
        };
        let target = self
            .targets
            .entry(layer)
            .or_insert_with(|| GeometryTarget::with_capacity(layer, hint));
        if first_use {
            target.rewind();
        }
        target
    }

    /// Starts a new pass: clears used tracking and rewinds every scratch
    /// buffer without freeing it.
    pub fn reset(&mut self) {
        self.used.clear();
        for target in self.targets.values_mut() {
            target.rewind();
        }
    }

    /// Visits exactly the layers written this pass.
    pub fn for_each_used_layer<F>(&self, mut f: F)
    where
        F: FnMut(Layer, &GeometryTarget),
    {
        for layer in &self.used {
            if let Some(target) = self.targets.get(layer) {
                f(*layer, target);
            }
        }
    }

    /// Layers written this pass.
    #[must_use]
    pub fn used_layers(&self) -> &[Layer] {
        &self.used
    }

    /// True if the given layer was written this pass.
    #[must_use]
    pub fn is_used(&self, layer: Layer) -> bool {
        self.used.contains(&layer)
    }

    /// True if no layer was written this pass.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.used.is_empty()
    }

    /// Scratch targets held, used or not.
    #[must_use]
    pub fn scratch_layers(&self) -> usize {
        self.targets.len()
    }
}

impl GeometrySink for StagingBuilder {
    fn buffer(&mut self, layer: Layer) -> &mut GeometryTarget {
        self.get_buffer(layer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::layer::{BlendMode, DrawMode, LayerDescriptor, VertexFormat};

    static SOLID: LayerDescriptor = LayerDescriptor {
        name: "test_solid",
        format: VertexFormat::PositionColorTexLight,
        draw_mode: DrawMode::Triangles,
        blend: BlendMode::Opaque,
        depth_write: true,
        expected_vertices: 0,
    };

    fn tri(target: &mut GeometryTarget) {
        for p in [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]] {
            target.push(BakedVertex::colored(p, [255; 4]));
        }
    }

    #[test]
    fn test_get_buffer_marks_used() {
        let mut builder = StagingBuilder::new(16);
        assert!(builder.is_empty());
        tri(builder.get_buffer(Layer::new(&SOLID)));
        assert!(builder.is_used(Layer::new(&SOLID)));
        assert!(!builder.is_used(Layer::text_plate()));
        assert_eq!(builder.used_layers().len(), 1);
    }

    #[test]
    fn test_repeated_requests_append() {
        let mut builder = StagingBuilder::new(16);
        tri(builder.get_buffer(Layer::new(&SOLID)));
        tri(builder.get_buffer(Layer::new(&SOLID)));
        assert_eq!(builder.get_buffer(Layer::new(&SOLID)).len(), 6);
        assert_eq!(builder.used_layers().len(), 1);
    }

    #[test]
    fn test_reset_keeps_scratch_but_forgets_use() {
        let mut builder = StagingBuilder::new(16);
        tri(builder.get_buffer(Layer::new(&SOLID)));
        tri(builder.get_buffer(Layer::text_plate()));
        let capacity = builder.get_buffer(Layer::new(&SOLID)).capacity();

        builder.reset();
        assert!(builder.is_empty());
        assert_eq!(builder.scratch_layers(), 2);

        // Only the layer written in the new pass is reported.
        tri(builder.get_buffer(Layer::new(&SOLID)));
        let mut seen = Vec::new();
        builder.for_each_used_layer(|layer, target| seen.push((layer, target.len())));
        assert_eq!(seen, vec![(Layer::new(&SOLID), 3)]);
        assert_eq!(builder.get_buffer(Layer::new(&SOLID)).capacity(), capacity);
    }

    #[test]
    fn test_capacity_hint_and_descriptor_size() {
        let mut builder = StagingBuilder::new(100);
        assert!(builder.get_buffer(Layer::new(&SOLID)).capacity() >= 100);
        assert!(builder.get_buffer(Layer::text_plate()).capacity() >= 64);
    }

    #[test]
    fn test_quad_applies_transform() {
        let mut builder = StagingBuilder::new(16);
        let transform = TransformStack::translated([10.0, 64.0, 10.0]);
        builder.get_buffer(Layer::text_plate()).quad(
            &transform,
            [[0.0, 0.0, 0.0], [0.0, 1.0, 0.0], [1.0, 1.0, 0.0], [1.0, 0.0, 0.0]],
            [0, 0, 0, 128],
            PackedLight::FULL_BRIGHT,
            OverlayCoord::DEFAULT,
        );
        let target = builder.get_buffer(Layer::text_plate());
        assert_eq!(target.len(), 4);
        assert_eq!(target.vertices()[2].position, [11.0, 65.0, 10.0]);
        assert_eq!(target.as_bytes().len(), 4 * 32);
    }
}
