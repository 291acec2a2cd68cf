//! Compiled region buffers.
//!
//! The GPU-resident result of a rebuild: one backend handle per layer that
//! received geometry in the most recent pass.

use std::collections::HashMap;

use crate::backend::GraphicsBackend;
use crate::geometry::{Layer, StagingBuilder};

/// One uploaded layer.
#[derive(Debug)]
pub struct CompiledLayer<H> {
    handle: H,
    vertex_count: usize,
}

impl<H> CompiledLayer<H> {
    /// Backend handle.
    #[must_use]
    pub fn handle(&self) -> &H {
        &self.handle
    }

    /// Vertices uploaded.
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.vertex_count
    }
}

/// Counts from one [`CompiledRegionBuffer::upload_from`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UploadOutcome {
    /// Layers uploaded.
    pub uploaded: u32,
    /// Layers the backend rejected.
    pub failed: u32,
    /// Layers released because this pass left them empty or unused.
    pub dropped: u32,
}

/// Per-region set of uploaded layers.
///
/// Invariant: a layer is present only if the latest upload staged
/// non-empty geometry for it.
#[derive(Debug)]
pub struct CompiledRegionBuffer<H> {
    layers: HashMap<Layer, CompiledLayer<H>>,
}

impl<H> CompiledRegionBuffer<H> {
    /// Creates a buffer with no layers.
    #[must_use]
    pub fn new() -> Self {
        Self {
            layers: HashMap::new(),
        }
    }

    /// Replaces this buffer's contents with the builder's used layers.
    ///
    /// Each used, non-empty layer is uploaded, reusing the previous handle
    /// for that layer when one exists. Layers from the previous compile that
    /// were not written this pass, or were written but left empty, are
    /// released. A rejected layer is logged and left out.
    pub fn upload_from<B>(&mut self, builder: &StagingBuilder, backend: &mut B) -> UploadOutcome
    where
        B: GraphicsBackend<Handle = H>,
    {
        let mut outcome = UploadOutcome::default();
        let mut next = HashMap::with_capacity(builder.used_layers().len());

        builder.for_each_used_layer(|layer, target| {
            let previous = self.layers.remove(&layer).map(|compiled| compiled.handle);
            if target.is_empty() {
                if let Some(handle) = previous {
                    backend.release(handle);
                    outcome.dropped += 1;
                }
                return;
            }
            // TODO: sort translucent quads back-to-front before upload once
            // the backend exposes the view direction.
            match backend.upload(layer, target.vertices(), previous) {
                Ok(handle) => {
                    next.insert(
                        layer,
                        CompiledLayer {
                            handle,
                            vertex_count: target.len(),
                        },
                    );
                    outcome.uploaded += 1;
                }
                Err(err) => {
                    tracing::warn!("layer {} upload failed: {}", layer, err);
                    outcome.failed += 1;
                }
            }
        });

        for (_, stale) in self.layers.drain() {
            backend.release(stale.handle);
            outcome.dropped += 1;
        }
        self.layers = next;
        outcome
    }

    /// Draws every layer, translated by `offset`. Returns the draw count.
    pub fn draw<B>(&self, backend: &mut B, offset: [f32; 3]) -> u32
    where
        B: GraphicsBackend<Handle = H>,
    {
        let mut draws = 0;
        for (layer, compiled) in &self.layers {
            backend.draw(*layer, &compiled.handle, offset);
            draws += 1;
        }
        draws
    }

    /// Releases every layer. Consumes the buffer.
    pub fn release<B>(mut self, backend: &mut B)
    where
        B: GraphicsBackend<Handle = H>,
    {
        for (_, compiled) in self.layers.drain() {
            backend.release(compiled.handle);
        }
    }

    /// Layers available for drawing.
    pub fn layers(&self) -> impl Iterator<Item = Layer> + '_ {
        self.layers.keys().copied()
    }

    /// Uploaded entry for a layer.
    #[must_use]
    pub fn layer(&self, layer: Layer) -> Option<&CompiledLayer<H>> {
        self.layers.get(&layer)
    }

    /// Number of uploaded layers.
    #[must_use]
    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    /// True if no layer is uploaded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }
}

impl<H> Default for CompiledRegionBuffer<H> {
    fn default() -> Self {
        Self::new()
    }
}
