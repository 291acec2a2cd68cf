//! wgpu region backend.
//!
//! Compiled region layers live in a slab of GPU buffers keyed by an opaque
//! id. `draw` calls from the cache only queue commands; the host encodes the
//! queued commands into its render pass with [`WgpuRegionBackend::encode`].

use std::collections::HashMap;
use std::sync::Arc;

use strata_cache::{BackendError, BakedVertex, BlendMode, DrawMode, GraphicsBackend, Layer};
use wgpu::util::DeviceExt;

use crate::layout::quad_indices;

/// Handle to one uploaded region layer.
///
/// Not `Clone`: the cache gives it back exactly once, through `release`.
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct GpuHandle(u64);

impl GpuHandle {
    /// Slab id.
    #[must_use]
    pub const fn id(&self) -> u64 {
        self.0
    }
}

/// GPU buffers for one region layer.
struct GpuGeometry {
    vertex_buffer: wgpu::Buffer,
    index_buffer: Option<wgpu::Buffer>,
    /// Vertices, or indices for indexed layers.
    element_count: u32,
}

impl GpuGeometry {
    fn destroy(self) {
        self.vertex_buffer.destroy();
        if let Some(index_buffer) = self.index_buffer {
            index_buffer.destroy();
        }
    }
}

/// One queued region draw.
#[derive(Debug, Clone, Copy)]
struct DrawCommand {
    id: u64,
    layer: Layer,
    offset: [f32; 3],
}

/// [`GraphicsBackend`] backed by wgpu buffers.
pub struct WgpuRegionBackend {
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    /// Render pipelines by layer name.
    pipelines: HashMap<&'static str, wgpu::RenderPipeline>,
    slab: HashMap<u64, GpuGeometry>,
    next_id: u64,
    draws: Vec<DrawCommand>,
}

impl WgpuRegionBackend {
    /// Creates a backend with no pipelines registered.
    #[must_use]
    pub fn new(device: Arc<wgpu::Device>, queue: Arc<wgpu::Queue>) -> Self {
        Self {
            device,
            queue,
            pipelines: HashMap::new(),
            slab: HashMap::new(),
            next_id: 0,
            draws: Vec::new(),
        }
    }

    /// Registers the pipeline used to draw `layer`. Uploads for layers with
    /// no pipeline are rejected.
    pub fn register_pipeline(&mut self, layer: Layer, pipeline: wgpu::RenderPipeline) {
        self.pipelines.insert(layer.name(), pipeline);
    }

    /// True if `layer` has a pipeline.
    #[must_use]
    pub fn has_pipeline(&self, layer: Layer) -> bool {
        self.pipelines.contains_key(layer.name())
    }

    /// Region layers currently resident.
    #[must_use]
    pub fn resident_buffers(&self) -> usize {
        self.slab.len()
    }

    /// Draws queued this frame.
    #[must_use]
    pub fn queued_draws(&self) -> usize {
        self.draws.len()
    }

    /// Encodes this frame's queued draws into `pass`.
    ///
    /// Opaque layers go first; translucent and additive layers follow so
    /// they blend over finished opaque geometry. The caller binds group 0
    /// (camera) before calling.
    pub fn encode<'a>(&'a self, pass: &mut wgpu::RenderPass<'a>) {
        let mut order: Vec<&DrawCommand> = self.draws.iter().collect();
        order.sort_by_key(|cmd| cmd.layer.descriptor().blend != BlendMode::Opaque);

        let mut bound: Option<Layer> = None;
        for cmd in order {
            let Some(geometry) = self.slab.get(&cmd.id) else {
                continue;
            };
            if bound != Some(cmd.layer) {
                let Some(pipeline) = self.pipelines.get(cmd.layer.name()) else {
                    continue;
                };
                pass.set_pipeline(pipeline);
                bound = Some(cmd.layer);
            }

            let offset = [cmd.offset[0], cmd.offset[1], cmd.offset[2], 0.0];
            pass.set_push_constants(wgpu::ShaderStages::VERTEX, 0, bytemuck::cast_slice(&offset));
            pass.set_vertex_buffer(0, geometry.vertex_buffer.slice(..));
            match &geometry.index_buffer {
                Some(index_buffer) => {
                    pass.set_index_buffer(index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                    pass.draw_indexed(0..geometry.element_count, 0, 0..1);
                }
                None => pass.draw(0..geometry.element_count, 0..1),
            }
        }
    }

    fn create_buffer(&self, label: &str, contents: &[u8], usage: wgpu::BufferUsages) -> wgpu::Buffer {
        self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents,
            usage: usage | wgpu::BufferUsages::COPY_DST,
        })
    }

    /// Writes into existing buffers if they are large enough.
    fn refresh(&self, geometry: &mut GpuGeometry, vertices: &[u8], indices: Option<&[u8]>, count: u32) -> bool {
        let index_fits = match (indices, &geometry.index_buffer) {
            (Some(bytes), Some(buffer)) => buffer.size() >= bytes.len() as u64,
            (None, None) => true,
            _ => false,
        };
        if !index_fits || geometry.vertex_buffer.size() < vertices.len() as u64 {
            return false;
        }
        self.queue.write_buffer(&geometry.vertex_buffer, 0, vertices);
        if let (Some(bytes), Some(buffer)) = (indices, &geometry.index_buffer) {
            self.queue.write_buffer(buffer, 0, bytes);
        }
        geometry.element_count = count;
        true
    }
}

impl GraphicsBackend for WgpuRegionBackend {
    type Handle = GpuHandle;

    fn begin_frame(&mut self) {
        self.draws.clear();
    }

    fn upload(
        &mut self,
        layer: Layer,
        vertices: &[BakedVertex],
        previous: Option<GpuHandle>,
    ) -> Result<GpuHandle, BackendError> {
        let rejected = |reason: &str| BackendError::UploadRejected {
            layer: layer.name(),
            reason: reason.to_string(),
        };

        let indexed = layer.descriptor().draw_mode == DrawMode::Quads;
        let counts = if !self.has_pipeline(layer) {
            Err(BackendError::UnknownLayer(layer.name()))
        } else if vertices.is_empty() {
            Err(rejected("empty geometry"))
        } else {
            u32::try_from(vertices.len())
                .ok()
                .and_then(|count| {
                    if indexed {
                        (count / 4).checked_mul(6).map(|indices| (count, indices))
                    } else {
                        Some((count, count))
                    }
                })
                .ok_or_else(|| rejected("geometry exceeds u32 element count"))
        };
        let (vertex_count, element_count) = match counts {
            Ok(counts) => counts,
            Err(err) => {
                if let Some(handle) = previous {
                    self.release(handle);
                }
                return Err(err);
            }
        };

        let vertex_bytes: &[u8] = bytemuck::cast_slice(vertices);
        let indices = indexed.then(|| quad_indices(vertex_count));
        let index_bytes: Option<&[u8]> = indices.as_deref().map(bytemuck::cast_slice);

        if let Some(handle) = previous {
            if let Some(mut geometry) = self.slab.remove(&handle.0) {
                if self.refresh(&mut geometry, vertex_bytes, index_bytes, element_count) {
                    self.slab.insert(handle.0, geometry);
                    return Ok(handle);
                }
                geometry.destroy();
            }
            tracing::trace!("layer {} outgrew buffer {}, reallocating", layer, handle.0);
        }

        let geometry = GpuGeometry {
            vertex_buffer: self.create_buffer(layer.name(), vertex_bytes, wgpu::BufferUsages::VERTEX),
            index_buffer: index_bytes.map(|bytes| self.create_buffer(layer.name(), bytes, wgpu::BufferUsages::INDEX)),
            element_count,
        };
        self.next_id += 1;
        self.slab.insert(self.next_id, geometry);
        Ok(GpuHandle(self.next_id))
    }

    fn draw(&mut self, layer: Layer, handle: &GpuHandle, offset: [f32; 3]) {
        self.draws.push(DrawCommand {
            id: handle.0,
            layer,
            offset,
        });
    }

    fn release(&mut self, handle: GpuHandle) {
        match self.slab.remove(&handle.0) {
            Some(geometry) => geometry.destroy(),
            None => tracing::warn!("release of unknown region buffer {}", handle.0),
        }
    }
}
