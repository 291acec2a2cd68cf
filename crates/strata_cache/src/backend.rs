//! Graphics backend seam.
//!
//! The cache never touches a GPU API. It hands finished per-layer geometry
//! to a [`GraphicsBackend`], asks it to draw handles it returned, and gives
//! handles back for release. Handles are moved into `release`, so each one
//! is released at most once and cannot be drawn afterwards.

use std::collections::{HashMap, HashSet};

use crate::error::BackendError;
use crate::geometry::{BakedVertex, Layer};

/// GPU collaborator consumed by the cache.
pub trait GraphicsBackend {
    /// Opaque GPU-resident buffer handle.
    type Handle;

    /// Called once per frame before the first `draw`.
    fn begin_frame(&mut self) {}

    /// Uploads finished geometry for one layer.
    ///
    /// `previous` is the handle from the last compile of the same region and
    /// layer; the backend may refresh it in place or release it and return a
    /// new one. On error the backend owns `previous` and must release it.
    ///
    /// # Errors
    ///
    /// Returns a [`BackendError`] if the geometry cannot be made resident.
    fn upload(
        &mut self,
        layer: Layer,
        vertices: &[BakedVertex],
        previous: Option<Self::Handle>,
    ) -> Result<Self::Handle, BackendError>;

    /// Binds the layer's pipeline state, draws `handle` translated by
    /// `offset` (camera-relative region origin) and unbinds.
    fn draw(&mut self, layer: Layer, handle: &Self::Handle, offset: [f32; 3]);

    /// Frees a handle.
    fn release(&mut self, handle: Self::Handle);
}

/// Handle issued by [`RecordingBackend`].
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct RecordedHandle {
    id: u64,
}

impl RecordedHandle {
    /// Backend-unique id.
    #[must_use]
    pub const fn id(&self) -> u64 {
        self.id
    }
}

/// One recorded upload.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedUpload {
    /// Handle id returned.
    pub id: u64,
    /// Layer uploaded.
    pub layer: Layer,
    /// Vertices uploaded.
    pub vertices: Vec<BakedVertex>,
    /// Whether an existing handle was refreshed in place.
    pub refreshed: bool,
}

/// One recorded draw.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedDraw {
    /// Handle id drawn.
    pub id: u64,
    /// Layer drawn.
    pub layer: Layer,
    /// Camera-relative translation.
    pub offset: [f32; 3],
    /// Vertex count of the drawn buffer.
    pub vertex_count: usize,
}

/// Backend that performs no GPU work and records every call.
///
/// Used by tests and benchmarks.
#[derive(Debug, Default)]
pub struct RecordingBackend {
    next_id: u64,
    live: HashSet<u64>,
    vertex_counts: HashMap<u64, usize>,
    /// Uploads since construction.
    pub uploads: Vec<RecordedUpload>,
    /// Draws issued since the last `begin_frame`.
    pub draws: Vec<RecordedDraw>,
    /// Ids released, in order.
    pub released: Vec<u64>,
    /// Frames begun.
    pub frames: u64,
    /// Layers whose uploads are rejected.
    pub reject_layers: HashSet<&'static str>,
    /// When false, uploads never refresh in place.
    pub refresh_in_place: bool,
    /// Skip recording vertex payloads (benchmarks).
    pub discard_payloads: bool,
}

impl RecordingBackend {
    /// Creates a backend that refreshes handles in place.
    #[must_use]
    pub fn new() -> Self {
        Self {
            refresh_in_place: true,
            ..Self::default()
        }
    }

    /// Ids currently allocated and not released.
    #[must_use]
    pub fn live_handles(&self) -> usize {
        self.live.len()
    }

    /// True if `id` is allocated and not released.
    #[must_use]
    pub fn is_live(&self, id: u64) -> bool {
        self.live.contains(&id)
    }

    /// Draws recorded for a given layer this frame.
    #[must_use]
    pub fn draws_for(&self, layer: Layer) -> Vec<&RecordedDraw> {
        self.draws.iter().filter(|d| d.layer == layer).collect()
    }

    fn allocate(&mut self) -> u64 {
        self.next_id += 1;
        self.live.insert(self.next_id);
        self.next_id
    }

    fn free(&mut self, id: u64) {
        assert!(self.live.remove(&id), "handle {id} released twice");
        self.vertex_counts.remove(&id);
        self.released.push(id);
    }
}

impl GraphicsBackend for RecordingBackend {
    type Handle = RecordedHandle;

    fn begin_frame(&mut self) {
        self.frames += 1;
        self.draws.clear();
    }

    fn upload(
        &mut self,
        layer: Layer,
        vertices: &[BakedVertex],
        previous: Option<RecordedHandle>,
    ) -> Result<RecordedHandle, BackendError> {
        if self.reject_layers.contains(layer.name()) {
            if let Some(handle) = previous {
                self.free(handle.id);
            }
            return Err(BackendError::UploadRejected {
                layer: layer.name(),
                reason: "rejected by test configuration".to_string(),
            });
        }

        let (id, refreshed) = match previous {
            Some(handle) if self.refresh_in_place => (handle.id, true),
            Some(handle) => {
                self.free(handle.id);
                (self.allocate(), false)
            }
            None => (self.allocate(), false),
        };
        self.vertex_counts.insert(id, vertices.len());
        self.uploads.push(RecordedUpload {
            id,
            layer,
            vertices: if self.discard_payloads { Vec::new() } else { vertices.to_vec() },
            refreshed,
        });
        Ok(RecordedHandle { id })
    }

    fn draw(&mut self, layer: Layer, handle: &RecordedHandle, offset: [f32; 3]) {
        assert!(self.live.contains(&handle.id), "handle {} drawn after release", handle.id);
        self.draws.push(RecordedDraw {
            id: handle.id,
            layer,
            offset,
            vertex_count: self.vertex_counts.get(&handle.id).copied().unwrap_or(0),
        });
    }

    fn release(&mut self, handle: RecordedHandle) {
        self.free(handle.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_refresh_in_place_keeps_id() {
        let mut backend = RecordingBackend::new();
        let verts = [BakedVertex::default(); 4];
        let first = backend.upload(Layer::text_plate(), &verts, None).unwrap();
        let id = first.id();
        let second = backend.upload(Layer::text_plate(), &verts[..2], Some(first)).unwrap();
        assert_eq!(second.id(), id);
        assert!(backend.uploads[1].refreshed);
        assert_eq!(backend.live_handles(), 1);
    }

    #[test]
    fn test_replace_releases_previous() {
        let mut backend = RecordingBackend::new();
        backend.refresh_in_place = false;
        let verts = [BakedVertex::default(); 4];
        let first = backend.upload(Layer::text_plate(), &verts, None).unwrap();
        let old = first.id();
        let second = backend.upload(Layer::text_plate(), &verts, Some(first)).unwrap();
        assert_ne!(second.id(), old);
        assert_eq!(backend.released, vec![old]);
        assert_eq!(backend.live_handles(), 1);
    }

    #[test]
    fn test_rejected_upload_frees_previous() {
        let mut backend = RecordingBackend::new();
        let verts = [BakedVertex::default(); 4];
        let first = backend.upload(Layer::text_plate(), &verts, None).unwrap();
        backend.reject_layers.insert("text_plate");
        let err = backend.upload(Layer::text_plate(), &verts, Some(first)).unwrap_err();
        assert!(matches!(err, BackendError::UploadRejected { layer: "text_plate", .. }));
        assert_eq!(backend.live_handles(), 0);
    }

    #[test]
    fn test_draw_records_vertex_count() {
        let mut backend = RecordingBackend::new();
        let handle = backend.upload(Layer::text_plate(), &[BakedVertex::default(); 8], None).unwrap();
        backend.begin_frame();
        backend.draw(Layer::text_plate(), &handle, [1.0, 2.0, 3.0]);
        assert_eq!(backend.draws[0].vertex_count, 8);
        backend.release(handle);
        assert_eq!(backend.live_handles(), 0);
    }
}
