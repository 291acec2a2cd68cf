//! # STRATA wgpu Backend
//!
//! [`GraphicsBackend`](strata_cache::GraphicsBackend) implementation on top
//! of `wgpu`.
//!
//! ## Frame flow
//!
//! ```text
//! RegionCache::frame
//!   ├── upload   → vertex (+ index) buffer per region layer
//!   ├── draw     → queued into the frame's draw list
//!   └── release  → buffers destroyed
//!
//! render pass
//!   └── WgpuRegionBackend::encode → pipeline, buffers, push constant, draw
//! ```
//!
//! Pipelines need `wgpu::Features::PUSH_CONSTANTS` with at least
//! [`REGION_PUSH_CONSTANT_SIZE`] bytes of vertex-stage push constants.

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod backend;
pub mod layout;

pub use backend::{GpuHandle, WgpuRegionBackend};
pub use layout::{
    blend_state, create_layer_pipeline, depth_stencil_state, pipeline_layout, primitive_state,
    quad_indices, shader_source, vertex_layout, REGION_PUSH_CONSTANT_SIZE,
};
