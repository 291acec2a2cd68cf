//! # STRATA Region Cache
//!
//! Spatial cache of baked static geometry for a streamed 3-D world:
//! - Static geometry is baked once per region, not once per frame
//! - Off-screen regions give their GPU memory back
//! - Producers signal intent; the frame coordinator does the work
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     REGION CACHE                             │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Producer signals → Rebuild Queue → Staging Builder          │
//! │                                          ↓                   │
//! │  Visibility Policy ──────────→ Compiled Region Buffer        │
//! │                                          ↓                   │
//! │                      draw (in view) / release (out of view)  │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Guarantees
//!
//! - A compiled buffer holds exactly the layers written in its last rebuild
//! - Every GPU handle is released exactly once
//! - A failing producer never aborts its region's rebuild
//! - No GPU API dependency: see [`GraphicsBackend`]

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod backend;
pub mod cache;
pub mod compiled;
pub mod config;
pub mod error;
pub mod geometry;
pub mod producer;
pub mod queue;
pub mod region;
pub mod signals;
pub mod stats;
pub mod store;
pub mod visibility;
pub mod world;

pub use backend::{GraphicsBackend, RecordedDraw, RecordedHandle, RecordedUpload, RecordingBackend};
pub use cache::{LifecycleEvent, RegionCache};
pub use compiled::{CompiledLayer, CompiledRegionBuffer, UploadOutcome};
pub use config::CacheConfig;
pub use error::{BackendError, BakeError, CacheError, CacheResult};
pub use geometry::{
    BakedVertex, BlendMode, DrawMode, GeometrySink, GeometryTarget, Layer, LayerDescriptor,
    OverlayCoord, PackedLight, StagingBuilder, TransformStack, VertexFormat, TEXT_PLATE,
};
pub use producer::{render_immediate, BakeContext, DynamicContext, Producer};
pub use queue::RebuildQueue;
pub use region::{ChunkCoord, LocalOffset, RegionAddressing, RegionCoord, WorldPos};
pub use signals::{CacheSignals, SignalBatch};
pub use stats::{CacheStats, FrameReport};
pub use store::CacheStore;
pub use visibility::{ViewWindow, VisibilityPolicy};
pub use world::{MockWorld, WorldStorage};
