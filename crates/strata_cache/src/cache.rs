//! Region cache - the frame coordinator.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         FRAME TIMELINE                          │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  TICK    producers render dynamic content and only SIGNAL       │
//! │          (activate / invalidate)                                │
//! │                                                                 │
//! │  FRAME   ├── Drain signals into the rebuild queue              │
//! │          ├── Snapshot visibility for the camera                 │
//! │          ├── Rebuild queued regions that are in view            │
//! │          │   └── bake every producer in the region's chunks     │
//! │          │       → upload used layers                           │
//! │          └── For every compiled region                          │
//! │              ├── in view  → draw each layer at origin - camera  │
//! │              └── out      → release and forget                  │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Everything runs on the render thread. A region's rebuild completes
//! within the frame it starts in or does not start.

use std::any::Any;
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use crate::backend::GraphicsBackend;
use crate::compiled::CompiledRegionBuffer;
use crate::config::CacheConfig;
use crate::error::CacheResult;
use crate::geometry::{OverlayCoord, StagingBuilder, TransformStack};
use crate::producer::BakeContext;
use crate::queue::RebuildQueue;
use crate::region::{RegionAddressing, RegionCoord, WorldPos};
use crate::signals::CacheSignals;
use crate::stats::{CacheStats, FrameReport};
use crate::store::CacheStore;
use crate::visibility::{ViewWindow, VisibilityPolicy};
use crate::world::WorldStorage;

/// Externally triggered lifecycle events.
pub enum LifecycleEvent {
    /// A world finished loading and becomes the bound world.
    WorldLoaded(Arc<dyn WorldStorage>),
    /// The bound world was unloaded.
    WorldUnloaded,
    /// Render state (fonts, pipelines, assets) was reloaded.
    RenderStateInvalidated,
}

/// Producer counts from baking one region.
#[derive(Debug, Default)]
struct RegionBake {
    found: u32,
    baked: u32,
    failed: u32,
}

impl RegionBake {
    /// Producers whose bake was invoked, successfully or not.
    fn invoked(&self) -> u32 {
        self.baked + self.failed
    }
}

/// Spatial cache of baked static geometry.
///
/// Owns the graphics backend, the compiled buffers, the rebuild queue and
/// the world binding. Construct once; call [`RegionCache::frame`] once per
/// frame after producers have signalled.
pub struct RegionCache<B: GraphicsBackend> {
    config: CacheConfig,
    addressing: RegionAddressing,
    visibility: VisibilityPolicy,
    backend: B,
    store: CacheStore<B::Handle>,
    queue: RebuildQueue,
    builders: HashMap<RegionCoord, StagingBuilder>,
    world: Option<Arc<dyn WorldStorage>>,
    signals: CacheSignals,
    frame_count: u64,
    stats: CacheStats,
}

impl<B: GraphicsBackend> RegionCache<B> {
    /// Creates an empty cache with no world bound.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::InvalidConfig`](crate::CacheError::InvalidConfig)
    /// if the configuration fails validation.
    pub fn new(config: CacheConfig, backend: B) -> CacheResult<Self> {
        config.validate()?;
        let addressing = RegionAddressing::from_config(&config);
        Ok(Self {
            visibility: VisibilityPolicy::new(addressing, config.view_radius),
            signals: CacheSignals::new(addressing),
            addressing,
            config,
            backend,
            store: CacheStore::new(),
            queue: RebuildQueue::new(),
            builders: HashMap::new(),
            world: None,
            frame_count: 0,
            stats: CacheStats::default(),
        })
    }

    // =========================================================================
    // LIFECYCLE
    // =========================================================================

    /// Makes `world` the active world. Everything cached for the previous
    /// world is released first.
    pub fn bind_world(&mut self, world: Arc<dyn WorldStorage>) {
        self.reset();
        self.world = Some(world);
        tracing::info!("region cache bound to new world");
    }

    /// Releases everything and forgets the bound world.
    pub fn unbind_world(&mut self) {
        self.reset();
        self.world = None;
        tracing::info!("region cache unbound");
    }

    /// Applies a lifecycle event.
    pub fn handle_event(&mut self, event: LifecycleEvent) {
        match event {
            LifecycleEvent::WorldLoaded(world) => self.bind_world(world),
            LifecycleEvent::WorldUnloaded => self.unbind_world(),
            LifecycleEvent::RenderStateInvalidated => self.reset(),
        }
    }

    /// Full reset: releases every compiled buffer and clears the queue,
    /// the staging builders and pending signals. The world binding is kept.
    pub fn reset(&mut self) {
        let released = self.store.len();
        for (_, compiled) in self.store.drain() {
            compiled.release(&mut self.backend);
        }
        self.queue.clear();
        self.builders.clear();
        self.signals.clear();
        self.stats.resets += 1;
        tracing::info!("region cache reset, {} regions released", released);
    }

    // =========================================================================
    // ACTIVATION / INVALIDATION
    // =========================================================================

    /// Queues the region owning `pos` if it has no compiled buffer.
    ///
    /// Returns true if the region was newly queued.
    pub fn activate(&mut self, pos: WorldPos) -> bool {
        let region = self.addressing.to_region(pos);
        !self.store.contains(&region) && self.queue.insert(region)
    }

    /// Queues the region owning `pos` for rebuild, compiled or not.
    ///
    /// Returns true if the region was newly queued.
    pub fn invalidate(&mut self, pos: WorldPos) -> bool {
        self.queue.insert(self.addressing.to_region(pos))
    }

    /// Handle for producers to signal from the tick phase.
    #[must_use]
    pub fn signals(&self) -> CacheSignals {
        self.signals.clone()
    }

    /// Moves pending producer signals into the rebuild queue. Returns the
    /// number of signals applied.
    pub fn apply_signals(&mut self) -> u32 {
        let batch = self.signals.drain();
        let applied = batch.activations.len() + batch.invalidations.len();
        for region in batch.invalidations {
            self.queue.insert(region);
        }
        for region in batch.activations {
            if !self.store.contains(&region) {
                self.queue.insert(region);
            }
        }
        u32::try_from(applied).unwrap_or(u32::MAX)
    }

    // =========================================================================
    // FRAME
    // =========================================================================

    /// Runs one frame: signals, rebuilds, then draw and evict.
    pub fn frame(&mut self, camera: [f64; 3]) -> FrameReport {
        self.frame_count += 1;
        let mut report = FrameReport {
            frame_number: self.frame_count,
            ..FrameReport::default()
        };

        report.signals_applied = self.apply_signals();
        let window = self.visibility.window(camera);
        self.process_rebuilds(&window, &mut report);
        self.render_and_evict(&window, camera, &mut report);

        self.stats.record(&report);
        tracing::trace!(
            "frame {}: rebuilt {}, deferred {}, drawn {}, evicted {}",
            report.frame_number,
            report.regions_rebuilt,
            report.regions_deferred,
            report.regions_drawn,
            report.regions_evicted
        );
        report
    }

    /// Rebuilds every queued region inside `window`.
    ///
    /// Out-of-view regions stay queued. With no world bound the pass is
    /// skipped entirely.
    pub fn process_rebuilds(&mut self, window: &ViewWindow, report: &mut FrameReport) {
        let Some(world) = self.world.clone() else {
            report.rebuild_skipped = true;
            return;
        };

        let eligible = self.queue.eligible(|region| window.contains(*region));
        report.regions_deferred = u32::try_from(self.queue.len() - eligible.len()).unwrap_or(u32::MAX);

        for region in eligible {
            let hint = self.config.builder_capacity_hint;
            let builder = self
                .builders
                .entry(region)
                .or_insert_with(|| StagingBuilder::new(hint));
            builder.reset();

            let bake = bake_region(world.as_ref(), &self.addressing, region, builder);
            self.queue.remove(&region);
            report.producers_baked += bake.baked;
            report.bake_failures += bake.failed;

            if bake.invoked() == 0 {
                self.builders.remove(&region);
                if let Some(compiled) = self.store.remove(&region) {
                    compiled.release(&mut self.backend);
                }
                report.regions_removed += 1;
                tracing::debug!(
                    "region {} has nothing to bake ({} producers), removed",
                    region,
                    bake.found
                );
                continue;
            }

            let compiled = self.store.get_or_insert(region);
            let outcome = compiled.upload_from(builder, &mut self.backend);
            report.layers_uploaded += outcome.uploaded;
            report.upload_failures += outcome.failed;
            report.regions_rebuilt += 1;
            tracing::debug!(
                "region {} rebuilt: {} producers baked, {} failed, {} layers",
                region,
                bake.baked,
                bake.failed,
                outcome.uploaded
            );
        }
    }

    /// Draws every compiled region inside `window` and evicts the rest.
    ///
    /// Each region's visibility is evaluated once and drives exactly one of
    /// the two paths.
    pub fn render_and_evict(&mut self, window: &ViewWindow, camera: [f64; 3], report: &mut FrameReport) {
        self.backend.begin_frame();

        let mut evicted = Vec::new();
        for (region, compiled) in self.store.iter() {
            if window.contains(*region) {
                let offset = camera_relative(region.origin(), camera);
                report.draw_calls += compiled.draw(&mut self.backend, offset);
                report.regions_drawn += 1;
            } else {
                evicted.push(*region);
            }
        }

        for region in evicted {
            if let Some(compiled) = self.store.remove(&region) {
                compiled.release(&mut self.backend);
            }
            self.builders.remove(&region);
            report.regions_evicted += 1;
            tracing::debug!("region {} out of view, evicted", region);
        }
    }

    // =========================================================================
    // ACCESSORS
    // =========================================================================

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Addressing scheme.
    #[must_use]
    pub fn addressing(&self) -> &RegionAddressing {
        &self.addressing
    }

    /// Visibility policy.
    #[must_use]
    pub fn visibility(&self) -> &VisibilityPolicy {
        &self.visibility
    }

    /// Region owning a world position.
    #[must_use]
    pub fn region_of(&self, pos: WorldPos) -> RegionCoord {
        self.addressing.to_region(pos)
    }

    /// Graphics backend.
    #[must_use]
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Mutable graphics backend, for pipeline registration and the like.
    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// True if a world is bound.
    #[must_use]
    pub fn has_world(&self) -> bool {
        self.world.is_some()
    }

    /// Compiled buffer for a region.
    #[must_use]
    pub fn compiled(&self, region: &RegionCoord) -> Option<&CompiledRegionBuffer<B::Handle>> {
        self.store.get(region)
    }

    /// True if the region has a compiled buffer.
    #[must_use]
    pub fn is_compiled(&self, region: &RegionCoord) -> bool {
        self.store.contains(region)
    }

    /// True if the region awaits a rebuild.
    #[must_use]
    pub fn is_queued(&self, region: &RegionCoord) -> bool {
        self.queue.contains(region)
    }

    /// Regions awaiting a rebuild.
    #[must_use]
    pub fn queued_len(&self) -> usize {
        self.queue.len()
    }

    /// Regions with a compiled buffer.
    #[must_use]
    pub fn compiled_len(&self) -> usize {
        self.store.len()
    }

    /// Staging builders retained for reuse.
    #[must_use]
    pub fn builder_count(&self) -> usize {
        self.builders.len()
    }

    /// Frames run so far.
    #[must_use]
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Totals since construction.
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        self.stats
    }
}

impl<B: GraphicsBackend> Drop for RegionCache<B> {
    fn drop(&mut self) {
        for (_, compiled) in self.store.drain() {
            compiled.release(&mut self.backend);
        }
    }
}

/// Invokes every baking producer in `region` with the builder as its sink.
///
/// A producer that fails or panics is logged and skipped; geometry it staged
/// before failing stays in the builder. The transform is unwound to its depth
/// before the producer ran, whatever the producer left pushed.
fn bake_region(
    world: &dyn WorldStorage,
    addressing: &RegionAddressing,
    region: RegionCoord,
    builder: &mut StagingBuilder,
) -> RegionBake {
    let mut bake = RegionBake::default();
    let mut transform = TransformStack::new();

    for chunk in addressing.chunks(region) {
        world.for_each_producer_in_chunk(chunk, &mut |producer| {
            bake.found += 1;
            if !producer.should_bake() {
                return;
            }

            let pos = producer.position();
            let light = world.light_at(pos);
            let depth = transform.depth();
            transform.push();
            transform.translate(addressing.local_offset(pos).to_f32());
            let result = panic::catch_unwind(AssertUnwindSafe(|| {
                let mut ctx = BakeContext {
                    transform: &mut transform,
                    sink: &mut *builder,
                    light,
                    overlay: OverlayCoord::DEFAULT,
                };
                producer.bake_static(&mut ctx)
            }));
            transform.truncate_to(depth);

            match result {
                Ok(Ok(())) => bake.baked += 1,
                Ok(Err(err)) => {
                    bake.failed += 1;
                    tracing::warn!("producer at {} in region {} failed to bake: {}", pos, region, err);
                }
                Err(payload) => {
                    bake.failed += 1;
                    tracing::warn!(
                        "producer at {} in region {} panicked while baking: {}",
                        pos,
                        region,
                        panic_message(&*payload)
                    );
                }
            }
        });
    }

    bake
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}

/// Region origin relative to the camera, narrowed to `f32` after the
/// subtraction so precision holds far from the world origin.
#[allow(clippy::cast_possible_truncation)]
fn camera_relative(origin: WorldPos, camera: [f64; 3]) -> [f32; 3] {
    [
        (f64::from(origin.x) - camera[0]) as f32,
        (f64::from(origin.y) - camera[1]) as f32,
        (f64::from(origin.z) - camera[2]) as f32,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::RecordingBackend;
    use crate::error::{BakeError, CacheError};
    use crate::geometry::{BakedVertex, Layer, PackedLight};
    use crate::producer::Producer;
    use crate::world::MockWorld;

    struct Plate(WorldPos);

    impl Producer for Plate {
        fn position(&self) -> WorldPos {
            self.0
        }

        fn bake_static(&self, ctx: &mut BakeContext<'_>) -> Result<(), BakeError> {
            let p = ctx.transform.apply([0.0, 0.0, 0.0]);
            let vertex = BakedVertex::colored(p, [0, 0, 0, 255]).lit(ctx.light, ctx.overlay);
            ctx.sink.buffer(Layer::text_plate()).push(vertex);
            Ok(())
        }
    }

    fn cache_with(world: &Arc<MockWorld>) -> RegionCache<RecordingBackend> {
        let mut cache = RegionCache::new(CacheConfig::default(), RecordingBackend::new()).unwrap();
        cache.bind_world(world.clone());
        cache
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = CacheConfig {
            view_radius: -2,
            ..CacheConfig::default()
        };
        let err = RegionCache::new(config, RecordingBackend::new()).err().unwrap();
        assert!(matches!(err, CacheError::InvalidConfig { .. }));
    }

    #[test]
    fn test_camera_relative_offset() {
        assert_eq!(camera_relative(WorldPos::new(32, 0, -32), [40.5, 64.0, 0.0]), [-8.5, -64.0, -32.0]);
        // Far from the origin the difference stays exact.
        let far = camera_relative(WorldPos::new(30_000_000, 0, 0), [30_000_001.25, 0.0, 0.0]);
        assert_eq!(far[0], -1.25);
    }

    #[test]
    fn test_bake_uses_local_offset_and_light() {
        let world = Arc::new(MockWorld::new(4));
        world.insert(Arc::new(Plate(WorldPos::new(-3, 70, 40))));
        world.set_light(WorldPos::new(-3, 70, 40), PackedLight::pack(5, 9));

        let mut cache = cache_with(&world);
        assert!(cache.activate(WorldPos::new(-3, 70, 40)));
        let report = cache.frame([0.0, 64.0, 0.0]);
        assert_eq!(report.regions_rebuilt, 1);

        let upload = &cache.backend().uploads[0];
        assert_eq!(upload.vertices[0].position, [29.0, 70.0, 8.0]);
        assert_eq!(upload.vertices[0].light, PackedLight::pack(5, 9));
        assert_eq!(upload.vertices[0].overlay, OverlayCoord::DEFAULT);
    }

    #[test]
    fn test_no_world_skips_rebuild() {
        let mut cache = RegionCache::new(CacheConfig::default(), RecordingBackend::new()).unwrap();
        cache.invalidate(WorldPos::new(0, 0, 0));
        let report = cache.frame([0.0; 3]);
        assert!(report.rebuild_skipped);
        assert_eq!(cache.queued_len(), 1);
        assert_eq!(cache.compiled_len(), 0);
    }

    #[test]
    fn test_lifecycle_events_reset() {
        let world = Arc::new(MockWorld::new(4));
        world.insert(Arc::new(Plate(WorldPos::new(1, 0, 1))));
        let mut cache = cache_with(&world);
        cache.activate(WorldPos::new(1, 0, 1));
        cache.frame([0.0; 3]);
        assert_eq!(cache.compiled_len(), 1);

        cache.handle_event(LifecycleEvent::RenderStateInvalidated);
        assert_eq!(cache.compiled_len(), 0);
        assert_eq!(cache.builder_count(), 0);
        assert_eq!(cache.backend().live_handles(), 0);
        assert!(cache.has_world());

        cache.handle_event(LifecycleEvent::WorldUnloaded);
        assert!(!cache.has_world());

        cache.handle_event(LifecycleEvent::WorldLoaded(world));
        assert!(cache.has_world());
        assert_eq!(cache.stats().resets, 4);
    }

    #[test]
    fn test_reset_discards_pending_signals() {
        let world = Arc::new(MockWorld::new(4));
        let mut cache = cache_with(&world);
        let signals = cache.signals();
        signals.invalidate(WorldPos::new(5, 5, 5));
        cache.reset();
        assert_eq!(cache.apply_signals(), 0);
        assert_eq!(cache.queued_len(), 0);
    }
}
