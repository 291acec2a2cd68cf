//! Content producer capability.
//!
//! A producer is one world entity with visuals. Every producer exposes the
//! same fixed interface; whether it takes part in baking is answered by
//! `should_bake`, decided when the entity is registered with its storage.
//!
//! `bake_static` runs only during a region rebuild and must emit only
//! geometry that does not move. `render_dynamic` runs every frame for
//! animated content, regardless of cache state.

use crate::error::BakeError;
use crate::geometry::{GeometrySink, OverlayCoord, PackedLight, TransformStack};
use crate::region::WorldPos;
use crate::signals::CacheSignals;

/// Everything a producer gets while baking.
pub struct BakeContext<'a> {
    /// Region-local frame, already translated to the producer's local offset.
    pub transform: &'a mut TransformStack,
    /// Geometry sink; one target per layer.
    pub sink: &'a mut dyn GeometrySink,
    /// World light at the producer's position.
    pub light: PackedLight,
    /// Overlay coordinate.
    pub overlay: OverlayCoord,
}

/// Everything a producer gets in the per-frame immediate pass.
pub struct DynamicContext<'a> {
    /// Camera-relative frame for this producer.
    pub transform: &'a mut TransformStack,
    /// Immediate-mode geometry sink.
    pub sink: &'a mut dyn GeometrySink,
    /// World light at the producer's position.
    pub light: PackedLight,
    /// Overlay coordinate.
    pub overlay: OverlayCoord,
    /// Fraction of a tick elapsed since the last tick.
    pub tick_delta: f32,
    /// Signal handle for activate/invalidate.
    pub signals: &'a CacheSignals,
}

/// Fixed capability interface of a content producer.
pub trait Producer {
    /// Discrete world position of the entity.
    fn position(&self) -> WorldPos;

    /// Whether this producer contributes static geometry to its region.
    fn should_bake(&self) -> bool {
        true
    }

    /// Emits static geometry into a region rebuild.
    ///
    /// Geometry already written before an error is returned is kept.
    ///
    /// # Errors
    ///
    /// Returns a [`BakeError`] when the producer cannot render; the rebuild
    /// logs it and continues with the next producer. A panic is caught and
    /// treated the same way. Entries left pushed on `ctx.transform` are
    /// discarded before the next producer runs.
    fn bake_static(&self, ctx: &mut BakeContext<'_>) -> Result<(), BakeError> {
        let _ = ctx;
        Ok(())
    }

    /// Emits moving or animated geometry for this frame.
    fn render_dynamic(&self, ctx: &mut DynamicContext<'_>) {
        let _ = ctx;
    }

    /// Requests a rebuild of this producer's region.
    fn invalidate_self(&self, signals: &CacheSignals) {
        signals.invalidate(self.position());
    }
}

/// Immediate-pass entry point for one producer.
///
/// Runs `render_dynamic`, then activates the producer's region if it bakes,
/// so every baking producer's region is built at least once after it comes
/// into play.
pub fn render_immediate(producer: &dyn Producer, ctx: &mut DynamicContext<'_>) {
    producer.render_dynamic(ctx);
    if producer.should_bake() {
        ctx.signals.activate(producer.position());
    }
}
