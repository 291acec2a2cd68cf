//! Cache statistics.

/// What one frame did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameReport {
    /// Frame number, starting at 1.
    pub frame_number: u64,
    /// Producer signals drained at frame start.
    pub signals_applied: u32,
    /// Regions rebuilt and uploaded.
    pub regions_rebuilt: u32,
    /// Queued regions left for a later frame because they are out of view.
    pub regions_deferred: u32,
    /// Queued regions dropped because nothing in them bakes.
    pub regions_removed: u32,
    /// Successful producer bakes.
    pub producers_baked: u32,
    /// Producer bakes that returned an error.
    pub bake_failures: u32,
    /// Layers uploaded.
    pub layers_uploaded: u32,
    /// Layers the backend rejected.
    pub upload_failures: u32,
    /// Regions drawn.
    pub regions_drawn: u32,
    /// Layer draws issued.
    pub draw_calls: u32,
    /// Regions evicted for leaving the view.
    pub regions_evicted: u32,
    /// The rebuild pass was skipped because no world is bound.
    pub rebuild_skipped: bool,
}

/// Totals since the cache was created.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Frames run.
    pub frames: u64,
    /// Regions rebuilt.
    pub rebuilds: u64,
    /// Regions evicted.
    pub evictions: u64,
    /// Regions removed for having nothing to bake.
    pub removals: u64,
    /// Producer bake failures.
    pub bake_failures: u64,
    /// Backend upload failures.
    pub upload_failures: u64,
    /// Full resets (world change, render state invalidation).
    pub resets: u64,
}

impl CacheStats {
    /// Folds one frame into the totals.
    pub fn record(&mut self, frame: &FrameReport) {
        self.frames += 1;
        self.rebuilds += u64::from(frame.regions_rebuilt);
        self.evictions += u64::from(frame.regions_evicted);
        self.removals += u64::from(frame.regions_removed);
        self.bake_failures += u64::from(frame.bake_failures);
        self.upload_failures += u64::from(frame.upload_failures);
    }
}
