/// Visibility culler: owns the whole probe pipeline and drives it.
///
/// Call `tick()` once per frame. It drains finished decodes, feeds them
/// to the tracker, notifies listeners, and starts a new cycle when auto
/// update is on, the interval has elapsed and something asked for one.
/// Hosts that drive cycles by hand use `update_visibility()` followed by
/// `poll()` or `wait_for_cycle()`.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};
use rustc_hash::{FxHashMap, FxHashSet};
use crate::color::IdentifierAllocator;
use crate::decode::{DecodeResult, PixelDecoder};
use crate::error::Result;
use crate::fragment::{FragmentBoxes, FragmentId};
use crate::probe::{
    GroupKey, InstanceBatch, PassStage, ProbeRenderer, ProbeScene, RenderGroup,
    RenderableGroup, VisibilityRenderPass,
};
use crate::tracking::{DiscoveryEvent, DiscoveryListener, VisibilityStats, VisibilityTracker};
use crate::{engine_debug, engine_err, engine_info, engine_trace, engine_warn};
use super::visibility_config::{UpdateReasons, VisibilityConfig};

const SOURCE: &str = "galaxy3d::VisibilityCuller";

fn lock_renderer(renderer: &Mutex<dyn ProbeRenderer>) -> Result<MutexGuard<'_, dyn ProbeRenderer + 'static>> {
    renderer
        .lock()
        .map_err(|_| engine_err!(SOURCE, "Probe renderer lock poisoned"))
}

pub struct VisibilityCuller {
    renderer: Arc<Mutex<dyn ProbeRenderer>>,
    config: VisibilityConfig,
    render_pass: VisibilityRenderPass,
    decoder: PixelDecoder,
    allocator: IdentifierAllocator,
    tracker: VisibilityTracker,
    scene: ProbeScene,
    opaque_key: Option<GroupKey>,
    transparent_group: Option<Arc<dyn RenderableGroup>>,
    enabled: bool,
    update_reasons: UpdateReasons,
    cycle_in_flight: Option<u64>,
    next_cycle: u64,
    last_update: Option<Instant>,
    listeners: Vec<Box<dyn DiscoveryListener>>,
}

impl VisibilityCuller {
    /// Create a culler and start its decoder worker.
    ///
    /// # Errors
    ///
    /// `InitializationFailed` for an invalid configuration or if the
    /// worker thread cannot be spawned.
    pub fn new(renderer: Arc<Mutex<dyn ProbeRenderer>>, config: VisibilityConfig) -> Result<Self> {
        config.validate()?;

        let mut render_pass = VisibilityRenderPass::new(config.target_width, config.target_height)?;
        render_pass.set_render_debug_frame(config.render_debug_frame);
        let decoder = PixelDecoder::new()?;

        engine_info!(SOURCE, "Visibility culler created ({}x{} probe, {} ms interval)",
            config.target_width, config.target_height, config.update_interval.as_millis());

        Ok(Self {
            renderer,
            config,
            render_pass,
            decoder,
            allocator: IdentifierAllocator::new(),
            tracker: VisibilityTracker::new(),
            scene: ProbeScene::new(),
            opaque_key: None,
            transparent_group: None,
            enabled: true,
            update_reasons: UpdateReasons::empty(),
            cycle_in_flight: None,
            next_cycle: 0,
            last_update: None,
            listeners: Vec::new(),
        })
    }

    // ===== SCENE BUILD =====

    /// Build (or rebuild) the probe geometry from the loader's boxes.
    ///
    /// Colors are allocated opaque boxes first, then transparent, in input
    /// order. Everything is built against a fresh allocator which replaces
    /// the current one only on success. A successful load resets the
    /// tracker and starts a new generation, so results of a cycle still in
    /// flight are discarded.
    ///
    /// # Errors
    ///
    /// `UnmappedInstance`, `CapacityExceeded` or `ColorCollision` from the
    /// build, or a renderer failure while creating the groups. The previous
    /// scene stays active.
    pub fn load_boxes(&mut self, boxes: &FragmentBoxes) -> Result<()> {
        let mut allocator = IdentifierAllocator::new();
        let opaque = InstanceBatch::build(
            RenderGroup::Opaque, &boxes.opaque, &boxes.instance_to_fragment, &mut allocator)?;
        let transparent = InstanceBatch::build(
            RenderGroup::Transparent, &boxes.transparent, &boxes.instance_to_fragment, &mut allocator)?;

        let (opaque_group, transparent_group) = {
            let mut renderer = lock_renderer(&self.renderer)?;
            let opaque_group = renderer.create_group(&opaque)?;
            let transparent_group = if transparent.is_empty() {
                None
            } else {
                Some(renderer.create_group(&transparent)?)
            };
            (opaque_group, transparent_group)
        };

        if let Some(key) = self.opaque_key.take() {
            self.scene.remove(key);
        }
        self.opaque_key = Some(self.scene.add(opaque_group));
        self.transparent_group = transparent_group;
        self.allocator = allocator;

        let generation = self.tracker.reset();
        self.cycle_in_flight = None;
        self.render_pass.finish_cycle();
        self.update_reasons.insert(UpdateReasons::SCENE_CHANGED);

        engine_info!(SOURCE, "Probe scene built: {} opaque + {} transparent instances, {} colors (generation {})",
            opaque.len(), transparent.len(), self.allocator.len(), generation);
        Ok(())
    }

    // ===== CYCLES =====

    /// Per-frame entry point.
    ///
    /// Drains finished decodes, then starts a cycle if auto update is on
    /// and the update interval has elapsed since the last one. A failed
    /// cycle is logged and retried on a later tick.
    ///
    /// Returns the number of cycles completed by this call.
    ///
    /// # Errors
    ///
    /// `WorkerDisconnected` if the decoder worker is gone.
    pub fn tick(&mut self, now: Instant) -> Result<usize> {
        let completed = self.drain(now)?;

        if self.config.auto_update && self.interval_elapsed(now) {
            if let Err(e) = self.start_cycle(now) {
                engine_warn!(SOURCE, "Visibility cycle failed, retrying later: {}", e);
            }
        }
        Ok(completed)
    }

    /// Start a cycle now, ignoring the interval.
    ///
    /// `force` stands in for an update reason. Nothing happens (and
    /// `Ok(false)` is returned) when no scene is loaded, the culler is
    /// disabled, there is no reason to update, or a cycle is still in
    /// flight.
    ///
    /// # Errors
    ///
    /// Renderer or decoder failures. The cycle is dropped and the update
    /// reasons are kept, plus `RETRY`.
    pub fn update_visibility(&mut self, force: bool) -> Result<bool> {
        if force {
            self.update_reasons.insert(UpdateReasons::FORCED);
        }
        self.start_cycle(Instant::now())
    }

    fn interval_elapsed(&self, now: Instant) -> bool {
        self.last_update.map_or(true, |last| {
            now.saturating_duration_since(last) >= self.config.update_interval
        })
    }

    fn start_cycle(&mut self, now: Instant) -> Result<bool> {
        if self.opaque_key.is_none() {
            engine_trace!(SOURCE, "No probe scene loaded, skipping cycle");
            return Ok(false);
        }
        if !self.enabled || self.update_reasons.is_empty() {
            return Ok(false);
        }
        if self.is_update_in_progress() {
            engine_trace!(SOURCE, "Cycle still in flight, skipping");
            return Ok(false);
        }

        let reasons = std::mem::replace(&mut self.update_reasons, UpdateReasons::empty());
        let generation = self.tracker.generation();
        self.next_cycle += 1;
        let cycle = self.next_cycle;
        self.last_update = Some(now);

        let result = match lock_renderer(&self.renderer) {
            Ok(mut renderer) => self.render_pass.run_cycle(
                &mut *renderer,
                &mut self.scene,
                self.transparent_group.as_ref(),
                &mut self.decoder,
                generation,
                cycle,
            ),
            Err(e) => Err(e),
        };

        match result {
            Ok(()) => {
                engine_debug!(SOURCE, "Cycle {} started ({:?})", cycle, reasons);
                self.cycle_in_flight = Some(cycle);
                Ok(true)
            }
            Err(e) => {
                // A submitted opaque pass is dropped by the tracker once the next cycle starts
                if self.render_pass.stage() == PassStage::Idle {
                    self.tracker.record_dropped_cycle();
                }
                self.render_pass.finish_cycle();
                self.update_reasons |= reasons | UpdateReasons::RETRY;
                Err(e)
            }
        }
    }

    /// Process every decode result that is ready, without blocking.
    ///
    /// Returns the number of cycles completed.
    pub fn poll(&mut self) -> Result<usize> {
        self.drain(Instant::now())
    }

    fn drain(&mut self, now: Instant) -> Result<usize> {
        let mut completed = 0;
        while let Some(result) = self.decoder.try_recv()? {
            if self.process_result(result, now).is_some() {
                completed += 1;
            }
        }
        Ok(completed)
    }

    /// Block until the cycle in flight completes or `timeout` runs out.
    ///
    /// Returns `None` on timeout, or when the pending results turned out
    /// stale or out of order.
    pub fn wait_for_cycle(&mut self, timeout: Duration) -> Result<Option<DiscoveryEvent>> {
        let deadline = Instant::now() + timeout;

        while self.decoder.in_flight() > 0 {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Ok(None);
            }
            match self.decoder.recv_timeout(remaining)? {
                Some(result) => {
                    if let Some(event) = self.process_result(result, Instant::now()) {
                        return Ok(Some(event));
                    }
                }
                None => return Ok(None),
            }
        }
        Ok(None)
    }

    fn process_result(&mut self, result: DecodeResult, now: Instant) -> Option<DiscoveryEvent> {
        let DecodeResult { ticket, colors, pixels } = result;
        self.render_pass.recycle(pixels);

        match self.tracker.apply(ticket, &colors, &self.allocator, now) {
            Ok(Some(event)) => {
                if self.cycle_in_flight == Some(event.cycle) {
                    self.cycle_in_flight = None;
                    self.render_pass.finish_cycle();
                }
                for listener in &mut self.listeners {
                    listener.on_fragments_discovered(&event);
                }
                Some(event)
            }
            Ok(None) => None,
            Err(e) => {
                engine_warn!(SOURCE, "Dropping cycle {}: {}", ticket.cycle, e);
                if self.cycle_in_flight == Some(ticket.cycle) {
                    self.cycle_in_flight = None;
                    self.render_pass.finish_cycle();
                }
                self.update_reasons.insert(UpdateReasons::RETRY);
                None
            }
        }
    }

    /// Forget every tracked fragment and start a new generation.
    ///
    /// The probe scene and color mapping are kept; results still in flight
    /// are discarded. Exclusions survive.
    pub fn reset(&mut self) {
        let generation = self.tracker.reset();
        self.cycle_in_flight = None;
        self.render_pass.finish_cycle();
        self.update_reasons.insert(UpdateReasons::FORCED);
        engine_debug!(SOURCE, "Tracking reset (generation {})", generation);
    }

    // ===== CONTROL =====

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Mark the last result as stale (camera moved, scene changed, ...).
    pub fn request_update(&mut self, reasons: UpdateReasons) {
        self.update_reasons |= reasons;
    }

    pub fn needs_update(&self) -> bool {
        !self.update_reasons.is_empty()
    }

    pub fn update_reasons(&self) -> UpdateReasons {
        self.update_reasons
    }

    pub fn set_auto_update(&mut self, enabled: bool) {
        self.config.auto_update = enabled;
    }

    pub fn set_update_interval(&mut self, interval: Duration) {
        self.config.update_interval = interval;
    }

    pub fn set_render_debug_frame(&mut self, enabled: bool) {
        self.config.render_debug_frame = enabled;
        self.render_pass.set_render_debug_frame(enabled);
    }

    pub fn add_listener(&mut self, listener: impl DiscoveryListener + 'static) {
        self.listeners.push(Box::new(listener));
    }

    pub fn exclude_fragment(&mut self, fragment: impl Into<FragmentId>) {
        self.tracker.exclude(fragment.into());
    }

    pub fn include_fragment(&mut self, fragment: &FragmentId) -> bool {
        self.tracker.include(fragment)
    }

    // ===== GETTERS =====

    /// True while a cycle's decode results have not all been consumed.
    pub fn is_update_in_progress(&self) -> bool {
        self.cycle_in_flight.is_some() || self.decoder.in_flight() > 0
    }

    pub fn currently_discovered(&self) -> &FxHashSet<FragmentId> {
        self.tracker.currently_discovered()
    }

    pub fn previously_discovered(&self) -> &FxHashSet<FragmentId> {
        self.tracker.previously_discovered()
    }

    pub fn pending_removal(&self) -> &FxHashMap<FragmentId, Instant> {
        self.tracker.pending_removal()
    }

    pub fn stats(&self) -> VisibilityStats {
        self.tracker.stats()
    }

    pub fn generation(&self) -> u64 {
        self.tracker.generation()
    }

    pub fn allocator(&self) -> &IdentifierAllocator {
        &self.allocator
    }

    pub fn config(&self) -> &VisibilityConfig {
        &self.config
    }
}

#[cfg(test)]
#[path = "visibility_culler_tests.rs"]
mod tests;
