/// Visibility tracker
///
/// The discovery / undiscovery state machine.
///
/// Consumes the decoded colors of both passes of a cycle (opaque first),
/// resolves them to fragments and, once the transparent pass arrives,
/// compares the cycle's union against everything seen before:
///
/// - fragments seen before but absent now enter `pending_removal`,
///   stamped with the latest cycle they were seen missing
/// - fragments never seen before are reported in a `DiscoveryEvent`
/// - fragments visible now leave `pending_removal`
///
/// `previously_discovered` only grows; it is the set of everything ever
/// seen since the last reset.

use std::time::Instant;
use rustc_hash::{FxHashMap, FxHashSet};
use crate::color::{ColorCode, IdentifierAllocator};
use crate::decode::{DecodeTicket, PassKind};
use crate::error::{Error, Result};
use crate::fragment::FragmentId;
use crate::{engine_debug, engine_trace, engine_warn};
use super::discovery::DiscoveryEvent;

const SOURCE: &str = "galaxy3d::VisibilityTracker";

/// Where the tracker stands within a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackerStage {
    AwaitingOpaque,
    AwaitingTransparent { cycle: u64 },
}

/// Counters for monitoring the probe.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VisibilityStats {
    /// Cycles finalized with a discovery event
    pub cycles_completed: u64,
    /// Cycles abandoned (out of order, superseded, stale generation)
    pub cycles_dropped: u64,
    /// Decoded non-background colors with no registered fragment
    pub unresolved_colors: u64,
}

/// Fragments found so far in the cycle being accumulated, in discovery order.
#[derive(Debug, Default)]
struct CycleAccumulator {
    order: Vec<FragmentId>,
    seen: FxHashSet<FragmentId>,
}

impl CycleAccumulator {
    fn insert_all(&mut self, fragments: Vec<FragmentId>) {
        for fragment in fragments {
            if self.seen.insert(fragment.clone()) {
                self.order.push(fragment);
            }
        }
    }
}

pub struct VisibilityTracker {
    generation: u64,
    stage: TrackerStage,
    accumulator: CycleAccumulator,
    currently_discovered: FxHashSet<FragmentId>,
    previously_discovered: FxHashSet<FragmentId>,
    pending_removal: FxHashMap<FragmentId, Instant>,
    exclusions: FxHashSet<FragmentId>,
    stats: VisibilityStats,
}

impl VisibilityTracker {
    pub fn new() -> Self {
        Self {
            generation: 0,
            stage: TrackerStage::AwaitingOpaque,
            accumulator: CycleAccumulator::default(),
            currently_discovered: FxHashSet::default(),
            previously_discovered: FxHashSet::default(),
            pending_removal: FxHashMap::default(),
            exclusions: FxHashSet::default(),
            stats: VisibilityStats::default(),
        }
    }

    /// Map decoded colors to fragments.
    ///
    /// Background and unregistered codes are dropped, as are excluded
    /// fragments. Each fragment appears once, in order of first color.
    pub fn resolve(&mut self, colors: &[ColorCode], allocator: &IdentifierAllocator) -> Vec<FragmentId> {
        let mut seen = FxHashSet::default();
        let mut fragments = Vec::new();
        let mut unresolved = 0u64;

        for code in colors {
            if code.is_background() {
                continue;
            }
            match allocator.resolve(code) {
                Some(fragment) if self.exclusions.contains(fragment) => {}
                Some(fragment) => {
                    if seen.insert(fragment) {
                        fragments.push(fragment.clone());
                    }
                }
                None => unresolved += 1,
            }
        }

        if unresolved > 0 {
            engine_trace!(SOURCE, "{} decoded colors have no fragment", unresolved);
            self.stats.unresolved_colors += unresolved;
        }
        fragments
    }

    /// Feed one decoded pass.
    ///
    /// Returns the cycle's `DiscoveryEvent` when `ticket` is the transparent
    /// pass that completes it.
    ///
    /// Results from another generation are ignored. An opaque result
    /// arriving while a cycle is half done replaces that cycle.
    ///
    /// # Errors
    ///
    /// `OutOfOrderDecode` if a transparent result arrives without its opaque
    /// result, or for another cycle than the one in progress. The cycle is dropped and tracked state is left unchanged.
    pub fn apply(
        &mut self,
        ticket: DecodeTicket,
        colors: &[ColorCode],
        allocator: &IdentifierAllocator,
        now: Instant,
    ) -> Result<Option<DiscoveryEvent>> {
        if ticket.generation != self.generation {
            engine_debug!(SOURCE, "Ignoring {:?} pass of cycle {} from stale generation {}",
                ticket.pass, ticket.cycle, ticket.generation);
            return Ok(None);
        }

        match (self.stage, ticket.pass) {
            (TrackerStage::AwaitingOpaque, PassKind::Opaque) => {
                let fragments = self.resolve(colors, allocator);
                self.begin_cycle(ticket.cycle, fragments);
                Ok(None)
            }
            (TrackerStage::AwaitingTransparent { cycle }, PassKind::Opaque) => {
                engine_warn!(SOURCE, "Cycle {} superseded by cycle {} before completion", cycle, ticket.cycle);
                self.stats.cycles_dropped += 1;
                let fragments = self.resolve(colors, allocator);
                self.begin_cycle(ticket.cycle, fragments);
                Ok(None)
            }
            (TrackerStage::AwaitingTransparent { cycle }, PassKind::Transparent) if cycle == ticket.cycle => {
                let fragments = self.resolve(colors, allocator);
                self.accumulator.insert_all(fragments);
                Ok(Some(self.finalize_cycle(now)))
            }
            (stage, PassKind::Transparent) => {
                engine_warn!(SOURCE, "Transparent pass of cycle {} arrived while {:?}, dropping cycle",
                    ticket.cycle, stage);
                let expected = match stage {
                    TrackerStage::AwaitingOpaque => PassKind::Opaque,
                    TrackerStage::AwaitingTransparent { .. } => PassKind::Transparent,
                };
                self.drop_cycle();
                Err(Error::OutOfOrderDecode {
                    expected,
                    received: PassKind::Transparent,
                })
            }
        }
    }

    fn begin_cycle(&mut self, cycle: u64, fragments: Vec<FragmentId>) {
        self.accumulator = CycleAccumulator::default();
        self.accumulator.insert_all(fragments);
        self.stage = TrackerStage::AwaitingTransparent { cycle };
    }

    fn drop_cycle(&mut self) {
        self.accumulator = CycleAccumulator::default();
        self.stage = TrackerStage::AwaitingOpaque;
        self.stats.cycles_dropped += 1;
    }

    fn finalize_cycle(&mut self, now: Instant) -> DiscoveryEvent {
        let cycle = match self.stage {
            TrackerStage::AwaitingTransparent { cycle } => cycle,
            TrackerStage::AwaitingOpaque => 0,
        };
        let CycleAccumulator { order, seen } = std::mem::take(&mut self.accumulator);
        self.currently_discovered = seen;

        for fragment in &self.previously_discovered {
            if !self.currently_discovered.contains(fragment) {
                self.pending_removal.insert(fragment.clone(), now);
            }
        }

        let newly_discovered: Vec<FragmentId> = order
            .into_iter()
            .filter(|fragment| !self.previously_discovered.contains(fragment))
            .collect();

        for fragment in &self.currently_discovered {
            self.previously_discovered.insert(fragment.clone());
            self.pending_removal.remove(fragment);
        }

        self.stage = TrackerStage::AwaitingOpaque;
        self.stats.cycles_completed += 1;

        engine_debug!(SOURCE, "Cycle {} complete: {} visible, {} new, {} pending removal",
            cycle, self.currently_discovered.len(), newly_discovered.len(), self.pending_removal.len());

        DiscoveryEvent {
            generation: self.generation,
            cycle,
            timestamp: now,
            newly_discovered,
        }
    }

    /// Forget everything tracked and start a new generation.
    ///
    /// Results tagged with an older generation are ignored afterwards.
    /// Exclusions are kept.
    pub fn reset(&mut self) -> u64 {
        self.generation += 1;
        self.stage = TrackerStage::AwaitingOpaque;
        self.accumulator = CycleAccumulator::default();
        self.currently_discovered.clear();
        self.previously_discovered.clear();
        self.pending_removal.clear();
        self.generation
    }

    // ===== EXCLUSIONS =====

    /// Never report `fragment` again; drops it from all tracked sets.
    pub fn exclude(&mut self, fragment: FragmentId) {
        self.currently_discovered.remove(&fragment);
        self.previously_discovered.remove(&fragment);
        self.pending_removal.remove(&fragment);
        self.exclusions.insert(fragment);
    }

    /// Undo `exclude`. Returns false if the fragment was not excluded.
    pub fn include(&mut self, fragment: &FragmentId) -> bool {
        self.exclusions.remove(fragment)
    }

    pub fn is_excluded(&self, fragment: &FragmentId) -> bool {
        self.exclusions.contains(fragment)
    }

    // ===== GETTERS =====

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn stage(&self) -> TrackerStage {
        self.stage
    }

    /// Fragments visible in the last completed cycle
    pub fn currently_discovered(&self) -> &FxHashSet<FragmentId> {
        &self.currently_discovered
    }

    /// Every fragment seen since the last reset
    pub fn previously_discovered(&self) -> &FxHashSet<FragmentId> {
        &self.previously_discovered
    }

    /// Fragments seen before but not anymore → last cycle they were seen missing
    pub fn pending_removal(&self) -> &FxHashMap<FragmentId, Instant> {
        &self.pending_removal
    }

    pub fn stats(&self) -> VisibilityStats {
        self.stats
    }

    pub(crate) fn record_dropped_cycle(&mut self) {
        self.stats.cycles_dropped += 1;
    }
}

impl Default for VisibilityTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "visibility_tracker_tests.rs"]
mod tests;
