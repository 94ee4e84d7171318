/// Discovery events
///
/// What listeners hear at the end of every cycle.

use std::time::Instant;
use crate::fragment::FragmentId;

/// Fragments that became visible for the first time in a completed cycle.
///
/// Fired once per completed two-pass cycle, even when nothing new showed up.
#[derive(Debug, Clone, PartialEq)]
pub struct DiscoveryEvent {
    /// Scene-build generation the cycle belongs to
    pub generation: u64,
    /// Cycle number within the generation
    pub cycle: u64,
    /// Time the cycle was finalized
    pub timestamp: Instant,
    /// Newly visible fragments, opaque-pass finds first, in pixel order
    pub newly_discovered: Vec<FragmentId>,
}

impl DiscoveryEvent {
    pub fn is_empty(&self) -> bool {
        self.newly_discovered.is_empty()
    }
}

/// Receiver of discovery events (typically a loader streaming in full
/// geometry for newly visible fragments).
///
/// Any `FnMut(&DiscoveryEvent) + Send` closure is a listener.
pub trait DiscoveryListener: Send {
    fn on_fragments_discovered(&mut self, event: &DiscoveryEvent);
}

impl<F> DiscoveryListener for F
where
    F: FnMut(&DiscoveryEvent) + Send,
{
    fn on_fragments_discovered(&mut self, event: &DiscoveryEvent) {
        self(event)
    }
}
