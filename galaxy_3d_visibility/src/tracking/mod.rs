//! Visibility tracking module
//!
//! Cycle-to-cycle bookkeeping of discovered fragments and the events
//! fired for newly visible ones.

mod discovery;
mod visibility_tracker;

pub use discovery::{DiscoveryEvent, DiscoveryListener};
pub use visibility_tracker::{TrackerStage, VisibilityStats, VisibilityTracker};
