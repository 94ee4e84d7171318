//! Visibility culler module
//!
//! Configuration and the orchestrator that schedules probe cycles.

mod visibility_config;
mod visibility_culler;

pub use visibility_config::{UpdateReasons, VisibilityConfig};
pub use visibility_culler::VisibilityCuller;
