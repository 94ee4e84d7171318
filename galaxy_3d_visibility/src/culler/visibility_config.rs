/// Visibility probe configuration and update reasons.

use std::time::Duration;
use bitflags::bitflags;
use crate::error::{Error, Result};

/// Configuration of a `VisibilityCuller`
#[derive(Debug, Clone, PartialEq)]
pub struct VisibilityConfig {
    /// Minimum time between two automatic cycles
    pub update_interval: Duration,
    /// Probe target width in pixels (independent of the window)
    pub target_width: u32,
    /// Probe target height in pixels (independent of the window)
    pub target_height: u32,
    /// Run cycles from `tick()` when an update is needed
    pub auto_update: bool,
    /// Also draw the probe scene to the screen after each cycle
    pub render_debug_frame: bool,
}

impl Default for VisibilityConfig {
    fn default() -> Self {
        Self {
            update_interval: Duration::from_millis(1000),
            target_width: 512,
            target_height: 512,
            auto_update: true,
            render_debug_frame: false,
        }
    }
}

impl VisibilityConfig {
    pub fn with_update_interval(mut self, interval: Duration) -> Self {
        self.update_interval = interval;
        self
    }

    pub fn with_target_size(mut self, width: u32, height: u32) -> Self {
        self.target_width = width;
        self.target_height = height;
        self
    }

    pub fn with_auto_update(mut self, enabled: bool) -> Self {
        self.auto_update = enabled;
        self
    }

    pub fn with_render_debug_frame(mut self, enabled: bool) -> Self {
        self.render_debug_frame = enabled;
        self
    }

    /// # Errors
    ///
    /// `InitializationFailed` for an empty probe target or a zero interval.
    pub fn validate(&self) -> Result<()> {
        if self.target_width == 0 || self.target_height == 0 {
            return Err(Error::InitializationFailed(format!(
                "Probe target must not be empty ({}x{})",
                self.target_width, self.target_height
            )));
        }
        if self.update_interval.is_zero() {
            return Err(Error::InitializationFailed("Update interval must not be zero".to_string()));
        }
        Ok(())
    }
}

bitflags! {
    /// Why the probe needs a new cycle. Empty means the last result still holds.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct UpdateReasons: u32 {
        /// The view changed
        const CAMERA_MOVED  = 1 << 0;
        /// Geometry was added, removed or moved
        const SCENE_CHANGED = 1 << 1;
        /// Explicit request from the host
        const FORCED        = 1 << 2;
        /// The previous cycle was dropped and must be redone
        const RETRY         = 1 << 3;
    }
}

#[cfg(test)]
#[path = "visibility_config_tests.rs"]
mod tests;
