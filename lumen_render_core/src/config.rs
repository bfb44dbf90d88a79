/// Render core configuration
///
/// One `RenderCoreConfig` is handed to `RenderContext::new` and shared (read-only)
/// by every manager the context creates.

use crate::error::{Error, Result};
use crate::log::LogSeverity;

/// Hard upper bound on dense state ids (10 bits)
pub const MAX_DENSE_STATE_IDS: u32 = 1 << 10;

/// Render core configuration
#[derive(Debug, Clone)]
pub struct RenderCoreConfig {
    /// Number of dense ids available per state category (1..=1024)
    pub max_state_ids: u32,
    /// Enables bounds checks and their ERROR logs on hot paths
    pub debug_checks: bool,
    /// Initial capacity in bytes of the per-frame sync arena
    pub frame_arena_capacity: usize,
    /// Number of sync packets that may wait for the core thread before
    /// `CoreObjectManager::sync_to_core` blocks
    pub max_in_flight_frames: u32,
    /// Minimum severity installed on the `Engine` log hub by `RenderContext::new`
    /// (None leaves the current setting alone)
    pub log_min_severity: Option<LogSeverity>,
}

impl Default for RenderCoreConfig {
    fn default() -> Self {
        Self {
            max_state_ids: MAX_DENSE_STATE_IDS,
            debug_checks: cfg!(debug_assertions),
            frame_arena_capacity: 64 * 1024,
            max_in_flight_frames: 1,
            log_min_severity: None,
        }
    }
}

impl RenderCoreConfig {
    /// Set the number of dense ids per state category
    pub fn with_max_state_ids(mut self, max_state_ids: u32) -> Self {
        self.max_state_ids = max_state_ids;
        self
    }

    /// Enable or disable hot-path bounds checks
    pub fn with_debug_checks(mut self, debug_checks: bool) -> Self {
        self.debug_checks = debug_checks;
        self
    }

    /// Set the initial sync arena capacity
    pub fn with_frame_arena_capacity(mut self, capacity: usize) -> Self {
        self.frame_arena_capacity = capacity;
        self
    }

    /// Set the number of in-flight sync packets
    pub fn with_max_in_flight_frames(mut self, frames: u32) -> Self {
        self.max_in_flight_frames = frames;
        self
    }

    /// Set the minimum log severity
    pub fn with_log_min_severity(mut self, severity: LogSeverity) -> Self {
        self.log_min_severity = Some(severity);
        self
    }

    /// Check the configuration
    ///
    /// # Errors
    ///
    /// Returns `Error::InitializationFailed` if:
    /// - `max_state_ids` is 0 or above 1024
    /// - `max_in_flight_frames` is 0
    pub fn validate(&self) -> Result<()> {
        if self.max_state_ids == 0 || self.max_state_ids > MAX_DENSE_STATE_IDS {
            return Err(Error::InitializationFailed(format!(
                "max_state_ids must be in 1..={}, got {}",
                MAX_DENSE_STATE_IDS, self.max_state_ids
            )));
        }
        if self.max_in_flight_frames == 0 {
            return Err(Error::InitializationFailed(
                "max_in_flight_frames must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
