//! Drift alert trigger
//!
//! The alert is raised on a rising edge only: the drift score must move from
//! at-or-below the threshold to above it while the alert is not already shown.

use serde::{Deserialize, Serialize};

use crate::DEFAULT_ALERT_THRESHOLD;

/// Visibility flag for the "model drift detected" banner
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DriftAlert {
    threshold: f64,
    active: bool,
}

impl Default for DriftAlert {
    fn default() -> Self {
        Self::new(DEFAULT_ALERT_THRESHOLD)
    }
}

impl DriftAlert {
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold,
            active: false,
        }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Feed a drift score transition. Returns true if the alert was raised.
    pub fn observe(&mut self, previous: f64, current: f64) -> bool {
        if !self.active && previous <= self.threshold && current > self.threshold {
            self.active = true;
            return true;
        }
        false
    }

    /// Raise the alert regardless of the score (service-reported drift)
    pub fn raise(&mut self) {
        self.active = true;
    }

    /// Flip the flag unconditionally. Returns the new state.
    pub fn toggle(&mut self) -> bool {
        self.active = !self.active;
        self.active
    }

    pub fn dismiss(&mut self) {
        self.active = false;
    }
}
