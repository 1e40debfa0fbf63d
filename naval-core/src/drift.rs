//! Drift report returned by the detection service
//!
//! The service response is consumed without schema validation: a missing or
//! wrongly typed field is simply absent.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Result of a `/detect_drift` call
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DriftReport {
    pub is_drift: Option<bool>,
    pub distance: Option<f64>,
    pub distance_threshold: Option<f64>,
    pub p_value: Option<f64>,
    pub threshold: Option<f64>,
}

impl DriftReport {
    /// Pick the known fields out of an arbitrary JSON document
    pub fn from_json(value: &Value) -> Self {
        Self {
            is_drift: value.get("is_drift").and_then(Value::as_bool),
            distance: value.get("distance").and_then(Value::as_f64),
            distance_threshold: value.get("distance_threshold").and_then(Value::as_f64),
            p_value: value.get("p_value").and_then(Value::as_f64),
            threshold: value.get("threshold").and_then(Value::as_f64),
        }
    }

    /// True only when the service explicitly reported drift
    pub fn detected(&self) -> bool {
        self.is_drift == Some(true)
    }

    /// Distance as a percentage of its threshold, capped at 100
    pub fn distance_ratio(&self) -> Option<f64> {
        percent_of(self.distance?, self.distance_threshold?)
    }

    /// Threshold as a percentage of the distance, capped at 100
    pub fn threshold_ratio(&self) -> Option<f64> {
        percent_of(self.distance_threshold?, self.distance?)
    }
}

fn percent_of(part: f64, whole: f64) -> Option<f64> {
    if whole <= 0.0 || !whole.is_finite() || !part.is_finite() {
        return None;
    }
    Some((part / whole * 100.0).clamp(0.0, 100.0))
}
