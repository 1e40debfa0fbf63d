//! Model performance metrics shown on the dashboard

use serde::{Deserialize, Serialize};

/// Simulated model performance metrics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Metrics {
    /// Accuracy in percent
    pub accuracy: f64,
    /// Precision in percent
    pub precision: f64,
    /// Recall in percent
    pub recall: f64,
    /// Synthetic drift score (0 - 100)
    pub drift_score: f64,
    /// Last update as a 24h `HH:MM:SS` string
    pub last_updated: String,
    /// Anomalies detected since the last retrain
    pub anomalies: u32,
    /// Prediction latency in milliseconds
    pub prediction_latency: u32,
}

impl Default for Metrics {
    fn default() -> Self {
        Self {
            accuracy: 94.0,
            precision: 92.0,
            recall: 89.0,
            drift_score: 18.0,
            last_updated: "22:38:45".to_string(),
            anomalies: 2,
            prediction_latency: 42,
        }
    }
}

/// Values the metrics take right after a retrain
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrainBaseline {
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub drift_score: f64,
    /// Confidence added to every ship
    pub confidence_boost: f64,
    /// Ship confidence never exceeds this after a retrain
    pub confidence_cap: f64,
}

impl Default for RetrainBaseline {
    fn default() -> Self {
        Self {
            accuracy: 98.0,
            precision: 96.0,
            recall: 94.0,
            drift_score: 5.0,
            confidence_boost: 20.0,
            confidence_cap: 98.0,
        }
    }
}

impl Metrics {
    /// Reset to healthy values, keeping the prediction latency
    pub fn reset_to(&mut self, baseline: &RetrainBaseline, last_updated: String) {
        self.accuracy = baseline.accuracy;
        self.precision = baseline.precision;
        self.recall = baseline.recall;
        self.drift_score = baseline.drift_score;
        self.anomalies = 0;
        self.last_updated = last_updated;
    }
}
