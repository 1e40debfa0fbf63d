//! Display classification and text panels
//!
//! Colour thresholds from the dashboard are expressed as bands, and each
//! panel renders to plain text for the terminal.

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Write};

use crate::{
    format_clock, AreaData, DashboardState, DriftReport, Metrics, ThreatLevel,
    DRIFT_STATUS_THRESHOLD,
};

/// Confidence colour band: >90, >80, >70, otherwise low
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceBand {
    Excellent,
    Good,
    Fair,
    Low,
}

impl ConfidenceBand {
    pub fn classify(confidence: f64) -> Self {
        if confidence > 90.0 {
            ConfidenceBand::Excellent
        } else if confidence > 80.0 {
            ConfidenceBand::Good
        } else if confidence > 70.0 {
            ConfidenceBand::Fair
        } else {
            ConfidenceBand::Low
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            ConfidenceBand::Excellent => "emerald",
            ConfidenceBand::Good => "teal",
            ConfidenceBand::Fair => "blue",
            ConfidenceBand::Low => "amber",
        }
    }
}

/// Drift score colour band: <10, <20, <30, otherwise critical
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DriftBand {
    Normal,
    Elevated,
    Warning,
    Critical,
}

impl DriftBand {
    pub fn classify(score: f64) -> Self {
        if score < 10.0 {
            DriftBand::Normal
        } else if score < 20.0 {
            DriftBand::Elevated
        } else if score < 30.0 {
            DriftBand::Warning
        } else {
            DriftBand::Critical
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            DriftBand::Normal => "emerald",
            DriftBand::Elevated => "blue",
            DriftBand::Warning => "amber",
            DriftBand::Critical => "red",
        }
    }
}

/// Model status line on the main view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModelStatus {
    Nominal,
    DriftDetected,
}

impl ModelStatus {
    pub fn from_metrics(metrics: &Metrics) -> Self {
        if metrics.drift_score > DRIFT_STATUS_THRESHOLD {
            ModelStatus::DriftDetected
        } else {
            ModelStatus::Nominal
        }
    }

    /// Retraining is only offered while drifting
    pub fn offers_retrain(&self) -> bool {
        *self == ModelStatus::DriftDetected
    }

    pub fn advice(&self) -> &'static str {
        match self {
            ModelStatus::DriftDetected => {
                "Model performance degradation detected. Recommend retraining with recent data to improve accuracy."
            }
            ModelStatus::Nominal => {
                "Model performance within acceptable parameters. Continuous monitoring active."
            }
        }
    }
}

impl fmt::Display for ModelStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelStatus::Nominal => write!(f, "NOMINAL"),
            ModelStatus::DriftDetected => write!(f, "DRIFT DETECTED"),
        }
    }
}

pub fn threat_color(level: ThreatLevel) -> &'static str {
    match level {
        ThreatLevel::Low => "emerald",
        ThreatLevel::Medium => "amber",
        ThreatLevel::High => "red",
    }
}

/// Text progress bar, `width` cells for 0-100
pub fn bar(percent: f64, width: usize) -> String {
    let filled = ((percent.clamp(0.0, 100.0) / 100.0) * width as f64).round() as usize;
    format!("[{}{}]", "#".repeat(filled), "-".repeat(width - filled))
}

/// Status block in the bottom corners of the satellite view
pub fn status_block(state: &DashboardState, now: NaiveTime) -> String {
    let mut out = String::new();
    if state.is_loading {
        let _ = writeln!(out, "PROCESSING IMAGE...");
    } else {
        let _ = writeln!(out, "SCAN ACTIVE");
    }
    let _ = writeln!(out, "TRACKING: {} VESSELS", state.ships.len());
    let _ = writeln!(out, "MODEL STATUS: {}", ModelStatus::from_metrics(&state.metrics));
    let _ = writeln!(out, "ZOOM: {}x", state.scenario.zoom);
    let _ = writeln!(out, "SECTOR: {}", state.scenario.sector);
    let _ = write!(out, "TIME: {} UTC", format_clock(now));
    out
}

/// Ship markers with confidence
pub fn fleet_panel(state: &DashboardState) -> String {
    let mut out = String::new();
    for ship in &state.ships {
        let kind = if ship.is_friendly() { "friendly" } else { "unknown" };
        let _ = writeln!(
            out,
            "#{} {:<8} ({:>3.0}%, {:>3.0}%) {:>3.0}% [{}]",
            ship.id,
            kind,
            ship.x,
            ship.y,
            ship.confidence,
            ConfidenceBand::classify(ship.confidence).color()
        );
    }
    out
}

/// "Metrics" tab of the model performance panel
pub fn metrics_panel(metrics: &Metrics) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "MODEL PERFORMANCE METRICS");
    for (label, value) in [
        ("Accuracy", metrics.accuracy),
        ("Precision", metrics.precision),
        ("Recall", metrics.recall),
    ] {
        let _ = writeln!(out, "{:<10} {:>5.1}% {}", label, value, bar(value, 20));
    }
    let _ = writeln!(out, "Prediction Latency: {} ms", metrics.prediction_latency);
    let _ = writeln!(out, "Anomalies Detected: {}", metrics.anomalies);
    let _ = write!(out, "Last Updated: {}", metrics.last_updated);
    out
}

/// "Drift Analysis" tab of the model performance panel
pub fn drift_panel(state: &DashboardState) -> String {
    let metrics = &state.metrics;
    let status = ModelStatus::from_metrics(metrics);
    let band = DriftBand::classify(metrics.drift_score);

    let mut out = String::new();
    let _ = writeln!(
        out,
        "Drift Score {:>5.1}% {} [{}]",
        metrics.drift_score,
        bar(metrics.drift_score, 20),
        band.color()
    );
    let _ = writeln!(out, "Drift Analysis: {}", status.advice());
    let _ = write!(
        out,
        "Baseline Version: {}  Age: {}",
        state.scenario.baseline_version, state.scenario.baseline_age
    );
    if status.offers_retrain() {
        let _ = write!(out, "\n[Retrain Model]");
    }
    out
}

/// The see-through alert banner, if shown
pub fn alert_banner(state: &DashboardState) -> Option<String> {
    state
        .alert_active()
        .then(|| "! Model drift detected. Confirm to set new baseline? [No] [Yes]".to_string())
}

fn fixed(value: Option<f64>, digits: usize) -> String {
    value
        .map(|v| format!("{:.*}", digits, v))
        .unwrap_or_else(|| "n/a".to_string())
}

/// Popup shown when the service reports drift
pub fn drift_popup(report: &DriftReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "DRIFT DETECTED");
    let _ = writeln!(
        out,
        "Distance  {} {}",
        fixed(report.distance, 4),
        bar(report.distance_ratio().unwrap_or(0.0), 20)
    );
    let _ = writeln!(
        out,
        "Threshold {} {}",
        fixed(report.distance_threshold, 4),
        bar(report.threshold_ratio().unwrap_or(0.0), 20)
    );
    let _ = write!(
        out,
        "Significant model drift detected. The current data distribution has deviated from the training distribution. P-value: {} (Threshold: {})",
        fixed(report.p_value, 6),
        report
            .threshold
            .map(|t| t.to_string())
            .unwrap_or_else(|| "n/a".to_string())
    );
    out
}

/// Popup for a selected area
pub fn area_popup(data: &AreaData) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", data.area_id);
    let _ = writeln!(
        out,
        "Threat Level: {} [{}]",
        data.threat_level.as_str(),
        threat_color(data.threat_level)
    );
    let _ = writeln!(out, "Vessels: {}", data.vessels);
    let _ = writeln!(out, "Last Scan: {}", data.last_scan);
    let _ = writeln!(out, "Anomalies: {}", data.anomalies);
    let _ = write!(out, "Confidence: {}%", data.confidence);
    if !data.notes.is_empty() {
        let _ = write!(out, "\nNotes: {}", data.notes);
    }
    out
}

/// Full dashboard frame: status, fleet, open panels and popups
pub fn render(state: &DashboardState, now: NaiveTime) -> String {
    let mut sections = vec![
        format!(
            "NAVAL COMMAND SYSTEM  {}  {}",
            state.scenario.latitude, state.scenario.longitude
        ),
        status_block(state, now),
        fleet_panel(state).trim_end().to_string(),
    ];

    if state.show_metrics_panel {
        sections.push(metrics_panel(&state.metrics));
        sections.push(drift_panel(state));
    }
    if let Some(banner) = alert_banner(state) {
        sections.push(banner);
    }
    if state.show_drift_popup {
        if let Some(report) = &state.drift_report {
            sections.push(drift_popup(report));
        }
    }
    if let Some(selection) = state.area.selection() {
        sections.push(area_popup(&selection.data));
    }

    sections.join("\n\n")
}
