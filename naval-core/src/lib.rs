//! Naval Dashboard Core - state and simulation model for the surveillance dashboard
//!
//! This crate provides the in-memory side of the dashboard:
//! - Model performance metrics and the tracked fleet
//! - A periodic drift simulator driven by bounded random perturbation
//! - Rising-edge drift alerting and the retrain action
//! - Rectangle area selection with generated sector intel
//! - Display classification and text panels for terminal rendering

pub mod alert;
pub mod area;
pub mod config;
pub mod dashboard;
pub mod display;
pub mod drift;
pub mod fleet;
pub mod metrics;
pub mod simulator;

pub use alert::*;
pub use area::*;
pub use config::*;
pub use dashboard::*;
pub use display::*;
pub use drift::*;
pub use fleet::*;
pub use metrics::*;
pub use simulator::*;

use chrono::NaiveTime;

/// Default simulator period in milliseconds
pub const DEFAULT_TICK_INTERVAL_MS: u64 = 5000;

/// Drift score above which the alert is raised
pub const DEFAULT_ALERT_THRESHOLD: f64 = 25.0;

/// Drift score above which the model status reads as drifting
pub const DRIFT_STATUS_THRESHOLD: f64 = 20.0;

/// Upper bound of the drift score
pub const MAX_DRIFT_SCORE: f64 = 100.0;

/// Accuracy never decays below this floor
pub const MIN_ACCURACY: f64 = 70.0;

/// Ship confidence bounds
pub const MIN_SHIP_CONFIDENCE: f64 = 60.0;
pub const MAX_SHIP_CONFIDENCE: f64 = 100.0;

/// Background shown before any upload
pub const DEFAULT_BACKGROUND: &str = "/satellite-view.jpg";

/// 24h wall-clock format used for every timestamp on the dashboard
pub const CLOCK_FORMAT: &str = "%H:%M:%S";

/// Format a wall-clock time the way the dashboard displays it
pub fn format_clock(time: NaiveTime) -> String {
    time.format(CLOCK_FORMAT).to_string()
}

/// Current local wall-clock time
pub fn local_clock() -> NaiveTime {
    chrono::Local::now().time()
}
