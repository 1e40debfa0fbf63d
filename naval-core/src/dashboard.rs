//! Dashboard application state
//!
//! One explicit state object holds everything the view renders. All
//! operations are plain state transforms; the runtime decides when they run.

use chrono::NaiveTime;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{
    format_clock, AreaSelection, AreaSelector, DashboardConfig, DriftAlert, DriftReport,
    DriftSimulator, Metrics, Rect, RetrainBaseline, ScenarioInfo, Ship, TickOutcome,
};

/// Everything a finished upload changes on the dashboard
#[derive(Debug, Clone, PartialEq)]
pub struct DetectionOutcome {
    /// Name of the uploaded file
    pub image_name: String,
    /// Annotated image as a data URL, when the service returned one
    pub annotated_image: Option<String>,
    pub drift: DriftReport,
}

/// The dashboard's in-memory state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardState {
    pub scenario: ScenarioInfo,
    pub metrics: Metrics,
    pub ships: Vec<Ship>,
    pub alert: DriftAlert,
    pub show_metrics_panel: bool,
    pub show_drift_popup: bool,
    pub background_image: String,
    pub processed_image: Option<String>,
    pub is_loading: bool,
    pub drift_report: Option<DriftReport>,
    pub area: AreaSelector,
    /// Bumped after every upload so the same file can be sent again
    pub upload_count: u32,
    retrain: RetrainBaseline,
}

impl Default for DashboardState {
    fn default() -> Self {
        Self::new(&DashboardConfig::default())
    }
}

impl DashboardState {
    pub fn new(config: &DashboardConfig) -> Self {
        Self {
            scenario: config.scenario.clone(),
            metrics: config.metrics.clone(),
            ships: config.ships.clone(),
            alert: DriftAlert::new(config.alert.drift_threshold),
            show_metrics_panel: false,
            show_drift_popup: false,
            background_image: config.scenario.background.clone(),
            processed_image: None,
            is_loading: false,
            drift_report: None,
            area: AreaSelector::new(),
            upload_count: 0,
            retrain: config.retrain,
        }
    }

    pub fn alert_active(&self) -> bool {
        self.alert.is_active()
    }

    /// One simulator period followed by the alert trigger
    pub fn tick<R: Rng + ?Sized>(
        &mut self,
        simulator: &DriftSimulator,
        rng: &mut R,
        now: NaiveTime,
    ) -> TickOutcome {
        let mut outcome = simulator.tick(&mut self.metrics, &mut self.ships, rng, now);
        outcome.alert_raised = self.alert.observe(outcome.previous_drift, outcome.drift_score);

        if outcome.alert_raised {
            info!(
                "Drift alert raised: score {:.1} crossed {:.1}",
                outcome.drift_score,
                self.alert.threshold()
            );
        }
        debug!(
            "Tick: drift {:.2}, accuracy {:.2}",
            outcome.drift_score, outcome.accuracy
        );

        outcome
    }

    /// Reset metrics to the healthy baseline and clear the alert
    pub fn retrain(&mut self, now: NaiveTime) {
        self.alert.dismiss();
        self.metrics.reset_to(&self.retrain, format_clock(now));

        for ship in &mut self.ships {
            ship.boost(self.retrain.confidence_boost, self.retrain.confidence_cap);
        }

        info!("Model retrained at {}", self.metrics.last_updated);
    }

    pub fn toggle_alert(&mut self) -> bool {
        self.alert.toggle()
    }

    pub fn dismiss_alert(&mut self) {
        self.alert.dismiss();
    }

    pub fn toggle_metrics_panel(&mut self) -> bool {
        self.show_metrics_panel = !self.show_metrics_panel;
        self.show_metrics_panel
    }

    pub fn close_drift_popup(&mut self) {
        self.show_drift_popup = false;
    }

    pub fn select_area<R: Rng + ?Sized>(
        &mut self,
        rect: Rect,
        rng: &mut R,
        now: NaiveTime,
    ) -> Option<&AreaSelection> {
        self.area.select(rect, rng, now)
    }

    pub fn set_area_notes(&mut self, notes: &str) -> bool {
        self.area.set_notes(notes)
    }

    pub fn close_area(&mut self) {
        self.area.close();
    }

    /// An upload has been handed to the detection service
    pub fn begin_upload(&mut self) {
        self.is_loading = true;
    }

    /// Apply a successful detection round-trip
    pub fn complete_upload(&mut self, outcome: DetectionOutcome) {
        if outcome.drift.detected() {
            self.drift_report = Some(outcome.drift);
            self.alert.raise();
            self.show_drift_popup = true;
        }

        match outcome.annotated_image {
            Some(data_url) => {
                self.processed_image = Some(data_url.clone());
                self.background_image = data_url;
            }
            None => self.background_image = outcome.image_name,
        }

        self.finish_upload();
    }

    /// The upload failed; only the loading flag changes
    pub fn fail_upload(&mut self) {
        self.finish_upload();
    }

    fn finish_upload(&mut self) {
        self.is_loading = false;
        self.upload_count += 1;
    }
}
