//! Metrics simulator
//!
//! Every tick nudges the dashboard toward a degraded model:
//! - drift score rises by U(0, max_drift_step), capped at 100
//! - accuracy falls by U(0, max_accuracy_step), floored at 70
//! - each ship loses U(0, max_confidence_step) confidence, floored at 60
//!
//! The random source and the clock are injected so a seeded RNG reproduces
//! the exact same trajectory.

use chrono::NaiveTime;
use rand::Rng;

use crate::{format_clock, Metrics, Ship, MAX_DRIFT_SCORE, MIN_ACCURACY};

/// Perturbation bounds for a single tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulatorConfig {
    pub max_drift_step: f64,
    pub max_accuracy_step: f64,
    pub max_confidence_step: f64,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            max_drift_step: 2.0,
            max_accuracy_step: 0.5,
            max_confidence_step: 1.5,
        }
    }
}

/// What a tick changed
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickOutcome {
    pub previous_drift: f64,
    pub drift_score: f64,
    pub accuracy: f64,
    /// Whether this tick raised the drift alert
    pub alert_raised: bool,
}

/// Bounded random-walk simulator for model degradation
#[derive(Debug, Clone, Default)]
pub struct DriftSimulator {
    config: SimulatorConfig,
}

impl DriftSimulator {
    pub fn new(config: SimulatorConfig) -> Self {
        Self {
            config: SimulatorConfig {
                max_drift_step: config.max_drift_step.max(0.0),
                max_accuracy_step: config.max_accuracy_step.max(0.0),
                max_confidence_step: config.max_confidence_step.max(0.0),
            },
        }
    }

    pub fn config(&self) -> &SimulatorConfig {
        &self.config
    }

    /// Advance the metrics and the fleet by one period.
    ///
    /// `alert_raised` is always false here; the dashboard fills it in after
    /// running the alert trigger.
    pub fn tick<R: Rng + ?Sized>(
        &self,
        metrics: &mut Metrics,
        ships: &mut [Ship],
        rng: &mut R,
        now: NaiveTime,
    ) -> TickOutcome {
        let previous_drift = metrics.drift_score;

        metrics.drift_score = (metrics.drift_score + rng.gen::<f64>() * self.config.max_drift_step)
            .clamp(0.0, MAX_DRIFT_SCORE);
        metrics.accuracy =
            (metrics.accuracy - rng.gen::<f64>() * self.config.max_accuracy_step).max(MIN_ACCURACY);

        for ship in ships.iter_mut() {
            ship.decay(rng.gen::<f64>() * self.config.max_confidence_step);
        }

        metrics.last_updated = format_clock(now);

        TickOutcome {
            previous_drift,
            drift_score: metrics.drift_score,
            accuracy: metrics.accuracy,
            alert_raised: false,
        }
    }
}
