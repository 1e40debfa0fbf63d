//! Dashboard scenario configuration
//!
//! A scenario describes the initial model state, the tracked fleet and the
//! simulator tuning. The default scenario is embedded; a TOML file may
//! override any section of it.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::{
    default_fleet, Metrics, RetrainBaseline, Ship, SimulatorConfig, DEFAULT_ALERT_THRESHOLD,
    DEFAULT_BACKGROUND, DEFAULT_TICK_INTERVAL_MS, MAX_DRIFT_SCORE, MAX_SHIP_CONFIDENCE, MIN_ACCURACY,
    MIN_SHIP_CONFIDENCE,
};

const EMBEDDED_SCENARIO: &str = include_str!("../scenarios/default.toml");

/// Errors from loading a scenario
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read scenario file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse scenario: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid scenario: {0}")]
    Invalid(String),
}

/// Descriptive fields for the header and status panels
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioInfo {
    pub name: String,
    pub sector: String,
    pub zoom: f64,
    pub latitude: String,
    pub longitude: String,
    pub background: String,
    pub baseline_version: String,
    pub baseline_age: String,
}

impl Default for ScenarioInfo {
    fn default() -> Self {
        Self {
            name: "pacific-west".to_string(),
            sector: "PACIFIC-W".to_string(),
            zoom: 2.5,
            latitude: "32° 42' 54\" N".to_string(),
            longitude: "117° 09' 45\" W".to_string(),
            background: DEFAULT_BACKGROUND.to_string(),
            baseline_version: "v2.4.1".to_string(),
            baseline_age: "3d 14h".to_string(),
        }
    }
}

/// Timer period and perturbation bounds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulatorSettings {
    pub tick_interval_ms: u64,
    pub max_drift_step: f64,
    pub max_accuracy_step: f64,
    pub max_confidence_step: f64,
}

impl Default for SimulatorSettings {
    fn default() -> Self {
        let steps = SimulatorConfig::default();
        Self {
            tick_interval_ms: DEFAULT_TICK_INTERVAL_MS,
            max_drift_step: steps.max_drift_step,
            max_accuracy_step: steps.max_accuracy_step,
            max_confidence_step: steps.max_confidence_step,
        }
    }
}

impl SimulatorSettings {
    pub fn steps(&self) -> SimulatorConfig {
        SimulatorConfig {
            max_drift_step: self.max_drift_step,
            max_accuracy_step: self.max_accuracy_step,
            max_confidence_step: self.max_confidence_step,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertSettings {
    pub drift_threshold: f64,
}

impl Default for AlertSettings {
    fn default() -> Self {
        Self {
            drift_threshold: DEFAULT_ALERT_THRESHOLD,
        }
    }
}

/// Full dashboard scenario
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardConfig {
    #[serde(default)]
    pub scenario: ScenarioInfo,
    #[serde(default)]
    pub simulator: SimulatorSettings,
    #[serde(default)]
    pub alert: AlertSettings,
    #[serde(default)]
    pub metrics: Metrics,
    #[serde(default)]
    pub retrain: RetrainBaseline,
    #[serde(default = "default_fleet")]
    pub ships: Vec<Ship>,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            scenario: ScenarioInfo::default(),
            simulator: SimulatorSettings::default(),
            alert: AlertSettings::default(),
            metrics: Metrics::default(),
            retrain: RetrainBaseline::default(),
            ships: default_fleet(),
        }
    }
}

impl DashboardConfig {
    /// The scenario shipped with the crate
    pub fn load_embedded() -> Result<Self, ConfigError> {
        Self::from_toml_str(EMBEDDED_SCENARIO)
    }

    /// Parse and validate a scenario document
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: DashboardConfig = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a scenario from a TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.simulator.tick_interval_ms == 0 {
            return Err(ConfigError::Invalid("tick_interval_ms must be positive".to_string()));
        }

        check_model_values("metrics", self.metrics.accuracy, self.metrics.drift_score)?;
        check_model_values("retrain", self.retrain.accuracy, self.retrain.drift_score)?;

        for ship in &self.ships {
            if !(MIN_SHIP_CONFIDENCE..=MAX_SHIP_CONFIDENCE).contains(&ship.confidence) {
                return Err(ConfigError::Invalid(format!(
                    "ship {} confidence {} outside {}-{}",
                    ship.id, ship.confidence, MIN_SHIP_CONFIDENCE, MAX_SHIP_CONFIDENCE
                )));
            }
        }

        let mut ids: Vec<u32> = self.ships.iter().map(|s| s.id).collect();
        ids.sort_unstable();
        ids.dedup();
        if ids.len() != self.ships.len() {
            return Err(ConfigError::Invalid("duplicate ship id".to_string()));
        }

        Ok(())
    }
}

fn check_model_values(section: &str, accuracy: f64, drift: f64) -> Result<(), ConfigError> {
    if !(MIN_ACCURACY..=100.0).contains(&accuracy) {
        return Err(ConfigError::Invalid(format!(
            "{}.accuracy {} outside {}-100",
            section, accuracy, MIN_ACCURACY
        )));
    }
    if !(0.0..=MAX_DRIFT_SCORE).contains(&drift) {
        return Err(ConfigError::Invalid(format!(
            "{}.drift_score {} outside 0-{}",
            section, drift, MAX_DRIFT_SCORE
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ShipType;
    use std::io::Write;

    #[test]
    fn test_embedded_matches_defaults() {
        let config = DashboardConfig::load_embedded().unwrap();
        assert_eq!(config, DashboardConfig::default());
    }

    #[test]
    fn test_partial_override() {
        let config = DashboardConfig::from_toml_str(
            r#"
            [alert]
            drift_threshold = 40.0

            [[ships]]
            id = 9
            x = 10.0
            y = 10.0
            confidence = 80.0
            type = "unknown"
            "#,
        )
        .unwrap();

        assert_eq!(config.alert.drift_threshold, 40.0);
        assert_eq!(config.ships.len(), 1);
        assert_eq!(config.ships[0].ship_type, ShipType::Unknown);
        assert_eq!(config.metrics, Metrics::default());
        assert_eq!(config.simulator.tick_interval_ms, 5000);
    }

    #[test]
    fn test_rejects_out_of_range_confidence() {
        let result = DashboardConfig::from_toml_str(
            r#"
            [[ships]]
            id = 1
            x = 0.0
            y = 0.0
            confidence = 20.0
            type = "friendly"
            "#,
        );
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_partial_metrics_and_retrain_override() {
        let config = DashboardConfig::from_toml_str(
            r#"
            [metrics]
            drift_score = 24.0

            [retrain]
            confidence_boost = 10.0
            "#,
        )
        .unwrap();

        assert_eq!(config.metrics.drift_score, 24.0);
        assert_eq!(config.metrics.accuracy, 94.0);
        assert_eq!(config.metrics.last_updated, "22:38:45");
        assert_eq!(config.retrain.confidence_boost, 10.0);
        assert_eq!(config.retrain.accuracy, 98.0);
        assert_eq!(config.retrain.confidence_cap, 98.0);
    }

    #[test]
    fn test_simulator_steps_override() {
        let config = DashboardConfig::from_toml_str("[simulator]\nmax_drift_step = 4.0\n").unwrap();
        let steps = config.simulator.steps();
        assert_eq!(steps.max_drift_step, 4.0);
        assert_eq!(steps.max_accuracy_step, 0.5);
        assert_eq!(steps.max_confidence_step, 1.5);
    }

    #[test]
    fn test_rejects_accuracy_below_floor() {
        let result = DashboardConfig::from_toml_str("[metrics]\naccuracy = 10.0\n");
        assert!(matches!(result, Err(ConfigError::Invalid(_))));

        let result = DashboardConfig::from_toml_str("[metrics]\naccuracy = 70.0\n");
        assert!(result.is_ok());
    }

    #[test]
    fn test_rejects_out_of_range_retrain_baseline() {
        let result = DashboardConfig::from_toml_str("[retrain]\naccuracy = 65.0\n");
        assert!(matches!(result, Err(ConfigError::Invalid(_))));

        let result = DashboardConfig::from_toml_str("[retrain]\ndrift_score = 120.0\n");
        assert!(matches!(result, Err(ConfigError::Invalid(_))));

        let result = DashboardConfig::from_toml_str("[retrain]\ndrift_score = -1.0\n");
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_rejects_zero_interval() {
        let result = DashboardConfig::from_toml_str("[simulator]\ntick_interval_ms = 0\n");
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_parse_error() {
        let result = DashboardConfig::from_toml_str("[alert\n");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[scenario]\nsector = \"ATLANTIC-E\"").unwrap();

        let config = DashboardConfig::load_from_file(file.path()).unwrap();
        assert_eq!(config.scenario.sector, "ATLANTIC-E");
        assert_eq!(config.scenario.baseline_version, "v2.4.1");
    }
}
