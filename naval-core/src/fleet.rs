//! Tracked vessels and their detection confidence

use serde::{Deserialize, Serialize};

use crate::{MAX_SHIP_CONFIDENCE, MIN_SHIP_CONFIDENCE};

/// Classification of a tracked vessel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShipType {
    Friendly,
    Unknown,
}

/// A vessel marker on the satellite view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ship {
    pub id: u32,
    /// Horizontal position in percent of the view width
    pub x: f64,
    /// Vertical position in percent of the view height
    pub y: f64,
    /// Detection confidence in percent
    pub confidence: f64,
    #[serde(rename = "type")]
    pub ship_type: ShipType,
}

impl Ship {
    pub fn new(id: u32, x: f64, y: f64, confidence: f64, ship_type: ShipType) -> Self {
        Self {
            id,
            x,
            y,
            confidence: confidence.clamp(MIN_SHIP_CONFIDENCE, MAX_SHIP_CONFIDENCE),
            ship_type,
        }
    }

    /// Lower confidence, never below the floor
    pub fn decay(&mut self, amount: f64) {
        self.confidence = (self.confidence - amount).clamp(MIN_SHIP_CONFIDENCE, MAX_SHIP_CONFIDENCE);
    }

    /// Raise confidence up to `cap`
    pub fn boost(&mut self, amount: f64, cap: f64) {
        let cap = cap.min(MAX_SHIP_CONFIDENCE);
        self.confidence = (self.confidence + amount).min(cap).max(MIN_SHIP_CONFIDENCE);
    }

    pub fn is_friendly(&self) -> bool {
        self.ship_type == ShipType::Friendly
    }
}

/// The four vessels tracked on a fresh dashboard
pub fn default_fleet() -> Vec<Ship> {
    vec![
        Ship::new(1, 40.0, 30.0, 96.0, ShipType::Friendly),
        Ship::new(2, 60.0, 45.0, 94.0, ShipType::Friendly),
        Ship::new(3, 25.0, 60.0, 72.0, ShipType::Unknown),
        Ship::new(4, 75.0, 20.0, 88.0, ShipType::Friendly),
    ]
}
