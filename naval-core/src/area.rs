//! Rectangle area selection on the satellite view
//!
//! Dragging a rectangle larger than the minimum extent opens a popup with
//! generated intel for the selected sector.

use chrono::NaiveTime;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::format_clock;

/// Rectangles must exceed this many pixels on both axes
pub const MIN_SELECTION_EXTENT: f64 = 20.0;

/// Threat assessment for a selected sector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ThreatLevel {
    Low,
    Medium,
    High,
}

impl ThreatLevel {
    pub const ALL: [ThreatLevel; 3] = [ThreatLevel::Low, ThreatLevel::Medium, ThreatLevel::High];

    pub fn as_str(&self) -> &'static str {
        match self {
            ThreatLevel::Low => "Low",
            ThreatLevel::Medium => "Medium",
            ThreatLevel::High => "High",
        }
    }
}

/// Generated intel for a selected sector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AreaData {
    pub area_id: String,
    pub threat_level: ThreatLevel,
    pub vessels: u32,
    pub last_scan: String,
    pub anomalies: u32,
    pub confidence: u32,
    pub notes: String,
}

impl Default for AreaData {
    fn default() -> Self {
        Self {
            area_id: "SECTOR-A42".to_string(),
            threat_level: ThreatLevel::Medium,
            vessels: 3,
            last_scan: "22:45:12".to_string(),
            anomalies: 1,
            confidence: 87,
            notes: String::new(),
        }
    }
}

impl AreaData {
    /// Random sector intel: `SECTOR-<A-Z><0-99>`, 1-5 vessels, 0-2 anomalies,
    /// 70-99% confidence
    pub fn generate<R: Rng + ?Sized>(rng: &mut R, now: NaiveTime) -> Self {
        let letter = char::from(b'A' + rng.gen_range(0..26u8));
        let number = rng.gen_range(0..100u32);
        let threat_level = ThreatLevel::ALL[rng.gen_range(0..ThreatLevel::ALL.len())];

        Self {
            area_id: format!("SECTOR-{}{}", letter, number),
            threat_level,
            vessels: rng.gen_range(1..=5),
            last_scan: format_clock(now),
            anomalies: rng.gen_range(0..=2),
            confidence: rng.gen_range(70..=99),
            notes: String::new(),
        }
    }
}

/// A rectangle drawn from a start point with a signed extent
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub start_x: f64,
    pub start_y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn is_selection(&self) -> bool {
        self.width.abs() > MIN_SELECTION_EXTENT && self.height.abs() > MIN_SELECTION_EXTENT
    }

    /// Corner where the popup is anchored: the far edge in drawing direction
    pub fn popup_anchor(&self) -> (f64, f64) {
        (
            self.start_x + self.width.max(0.0),
            self.start_y + self.height.max(0.0),
        )
    }
}

/// An accepted selection and its popup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AreaSelection {
    pub rect: Rect,
    pub popup_x: f64,
    pub popup_y: f64,
    pub data: AreaData,
}

/// Press/drag/release state for drawing a selection
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AreaSelector {
    drawing: bool,
    rect: Rect,
    selection: Option<AreaSelection>,
}

impl AreaSelector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_drawing(&self) -> bool {
        self.drawing
    }

    pub fn current_rect(&self) -> Rect {
        self.rect
    }

    pub fn selection(&self) -> Option<&AreaSelection> {
        self.selection.as_ref()
    }

    /// Start a new rectangle at a point relative to the view
    pub fn press(&mut self, x: f64, y: f64) {
        self.rect = Rect {
            start_x: x,
            start_y: y,
            width: 0.0,
            height: 0.0,
        };
        self.drawing = true;
    }

    pub fn drag(&mut self, x: f64, y: f64) {
        if !self.drawing {
            return;
        }
        self.rect.width = x - self.rect.start_x;
        self.rect.height = y - self.rect.start_y;
    }

    /// Finish drawing; a large enough rectangle becomes the selection
    pub fn release<R: Rng + ?Sized>(&mut self, rng: &mut R, now: NaiveTime) -> Option<&AreaSelection> {
        if !self.drawing {
            return None;
        }
        self.drawing = false;

        if !self.rect.is_selection() {
            return None;
        }

        let (popup_x, popup_y) = self.rect.popup_anchor();
        self.selection = Some(AreaSelection {
            rect: self.rect,
            popup_x,
            popup_y,
            data: AreaData::generate(rng, now),
        });
        self.selection.as_ref()
    }

    /// Pointer left the view mid-drag
    pub fn leave(&mut self) {
        self.drawing = false;
    }

    /// Select a whole rectangle at once
    pub fn select<R: Rng + ?Sized>(&mut self, rect: Rect, rng: &mut R, now: NaiveTime) -> Option<&AreaSelection> {
        self.press(rect.start_x, rect.start_y);
        self.drag(rect.start_x + rect.width, rect.start_y + rect.height);
        self.release(rng, now)
    }

    pub fn set_notes(&mut self, notes: &str) -> bool {
        match self.selection.as_mut() {
            Some(selection) => {
                selection.data.notes = notes.to_string();
                true
            }
            None => false,
        }
    }

    pub fn close(&mut self) {
        self.selection = None;
    }
}
