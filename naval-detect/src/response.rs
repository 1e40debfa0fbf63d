//! `/detect` response model
//!
//! Like the drift report, fields are picked leniently out of the JSON body.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

use crate::DetectError;

/// Result of a `/detect` call
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DetectionResult {
    /// Annotated image, base64 JPEG
    pub image: Option<String>,
    /// Detected class name -> count
    pub detections: BTreeMap<String, u64>,
    /// Number of raw result entries returned
    pub result_count: usize,
}

impl DetectionResult {
    pub fn from_json(value: &Value) -> Self {
        let image = value
            .get("image")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        let detections = value
            .get("detections")
            .and_then(Value::as_object)
            .map(|map| {
                map.iter()
                    .filter_map(|(class, count)| Some((class.clone(), count.as_u64()?)))
                    .collect()
            })
            .unwrap_or_default();

        let result_count = value
            .get("results")
            .and_then(Value::as_array)
            .map(Vec::len)
            .unwrap_or(0);

        Self {
            image,
            detections,
            result_count,
        }
    }

    pub fn total_detections(&self) -> u64 {
        self.detections.values().sum()
    }

    /// The annotated image as something the view can display directly
    pub fn annotated_data_url(&self) -> Option<String> {
        self.image
            .as_ref()
            .map(|b64| format!("data:image/jpeg;base64,{}", b64))
    }

    /// Decode the annotated JPEG
    pub fn decode_image(&self) -> Result<Option<Vec<u8>>, DetectError> {
        self.image
            .as_ref()
            .map(|b64| {
                BASE64
                    .decode(b64)
                    .map_err(|e| DetectError::InvalidImage(e.to_string()))
            })
            .transpose()
    }
}
