//! Detection backend abstraction
//!
//! The runtime only sees the trait, so sessions can run against the HTTP
//! service or against an in-process stand-in.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

use naval_core::DriftReport;

use crate::{create_client, DetectConfig, DetectError, DetectionResult, ImageUpload};

/// Generic detection backend trait
#[async_trait]
pub trait DetectionBackend: Send + Sync {
    /// Run ship detection on an image
    async fn detect(&self, image: &ImageUpload) -> Result<DetectionResult, DetectError>;

    /// Ask the service whether the image drifts from the training data
    async fn detect_drift(&self, image: &ImageUpload) -> Result<DriftReport, DetectError>;

    /// Where requests go, for logging
    fn endpoint(&self) -> &str;
}

/// Detection backend over HTTP
pub struct HttpDetector {
    client: Client,
    config: DetectConfig,
}

impl HttpDetector {
    pub fn new(config: DetectConfig) -> Result<Self, DetectError> {
        let client = create_client(&config)?;
        Ok(Self { client, config })
    }

    async fn post_image(&self, path: &str, form: reqwest::multipart::Form) -> Result<reqwest::Response, DetectError> {
        let url = self.config.endpoint(path);
        debug!("POST {}", url);
        Ok(self.client.post(&url).multipart(form).send().await?)
    }
}

async fn read_json(response: reqwest::Response) -> Result<Value, DetectError> {
    let body = response.text().await?;
    serde_json::from_str(&body).map_err(|e| DetectError::Decode(e.to_string()))
}

#[async_trait]
impl DetectionBackend for HttpDetector {
    async fn detect(&self, image: &ImageUpload) -> Result<DetectionResult, DetectError> {
        let mut form = image.to_form()?;
        if let Some(conf) = self.config.confidence {
            form = form.text("conf", conf.to_string());
        }

        let response = self.post_image("/detect", form).await?;

        if !response.status().is_success() {
            return Err(DetectError::Status {
                endpoint: "/detect".to_string(),
                status: response.status().as_u16(),
            });
        }

        let json = read_json(response).await?;
        Ok(DetectionResult::from_json(&json))
    }

    async fn detect_drift(&self, image: &ImageUpload) -> Result<DriftReport, DetectError> {
        let response = self.post_image("/detect_drift", image.to_form()?).await?;

        // Error bodies still carry `is_drift`, so the status is not checked
        if !response.status().is_success() {
            debug!("/detect_drift returned status {}", response.status());
        }

        let json = read_json(response).await?;
        Ok(DriftReport::from_json(&json))
    }

    fn endpoint(&self) -> &str {
        &self.config.base_url
    }
}

/// Thread-safe reference to a detection backend
pub type SharedDetector = Arc<dyn DetectionBackend>;

/// Create a shared HTTP detection backend
pub fn create_detector(config: DetectConfig) -> Result<SharedDetector, DetectError> {
    Ok(Arc::new(HttpDetector::new(config)?))
}
