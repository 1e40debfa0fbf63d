//! HTTP client for the detection service
//!
//! Builds the reqwest client and the multipart uploads.

use reqwest::multipart::{Form, Part};
use reqwest::Client;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Detection service configuration
#[derive(Debug, Clone)]
pub struct DetectConfig {
    /// Service base URL (default: http://127.0.0.1:8080)
    pub base_url: String,
    /// Request timeout in seconds, none by default
    pub timeout_secs: Option<u64>,
    /// Confidence threshold forwarded to `/detect`
    pub confidence: Option<f64>,
    pub user_agent: String,
}

impl Default for DetectConfig {
    fn default() -> Self {
        Self {
            base_url: std::env::var("NAVAL_DETECT_URL")
                .unwrap_or_else(|_| "http://127.0.0.1:8080".to_string()),
            timeout_secs: None,
            confidence: None,
            user_agent: format!("naval-dashboard/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl DetectConfig {
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.to_string();
        self
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = Some(confidence.clamp(0.0, 1.0));
        self
    }

    /// Join an endpoint path onto the base URL
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

/// Errors from the detection service
#[derive(Debug, Error)]
pub enum DetectError {
    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(String),

    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("{endpoint} returned status {status}")]
    Status { endpoint: String, status: u16 },

    #[error("Response is not JSON: {0}")]
    Decode(String),

    #[error("Failed to read image: {0}")]
    Io(#[from] std::io::Error),

    #[error("Not an image: {0}")]
    NotAnImage(String),

    #[error("Invalid annotated image: {0}")]
    InvalidImage(String),
}

/// An image ready to be posted as the `image` form field
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: String,
    pub mime: &'static str,
    pub bytes: Vec<u8>,
}

impl ImageUpload {
    /// Wrap raw bytes; the file name must carry an image extension
    pub fn new(file_name: &str, bytes: Vec<u8>) -> Result<Self, DetectError> {
        let mime = image_mime(file_name)
            .ok_or_else(|| DetectError::NotAnImage(file_name.to_string()))?;
        Ok(Self {
            file_name: file_name.to_string(),
            mime,
            bytes,
        })
    }

    /// Read an image from disk
    pub async fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, DetectError> {
        let path = path.as_ref();
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .ok_or_else(|| DetectError::NotAnImage(path.display().to_string()))?;

        // Check the extension before touching the file
        image_mime(&file_name).ok_or_else(|| DetectError::NotAnImage(file_name.clone()))?;

        let bytes = tokio::fs::read(path).await?;
        debug!("Read {} ({} bytes)", file_name, bytes.len());
        Self::new(&file_name, bytes)
    }

    /// Build a fresh multipart form; forms are consumed by each request
    pub fn to_form(&self) -> Result<Form, DetectError> {
        let part = Part::bytes(self.bytes.clone())
            .file_name(self.file_name.clone())
            .mime_str(self.mime)?;
        Ok(Form::new().part("image", part))
    }
}

/// MIME type for an image file name, by extension
pub fn image_mime(file_name: &str) -> Option<&'static str> {
    let ext = Path::new(file_name).extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "gif" => Some("image/gif"),
        "bmp" => Some("image/bmp"),
        "webp" => Some("image/webp"),
        "tif" | "tiff" => Some("image/tiff"),
        _ => None,
    }
}

/// Create the HTTP client used for every detection call
pub fn create_client(config: &DetectConfig) -> Result<Client, DetectError> {
    let mut builder = Client::builder().user_agent(config.user_agent.clone());

    if let Some(secs) = config.timeout_secs {
        builder = builder.timeout(Duration::from_secs(secs));
    }

    builder
        .build()
        .map_err(|e| DetectError::ClientBuild(e.to_string()))
}

/// Check if the detection service answers on its root
pub async fn check_service(config: &DetectConfig) -> Result<bool, DetectError> {
    let client = create_client(config)?;

    match client.get(config.endpoint("/")).send().await {
        Ok(resp) => Ok(resp.status().is_success()),
        Err(e) => {
            debug!("Detection service unreachable: {}", e);
            Ok(false)
        }
    }
}
