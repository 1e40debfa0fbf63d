//! Naval Dashboard Detection Client
//!
//! Talks to the external ship detection service:
//! - Multipart image upload to `/detect` and `/detect_drift`
//! - Lenient decoding of the JSON responses
//! - Liveness check against the service root

pub mod backend;
pub mod client;
pub mod response;

#[cfg(test)]
mod test_service;

pub use backend::*;
pub use client::*;
pub use response::*;
