//! Image generation types for Murmur.
//!
//! These types model the transient request to the external renderer and
//! the persisted artifact that comes back. Nothing here is stored in the
//! database directly; the orchestrator converts a [`GeneratedImage`] into
//! a message attachment.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Transient per-call image generation request.
///
/// Lives only for the duration of one renderer call. Unset fields are
/// filled from the dispatcher's resolved defaults.
#[derive(Debug, Clone, Default)]
pub struct ImageRequest {
    pub prompt: String,
    pub negative_prompt: Option<String>,
    pub model: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub steps: Option<u32>,
    pub cfg_scale: Option<f64>,
    pub sampler: Option<String>,
}

impl ImageRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            ..Default::default()
        }
    }
}

/// Fully resolved parameters for one renderer call, after merging
/// per-request overrides over the service defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedImageParams {
    pub prompt: String,
    pub negative_prompt: String,
    pub model: String,
    pub width: u32,
    pub height: u32,
    pub steps: u32,
    pub cfg_scale: f64,
    pub sampler: String,
}

/// A generated image that has been decoded and written to storage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedImage {
    /// Stable relative URL, e.g. `/images/<filename>`.
    pub url: String,
    pub filename: String,
    /// Prompt the image was generated from.
    pub prompt: String,
    /// Renderer-reported metadata (the raw `info` payload).
    pub info: Option<serde_json::Value>,
}

/// A stored image file, as listed by the image store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredImage {
    pub url: String,
    pub filename: String,
    pub size_bytes: u64,
    pub modified_at: DateTime<Utc>,
}

/// Errors from image generation and artifact handling.
#[derive(Debug, thiserror::Error)]
pub enum ImageError {
    /// Image generation is disabled by configuration.
    #[error("image generation is disabled")]
    Disabled,

    /// Renderer unreachable after the lazy availability recheck.
    #[error("renderer unavailable: {0}")]
    Unavailable(String),

    /// The renderer returned no image at all.
    #[error("renderer returned no images")]
    EmptyResult,

    #[error("renderer request failed: {0}")]
    Request(String),

    #[error("image decode failed: {0}")]
    Decode(String),

    #[error("image storage failed: {0}")]
    Storage(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_request_new_leaves_overrides_unset() {
        let request = ImageRequest::new("a quiet harbor at dawn");
        assert_eq!(request.prompt, "a quiet harbor at dawn");
        assert!(request.model.is_none());
        assert!(request.width.is_none());
        assert!(request.sampler.is_none());
    }

    #[test]
    fn test_image_error_display() {
        let err = ImageError::Unavailable("connection refused".to_string());
        assert!(err.to_string().contains("connection refused"));
        assert_eq!(ImageError::Disabled.to_string(), "image generation is disabled");
    }

    #[test]
    fn test_generated_image_serialize() {
        let image = GeneratedImage {
            url: "/images/20260829103000_ab12cd34.png".to_string(),
            filename: "20260829103000_ab12cd34.png".to_string(),
            prompt: "a lighthouse in a storm".to_string(),
            info: Some(serde_json::json!({"seed": 1234})),
        };
        let json = serde_json::to_string(&image).unwrap();
        assert!(json.contains("/images/"));
        assert!(json.contains("seed"));
    }
}
