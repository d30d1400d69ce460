//! ImageRenderer trait definition.
//!
//! Abstraction over the remote txt2img-style renderer. The concrete HTTP
//! client lives in murmur-infra; the dispatcher only sees this seam, which
//! is what makes the availability gate and generation flow unit-testable.

use murmur_types::image::{ImageError, ResolvedImageParams};

/// Raw renderer reply: base64-encoded images plus renderer-reported info.
///
/// Decoding happens in the dispatcher, which owns the "no image returned
/// is an error" rule.
#[derive(Debug, Clone)]
pub struct RenderReply {
    /// Base64-encoded image payloads.
    pub images: Vec<String>,
    /// The renderer's `info` payload, when present.
    pub info: Option<serde_json::Value>,
}

/// Trait for the remote image renderer backend.
pub trait ImageRenderer: Send + Sync {
    /// Submit one generation request. Generation is slow; implementations
    /// use an extended timeout.
    fn generate(
        &self,
        params: &ResolvedImageParams,
    ) -> impl std::future::Future<Output = Result<RenderReply, ImageError>> + Send;

    /// Connectivity probe. Returns true when the renderer answers.
    fn probe(&self) -> impl std::future::Future<Output = bool> + Send;

    /// Best-effort cancellation of an in-flight generation.
    /// Returns false when the interrupt could not be delivered; never errors.
    fn interrupt(&self) -> impl std::future::Future<Output = bool> + Send;

    /// Renderer system info passthrough (`GET /memory`).
    fn system_info(
        &self,
    ) -> impl std::future::Future<Output = Result<serde_json::Value, ImageError>> + Send;
}
