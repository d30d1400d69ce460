//! ImageDispatcher: turns a natural-language request into a stored image.
//!
//! Flow per generation attempt: availability gate -> parameter resolution
//! (XL-class models get larger defaults) -> renderer call -> base64 decode
//! -> store write. The attempt is atomic from the orchestrator's point of
//! view: idle -> requested -> succeeded | failed, with no partial states.
//!
//! Availability is a per-instance cached flag, populated by a probe at
//! startup and re-checked lazily before a generation attempt when the
//! cache says unavailable. The flag is advisory: a stale "available"
//! reading costs one failed call, nothing more.

use std::sync::Mutex;
use std::time::Duration;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::{DateTime, Utc};

use murmur_types::image::{
    GeneratedImage, ImageError, ImageRequest, ResolvedImageParams, StoredImage,
};

use crate::image::renderer::ImageRenderer;
use crate::image::store::ImageStore;

/// Default parameters for standard (512-class) checkpoints.
const SD_DEFAULT_SIZE: u32 = 512;
const SD_DEFAULT_STEPS: u32 = 20;
const SD_DEFAULT_SAMPLER: &str = "Euler a";

/// Default parameters for XL-class checkpoints.
const XL_DEFAULT_SIZE: u32 = 1024;
const XL_DEFAULT_STEPS: u32 = 25;
const XL_DEFAULT_SAMPLER: &str = "DPM++ 2M Karras";

const DEFAULT_CFG_SCALE: f64 = 7.0;

/// Cached renderer reachability, re-derived on probes and generation
/// outcomes.
#[derive(Debug, Clone, Copy)]
pub struct AvailabilityState {
    pub available: bool,
    pub last_checked_at: Option<DateTime<Utc>>,
}

impl AvailabilityState {
    fn unknown() -> Self {
        Self {
            available: false,
            last_checked_at: None,
        }
    }
}

/// Service defaults the dispatcher merges per-request overrides over.
#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    /// Feature switch; a disabled dispatcher refuses before probing.
    pub enabled: bool,
    /// Default checkpoint model name.
    pub model: String,
    /// Negative prompt applied when the request carries none.
    pub negative_prompt: String,
}

/// Orchestrates image generation against a renderer and a store.
pub struct ImageDispatcher<R, S> {
    renderer: R,
    store: S,
    config: DispatcherConfig,
    availability: Mutex<AvailabilityState>,
}

impl<R: ImageRenderer, S: ImageStore> ImageDispatcher<R, S> {
    pub fn new(renderer: R, store: S, config: DispatcherConfig) -> Self {
        Self {
            renderer,
            store,
            config,
            availability: Mutex::new(AvailabilityState::unknown()),
        }
    }

    /// Current cached availability.
    pub fn availability(&self) -> AvailabilityState {
        *self.availability.lock().expect("availability lock poisoned")
    }

    /// Probe the renderer and update the cached flag.
    ///
    /// Called once at startup and lazily before generation attempts when
    /// the cache reads false.
    pub async fn check_availability(&self) -> bool {
        let available = self.renderer.probe().await;
        self.record_availability(available);
        available
    }

    fn record_availability(&self, available: bool) {
        let mut state = self.availability.lock().expect("availability lock poisoned");
        *state = AvailabilityState {
            available,
            last_checked_at: Some(Utc::now()),
        };
    }

    /// Merge request overrides over service defaults.
    ///
    /// Models whose name contains "xl" get 1024x1024, 25 steps, and the
    /// DPM++ 2M Karras sampler; everything else gets 512x512, 20 steps,
    /// Euler a.
    pub fn resolve_params(&self, request: &ImageRequest) -> ResolvedImageParams {
        let model = request
            .model
            .clone()
            .unwrap_or_else(|| self.config.model.clone());
        let is_xl = model.to_lowercase().contains("xl");

        let (size, steps, sampler) = if is_xl {
            (XL_DEFAULT_SIZE, XL_DEFAULT_STEPS, XL_DEFAULT_SAMPLER)
        } else {
            (SD_DEFAULT_SIZE, SD_DEFAULT_STEPS, SD_DEFAULT_SAMPLER)
        };

        ResolvedImageParams {
            prompt: request.prompt.clone(),
            negative_prompt: request
                .negative_prompt
                .clone()
                .unwrap_or_else(|| self.config.negative_prompt.clone()),
            model,
            width: request.width.unwrap_or(size),
            height: request.height.unwrap_or(size),
            steps: request.steps.unwrap_or(steps),
            cfg_scale: request.cfg_scale.unwrap_or(DEFAULT_CFG_SCALE),
            sampler: request.sampler.clone().unwrap_or_else(|| sampler.to_string()),
        }
    }

    /// Generate one image and persist the artifact.
    #[tracing::instrument(skip(self, request), fields(model))]
    pub async fn generate(&self, request: &ImageRequest) -> Result<GeneratedImage, ImageError> {
        if !self.config.enabled {
            return Err(ImageError::Disabled);
        }

        // Lazy recheck: only when the cache says unavailable.
        if !self.availability().available && !self.check_availability().await {
            return Err(ImageError::Unavailable(
                "renderer did not answer the connectivity probe".to_string(),
            ));
        }

        let params = self.resolve_params(request);
        tracing::Span::current().record("model", params.model.as_str());
        tracing::info!(
            width = params.width,
            height = params.height,
            steps = params.steps,
            "dispatching image generation"
        );

        let reply = match self.renderer.generate(&params).await {
            Ok(reply) => {
                self.record_availability(true);
                reply
            }
            Err(e) => {
                self.record_availability(false);
                return Err(e);
            }
        };

        let Some(encoded) = reply.images.first() else {
            return Err(ImageError::EmptyResult);
        };

        let bytes = BASE64
            .decode(encoded.as_bytes())
            .map_err(|e| ImageError::Decode(e.to_string()))?;

        let stored = self.store.write(&bytes).await?;

        tracing::info!(filename = %stored.filename, bytes = bytes.len(), "image stored");

        Ok(GeneratedImage {
            url: stored.url,
            filename: stored.filename,
            prompt: params.prompt,
            info: reply.info,
        })
    }

    /// List stored images, most recently modified first.
    pub async fn list_saved_images(&self) -> Result<Vec<StoredImage>, ImageError> {
        self.store.list().await
    }

    /// Delete images older than `max_age_hours`; returns the count removed.
    pub async fn cleanup_old_images(&self, max_age_hours: u64) -> Result<usize, ImageError> {
        let removed = self
            .store
            .delete_older_than(Duration::from_secs(max_age_hours * 3600))
            .await?;
        if removed > 0 {
            tracing::info!(removed, max_age_hours, "cleaned up old images");
        }
        Ok(removed)
    }

    /// Best-effort cancellation of an in-flight generation.
    pub async fn interrupt_generation(&self) -> bool {
        self.renderer.interrupt().await
    }

    /// Renderer system info passthrough.
    pub async fn system_info(&self) -> Result<serde_json::Value, ImageError> {
        self.renderer.system_info().await
    }
}
