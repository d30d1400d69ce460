//! HTTP client for the external image renderer.
//!
//! Implements the `ImageRenderer` trait from murmur-core against the
//! renderer's wire protocol: `POST /generate` for txt2img, `GET /models`
//! as the connectivity probe, `GET /memory` for system info, and
//! `POST /interrupt` for best-effort cancellation. Generation is slow, so
//! the generate call uses a dedicated 5-minute timeout; the probe uses a
//! short one so an offline renderer is detected quickly.
//!
//! An optional bearer token comes from the environment variable named in
//! the config and is held as a `SecretString` so it never lands in logs.

mod types;

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};

use murmur_core::image::renderer::{ImageRenderer, RenderReply};
use murmur_types::image::{ImageError, ResolvedImageParams};

use self::types::{GenerateRequest, GenerateResponse, OverrideSettings};

/// Generation can legitimately take minutes on CPU-bound hosts.
const GENERATE_TIMEOUT: Duration = Duration::from_secs(300);

/// Probes and housekeeping calls fail fast instead.
const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

pub struct HttpImageRenderer {
    client: reqwest::Client,
    probe_client: reqwest::Client,
    base_url: String,
    auth_token: Option<SecretString>,
}

impl HttpImageRenderer {
    pub fn new(
        base_url: impl Into<String>,
        auth_token: Option<SecretString>,
    ) -> Result<Self, ImageError> {
        let client = reqwest::Client::builder()
            .timeout(GENERATE_TIMEOUT)
            .build()
            .map_err(|e| ImageError::Request(e.to_string()))?;
        let probe_client = reqwest::Client::builder()
            .timeout(PROBE_TIMEOUT)
            .build()
            .map_err(|e| ImageError::Request(e.to_string()))?;

        Ok(Self {
            client,
            probe_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            auth_token,
        })
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.auth_token {
            Some(token) => request.bearer_auth(token.expose_secret()),
            None => request,
        }
    }
}

impl ImageRenderer for HttpImageRenderer {
    async fn generate(&self, params: &ResolvedImageParams) -> Result<RenderReply, ImageError> {
        let request = GenerateRequest {
            prompt: params.prompt.clone(),
            negative_prompt: params.negative_prompt.clone(),
            steps: params.steps,
            width: params.width,
            height: params.height,
            cfg_scale: params.cfg_scale,
            sampler_name: params.sampler.clone(),
            batch_size: 1,
            n_iter: 1,
            seed: -1,
            override_settings: OverrideSettings {
                model: params.model.clone(),
            },
        };

        let response = self
            .authorize(self.client.post(format!("{}/generate", self.base_url)))
            .json(&request)
            .send()
            .await
            .map_err(|e| ImageError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ImageError::Request(format!(
                "renderer answered HTTP {status}"
            )));
        }

        let reply: GenerateResponse = response
            .json()
            .await
            .map_err(|e| ImageError::Request(format!("invalid renderer reply: {e}")))?;

        Ok(RenderReply {
            images: reply.images,
            info: reply.info,
        })
    }

    async fn probe(&self) -> bool {
        let result = self
            .authorize(self.probe_client.get(format!("{}/models", self.base_url)))
            .send()
            .await;
        matches!(result, Ok(response) if response.status().is_success())
    }

    async fn interrupt(&self) -> bool {
        let result = self
            .authorize(self.probe_client.post(format!("{}/interrupt", self.base_url)))
            .send()
            .await;
        match result {
            Ok(response) if response.status().is_success() => true,
            Ok(response) => {
                tracing::warn!(status = response.status().as_u16(), "interrupt refused");
                false
            }
            Err(e) => {
                tracing::warn!(error = %e, "interrupt not delivered");
                false
            }
        }
    }

    async fn system_info(&self) -> Result<serde_json::Value, ImageError> {
        let response = self
            .authorize(self.probe_client.get(format!("{}/memory", self.base_url)))
            .send()
            .await
            .map_err(|e| ImageError::Unavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ImageError::Unavailable(format!(
                "renderer answered HTTP {status}"
            )));
        }

        response
            .json()
            .await
            .map_err(|e| ImageError::Request(format!("invalid system info: {e}")))
    }
}
