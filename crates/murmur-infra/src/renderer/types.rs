//! Wire types for the renderer protocol.

use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub(crate) struct GenerateRequest {
    pub prompt: String,
    pub negative_prompt: String,
    pub steps: u32,
    pub width: u32,
    pub height: u32,
    pub cfg_scale: f64,
    pub sampler_name: String,
    pub batch_size: u32,
    pub n_iter: u32,
    /// -1 asks the renderer to pick a random seed.
    pub seed: i64,
    pub override_settings: OverrideSettings,
}

#[derive(Debug, Serialize)]
pub(crate) struct OverrideSettings {
    pub model: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GenerateResponse {
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub info: Option<serde_json::Value>,
}
