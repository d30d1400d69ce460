//! Global configuration types for Murmur.
//!
//! `GlobalConfig` represents the top-level `config.toml` that controls the
//! provider endpoint, the image renderer, and the WhatsApp surface. All
//! fields have sensible defaults so a missing file still yields a working
//! local setup.

use serde::{Deserialize, Serialize};

/// Top-level configuration for the Murmur service.
///
/// Loaded from `{data_dir}/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GlobalConfig {
    #[serde(default)]
    pub provider: ProviderConfig,

    #[serde(default)]
    pub renderer: RendererConfig,

    #[serde(default)]
    pub whatsapp: WhatsAppConfig,
}

/// Configuration for the local language-model provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Base URL of the provider API.
    #[serde(default = "default_provider_url")]
    pub base_url: String,

    /// Default model when a session has no override.
    #[serde(default = "default_model")]
    pub model: String,

    /// Default sampling temperature.
    #[serde(default = "default_temperature")]
    pub temperature: f64,

    /// Default output token budget.
    #[serde(default = "default_num_predict")]
    pub num_predict: u32,
}

fn default_provider_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_model() -> String {
    "llama3.2".to_string()
}

fn default_temperature() -> f64 {
    0.7
}

fn default_num_predict() -> u32 {
    2048
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: default_provider_url(),
            model: default_model(),
            temperature: default_temperature(),
            num_predict: default_num_predict(),
        }
    }
}

/// Configuration for the external image renderer.
///
/// The auth token is a reference to an environment variable rather than an
/// inline secret, so config files stay safe to commit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RendererConfig {
    /// Whether image generation is enabled at all.
    #[serde(default = "default_renderer_enabled")]
    pub enabled: bool,

    /// Base URL of the renderer API.
    #[serde(default = "default_renderer_url")]
    pub base_url: String,

    /// Default checkpoint model name.
    #[serde(default)]
    pub model: String,

    /// Default negative prompt applied to every generation.
    #[serde(default = "default_negative_prompt")]
    pub negative_prompt: String,

    /// Name of the environment variable holding the bearer token, if any.
    #[serde(default)]
    pub auth_token_env: Option<String>,
}

fn default_renderer_enabled() -> bool {
    true
}

fn default_renderer_url() -> String {
    "http://localhost:7860".to_string()
}

fn default_negative_prompt() -> String {
    "lowres, blurry, watermark, text".to_string()
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            enabled: default_renderer_enabled(),
            base_url: default_renderer_url(),
            model: String::new(),
            negative_prompt: default_negative_prompt(),
            auth_token_env: None,
        }
    }
}

/// Entity-level configuration for the WhatsApp surface.
///
/// Only the configuration entity lives here; no automation or orchestration
/// logic is driven from this service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhatsAppConfig {
    #[serde(default)]
    pub enabled: bool,

    /// Device name announced to the WhatsApp bridge.
    #[serde(default = "default_device_name")]
    pub device_name: String,

    /// Phone numbers allowed to talk to the bot; empty means everyone.
    #[serde(default)]
    pub allowed_numbers: Vec<String>,
}

fn default_device_name() -> String {
    "murmur".to_string()
}

impl Default for WhatsAppConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            device_name: default_device_name(),
            allowed_numbers: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_global_config_default_values() {
        let config = GlobalConfig::default();
        assert_eq!(config.provider.base_url, "http://localhost:11434");
        assert_eq!(config.provider.model, "llama3.2");
        assert!(config.renderer.enabled);
        assert!(!config.whatsapp.enabled);
    }

    #[test]
    fn test_global_config_deserialize_empty() {
        let config: GlobalConfig = toml::from_str("").unwrap();
        assert_eq!(config.provider.temperature, 0.7);
        assert_eq!(config.renderer.base_url, "http://localhost:7860");
    }

    #[test]
    fn test_global_config_deserialize_with_values() {
        let toml_str = r#"
[provider]
base_url = "http://gpu-box:11434"
model = "mistral"

[renderer]
enabled = false
model = "sd_xl_base_1.0"
auth_token_env = "RENDERER_TOKEN"

[whatsapp]
enabled = true
device_name = "kitchen-tablet"
allowed_numbers = ["+14155550100"]
"#;
        let config: GlobalConfig = toml_str.parse::<toml::Table>().unwrap().try_into().unwrap();
        assert_eq!(config.provider.base_url, "http://gpu-box:11434");
        assert_eq!(config.provider.model, "mistral");
        // Unset provider fields keep their defaults.
        assert_eq!(config.provider.num_predict, 2048);
        assert!(!config.renderer.enabled);
        assert_eq!(config.renderer.model, "sd_xl_base_1.0");
        assert_eq!(config.renderer.auth_token_env.as_deref(), Some("RENDERER_TOKEN"));
        assert!(config.whatsapp.enabled);
        assert_eq!(config.whatsapp.allowed_numbers.len(), 1);
    }
}
