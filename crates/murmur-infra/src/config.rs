//! Global configuration loader for Murmur.
//!
//! Reads `config.toml` from the data directory (`~/.murmur/` in production)
//! and deserializes it into [`GlobalConfig`]. Falls back to sensible
//! defaults when the file is missing or malformed.

use std::path::Path;

use secrecy::SecretString;

use murmur_types::config::{GlobalConfig, RendererConfig};

/// Load global configuration from `{data_dir}/config.toml`.
///
/// - If the file does not exist, returns [`GlobalConfig::default()`].
/// - If the file exists but fails to parse, logs a warning and returns the default.
/// - If the file exists and parses successfully, returns the parsed config.
pub async fn load_global_config(data_dir: &Path) -> GlobalConfig {
    let config_path = data_dir.join("config.toml");

    let content = match tokio::fs::read_to_string(&config_path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config.toml found at {}, using defaults", config_path.display());
            return GlobalConfig::default();
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, using defaults", config_path.display());
            return GlobalConfig::default();
        }
    };

    match toml::from_str::<GlobalConfig>(&content) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!(
                "Failed to parse {}: {err}, using defaults",
                config_path.display()
            );
            GlobalConfig::default()
        }
    }
}

/// Resolve the renderer bearer token from the environment variable named in
/// the config. The config file only ever names the variable; the secret
/// itself never lives in the file.
pub fn resolve_renderer_token(renderer: &RendererConfig) -> Option<SecretString> {
    let var = renderer.auth_token_env.as_deref()?;
    match std::env::var(var) {
        Ok(token) if !token.is_empty() => Some(SecretString::from(token)),
        Ok(_) => {
            tracing::warn!(variable = var, "renderer token variable is set but empty");
            None
        }
        Err(_) => {
            tracing::warn!(variable = var, "renderer token variable is not set");
            None
        }
    }
}

/// Default data directory: `MURMUR_DATA_DIR`, else `~/.murmur`.
pub fn default_data_dir() -> std::path::PathBuf {
    if let Ok(dir) = std::env::var("MURMUR_DATA_DIR") {
        return dir.into();
    }
    dirs::home_dir()
        .unwrap_or_else(|| ".".into())
        .join(".murmur")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn load_global_config_missing_file_returns_default() {
        let tmp = TempDir::new().unwrap();
        let config = load_global_config(tmp.path()).await;
        assert_eq!(config.provider.base_url, "http://localhost:11434");
        assert!(config.renderer.enabled);
    }

    #[tokio::test]
    async fn load_global_config_valid_toml_returns_parsed() {
        let tmp = TempDir::new().unwrap();
        tokio::fs::write(
            tmp.path().join("config.toml"),
            r#"
[provider]
base_url = "http://gpu-box:11434"
model = "mistral"

[renderer]
enabled = false
"#,
        )
        .await
        .unwrap();

        let config = load_global_config(tmp.path()).await;
        assert_eq!(config.provider.base_url, "http://gpu-box:11434");
        assert_eq!(config.provider.model, "mistral");
        assert!(!config.renderer.enabled);
        // Unset sections keep defaults.
        assert!(!config.whatsapp.enabled);
    }

    #[tokio::test]
    async fn load_global_config_invalid_toml_returns_default() {
        let tmp = TempDir::new().unwrap();
        tokio::fs::write(tmp.path().join("config.toml"), "this is not { valid toml !!!")
            .await
            .unwrap();

        let config = load_global_config(tmp.path()).await;
        assert_eq!(config.provider.model, "llama3.2");
    }

    #[test]
    fn resolve_renderer_token_unset_config_is_none() {
        let renderer = RendererConfig::default();
        assert!(resolve_renderer_token(&renderer).is_none());
    }

    #[test]
    fn resolve_renderer_token_reads_named_variable() {
        use secrecy::ExposeSecret;

        let var = "MURMUR_TEST_RENDERER_TOKEN";
        // Single-threaded access within this test only.
        unsafe { std::env::set_var(var, "tok-123") };
        let renderer = RendererConfig {
            auth_token_env: Some(var.to_string()),
            ..Default::default()
        };
        let token = resolve_renderer_token(&renderer).unwrap();
        assert_eq!(token.expose_secret(), "tok-123");
        unsafe { std::env::remove_var(var) };
    }
}
