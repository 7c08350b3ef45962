//! Configuration for shezhen, loadable from `shezhen.toml`.
//!
//! The API credential is deliberately absent: the config only names the
//! environment variable it is read from, and that read happens at the start
//! of every analysis call.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShezhenConfig {
    /// Logging settings.
    #[serde(default)]
    pub general: GeneralConfig,
    /// Remote inference settings.
    #[serde(default)]
    pub inference: InferenceConfig,
}

impl ShezhenConfig {
    /// Load configuration from a TOML string.
    ///
    /// # Errors
    /// Returns `ShezhenError::Config` if the TOML is invalid.
    pub fn from_toml(toml_str: &str) -> crate::error::Result<Self> {
        toml::from_str(toml_str).map_err(|e| crate::ShezhenError::Config(e.to_string()))
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Log level: trace, debug, info, warn, error. `RUST_LOG` overrides it.
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Emit logs as JSON lines instead of human-readable text.
    #[serde(default)]
    pub json_logs: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json_logs: false,
        }
    }
}

/// Remote inference service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InferenceConfig {
    /// API root, without the `/models/...` suffix.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Model identifier sent with every request.
    #[serde(default = "default_model")]
    pub model: String,
    /// Environment variable holding the API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    /// Reasoning token budget; `0` leaves it to the service.
    #[serde(default = "default_thinking_budget")]
    pub thinking_budget: u32,
    /// Optional TOML file overriding the built-in instruction prompt.
    #[serde(default)]
    pub prompt_file: Option<PathBuf>,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: default_model(),
            api_key_env: default_api_key_env(),
            thinking_budget: default_thinking_budget(),
            prompt_file: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Serde default helpers
// ---------------------------------------------------------------------------

fn default_log_level() -> String { "info".to_string() }
fn default_base_url() -> String { "https://generativelanguage.googleapis.com/v1beta".to_string() }
fn default_model() -> String { "gemini-3-pro-preview".to_string() }
fn default_api_key_env() -> String { "API_KEY".to_string() }
fn default_thinking_budget() -> u32 { 1024 }
