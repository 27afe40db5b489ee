//! Configuration loading and persistence for llamaloop.
//!
//! Loads `~/.config/llamaloop/config.toml` with environment variable
//! overrides (`OLLAMA_URL`, `LLAMALOOP_MODEL`). A missing file means
//! defaults. The config value is threaded explicitly through the transport
//! and agent constructors — there is no ambient global.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, warn};

use llamaloop_core::ConfigError;

/// The root configuration structure, mapping to `config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Base URL of the inference server.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Default model identifier.
    #[serde(default = "default_model")]
    pub default_model: String,

    /// Whether tools are offered to the model.
    #[serde(default = "default_true")]
    pub tools_enabled: bool,

    /// Maximum tool-call batches per turn before the loop gives up.
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,

    /// Optional replacement for the built-in system prompt.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt_override: Option<String>,
}

fn default_base_url() -> String {
    "http://localhost:11434".into()
}
fn default_model() -> String {
    "qwen2.5:7b".into()
}
fn default_max_iterations() -> u32 {
    20
}
fn default_true() -> bool {
    true
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            default_model: default_model(),
            tools_enabled: true,
            max_iterations: default_max_iterations(),
            system_prompt_override: None,
        }
    }
}

impl AppConfig {
    /// The config directory: `~/.config/llamaloop`.
    pub fn config_dir() -> PathBuf {
        if let Ok(dir) = std::env::var("XDG_CONFIG_HOME") {
            return PathBuf::from(dir).join("llamaloop");
        }
        let home = std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .unwrap_or_else(|_| ".".into());
        PathBuf::from(home).join(".config").join("llamaloop")
    }

    fn config_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Load from the default path, then apply env overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::load_from(&Self::config_path())?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load from an explicit path. A missing file yields defaults.
    pub fn load_from(path: &std::path::Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        toml::from_str(&raw).map_err(|e| ConfigError::Invalid(e.to_string()))
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("OLLAMA_URL") {
            if !url.is_empty() {
                self.base_url = url;
            }
        }
        if let Ok(model) = std::env::var("LLAMALOOP_MODEL") {
            if !model.is_empty() {
                self.default_model = model;
            }
        }
    }

    /// Persist to the default path, creating the directory if needed.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::config_path())
    }

    /// Persist to an explicit path.
    pub fn save_to(&self, path: &std::path::Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                warn!(dir = %parent.display(), error = %e, "Could not create config dir");
            }
        }
        let raw = toml::to_string_pretty(self).map_err(|e| ConfigError::Invalid(e.to_string()))?;
        std::fs::write(path, raw).map_err(|e| ConfigError::Write {
            path: path.display().to_string(),
            reason: e.to_string(),
        })
    }
}
