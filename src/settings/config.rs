//! Application configuration loading and validation.
//!
//! Reads `config.json` and extracts its `client` section. Other top-level
//! sections (used by the inference server launcher, for instance) are
//! ignored.

use std::path::Path;

use serde::Deserialize;

use super::errors::SettingsError;

// ─── Public Types ────────────────────────────────────────────────────────────

/// Placeholder in the model description template replaced by the session model.
pub const MODEL_NAME_PLACEHOLDER: &str = "__MODEL_NAME_PLACEHOLDER__";

/// The `client` section of `config.json`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ClientConfig {
    /// Page title.
    pub title: String,
    /// Free-text hardware label shown above the model description.
    pub hardware: String,
    /// Model description template, contains [`MODEL_NAME_PLACEHOLDER`].
    #[serde(rename = "model")]
    pub model_description_template: String,
    /// Upper bound on generated tokens per response.
    pub max_tokens: u32,
    /// Fixed system instruction sent with every request.
    pub system_prompt: String,
    /// Sample prompts offered by the chat page.
    #[serde(default)]
    pub examples: Vec<String>,
}

impl ClientConfig {
    /// Substitute every occurrence of the placeholder with `model`.
    pub fn model_description(&self, model: &str) -> String {
        self.model_description_template
            .replace(MODEL_NAME_PLACEHOLDER, model)
    }
}

// ─── Loading ─────────────────────────────────────────────────────────────────

/// Load and validate the `client` section of a configuration file.
pub fn load_client_config(path: &Path) -> Result<ClientConfig, SettingsError> {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(SettingsError::ConfigMissing {
                path: path.to_path_buf(),
            })
        }
        Err(e) => return Err(invalid(path, format!("failed to read file ({e})"))),
    };

    let mut root: serde_json::Value = serde_json::from_str(&raw)
        .map_err(|e| invalid(path, format!("not valid JSON ({e})")))?;

    let section = root
        .get_mut("client")
        .map(serde_json::Value::take)
        .ok_or_else(|| invalid(path, "'client' key not found".into()))?;

    let config: ClientConfig = serde_json::from_value(section)
        .map_err(|e| invalid(path, format!("'client' section is malformed ({e})")))?;

    if config.max_tokens == 0 {
        return Err(invalid(path, "'max_tokens' must be greater than zero".into()));
    }

    tracing::debug!(
        path = %path.display(),
        title = %config.title,
        max_tokens = config.max_tokens,
        examples = config.examples.len(),
        "loaded client config"
    );

    Ok(config)
}

fn invalid(path: &Path, reason: String) -> SettingsError {
    SettingsError::ConfigInvalid {
        path: path.to_path_buf(),
        reason,
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
