//! Settings: the two JSON files the front-end needs before it can start.
//!
//! - `config.json` (its `client` section): title, hardware label, model
//!   description template, token cap, system prompt, example prompts
//! - `session.json`: the model currently served by the backend
//!
//! Both are loaded once at startup into an [`AppSettings`] value that is
//! passed by ownership into the relay and the HTTP server. Loaders return
//! errors; deciding to exit is left to the binary.

pub mod config;
pub mod errors;
pub mod session;

use std::path::Path;

pub use config::{load_client_config, ClientConfig, MODEL_NAME_PLACEHOLDER};
pub use errors::SettingsError;
pub use session::{load_session, Session};

/// Validated, immutable application settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppSettings {
    pub client: ClientConfig,
    pub session: Session,
    /// The description template with the session model substituted in.
    pub model_description: String,
}

impl AppSettings {
    /// Combine an already-validated config and session.
    pub fn new(client: ClientConfig, session: Session) -> Self {
        let model_description = client.model_description(&session.model);
        Self {
            client,
            session,
            model_description,
        }
    }

    /// Load `config_path` first, then `session_path`.
    pub fn load(config_path: &Path, session_path: &Path) -> Result<Self, SettingsError> {
        let client = load_client_config(config_path)?;
        let session = load_session(session_path)?;
        Ok(Self::new(client, session))
    }

    /// Header text shown under the page title: hardware label, a line
    /// break, then the model description.
    pub fn description(&self) -> String {
        format!("{}<br>{}", self.client.hardware, self.model_description)
    }
}
