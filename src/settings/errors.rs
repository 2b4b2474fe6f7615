//! Settings error types.
//!
//! Every variant carries the path that was being loaded so the binary can
//! print a diagnostic naming the expected location before it exits.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors that can occur while loading `config.json` or `session.json`.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// The configuration file does not exist.
    #[error("{} file not found at '{}'. Please create it.", file_name(path), path.display())]
    ConfigMissing { path: PathBuf },

    /// The configuration file exists but cannot be used.
    #[error("Invalid {} file. {reason} in {}.", file_name(path), path.display())]
    ConfigInvalid { path: PathBuf, reason: String },

    /// The session file does not exist.
    #[error("{} file not found at '{}'. Please create it.", file_name(path), path.display())]
    SessionMissing { path: PathBuf },

    /// The session file exists but cannot be used.
    #[error("Invalid {} file. {reason} in {}.", file_name(path), path.display())]
    SessionInvalid { path: PathBuf, reason: String },
}

impl SettingsError {
    /// The file this error refers to.
    pub fn path(&self) -> &Path {
        match self {
            SettingsError::ConfigMissing { path }
            | SettingsError::ConfigInvalid { path, .. }
            | SettingsError::SessionMissing { path }
            | SettingsError::SessionInvalid { path, .. } => path,
        }
    }

    /// `true` for the "file absent" variants.
    pub fn is_missing(&self) -> bool {
        matches!(
            self,
            SettingsError::ConfigMissing { .. } | SettingsError::SessionMissing { .. }
        )
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

// ─── Tests ───────────────────────────────────────────────────────────────────
