//! Session descriptor loading.
//!
//! `session.json` records which model is currently served by the backend.
//! Only `model` is required; anything else in the file is ignored so the
//! launcher can add metadata without breaking the front-end.

use std::path::Path;

use serde::Deserialize;

use super::errors::SettingsError;

/// The selected model, as recorded in `session.json`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub model: String,
}

#[derive(Deserialize)]
struct RawSession {
    #[serde(default)]
    model: Option<serde_json::Value>,
}

/// Load and validate a session file.
pub fn load_session(path: &Path) -> Result<Session, SettingsError> {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(SettingsError::SessionMissing {
                path: path.to_path_buf(),
            })
        }
        Err(e) => return Err(invalid(path, format!("failed to read file ({e})"))),
    };

    let parsed: RawSession = serde_json::from_str(&raw)
        .map_err(|e| invalid(path, format!("not a JSON object ({e})")))?;

    let model = match parsed.model {
        None | Some(serde_json::Value::Null) => {
            return Err(invalid(path, "'model' key not found".into()))
        }
        Some(serde_json::Value::String(model)) => model,
        Some(other) => {
            return Err(invalid(
                path,
                format!("'model' must be a string, got {other}"),
            ))
        }
    };

    if model.trim().is_empty() {
        return Err(invalid(path, "'model' is empty".into()));
    }

    tracing::debug!(path = %path.display(), model = %model, "loaded session");

    Ok(Session { model })
}

fn invalid(path: &Path, reason: String) -> SettingsError {
    SettingsError::SessionInvalid {
        path: path.to_path_buf(),
        reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_session(dir: &tempfile::TempDir, body: &str) -> std::path::PathBuf {
        let path = dir.path().join("session.json");
        std::fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn test_load_model() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_session(&dir, r#"{"model": "qwen2.5-7b-instruct"}"#);
        let session = load_session(&path).unwrap();
        assert_eq!(session.model, "qwen2.5-7b-instruct");
    }

    #[test]
    fn test_unknown_fields_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_session(
            &dir,
            r#"{"model": "gpt-demo", "started_at": 1700000000, "gpu": {"index": 0}}"#,
        );
        assert_eq!(load_session(&path).unwrap().model, "gpt-demo");
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_session(&dir.path().join("session.json")).unwrap_err();
        assert!(matches!(err, SettingsError::SessionMissing { .. }));
    }

    #[test]
    fn test_missing_model_key() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_session(&dir, r#"{"other": "value"}"#);
        match load_session(&path).unwrap_err() {
            SettingsError::SessionInvalid { reason, .. } => {
                assert_eq!(reason, "'model' key not found")
            }
            other => panic!("expected SessionInvalid, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_model_is_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_session(&dir, r#"{"model": "  "}"#);
        assert!(matches!(
            load_session(&path),
            Err(SettingsError::SessionInvalid { .. })
        ));
    }

    #[test]
    fn test_non_string_model_is_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_session(&dir, r#"{"model": 42}"#);
        assert!(matches!(
            load_session(&path),
            Err(SettingsError::SessionInvalid { .. })
        ));
    }

    #[test]
    fn test_top_level_string_is_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_session(&dir, r#""gpt-demo""#);
        assert!(matches!(
            load_session(&path),
            Err(SettingsError::SessionInvalid { .. })
        ));
    }
}
