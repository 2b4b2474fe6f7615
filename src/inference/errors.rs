//! Inference error types.
//!
//! All errors implement `std::error::Error` via `thiserror`. Structured logging
//! is the caller's responsibility. These types carry the context needed to build
//! meaningful log entries.

use thiserror::Error;

/// Errors that can occur during a single streaming round trip.
///
/// None of these are fatal to the process: they end the current turn only.
#[derive(Debug, Error)]
pub enum InferenceError {
    /// The connection to the backend could not be established.
    #[error("backend unreachable at {endpoint}: {reason}")]
    BackendUnreachable { endpoint: String, reason: String },

    /// The connection dropped (or timed out) after streaming began.
    #[error("stream interrupted: {reason}")]
    StreamInterrupted { reason: String },

    /// Non-2xx HTTP response from the backend.
    #[error("HTTP {status}: {body}")]
    HttpError { status: u16, body: String },

    /// An SSE `data:` payload could not be parsed as a completion chunk.
    #[error("invalid stream chunk: {reason}")]
    InvalidChunk { reason: String },

    /// The HTTP client itself could not be constructed.
    #[error("failed to build HTTP client: {reason}")]
    ClientBuild { reason: String },
}

impl InferenceError {
    /// Stable snake_case tag, sent to the browser alongside the message.
    pub fn kind(&self) -> &'static str {
        match self {
            InferenceError::BackendUnreachable { .. } => "backend_unreachable",
            InferenceError::StreamInterrupted { .. } => "stream_interrupted",
            InferenceError::HttpError { .. } => "http_error",
            InferenceError::InvalidChunk { .. } => "invalid_chunk",
            InferenceError::ClientBuild { .. } => "client_build",
        }
    }

    /// Classify a `reqwest` error raised while sending the request.
    ///
    /// Anything that fails before response headers arrive means the backend
    /// never accepted the turn, except a timeout, which fails the turn fast.
    pub(crate) fn from_send(endpoint: &str, err: reqwest::Error) -> Self {
        if err.is_timeout() && !err.is_connect() {
            InferenceError::StreamInterrupted {
                reason: format!("request timed out: {err}"),
            }
        } else {
            InferenceError::BackendUnreachable {
                endpoint: endpoint.to_string(),
                reason: err.to_string(),
            }
        }
    }
}
