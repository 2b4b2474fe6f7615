//! Inference client for the OpenAI-compatible local model server.
//!
//! This module handles all communication with the backend:
//! - Streaming chat completions
//! - SSE stream parsing
//! - Connection failure classification
//! - Health probing
//!
//! The client speaks the OpenAI Chat Completions API, so any server that
//! implements it (llama.cpp, TGI, vLLM, Ollama) can sit behind the relay.

pub mod client;
pub mod errors;
pub mod streaming;
pub mod types;

// Re-exports for convenience
pub use client::{InferenceClient, DEFAULT_BASE_URL, DEFAULT_REQUEST_TIMEOUT};
pub use errors::InferenceError;
pub use types::{ChatCompletionRequest, ChatMessage, Role};
