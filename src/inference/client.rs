//! OpenAI-compatible inference client.
//!
//! Sends streaming chat completion requests to the local inference server
//! and turns the SSE response into a stream of content fragments.

use std::time::Duration;

use futures::Stream;
use reqwest::Client as HttpClient;

use super::errors::InferenceError;
use super::streaming::parse_sse_stream;
use super::types::ChatCompletionRequest;

// ─── Constants ───────────────────────────────────────────────────────────────

/// Default backend base URL (the OpenAI-compatible `/v1` root).
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8080/v1";

/// TCP connection timeout.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Default idle timeout: the longest the backend may go silent, before the
/// response headers or between body reads.
///
/// Local models can take a long time before the first token when the
/// server is cold or the prompt is long. A response that keeps producing
/// tokens may run for any length of time.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(180);

// ─── InferenceClient ─────────────────────────────────────────────────────────

/// Client for the local LLM inference endpoint.
///
/// Cheap to clone: the underlying connection pool is shared, and concurrent
/// streaming requests on it are independent.
#[derive(Debug, Clone)]
pub struct InferenceClient {
    http: HttpClient,
    base_url: String,
}

impl InferenceClient {
    /// Create a client for `base_url`. `idle_timeout` bounds each wait on
    /// the backend, not the length of a whole response.
    ///
    /// Does NOT check connectivity; that happens on the first request.
    pub fn new(base_url: &str, idle_timeout: Duration) -> Result<Self, InferenceError> {
        let http = HttpClient::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .read_timeout(idle_timeout)
            .build()
            .map_err(|e| InferenceError::ClientBuild {
                reason: e.to_string(),
            })?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// The backend base URL, without a trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // ─── Chat Completion (streaming) ─────────────────────────────────────

    /// Send a streaming chat completion request.
    ///
    /// Resolves once response headers arrive. The returned stream yields
    /// non-empty content fragments in the order the backend sent them and
    /// owns the response body: dropping it closes the connection.
    pub async fn chat_completion_stream(
        &self,
        request: &ChatCompletionRequest,
    ) -> Result<impl Stream<Item = Result<String, InferenceError>>, InferenceError> {
        let url = format!("{}/chat/completions", self.base_url);

        // Metadata only, messages hold user text
        tracing::info!(
            url = %url,
            model = %request.model,
            message_count = request.messages.len(),
            max_tokens = request.max_tokens,
            stream = request.stream,
            "sending chat completion request"
        );

        let response = self
            .http
            .post(&url)
            .json(request)
            .header("Accept", "text/event-stream")
            .send()
            .await
            .map_err(|e| InferenceError::from_send(&url, e))?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            return Err(InferenceError::HttpError {
                status: status.as_u16(),
                body: body_text,
            });
        }

        Ok(parse_sse_stream(response.bytes_stream()))
    }

    // ─── Health Check ────────────────────────────────────────────────────

    /// Check if the backend is reachable.
    ///
    /// Lists models rather than generating, so no inference tokens are
    /// spent. Any failure counts as unreachable.
    pub async fn health_check(&self) -> bool {
        let url = format!("{}/models", self.base_url);

        match self.http.get(&url).timeout(CONNECT_TIMEOUT).send().await {
            Ok(resp) => resp.status().is_success(),
            Err(e) => {
                tracing::debug!(url = %url, error = %e, "health check failed");
                false
            }
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inference::types::ChatMessage;
    use futures::StreamExt;

    fn request() -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: "gpt-demo".into(),
            messages: vec![ChatMessage::system("s"), ChatMessage::user("hi")],
            max_tokens: 8,
            stream: true,
        }
    }

    /// A local port with nothing listening on it.
    fn closed_port() -> u16 {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    }

    #[test]
    fn test_trailing_slash_is_trimmed() {
        let client =
            InferenceClient::new("http://127.0.0.1:8080/v1/", DEFAULT_REQUEST_TIMEOUT).unwrap();
        assert_eq!(client.base_url(), "http://127.0.0.1:8080/v1");
    }

    #[tokio::test]
    async fn test_unreachable_backend() {
        let base = format!("http://127.0.0.1:{}/v1", closed_port());
        let client = InferenceClient::new(&base, Duration::from_secs(5)).unwrap();

        match client.chat_completion_stream(&request()).await {
            Err(InferenceError::BackendUnreachable { endpoint, .. }) => {
                assert!(endpoint.ends_with("/v1/chat/completions"))
            }
            Err(other) => panic!("expected BackendUnreachable, got {other:?}"),
            Ok(stream) => {
                let items: Vec<_> = Box::pin(stream).collect().await;
                panic!("expected an error, got a stream of {} items", items.len())
            }
        }
    }

    #[tokio::test]
    async fn test_health_check_unreachable_is_false() {
        let base = format!("http://127.0.0.1:{}/v1", closed_port());
        let client = InferenceClient::new(&base, Duration::from_secs(5)).unwrap();
        assert!(!client.health_check().await);
    }
}
