//! Chat relay: one streaming round trip per user turn.
//!
//! Each call to [`ChatRelay::send`] is a fresh two-message exchange (the
//! fixed system prompt, then the user's message) against the backend. No
//! history is kept between turns; the relay holds only the immutable
//! settings it was built from, so concurrent turns share nothing mutable.

use std::time::Duration;

use futures::future;
use futures::stream::{self, BoxStream, Stream, StreamExt, TryStreamExt};

use crate::inference::{ChatCompletionRequest, ChatMessage, InferenceClient, InferenceError};
use crate::settings::AppSettings;

/// Builds and streams chat turns against the inference backend.
#[derive(Debug, Clone)]
pub struct ChatRelay {
    client: InferenceClient,
    model: String,
    system_prompt: String,
    max_tokens: u32,
}

impl ChatRelay {
    /// Create a relay from validated settings.
    pub fn new(client: InferenceClient, settings: &AppSettings) -> Self {
        Self {
            client,
            model: settings.session.model.clone(),
            system_prompt: settings.client.system_prompt.clone(),
            max_tokens: settings.client.max_tokens,
        }
    }

    /// Convenience constructor that also builds the HTTP client.
    pub fn connect(
        base_url: &str,
        idle_timeout: Duration,
        settings: &AppSettings,
    ) -> Result<Self, InferenceError> {
        Ok(Self::new(
            InferenceClient::new(base_url, idle_timeout)?,
            settings,
        ))
    }

    pub fn base_url(&self) -> &str {
        self.client.base_url()
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// The request body for one turn: system prompt, then `message`.
    pub fn request_for(&self, message: &str) -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage::system(self.system_prompt.clone()),
                ChatMessage::user(message),
            ],
            max_tokens: self.max_tokens,
            stream: true,
        }
    }

    /// Stream one turn.
    ///
    /// Nothing is sent until the returned stream is first polled. Each item
    /// is the full response text received so far. On failure a single
    /// `Err` follows the prefixes already yielded and the stream ends.
    /// Dropping the stream early closes the backend connection.
    pub fn send(&self, message: &str) -> BoxStream<'static, Result<String, InferenceError>> {
        let client = self.client.clone();
        let request = self.request_for(message);

        let fragments = stream::once(async move {
            client.chat_completion_stream(&request).await
        })
        .map(|opened| match opened {
            Ok(fragments) => fragments.left_stream(),
            Err(e) => stream::once(future::ready(Err::<String, _>(e))).right_stream(),
        })
        .flatten();

        cumulative_prefixes(fragments).boxed()
    }

    /// Whether the backend answers its model listing.
    pub async fn backend_healthy(&self) -> bool {
        self.client.health_check().await
    }
}

/// Turn a stream of fragments into a stream of running prefixes.
///
/// Empty fragments are skipped. The first error is passed through and ends
/// the stream.
pub fn cumulative_prefixes<S>(fragments: S) -> impl Stream<Item = Result<String, InferenceError>>
where
    S: Stream<Item = Result<String, InferenceError>>,
{
    fragments
        .try_filter(|fragment| future::ready(!fragment.is_empty()))
        .scan((String::new(), false), |(prefix, failed), item| {
            if *failed {
                return future::ready(None);
            }
            let next = match item {
                Ok(fragment) => {
                    prefix.push_str(&fragment);
                    Ok(prefix.clone())
                }
                Err(e) => {
                    *failed = true;
                    Err(e)
                }
            };
            future::ready(Some(next))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inference::Role;
    use crate::settings::{ClientConfig, Session};

    fn settings() -> AppSettings {
        AppSettings::new(
            ClientConfig {
                title: "t".into(),
                hardware: "h".into(),
                model_description_template: "m".into(),
                max_tokens: 128,
                system_prompt: "You are terse.".into(),
                examples: vec![],
            },
            Session {
                model: "gpt-demo".into(),
            },
        )
    }

    fn fragments(
        items: Vec<Result<&'static str, InferenceError>>,
    ) -> impl Stream<Item = Result<String, InferenceError>> {
        stream::iter(items.into_iter().map(|r| r.map(str::to_string)))
    }

    #[tokio::test]
    async fn test_prefixes_are_cumulative() {
        let out: Vec<String> = cumulative_prefixes(fragments(vec![Ok("Hel"), Ok("lo"), Ok(" there")]))
            .map(Result::unwrap)
            .collect()
            .await;
        assert_eq!(out, vec!["Hel", "Hello", "Hello there"]);
    }

    #[tokio::test]
    async fn test_empty_fragments_are_no_ops() {
        let out: Vec<String> = cumulative_prefixes(fragments(vec![Ok(""), Ok("a"), Ok(""), Ok("b")]))
            .map(Result::unwrap)
            .collect()
            .await;
        assert_eq!(out, vec!["a", "ab"]);
    }

    #[tokio::test]
    async fn test_error_ends_stream_after_prefix() {
        let out: Vec<_> = cumulative_prefixes(fragments(vec![
            Ok("one"),
            Err(InferenceError::StreamInterrupted {
                reason: "reset".into(),
            }),
            Ok("two"),
        ]))
        .collect()
        .await;

        assert_eq!(out.len(), 2);
        assert_eq!(out[0].as_ref().unwrap(), "one");
        assert!(matches!(
            out[1],
            Err(InferenceError::StreamInterrupted { .. })
        ));
    }

    #[test]
    fn test_request_carries_system_then_user() {
        let relay = ChatRelay::connect("http://127.0.0.1:8080/v1", Duration::from_secs(5), &settings())
            .unwrap();
        let req = relay.request_for("hello?");

        assert_eq!(req.model, "gpt-demo");
        assert_eq!(req.max_tokens, 128);
        assert!(req.stream);
        assert_eq!(req.messages.len(), 2);
        assert_eq!(req.messages[0].role, Role::System);
        assert_eq!(req.messages[0].content, "You are terse.");
        assert_eq!(req.messages[1].role, Role::User);
        assert_eq!(req.messages[1].content, "hello?");
    }

    #[tokio::test]
    async fn test_send_to_closed_port_yields_single_error() {
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let relay = ChatRelay::connect(
            &format!("http://127.0.0.1:{port}/v1"),
            Duration::from_secs(5),
            &settings(),
        )
        .unwrap();

        let out: Vec<_> = relay.send("hi").collect().await;
        assert_eq!(out.len(), 1);
        assert!(matches!(
            out[0],
            Err(InferenceError::BackendUnreachable { .. })
        ));
    }
}
