//! SSE streaming response parser for OpenAI-compatible chat completions.
//!
//! Reads a response body as a byte stream, splits on SSE boundaries
//! (`data: …\n\n`), parses each event as JSON, and yields the content
//! fragments in arrival order.

use futures::stream::{self, Stream, StreamExt};

use super::errors::InferenceError;
use super::types::ChatCompletionChunk;

// ─── SSE event parser ────────────────────────────────────────────────────────

/// Parse a raw SSE byte stream into content fragments.
///
/// 1. Buffers bytes until a complete SSE event is available
/// 2. Parses each `data:` payload as a `ChatCompletionChunk`
/// 3. Yields the non-empty `delta.content` of each chunk
/// 4. Stops at `data: [DONE]` or when the byte stream ends
///
/// A read error from the byte stream becomes `StreamInterrupted`, and so does
/// a body that ends partway through an event. After any error the stream ends.
pub fn parse_sse_stream<S, B, E>(
    byte_stream: S,
) -> impl Stream<Item = Result<String, InferenceError>>
where
    S: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
    E: std::fmt::Display,
{
    stream::unfold(
        (Box::pin(byte_stream), StreamState::new()),
        |(mut byte_stream, mut state)| async move {
            if state.finished {
                return None;
            }

            loop {
                // Drain complete events already in the buffer
                if let Some(event) = state.take_event() {
                    match state.process_event(&event) {
                        Ok(Some(fragment)) => return Some((Ok(fragment), (byte_stream, state))),
                        Ok(None) if state.finished => return None,
                        Ok(None) => continue,
                        Err(e) => {
                            state.finished = true;
                            return Some((Err(e), (byte_stream, state)));
                        }
                    }
                }

                match byte_stream.next().await {
                    Some(Ok(bytes)) => state.buffer.extend_from_slice(bytes.as_ref()),
                    Some(Err(e)) => {
                        state.finished = true;
                        return Some((
                            Err(InferenceError::StreamInterrupted {
                                reason: format!("stream read error: {e}"),
                            }),
                            (byte_stream, state),
                        ));
                    }
                    None => {
                        // Stream ended; a final event may lack its blank line
                        state.finished = true;
                        let rest = String::from_utf8_lossy(&std::mem::take(&mut state.buffer))
                            .into_owned();
                        return match state.process_event(rest.trim()) {
                            Ok(Some(fragment)) => Some((Ok(fragment), (byte_stream, state))),
                            Ok(None) => None,
                            // An unparseable tail is a body cut short, not a bad chunk
                            Err(InferenceError::InvalidChunk { .. }) => Some((
                                Err(InferenceError::StreamInterrupted {
                                    reason: "stream ended mid-event".to_string(),
                                }),
                                (byte_stream, state),
                            )),
                            Err(e) => Some((Err(e), (byte_stream, state))),
                        };
                    }
                }
            }
        },
    )
}

// ─── Stream State ────────────────────────────────────────────────────────────

/// Byte buffer plus termination flag for one response body.
///
/// Bytes are kept undecoded until a full event is framed so multi-byte
/// characters split across network reads survive intact.
struct StreamState {
    buffer: Vec<u8>,
    finished: bool,
}

impl StreamState {
    fn new() -> Self {
        Self {
            buffer: Vec::new(),
            finished: false,
        }
    }

    /// Remove and return the next complete event, if the buffer holds one.
    fn take_event(&mut self) -> Option<String> {
        let (end, separator_len) = find_event_boundary(&self.buffer)?;
        let event = String::from_utf8_lossy(&self.buffer[..end]).into_owned();
        self.buffer.drain(..end + separator_len);
        Some(event)
    }

    /// Process a single SSE event (may contain multiple `data:` lines).
    fn process_event(&mut self, event: &str) -> Result<Option<String>, InferenceError> {
        let mut data_content = String::new();

        for line in event.lines() {
            if let Some(data) = line.strip_prefix("data:") {
                let data = data.trim();
                if data == "[DONE]" {
                    self.finished = true;
                    return Ok(None);
                }
                if !data_content.is_empty() {
                    data_content.push('\n');
                }
                data_content.push_str(data);
            }
            // Comments, `event:` and `id:` lines carry nothing we use
        }

        if data_content.is_empty() {
            return Ok(None); // Keep-alive or comment
        }

        let chunk: ChatCompletionChunk =
            serde_json::from_str(&data_content).map_err(|e| InferenceError::InvalidChunk {
                reason: format!("failed to parse SSE chunk: {e} (data: {data_content})"),
            })?;

        if let Some(error) = chunk.error {
            return Err(InferenceError::StreamInterrupted {
                reason: format!("backend reported an error: {error}"),
            });
        }

        Ok(chunk.content_fragment())
    }
}

/// Position of the first blank line in `buf` and the length of its separator.
fn find_event_boundary(buf: &[u8]) -> Option<(usize, usize)> {
    let lf = buf.windows(2).position(|w| w == b"\n\n").map(|i| (i, 2));
    let crlf = buf.windows(4).position(|w| w == b"\r\n\r\n").map(|i| (i, 4));
    match (lf, crlf) {
        (Some(a), Some(b)) => Some(if a.0 <= b.0 { a } else { b }),
        (a, b) => a.or(b),
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
