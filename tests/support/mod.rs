//! In-process stand-in for an OpenAI-compatible inference server.
//!
//! Speaks just enough HTTP/1.1 over a raw `TcpListener` to accept a
//! streaming chat completion request and write back scripted SSE bytes.

#![allow(dead_code)]

use std::time::Duration;

use chatfront::settings::{AppSettings, ClientConfig, Session};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

pub fn settings() -> AppSettings {
    AppSettings::new(
        ClientConfig {
            title: "Local Chat".into(),
            hardware: "1x RTX 4090".into(),
            model_description_template: "Model: __MODEL_NAME_PLACEHOLDER__ ready".into(),
            max_tokens: 64,
            system_prompt: "You are a test double.".into(),
            examples: vec!["Say hi".into()],
        },
        Session {
            model: "gpt-demo".into(),
        },
    )
}

/// One SSE event carrying a content delta.
pub fn delta_event(content: &str) -> String {
    format!(
        "data: {}\n\n",
        serde_json::json!({
            "id": "chatcmpl-test",
            "object": "chat.completion.chunk",
            "choices": [{"index": 0, "delta": {"content": content}, "finish_reason": null}]
        })
    )
}

pub const ROLE_EVENT: &str =
    "data: {\"choices\":[{\"index\":0,\"delta\":{\"role\":\"assistant\"},\"finish_reason\":null}]}\n\n";

pub const DONE_EVENT: &str = "data: [DONE]\n\n";

/// Headers for a body that ends when the connection closes.
pub const STREAM_HEADERS: &str =
    "HTTP/1.1 200 OK\r\nContent-Type: text/event-stream\r\nConnection: close\r\n\r\n";

/// Headers promising far more bytes than will be sent, so an early close
/// is a truncated body rather than a clean end.
pub const TRUNCATED_HEADERS: &str = "HTTP/1.1 200 OK\r\nContent-Type: text/event-stream\r\nContent-Length: 100000\r\n\r\n";

/// Bind an ephemeral port; returns the listener and the `/v1` base URL.
pub async fn bind_backend() -> (TcpListener, String) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    (listener, format!("http://127.0.0.1:{port}/v1"))
}

/// Read one HTTP request and return its body parsed as JSON.
pub async fn read_request(stream: &mut TcpStream) -> serde_json::Value {
    let mut buf = Vec::new();
    let mut tmp = [0u8; 4096];
    loop {
        let n = stream.read(&mut tmp).await.unwrap();
        assert!(n > 0, "client closed before sending a full request");
        buf.extend_from_slice(&tmp[..n]);

        let Some(header_end) = buf.windows(4).position(|w| w == b"\r\n\r\n") else {
            continue;
        };
        let headers = String::from_utf8_lossy(&buf[..header_end]).to_ascii_lowercase();
        let content_length = headers
            .lines()
            .find_map(|line| line.strip_prefix("content-length:"))
            .map(|v| v.trim().parse::<usize>().unwrap())
            .unwrap_or(0);
        let body_start = header_end + 4;
        if buf.len() >= body_start + content_length {
            return serde_json::from_slice(&buf[body_start..body_start + content_length]).unwrap();
        }
    }
}

/// Write each part, pausing briefly between them so they arrive as
/// separate reads.
pub async fn write_parts(stream: &mut TcpStream, parts: &[String]) {
    for part in parts {
        stream.write_all(part.as_bytes()).await.unwrap();
        stream.flush().await.unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

/// The user message from a captured request body.
pub fn user_message(body: &serde_json::Value) -> String {
    body["messages"][1]["content"].as_str().unwrap().to_string()
}
