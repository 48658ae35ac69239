//! Streaming response bodies
//!
//! Both server-sent events (OpenAI, Anthropic, Google) and Ollama's
//! newline-delimited JSON arrive as a byte stream that must be split into
//! lines before parsing. [`spawn_event_stream`] drives that loop on a
//! background task and feeds parsed [`StreamEvent`]s into a channel.

use super::UsageSlot;
use super::http::transport_error;
use futures::StreamExt;
use mars_application::StreamHandle;
use mars_domain::StreamEvent;
use reqwest::Response;
use tokio::sync::mpsc;
use tracing::debug;

/// Buffered events between the transport task and the consumer
const STREAM_CHANNEL_CAPACITY: usize = 64;

/// Splits a chunked body into complete lines.
///
/// Bytes are buffered until a newline arrives so multi-byte characters
/// split across network chunks decode correctly.
#[derive(Debug, Default)]
pub struct LineBuffer {
    pending: Vec<u8>,
}

impl LineBuffer {
    /// Append a chunk and return every line it completed (without `\r\n`)
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.pending.extend_from_slice(chunk);
        let mut lines = Vec::new();
        while let Some(pos) = self.pending.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.pending.drain(..=pos).collect();
            lines.push(decode_line(&line));
        }
        lines
    }

    /// The trailing unterminated line, if any
    pub fn finish(self) -> Option<String> {
        if self.pending.is_empty() {
            None
        } else {
            Some(decode_line(&self.pending))
        }
    }
}

fn decode_line(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes)
        .trim_end_matches(['\n', '\r'])
        .to_string()
}

/// Payload of an SSE `data:` line; other fields (`event:`, `id:`,
/// comments) yield `None`.
pub fn sse_data(line: &str) -> Option<&str> {
    let data = line.strip_prefix("data:")?;
    Some(data.strip_prefix(' ').unwrap_or(data))
}

/// Spawn a task that reads `response` line by line through `parse_line`.
///
/// Usage events are also stored into `usage` so the adapter can answer
/// `last_usage()` once the stream is drained. The stream ends at the first
/// `Done` or `Error` the parser emits; a body that simply ends is treated
/// as `Done`.
pub fn spawn_event_stream<P>(
    response: Response,
    usage: UsageSlot,
    mut parse_line: P,
) -> StreamHandle
where
    P: FnMut(&str) -> Vec<StreamEvent> + Send + 'static,
{
    let (tx, rx) = mpsc::channel(STREAM_CHANNEL_CAPACITY);

    tokio::spawn(async move {
        let mut body = response.bytes_stream();
        let mut lines = LineBuffer::default();

        while let Some(chunk) = body.next().await {
            let chunk = match chunk {
                Ok(chunk) => chunk,
                Err(e) => {
                    let _ = tx
                        .send(StreamEvent::Error(transport_error(e).to_string()))
                        .await;
                    return;
                }
            };
            for line in lines.push(&chunk) {
                if forward(&tx, &usage, parse_line(&line)).await {
                    return;
                }
            }
        }

        if let Some(line) = lines.finish()
            && forward(&tx, &usage, parse_line(&line)).await
        {
            return;
        }
        let _ = tx.send(StreamEvent::Done).await;
    });

    StreamHandle::new(rx)
}

/// Send parsed events on; returns true once the stream is finished.
async fn forward(
    tx: &mpsc::Sender<StreamEvent>,
    usage: &UsageSlot,
    events: Vec<StreamEvent>,
) -> bool {
    for event in events {
        if let StreamEvent::Usage(reported) = &event {
            usage.set(*reported);
        }
        let terminal = matches!(event, StreamEvent::Done | StreamEvent::Error(_));
        if tx.send(event).await.is_err() {
            debug!("Stream receiver dropped");
            return true;
        }
        if terminal {
            return true;
        }
    }
    false
}
