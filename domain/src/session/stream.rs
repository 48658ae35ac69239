//! Streaming events for provider communication.
//!
//! [`StreamEvent`] represents individual events in a streaming provider
//! response, enabling real-time display of output as it is generated.

use crate::debate::entities::TokenUsage;

/// An event in a streaming provider response.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    /// A text chunk from the model.
    Delta(String),
    /// Token usage reported by the provider (usually near the end).
    Usage(TokenUsage),
    /// The stream finished normally.
    Done,
    /// An error that occurred mid-stream.
    Error(String),
}
