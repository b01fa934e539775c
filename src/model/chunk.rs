//! Stream fragments handed to the accumulator.

use crate::model::{Role, StreamId, ToolCall};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One fragment of a streamed message.
///
/// Chunk IDs take the form `{stream_id}-{index}` where `index` is the
/// position of the fragment within its stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageChunk {
    /// Unique chunk identifier.
    pub id: String,
    /// Stream this fragment belongs to.
    pub stream_id: StreamId,
    /// Text carried by the fragment (may be empty on the final chunk).
    #[serde(default)]
    pub content: String,
    /// Marks the last fragment of the stream.
    #[serde(default)]
    pub done: bool,
    /// Arrival time.
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
    /// Backend failure reported on this fragment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Model that produced the stream.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Author of the streamed message; assistant when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    /// Tool calls announced so far.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,
}

impl MessageChunk {
    /// Create a content fragment at `index` within `stream_id`.
    pub fn new(stream_id: StreamId, index: usize, content: impl Into<String>, done: bool) -> Self {
        Self {
            id: format!("{stream_id}-{index}"),
            stream_id,
            content: content.into(),
            done,
            timestamp: Utc::now(),
            error: None,
            model: None,
            role: None,
            tool_calls: Vec::new(),
        }
    }

    /// Create a fragment that reports a backend failure.
    pub fn failed(stream_id: StreamId, index: usize, error: impl Into<String>) -> Self {
        let mut chunk = Self::new(stream_id, index, "", false);
        chunk.error = Some(error.into());
        chunk
    }

    /// Tag the fragment with the producing model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Attach tool calls announced by the backend.
    pub fn with_tool_calls(mut self, tool_calls: Vec<ToolCall>) -> Self {
        self.tool_calls = tool_calls;
        self
    }

    /// Whether this fragment reports a failure.
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}
