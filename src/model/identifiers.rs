//! Core identifier types.
//!
//! Stream identifiers validate non-empty strings at construction time.
//! Node identifiers are a tagged union so streaming placeholders are
//! distinguishable without inspecting string prefixes.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier for one in-progress chunked delivery of a message.
/// NEVER export the constructor.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct StreamId(String);

impl StreamId {
    /// Smart constructor: validates non-empty stream ID
    pub fn new(raw: impl Into<String>) -> Result<Self, InvalidStreamId> {
        let raw = raw.into();
        if raw.is_empty() {
            return Err(InvalidStreamId::Empty);
        }
        Ok(Self(raw))
    }

    /// Borrow the raw identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StreamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for StreamId {
    type Error = InvalidStreamId;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<StreamId> for String {
    fn from(id: StreamId) -> Self {
        id.0
    }
}

/// Identifier of a node inside a [`NodeTree`](crate::view_state::NodeTree).
///
/// Sequence numbers are allocated by the tree and never reused while the
/// tree lives, so IDs stay unique across rebuilds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NodeId {
    /// Node derived from a settled conversation message.
    Regular(u64),
    /// Transient placeholder for a reply that is still streaming.
    Streaming(u64),
}

impl NodeId {
    /// Sequence number shared by both variants.
    pub fn sequence(&self) -> u64 {
        match self {
            NodeId::Regular(n) | NodeId::Streaming(n) => *n,
        }
    }

    /// Whether this ID marks a streaming placeholder.
    pub fn is_streaming(&self) -> bool {
        matches!(self, NodeId::Streaming(_))
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeId::Regular(n) => write!(f, "node_{n}"),
            NodeId::Streaming(n) => write!(f, "streaming_node_{n}"),
        }
    }
}

// ===== Error Types =====

/// Rejected stream identifier.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidStreamId {
    /// Stream IDs must carry at least one character.
    #[error("Stream ID cannot be empty")]
    Empty,
}
