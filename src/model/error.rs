//! Error types for chatweave.
//!
//! # Error Hierarchy
//!
//! - [`AppError`] - Top-level application error
//!   - [`InputError`] - Transcript file/stdin reading failures
//!   - `std::io::Error` - Terminal/TUI rendering failures
//! - [`StreamError`] - Accumulator operations on streams that are not open
//! - [`NodeError`] - Tree operations on nodes that no longer exist
//!
//! # Error Recovery Strategy
//!
//! `StreamError` and `NodeError` are local and non-fatal: a stale stream ID
//! or a click on a node removed by a rebuild is logged and ignored. Input and
//! terminal errors are fatal and propagate to `main`.

use crate::model::{NodeId, StreamId};
use std::path::PathBuf;
use thiserror::Error;

/// Top-level application error.
///
/// # Recovery Behavior
///
/// Both variants are fatal: the terminal is restored and the error is
/// written to stderr.
#[derive(Debug, Error)]
pub enum AppError {
    /// Failed to open the transcript source.
    #[error("Failed to read input: {0}")]
    InputRead(#[from] InputError),

    /// Terminal or TUI rendering error.
    #[error("Terminal error: {0}")]
    Terminal(#[from] std::io::Error),
}

/// Errors encountered when opening transcript input.
#[derive(Debug, Error)]
pub enum InputError {
    /// The transcript file does not exist.
    #[error("File not found: {path}")]
    FileNotFound {
        /// The path that was attempted.
        path: PathBuf,
    },

    /// No file argument was given and stdin is an interactive terminal.
    ///
    /// **Recovery**: display usage; the user must pipe a transcript or pass
    /// a file path.
    #[error("No input: pass a transcript file or pipe events on stdin")]
    NoInput,

    /// Generic I/O failure while opening or reading.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Accumulator operation on a stream that is not open.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StreamError {
    /// The stream was never opened, or was already finalized or cleaned up.
    #[error("Stream not found: {0}")]
    NotFound(StreamId),
}

/// Tree operation on a node that cannot honor it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NodeError {
    /// No node with this ID exists (e.g. stale callback after a rebuild).
    #[error("Node not found: {0}")]
    NotFound(NodeId),

    /// The node has nothing to collapse.
    #[error("Node is not collapsible: {0}")]
    NotCollapsible(NodeId),

    /// The node exists but is not a tool execution node.
    #[error("Node is not a tool execution: {0}")]
    NotToolExecution(NodeId),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stream_error_names_the_stream() {
        let err = StreamError::NotFound(StreamId::new("abc").unwrap());
        assert_eq!(err.to_string(), "Stream not found: abc");
    }

    #[test]
    fn node_error_names_the_node() {
        let err = NodeError::NotFound(NodeId::Streaming(2));
        assert_eq!(err.to_string(), "Node not found: streaming_node_2");
    }

    #[test]
    fn input_error_converts_into_app_error() {
        let err: AppError = InputError::NoInput.into();
        assert!(matches!(err, AppError::InputRead(InputError::NoInput)));
    }

    #[test]
    fn file_not_found_includes_path() {
        let err = InputError::FileNotFound {
            path: PathBuf::from("/tmp/missing.jsonl"),
        };
        assert!(err.to_string().contains("/tmp/missing.jsonl"));
    }
}
