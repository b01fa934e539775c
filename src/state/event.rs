//! Events delivered to the UI loop.

use crate::model::{Message, MessageChunk, StreamId};

/// Everything a producer can tell the UI loop.
///
/// Producers run on worker threads and only ever talk to the loop through
/// a channel of these.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    /// Replace the conversation with a snapshot.
    History(Vec<Message>),
    /// The user sent a message.
    UserInput(String),
    /// A fragment of a streamed reply.
    Chunk(MessageChunk),
    /// The backend gave up on a stream.
    StreamFailed {
        /// Failed stream.
        stream_id: StreamId,
        /// Reason shown to the user.
        error: String,
    },
    /// The user cancelled a stream.
    StreamCancelled(StreamId),
    /// A tool began running.
    ToolStarted {
        /// Correlates later tool events.
        call_id: String,
        /// Backend tool name.
        tool_name: String,
    },
    /// A running tool reported progress.
    ToolProgress {
        /// Tool run.
        call_id: String,
        /// Progress note.
        progress: String,
    },
    /// A tool finished.
    ToolFinished {
        /// Tool run.
        call_id: String,
        /// Tool output.
        output: String,
    },
    /// A tool failed.
    ToolFailed {
        /// Tool run.
        call_id: String,
        /// Failure reason.
        error: String,
    },
}
