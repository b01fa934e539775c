//! Domain model types (pure).
//!
//! All types in this module are plain data; identifiers use smart
//! constructors.

pub mod chunk;
pub mod error;
pub mod identifiers;
pub mod key_action;
pub mod message;

// Re-export for convenience
pub use chunk::MessageChunk;
pub use error::{AppError, InputError, NodeError, StreamError};
pub use identifiers::{InvalidStreamId, NodeId, StreamId};
pub use key_action::KeyAction;
pub use message::{Message, MessageSource, Role, ThinkingBlock, ToolCall, ToolFunction};
