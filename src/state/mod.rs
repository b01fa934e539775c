//! Conversation state driven by stream events.
//!
//! The UI loop owns a [`ChatState`] and feeds it every [`StreamEvent`] that
//! arrives from producers.

pub mod chat_state;
pub mod event;

// Re-export for convenience
pub use chat_state::ChatState;
pub use event::StreamEvent;
