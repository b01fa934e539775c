//! Conversation message types.
//!
//! A [`Message`] is the unit handed to the node tree. Messages are created
//! when the user sends input or a model stream starts, mutated while the
//! stream is open, and settled once the stream completes.

use crate::model::StreamId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Commands longer than this are shortened in tool progress messages.
const PROGRESS_COMMAND_LIMIT: usize = 50;

// ===== Role =====

/// Author of a conversation message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Input typed by the user
    User,
    /// Reply produced by the model
    Assistant,
    /// System prompt or client notice
    System,
    /// Output returned by a tool invocation
    Tool,
    /// Live notice that a tool is running
    ToolProgress,
    /// Failure surfaced by the backend collaborator
    Error,
}

// ===== ThinkingBlock =====

/// Reasoning text separated from the visible answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThinkingBlock {
    /// Reasoning content with the tags removed.
    pub content: String,
    /// Whether the reasoning should be displayed.
    #[serde(default = "default_visible")]
    pub visible: bool,
}

fn default_visible() -> bool {
    true
}

// ===== ToolCall =====

/// Function invocation requested by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolFunction {
    /// Backend tool name, e.g. `execute_bash`.
    pub name: String,
    /// Arguments as a JSON object.
    #[serde(default)]
    pub arguments: serde_json::Map<String, serde_json::Value>,
}

/// Tool call attached to an assistant message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// The invoked function.
    pub function: ToolFunction,
}

impl ToolCall {
    /// Create a tool call from a name and an argument object.
    pub fn new(
        name: impl Into<String>,
        arguments: serde_json::Map<String, serde_json::Value>,
    ) -> Self {
        Self {
            function: ToolFunction {
                name: name.into(),
                arguments,
            },
        }
    }

    /// The `command` argument, when present and textual.
    pub fn command(&self) -> Option<&str> {
        self.function
            .arguments
            .get("command")
            .and_then(serde_json::Value::as_str)
    }
}

// ===== MessageSource =====

/// Where the current message content came from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageSource {
    /// Inserted locally before the backend confirmed it
    Optimistic,
    /// Partial content of an open stream
    Streaming,
    /// Settled content
    #[default]
    Final,
}

// ===== Message =====

/// One conversation message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Author of the message.
    pub role: Role,
    /// Visible content (the answer when thinking has been split out).
    #[serde(default)]
    pub content: String,
    /// Separated reasoning, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thinking: Option<ThinkingBlock>,
    /// Tool that produced this message (tool and tool progress roles).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_name: Option<String>,
    /// Tool invocations requested by the model.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,
    /// Creation or last-update time.
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
    /// Stream that delivered the message, if it was streamed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stream_id: Option<StreamId>,
    /// Provenance of the content.
    #[serde(default)]
    pub source: MessageSource,
}

impl Message {
    /// Create a message with the given role and content, stamped now.
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            thinking: None,
            tool_name: None,
            tool_calls: Vec::new(),
            timestamp: Utc::now(),
            stream_id: None,
            source: MessageSource::Final,
        }
    }

    /// User input, inserted before any backend confirmation.
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content).with_source(MessageSource::Optimistic)
    }

    /// Settled assistant reply.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    /// System notice.
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    /// Error surfaced by the backend.
    pub fn error(content: impl Into<String>) -> Self {
        Self::new(Role::Error, content)
    }

    /// Output of a finished tool.
    pub fn tool_result(tool_name: impl Into<String>, output: impl Into<String>) -> Self {
        let mut msg = Self::new(Role::Tool, output);
        msg.tool_name = Some(tool_name.into());
        msg
    }

    /// Live progress line for a running tool: `Tool(command)`.
    ///
    /// Commands longer than 50 characters are cut to 47 plus `...`.
    pub fn tool_progress(tool_name: impl Into<String>, command: &str) -> Self {
        let tool_name = tool_name.into();
        let command = if command.chars().count() > PROGRESS_COMMAND_LIMIT {
            let head: String = command.chars().take(PROGRESS_COMMAND_LIMIT - 3).collect();
            format!("{head}...")
        } else {
            command.to_string()
        };
        let mut msg = Self::new(Role::ToolProgress, format!("{tool_name}({command})"))
            .with_source(MessageSource::Optimistic);
        msg.tool_name = Some(tool_name);
        msg
    }

    /// Partial assistant content for an open stream.
    pub fn streaming(stream_id: StreamId, content: impl Into<String>) -> Self {
        let mut msg = Self::new(Role::Assistant, content).with_source(MessageSource::Streaming);
        msg.stream_id = Some(stream_id);
        msg
    }

    /// Attach separated reasoning.
    pub fn with_thinking(mut self, content: impl Into<String>, visible: bool) -> Self {
        self.thinking = Some(ThinkingBlock {
            content: content.into(),
            visible,
        });
        self
    }

    /// Attach tool calls.
    pub fn with_tool_calls(mut self, tool_calls: Vec<ToolCall>) -> Self {
        self.tool_calls = tool_calls;
        self
    }

    /// Replace the provenance marker.
    pub fn with_source(mut self, source: MessageSource) -> Self {
        self.source = source;
        self
    }

    /// Whether non-empty reasoning has been separated out.
    pub fn has_thinking(&self) -> bool {
        self.thinking
            .as_ref()
            .is_some_and(|t| !t.content.is_empty())
    }

    /// Whether separated reasoning exists and is marked visible.
    pub fn is_thinking_visible(&self) -> bool {
        self.has_thinking() && self.thinking.as_ref().is_some_and(|t| t.visible)
    }

    /// Content with visible reasoning folded back in as a `<think>` block.
    pub fn effective_content(&self) -> String {
        match &self.thinking {
            Some(thinking) if self.is_thinking_visible() => {
                if self.content.is_empty() {
                    format!("<think>{}</think>", thinking.content)
                } else {
                    format!("<think>{}</think>\n\n{}", thinking.content, self.content)
                }
            }
            _ => self.content.clone(),
        }
    }
}

#[cfg(test)]
#[path = "message_tests.rs"]
mod tests;
