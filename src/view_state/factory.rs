//! Message-to-node classification.
//!
//! Builders are tried in a fixed priority order and the first that accepts
//! the message wins. Plain text accepts everything, so classification is
//! total.

use super::node::{truncate_chars, Node, NodeKind, ThinkingParts, TOOL_PREVIEW_CHARS};
use crate::model::{Message, MessageSource, NodeId, Role};
use crate::parser::parse_message_thinking;

/// One node builder in the classification chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeFactory {
    /// Messages carrying tool calls.
    ToolCall,
    /// Tool output.
    ToolResult,
    /// Tool progress notices.
    ToolProgress,
    /// Assistant messages with reasoning.
    Thinking,
    /// Everything else.
    Text,
}

impl NodeFactory {
    /// Builders in priority order.
    pub const CHAIN: [NodeFactory; 5] = [
        NodeFactory::ToolCall,
        NodeFactory::ToolResult,
        NodeFactory::ToolProgress,
        NodeFactory::Thinking,
        NodeFactory::Text,
    ];

    /// Whether this builder accepts `message`.
    pub fn can_handle(self, message: &Message) -> bool {
        match self {
            NodeFactory::ToolCall => !message.tool_calls.is_empty(),
            NodeFactory::ToolResult => message.role == Role::Tool,
            NodeFactory::ToolProgress => message.role == Role::ToolProgress,
            // Streaming placeholders arrive with reasoning already split out.
            NodeFactory::Thinking => {
                message.role == Role::Assistant
                    && (message.has_thinking()
                        || (message.source != MessageSource::Streaming
                            && parse_message_thinking(&message.content).has_thinking))
            }
            NodeFactory::Text => true,
        }
    }

    /// Build a node of this builder's kind.
    pub fn create(self, message: Message, id: NodeId) -> Node {
        let kind = match self {
            NodeFactory::ToolCall => NodeKind::ToolCall,
            NodeFactory::ToolProgress => NodeKind::ToolProgress,
            NodeFactory::Text => NodeKind::Text,
            NodeFactory::ToolResult => {
                let (preview, truncated) = truncate_chars(&message.content, TOOL_PREVIEW_CHARS);
                NodeKind::ToolResult { preview, truncated }
            }
            NodeFactory::Thinking => NodeKind::Thinking(thinking_parts(&message)),
        };
        Node::new(id, message, kind)
    }

    /// Build a node with the first builder that accepts `message`.
    pub fn create_node(message: Message, id: NodeId) -> Node {
        let factory = Self::CHAIN
            .into_iter()
            .find(|f| f.can_handle(&message))
            .unwrap_or(NodeFactory::Text);
        factory.create(message, id)
    }
}

/// Reasoning from the separated block when present, else from tags in the
/// content.
fn thinking_parts(message: &Message) -> ThinkingParts {
    match &message.thinking {
        Some(block) if message.has_thinking() => ThinkingParts {
            thinking: block.content.trim().to_string(),
            response: message.content.trim().to_string(),
            show_thinking: block.visible,
        },
        _ => {
            let parsed = parse_message_thinking(&message.content);
            ThinkingParts {
                thinking: parsed.thinking,
                response: parsed.response,
                show_thinking: true,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ToolCall;

    fn classify(message: &Message) -> NodeFactory {
        NodeFactory::CHAIN
            .into_iter()
            .find(|f| f.can_handle(message))
            .unwrap()
    }

    #[test]
    fn tool_calls_win_over_role() {
        let call = ToolCall::new("read_file", serde_json::Map::new());
        let message = Message::assistant("<think>x</think>y").with_tool_calls(vec![call]);
        assert_eq!(classify(&message), NodeFactory::ToolCall);
    }

    #[test]
    fn roles_map_to_tool_builders() {
        assert_eq!(classify(&Message::tool_result("t", "out")), NodeFactory::ToolResult);
        assert_eq!(
            classify(&Message::tool_progress("t", "cmd")),
            NodeFactory::ToolProgress
        );
    }

    #[test]
    fn assistant_with_tags_or_block_is_thinking() {
        assert_eq!(
            classify(&Message::assistant("<think>a</think>b")),
            NodeFactory::Thinking
        );
        assert_eq!(
            classify(&Message::assistant("b").with_thinking("a", false)),
            NodeFactory::Thinking
        );
    }

    #[test]
    fn user_with_tags_is_plain_text() {
        assert_eq!(classify(&Message::user("<think>a</think>b")), NodeFactory::Text);
    }

    #[test]
    fn empty_thinking_block_falls_through_to_text() {
        assert_eq!(
            classify(&Message::assistant("<think>  </think>b")),
            NodeFactory::Text
        );
    }

    #[test]
    fn created_node_keeps_id_and_message() {
        let message = Message::system("boot");
        let node = NodeFactory::create_node(message.clone(), NodeId::Regular(9));
        assert_eq!(node.id(), NodeId::Regular(9));
        assert_eq!(node.message(), &message);
        assert_eq!(node.kind(), &NodeKind::Text);
    }

    #[test]
    fn tool_result_preview_is_computed_once() {
        let node = NodeFactory::create_node(
            Message::tool_result("bash", "q".repeat(301)),
            NodeId::Regular(1),
        );
        match node.kind() {
            NodeKind::ToolResult { preview, truncated } => {
                assert!(*truncated);
                assert_eq!(preview.len(), TOOL_PREVIEW_CHARS + 3);
            }
            other => panic!("unexpected kind {other:?}"),
        }
    }
}
