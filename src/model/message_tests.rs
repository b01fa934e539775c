//! Tests for conversation message types.

use super::*;

#[test]
fn tool_progress_keeps_short_commands() {
    let msg = Message::tool_progress("Shell", "ls -la");
    assert_eq!(msg.role, Role::ToolProgress);
    assert_eq!(msg.content, "Shell(ls -la)");
    assert_eq!(msg.tool_name.as_deref(), Some("Shell"));
    assert_eq!(msg.source, MessageSource::Optimistic);
}

#[test]
fn tool_progress_truncates_long_commands() {
    let command = "x".repeat(60);
    let msg = Message::tool_progress("Shell", &command);
    let expected = format!("Shell({}...)", "x".repeat(47));
    assert_eq!(msg.content, expected);
}

#[test]
fn tool_progress_keeps_command_of_exactly_fifty_chars() {
    let command = "y".repeat(50);
    let msg = Message::tool_progress("Shell", &command);
    assert_eq!(msg.content, format!("Shell({command})"));
}

#[test]
fn effective_content_includes_visible_thinking() {
    let msg = Message::assistant("Answer").with_thinking("Reasoning", true);
    assert_eq!(msg.effective_content(), "<think>Reasoning</think>\n\nAnswer");
}

#[test]
fn effective_content_without_answer_is_only_the_block() {
    let msg = Message::assistant("").with_thinking("Reasoning", true);
    assert_eq!(msg.effective_content(), "<think>Reasoning</think>");
}

#[test]
fn effective_content_hides_invisible_thinking() {
    let msg = Message::assistant("Answer").with_thinking("Reasoning", false);
    assert!(msg.has_thinking());
    assert!(!msg.is_thinking_visible());
    assert_eq!(msg.effective_content(), "Answer");
}

#[test]
fn empty_thinking_block_does_not_count() {
    let msg = Message::assistant("Answer").with_thinking("", true);
    assert!(!msg.has_thinking());
}

#[test]
fn role_serializes_snake_case() {
    let json = serde_json::to_string(&Role::ToolProgress).unwrap();
    assert_eq!(json, "\"tool_progress\"");
}

#[test]
fn message_deserializes_with_defaults() {
    let msg: Message = serde_json::from_str(r#"{"role":"user","content":"hi"}"#).unwrap();
    assert_eq!(msg.role, Role::User);
    assert_eq!(msg.content, "hi");
    assert!(msg.tool_calls.is_empty());
    assert_eq!(msg.stream_id, None);
    assert_eq!(msg.source, MessageSource::Final);
}

#[test]
fn tool_call_exposes_command_argument() {
    let mut args = serde_json::Map::new();
    args.insert("command".to_string(), serde_json::json!("docker ps -a"));
    let call = ToolCall::new("execute_bash", args);
    assert_eq!(call.command(), Some("docker ps -a"));

    let call = ToolCall::new("read_file", serde_json::Map::new());
    assert_eq!(call.command(), None);
}
