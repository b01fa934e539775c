//! Snapshot tests for the full screen
//!
//! Uses insta + ratatui TestBackend to verify rendering output doesn't regress.

use super::TuiApp;
use crate::model::{Message, MessageChunk, StreamId};
use crate::state::{ChatState, StreamEvent};
use ratatui::backend::TestBackend;
use ratatui::Terminal;

// ===== Test Helpers =====

/// Convert a ratatui buffer to a string representation for snapshot testing.
///
/// Empty lines are removed to keep snapshots clean.
fn buffer_to_string(buffer: &ratatui::buffer::Buffer) -> String {
    let area = buffer.area();
    let mut lines = Vec::new();

    for y in area.top()..area.bottom() {
        let mut line = String::new();
        for x in area.left()..area.right() {
            let cell = &buffer[(x, y)];
            line.push_str(cell.symbol());
        }
        let trimmed = line.trim_end();
        if !trimmed.is_empty() {
            lines.push(trimmed.to_string());
        }
    }

    lines.join("\n")
}

fn render(chat: ChatState, width: u16, height: u16) -> String {
    let terminal = Terminal::new(TestBackend::new(width, height)).unwrap();
    let mut app = TuiApp::new_for_test(terminal, chat);
    app.draw().unwrap();
    buffer_to_string(app.terminal().backend().buffer())
}

fn history(show_thinking: bool, messages: Vec<Message>) -> ChatState {
    let mut chat = ChatState::new(show_thinking);
    chat.handle_event(StreamEvent::History(messages));
    chat
}

// ===== Snapshots =====

#[test]
fn conversation_with_two_messages() {
    let chat = history(true, vec![Message::user("hello"), Message::assistant("world")]);

    let output = render(chat, 60, 8);

    insta::assert_snapshot!(output, @r"
    hello
    world
    [LIVE] nodes: 2 | selected: 0 | thinking: on | q: quit
    ");
}

#[test]
fn collapsed_long_answer() {
    let long = (0..8).map(|i| format!("line {i}")).collect::<Vec<_>>().join("\n");
    let mut chat = history(true, vec![Message::assistant(long)]);
    let id = chat.tree().nodes()[0].id();
    chat.tree_mut().toggle_node_expansion(id).unwrap();

    let output = render(chat, 60, 8);

    insta::assert_snapshot!(output, @r"
    line 0
    line 1
    line 2
    line 3
    line 4
    ... (Tab to expand, 3 more lines)
    [LIVE] nodes: 1 | selected: 0 | thinking: on | q: quit
    ");
}

#[test]
fn answer_with_visible_reasoning() {
    let chat = history(
        true,
        vec![Message::assistant("<think>plan it</think>The answer.")],
    );

    let output = render(chat, 60, 8);

    insta::assert_snapshot!(output, @r"
    Thinking: plan it
    The answer.
    [LIVE] nodes: 1 | selected: 0 | thinking: on | q: quit
    ");
}

#[test]
fn answer_with_hidden_reasoning() {
    let chat = history(
        false,
        vec![Message::assistant("<think>plan it</think>The answer.")],
    );

    let output = render(chat, 60, 8);

    insta::assert_snapshot!(output, @r"
    The answer.
    [LIVE] nodes: 1 | selected: 0 | thinking: off | q: quit
    ");
}

#[test]
fn streaming_answer_in_progress() {
    let mut chat = history(true, vec![Message::user("question")]);
    chat.handle_event(StreamEvent::Chunk(MessageChunk::new(
        StreamId::new("s1").unwrap(),
        0,
        "partial answer",
        false,
    )));

    let output = render(chat, 60, 8);

    insta::assert_snapshot!(output, @r"
    question
    partial answer
    [LIVE] nodes: 2 | selected: 0 | thinking: on | q: quit
    ");
}

#[test]
fn streaming_reasoning_above_partial_answer() {
    let mut chat = ChatState::new(true);
    chat.handle_event(StreamEvent::Chunk(MessageChunk::new(
        StreamId::new("s1").unwrap(),
        0,
        "<think>plan it</think>Partial",
        false,
    )));

    let output = render(chat, 60, 8);

    insta::assert_snapshot!(output, @r"
    Thinking: plan it
    Partial
    [LIVE] nodes: 1 | selected: 0 | thinking: on | q: quit
    ");
}
