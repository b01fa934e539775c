//! Screen layout: conversation pane above a one-line status bar.

use crate::state::ChatState;
use crate::view::constants::STATUS_BAR_HEIGHT;
use crate::view::conversation::{render_conversation, ChatScroll};
use crate::view::live_indicator::LiveIndicator;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

/// Split the frame into conversation and status areas.
pub fn split_areas(area: Rect) -> (Rect, Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(0),                    // Conversation
            Constraint::Length(STATUS_BAR_HEIGHT), // Status bar
        ])
        .split(area);
    (chunks[0], chunks[1])
}

/// Render the whole screen.
pub fn render_layout(
    frame: &mut Frame,
    chat: &mut ChatState,
    scroll: &mut ChatScroll,
    blink_on: bool,
) {
    let (conversation_area, status_area) = split_areas(frame.area());
    render_conversation(frame, conversation_area, chat, scroll);
    render_status_bar(frame, status_area, chat, scroll, blink_on);
}

/// Status line: live indicator, node and selection counts, reasoning
/// visibility, and the quit hint.
fn render_status_bar(
    frame: &mut Frame,
    area: Rect,
    chat: &ChatState,
    scroll: &ChatScroll,
    blink_on: bool,
) {
    let tree = chat.tree();
    let indicator = LiveIndicator::new(chat.open_stream_count() > 0, blink_on).render();
    let thinking = if chat.show_thinking() { "on" } else { "off" };
    let follow = if scroll.is_following() { "" } else { " | paused" };

    let status_text = format!(
        "nodes: {} | selected: {} | thinking: {}{} | q: quit",
        tree.node_count(),
        tree.selection_count(),
        thinking,
        follow,
    );

    let line = Line::from(vec![indicator, Span::raw(status_text)]);
    let paragraph = Paragraph::new(line).style(Style::default().fg(Color::Gray));
    frame.render_widget(paragraph, area);
}
