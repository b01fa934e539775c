//! Node styling.
//!
//! Distinct colors per message role, plus the selection and focus
//! highlights layered on top.

use super::types::NodeState;
use crate::model::Role;
use crate::parser::SegmentFormat;
use ratatui::style::{Color, Modifier, Style};

/// Base style for a message role.
///
/// - User (Cyan)
/// - Assistant (Green)
/// - Tool and tool progress (Yellow)
/// - System (Magenta)
/// - Error (Red)
pub fn role_style(role: Role) -> Style {
    match role {
        Role::User => Style::default().fg(Color::Cyan),
        Role::Assistant => Style::default().fg(Color::Green),
        Role::Tool | Role::ToolProgress => Style::default().fg(Color::Yellow),
        Role::System => Style::default().fg(Color::Magenta),
        Role::Error => Style::default().fg(Color::Red),
    }
}

/// Style for reasoning text.
pub fn thinking_style() -> Style {
    SegmentFormat::Thinking.style()
}

/// Bold tool header style.
pub fn tool_header_style() -> Style {
    role_style(Role::Tool).add_modifier(Modifier::BOLD)
}

/// Apply the selection or focus highlight.
///
/// Selection wins over focus. `keep_fg` preserves the base foreground under
/// a selection, which keeps dimmed reasoning distinguishable.
pub fn highlight(style: Style, state: NodeState, keep_fg: bool) -> Style {
    if state.selected {
        let style = style.bg(Color::Blue);
        if keep_fg {
            style
        } else {
            style.fg(Color::White)
        }
    } else if state.focused {
        style.bg(Color::DarkGray)
    } else {
        style
    }
}
