//! Interactive message nodes.
//!
//! A [`Node`] wraps one [`Message`] with its interactive state, its last
//! known screen bounds and a render cache. Node behavior is selected by the
//! closed [`NodeKind`] union; every operation is a single exhaustive match,
//! so adding a kind is a compile error until each operation handles it.

use super::cache::{RenderCache, RenderCacheKey};
use super::styles::{highlight, role_style, thinking_style, tool_header_style};
use super::types::{NodeBounds, NodeState};
use super::wrap::wrap_text;
use crate::model::{Message, NodeId, Role, ToolCall};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::Line;

/// Lines shown for a collapsed text node.
pub const COLLAPSED_TEXT_LINES: usize = 5;
/// Width used to decide whether a text node is long enough to collapse.
const COLLAPSE_PROBE_WIDTH: usize = 80;
const THINKING_PREFIX: &str = "Thinking: ";
/// Reasoning is cut to this many lines when an answer follows it.
const THINKING_PREVIEW_LINES: usize = 3;
/// Tool output beyond this many characters is hidden while collapsed.
pub const TOOL_PREVIEW_CHARS: usize = 300;
const TEXT_PREVIEW_CHARS: usize = 100;
const OUTPUT_INDENT: &str = "  ";
const EXPANDED_COMMAND_CHARS: usize = 50;
const COLLAPSED_COMMAND_CHARS: usize = 30;

/// Lifecycle of a running tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolStatus {
    /// Launched, no output yet.
    Started,
    /// Reported intermediate progress.
    Progress,
    /// Finished successfully.
    Completed,
    /// Failed.
    Error,
}

/// Reasoning and answer of an assistant message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThinkingParts {
    /// Reasoning with tags removed.
    pub thinking: String,
    /// Answer text.
    pub response: String,
    /// Whether reasoning is shown at all.
    pub show_thinking: bool,
}

/// Live state of a tool run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolExecution {
    /// Human-readable tool name.
    pub display_name: String,
    /// Current status.
    pub status: ToolStatus,
    /// Latest progress note.
    pub progress: String,
    /// Output once completed.
    pub result: String,
}

/// Closed set of node variants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// User, assistant, system or error text.
    Text,
    /// Assistant reply with separated reasoning.
    Thinking(ThinkingParts),
    /// Assistant message requesting tool calls.
    ToolCall,
    /// Output of a tool.
    ToolResult {
        /// Shortened output shown while collapsed.
        preview: String,
        /// Whether `preview` is shorter than the full output.
        truncated: bool,
    },
    /// One-line notice that a tool is running.
    ToolProgress,
    /// Tool run with live status.
    ToolExecution(ToolExecution),
}

/// Interactive wrapper over one message.
#[derive(Debug, Clone)]
pub struct Node {
    id: NodeId,
    message: Message,
    kind: NodeKind,
    state: NodeState,
    bounds: NodeBounds,
    cache: RenderCache,
}

impl Node {
    /// Create a node in the default state with empty bounds.
    pub fn new(id: NodeId, message: Message, kind: NodeKind) -> Self {
        Self {
            id,
            message,
            kind,
            state: NodeState::new(),
            bounds: NodeBounds::default(),
            cache: RenderCache::new(),
        }
    }

    /// Create a live tool execution node in the `Started` status.
    pub fn tool_execution(
        id: NodeId,
        tool_name: impl Into<String>,
        display_name: impl Into<String>,
    ) -> Self {
        let display_name = display_name.into();
        let mut message = Message::new(Role::ToolProgress, format!("Executing {display_name}..."));
        message.tool_name = Some(tool_name.into());
        Self::new(
            id,
            message,
            NodeKind::ToolExecution(ToolExecution {
                display_name,
                status: ToolStatus::Started,
                progress: String::new(),
                result: String::new(),
            }),
        )
    }

    /// Node identifier.
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Underlying message.
    pub fn message(&self) -> &Message {
        &self.message
    }

    /// Variant data.
    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    /// Current interactive state.
    pub fn state(&self) -> NodeState {
        self.state
    }

    /// Last known screen bounds.
    pub fn bounds(&self) -> NodeBounds {
        self.bounds
    }

    /// Whether the render cache currently holds usable lines.
    pub fn is_cache_valid(&self) -> bool {
        self.cache.is_valid()
    }

    /// This node under a new state. The render cache is invalidated.
    pub fn with_state(mut self, state: NodeState) -> Self {
        self.set_state(state);
        self
    }

    /// This node with new bounds. Bounds do not affect rendering.
    pub fn with_bounds(mut self, bounds: NodeBounds) -> Self {
        self.bounds = bounds;
        self
    }

    pub(crate) fn set_state(&mut self, state: NodeState) {
        self.state = state;
        self.cache.invalidate();
    }

    pub(crate) fn set_bounds(&mut self, bounds: NodeBounds) {
        self.bounds = bounds;
    }

    /// Update a tool execution's status. Returns `false` for other kinds.
    pub(crate) fn set_execution_status(
        &mut self,
        status: ToolStatus,
        progress: impl Into<String>,
        result: impl Into<String>,
    ) -> bool {
        let NodeKind::ToolExecution(exec) = &mut self.kind else {
            return false;
        };
        exec.status = status;
        exec.progress = progress.into();
        exec.result = result.into();
        self.message.content = match status {
            ToolStatus::Started => format!("Executing {}...", exec.display_name),
            ToolStatus::Progress => format!("Executing {}... {}", exec.display_name, exec.progress),
            ToolStatus::Completed => format!("✓ {}", exec.display_name),
            ToolStatus::Error => format!("✗ {} (failed)", exec.display_name),
        };
        self.cache.invalidate();
        true
    }

    /// Rendered lines for `area.width` under `state`.
    ///
    /// Served from the cache when neither the width nor the state changed
    /// since the last call.
    pub fn render(&mut self, area: Rect, state: NodeState) -> &[Line<'static>] {
        let key = RenderCacheKey::new(area.width, state);
        if self.cache.get(&key).is_none() {
            let lines = self.compute_lines(usize::from(area.width), state);
            return self.cache.put(key, lines);
        }
        self.cache.get(&key).unwrap_or_default()
    }

    /// Number of lines [`render`](Self::render) yields at `width` in the
    /// node's own state.
    pub fn calculate_height(&mut self, width: u16) -> usize {
        let area = Rect {
            width,
            ..Rect::default()
        };
        let state = self.state;
        self.render(area, state).len()
    }

    /// React to a click at node-relative coordinates.
    pub fn handle_click(&self, _x: u16, _y: u16) -> (bool, NodeState) {
        let state = self.state;
        match &self.kind {
            NodeKind::Text | NodeKind::Thinking(_) | NodeKind::ToolCall | NodeKind::ToolProgress => {
                (true, state.toggle_selected())
            }
            NodeKind::ToolResult { .. } | NodeKind::ToolExecution(_) => {
                if self.is_collapsible() {
                    (true, state.toggle_expanded())
                } else {
                    (true, state.toggle_selected())
                }
            }
        }
    }

    /// React to a key press while focused.
    ///
    /// Enter toggles selection; Tab toggles expansion of collapsible nodes.
    pub fn handle_key_event(&self, key: KeyEvent) -> (bool, NodeState) {
        let state = self.state;
        match key.code {
            KeyCode::Enter => (true, state.toggle_selected()),
            KeyCode::Tab => match &self.kind {
                NodeKind::ToolCall => (true, state.toggle_expanded()),
                NodeKind::Text
                | NodeKind::Thinking(_)
                | NodeKind::ToolResult { .. }
                | NodeKind::ToolExecution(_) => {
                    if self.is_collapsible() {
                        (true, state.toggle_expanded())
                    } else {
                        (false, state)
                    }
                }
                NodeKind::ToolProgress => (false, state),
            },
            _ => (false, state),
        }
    }

    /// Whether the node has a collapsed form.
    pub fn is_collapsible(&self) -> bool {
        match &self.kind {
            NodeKind::Text => {
                wrap_text(&self.message.content, COLLAPSE_PROBE_WIDTH).len() > COLLAPSED_TEXT_LINES
            }
            NodeKind::Thinking(parts) => !parts.thinking.is_empty(),
            NodeKind::ToolCall => true,
            NodeKind::ToolResult { truncated, .. } => *truncated,
            NodeKind::ToolProgress => false,
            NodeKind::ToolExecution(exec) => {
                exec.status == ToolStatus::Completed && !exec.result.is_empty()
            }
        }
    }

    /// Whether expanding reveals additional detail.
    pub fn has_detail_view(&self) -> bool {
        match &self.kind {
            NodeKind::ToolCall => true,
            NodeKind::ToolProgress => false,
            NodeKind::Text
            | NodeKind::Thinking(_)
            | NodeKind::ToolResult { .. }
            | NodeKind::ToolExecution(_) => self.is_collapsible(),
        }
    }

    /// Short one-line summary.
    pub fn preview_text(&self) -> String {
        match &self.kind {
            NodeKind::Text => truncate_chars(&self.message.content, TEXT_PREVIEW_CHARS).0,
            NodeKind::Thinking(parts) => {
                if parts.response.is_empty() {
                    self.message.content.clone()
                } else {
                    parts.response.clone()
                }
            }
            NodeKind::ToolCall => match self.message.tool_calls.first() {
                Some(call) => format!("Tool: {}", call.function.name),
                None => "Tool call".to_string(),
            },
            NodeKind::ToolResult { preview, .. } => format!("{}: {}", self.tool_name(), preview),
            NodeKind::ToolProgress => self.message.content.clone(),
            NodeKind::ToolExecution(exec) => exec.display_name.clone(),
        }
    }

    fn tool_name(&self) -> &str {
        self.message.tool_name.as_deref().unwrap_or("Tool")
    }

    /// Reasoning section of a thinking node at `width`, including the blank
    /// line before the answer. Empty for other kinds and hidden reasoning.
    pub fn thinking_lines(&self, width: usize, state: NodeState) -> Vec<Line<'static>> {
        let mut lines = Vec::new();
        if let NodeKind::Thinking(parts) = &self.kind {
            push_thinking(&mut lines, parts, width, state);
        }
        lines
    }

    fn compute_lines(&self, width: usize, state: NodeState) -> Vec<Line<'static>> {
        let mut lines = Vec::new();
        match &self.kind {
            NodeKind::Text => {
                let style = highlight(role_style(self.message.role), state, false);
                let wrapped = wrap_text(&self.message.content, width);
                let hidden = wrapped.len().saturating_sub(COLLAPSED_TEXT_LINES);
                if hidden > 0 && !state.expanded {
                    push_styled(&mut lines, wrapped.into_iter().take(COLLAPSED_TEXT_LINES), style);
                    lines.push(Line::styled(
                        format!("... (Tab to expand, {hidden} more lines)"),
                        style.add_modifier(Modifier::DIM),
                    ));
                } else {
                    push_styled(&mut lines, wrapped, style);
                }
            }
            NodeKind::Thinking(parts) => {
                push_thinking(&mut lines, parts, width, state);
                let style = highlight(role_style(Role::Assistant), state, false);
                push_styled(&mut lines, wrap_text(&parts.response, width), style);
            }
            NodeKind::ToolCall => {
                let style = highlight(tool_header_style(), state, false);
                for (i, call) in self.message.tool_calls.iter().enumerate() {
                    if i > 0 {
                        lines.push(Line::default());
                    }
                    push_styled(
                        &mut lines,
                        wrap_text(&format_tool_call(call, state.expanded), width),
                        style,
                    );
                }
            }
            NodeKind::ToolResult { preview, truncated } => {
                let name = self.tool_name();
                let header = match (*truncated, state.expanded) {
                    (true, true) => format!("▼ {name}"),
                    (true, false) => format!("▶ {name} (click to expand)"),
                    (false, _) => format!("▶ {name}"),
                };
                let header_style = highlight(tool_header_style(), state, false);
                push_styled(&mut lines, wrap_text(&header, width), header_style);

                let output = if state.expanded || !truncated {
                    self.message.content.as_str()
                } else {
                    preview.as_str()
                };
                let style = highlight(role_style(Role::Tool), state, false);
                push_indented(&mut lines, output, width, style);
            }
            NodeKind::ToolProgress => {
                let style = highlight(
                    role_style(Role::ToolProgress).add_modifier(Modifier::DIM),
                    state,
                    false,
                );
                push_styled(
                    &mut lines,
                    wrap_text(&format!("⏳ {}", self.message.content), width),
                    style,
                );
            }
            NodeKind::ToolExecution(exec) => {
                let (text, color) = match exec.status {
                    ToolStatus::Started => (format!("⏳ {}", exec.display_name), Color::Yellow),
                    ToolStatus::Progress if exec.progress.is_empty() => {
                        (format!("⏳ {}", exec.display_name), Color::Yellow)
                    }
                    ToolStatus::Progress => (
                        format!("⏳ {} ({})", exec.display_name, exec.progress),
                        Color::Yellow,
                    ),
                    ToolStatus::Completed => (format!("✓ {}", exec.display_name), Color::Green),
                    ToolStatus::Error => (format!("✗ {}", exec.display_name), Color::Red),
                };
                let style = highlight(Style::default().fg(color), state, false);
                push_styled(&mut lines, wrap_text(&text, width), style);

                if exec.status == ToolStatus::Completed
                    && !exec.result.is_empty()
                    && state.expanded
                {
                    lines.push(Line::default());
                    let style = highlight(role_style(Role::Tool), state, false);
                    push_indented(&mut lines, &exec.result, width, style);
                }
            }
        }
        lines
    }
}

fn push_styled(
    lines: &mut Vec<Line<'static>>,
    wrapped: impl IntoIterator<Item = String>,
    style: Style,
) {
    lines.extend(wrapped.into_iter().map(|l| Line::styled(l, style)));
}

fn push_thinking(
    lines: &mut Vec<Line<'static>>,
    parts: &ThinkingParts,
    width: usize,
    state: NodeState,
) {
    if parts.thinking.is_empty() || !parts.show_thinking || !state.expanded {
        return;
    }
    let body = if parts.response.is_empty() {
        parts.thinking.clone()
    } else {
        truncate_thinking(&parts.thinking, width.saturating_sub(THINKING_PREFIX.len()))
    };
    let style = highlight(thinking_style(), state, true);
    push_styled(lines, wrap_text(&format!("{THINKING_PREFIX}{body}"), width), style);
    if !parts.response.is_empty() {
        lines.push(Line::default());
    }
}

fn push_indented(lines: &mut Vec<Line<'static>>, text: &str, width: usize, style: Style) {
    let inner = width.saturating_sub(OUTPUT_INDENT.len());
    lines.extend(
        wrap_text(text, inner)
            .into_iter()
            .map(|l| Line::styled(format!("{OUTPUT_INDENT}{l}"), style)),
    );
}

/// Keep at most `max` characters, appending `...` when shortened.
///
/// Returns the result and whether anything was cut.
pub(crate) fn truncate_chars(text: &str, max: usize) -> (String, bool) {
    match text.char_indices().nth(max) {
        Some((cut, _)) => (format!("{}...", &text[..cut]), true),
        None => (text.to_string(), false),
    }
}

fn truncate_thinking(thinking: &str, width: usize) -> String {
    let wrapped = wrap_text(thinking, width);
    if wrapped.len() <= THINKING_PREVIEW_LINES {
        return thinking.to_string();
    }
    format!("{}...", wrapped[..THINKING_PREVIEW_LINES].join("\n"))
}

fn truncate_command(command: &str, max: usize) -> String {
    if command.chars().count() <= max {
        return command.to_string();
    }
    let head: String = command.chars().take(max.saturating_sub(3)).collect();
    format!("{head}...")
}

/// User-facing name for a backend tool.
pub fn display_tool_name(name: &str) -> String {
    match name {
        "execute_bash" => "Shell".to_string(),
        "read_file" => "ReadFile".to_string(),
        "write_file" => "WriteFile".to_string(),
        "search_web" => "Search".to_string(),
        other => {
            let mut chars = other.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        }
    }
}

fn format_tool_call(call: &ToolCall, expanded: bool) -> String {
    let name = display_tool_name(&call.function.name);
    let args = &call.function.arguments;
    let shown = match (call.command(), expanded) {
        (Some(cmd), true) => truncate_command(cmd, EXPANDED_COMMAND_CHARS),
        (Some(cmd), false) => truncate_command(cmd, COLLAPSED_COMMAND_CHARS),
        (None, _) if args.is_empty() => String::new(),
        (None, true) => serde_json::Value::Object(args.clone()).to_string(),
        (None, false) => "...".to_string(),
    };
    format!("{name}({shown})")
}

#[cfg(test)]
#[path = "node_tests.rs"]
mod tests;
