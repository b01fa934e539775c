//! Conversation pane: node layout, scrolling, and bounds bookkeeping.
//!
//! Each frame lays every node out at the pane width, separated by one
//! blank line, picks the rows inside the scroll window, and writes each
//! node's on-screen rectangle back to the tree so mouse events can be
//! hit-tested against the frame the user actually sees.

use crate::model::NodeId;
use crate::state::ChatState;
use crate::view_state::Node;
use ratatui::{layout::Rect, text::Line, widgets::Paragraph, Frame};
use tracing::debug;

/// Vertical scroll position of the conversation pane.
///
/// While following, the view sticks to the newest content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChatScroll {
    offset: usize,
    follow: bool,
    reveal: Option<NodeId>,
}

impl Default for ChatScroll {
    fn default() -> Self {
        Self {
            offset: 0,
            follow: true,
            reveal: None,
        }
    }
}

impl ChatScroll {
    /// First content row shown at the top of the pane.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Whether the view sticks to the bottom.
    pub fn is_following(&self) -> bool {
        self.follow
    }

    /// Scroll towards older content. Stops following.
    pub fn scroll_up(&mut self, lines: usize) {
        self.follow = false;
        self.offset = self.offset.saturating_sub(lines);
    }

    /// Scroll towards newer content. Reaching the bottom resumes following.
    pub fn scroll_down(&mut self, lines: usize) {
        self.offset = self.offset.saturating_add(lines);
    }

    /// Jump to the newest content and follow it.
    pub fn scroll_to_bottom(&mut self) {
        self.follow = true;
    }

    /// Bring `id` into view on the next layout.
    pub fn reveal(&mut self, id: NodeId) {
        self.reveal = Some(id);
    }

    /// Clamp the offset against the laid-out content.
    ///
    /// `reveal` is the row span of a node that must end up visible.
    fn settle(&mut self, total: usize, viewport: usize, reveal: Option<(usize, usize)>) {
        let max = total.saturating_sub(viewport);
        if let Some((start, end)) = reveal {
            if start < self.offset {
                self.offset = start;
            } else if end > self.offset + viewport {
                self.offset = end.saturating_sub(viewport).min(start);
            }
            self.follow = false;
        }
        if self.follow {
            self.offset = max;
        } else {
            self.offset = self.offset.min(max);
            self.follow = self.offset == max;
        }
    }
}

/// Row span of one node in content coordinates.
#[derive(Debug, Clone, Copy)]
struct Placement {
    id: NodeId,
    start: usize,
    height: usize,
}

/// Lay out the conversation into `area` and return the visible lines.
///
/// Updates every node's bounds: nodes outside the window get an empty
/// rectangle so they never match a hit test.
pub fn layout_conversation(
    chat: &mut ChatState,
    scroll: &mut ChatScroll,
    area: Rect,
) -> Vec<Line<'static>> {
    let width = area.width;
    let viewport = usize::from(area.height);
    if width == 0 || viewport == 0 {
        return Vec::new();
    }

    let streaming = chat
        .render_streaming(width)
        .map(|(id, lines, _)| (id, lines.to_vec()));
    let ids: Vec<NodeId> = chat.tree().nodes().iter().map(Node::id).collect();

    let mut placements = Vec::with_capacity(ids.len());
    let mut row = 0;
    for (i, &id) in ids.iter().enumerate() {
        if i > 0 {
            row += 1;
        }
        let height = match &streaming {
            Some((streaming_id, lines)) if *streaming_id == id => lines.len(),
            _ => chat.tree_mut().render_node(id, width).map_or(0, <[_]>::len),
        };
        placements.push(Placement {
            id,
            start: row,
            height,
        });
        row += height;
    }

    let reveal = scroll.reveal.take().and_then(|id| {
        placements
            .iter()
            .find(|p| p.id == id)
            .map(|p| (p.start, p.start + p.height))
    });
    scroll.settle(row, viewport, reveal);

    let top = scroll.offset;
    let bottom = top + viewport;
    let mut visible = Vec::with_capacity(viewport);

    for (i, placement) in placements.iter().enumerate() {
        let Placement { id, start, height } = *placement;
        let end = start + height;

        if i > 0 && (top..bottom).contains(&(start - 1)) {
            visible.push(Line::default());
        }

        let first = start.max(top);
        let last = end.min(bottom);
        let bounds = if first < last {
            Rect::new(
                area.x,
                area.y + (first - top) as u16,
                width,
                (last - first) as u16,
            )
        } else {
            Rect::default()
        };
        if let Err(err) = chat.tree_mut().update_node_bounds(id, bounds) {
            debug!(error = %err, "Skipping bounds update");
        }
        if first >= last {
            continue;
        }

        let (from, to) = (first - start, last - start);
        match &streaming {
            Some((streaming_id, lines)) if *streaming_id == id => {
                visible.extend_from_slice(&lines[from..to]);
            }
            _ => {
                if let Some(lines) = chat.tree_mut().render_node(id, width) {
                    visible.extend_from_slice(&lines[from..to.min(lines.len())]);
                }
            }
        }
    }

    visible
}

/// Render the conversation pane.
pub fn render_conversation(
    frame: &mut Frame,
    area: Rect,
    chat: &mut ChatState,
    scroll: &mut ChatScroll,
) {
    let lines = layout_conversation(chat, scroll, area);
    frame.render_widget(Paragraph::new(lines), area);
}
