//! Core view-state value types

use ratatui::layout::Rect;

/// Last known screen rectangle of a node.
///
/// A geometry cache written by the layout pass; it is stale until the next
/// layout refreshes it.
pub type NodeBounds = Rect;

/// Interactive flags of a node.
///
/// The flags are orthogonal. Every transition returns a new value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeState {
    /// Part of the current multi-selection.
    pub selected: bool,
    /// Holds keyboard focus. At most one node in a tree is focused.
    pub focused: bool,
    /// Showing full detail rather than the collapsed form.
    pub expanded: bool,
    /// Under the mouse pointer.
    pub hovered: bool,
}

impl Default for NodeState {
    fn default() -> Self {
        Self::new()
    }
}

impl NodeState {
    /// Fresh state: expanded, nothing else set.
    pub const fn new() -> Self {
        Self {
            selected: false,
            focused: false,
            expanded: true,
            hovered: false,
        }
    }

    /// Flip `selected`.
    pub const fn toggle_selected(self) -> Self {
        Self {
            selected: !self.selected,
            ..self
        }
    }

    /// Flip `expanded`.
    pub const fn toggle_expanded(self) -> Self {
        Self {
            expanded: !self.expanded,
            ..self
        }
    }

    /// Set `selected`.
    pub const fn with_selected(self, selected: bool) -> Self {
        Self { selected, ..self }
    }

    /// Set `focused`.
    pub const fn with_focused(self, focused: bool) -> Self {
        Self { focused, ..self }
    }

    /// Set `expanded`.
    pub const fn with_expanded(self, expanded: bool) -> Self {
        Self { expanded, ..self }
    }

    /// Set `hovered`.
    pub const fn with_hovered(self, hovered: bool) -> Self {
        Self { hovered, ..self }
    }
}
