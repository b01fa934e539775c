//! The node tree: one interactive node per message.
//!
//! Nodes live in an index-addressed arena (`Vec<Node>`) with an
//! ID-to-position map kept in step with it. The tree mirrors per-node
//! selection flags in its own selected set and tracks at most one focused
//! node.

use super::factory::NodeFactory;
use super::hit_test::{hit_test, HitTestResult};
use super::node::{Node, ToolStatus};
use super::types::{NodeBounds, NodeState};
use crate::model::{Message, NodeError, NodeId};
use crossterm::event::KeyEvent;
use ratatui::layout::Rect;
use ratatui::text::Line;
use std::collections::{BTreeSet, HashMap};
use tracing::debug;

/// Ordered collection of message nodes with focus and selection.
#[derive(Debug, Clone)]
pub struct NodeTree {
    nodes: Vec<Node>,
    index: HashMap<NodeId, usize>,
    selected: BTreeSet<NodeId>,
    focused: Option<NodeId>,
    next_sequence: u64,
}

impl Default for NodeTree {
    fn default() -> Self {
        Self::new()
    }
}

impl NodeTree {
    /// Create an empty tree.
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            index: HashMap::new(),
            selected: BTreeSet::new(),
            focused: None,
            next_sequence: 1,
        }
    }

    // ===== Building =====

    /// Replace every node with fresh nodes built from `messages`.
    ///
    /// Focus and selection are cleared. IDs are never reused.
    pub fn set_messages(&mut self, messages: Vec<Message>) {
        self.clear();
        self.nodes.reserve(messages.len());
        for message in messages {
            self.add_message(message);
        }
        debug!(nodes = self.nodes.len(), "Rebuilt node tree");
    }

    /// Append a node for `message`.
    pub fn add_message(&mut self, message: Message) -> NodeId {
        let id = NodeId::Regular(self.next_id());
        self.push(NodeFactory::create_node(message, id));
        id
    }

    /// Rebuild the node `id` from `message`, keeping its state and bounds.
    ///
    /// The variant is chosen afresh, so the node may change kind.
    pub fn update_message(&mut self, id: NodeId, message: Message) -> Result<(), NodeError> {
        let pos = self.position(id)?;
        let old = &self.nodes[pos];
        let node = NodeFactory::create_node(message, id)
            .with_state(old.state())
            .with_bounds(old.bounds());
        self.nodes[pos] = node;
        Ok(())
    }

    /// Remove every node and reset focus and selection.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.index.clear();
        self.selected.clear();
        self.focused = None;
    }

    // ===== Lookup =====

    /// All nodes in display order.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Node by ID.
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.index.get(&id).map(|&pos| &self.nodes[pos])
    }

    /// Number of nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    // ===== Selection =====

    /// Toggle selection of `id`. Returns the new selected flag.
    pub fn select_node(&mut self, id: NodeId) -> Result<bool, NodeError> {
        let pos = self.position(id)?;
        let state = self.nodes[pos].state().toggle_selected();
        self.apply_state(pos, state);
        Ok(state.selected)
    }

    /// Set selection of `id` explicitly.
    pub fn set_node_selected(&mut self, id: NodeId, selected: bool) -> Result<(), NodeError> {
        let pos = self.position(id)?;
        let state = self.nodes[pos].state().with_selected(selected);
        self.apply_state(pos, state);
        Ok(())
    }

    /// Deselect every node.
    pub fn clear_selection(&mut self) {
        let ids: Vec<NodeId> = self.selected.iter().copied().collect();
        for id in ids {
            if let Some(&pos) = self.index.get(&id) {
                let state = self.nodes[pos].state().with_selected(false);
                self.apply_state(pos, state);
            }
        }
        self.selected.clear();
    }

    /// Selected node IDs in sorted order.
    pub fn selected_nodes(&self) -> Vec<NodeId> {
        self.selected.iter().copied().collect()
    }

    /// Whether `id` is selected.
    pub fn is_node_selected(&self, id: NodeId) -> bool {
        self.selected.contains(&id)
    }

    /// Number of selected nodes.
    pub fn selection_count(&self) -> usize {
        self.selected.len()
    }

    // ===== Focus =====

    /// Move keyboard focus to `id`, or clear it with `None`.
    ///
    /// An unknown ID is rejected before anything changes.
    pub fn set_focused_node(&mut self, id: Option<NodeId>) -> Result<(), NodeError> {
        let target = id.map(|id| self.position(id)).transpose()?;

        if let Some(pos) = self.focused.and_then(|prev| self.index.get(&prev).copied()) {
            let state = self.nodes[pos].state().with_focused(false);
            self.apply_state(pos, state);
        }
        if let Some(pos) = target {
            let state = self.nodes[pos].state().with_focused(true);
            self.apply_state(pos, state);
        }
        self.focused = id;
        Ok(())
    }

    /// Currently focused node.
    pub fn focused_node(&self) -> Option<NodeId> {
        self.focused
    }

    /// Focus the previous node, wrapping to the last. With no focus, the last
    /// node is focused.
    pub fn move_focus_up(&mut self) -> Option<NodeId> {
        let len = self.nodes.len();
        if len == 0 {
            return None;
        }
        let next = match self.focused_position() {
            Some(0) | None => len - 1,
            Some(pos) => pos - 1,
        };
        self.focus_position(next)
    }

    /// Focus the next node, wrapping to the first. With no focus, the first
    /// node is focused.
    pub fn move_focus_down(&mut self) -> Option<NodeId> {
        let len = self.nodes.len();
        if len == 0 {
            return None;
        }
        let next = match self.focused_position() {
            Some(pos) if pos + 1 < len => pos + 1,
            _ => 0,
        };
        self.focus_position(next)
    }

    // ===== Interaction =====

    /// Toggle expansion of a collapsible node. Returns the new expanded flag.
    pub fn toggle_node_expansion(&mut self, id: NodeId) -> Result<bool, NodeError> {
        let pos = self.position(id)?;
        if !self.nodes[pos].is_collapsible() {
            return Err(NodeError::NotCollapsible(id));
        }
        let state = self.nodes[pos].state().toggle_expanded();
        self.apply_state(pos, state);
        Ok(state.expanded)
    }

    /// Route a click at screen coordinates to the node under it.
    ///
    /// Returns the ID of the node that handled the click.
    pub fn handle_click(&mut self, x: u16, y: u16) -> Option<NodeId> {
        let HitTestResult::Hit {
            node_id,
            line_in_node,
            column,
        } = hit_test(&self.nodes, x, y)
        else {
            return None;
        };
        let pos = self.index.get(&node_id).copied()?;
        let (handled, state) = self.nodes[pos].handle_click(column, line_in_node);
        if !handled {
            return None;
        }
        self.apply_state(pos, state);
        Some(node_id)
    }

    /// Route a key to the focused node. Returns whether it was handled.
    pub fn handle_key_event(&mut self, key: KeyEvent) -> bool {
        let Some(pos) = self.focused_position() else {
            return false;
        };
        let (handled, state) = self.nodes[pos].handle_key_event(key);
        if handled {
            self.apply_state(pos, state);
        }
        handled
    }

    // ===== Geometry =====

    /// Record where `id` was last drawn.
    pub fn update_node_bounds(&mut self, id: NodeId, bounds: NodeBounds) -> Result<(), NodeError> {
        let pos = self.position(id)?;
        self.nodes[pos].set_bounds(bounds);
        Ok(())
    }

    /// Set the hover flag of `id`.
    pub fn set_node_hovered(&mut self, id: NodeId, hovered: bool) -> Result<(), NodeError> {
        let pos = self.position(id)?;
        let state = self.nodes[pos].state();
        if state.hovered != hovered {
            self.apply_state(pos, state.with_hovered(hovered));
        }
        Ok(())
    }

    /// Lines of every node plus one blank separator between neighbours.
    pub fn calculate_total_height(&mut self, width: u16) -> usize {
        let separators = self.nodes.len().saturating_sub(1);
        self.nodes
            .iter_mut()
            .map(|node| node.calculate_height(width))
            .sum::<usize>()
            + separators
    }

    /// Rendered lines of `id` at `width` in its current state.
    pub fn render_node(&mut self, id: NodeId, width: u16) -> Option<&[Line<'static>]> {
        let pos = self.index.get(&id).copied()?;
        let node = &mut self.nodes[pos];
        let state = node.state();
        let area = Rect {
            width,
            ..Rect::default()
        };
        Some(node.render(area, state))
    }

    // ===== Streaming =====

    /// Replace every node, then append a streaming node for non-empty
    /// `streaming`.
    pub fn set_messages_with_streaming(
        &mut self,
        messages: Vec<Message>,
        streaming: Option<Message>,
    ) -> Option<NodeId> {
        self.set_messages(messages);
        streaming
            .filter(|m| !m.content.is_empty())
            .map(|m| self.add_streaming_message(m))
    }

    /// Append a transient streaming node.
    pub fn add_streaming_message(&mut self, message: Message) -> NodeId {
        let id = NodeId::Streaming(self.next_id());
        self.push(NodeFactory::create_node(message, id));
        id
    }

    /// Replace the content of node `id`, keeping its state and bounds.
    pub fn update_streaming_message(
        &mut self,
        id: NodeId,
        content: impl Into<String>,
    ) -> Result<(), NodeError> {
        let pos = self.position(id)?;
        let mut message = self.nodes[pos].message().clone();
        message.content = content.into();
        self.update_message(id, message)
    }

    /// Delete the streaming node `id`, dropping its focus and selection.
    ///
    /// Regular nodes are never removed this way.
    pub fn remove_streaming_message(&mut self, id: NodeId) -> Result<(), NodeError> {
        if !id.is_streaming() {
            return Err(NodeError::NotFound(id));
        }
        let pos = self.position(id)?;
        self.nodes.remove(pos);
        self.selected.remove(&id);
        if self.focused == Some(id) {
            self.focused = None;
        }
        self.rebuild_index();
        Ok(())
    }

    /// The streaming node, if the last node is one.
    pub fn streaming_node_id(&self) -> Option<NodeId> {
        self.nodes
            .last()
            .map(Node::id)
            .filter(NodeId::is_streaming)
    }

    /// Whether a streaming node is present at the end.
    pub fn has_streaming_message(&self) -> bool {
        self.streaming_node_id().is_some()
    }

    // ===== Tool executions =====

    /// Append a live tool execution node in the `Started` status.
    pub fn add_tool_execution(
        &mut self,
        tool_name: impl Into<String>,
        display_name: impl Into<String>,
    ) -> NodeId {
        let id = NodeId::Regular(self.next_id());
        self.push(Node::tool_execution(id, tool_name, display_name));
        id
    }

    /// Update the status of a tool execution node.
    pub fn update_tool_execution(
        &mut self,
        id: NodeId,
        status: ToolStatus,
        progress: impl Into<String>,
        result: impl Into<String>,
    ) -> Result<(), NodeError> {
        let pos = self.position(id)?;
        if self.nodes[pos].set_execution_status(status, progress, result) {
            Ok(())
        } else {
            Err(NodeError::NotToolExecution(id))
        }
    }

    // ===== Internals =====

    fn next_id(&mut self) -> u64 {
        let seq = self.next_sequence;
        self.next_sequence += 1;
        seq
    }

    fn push(&mut self, node: Node) {
        self.index.insert(node.id(), self.nodes.len());
        self.nodes.push(node);
    }

    fn position(&self, id: NodeId) -> Result<usize, NodeError> {
        self.index.get(&id).copied().ok_or(NodeError::NotFound(id))
    }

    fn focused_position(&self) -> Option<usize> {
        self.focused.and_then(|id| self.index.get(&id).copied())
    }

    fn focus_position(&mut self, pos: usize) -> Option<NodeId> {
        let id = self.nodes[pos].id();
        self.set_focused_node(Some(id)).ok()?;
        Some(id)
    }

    /// Swap in a new state and keep the selected set in step.
    fn apply_state(&mut self, pos: usize, state: NodeState) {
        let node = &mut self.nodes[pos];
        if state.selected {
            self.selected.insert(node.id());
        } else {
            self.selected.remove(&node.id());
        }
        node.set_state(state);
    }

    fn rebuild_index(&mut self) {
        self.index = self
            .nodes
            .iter()
            .enumerate()
            .map(|(pos, node)| (node.id(), pos))
            .collect();
    }
}

#[cfg(test)]
#[path = "tree_tests.rs"]
mod tests;
