//! Conversation state owned by the UI loop.
//!
//! [`ChatState`] applies [`StreamEvent`]s: fragments go through a per-stream
//! [`ChunkParser`] into the accumulator, the stream's placeholder node shows
//! the reasoning and answer received so far as separate parts, and a
//! finished stream is swapped for a settled message node.

use crate::accumulator::MessageAccumulator;
use crate::model::{Message, MessageChunk, NodeId, StreamId};
use crate::parser::{apply_thinking, ChunkParser, Segment, SegmentFormat};
use crate::state::StreamEvent;
use crate::view_state::styles::{highlight, role_style};
use crate::view_state::{
    display_tool_name, IncrementalRenderer, NodeKind, NodeTree, RenderDelta, ToolStatus,
};
use ratatui::text::Line;
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// Display side of one open stream.
#[derive(Debug)]
struct OpenStream {
    parser: ChunkParser,
    thinking: String,
    response: String,
    in_block: bool,
    node: NodeId,
}

impl OpenStream {
    /// Sort one parsed segment into reasoning or answer. Tags are dropped;
    /// a new block after earlier reasoning starts a new paragraph.
    fn push_segment(&mut self, segment: Segment) {
        if segment.is_tag() {
            let opens = !segment.content.starts_with("</");
            if opens && !self.in_block && !self.thinking.is_empty() {
                self.thinking.truncate(self.thinking.trim_end().len());
                self.thinking.push_str("\n\n");
            }
            self.in_block = opens;
            return;
        }
        match segment.format {
            SegmentFormat::Thinking => self.thinking.push_str(&segment.content),
            SegmentFormat::Plain => self.response.push_str(&segment.content),
        }
    }

    /// Placeholder message for the stream's node.
    fn placeholder(&self, stream_id: &StreamId, show_thinking: bool) -> Message {
        let message = Message::streaming(stream_id.clone(), self.response.clone());
        if self.thinking.is_empty() {
            message
        } else {
            message.with_thinking(self.thinking.clone(), show_thinking)
        }
    }
}

/// Conversation state: node tree, open streams, and tool runs.
#[derive(Debug)]
pub struct ChatState {
    tree: NodeTree,
    accumulator: MessageAccumulator,
    streams: HashMap<StreamId, OpenStream>,
    renderer: IncrementalRenderer,
    /// Reasoning lines above the incrementally rendered answer.
    streaming_prefix: Vec<Line<'static>>,
    /// Prefix plus answer lines of the last streaming render.
    streaming_lines: Vec<Line<'static>>,
    tools: HashMap<String, NodeId>,
    show_thinking: bool,
}

impl ChatState {
    /// Create an empty conversation.
    pub fn new(show_thinking: bool) -> Self {
        Self {
            tree: NodeTree::new(),
            accumulator: MessageAccumulator::new(),
            streams: HashMap::new(),
            renderer: IncrementalRenderer::new(),
            streaming_prefix: Vec::new(),
            streaming_lines: Vec::new(),
            tools: HashMap::new(),
            show_thinking,
        }
    }

    /// The node tree.
    pub fn tree(&self) -> &NodeTree {
        &self.tree
    }

    /// The node tree, for focus and click routing.
    pub fn tree_mut(&mut self) -> &mut NodeTree {
        &mut self.tree
    }

    /// The stream accumulator.
    pub fn accumulator(&self) -> &MessageAccumulator {
        &self.accumulator
    }

    /// Whether reasoning is shown.
    pub fn show_thinking(&self) -> bool {
        self.show_thinking
    }

    /// Number of streams still open.
    pub fn open_stream_count(&self) -> usize {
        self.streams.len()
    }

    /// Apply one event.
    pub fn handle_event(&mut self, event: StreamEvent) {
        match event {
            StreamEvent::History(messages) => self.replace_history(messages),
            StreamEvent::UserInput(content) => {
                self.tree.add_message(Message::user(content));
            }
            StreamEvent::Chunk(chunk) => self.on_chunk(chunk),
            StreamEvent::StreamFailed { stream_id, error } => {
                self.fail_stream(&stream_id, &error);
            }
            StreamEvent::StreamCancelled(stream_id) => self.cancel_stream(&stream_id),
            StreamEvent::ToolStarted { call_id, tool_name } => {
                let display = display_tool_name(&tool_name);
                let node = self.tree.add_tool_execution(tool_name, display);
                self.tools.insert(call_id, node);
            }
            StreamEvent::ToolProgress { call_id, progress } => {
                self.update_tool(&call_id, ToolStatus::Progress, progress, String::new());
            }
            StreamEvent::ToolFinished { call_id, output } => {
                self.update_tool(&call_id, ToolStatus::Completed, String::new(), output);
                self.tools.remove(&call_id);
            }
            StreamEvent::ToolFailed { call_id, error } => {
                warn!(call_id = %call_id, error = %error, "Tool failed");
                self.update_tool(&call_id, ToolStatus::Error, String::new(), String::new());
                self.tools.remove(&call_id);
            }
        }
    }

    /// Flip reasoning visibility and re-derive every node that has any.
    pub fn toggle_thinking(&mut self) {
        self.show_thinking = !self.show_thinking;
        let updates: Vec<(NodeId, Message)> = self
            .tree
            .nodes()
            .iter()
            .filter(|node| node.message().thinking.is_some())
            .map(|node| {
                let message = apply_thinking(node.message().clone(), self.show_thinking);
                (node.id(), message)
            })
            .collect();
        for (id, message) in updates {
            if let Err(err) = self.tree.update_message(id, message) {
                warn!(error = %err, "Failed to refresh reasoning visibility");
            }
        }
    }

    /// Lines of the trailing streaming node through the incremental renderer.
    ///
    /// Only the answer goes through the renderer; visible reasoning is laid
    /// out by the node and prepended. `None` when there is no streaming node
    /// or it is collapsed; callers then fall back to the node's own render.
    pub fn render_streaming(
        &mut self,
        width: u16,
    ) -> Option<(NodeId, &[Line<'static>], RenderDelta)> {
        let id = self.tree.streaming_node_id()?;
        let node = self.tree.node(id)?;
        let state = node.state();
        if !state.expanded {
            return None;
        }
        let (prefix, answer) = match node.kind() {
            NodeKind::Text => (Vec::new(), node.message().content.as_str()),
            NodeKind::Thinking(parts) => (
                node.thinking_lines(usize::from(width), state),
                parts.response.as_str(),
            ),
            _ => return None,
        };
        let style = highlight(role_style(node.message().role), state, false);
        let (lines, delta) = self.renderer.render(answer, usize::from(width), style);

        if prefix.is_empty() && self.streaming_prefix.is_empty() {
            return Some((id, lines, delta));
        }
        let delta = match delta {
            RenderDelta::Append { first_dirty_line } if prefix == self.streaming_prefix => {
                RenderDelta::Append {
                    first_dirty_line: first_dirty_line + prefix.len(),
                }
            }
            _ => RenderDelta::Full,
        };
        self.streaming_lines.clear();
        self.streaming_lines.extend(prefix.iter().cloned());
        self.streaming_lines.extend_from_slice(lines);
        self.streaming_prefix = prefix;
        Some((id, self.streaming_lines.as_slice(), delta))
    }

    fn replace_history(&mut self, messages: Vec<Message>) {
        let show = self.show_thinking;
        let messages = messages
            .into_iter()
            .map(|m| apply_thinking(m, show))
            .collect();
        self.tree.set_messages(messages);
        self.tools.clear();

        // Open streams survive a snapshot; re-attach their placeholders.
        let mut reattach: Vec<StreamId> = self.streams.keys().cloned().collect();
        reattach.sort();
        for stream_id in reattach {
            if let Some(stream) = self.streams.get_mut(&stream_id) {
                let placeholder = stream.placeholder(&stream_id, show);
                stream.node = self.tree.add_streaming_message(placeholder);
            }
        }
        self.reset_streaming_render();
    }

    fn on_chunk(&mut self, chunk: MessageChunk) {
        if let Some(error) = chunk.error.clone() {
            self.fail_stream(&chunk.stream_id, &error);
            return;
        }

        let stream_id = chunk.stream_id.clone();
        let done = chunk.done;
        let fragment = chunk.content.clone();
        if let Err(err) = self.accumulator.add_chunk(chunk) {
            warn!(error = %err, "Dropped chunk");
            return;
        }

        let show_thinking = self.show_thinking;
        let tree = &mut self.tree;
        let stream = self.streams.entry(stream_id.clone()).or_insert_with(|| {
            info!(stream_id = %stream_id, "Stream started");
            OpenStream {
                parser: ChunkParser::new(),
                thinking: String::new(),
                response: String::new(),
                in_block: false,
                node: tree.add_streaming_message(Message::streaming(stream_id.clone(), "")),
            }
        });

        let mut segments = stream.parser.parse_chunk(&fragment);
        if done {
            segments.extend(stream.parser.finalize());
        }
        for segment in segments {
            stream.push_segment(segment);
        }

        if done {
            self.finish_stream(&stream_id);
        } else if let Err(err) = self
            .tree
            .update_message(stream.node, stream.placeholder(&stream_id, show_thinking))
        {
            warn!(error = %err, "Streaming node missing");
        }
    }

    fn finish_stream(&mut self, stream_id: &StreamId) {
        let node = self.streams.remove(stream_id).map(|s| s.node);
        let message = match self.accumulator.finalize_message(stream_id) {
            Ok(message) => message,
            Err(err) => {
                warn!(error = %err, "Finalize failed");
                return;
            }
        };
        if let Some(node) = node {
            self.remove_placeholder(node);
        }

        let message = apply_thinking(message, self.show_thinking);
        let empty = message.content.trim().is_empty()
            && !message.has_thinking()
            && message.tool_calls.is_empty();
        if !empty {
            self.tree.add_message(message);
        }
        info!(stream_id = %stream_id, "Stream finished");
    }

    fn fail_stream(&mut self, stream_id: &StreamId, error: &str) {
        warn!(stream_id = %stream_id, error = %error, "Stream failed");
        self.discard_stream(stream_id);
        self.tree.add_message(Message::error(format!("Error: {error}")));
    }

    fn cancel_stream(&mut self, stream_id: &StreamId) {
        info!(stream_id = %stream_id, "Stream cancelled");
        self.discard_stream(stream_id);
    }

    fn discard_stream(&mut self, stream_id: &StreamId) {
        if let Err(err) = self.accumulator.cleanup_stream(stream_id) {
            debug!(error = %err, "Nothing to clean up");
        }
        if let Some(stream) = self.streams.remove(stream_id) {
            self.remove_placeholder(stream.node);
        }
    }

    fn remove_placeholder(&mut self, node: NodeId) {
        if let Err(err) = self.tree.remove_streaming_message(node) {
            warn!(error = %err, "Streaming node already gone");
        }
        self.reset_streaming_render();
    }

    fn reset_streaming_render(&mut self) {
        self.renderer.reset();
        self.streaming_prefix.clear();
        self.streaming_lines.clear();
    }

    fn update_tool(&mut self, call_id: &str, status: ToolStatus, progress: String, result: String) {
        let Some(&node) = self.tools.get(call_id) else {
            warn!(call_id = %call_id, "Event for unknown tool run");
            return;
        };
        if let Err(err) = self.tree.update_tool_execution(node, status, progress, result) {
            warn!(error = %err, "Tool node missing");
        }
    }
}

#[cfg(test)]
#[path = "chat_state_tests.rs"]
mod tests;
