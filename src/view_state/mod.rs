//! View-state layer - interactive nodes, caching, and hit-testing
//!
//! This module turns messages into interactive nodes and keeps the state
//! the TUI needs between frames.
//!
//! # Module Structure
//!
//! - `types`: NodeState flags and NodeBounds
//! - `wrap`: display-width word wrapping
//! - `styles`: role colors and selection/focus highlights
//! - `cache`: RenderCache - per-node cache keyed by width and state
//! - `node`: Node and the closed NodeKind union
//! - `factory`: NodeFactory - ordered message classification
//! - `hit_test`: HitTestResult - result of mouse hit-testing
//! - `tree`: NodeTree - arena of nodes with focus and selection
//! - `incremental`: IncrementalRenderer - delta rendering of streaming text

pub mod cache;
pub mod factory;
pub mod incremental;
pub mod node;
pub mod styles;
pub mod tree;
pub mod types;
pub mod wrap;

pub use cache::{RenderCache, RenderCacheKey};
pub use factory::NodeFactory;
pub use hit_test::HitTestResult;
pub use incremental::{IncrementalRenderer, RenderDelta};
pub use node::{display_tool_name, Node, NodeKind, ThinkingParts, ToolExecution, ToolStatus};
pub use tree::NodeTree;
pub use types::{NodeBounds, NodeState};
pub use wrap::wrap_text;

use ratatui::text::Line;

/// Plain text of a rendered line, styles dropped.
pub fn line_to_string(line: &Line<'_>) -> String {
    line.spans.iter().map(|span| span.content.as_ref()).collect()
}
