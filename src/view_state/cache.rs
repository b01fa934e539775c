//! Per-node render cache

use super::types::NodeState;
use ratatui::text::Line;

/// Key for render cache lookup.
///
/// Includes every parameter that affects a node's rendered lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RenderCacheKey {
    /// Viewport width when rendered.
    pub width: u16,
    /// State the lines were rendered under.
    pub state: NodeState,
}

impl RenderCacheKey {
    /// Create new render cache key.
    pub fn new(width: u16, state: NodeState) -> Self {
        Self { width, state }
    }
}

/// Single-entry cache of a node's wrapped, styled lines.
///
/// Valid only for the key it was filled under, and only until explicitly
/// invalidated.
#[derive(Debug, Clone, Default)]
pub struct RenderCache {
    lines: Vec<Line<'static>>,
    key: Option<RenderCacheKey>,
    valid: bool,
}

impl RenderCache {
    /// Create an empty, invalid cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached lines, if filled under `key` and still valid.
    pub fn get(&self, key: &RenderCacheKey) -> Option<&[Line<'static>]> {
        (self.valid && self.key.as_ref() == Some(key)).then_some(self.lines.as_slice())
    }

    /// Store freshly rendered lines under `key`.
    pub fn put(&mut self, key: RenderCacheKey, lines: Vec<Line<'static>>) -> &[Line<'static>] {
        self.lines = lines;
        self.key = Some(key);
        self.valid = true;
        &self.lines
    }

    /// Mark the cache stale.
    pub fn invalidate(&mut self) {
        self.valid = false;
    }

    /// Whether the cache holds usable lines.
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Width of the last fill, if any.
    pub fn last_width(&self) -> Option<u16> {
        self.key.map(|k| k.width)
    }
}
