//! LIVE indicator widget for the status bar.
//!
//! Blinks green while at least one stream is open and stays gray once
//! every stream has settled.

use ratatui::{
    style::{Color, Style},
    text::Span,
};

/// Text content for the LIVE indicator.
const LIVE_INDICATOR_PREFIX: &str = "[LIVE] ";

/// LIVE indicator rendered from stream activity and blink state.
///
/// The widget is stateless; the blink phase is driven by the event loop's
/// timer and passed in.
///
/// ```rust
/// use chatweave::view::live_indicator::LiveIndicator;
///
/// let idle = LiveIndicator::new(false, true);
/// assert_eq!(idle.render().content, "[LIVE] ");
///
/// let hidden = LiveIndicator::new(true, false);
/// assert_eq!(hidden.render().content, "");
/// ```
#[derive(Debug, Clone, Copy)]
pub struct LiveIndicator {
    streaming: bool,
    blink_on: bool,
}

impl LiveIndicator {
    /// Create an indicator for the given activity and blink phase.
    pub fn new(streaming: bool, blink_on: bool) -> Self {
        Self {
            streaming,
            blink_on,
        }
    }

    /// Render the indicator as a ratatui Span.
    ///
    /// - idle: gray text
    /// - streaming, blink on: green text
    /// - streaming, blink off: empty
    pub fn render(&self) -> Span<'static> {
        match (self.streaming, self.blink_on) {
            (false, _) => Span::styled(LIVE_INDICATOR_PREFIX, Style::default().fg(Color::Gray)),
            (true, true) => Span::styled(LIVE_INDICATOR_PREFIX, Style::default().fg(Color::Green)),
            (true, false) => Span::raw(""),
        }
    }
}

// ===== Tests =====

#[cfg(test)]
#[path = "live_indicator_tests.rs"]
mod tests;
