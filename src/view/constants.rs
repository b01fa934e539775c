//! Layout and timing constants for TUI rendering.
//!
//! Centralized location for the numeric values the event loop and layout
//! share.

use std::time::Duration;

/// Height of the status bar in lines.
pub const STATUS_BAR_HEIGHT: u16 = 1;

/// Lines moved per mouse wheel notch.
pub const MOUSE_SCROLL_LINES: usize = 3;

/// Lines moved per scroll key press.
pub const KEY_SCROLL_LINES: usize = 1;

/// How long the loop waits for terminal input before draining stream
/// events.
pub const TICK_INTERVAL: Duration = Duration::from_millis(50);

/// Blink period of the LIVE indicator.
pub const BLINK_INTERVAL: Duration = Duration::from_millis(500);

/// Upper bound on stream events applied between two frames, so a fast
/// producer cannot starve input handling.
pub const MAX_EVENTS_PER_TICK: usize = 256;
