//! Domain-level keyboard actions independent of key bindings.

/// Application actions that can be mapped to key bindings.
///
/// These represent user intent, not specific keys. The mapping from
/// `crossterm::event::KeyEvent` to `KeyAction` is handled by `KeyBindings`.
/// Keys without a binding are forwarded to the focused node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyAction {
    /// Exit the application. Default: q/Ctrl+c
    Quit,

    // Node focus
    /// Move focus to the previous node, wrapping at the top. Default: k/↑
    FocusPrevious,
    /// Move focus to the next node, wrapping at the bottom. Default: j/↓
    FocusNext,
    /// Drop keyboard focus. Default: Esc
    ClearFocus,

    // Selection and expansion
    /// Deselect every node. Default: x
    ClearSelection,
    /// Expand or collapse the focused node. Default: Space
    ToggleExpand,
    /// Show or hide reasoning for new messages. Default: t
    ToggleThinking,

    // Scrolling
    /// Scroll the conversation up by one line. Default: Ctrl+u/Page Up
    ScrollUp,
    /// Scroll the conversation down by one line. Default: Ctrl+d/Page Down
    ScrollDown,
    /// Stick to the newest content. Default: G/End
    ScrollToBottom,
}
