//! TUI rendering and terminal management (impure shell)

pub mod constants;
pub mod conversation;
pub mod layout;
pub mod live_indicator;

#[cfg(test)]
mod view_snapshots;

pub use conversation::{layout_conversation, render_conversation, ChatScroll};
pub use layout::render_layout;
pub use live_indicator::LiveIndicator;

use crate::config::keybindings::KeyBindings;
use crate::config::ResolvedConfig;
use crate::model::{AppError, KeyAction, NodeError, NodeId};
use crate::source::{spawn_replay, InputSource, ReplayHandle};
use crate::state::ChatState;
use crate::view::constants::{
    BLINK_INTERVAL, KEY_SCROLL_LINES, MAX_EVENTS_PER_TICK, MOUSE_SCROLL_LINES, TICK_INTERVAL,
};
use crate::view_state::hit_test::hit_test;
use crossterm::{
    event::{self, Event, KeyEvent, KeyEventKind, MouseButton, MouseEvent, MouseEventKind},
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use ratatui::{backend::CrosstermBackend, layout::Rect, Terminal};
use std::io::{self, Stdout};
use std::sync::mpsc::TryRecvError;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, info};

/// Errors that can occur during TUI operations
#[derive(Debug, Error)]
pub enum TuiError {
    /// IO error during terminal operations
    #[error("Terminal IO error: {0}")]
    Io(#[from] io::Error),

    /// Input source error
    #[error("Input error: {0}")]
    Input(#[from] crate::model::InputError),

    /// Application error
    #[error("Application error: {0}")]
    App(#[from] AppError),
}

/// Main TUI application
///
/// Generic over backend to support testing with TestBackend
pub struct TuiApp<B>
where
    B: ratatui::backend::Backend,
{
    terminal: Terminal<B>,
    chat: ChatState,
    scroll: ChatScroll,
    replay: Option<ReplayHandle>,
    key_bindings: KeyBindings,
    hovered: Option<NodeId>,
    blink_on: bool,
    last_blink: Instant,
    /// Last rendered conversation area (for mouse routing)
    last_conversation_area: Option<Rect>,
}

impl TuiApp<CrosstermBackend<Stdout>> {
    /// Create and initialize a new TUI application
    ///
    /// Sets up terminal in raw mode with alternate screen and mouse capture.
    pub fn new(chat: ChatState, replay: ReplayHandle) -> Result<Self, TuiError> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        stdout.execute(EnterAlternateScreen)?;
        stdout.execute(crossterm::event::EnableMouseCapture)?;
        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend)?;

        Ok(Self::with_terminal(terminal, chat, Some(replay)))
    }

    /// Run the main event loop
    ///
    /// Returns when user quits (q or Ctrl+C). Terminal input is handled as
    /// it arrives; stream events are drained on every tick.
    pub fn run(&mut self) -> Result<(), TuiError> {
        self.draw()?;

        loop {
            if event::poll(TICK_INTERVAL)? {
                let redraw = match event::read()? {
                    Event::Key(key) if key.kind == KeyEventKind::Press => {
                        if self.handle_key(key) {
                            return Ok(());
                        }
                        true
                    }
                    Event::Mouse(mouse) => self.handle_mouse(mouse),
                    Event::Resize(width, height) => {
                        debug!(width, height, "Terminal resized");
                        true
                    }
                    _ => false,
                };
                if redraw {
                    self.draw()?;
                }
            }

            let mut redraw = self.pump_events();
            if self.chat.open_stream_count() > 0 && self.last_blink.elapsed() >= BLINK_INTERVAL {
                self.blink_on = !self.blink_on;
                self.last_blink = Instant::now();
                redraw = true;
            }
            if redraw {
                self.draw()?;
            }
        }
    }
}

impl<B> TuiApp<B>
where
    B: ratatui::backend::Backend,
{
    fn with_terminal(terminal: Terminal<B>, chat: ChatState, replay: Option<ReplayHandle>) -> Self {
        Self {
            terminal,
            chat,
            scroll: ChatScroll::default(),
            replay,
            key_bindings: KeyBindings::default(),
            hovered: None,
            blink_on: true,
            last_blink: Instant::now(),
            last_conversation_area: None,
        }
    }

    /// Apply pending stream events. Returns whether anything changed.
    fn pump_events(&mut self) -> bool {
        let Some(replay) = &self.replay else {
            return false;
        };

        let mut applied = 0;
        let mut finished = false;
        while applied < MAX_EVENTS_PER_TICK {
            match replay.try_recv() {
                Ok(event) => {
                    self.chat.handle_event(event);
                    applied += 1;
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    finished = true;
                    break;
                }
            }
        }

        if finished {
            info!(
                nodes = self.chat.tree().node_count(),
                open_streams = self.chat.open_stream_count(),
                "Event source exhausted"
            );
            self.replay = None;
        }
        if applied > 0 {
            debug!(applied, "Applied stream events");
        }
        applied > 0 || finished
    }

    /// Handle a single keyboard event
    ///
    /// Returns true if app should quit. Keys without a binding go to the
    /// focused node.
    fn handle_key(&mut self, key: KeyEvent) -> bool {
        let Some(action) = self.key_bindings.get(key) else {
            if !self.chat.tree_mut().handle_key_event(key) {
                debug!(?key, "Unhandled key");
            }
            return false;
        };

        match action {
            KeyAction::Quit => {
                if let Some(replay) = &self.replay {
                    replay.cancel();
                }
                return true;
            }
            KeyAction::FocusPrevious => {
                if let Some(id) = self.chat.tree_mut().move_focus_up() {
                    self.scroll.reveal(id);
                }
            }
            KeyAction::FocusNext => {
                if let Some(id) = self.chat.tree_mut().move_focus_down() {
                    self.scroll.reveal(id);
                }
            }
            KeyAction::ClearFocus => {
                if let Err(err) = self.chat.tree_mut().set_focused_node(None) {
                    debug!(error = %err, "Failed to clear focus");
                }
            }
            KeyAction::ClearSelection => self.chat.tree_mut().clear_selection(),
            KeyAction::ToggleExpand => self.toggle_focused_expansion(),
            KeyAction::ToggleThinking => self.chat.toggle_thinking(),
            KeyAction::ScrollUp => self.scroll.scroll_up(KEY_SCROLL_LINES),
            KeyAction::ScrollDown => self.scroll.scroll_down(KEY_SCROLL_LINES),
            KeyAction::ScrollToBottom => self.scroll.scroll_to_bottom(),
        }

        false
    }

    fn toggle_focused_expansion(&mut self) {
        let Some(id) = self.chat.tree().focused_node() else {
            return;
        };
        match self.chat.tree_mut().toggle_node_expansion(id) {
            Ok(expanded) => {
                debug!(node = %id, expanded, "Toggled expansion");
                self.scroll.reveal(id);
            }
            Err(NodeError::NotCollapsible(_)) => {}
            Err(err) => debug!(error = %err, "Failed to toggle expansion"),
        }
    }

    /// Handle a single mouse event. Returns whether a redraw is needed.
    ///
    /// Wheel scrolls the conversation, left click goes to the node under
    /// the pointer, and movement updates the hover highlight.
    fn handle_mouse(&mut self, mouse: MouseEvent) -> bool {
        match mouse.kind {
            MouseEventKind::ScrollUp => {
                self.scroll.scroll_up(MOUSE_SCROLL_LINES);
                true
            }
            MouseEventKind::ScrollDown => {
                self.scroll.scroll_down(MOUSE_SCROLL_LINES);
                true
            }
            MouseEventKind::Down(MouseButton::Left) => {
                if !self.in_conversation(mouse.column, mouse.row) {
                    return false;
                }
                match self.chat.tree_mut().handle_click(mouse.column, mouse.row) {
                    Some(id) => {
                        debug!(node = %id, "Click handled");
                        true
                    }
                    None => false,
                }
            }
            MouseEventKind::Moved => self.update_hover(mouse.column, mouse.row),
            _ => false,
        }
    }

    fn in_conversation(&self, x: u16, y: u16) -> bool {
        self.last_conversation_area
            .is_some_and(|area| area.contains(ratatui::layout::Position::new(x, y)))
    }

    fn update_hover(&mut self, x: u16, y: u16) -> bool {
        let target = if self.in_conversation(x, y) {
            hit_test(self.chat.tree().nodes(), x, y).node_id()
        } else {
            None
        };
        if target == self.hovered {
            return false;
        }

        let tree = self.chat.tree_mut();
        if let Some(previous) = self.hovered {
            // The node may have been replaced since it was hovered.
            if let Err(err) = tree.set_node_hovered(previous, false) {
                debug!(error = %err, "Stale hover target");
            }
        }
        if let Some(id) = target {
            if let Err(err) = tree.set_node_hovered(id, true) {
                debug!(error = %err, "Failed to set hover");
            }
        }
        self.hovered = target;
        true
    }

    /// Render the current frame
    ///
    /// Node bounds are refreshed during layout, so mouse routing always
    /// matches what is on screen.
    fn draw(&mut self) -> Result<(), TuiError> {
        let size = self.terminal.size()?;
        let frame_area = Rect::new(0, 0, size.width, size.height);
        let (conversation_area, _) = layout::split_areas(frame_area);
        self.last_conversation_area = Some(conversation_area);

        let chat = &mut self.chat;
        let scroll = &mut self.scroll;
        let blink_on = self.blink_on;
        self.terminal.draw(|frame| {
            layout::render_layout(frame, chat, scroll, blink_on);
        })?;

        Ok(())
    }
}

// ===== Test Helpers =====

#[cfg(test)]
impl<B> TuiApp<B>
where
    B: ratatui::backend::Backend,
{
    pub(crate) fn new_for_test(terminal: Terminal<B>, chat: ChatState) -> Self {
        Self::with_terminal(terminal, chat, None)
    }

    pub(crate) fn attach_replay(&mut self, replay: ReplayHandle) {
        self.replay = Some(replay);
    }

    pub(crate) fn chat(&self) -> &ChatState {
        &self.chat
    }

    pub(crate) fn scroll(&self) -> &ChatScroll {
        &self.scroll
    }

    pub(crate) fn terminal(&self) -> &Terminal<B> {
        &self.terminal
    }
}

/// Initialize and run the TUI application with an input source
///
/// Opens the source, starts the replay worker, and runs the event loop.
/// The terminal is restored even when the loop fails.
///
/// Note: Logging must be initialized by caller before calling this function.
pub fn run_with_source(input_source: InputSource, config: &ResolvedConfig) -> Result<(), TuiError> {
    let reader = input_source.open()?;
    let replay = spawn_replay(reader, Duration::from_millis(config.replay_delay_ms))?;
    let chat = ChatState::new(config.show_thinking);

    let mut app = TuiApp::new(chat, replay)?;
    let result = app.run();

    // Always restore terminal state
    restore_terminal()?;

    result
}

/// Restore terminal to normal state
///
/// Disables raw mode, mouse capture, and leaves alternate screen
pub fn restore_terminal() -> Result<(), TuiError> {
    disable_raw_mode()?;
    io::stdout().execute(crossterm::event::DisableMouseCapture)?;
    io::stdout().execute(LeaveAlternateScreen)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Message, MessageChunk, StreamId};
    use crate::state::StreamEvent;
    use crossterm::event::{KeyCode, KeyModifiers};
    use ratatui::backend::TestBackend;

    fn create_test_app(messages: Vec<Message>) -> TuiApp<TestBackend> {
        let terminal = Terminal::new(TestBackend::new(60, 12)).unwrap();
        let mut chat = ChatState::new(true);
        chat.handle_event(StreamEvent::History(messages));
        TuiApp::new_for_test(terminal, chat)
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn mouse(kind: MouseEventKind, column: u16, row: u16) -> MouseEvent {
        MouseEvent {
            kind,
            column,
            row,
            modifiers: KeyModifiers::NONE,
        }
    }

    #[test]
    fn tui_error_from_io_error() {
        let io_err = io::Error::other("test error");
        let tui_err: TuiError = io_err.into();
        assert!(matches!(tui_err, TuiError::Io(_)));
    }

    #[test]
    fn handle_key_q_returns_true() {
        let mut app = create_test_app(vec![]);
        assert!(app.handle_key(key(KeyCode::Char('q'))));
    }

    #[test]
    fn handle_key_ctrl_c_returns_true() {
        let mut app = create_test_app(vec![]);
        assert!(app.handle_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)));
    }

    #[test]
    fn handle_key_other_returns_false() {
        let mut app = create_test_app(vec![]);
        assert!(!app.handle_key(key(KeyCode::Char('z'))));
    }

    #[test]
    fn focus_keys_walk_the_nodes() {
        let mut app = create_test_app(vec![Message::user("a"), Message::assistant("b")]);
        let ids: Vec<NodeId> = app.chat().tree().nodes().iter().map(|n| n.id()).collect();

        app.handle_key(key(KeyCode::Char('j')));
        assert_eq!(app.chat().tree().focused_node(), Some(ids[0]));
        app.handle_key(key(KeyCode::Char('j')));
        assert_eq!(app.chat().tree().focused_node(), Some(ids[1]));
        app.handle_key(key(KeyCode::Char('k')));
        assert_eq!(app.chat().tree().focused_node(), Some(ids[0]));

        app.handle_key(key(KeyCode::Esc));
        assert_eq!(app.chat().tree().focused_node(), None);
    }

    #[test]
    fn enter_reaches_the_focused_node() {
        let mut app = create_test_app(vec![Message::user("a")]);
        app.handle_key(key(KeyCode::Down));
        app.handle_key(key(KeyCode::Enter));
        assert_eq!(app.chat().tree().selection_count(), 1);

        app.handle_key(key(KeyCode::Char('x')));
        assert_eq!(app.chat().tree().selection_count(), 0);
    }

    #[test]
    fn toggle_expand_collapses_long_text() {
        let long = (0..10).map(|i| format!("line {i}")).collect::<Vec<_>>().join("\n");
        let mut app = create_test_app(vec![Message::assistant(long)]);
        app.handle_key(key(KeyCode::Down));

        app.handle_key(key(KeyCode::Char(' ')));

        let node = &app.chat().tree().nodes()[0];
        assert!(!node.state().expanded);
    }

    #[test]
    fn toggle_expand_ignores_non_collapsible_nodes() {
        let mut app = create_test_app(vec![Message::user("short")]);
        app.handle_key(key(KeyCode::Down));
        app.handle_key(key(KeyCode::Char(' ')));
        assert!(app.chat().tree().nodes()[0].state().expanded);
    }

    #[test]
    fn toggle_thinking_flips_visibility() {
        let mut app = create_test_app(vec![]);
        assert!(app.chat().show_thinking());
        app.handle_key(key(KeyCode::Char('t')));
        assert!(!app.chat().show_thinking());
    }

    #[test]
    fn click_selects_node_under_pointer() {
        let mut app = create_test_app(vec![Message::user("a"), Message::assistant("b")]);
        app.draw().unwrap();

        assert!(app.handle_mouse(mouse(MouseEventKind::Down(MouseButton::Left), 0, 2)));

        let second = app.chat().tree().nodes()[1].id();
        assert_eq!(app.chat().tree().selected_nodes(), vec![second]);
    }

    #[test]
    fn click_on_separator_is_ignored() {
        let mut app = create_test_app(vec![Message::user("a"), Message::assistant("b")]);
        app.draw().unwrap();

        assert!(!app.handle_mouse(mouse(MouseEventKind::Down(MouseButton::Left), 0, 1)));
        assert_eq!(app.chat().tree().selection_count(), 0);
    }

    #[test]
    fn mouse_move_tracks_hover() {
        let mut app = create_test_app(vec![Message::user("a"), Message::assistant("b")]);
        app.draw().unwrap();

        assert!(app.handle_mouse(mouse(MouseEventKind::Moved, 0, 0)));
        assert!(app.chat().tree().nodes()[0].state().hovered);

        assert!(app.handle_mouse(mouse(MouseEventKind::Moved, 0, 2)));
        assert!(!app.chat().tree().nodes()[0].state().hovered);
        assert!(app.chat().tree().nodes()[1].state().hovered);

        assert!(!app.handle_mouse(mouse(MouseEventKind::Moved, 1, 2)));
    }

    #[test]
    fn wheel_scrolls_conversation() {
        let messages = (0..20).map(|i| Message::user(format!("m{i}"))).collect();
        let mut app = create_test_app(messages);
        app.draw().unwrap();
        let bottom = app.scroll().offset();

        app.handle_mouse(mouse(MouseEventKind::ScrollUp, 0, 0));
        app.draw().unwrap();

        assert_eq!(app.scroll().offset(), bottom - MOUSE_SCROLL_LINES);
        assert!(!app.scroll().is_following());

        app.handle_key(key(KeyCode::End));
        app.draw().unwrap();
        assert_eq!(app.scroll().offset(), bottom);
    }

    #[test]
    fn pump_events_applies_replayed_stream() {
        let transcript = concat!(
            "{\"type\":\"user_input\",\"content\":\"hi\"}\n",
            "{\"type\":\"chunk\",\"stream_id\":\"s1\",\"content\":\"hello\"}\n",
            "{\"type\":\"chunk\",\"stream_id\":\"s1\",\"content\":\" there\",\"done\":true}\n",
        );
        let mut app = create_test_app(vec![]);
        app.attach_replay(spawn_replay(io::Cursor::new(transcript), Duration::ZERO).unwrap());

        let deadline = Instant::now() + Duration::from_secs(5);
        while app.replay.is_some() && Instant::now() < deadline {
            app.pump_events();
            std::thread::sleep(Duration::from_millis(5));
        }

        let contents: Vec<&str> = app
            .chat()
            .tree()
            .nodes()
            .iter()
            .map(|n| n.message().content.as_str())
            .collect();
        assert_eq!(contents, vec!["hi", "hello there"]);
        assert_eq!(app.chat().open_stream_count(), 0);
    }

    #[test]
    fn pump_events_without_source_is_idle() {
        let mut app = create_test_app(vec![]);
        assert!(!app.pump_events());
        app.chat.handle_event(StreamEvent::Chunk(MessageChunk::new(
            StreamId::new("s").unwrap(),
            0,
            "x",
            false,
        )));
        assert!(!app.pump_events());
    }
}
