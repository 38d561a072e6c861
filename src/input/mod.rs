//! Input dispatcher (C8, spec.md §4.8).
//!
//! A stack of handlers traversed in descending priority; the first whose
//! mode gate passes and whose `handle` returns `true` wins. Grounded on the
//! teacher's `tui::events::EventHandler` trait (`src/tui/events.rs`),
//! generalized from a single handler into a prioritized stack with
//! per-handler mode gates, since spec.md requires several handlers that
//! must never fire outside their declared mode (I5).

use std::time::Instant;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::domain::{Mode, Navigation, View};
use crate::state::{Msg, SystemEvent};

pub trait InputHandler: Send {
    /// Higher runs first.
    fn priority(&self) -> i32;
    fn can_handle(&self, mode: Mode) -> bool;
    /// Returns `Some(msgs)` if this handler consumed the key; `None` to
    /// fall through to the next handler in the stack.
    fn handle(&self, key: KeyEvent, mode: Mode, nav: &Navigation, now: Instant) -> Option<Vec<Msg>>;
}

pub struct InputDispatcher {
    handlers: Vec<Box<dyn InputHandler>>,
}

impl InputDispatcher {
    pub fn new() -> Self {
        let mut handlers: Vec<Box<dyn InputHandler>> = vec![
            Box::new(GlobalHandler),
            Box::new(NavigationInputHandler),
            Box::new(SearchInputHandler),
            Box::new(ModeInputHandler),
        ];
        handlers.sort_by(|a, b| b.priority().cmp(&a.priority()));
        Self { handlers }
    }

    /// Dispatches `key` to the first eligible handler (spec.md §4.8, P7:
    /// a handler whose mode gate fails is never invoked).
    pub fn dispatch(&self, key: KeyEvent, mode: Mode, nav: &Navigation, now: Instant) -> Vec<Msg> {
        for handler in &self.handlers {
            if !handler.can_handle(mode) {
                continue;
            }
            if let Some(msgs) = handler.handle(key, mode, nav, now) {
                return msgs;
            }
        }
        Vec::new()
    }
}

impl Default for InputDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

/// Accepts all modes; handles kill-switches (spec.md §4.8, §6).
struct GlobalHandler;

impl InputHandler for GlobalHandler {
    fn priority(&self) -> i32 {
        100
    }

    fn can_handle(&self, _mode: Mode) -> bool {
        true
    }

    fn handle(&self, key: KeyEvent, mode: Mode, _nav: &Navigation, _now: Instant) -> Option<Vec<Msg>> {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            return Some(vec![Msg::System(SystemEvent::Quit)]);
        }
        let quit_eligible = matches!(mode, Mode::Normal | Mode::Loading | Mode::AuthRequired);
        if quit_eligible && matches!(key.code, KeyCode::Char('q') | KeyCode::Char('Q')) {
            return Some(vec![Msg::System(SystemEvent::Quit)]);
        }
        None
    }
}

struct NavigationInputHandler;

impl InputHandler for NavigationInputHandler {
    fn priority(&self) -> i32 {
        10
    }

    fn can_handle(&self, mode: Mode) -> bool {
        mode == Mode::Normal
    }

    fn handle(&self, key: KeyEvent, _mode: Mode, nav: &Navigation, now: Instant) -> Option<Vec<Msg>> {
        match key.code {
            KeyCode::Char('j') | KeyCode::Down => Some(vec![Msg::CursorDelta(1)]),
            KeyCode::Char('k') | KeyCode::Up => Some(vec![Msg::CursorDelta(-1)]),
            KeyCode::Char('g') => {
                if Navigation::within_window(nav.last_g_pressed, now) {
                    Some(vec![Msg::SetCursor(0)])
                } else {
                    // First press of `gg`: record the timestamp so the next
                    // press within the debounce window is recognized as the
                    // second half of the gesture.
                    Some(vec![Msg::RecordKeyPress { now }])
                }
            }
            KeyCode::Char('G') => Some(vec![Msg::SetCursor(usize::MAX)]),
            KeyCode::Enter => Some(vec![Msg::DrillDownCursor]),
            KeyCode::Char(' ') => Some(vec![Msg::ToggleCursorSelection]),
            KeyCode::Esc => {
                if Navigation::within_window(nav.last_esc_pressed, now) {
                    Some(vec![Msg::NavigateUp])
                } else {
                    Some(vec![Msg::Escape { now }])
                }
            }
            _ => None,
        }
    }
}

struct SearchInputHandler;

impl InputHandler for SearchInputHandler {
    fn priority(&self) -> i32 {
        10
    }

    fn can_handle(&self, mode: Mode) -> bool {
        mode == Mode::Search
    }

    fn handle(&self, key: KeyEvent, _mode: Mode, _nav: &Navigation, _now: Instant) -> Option<Vec<Msg>> {
        match key.code {
            KeyCode::Char('j') | KeyCode::Down => Some(vec![Msg::CursorDelta(1)]),
            KeyCode::Char('k') | KeyCode::Up => Some(vec![Msg::CursorDelta(-1)]),
            KeyCode::Esc => Some(vec![Msg::SetMode(Mode::Normal)]),
            KeyCode::Enter => Some(vec![Msg::SetMode(Mode::Normal)]),
            KeyCode::Char(c) => Some(vec![Msg::AppendSearchChar(c)]),
            _ => None,
        }
    }
}

/// Handles the mode-entry gestures (`/`, `:`, `?`).
struct ModeInputHandler;

impl InputHandler for ModeInputHandler {
    fn priority(&self) -> i32 {
        5
    }

    fn can_handle(&self, mode: Mode) -> bool {
        mode == Mode::Normal
    }

    fn handle(&self, key: KeyEvent, _mode: Mode, _nav: &Navigation, _now: Instant) -> Option<Vec<Msg>> {
        match key.code {
            KeyCode::Char('/') => Some(vec![Msg::SetMode(Mode::Search)]),
            KeyCode::Char(':') => Some(vec![Msg::SetMode(Mode::Command)]),
            KeyCode::Char('?') => Some(vec![Msg::SetMode(Mode::Help)]),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyEventKind;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn key_with_kind(code: KeyCode) -> KeyEvent {
        let mut k = key(code);
        k.kind = KeyEventKind::Press;
        k
    }

    #[test]
    fn mode_gate_blocks_wrong_mode_handlers() {
        let dispatcher = InputDispatcher::new();
        let nav = Navigation::default();
        // '/' only does anything in Normal mode via ModeInputHandler; in
        // Search mode it's routed to AppendSearchChar instead.
        let msgs = dispatcher.dispatch(key_with_kind(KeyCode::Char('/')), Mode::Search, &nav, Instant::now());
        assert!(matches!(msgs.as_slice(), [Msg::AppendSearchChar(c)] if *c == '/'));
    }

    #[test]
    fn global_handler_quits_on_ctrl_c_in_any_mode() {
        let dispatcher = InputDispatcher::new();
        let nav = Navigation::default();
        let mut k = key(KeyCode::Char('c'));
        k.modifiers = KeyModifiers::CONTROL;
        let msgs = dispatcher.dispatch(k, Mode::Help, &nav, Instant::now());
        assert!(matches!(msgs.as_slice(), [Msg::System(SystemEvent::Quit)]));
    }

    #[test]
    fn double_esc_navigates_up() {
        let dispatcher = InputDispatcher::new();
        let t0 = Instant::now();
        let mut nav = Navigation::default();
        nav.last_esc_pressed = Some(t0);
        let msgs = dispatcher.dispatch(key_with_kind(KeyCode::Esc), Mode::Normal, &nav, t0);
        assert!(matches!(msgs.as_slice(), [Msg::NavigateUp]));
    }

    #[test]
    fn single_esc_clears_scope() {
        let dispatcher = InputDispatcher::new();
        let nav = Navigation::default();
        let msgs = dispatcher.dispatch(key_with_kind(KeyCode::Esc), Mode::Normal, &nav, Instant::now());
        assert!(matches!(msgs.as_slice(), [Msg::Escape { .. }]));
    }
}
