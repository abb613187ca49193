//! Key bindings and mouse tracking.

use crate::game::PointerSample;
use crate::ui::Viewport;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};

/// Action from a key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Up,
    Down,
    Confirm,
    Pause,
    Restart,
    Quit,
    None,
}

/// Map key event to action. Arrows and vim keys both navigate menus.
pub fn key_to_action(key: KeyEvent) -> Action {
    let KeyEvent { code, modifiers, .. } = key;
    let no_mod = modifiers.is_empty() || modifiers == KeyModifiers::SHIFT;
    if modifiers == KeyModifiers::CONTROL && code == KeyCode::Char('c') {
        return Action::Quit;
    }
    if !no_mod {
        return Action::None;
    }
    match code {
        KeyCode::Char('q' | 'Q') | KeyCode::Esc => Action::Quit,
        KeyCode::Char('p' | 'P') => Action::Pause,
        KeyCode::Char('r' | 'R') => Action::Restart,
        KeyCode::Up | KeyCode::Char('k') => Action::Up,
        KeyCode::Down | KeyCode::Char('j') => Action::Down,
        KeyCode::Enter | KeyCode::Char(' ') => Action::Confirm,
        _ => Action::None,
    }
}

/// Folds crossterm mouse events into the once-per-tick pointer sample.
///
/// A press that starts and ends between two ticks still shows up as pressed for one sample.
/// A release followed by a new press between two ticks is reported as a released sample
/// first and the new press on the next one, so the latch sees both.
#[derive(Debug, Clone, Copy, Default)]
pub struct PointerTracker {
    x: f32,
    y: f32,
    down: bool,
    /// A press arrived that no sample has reported yet.
    press_pending: bool,
    released_since_sample: bool,
    /// What the last sample said.
    reported: bool,
}

impl PointerTracker {
    pub fn on_mouse(&mut self, event: MouseEvent, viewport: &Viewport) {
        let (x, y) = viewport.to_logical(event.column, event.row);
        match event.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                self.x = x;
                self.y = y;
                self.down = true;
                self.press_pending = true;
            }
            MouseEventKind::Up(MouseButton::Left) => {
                self.down = false;
                self.released_since_sample = true;
            }
            MouseEventKind::Drag(MouseButton::Left) | MouseEventKind::Moved => {
                self.x = x;
                self.y = y;
            }
            _ => {}
        }
    }

    pub fn sample(&mut self) -> PointerSample {
        let pressed = if self.reported && self.released_since_sample && self.press_pending {
            // Deliver the release now; the pending press goes out next tick.
            false
        } else {
            std::mem::take(&mut self.press_pending) || self.down
        };
        self.released_since_sample = false;
        self.reported = pressed;
        PointerSample {
            x: self.x,
            y: self.y,
            pressed,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
