//! Input handling: maps key/mouse events to game operations.

use crossterm::event::{
    KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};

use crate::config::Action;
use crate::core::timer::GamePhase;

use super::state::AppState;

/// Process a key event.
pub fn handle_key(state: &mut AppState, key: KeyEvent) {
    // Some terminals report releases and repeats as separate events.
    if key.kind == KeyEventKind::Release {
        return;
    }

    // Ctrl+c always quits, regardless of view.
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        state.should_quit = true;
        return;
    }

    let action = state.config.match_key(key);

    if state.show_help {
        // Any key closes the overlay; quit still quits.
        state.show_help = false;
        if action == Some(Action::Quit) {
            state.should_quit = true;
        }
        return;
    }

    let Some(action) = action else {
        return;
    };

    let game = &state.config.game;
    let (line, page) = (game.line_pixels, game.page_pixels);

    match action {
        Action::ScrollDown => state.scroll_by(line),
        Action::ScrollUp => state.scroll_by(-line),
        Action::PageDown => state.scroll_by(page),
        Action::PageUp => state.scroll_by(-page),
        Action::Pause => {
            if state.phase() == GamePhase::Playing {
                state.pause();
            }
        }
        Action::Reset => state.reset(),
        Action::ToggleHelp => state.show_help = true,
        Action::Quit => state.should_quit = true,
    }
}

/// Process a mouse event.  The wheel scrolls by notches; a left-button drag
/// scrolls like a touch swipe (dragging up moves forward).
pub fn handle_mouse(state: &mut AppState, mouse: MouseEvent) {
    if state.show_help {
        return;
    }

    let game = &state.config.game;
    let (wheel, row_px) = (game.wheel_pixels, game.row_pixels);

    match mouse.kind {
        MouseEventKind::ScrollDown => state.scroll_by(wheel),
        MouseEventKind::ScrollUp => state.scroll_by(-wheel),
        MouseEventKind::Down(MouseButton::Left) => {
            state.drag_row = Some(mouse.row);
        }
        MouseEventKind::Drag(MouseButton::Left) => {
            let Some(last) = state.drag_row else {
                state.drag_row = Some(mouse.row);
                return;
            };
            state.drag_row = Some(mouse.row);
            let rows = i32::from(last) - i32::from(mouse.row);
            if rows != 0 {
                state.scroll_by(f64::from(rows) * row_px);
            }
        }
        MouseEventKind::Up(MouseButton::Left) => {
            state.drag_row = None;
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::state::tests::harness;
    use crate::config::AppConfig;
    use crossterm::event::KeyEventState;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn mouse(kind: MouseEventKind, row: u16) -> MouseEvent {
        MouseEvent {
            kind,
            column: 10,
            row,
            modifiers: KeyModifiers::NONE,
        }
    }

    #[test]
    fn wheel_notches_add_distance() {
        let mut h = harness(AppConfig::default());
        for _ in 0..10 {
            handle_mouse(&mut h.state, mouse(MouseEventKind::ScrollDown, 0));
        }
        handle_mouse(&mut h.state, mouse(MouseEventKind::ScrollUp, 0));
        assert_eq!(h.state.tracker.raw_units(), 1_000.0);
        assert_eq!(h.state.phase(), GamePhase::Playing);
    }

    #[test]
    fn dragging_up_scrolls_forward() {
        let mut h = harness(AppConfig::default());
        let row_px = h.state.config.game.row_pixels;

        handle_mouse(&mut h.state, mouse(MouseEventKind::Down(MouseButton::Left), 20));
        handle_mouse(&mut h.state, mouse(MouseEventKind::Drag(MouseButton::Left), 15));
        handle_mouse(&mut h.state, mouse(MouseEventKind::Drag(MouseButton::Left), 18));
        handle_mouse(&mut h.state, mouse(MouseEventKind::Up(MouseButton::Left), 18));

        assert_eq!(h.state.tracker.raw_units(), 5.0 * row_px);
        assert_eq!(h.state.drag_row, None);
    }

    #[test]
    fn keys_drive_the_game() {
        let mut h = harness(AppConfig::default());
        let line = h.state.config.game.line_pixels;
        let page = h.state.config.game.page_pixels;

        handle_key(&mut h.state, press(KeyCode::Down));
        handle_key(&mut h.state, press(KeyCode::PageDown));
        assert_eq!(h.state.tracker.raw_units(), line + page);

        handle_key(&mut h.state, press(KeyCode::Char('p')));
        assert_eq!(h.state.phase(), GamePhase::Paused);

        handle_key(&mut h.state, press(KeyCode::Char('j')));
        assert_eq!(h.state.phase(), GamePhase::Playing);

        handle_key(&mut h.state, press(KeyCode::Char('r')));
        assert_eq!(h.state.phase(), GamePhase::NotStarted);
        assert_eq!(h.state.tracker.raw_units(), 0.0);
    }

    #[test]
    fn pause_before_start_does_nothing() {
        let mut h = harness(AppConfig::default());
        handle_key(&mut h.state, press(KeyCode::Char('p')));
        assert_eq!(h.state.phase(), GamePhase::NotStarted);
        assert_eq!(h.state.status_message, None);
    }

    #[test]
    fn help_overlay_swallows_input() {
        let mut h = harness(AppConfig::default());
        handle_key(&mut h.state, press(KeyCode::Char('?')));
        assert!(h.state.show_help);

        handle_mouse(&mut h.state, mouse(MouseEventKind::ScrollDown, 0));
        assert_eq!(h.state.tracker.raw_units(), 0.0);

        handle_key(&mut h.state, press(KeyCode::Down));
        assert!(!h.state.show_help);
        assert_eq!(h.state.tracker.raw_units(), 0.0);
        assert!(!h.state.should_quit);
    }

    #[test]
    fn releases_are_ignored_and_ctrl_c_quits() {
        let mut h = harness(AppConfig::default());
        let release = KeyEvent {
            code: KeyCode::Down,
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Release,
            state: KeyEventState::NONE,
        };
        handle_key(&mut h.state, release);
        assert_eq!(h.state.tracker.raw_units(), 0.0);

        handle_key(
            &mut h.state,
            KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL),
        );
        assert!(h.state.should_quit);
    }
}
