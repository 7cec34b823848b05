use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};

use crate::app::{Action, AppState, InputMode, View};
use crate::requests::Confirmation;

/// Handle a mouse event
pub fn handle_mouse(state: &mut AppState, mouse: MouseEvent) {
    if state.view != View::Console {
        return;
    }
    match mouse.kind {
        MouseEventKind::ScrollUp => state.scroll_up(3),
        MouseEventKind::ScrollDown => state.scroll_down(3),
        _ => {}
    }
}

/// Handle a key event.
///
/// Purely local changes are applied to `state` right away; anything that
/// needs the log source is returned as an `Action` for the caller to await.
pub fn handle_key(state: &mut AppState, key: KeyEvent, page_size: usize) -> Option<Action> {
    // Help overlay takes priority
    if state.show_help {
        if matches!(key.code, KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('?')) {
            state.show_help = false;
        }
        return None;
    }

    match state.mode {
        InputMode::ConfirmPurge => handle_confirm_mode(key),
        InputMode::Normal => handle_normal_mode(state, key, page_size),
    }
}

fn handle_confirm_mode(key: KeyEvent) -> Option<Action> {
    match key.code {
        KeyCode::Char('y') | KeyCode::Char('Y') => Some(Action::DeleteHistory(Confirmation::Granted)),
        KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
            Some(Action::DeleteHistory(Confirmation::Denied))
        }
        _ => None,
    }
}

fn handle_normal_mode(state: &mut AppState, key: KeyEvent, page_size: usize) -> Option<Action> {
    match key.code {
        // Quit
        KeyCode::Char('q') => {
            state.should_quit = true;
            None
        }
        // Ctrl+C also quits
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            state.should_quit = true;
            None
        }
        KeyCode::Char('?') => {
            state.show_help = true;
            None
        }
        KeyCode::Tab => {
            state.switch_view();
            None
        }
        KeyCode::Char('t') => Some(Action::TestConnection),
        KeyCode::Char('f') => Some(Action::ToggleFollow),
        _ => match state.view {
            View::Requests => handle_requests_key(state, key),
            View::Console => handle_console_key(state, key, page_size),
        },
    }
}

fn handle_requests_key(state: &mut AppState, key: KeyEvent) -> Option<Action> {
    match key.code {
        KeyCode::Char('r') => Some(Action::RefreshRequests),
        KeyCode::Char('m') => Some(Action::LoadMoreRequests),
        KeyCode::Char('n') | KeyCode::Right | KeyCode::PageDown => {
            state.next_page();
            None
        }
        KeyCode::Char('p') | KeyCode::Left | KeyCode::PageUp => {
            state.previous_page();
            None
        }
        KeyCode::Char('c') => {
            state.clear_requests();
            None
        }
        KeyCode::Char('D') => {
            state.mode = InputMode::ConfirmPurge;
            None
        }
        _ => None,
    }
}

fn handle_console_key(state: &mut AppState, key: KeyEvent, page_size: usize) -> Option<Action> {
    match key.code {
        KeyCode::Char('r') => Some(Action::RefreshConsole),
        KeyCode::Char('x') => {
            state.clear_console();
            None
        }
        KeyCode::Char('k') | KeyCode::Up => {
            state.scroll_up(1);
            None
        }
        KeyCode::Char('j') | KeyCode::Down => {
            state.scroll_down(1);
            None
        }
        KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            state.scroll_up(page_size);
            None
        }
        KeyCode::Char('d') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            state.scroll_down(page_size);
            None
        }
        KeyCode::PageUp => {
            state.scroll_up(page_size);
            None
        }
        KeyCode::PageDown => {
            state.scroll_down(page_size);
            None
        }
        KeyCode::Char('g') => {
            state.go_to_top();
            None
        }
        KeyCode::Char('G') => {
            state.go_to_bottom();
            None
        }
        _ => None,
    }
}
