//! Key and mouse bindings.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};

/// Action from a key press or click.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Spawn,
    Pause,
    Restart,
    Quit,
    Up,
    Down,
    Confirm,
    None,
}

/// Map key event to game action. Arrows and vim keys both navigate menus.
pub fn key_to_action(key: KeyEvent) -> Action {
    let KeyEvent { code, modifiers, .. } = key;
    if modifiers == KeyModifiers::CONTROL && code == KeyCode::Char('c') {
        return Action::Quit;
    }
    let no_mod = modifiers.is_empty() || modifiers == KeyModifiers::SHIFT;
    if !no_mod {
        return Action::None;
    }
    match code {
        KeyCode::Char('q' | 'Q') | KeyCode::Esc => Action::Quit,
        KeyCode::Char('p' | 'P') => Action::Pause,
        KeyCode::Char('r' | 'R') => Action::Restart,
        KeyCode::Char(' ') => Action::Spawn,
        KeyCode::Up | KeyCode::Char('k') => Action::Up,
        KeyCode::Down | KeyCode::Char('j') => Action::Down,
        KeyCode::Enter => Action::Confirm,
        _ => Action::None,
    }
}

/// Left click anywhere spawns a batch; everything else is ignored.
pub fn mouse_to_action(mouse: MouseEvent) -> Action {
    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => Action::Spawn,
        _ => Action::None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyEventKind;

    fn press(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent::new_with_kind(code, modifiers, KeyEventKind::Press)
    }

    fn mouse(kind: MouseEventKind) -> MouseEvent {
        MouseEvent {
            kind,
            column: 10,
            row: 5,
            modifiers: KeyModifiers::NONE,
        }
    }

    #[test]
    fn test_keys() {
        assert_eq!(key_to_action(press(KeyCode::Char(' '), KeyModifiers::NONE)), Action::Spawn);
        assert_eq!(key_to_action(press(KeyCode::Char('P'), KeyModifiers::SHIFT)), Action::Pause);
        assert_eq!(key_to_action(press(KeyCode::Esc, KeyModifiers::NONE)), Action::Quit);
        assert_eq!(key_to_action(press(KeyCode::Char('c'), KeyModifiers::CONTROL)), Action::Quit);
        assert_eq!(key_to_action(press(KeyCode::Char('r'), KeyModifiers::ALT)), Action::None);
        assert_eq!(key_to_action(press(KeyCode::Char('j'), KeyModifiers::NONE)), Action::Down);
    }

    #[test]
    fn test_mouse() {
        assert_eq!(mouse_to_action(mouse(MouseEventKind::Down(MouseButton::Left))), Action::Spawn);
        assert_eq!(mouse_to_action(mouse(MouseEventKind::Down(MouseButton::Right))), Action::None);
        assert_eq!(mouse_to_action(mouse(MouseEventKind::Moved)), Action::None);
    }
}
