//! Key bindings for the review screen.

use console::Key;
use sieve_core::Decision;

/// Quality step for `+` / `-`.
pub const QUALITY_STEP: i16 = 5;

/// What a keypress asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Decide(Decision),
    AdjustQuality(i16),
    ToggleRealism,
    ToggleCentral,
    ChooseCentral,
    OpenFolder,
    Quit,
}

/// Map a key to its action; unbound keys map to `None`.
pub fn action_for(key: &Key) -> Option<Action> {
    let action = match key {
        Key::ArrowRight | Key::Char('k') => Action::Decide(Decision::Keep),
        Key::ArrowLeft | Key::Char('d') => Action::Decide(Decision::Discard),
        Key::ArrowUp | Key::Char('u') => Action::Decide(Decision::Modify),
        Key::Char('+') | Key::Char('=') => Action::AdjustQuality(QUALITY_STEP),
        Key::Char('-') => Action::AdjustQuality(-QUALITY_STEP),
        Key::Char('r') => Action::ToggleRealism,
        Key::Char('c') => Action::ToggleCentral,
        Key::Char('C') => Action::ChooseCentral,
        Key::Char('o') => Action::OpenFolder,
        Key::Char('q') | Key::Escape => Action::Quit,
        _ => return None,
    };
    Some(action)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decision_keys() {
        for key in [Key::ArrowRight, Key::Char('k')] {
            assert_eq!(action_for(&key), Some(Action::Decide(Decision::Keep)));
        }
        for key in [Key::ArrowLeft, Key::Char('d')] {
            assert_eq!(action_for(&key), Some(Action::Decide(Decision::Discard)));
        }
        for key in [Key::ArrowUp, Key::Char('u')] {
            assert_eq!(action_for(&key), Some(Action::Decide(Decision::Modify)));
        }
    }

    #[test]
    fn setting_keys() {
        assert_eq!(action_for(&Key::Char('+')), Some(Action::AdjustQuality(5)));
        assert_eq!(action_for(&Key::Char('-')), Some(Action::AdjustQuality(-5)));
        assert_eq!(action_for(&Key::Char('c')), Some(Action::ToggleCentral));
        assert_eq!(action_for(&Key::Char('C')), Some(Action::ChooseCentral));
        assert_eq!(action_for(&Key::Escape), Some(Action::Quit));
    }

    #[test]
    fn unbound_keys_do_nothing() {
        assert_eq!(action_for(&Key::ArrowDown), None);
        assert_eq!(action_for(&Key::Char('x')), None);
        assert_eq!(action_for(&Key::Enter), None);
    }
}
