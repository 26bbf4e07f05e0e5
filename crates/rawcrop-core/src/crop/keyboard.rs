//! Keyboard input for the crop view.

use serde::{Deserialize, Serialize};

use crate::config::ClientConfig;

/// Keys the crop view reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Key {
    ArrowLeft,
    ArrowRight,
    ArrowUp,
    ArrowDown,
    Enter,
    Escape,
}

impl Key {
    /// Map a DOM `KeyboardEvent.key` value.
    pub fn from_dom_key(key: &str) -> Option<Self> {
        match key {
            "ArrowLeft" | "Left" => Some(Key::ArrowLeft),
            "ArrowRight" | "Right" => Some(Key::ArrowRight),
            "ArrowUp" | "Up" => Some(Key::ArrowUp),
            "ArrowDown" | "Down" => Some(Key::ArrowDown),
            "Enter" => Some(Key::Enter),
            "Escape" | "Esc" => Some(Key::Escape),
            _ => None,
        }
    }
}

/// A key press with the large-step modifier state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyPress {
    pub key: Key,
    /// Shift (or the platform's equivalent) held.
    pub modifier: bool,
}

impl KeyPress {
    pub fn new(key: Key, modifier: bool) -> Self {
        Self { key, modifier }
    }
}

/// What a key press asks the crop session to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyCommand {
    Nudge { dx: i64, dy: i64 },
    Commit,
    Cancel,
}

/// Translate a key press into a crop command.
pub fn command_for(press: KeyPress, config: &ClientConfig) -> KeyCommand {
    let step = if press.modifier {
        config.nudge_step_large
    } else {
        config.nudge_step
    } as i64;

    match press.key {
        Key::ArrowLeft => KeyCommand::Nudge { dx: -step, dy: 0 },
        Key::ArrowRight => KeyCommand::Nudge { dx: step, dy: 0 },
        Key::ArrowUp => KeyCommand::Nudge { dx: 0, dy: -step },
        Key::ArrowDown => KeyCommand::Nudge { dx: 0, dy: step },
        Key::Enter => KeyCommand::Commit,
        Key::Escape => KeyCommand::Cancel,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_dom_key() {
        assert_eq!(Key::from_dom_key("ArrowLeft"), Some(Key::ArrowLeft));
        assert_eq!(Key::from_dom_key("Esc"), Some(Key::Escape));
        assert_eq!(Key::from_dom_key("Enter"), Some(Key::Enter));
        assert_eq!(Key::from_dom_key("a"), None);
        assert_eq!(Key::from_dom_key("Tab"), None);
    }

    #[test]
    fn test_nudge_steps() {
        let config = ClientConfig::default();
        assert_eq!(
            command_for(KeyPress::new(Key::ArrowLeft, false), &config),
            KeyCommand::Nudge { dx: -1, dy: 0 }
        );
        assert_eq!(
            command_for(KeyPress::new(Key::ArrowDown, true), &config),
            KeyCommand::Nudge { dx: 0, dy: 10 }
        );
        assert_eq!(
            command_for(KeyPress::new(Key::ArrowUp, true), &config),
            KeyCommand::Nudge { dx: 0, dy: -10 }
        );
    }

    #[test]
    fn test_enter_and_escape() {
        let config = ClientConfig::default();
        assert_eq!(
            command_for(KeyPress::new(Key::Enter, false), &config),
            KeyCommand::Commit
        );
        assert_eq!(
            command_for(KeyPress::new(Key::Escape, true), &config),
            KeyCommand::Cancel
        );
    }
}
