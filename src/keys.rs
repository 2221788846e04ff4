use std::str::FromStr;

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use thiserror::Error;

/// The alphabet a typing session understands.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TypingKey {
    Char(char),
    Backspace,
    Enter,
    Tab,
}

impl TypingKey {
    /// Character this key produces, `None` for Backspace.
    pub fn to_char(self) -> Option<char> {
        match self {
            TypingKey::Char(c) => Some(c),
            TypingKey::Enter => Some('\n'),
            TypingKey::Tab => Some('\t'),
            TypingKey::Backspace => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("not a typable key: {0:?}")]
pub struct UnknownKey(pub String);

impl FromStr for TypingKey {
    type Err = UnknownKey;

    /// Parses the key names used by browsers: a single character, or one of
    /// "Backspace", "Enter", "Tab".
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Backspace" => Ok(TypingKey::Backspace),
            "Enter" => Ok(TypingKey::Enter),
            "Tab" => Ok(TypingKey::Tab),
            _ => {
                let mut chars = s.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Ok(TypingKey::Char(c)),
                    _ => Err(UnknownKey(s.to_string())),
                }
            }
        }
    }
}

/// Reduce a terminal key event to a typing key.
///
/// Chords with Control, Alt or Super, key releases, and every non-character
/// key other than Backspace, Enter and Tab are dropped. Shift is fine since it
/// is already folded into the character.
pub fn typable_key(event: &KeyEvent) -> Option<TypingKey> {
    if event.kind == KeyEventKind::Release {
        return None;
    }

    if event
        .modifiers
        .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT | KeyModifiers::SUPER)
    {
        return None;
    }

    match event.code {
        KeyCode::Char(c) => Some(TypingKey::Char(c)),
        KeyCode::Backspace => Some(TypingKey::Backspace),
        KeyCode::Enter => Some(TypingKey::Enter),
        KeyCode::Tab => Some(TypingKey::Tab),
        _ => None,
    }
}
