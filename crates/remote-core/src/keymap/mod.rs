//! Key-name translation.
//!
//! Clients name keys the way common desktop-automation tools do: `"enter"`,
//! `"esc"`, `"pagedown"`, `"f5"`, `"a"`.  [`Key`] is the canonical form of
//! such a name; platform backends translate a [`Key`] into their own codes
//! (see [`x11`] for X11 KeySyms).
//!
//! Names are case-insensitive, except single characters, which are taken
//! literally so that `"A"` and `"a"` stay distinct.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

pub mod x11;

/// Errors that can occur when parsing a key name.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum KeyError {
    #[error("key name is empty")]
    Empty,

    #[error("unknown key name: {0:?}")]
    Unknown(String),
}

/// A key the server knows how to press.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Enter,
    Escape,
    Tab,
    Space,
    Backspace,
    Delete,
    Insert,
    Up,
    Down,
    Left,
    Right,
    Home,
    End,
    PageUp,
    PageDown,
    CapsLock,
    Shift,
    Control,
    Alt,
    /// The Windows / Command / Super key.
    Meta,
    /// Function key `F1`–`F12`; the payload is always in `1..=12`.
    F(u8),
    /// A single printable character, pressed as typed.
    Char(char),
}

impl Key {
    /// Parses a client key name.
    ///
    /// # Errors
    ///
    /// [`KeyError::Empty`] for `""` and [`KeyError::Unknown`] for names that
    /// are neither a known key nor a single printable character.
    pub fn from_name(name: &str) -> Result<Self, KeyError> {
        let mut chars = name.chars();
        match (chars.next(), chars.next()) {
            (None, _) => return Err(KeyError::Empty),
            (Some(' '), None) => return Ok(Key::Space),
            (Some(c), None) if !c.is_control() => return Ok(Key::Char(c)),
            _ => {}
        }

        let lower = name.to_ascii_lowercase();
        let key = match lower.as_str() {
            "enter" | "return" => Key::Enter,
            "esc" | "escape" => Key::Escape,
            "tab" => Key::Tab,
            "space" | "spacebar" => Key::Space,
            "backspace" => Key::Backspace,
            "delete" | "del" => Key::Delete,
            "insert" | "ins" => Key::Insert,
            "up" | "arrowup" => Key::Up,
            "down" | "arrowdown" => Key::Down,
            "left" | "arrowleft" => Key::Left,
            "right" | "arrowright" => Key::Right,
            "home" => Key::Home,
            "end" => Key::End,
            "pageup" | "pgup" => Key::PageUp,
            "pagedown" | "pgdn" => Key::PageDown,
            "capslock" => Key::CapsLock,
            "shift" => Key::Shift,
            "ctrl" | "control" => Key::Control,
            "alt" | "option" => Key::Alt,
            "win" | "super" | "cmd" | "command" | "meta" => Key::Meta,
            other => {
                return parse_function_key(other)
                    .ok_or_else(|| KeyError::Unknown(name.to_string()))
            }
        };
        Ok(key)
    }

    /// Canonical lower-case name, accepted back by [`Key::from_name`].
    pub fn name(&self) -> String {
        match self {
            Key::Enter => "enter".into(),
            Key::Escape => "esc".into(),
            Key::Tab => "tab".into(),
            Key::Space => "space".into(),
            Key::Backspace => "backspace".into(),
            Key::Delete => "delete".into(),
            Key::Insert => "insert".into(),
            Key::Up => "up".into(),
            Key::Down => "down".into(),
            Key::Left => "left".into(),
            Key::Right => "right".into(),
            Key::Home => "home".into(),
            Key::End => "end".into(),
            Key::PageUp => "pageup".into(),
            Key::PageDown => "pagedown".into(),
            Key::CapsLock => "capslock".into(),
            Key::Shift => "shift".into(),
            Key::Control => "ctrl".into(),
            Key::Alt => "alt".into(),
            Key::Meta => "win".into(),
            Key::F(n) => format!("f{n}"),
            Key::Char(c) => c.to_string(),
        }
    }
}

fn parse_function_key(lower: &str) -> Option<Key> {
    let n: u8 = lower.strip_prefix('f')?.parse().ok()?;
    (1..=12).contains(&n).then_some(Key::F(n))
}

impl FromStr for Key {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Key::from_name(s)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
