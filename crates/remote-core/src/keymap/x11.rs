//! [`Key`] to X11 KeySym translation table for Linux hosts.
//!
//! X11 KeySym values are defined in X11/keysymdef.h.
//!
//! # What is an X11 KeySym? (for beginners)
//!
//! X11 identifies keys by **KeySym** (Key Symbol), which can stand for a
//! character as well as a physical key:
//!
//! | KeySym name | Value  | Meaning       |
//! |-------------|--------|---------------|
//! | `XK_a`      | 0x0061 | lowercase 'a' |
//! | `XK_A`      | 0x0041 | uppercase 'A' |
//! | `XK_Return` | 0xFF0D | Enter key     |
//! | `XK_Escape` | 0xFF1B | Escape key    |
//!
//! Latin-1 characters use their code point as KeySym.  Every other Unicode
//! character uses `0x0100_0000 + code point`.  The injection backend looks the
//! KeySym up in the active keyboard mapping to find a keycode and whether
//! Shift must be held.

use super::Key;

/// Offset for KeySyms that encode a Unicode code point directly.
const UNICODE_KEYSYM_OFFSET: u32 = 0x0100_0000;

/// `XK_F1`; `F2`–`F12` follow consecutively.
const XK_F1: u32 = 0xFFBE;

/// Translates a [`Key`] to an X11 KeySym value.
///
/// Every [`Key`] has a KeySym, so this never fails.
pub fn key_to_keysym(key: Key) -> u32 {
    match key {
        Key::Enter => 0xFF0D,     // XK_Return
        Key::Escape => 0xFF1B,    // XK_Escape
        Key::Tab => 0xFF09,       // XK_Tab
        Key::Space => 0x0020,     // XK_space
        Key::Backspace => 0xFF08, // XK_BackSpace
        Key::Delete => 0xFFFF,    // XK_Delete
        Key::Insert => 0xFF63,    // XK_Insert
        Key::Home => 0xFF50,      // XK_Home
        Key::Left => 0xFF51,      // XK_Left
        Key::Up => 0xFF52,        // XK_Up
        Key::Right => 0xFF53,     // XK_Right
        Key::Down => 0xFF54,      // XK_Down
        Key::PageUp => 0xFF55,    // XK_Prior
        Key::PageDown => 0xFF56,  // XK_Next
        Key::End => 0xFF57,       // XK_End
        Key::CapsLock => 0xFFE5,  // XK_Caps_Lock
        Key::Shift => 0xFFE1,     // XK_Shift_L
        Key::Control => 0xFFE3,   // XK_Control_L
        Key::Alt => 0xFFE9,       // XK_Alt_L
        Key::Meta => 0xFFEB,      // XK_Super_L
        Key::F(n) => XK_F1 + u32::from(n.clamp(1, 12) - 1),
        Key::Char(c) => char_to_keysym(c),
    }
}

fn char_to_keysym(c: char) -> u32 {
    let cp = u32::from(c);
    match cp {
        0x20..=0x7E | 0xA0..=0xFF => cp,
        _ => UNICODE_KEYSYM_OFFSET + cp,
    }
}
