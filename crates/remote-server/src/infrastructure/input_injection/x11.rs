//! Linux X11 input injection via the XTest extension.
//!
//! # What is XTest? (for beginners)
//!
//! XTest is an X11 protocol extension that lets a process synthesize keyboard
//! and mouse events as if the user had physically used the hardware.  The
//! focused window cannot tell them apart from real input.  The calls used
//! here are:
//!
//! - `XTestFakeMotionEvent(display, screen, x, y, delay)`: move the pointer to
//!   absolute pixel coordinates.
//! - `XTestFakeButtonEvent(display, button, is_press, delay)`: press or
//!   release a mouse button (1 = left, 3 = right).
//! - `XTestFakeKeyEvent(display, keycode, is_press, delay)`: press or release
//!   a key.
//!
//! # Key code translation
//!
//! `XTestFakeKeyEvent` takes a server *keycode*, not a KeySym:
//!
//! ```text
//! key name → Key → X11 KeySym → XKeysymToKeycode(display, keysym) → keycode
//! ```
//!
//! A KeySym reachable only on the shifted level of its keycode (`"A"`, `"!"`)
//! is typed with Shift held.
//!
//! # Permissions
//!
//! The process needs access to the X display named by `DISPLAY`, which is
//! normally the case when it runs inside the user's session.

use std::ptr;
use std::sync::{Mutex, PoisonError};

use remote_core::keymap::x11::key_to_keysym;
use remote_core::{ClickType, Key, ScreenSize};
use x11::{xlib, xtest};

use crate::application::{InjectionError, InputCommand, InputInjector};

// ── X11 constants ─────────────────────────────────────────────────────────────

/// `CurrentTime`: deliver synthesized events immediately.
const CURRENT_TIME: u64 = 0;

/// `-1` means "the screen that currently contains the pointer".
const SCREEN_DEFAULT: i32 = -1;

const BUTTON_LEFT: u32 = 1;
const BUTTON_RIGHT: u32 = 3;

/// KeySym of the left Shift key.
const XK_SHIFT_L: u64 = 0xFFE1;

/// Owned Xlib connection.
struct Display(*mut xlib::Display);

// SAFETY: the pointer is only ever used while holding the injector's mutex,
// so no two threads issue Xlib calls on this connection concurrently.
unsafe impl Send for Display {}

impl Drop for Display {
    fn drop(&mut self) {
        // SAFETY: `self.0` came from a successful XOpenDisplay and is closed
        // exactly once here.
        unsafe { xlib::XCloseDisplay(self.0) };
    }
}

/// XTest-backed [`InputInjector`].
pub struct XTestInputInjector {
    display: Mutex<Display>,
}

impl XTestInputInjector {
    /// Connects to the display named by `DISPLAY`.
    ///
    /// # Errors
    ///
    /// [`InjectionError::Unavailable`] if the display cannot be opened.
    pub fn open() -> Result<Self, InjectionError> {
        // SAFETY: a null name makes Xlib read the DISPLAY environment variable.
        let display = unsafe { xlib::XOpenDisplay(ptr::null()) };
        if display.is_null() {
            let name = std::env::var("DISPLAY").unwrap_or_else(|_| "<unset>".to_string());
            return Err(InjectionError::Unavailable(format!(
                "XOpenDisplay failed; DISPLAY={name}"
            )));
        }
        Ok(Self {
            display: Mutex::new(Display(display)),
        })
    }

    fn with_display<T>(&self, f: impl FnOnce(*mut xlib::Display) -> T) -> T {
        let guard = self.display.lock().unwrap_or_else(PoisonError::into_inner);
        f(guard.0)
    }
}

/// Presses and releases `button`.
///
/// # Safety
///
/// `display` must be a live connection.
unsafe fn click_button(display: *mut xlib::Display, button: u32) {
    xtest::XTestFakeButtonEvent(display, button, xlib::True, CURRENT_TIME);
    xtest::XTestFakeButtonEvent(display, button, xlib::False, CURRENT_TIME);
}

/// Types one key, holding Shift when the KeySym lives on the shifted level.
///
/// # Safety
///
/// `display` must be a live connection.
unsafe fn press_key(display: *mut xlib::Display, key: Key) -> Result<(), InjectionError> {
    let keysym = u64::from(key_to_keysym(key));
    let keycode = xlib::XKeysymToKeycode(display, keysym);
    if keycode == 0 {
        return Err(InjectionError::Platform(format!(
            "no keycode mapped for key {key} (keysym {keysym:#x})"
        )));
    }

    let unshifted = xlib::XKeycodeToKeysym(display, keycode, 0);
    let needs_shift = unshifted != keysym;
    let shift = xlib::XKeysymToKeycode(display, XK_SHIFT_L);

    if needs_shift && shift != 0 {
        xtest::XTestFakeKeyEvent(display, u32::from(shift), xlib::True, CURRENT_TIME);
    }
    xtest::XTestFakeKeyEvent(display, u32::from(keycode), xlib::True, CURRENT_TIME);
    xtest::XTestFakeKeyEvent(display, u32::from(keycode), xlib::False, CURRENT_TIME);
    if needs_shift && shift != 0 {
        xtest::XTestFakeKeyEvent(display, u32::from(shift), xlib::False, CURRENT_TIME);
    }
    Ok(())
}

impl InputInjector for XTestInputInjector {
    fn inject(&self, command: &InputCommand) -> Result<(), InjectionError> {
        self.with_display(|display| {
            // SAFETY: `display` is live for the duration of the closure and
            // the mutex serialises access to it.
            unsafe {
                match *command {
                    InputCommand::MovePointer { x, y } => {
                        xtest::XTestFakeMotionEvent(display, SCREEN_DEFAULT, x, y, CURRENT_TIME);
                    }
                    InputCommand::Click(ClickType::Left) => click_button(display, BUTTON_LEFT),
                    InputCommand::Click(ClickType::Right) => click_button(display, BUTTON_RIGHT),
                    InputCommand::Click(ClickType::Double) => {
                        click_button(display, BUTTON_LEFT);
                        click_button(display, BUTTON_LEFT);
                    }
                    InputCommand::PressKey(key) => press_key(display, key)?,
                }
                xlib::XFlush(display);
            }
            Ok(())
        })
    }

    fn pointer_position(&self) -> Result<(i32, i32), InjectionError> {
        self.with_display(|display| {
            let (mut root, mut child): (xlib::Window, xlib::Window) = (0, 0);
            let (mut root_x, mut root_y, mut win_x, mut win_y) = (0i32, 0i32, 0i32, 0i32);
            let mut mask: u32 = 0;
            // SAFETY: every out-pointer refers to a live local.
            let on_screen = unsafe {
                xlib::XQueryPointer(
                    display,
                    xlib::XDefaultRootWindow(display),
                    &mut root,
                    &mut child,
                    &mut root_x,
                    &mut root_y,
                    &mut win_x,
                    &mut win_y,
                    &mut mask,
                )
            };
            if on_screen == xlib::False {
                return Err(InjectionError::Platform(
                    "pointer is not on the default screen".into(),
                ));
            }
            Ok((root_x, root_y))
        })
    }

    fn screen_size(&self) -> Result<ScreenSize, InjectionError> {
        self.with_display(|display| {
            // SAFETY: `display` is live; the default screen index is valid.
            let (width, height) = unsafe {
                let screen = xlib::XDefaultScreen(display);
                (
                    xlib::XDisplayWidth(display, screen),
                    xlib::XDisplayHeight(display, screen),
                )
            };
            Ok(ScreenSize::new(width.max(0) as u32, height.max(0) as u32))
        })
    }
}
