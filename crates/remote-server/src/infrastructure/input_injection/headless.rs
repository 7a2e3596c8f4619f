//! Headless input backend.
//!
//! Keeps a virtual pointer inside a virtual screen and logs every command
//! instead of touching the OS.  Used when the build has no native backend,
//! when no display is reachable, or when `--headless` is given.  The protocol
//! behaves exactly as with a real desktop, which makes this backend useful for
//! trying a client against a server on a machine without a GUI.

use std::sync::{Mutex, PoisonError};

use remote_core::ScreenSize;
use tracing::debug;

use crate::application::{InjectionError, InputCommand, InputInjector};

pub struct HeadlessInputInjector {
    screen: ScreenSize,
    pointer: Mutex<(i32, i32)>,
}

impl HeadlessInputInjector {
    /// Creates a virtual screen with the pointer at its centre.
    pub fn new(screen: ScreenSize) -> Self {
        let centre = ((screen.width / 2) as i32, (screen.height / 2) as i32);
        Self {
            screen,
            pointer: Mutex::new(centre),
        }
    }
}

impl Default for HeadlessInputInjector {
    fn default() -> Self {
        Self::new(ScreenSize::new(1920, 1080))
    }
}

impl InputInjector for HeadlessInputInjector {
    fn inject(&self, command: &InputCommand) -> Result<(), InjectionError> {
        match *command {
            InputCommand::MovePointer { x, y } => {
                *self.pointer.lock().unwrap_or_else(PoisonError::into_inner) = (x, y);
            }
            InputCommand::Click(click) => debug!(click = click.as_str(), "headless click"),
            InputCommand::PressKey(key) => debug!(%key, "headless key press"),
        }
        Ok(())
    }

    fn pointer_position(&self) -> Result<(i32, i32), InjectionError> {
        Ok(*self.pointer.lock().unwrap_or_else(PoisonError::into_inner))
    }

    fn screen_size(&self) -> Result<ScreenSize, InjectionError> {
        Ok(self.screen)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pointer_starts_centred() {
        let injector = HeadlessInputInjector::new(ScreenSize::new(800, 600));

        assert_eq!(injector.pointer_position().unwrap(), (400, 300));
    }

    #[test]
    fn test_move_updates_virtual_pointer() {
        let injector = HeadlessInputInjector::default();

        injector
            .inject(&InputCommand::MovePointer { x: 0, y: 1079 })
            .unwrap();

        assert_eq!(injector.pointer_position().unwrap(), (0, 1079));
    }
}
