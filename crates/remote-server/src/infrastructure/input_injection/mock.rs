//! Recording input injector for tests.
//!
//! # Why a mock injector?
//!
//! The real backend moves the actual pointer of whatever desktop runs the
//! tests.  `MockInputInjector` replaces every OS call with in-memory
//! recording, so a test can assert exactly which commands were issued and in
//! what order.
//!
//! Set `should_fail` (or build with [`MockInputInjector::failing`]) to make
//! every call return [`InjectionError::Platform`], which exercises the
//! error-reply paths of the dispatcher.

use std::sync::{Mutex, PoisonError};

use remote_core::ScreenSize;

use crate::application::{InjectionError, InputCommand, InputInjector};

/// Records every injected command; pointer and screen are fixed values.
pub struct MockInputInjector {
    /// Every command passed to `inject`, in order.
    pub commands: Mutex<Vec<InputCommand>>,
    /// Reported by `pointer_position`; updated by `MovePointer`.
    pub pointer: Mutex<(i32, i32)>,
    pub screen: ScreenSize,
    /// When `true`, every method returns `InjectionError::Platform`.
    pub should_fail: bool,
}

impl Default for MockInputInjector {
    fn default() -> Self {
        Self {
            commands: Mutex::new(Vec::new()),
            pointer: Mutex::new((960, 540)),
            screen: ScreenSize::new(1920, 1080),
            should_fail: false,
        }
    }
}

impl MockInputInjector {
    pub fn new() -> Self {
        Self::default()
    }

    /// A mock whose every call fails.
    pub fn failing() -> Self {
        Self {
            should_fail: true,
            ..Self::default()
        }
    }

    /// Snapshot of the recorded commands.
    pub fn commands(&self) -> Vec<InputCommand> {
        self.commands
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn check(&self) -> Result<(), InjectionError> {
        if self.should_fail {
            return Err(InjectionError::Platform("mock failure".into()));
        }
        Ok(())
    }
}

impl InputInjector for MockInputInjector {
    fn inject(&self, command: &InputCommand) -> Result<(), InjectionError> {
        self.check()?;
        if let InputCommand::MovePointer { x, y } = *command {
            *self.pointer.lock().unwrap_or_else(PoisonError::into_inner) = (x, y);
        }
        self.commands
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(*command);
        Ok(())
    }

    fn pointer_position(&self) -> Result<(i32, i32), InjectionError> {
        self.check()?;
        Ok(*self.pointer.lock().unwrap_or_else(PoisonError::into_inner))
    }

    fn screen_size(&self) -> Result<ScreenSize, InjectionError> {
        self.check()?;
        Ok(self.screen)
    }
}
