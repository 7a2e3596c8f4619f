//! InjectInputUseCase: turns accepted input commands into OS input events.
//!
//! This use case sits at the application layer and delegates to an
//! [`InputInjector`] trait object for OS-level event injection.  The
//! platform-specific implementations live in
//! `infrastructure::input_injection`.

use std::sync::Arc;

use remote_core::{ClickType, Key, KeyError, MotionConfig, MotionFilter, ScreenSize};
use thiserror::Error;
use tracing::trace;

/// Error type for input injection operations.
#[derive(Debug, Error)]
pub enum InjectionError {
    /// The OS call failed.
    #[error("platform error: {0}")]
    Platform(String),

    /// No usable backend (for example no X display).
    #[error("input backend unavailable: {0}")]
    Unavailable(String),

    #[error(transparent)]
    Key(#[from] KeyError),
}

/// One primitive input action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputCommand {
    /// Move the pointer to absolute screen coordinates.
    MovePointer { x: i32, y: i32 },
    /// Click at the current pointer position.
    Click(ClickType),
    /// Press and release one key.
    PressKey(Key),
}

/// Platform-agnostic input injection capability.
///
/// Each supported OS provides an implementation in the infrastructure layer.
pub trait InputInjector: Send + Sync {
    /// Performs one input action.
    fn inject(&self, command: &InputCommand) -> Result<(), InjectionError>;

    /// Returns the current pointer position in screen pixels.
    fn pointer_position(&self) -> Result<(i32, i32), InjectionError>;

    /// Returns the size of the primary display.
    fn screen_size(&self) -> Result<ScreenSize, InjectionError>;
}

/// The Inject Input use case.
///
/// Owns the motion filter, so the fractional remainder survives between
/// motion datagrams.
pub struct InjectInputUseCase {
    injector: Arc<dyn InputInjector>,
    motion: MotionFilter,
}

impl InjectInputUseCase {
    pub fn new(injector: Arc<dyn InputInjector>, motion: MotionConfig) -> Self {
        Self {
            injector,
            motion: MotionFilter::new(motion),
        }
    }

    /// Feeds a raw motion sample through the filter and moves the pointer if
    /// it amounts to at least one whole pixel.
    ///
    /// Returns the new pointer position, or `None` if nothing moved.
    ///
    /// # Errors
    ///
    /// Returns [`InjectionError`] if reading the pointer or screen, or the
    /// move itself, fails.  The filter's remainder has already advanced.
    pub fn handle_relative_move(
        &mut self,
        dx: f64,
        dy: f64,
    ) -> Result<Option<(i32, i32)>, InjectionError> {
        let Some(delta) = self.motion.step(dx, dy) else {
            return Ok(None);
        };

        let current = self.injector.pointer_position()?;
        let screen = self.injector.screen_size()?;
        let target = screen.offset_clamped(current, delta);

        trace!(?delta, from = ?current, to = ?target, "pointer move");
        let (x, y) = target;
        self.injector.inject(&InputCommand::MovePointer { x, y })?;
        Ok(Some(target))
    }

    /// Clicks at the current pointer position.
    ///
    /// # Errors
    ///
    /// Returns [`InjectionError`] if the OS event injection fails.
    pub fn handle_click(&self, click_type: ClickType) -> Result<(), InjectionError> {
        self.injector.inject(&InputCommand::Click(click_type))
    }

    /// Presses the named key.  An empty name is a no-op.
    ///
    /// Returns the key that was pressed.
    ///
    /// # Errors
    ///
    /// [`InjectionError::Key`] for an unknown key name, or the backend's
    /// error if the injection fails.
    pub fn handle_key(&self, name: &str) -> Result<Option<Key>, InjectionError> {
        if name.is_empty() {
            return Ok(None);
        }
        let key = Key::from_name(name)?;
        self.injector.inject(&InputCommand::PressKey(key))?;
        Ok(Some(key))
    }

    /// Clears the motion remainder, e.g. when a new client takes over.
    pub fn reset(&mut self) {
        self.motion.reset();
    }

    /// Read-only view of the motion filter.
    pub fn motion(&self) -> &MotionFilter {
        &self.motion
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
