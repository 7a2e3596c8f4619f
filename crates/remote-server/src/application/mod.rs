//! Application layer for remote-server.
//!
//! The application layer knows *what* to do with each datagram, but delegates
//! *how* to touch the OS to the infrastructure layer through two traits:
//!
//! - [`InputInjector`] – move the pointer, click, press keys.
//! - [`ScreenCapturer`] – grab the primary display as an RGB bitmap.
//!
//! # Responsibilities
//!
//! - Gating every command on an authenticated session ([`dispatch`])
//! - Turning motion samples into clamped pointer moves ([`inject_input`])
//! - Capture → downscale → JPEG → base64 ([`produce_frame`])
//! - Evicting idle sessions ([`sweep_sessions`])
//!
//! # What does NOT belong here?
//!
//! - Opening sockets or reading the config file (infrastructure)
//! - Any OS input or screen API call (infrastructure backends)

pub mod dispatch;
pub mod inject_input;
pub mod produce_frame;
pub mod sweep_sessions;

pub use dispatch::{Action, Dispatcher};
pub use inject_input::{InjectInputUseCase, InjectionError, InputCommand, InputInjector};
pub use produce_frame::{Bitmap, CaptureError, FrameError, FrameProducer, ScreenCapturer};
pub use sweep_sessions::InactivitySweeper;
