//! Input injection backends.
//!
//! | Module     | When                                   | API                  |
//! |------------|----------------------------------------|----------------------|
//! | `x11`      | Linux with the `x11` cargo feature     | XTest + Xlib         |
//! | `headless` | no native backend, or `--headless`    | none (virtual state) |
//! | `mock`     | tests                                  | none (records calls) |
//!
//! [`native_input_injector`] picks the native backend for this build, if
//! there is one.

use std::sync::Arc;

use crate::application::{InjectionError, InputInjector};

pub mod headless;
pub mod mock;

#[cfg(all(target_os = "linux", feature = "x11"))]
pub mod x11;

pub use headless::HeadlessInputInjector;

/// Opens the native input backend compiled into this build.
///
/// # Errors
///
/// [`InjectionError::Unavailable`] when no native backend is compiled in, or
/// the backend's error when it cannot connect (for example no `DISPLAY`).
pub fn native_input_injector() -> Result<Arc<dyn InputInjector>, InjectionError> {
    #[cfg(all(target_os = "linux", feature = "x11"))]
    {
        Ok(Arc::new(x11::XTestInputInjector::open()?))
    }

    #[cfg(not(all(target_os = "linux", feature = "x11")))]
    {
        Err(InjectionError::Unavailable(
            "no native input backend in this build (enable the `x11` feature on Linux)".into(),
        ))
    }
}
