//! Screen capture backends.
//!
//! | Module     | When                               | API                     |
//! |------------|------------------------------------|-------------------------|
//! | `x11`      | Linux with the `x11` cargo feature | `XGetImage` (ZPixmap)   |
//! | `headless` | no native backend, or `--headless` | synthetic test pattern  |
//! | `mock`     | tests                              | fixed bitmap or failure |

use std::sync::Arc;

use crate::application::{CaptureError, ScreenCapturer};

pub mod headless;
pub mod mock;

#[cfg(all(target_os = "linux", feature = "x11"))]
pub mod x11;

pub use headless::HeadlessScreenCapturer;

/// Opens the native capture backend compiled into this build.
///
/// # Errors
///
/// [`CaptureError::Unavailable`] when no native backend is compiled in or
/// the display cannot be opened.
pub fn native_screen_capturer() -> Result<Arc<dyn ScreenCapturer>, CaptureError> {
    #[cfg(all(target_os = "linux", feature = "x11"))]
    {
        Ok(Arc::new(x11::XlibScreenCapturer::open()?))
    }

    #[cfg(not(all(target_os = "linux", feature = "x11")))]
    {
        Err(CaptureError::Unavailable(
            "no native capture backend in this build (enable the `x11` feature on Linux)".into(),
        ))
    }
}
