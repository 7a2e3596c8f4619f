//! Test capturer: returns a fixed bitmap, or fails on demand, and counts
//! how often it was asked.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::application::{Bitmap, CaptureError, ScreenCapturer};

pub struct MockScreenCapturer {
    pub bitmap: Bitmap,
    /// When `true`, `capture` returns `CaptureError::Platform`.
    pub should_fail: bool,
    /// How long each `capture` blocks before returning.
    pub capture_delay: Duration,
    captures: AtomicUsize,
}

impl MockScreenCapturer {
    /// A uniformly grey `width`×`height` screen.
    pub fn solid(width: u32, height: u32) -> Self {
        Self {
            bitmap: Bitmap {
                width,
                height,
                pixels: vec![0x80; width as usize * height as usize * 3],
            },
            should_fail: false,
            capture_delay: Duration::ZERO,
            captures: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            should_fail: true,
            ..Self::solid(1, 1)
        }
    }

    /// Number of `capture` calls so far, failed ones included.
    pub fn capture_count(&self) -> usize {
        self.captures.load(Ordering::SeqCst)
    }
}

impl ScreenCapturer for MockScreenCapturer {
    fn capture(&self) -> Result<Bitmap, CaptureError> {
        self.captures.fetch_add(1, Ordering::SeqCst);
        if !self.capture_delay.is_zero() {
            std::thread::sleep(self.capture_delay);
        }
        if self.should_fail {
            return Err(CaptureError::Platform("mock failure".into()));
        }
        Ok(self.bitmap.clone())
    }
}
