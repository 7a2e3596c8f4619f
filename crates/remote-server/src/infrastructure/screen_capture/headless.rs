//! Headless capture backend: a synthetic gradient so clients have something
//! recognisable to render when the server runs without a display.

use crate::application::{Bitmap, CaptureError, ScreenCapturer};

pub struct HeadlessScreenCapturer {
    width: u32,
    height: u32,
}

impl HeadlessScreenCapturer {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl Default for HeadlessScreenCapturer {
    fn default() -> Self {
        Self::new(1920, 1080)
    }
}

impl ScreenCapturer for HeadlessScreenCapturer {
    fn capture(&self) -> Result<Bitmap, CaptureError> {
        let (w, h) = (self.width.max(1), self.height.max(1));
        let mut pixels = Vec::with_capacity(w as usize * h as usize * 3);
        for y in 0..h {
            for x in 0..w {
                // Red runs left to right, green top to bottom, blue is a checker.
                let r = (x * 255 / w) as u8;
                let g = (y * 255 / h) as u8;
                let b = if (x / 64 + y / 64) % 2 == 0 { 0x40 } else { 0xC0 };
                pixels.extend_from_slice(&[r, g, b]);
            }
        }
        Ok(Bitmap {
            width: w,
            height: h,
            pixels,
        })
    }
}
