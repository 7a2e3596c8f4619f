//! Linux X11 screen capture via `XGetImage`.
//!
//! Grabs the root window of the default screen as a ZPixmap image and
//! converts it to packed RGB8.  On the usual 24/32-bit TrueColor visuals
//! every pixel is a 32-bit word whose channels are located by the image's
//! `red_mask`, `green_mask` and `blue_mask`; other depths fall back to
//! `XGetPixel`, which is slow but always correct.

use std::ptr;
use std::sync::{Mutex, PoisonError};

use x11::xlib;

use crate::application::{Bitmap, CaptureError, ScreenCapturer};

/// Owned Xlib connection.
struct Display(*mut xlib::Display);

// SAFETY: only used while holding the capturer's mutex.
unsafe impl Send for Display {}

impl Drop for Display {
    fn drop(&mut self) {
        // SAFETY: opened by XOpenDisplay, closed exactly once.
        unsafe { xlib::XCloseDisplay(self.0) };
    }
}

pub struct XlibScreenCapturer {
    display: Mutex<Display>,
}

impl XlibScreenCapturer {
    /// # Errors
    ///
    /// [`CaptureError::Unavailable`] if the display cannot be opened.
    pub fn open() -> Result<Self, CaptureError> {
        // SAFETY: null means "use DISPLAY".
        let display = unsafe { xlib::XOpenDisplay(ptr::null()) };
        if display.is_null() {
            let name = std::env::var("DISPLAY").unwrap_or_else(|_| "<unset>".to_string());
            return Err(CaptureError::Unavailable(format!(
                "XOpenDisplay failed; DISPLAY={name}"
            )));
        }
        Ok(Self {
            display: Mutex::new(Display(display)),
        })
    }
}

/// Position of the lowest set bit, used to shift a masked channel down.
fn mask_shift(mask: u64) -> u32 {
    if mask == 0 {
        0
    } else {
        mask.trailing_zeros()
    }
}

fn channel(pixel: u64, mask: u64) -> u8 {
    ((pixel & mask) >> mask_shift(mask)) as u8
}

impl ScreenCapturer for XlibScreenCapturer {
    fn capture(&self) -> Result<Bitmap, CaptureError> {
        let guard = self.display.lock().unwrap_or_else(PoisonError::into_inner);
        let display = guard.0;

        // SAFETY: `display` is live and guarded by the mutex; the image is
        // destroyed before returning on every path.
        unsafe {
            let screen = xlib::XDefaultScreen(display);
            let root = xlib::XRootWindow(display, screen);
            let width = xlib::XDisplayWidth(display, screen).max(0) as u32;
            let height = xlib::XDisplayHeight(display, screen).max(0) as u32;

            let image = xlib::XGetImage(
                display,
                root,
                0,
                0,
                width,
                height,
                xlib::XAllPlanes(),
                xlib::ZPixmap,
            );
            if image.is_null() {
                return Err(CaptureError::Platform("XGetImage returned null".into()));
            }

            let img = &*image;
            let (red, green, blue) = (
                img.red_mask as u64,
                img.green_mask as u64,
                img.blue_mask as u64,
            );
            let mut pixels = Vec::with_capacity(width as usize * height as usize * 3);

            if img.bits_per_pixel == 32 && !img.data.is_null() {
                let stride = img.bytes_per_line as usize;
                let data = std::slice::from_raw_parts(img.data as *const u8, stride * height as usize);
                for row in data.chunks_exact(stride) {
                    for px in row[..width as usize * 4].chunks_exact(4) {
                        let word = u64::from(u32::from_ne_bytes([px[0], px[1], px[2], px[3]]));
                        pixels.extend_from_slice(&[
                            channel(word, red),
                            channel(word, green),
                            channel(word, blue),
                        ]);
                    }
                }
            } else {
                for y in 0..height as i32 {
                    for x in 0..width as i32 {
                        let word = xlib::XGetPixel(image, x, y) as u64;
                        pixels.extend_from_slice(&[
                            channel(word, red),
                            channel(word, green),
                            channel(word, blue),
                        ]);
                    }
                }
            }

            xlib::XDestroyImage(image);
            Ok(Bitmap {
                width,
                height,
                pixels,
            })
        }
    }
}
