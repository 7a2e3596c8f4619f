//! FrameProducer: screen capture → downscale → JPEG → base64.
//!
//! Frames are pull-only: the server produces one only in answer to a
//! `request_frame` from an authenticated client.  The whole pipeline is
//! CPU-bound and blocking, so the server runs [`FrameProducer::produce`] on a
//! blocking worker thread and never on the event loop itself.
//!
//! # Pipeline
//!
//! ```text
//! ScreenCapturer::capture()      RGB8 bitmap, full resolution
//!        │
//!        ▼
//! resize × scale_factor          Lanczos3, skipped at scale 1.0
//!        │
//!        ▼
//! JPEG @ jpeg_quality            `image` crate encoder
//!        │
//!        ▼
//! base64 text                    handed to the server for chunking
//! ```

use std::sync::Arc;

use image::codecs::jpeg::JpegEncoder;
use image::imageops::{self, FilterType};
use image::{ImageError, RgbImage};
use remote_core::encode_base64;
use thiserror::Error;
use tracing::debug;

use crate::domain::CaptureSettings;

/// Error type for screen capture backends.
#[derive(Debug, Error)]
pub enum CaptureError {
    /// No usable backend (for example no X display).
    #[error("screen capture unavailable: {0}")]
    Unavailable(String),

    /// The OS call failed.
    #[error("platform error: {0}")]
    Platform(String),
}

/// Error type for the whole frame pipeline.
#[derive(Debug, Error)]
pub enum FrameError {
    #[error(transparent)]
    Capture(#[from] CaptureError),

    /// The capturer returned a pixel buffer that does not match its size.
    #[error("bitmap has {actual} bytes, expected {expected} for {width}x{height} RGB")]
    BadBitmap {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },

    #[error("JPEG encoding failed: {0}")]
    Encode(#[from] ImageError),
}

/// A captured screen in 8-bit RGB, row-major, no padding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bitmap {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

/// Platform-agnostic screen capture capability.
pub trait ScreenCapturer: Send + Sync {
    /// Grabs the primary display.
    fn capture(&self) -> Result<Bitmap, CaptureError>;
}

/// The Produce Frame use case.
#[derive(Clone)]
pub struct FrameProducer {
    capturer: Arc<dyn ScreenCapturer>,
    settings: CaptureSettings,
}

impl FrameProducer {
    pub fn new(capturer: Arc<dyn ScreenCapturer>, settings: CaptureSettings) -> Self {
        Self { capturer, settings }
    }

    pub fn settings(&self) -> CaptureSettings {
        self.settings
    }

    /// Captures, scales and encodes one frame, returning base64 JPEG text.
    ///
    /// Blocking; call from a blocking worker.
    ///
    /// # Errors
    ///
    /// Any [`FrameError`]; no partial output is produced.
    pub fn produce(&self) -> Result<String, FrameError> {
        let bitmap = self.capturer.capture()?;
        let jpeg = encode_jpeg(bitmap, self.settings)?;
        debug!(jpeg_bytes = jpeg.len(), "frame encoded");
        Ok(encode_base64(&jpeg))
    }
}

/// Returns the dimensions after applying `scale_factor`, never below 1×1.
pub fn scaled_dimensions(width: u32, height: u32, scale_factor: f32) -> (u32, u32) {
    let scale = |v: u32| ((v as f32 * scale_factor) as u32).max(1);
    (scale(width), scale(height))
}

/// Downscales `bitmap` and encodes it as JPEG.
///
/// # Errors
///
/// [`FrameError::BadBitmap`] if the pixel buffer does not match the
/// dimensions, [`FrameError::Encode`] if the JPEG encoder fails.
pub fn encode_jpeg(bitmap: Bitmap, settings: CaptureSettings) -> Result<Vec<u8>, FrameError> {
    let Bitmap {
        width,
        height,
        pixels,
    } = bitmap;
    let expected = width as usize * height as usize * 3;
    let actual = pixels.len();
    let image = RgbImage::from_raw(width, height, pixels).ok_or(FrameError::BadBitmap {
        width,
        height,
        expected,
        actual,
    })?;

    let (target_w, target_h) = scaled_dimensions(width, height, settings.scale_factor);
    let image = if (target_w, target_h) == (width, height) {
        image
    } else {
        imageops::resize(&image, target_w, target_h, FilterType::Lanczos3)
    };

    let mut jpeg = Vec::new();
    JpegEncoder::new_with_quality(&mut jpeg, settings.jpeg_quality).encode_image(&image)?;
    Ok(jpeg)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
