//! Relative-motion filter.
//!
//! The phone streams small floating-point deltas from its motion sensors.
//! Turning those straight into pixel moves has two problems:
//!
//! - Sensor noise while the phone lies still would make the pointer jitter.
//! - Most samples are smaller than one pixel, so rounding each one on its own
//!   would throw slow, deliberate motion away entirely.
//!
//! [`MotionFilter`] fixes both: a deadzone drops tiny samples, an acceleration
//! curve makes slow motion precise and fast motion quick, and an accumulator
//! keeps the fractional remainder so that many sub-pixel samples add up to
//! real movement.
//!
//! # Pipeline
//!
//! ```text
//! (dx, dy) ─► deadzone ─► accel(|d|) × speed ─► accumulate ─► truncate ─► (px, py)
//!                │                                               │
//!             discard                                keep fractional remainder
//! ```

/// Magnitude below which samples get the "precision" factor.
const PRECISION_THRESHOLD: f64 = 0.1;
/// Magnitude at and above which samples get the accelerated factor.
const FAST_THRESHOLD: f64 = 0.5;
/// Multiplier on the base sensitivity in the precision band.
const PRECISION_GAIN: f64 = 0.3;
/// Growth of the accelerated factor per unit of magnitude above [`FAST_THRESHOLD`].
const ACCELERATION_SLOPE: f64 = 0.3;
/// Upper bound on the accelerated multiplier.
const MAX_ACCELERATION: f64 = 1.5;

/// Tuning knobs for [`MotionFilter`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionConfig {
    /// Samples with both `|dx|` and `|dy|` below this are discarded.
    pub deadzone: f64,
    /// Base sensitivity the acceleration curve is built on.
    pub base_sensitivity: f64,
    /// Global speed multiplier applied after the acceleration curve.
    pub speed_multiplier: f64,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            deadzone: 0.02,
            base_sensitivity: 0.8,
            speed_multiplier: 0.5,
        }
    }
}

/// A whole-pixel pointer move produced by the filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PixelDelta {
    pub dx: i32,
    pub dy: i32,
}

impl PixelDelta {
    pub fn is_zero(self) -> bool {
        self.dx == 0 && self.dy == 0
    }
}

/// Dimensions of the primary display in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScreenSize {
    pub width: u32,
    pub height: u32,
}

impl ScreenSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Applies `delta` to `(x, y)` and clamps the result to
    /// `[0, width-1] × [0, height-1]`.
    ///
    /// A zero-sized screen clamps everything to `(0, 0)`.
    pub fn offset_clamped(&self, (x, y): (i32, i32), delta: PixelDelta) -> (i32, i32) {
        let max_x = i32::try_from(self.width.saturating_sub(1)).unwrap_or(i32::MAX);
        let max_y = i32::try_from(self.height.saturating_sub(1)).unwrap_or(i32::MAX);
        (
            x.saturating_add(delta.dx).clamp(0, max_x),
            y.saturating_add(delta.dy).clamp(0, max_y),
        )
    }
}

/// Returns the acceleration factor for a sample of the given magnitude.
///
/// | magnitude `m`   | factor                                   |
/// |-----------------|------------------------------------------|
/// | `m < 0.1`       | `base × 0.3`                             |
/// | `0.1 ≤ m < 0.5` | `base`                                   |
/// | `m ≥ 0.5`       | `base × min(1.5, 1.0 + (m − 0.5) × 0.3)` |
pub fn acceleration_factor(magnitude: f64, base_sensitivity: f64) -> f64 {
    if magnitude < PRECISION_THRESHOLD {
        base_sensitivity * PRECISION_GAIN
    } else if magnitude < FAST_THRESHOLD {
        base_sensitivity
    } else {
        let boost = 1.0 + (magnitude - FAST_THRESHOLD) * ACCELERATION_SLOPE;
        base_sensitivity * boost.min(MAX_ACCELERATION)
    }
}

/// Stateful relative-motion filter.
///
/// One filter exists per dispatcher, so the fractional remainder carries over
/// between consecutive samples from the active client.
#[derive(Debug, Clone)]
pub struct MotionFilter {
    config: MotionConfig,
    remainder: (f64, f64),
}

impl MotionFilter {
    pub fn new(config: MotionConfig) -> Self {
        Self {
            config,
            remainder: (0.0, 0.0),
        }
    }

    pub fn config(&self) -> &MotionConfig {
        &self.config
    }

    /// Current fractional remainder `(x, y)`.  Each component is always in
    /// `(-1.0, 1.0)`.
    pub fn accumulator(&self) -> (f64, f64) {
        self.remainder
    }

    /// Clears the fractional remainder.
    pub fn reset(&mut self) {
        self.remainder = (0.0, 0.0);
    }

    /// Feeds one raw sample through the filter.
    ///
    /// Returns `None` when the sample falls inside the deadzone (the
    /// accumulator is left untouched) or when the accumulated motion does not
    /// yet amount to a whole pixel on either axis.
    pub fn step(&mut self, dx: f64, dy: f64) -> Option<PixelDelta> {
        let deadzone = self.config.deadzone;
        if dx.abs() < deadzone && dy.abs() < deadzone {
            return None;
        }

        let magnitude = dx.hypot(dy);
        let factor = acceleration_factor(magnitude, self.config.base_sensitivity)
            * self.config.speed_multiplier;

        let acc_x = self.remainder.0 + dx * factor;
        let acc_y = self.remainder.1 + dy * factor;

        // Truncation toward zero keeps the remainder's sign equal to the
        // accumulated motion's sign.
        let move_x = acc_x.trunc();
        let move_y = acc_y.trunc();
        self.remainder = (acc_x - move_x, acc_y - move_y);

        let delta = PixelDelta {
            dx: move_x as i32,
            dy: move_y as i32,
        };
        (!delta.is_zero()).then_some(delta)
    }
}

impl Default for MotionFilter {
    fn default() -> Self {
        Self::new(MotionConfig::default())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
