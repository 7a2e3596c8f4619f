//! Domain entities for the remote control server.
//!
//! This module contains pure business logic with no infrastructure dependencies.
//!
//! # What lives here? (for beginners)
//!
//! Everything in `domain` can be compiled and tested without a socket, a
//! display, or an async runtime:
//!
//! - The **pairing secret** that a phone must present before it may do
//!   anything, and the payload rendered into the QR code.
//! - The **session store**, which remembers which UDP endpoint is currently
//!   allowed to drive the host and when it was last heard from.
//! - The **motion filter**, which turns noisy gyroscope-style deltas into whole
//!   pixel moves without losing sub-pixel motion.
//!
//! Outer layers (the server's application and infrastructure modules) depend
//! on these types.  Nothing here depends on them.

/// Relative-motion filter: deadzone, acceleration curve and sub-pixel accumulator.
pub mod motion;

/// Pairing secret generation, validation, and the QR payload.
pub mod pairing;

/// Per-endpoint sessions and the single-session policy.
pub mod session;
