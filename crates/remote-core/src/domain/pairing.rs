//! Pairing secret and the payload shown to the user as a QR code.
//!
//! The pairing code is the only thing standing between a LAN neighbour and the
//! host's keyboard, so it is generated with the operating-system-seeded
//! thread RNG from the `rand` crate and never changes while the process runs.

use std::fmt;
use std::net::IpAddr;

use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Characters a pairing code may contain.
pub const CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Length of generated codes unless configured otherwise.
pub const DEFAULT_CODE_LENGTH: usize = 6;

/// Errors that can occur when building a [`PairingSecret`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PairingError {
    #[error("pairing code must not be empty")]
    Empty,

    /// The code contains a character outside `A–Z0–9`.
    #[error("pairing code contains invalid character {0:?} (allowed: A-Z, 0-9)")]
    InvalidCharacter(char),
}

/// The short random code a client must present in its `auth` message.
///
/// `Debug` output hides the code so it never leaks through `{:?}` logging;
/// use [`PairingSecret::as_str`] where the code must be shown.
#[derive(Clone, PartialEq, Eq)]
pub struct PairingSecret {
    code: String,
}

impl PairingSecret {
    /// Generates a random code of `len` characters drawn uniformly from
    /// [`CODE_ALPHABET`].  A `len` of zero is raised to one.
    pub fn generate(len: usize) -> Self {
        let mut rng = rand::thread_rng();
        let code = (0..len.max(1))
            .map(|_| CODE_ALPHABET[rng.gen_range(0..CODE_ALPHABET.len())] as char)
            .collect();
        Self { code }
    }

    /// Wraps a fixed code, for example one supplied on the command line.
    ///
    /// # Errors
    ///
    /// [`PairingError::Empty`] for an empty string and
    /// [`PairingError::InvalidCharacter`] for anything outside `A–Z0–9`.
    /// Lower-case letters are rejected rather than folded, because clients
    /// compare the code exactly.
    pub fn new(code: impl Into<String>) -> Result<Self, PairingError> {
        let code = code.into();
        if code.is_empty() {
            return Err(PairingError::Empty);
        }
        if let Some(bad) = code
            .chars()
            .find(|c| !c.is_ascii() || !CODE_ALPHABET.contains(&(*c as u8)))
        {
            return Err(PairingError::InvalidCharacter(bad));
        }
        Ok(Self { code })
    }

    /// Returns `true` if `candidate` is exactly this code.
    pub fn matches(&self, candidate: &str) -> bool {
        self.code.as_bytes() == candidate.as_bytes()
    }

    pub fn as_str(&self) -> &str {
        &self.code
    }

    pub fn len(&self) -> usize {
        self.code.len()
    }

    pub fn is_empty(&self) -> bool {
        self.code.is_empty()
    }
}

impl fmt::Debug for PairingSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PairingSecret")
            .field("len", &self.code.len())
            .finish_non_exhaustive()
    }
}

/// How to reach the server: rendered into the QR code and served as
/// `/pairing.json`.
///
/// ```json
/// {"code":"K7Q2ZP","port":8080,"ip":"192.168.1.20"}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairingPayload {
    pub code: String,
    pub port: u16,
    pub ip: IpAddr,
}

impl PairingPayload {
    pub fn new(secret: &PairingSecret, port: u16, ip: IpAddr) -> Self {
        Self {
            code: secret.as_str().to_string(),
            port,
            ip,
        }
    }

    /// Compact JSON text of the payload, as encoded into the QR code.
    ///
    /// # Errors
    ///
    /// Propagates the (practically impossible) serialization failure.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
