//! Server runtime configuration.
//!
//! [`ServerConfig`] is the single source of truth for every runtime setting.
//! `main.rs` builds it from the TOML file plus command-line overrides (see
//! `infrastructure::storage::config`); tests build it from
//! [`ServerConfig::default`] and tweak single fields.

use std::net::SocketAddr;
use std::time::Duration;

use remote_core::domain::pairing::DEFAULT_CODE_LENGTH;
use remote_core::{MotionConfig, SessionPolicy};

/// Default UDP port for the datagram protocol.
pub const DEFAULT_UDP_PORT: u16 = 8080;
/// Default TCP port for the pairing page.
pub const DEFAULT_HTTP_PORT: u16 = 8081;
/// Largest `frame` datagram sent before chunking kicks in.  Stays below the
/// 65 507-byte IPv4 UDP payload limit with room to spare.
pub const DEFAULT_MAX_DATAGRAM_BYTES: usize = 60_000;

/// Screen frame pipeline settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CaptureSettings {
    /// Factor applied to both dimensions before encoding, in `(0, 1]`.
    pub scale_factor: f32,
    /// JPEG quality, `1..=100`.
    pub jpeg_quality: u8,
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self {
            scale_factor: 0.5,
            jpeg_quality: 50,
        }
    }
}

/// All runtime configuration for the server.
///
/// # Example
///
/// ```rust
/// use remote_server::domain::ServerConfig;
///
/// let cfg = ServerConfig::default();
/// assert_eq!(cfg.udp_bind_addr.port(), 8080);
/// assert_eq!(cfg.inactivity_timeout.as_secs(), 600);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    /// Address of the UDP socket clients send datagrams to.
    pub udp_bind_addr: SocketAddr,

    /// Address of the pairing page, or `None` to disable it.
    pub http_bind_addr: Option<SocketAddr>,

    /// Length of the generated pairing code.
    pub pairing_code_length: usize,

    /// What a valid AUTH from a second endpoint does to a live session.
    pub session_policy: SessionPolicy,

    /// A session idle for longer than this is evicted.
    pub inactivity_timeout: Duration,

    /// How often idle sessions are looked for.
    pub sweep_interval: Duration,

    pub motion: MotionConfig,

    pub capture: CaptureSettings,

    /// Upper bound on the encoded size of one `frame` datagram.
    pub max_datagram_bytes: usize,
}

impl Default for ServerConfig {
    /// | Field               | Default          |
    /// |---------------------|------------------|
    /// | udp_bind_addr       | `0.0.0.0:8080`   |
    /// | http_bind_addr      | `0.0.0.0:8081`   |
    /// | pairing_code_length | 6                |
    /// | session_policy      | reject           |
    /// | inactivity_timeout  | 600 seconds      |
    /// | sweep_interval      | 60 seconds       |
    /// | max_datagram_bytes  | 60 000           |
    fn default() -> Self {
        Self {
            udp_bind_addr: SocketAddr::from(([0, 0, 0, 0], DEFAULT_UDP_PORT)),
            http_bind_addr: Some(SocketAddr::from(([0, 0, 0, 0], DEFAULT_HTTP_PORT))),
            pairing_code_length: DEFAULT_CODE_LENGTH,
            session_policy: SessionPolicy::default(),
            inactivity_timeout: Duration::from_secs(600),
            sweep_interval: Duration::from_secs(60),
            motion: MotionConfig::default(),
            capture: CaptureSettings::default(),
            max_datagram_bytes: DEFAULT_MAX_DATAGRAM_BYTES,
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
