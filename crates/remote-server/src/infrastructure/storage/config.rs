//! TOML-based configuration for the server.
//!
//! The file is looked up at:
//! - an explicit `--config <path>`, or else
//! - Windows:  `%APPDATA%\RemoteServer\config.toml`
//! - Linux:    `$XDG_CONFIG_HOME/remote-server/config.toml` (or `~/.config/...`)
//! - macOS:    `~/Library/Application Support/RemoteServer/config.toml`
//!
//! A missing platform file simply means "all defaults".  Every field has a
//! serde default, so a file only needs the values it changes:
//!
//! ```toml
//! [network]
//! udp_port = 9000
//!
//! [session]
//! policy = "replace"
//! inactivity_timeout_secs = 300
//!
//! [capture]
//! jpeg_quality = 70
//! ```
//!
//! # Layering
//!
//! `main.rs` applies command-line flags on top of the loaded [`AppConfig`],
//! then calls [`AppConfig::validate`] and [`AppConfig::to_server_config`].

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;

use remote_core::domain::pairing::DEFAULT_CODE_LENGTH;
use remote_core::{MotionConfig, SessionPolicy};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::config::{DEFAULT_HTTP_PORT, DEFAULT_MAX_DATAGRAM_BYTES, DEFAULT_UDP_PORT};
use crate::domain::{CaptureSettings, ServerConfig};

/// Error type for configuration file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The platform config directory could not be determined.
    #[error("could not determine platform config directory")]
    NoPlatformConfigDir,

    /// A file system I/O error occurred.
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value is outside its allowed range.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

// ── Config schema types ───────────────────────────────────────────────────────

/// Top-level configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerSection,
    #[serde(default)]
    pub network: NetworkSection,
    #[serde(default)]
    pub session: SessionSection,
    #[serde(default)]
    pub motion: MotionSection,
    #[serde(default)]
    pub capture: CaptureSection,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerSection {
    /// `tracing` level used when `RUST_LOG` is not set.
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Length of the generated pairing code.
    #[serde(default = "default_code_length")]
    pub pairing_code_length: usize,
    /// Fixed pairing code instead of a random one (A–Z, 0–9).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pairing_code: Option<String>,
    /// Never touch the real desktop; use the virtual backends.
    #[serde(default)]
    pub headless: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NetworkSection {
    /// Address all listeners bind to.  `0.0.0.0` means every interface.
    #[serde(default = "default_bind_address")]
    pub bind_address: IpAddr,
    #[serde(default = "default_udp_port")]
    pub udp_port: u16,
    #[serde(default = "default_http_port")]
    pub http_port: u16,
    /// Serve the pairing page over HTTP.
    #[serde(default = "default_true")]
    pub pairing_page: bool,
    /// Frames larger than this are split into chunks.
    #[serde(default = "default_max_datagram_bytes")]
    pub max_datagram_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionSection {
    #[serde(default = "default_inactivity_timeout_secs")]
    pub inactivity_timeout_secs: u64,
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
    /// `"reject"` or `"replace"`.
    #[serde(default)]
    pub policy: SessionPolicy,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MotionSection {
    #[serde(default = "default_deadzone")]
    pub deadzone: f64,
    #[serde(default = "default_base_sensitivity")]
    pub base_sensitivity: f64,
    #[serde(default = "default_speed_multiplier")]
    pub speed_multiplier: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CaptureSection {
    #[serde(default = "default_scale_factor")]
    pub scale_factor: f32,
    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: u8,
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_log_level() -> String {
    "info".to_string()
}
fn default_code_length() -> usize {
    DEFAULT_CODE_LENGTH
}
fn default_true() -> bool {
    true
}
fn default_bind_address() -> IpAddr {
    IpAddr::V4(Ipv4Addr::UNSPECIFIED)
}
fn default_udp_port() -> u16 {
    DEFAULT_UDP_PORT
}
fn default_http_port() -> u16 {
    DEFAULT_HTTP_PORT
}
fn default_max_datagram_bytes() -> usize {
    DEFAULT_MAX_DATAGRAM_BYTES
}
fn default_inactivity_timeout_secs() -> u64 {
    600
}
fn default_sweep_interval_secs() -> u64 {
    60
}
fn default_deadzone() -> f64 {
    MotionConfig::default().deadzone
}
fn default_base_sensitivity() -> f64 {
    MotionConfig::default().base_sensitivity
}
fn default_speed_multiplier() -> f64 {
    MotionConfig::default().speed_multiplier
}
fn default_scale_factor() -> f32 {
    CaptureSettings::default().scale_factor
}
fn default_jpeg_quality() -> u8 {
    CaptureSettings::default().jpeg_quality
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            pairing_code_length: default_code_length(),
            pairing_code: None,
            headless: false,
        }
    }
}

impl Default for NetworkSection {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            udp_port: default_udp_port(),
            http_port: default_http_port(),
            pairing_page: default_true(),
            max_datagram_bytes: default_max_datagram_bytes(),
        }
    }
}

impl Default for SessionSection {
    fn default() -> Self {
        Self {
            inactivity_timeout_secs: default_inactivity_timeout_secs(),
            sweep_interval_secs: default_sweep_interval_secs(),
            policy: SessionPolicy::default(),
        }
    }
}

impl Default for MotionSection {
    fn default() -> Self {
        Self {
            deadzone: default_deadzone(),
            base_sensitivity: default_base_sensitivity(),
            speed_multiplier: default_speed_multiplier(),
        }
    }
}

impl Default for CaptureSection {
    fn default() -> Self {
        Self {
            scale_factor: default_scale_factor(),
            jpeg_quality: default_jpeg_quality(),
        }
    }
}

// ── Validation and conversion ─────────────────────────────────────────────────

/// Smallest accepted `max_datagram_bytes`; below this a frame would need
/// thousands of chunks.
const MIN_DATAGRAM_BYTES: usize = 1024;

impl AppConfig {
    /// Rejects values outside their allowed ranges.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Invalid`] naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: String| Err(ConfigError::Invalid(msg));

        if !(1..=100).contains(&self.capture.jpeg_quality) {
            return invalid(format!(
                "capture.jpeg_quality must be 1-100, got {}",
                self.capture.jpeg_quality
            ));
        }
        let scale = self.capture.scale_factor;
        if !(scale > 0.0 && scale <= 1.0) {
            return invalid(format!("capture.scale_factor must be in (0, 1], got {scale}"));
        }
        if self.session.inactivity_timeout_secs == 0 {
            return invalid("session.inactivity_timeout_secs must be positive".into());
        }
        if self.session.sweep_interval_secs == 0 {
            return invalid("session.sweep_interval_secs must be positive".into());
        }
        if !(self.motion.deadzone >= 0.0) {
            return invalid(format!(
                "motion.deadzone must not be negative, got {}",
                self.motion.deadzone
            ));
        }
        if !(self.motion.base_sensitivity > 0.0) {
            return invalid("motion.base_sensitivity must be positive".into());
        }
        if !(self.motion.speed_multiplier > 0.0) {
            return invalid("motion.speed_multiplier must be positive".into());
        }
        if self.network.max_datagram_bytes < MIN_DATAGRAM_BYTES {
            return invalid(format!(
                "network.max_datagram_bytes must be at least {MIN_DATAGRAM_BYTES}"
            ));
        }
        Ok(())
    }

    /// Builds the runtime configuration.  Call [`validate`](Self::validate)
    /// first.
    pub fn to_server_config(&self) -> ServerConfig {
        let ip = self.network.bind_address;
        ServerConfig {
            udp_bind_addr: SocketAddr::new(ip, self.network.udp_port),
            http_bind_addr: self
                .network
                .pairing_page
                .then(|| SocketAddr::new(ip, self.network.http_port)),
            pairing_code_length: self.server.pairing_code_length,
            session_policy: self.session.policy,
            inactivity_timeout: Duration::from_secs(self.session.inactivity_timeout_secs),
            sweep_interval: Duration::from_secs(self.session.sweep_interval_secs),
            motion: MotionConfig {
                deadzone: self.motion.deadzone,
                base_sensitivity: self.motion.base_sensitivity,
                speed_multiplier: self.motion.speed_multiplier,
            },
            capture: CaptureSettings {
                scale_factor: self.capture.scale_factor,
                jpeg_quality: self.capture.jpeg_quality,
            },
            max_datagram_bytes: self.network.max_datagram_bytes,
        }
    }
}

// ── Config loading ────────────────────────────────────────────────────────────

/// Resolves the full path of the platform config file.
///
/// # Errors
///
/// [`ConfigError::NoPlatformConfigDir`] if the base directory is unknown.
pub fn config_file_path() -> Result<PathBuf, ConfigError> {
    platform_config_dir()
        .map(|dir| dir.join("config.toml"))
        .ok_or(ConfigError::NoPlatformConfigDir)
}

/// Loads the configuration.
///
/// With `Some(path)` the file must exist.  With `None` the platform file is
/// used if present; if it is absent, or no platform directory exists, the
/// defaults are returned.
///
/// # Errors
///
/// [`ConfigError::Io`] for file-system errors, [`ConfigError::Parse`] for
/// malformed TOML.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let (path, required) = match path {
        Some(p) => (p.to_path_buf(), true),
        None => match config_file_path() {
            Ok(p) => (p, false),
            Err(ConfigError::NoPlatformConfigDir) => return Ok(AppConfig::default()),
            Err(e) => return Err(e),
        },
    };

    match std::fs::read_to_string(&path) {
        Ok(content) => Ok(toml::from_str(&content)?),
        Err(e) if !required && e.kind() == std::io::ErrorKind::NotFound => {
            Ok(AppConfig::default())
        }
        Err(source) => Err(ConfigError::Io { path, source }),
    }
}

/// The platform config directory including the application subdirectory.
fn platform_config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        std::env::var_os("APPDATA").map(|p| PathBuf::from(p).join("RemoteServer"))
    }

    #[cfg(target_os = "linux")]
    {
        let base = std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))?;
        Some(base.join("remote-server"))
    }

    #[cfg(target_os = "macos")]
    {
        std::env::var_os("HOME").map(|h| {
            PathBuf::from(h)
                .join("Library")
                .join("Application Support")
                .join("RemoteServer")
        })
    }

    #[cfg(not(any(target_os = "windows", target_os = "linux", target_os = "macos")))]
    {
        None
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
