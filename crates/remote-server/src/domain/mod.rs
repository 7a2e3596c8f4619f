//! Domain layer for remote-server.
//!
//! The protocol, session and motion rules themselves live in `remote-core`.
//! This layer only adds the server's runtime settings, kept as plain data so
//! that tests can build a server without touching the file system or the
//! command line.

pub mod config;

pub use config::{CaptureSettings, ServerConfig};
