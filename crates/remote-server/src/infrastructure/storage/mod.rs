//! Storage infrastructure: the TOML configuration file.
//!
//! The `config` sub-module reads the file from an explicit path or from the
//! platform config directory, fills in defaults for anything missing, checks
//! value ranges, and turns the result into the runtime
//! [`ServerConfig`](crate::domain::ServerConfig).

pub mod config;
