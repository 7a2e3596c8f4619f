//! Network infrastructure for the server.
//!
//! # Sub-modules
//!
//! - **`udp_server`** – The single event loop: owns the UDP socket and the
//!   dispatcher, runs the inactivity sweeper, and delivers screen frames from
//!   blocking workers.
//!
//! - **`local_ip`** – Finds the LAN address advertised in the pairing QR code.

pub mod local_ip;
pub mod udp_server;

use std::net::SocketAddr;

use thiserror::Error;

pub use local_ip::detect_lan_ip;
pub use udp_server::UdpServer;

/// Error type for the network layer.
#[derive(Debug, Error)]
pub enum NetworkError {
    /// The UDP socket could not be bound.
    #[error("failed to bind UDP socket on {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("socket error: {0}")]
    Io(#[from] std::io::Error),
}
