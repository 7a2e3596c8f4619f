//! LAN address detection.
//!
//! # How it works (for beginners)
//!
//! "Connecting" a UDP socket sends nothing on the wire; it only asks the OS
//! to pick a route to the destination.  Reading the socket's local address
//! afterwards reveals which interface, and therefore which LAN address, the
//! OS would use to reach the internet.  That is the address a phone on the
//! same network can reach.

use std::net::{IpAddr, Ipv4Addr, SocketAddr, UdpSocket};

use tracing::debug;

/// Any routable public address works; nothing is ever sent to it.
const ROUTE_PROBE: SocketAddr = SocketAddr::new(IpAddr::V4(Ipv4Addr::new(8, 8, 8, 8)), 80);

/// Returns this machine's LAN address, or `127.0.0.1` if none can be found.
pub fn detect_lan_ip() -> IpAddr {
    match probe_route() {
        Ok(ip) if !ip.is_unspecified() => ip,
        Ok(_) => IpAddr::V4(Ipv4Addr::LOCALHOST),
        Err(e) => {
            debug!("LAN address detection failed, using loopback: {e}");
            IpAddr::V4(Ipv4Addr::LOCALHOST)
        }
    }
}

fn probe_route() -> std::io::Result<IpAddr> {
    let socket = UdpSocket::bind(SocketAddr::from(([0, 0, 0, 0], 0)))?;
    socket.connect(ROUTE_PROBE)?;
    Ok(socket.local_addr()?.ip())
}
