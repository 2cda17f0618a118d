//! UDP broadcast of wake payloads over local interfaces

use std::io;
use std::net::{Ipv4Addr, SocketAddrV4};
use tokio::net::UdpSocket;
use tracing::{debug, warn};
use wololo_core::InterfaceDescriptor;

use crate::error::DiscoveryError;

/// Destination port listening agents expect. Not the traditional 7/9.
pub const WAKE_PORT: u16 = 7331;

/// Per-interface outcome of one broadcast
#[derive(Debug, Default)]
pub struct BroadcastReport {
    /// Local addresses the payload was sent from
    pub sent: Vec<Ipv4Addr>,
    /// One `DiscoveryError::Network` per interface that failed
    pub failures: Vec<DiscoveryError>,
}

impl BroadcastReport {
    /// True if at least one interface was attempted and none failed
    pub fn is_complete(&self) -> bool {
        !self.sent.is_empty() && self.failures.is_empty()
    }

    pub fn attempted(&self) -> usize {
        self.sent.len() + self.failures.len()
    }
}

/// Sends a payload from every given interface to the broadcast address
#[derive(Debug, Clone)]
pub struct Broadcaster {
    port: u16,
    destination: Ipv4Addr,
}

impl Default for Broadcaster {
    fn default() -> Self {
        Self::new(WAKE_PORT)
    }
}

impl Broadcaster {
    pub fn new(port: u16) -> Self {
        Self {
            port,
            destination: Ipv4Addr::BROADCAST,
        }
    }

    /// Send to another destination instead of `255.255.255.255`
    pub fn with_destination(mut self, destination: Ipv4Addr) -> Self {
        self.destination = destination;
        self
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// One transient socket per interface. A failure on one interface is
    /// recorded and the remaining interfaces are still attempted.
    pub async fn send(&self, payload: &[u8], interfaces: &[InterfaceDescriptor]) -> BroadcastReport {
        let mut report = BroadcastReport::default();

        for iface in interfaces {
            match self.send_from(iface.address, payload).await {
                Ok(()) => {
                    debug!(interface = %iface.name, ip = %iface.address, port = self.port, "Sent wake packet");
                    report.sent.push(iface.address);
                }
                Err(source) => {
                    warn!(interface = %iface.name, ip = %iface.address, error = %source, "Failed to send wake packet");
                    report.failures.push(DiscoveryError::Network {
                        address: iface.address,
                        source,
                    });
                }
            }
        }

        report
    }

    async fn send_from(&self, local: Ipv4Addr, payload: &[u8]) -> io::Result<()> {
        let socket = UdpSocket::bind(SocketAddrV4::new(local, 0)).await?;
        socket.set_broadcast(true)?;
        set_dont_route(&socket)?;
        socket
            .send_to(payload, SocketAddrV4::new(self.destination, self.port))
            .await?;
        Ok(())
    }
}

/// Keep the datagram on directly attached networks (SO_DONTROUTE)
#[cfg(unix)]
fn set_dont_route(socket: &UdpSocket) -> io::Result<()> {
    use std::os::unix::io::AsRawFd;

    let enable: libc::c_int = 1;
    // SAFETY: the fd is owned by `socket` for the duration of the call and
    // the option value points to a live c_int of the advertised size.
    let rc = unsafe {
        libc::setsockopt(
            socket.as_raw_fd(),
            libc::SOL_SOCKET,
            libc::SO_DONTROUTE,
            &enable as *const libc::c_int as *const libc::c_void,
            std::mem::size_of::<libc::c_int>() as libc::socklen_t,
        )
    };
    if rc == 0 {
        Ok(())
    } else {
        Err(io::Error::last_os_error())
    }
}

#[cfg(not(unix))]
fn set_dont_route(_socket: &UdpSocket) -> io::Result<()> {
    Ok(())
}
