//! Multicast socket construction.
//!
//! The transmit socket carries TTL and loopback options; the receive socket
//! binds the shared port with address reuse so several processes on one
//! host can join the same group. Both join the group so a process sees its
//! own traffic.

use std::net::{Ipv4Addr, SocketAddrV4, UdpSocket};

use socket2::{Domain, Protocol, Socket, Type};
use tracing::{debug, warn};

use groupcast_core::{config::Config, error::Result};

/// Creates the transmit socket: bound to an ephemeral port, TTL and
/// loopback applied, group joined.
pub(crate) fn multicast_send_socket(config: &Config) -> Result<UdpSocket> {
    let socket = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP))?;
    socket.bind(&SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, 0).into())?;

    let socket: UdpSocket = socket.into();
    if config.ttl == 0 {
        debug!("multicast TTL is 0, packets will not leave the local host");
    }
    socket.set_multicast_ttl_v4(config.ttl)?;
    // loopback delivery lets subscribers on the sending host hear us
    socket.set_multicast_loop_v4(true)?;
    socket.join_multicast_v4(&config.group, &Ipv4Addr::UNSPECIFIED)?;
    Ok(socket)
}

/// Creates the receive socket and returns it along with the kernel receive
/// buffer size that actually took effect.
pub(crate) fn multicast_recv_socket(config: &Config) -> Result<(UdpSocket, usize)> {
    let socket = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP))?;

    // allow other processes on this host to bind the same group and port
    socket.set_reuse_address(true)?;
    #[cfg(unix)]
    socket.set_reuse_port(true)?;

    if let Some(size) = config.recv_buffer_size {
        socket.set_recv_buffer_size(size)?;
    }
    let kernel_rbuf_size = socket.recv_buffer_size().unwrap_or(0);
    debug!("kernel receive buffer is {} bytes", kernel_rbuf_size);
    if let Some(requested) = config.recv_buffer_size {
        if kernel_rbuf_size < requested {
            warn!(
                "kernel clamped the receive buffer to {} bytes ({} requested); \
                 large messages may be dropped",
                kernel_rbuf_size, requested
            );
        }
    }

    socket.bind(&SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, config.port).into())?;

    let socket: UdpSocket = socket.into();
    socket.join_multicast_v4(&config.group, &Ipv4Addr::UNSPECIFIED)?;
    Ok((socket, kernel_rbuf_size))
}
