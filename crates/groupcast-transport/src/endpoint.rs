//! The public multicast endpoint.

use std::net::{SocketAddr, SocketAddrV4};
use std::time::Duration;

use groupcast_core::{config::Config, constants::MTU, error::Result};

use crate::message::Message;
use crate::receiver::Receiver;
use crate::sender::Sender;
use crate::socket;

/// A publish/subscribe endpoint on one UDP multicast group.
///
/// One endpoint owns both directions: [`send`] publishes to the group from
/// any thread, [`recv`] drives the single receive worker. Dropping the
/// endpoint closes both sockets and frees every in-progress reassembly.
///
/// [`send`]: Endpoint::send
/// [`recv`]: Endpoint::recv
pub struct Endpoint {
    sender: Sender,
    receiver: Receiver,
}

impl Endpoint {
    /// Joins the configured multicast group and allocates the receive-side
    /// buffers.
    ///
    /// Socket or `setsockopt` failures surface here; the transport never
    /// tries to recover from a failed construction.
    pub fn bind(config: Config) -> Result<Self> {
        let dest = SocketAddr::V4(SocketAddrV4::new(config.group, config.port));
        let send_socket = socket::multicast_send_socket(&config)?;
        let (recv_socket, kernel_rbuf_size) = socket::multicast_recv_socket(&config)?;
        Ok(Self {
            sender: Sender::new(send_socket, dest),
            receiver: Receiver::new(recv_socket, &config, kernel_rbuf_size),
        })
    }

    /// The largest message this transport will carry, in bytes.
    pub fn mtu(&self) -> usize {
        MTU
    }

    /// Publishes one message to the group.
    ///
    /// Fails with [`ErrorKind::ChannelTooLong`] or
    /// [`ErrorKind::MessageTooLarge`] on invalid input, or with the
    /// underlying socket error. Delivery is best effort either way.
    ///
    /// [`ErrorKind::ChannelTooLong`]: groupcast_core::error::ErrorKind::ChannelTooLong
    /// [`ErrorKind::MessageTooLarge`]: groupcast_core::error::ErrorKind::MessageTooLarge
    pub fn send(&self, channel: &str, payload: &[u8]) -> Result<()> {
        self.sender.send(channel, payload)
    }

    /// Delivers the next complete message, or `None` when the timeout
    /// expires first. `None` as the timeout blocks until a message arrives.
    ///
    /// The returned view borrows the endpoint's buffers and stays valid
    /// until the next call; the previous message's storage is reclaimed on
    /// entry.
    pub fn recv(&mut self, timeout: Option<Duration>) -> Result<Option<Message<'_>>> {
        self.receiver.recv(timeout)
    }

    /// Per-channel subscription hint. This transport receives everything on
    /// the group, so the call is a no-op kept for interface parity with
    /// transports that filter.
    pub fn recv_enable(&mut self, _channel: &str, _enable: bool) {}
}
