//! Completed messages and their backing storage.

use std::net::SocketAddr;

use groupcast_core::ring_buffer::Region;

/// A complete (channel, payload) record delivered by the receive path.
///
/// The view borrows the endpoint's buffers: a short message's payload still
/// lives inside the ring arena, a reassembled one in the heap buffer the
/// fragments were gathered into. Either way the storage stays valid until
/// the next `recv` call, which the borrow makes impossible to outlive.
#[derive(Debug)]
pub struct Message<'a> {
    pub(crate) channel: &'a str,
    pub(crate) data: &'a [u8],
    pub(crate) recv_utime: i64,
    pub(crate) from: SocketAddr,
}

impl<'a> Message<'a> {
    /// The channel the message was published on.
    pub fn channel(&self) -> &'a str {
        self.channel
    }

    /// The payload bytes.
    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    /// Receipt time of the message's first datagram, in microseconds since
    /// the Unix epoch.
    pub fn recv_utime(&self) -> i64 {
        self.recv_utime
    }

    /// Address of the sending socket.
    pub fn from(&self) -> SocketAddr {
        self.from
    }
}

/// Storage behind a completed message.
#[derive(Debug)]
pub(crate) enum Backing {
    /// The message completed in place inside the ring arena (short path).
    /// The region is released when the message is retired.
    Ring(Region),
    /// The message owns the heap buffer its fragments were gathered into.
    Heap(Vec<u8>),
}

/// A completed message held by the receiver until the caller moves on.
#[derive(Debug)]
pub(crate) struct Assembled {
    pub channel: String,
    pub recv_utime: i64,
    pub from: SocketAddr,
    pub backing: Backing,
    pub data_offset: usize,
    pub data_size: usize,
}
