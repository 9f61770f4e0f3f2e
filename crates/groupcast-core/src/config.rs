use std::net::Ipv4Addr;

use crate::constants::{
    DEFAULT_RECV_BUFS, MAX_FRAG_BUF_TOTAL_SIZE, MAX_NUM_FRAG_BUFS, RINGBUF_SIZE,
};

#[derive(Clone, Debug)]
/// Configuration options for a multicast endpoint.
pub struct Config {
    /// IPv4 multicast group to join and publish to.
    pub group: Ipv4Addr,
    /// UDP port shared by every peer of the group.
    pub port: u16,
    /// Multicast TTL for outgoing packets. 0 keeps packets on the local
    /// host; 1 keeps them on the local network. Values above 1 traverse
    /// routers and are rarely what you want.
    pub ttl: u32,
    /// Requested kernel receive buffer size in bytes (None = system default).
    /// Corresponds to the SO_RCVBUF socket option.
    pub recv_buffer_size: Option<usize>,
    /// Capacity of the ring arena that backs in-flight datagrams.
    pub ringbuf_capacity: usize,
    /// Number of reusable scratch-packet descriptors in the receive pool.
    pub recv_slots: usize,
    /// Cap on the summed declared sizes of all in-progress reassemblies.
    pub max_frag_buf_total_size: u32,
    /// Cap on the number of in-progress reassemblies.
    pub max_frag_bufs: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            group: Ipv4Addr::new(239, 255, 76, 67),
            port: 7667,
            ttl: 0, // stay on the local host unless told otherwise
            recv_buffer_size: None,
            ringbuf_capacity: RINGBUF_SIZE,
            recv_slots: DEFAULT_RECV_BUFS,
            max_frag_buf_total_size: MAX_FRAG_BUF_TOTAL_SIZE,
            max_frag_bufs: MAX_NUM_FRAG_BUFS,
        }
    }
}
