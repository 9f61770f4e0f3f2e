#![warn(missing_docs)]

//! groupcast-core: foundational types and utilities.
//!
//! This crate provides the minimal set of core utilities shared across all layers:
//! - Wire and capacity constants
//! - Configuration types
//! - Error handling
//! - Memory utilities (ring arena, scratch-packet pool)
//!
//! Protocol-specific logic lives in specialized crates:
//! - `groupcast-protocol`: header codec and frame assembly
//! - `groupcast-transport`: sockets, reassembly, the public endpoint

/// Protocol constants shared across layers.
///
/// The wire constants (magics, channel and frame size limits) must match on
/// every peer of a multicast group; the capacity constants are local defaults
/// that [`config::Config`] can override.
pub mod constants {
    /// 32-bit magic opening every single-datagram frame, network byte order.
    pub const MAGIC_SHORT: u32 = 0x4c43_3032;
    /// 32-bit magic opening every fragment frame, network byte order.
    pub const MAGIC_LONG: u32 = 0x4c43_3033;
    /// Maximum channel-name length in bytes, excluding the NUL terminator.
    pub const CHANNEL_MAXLEN: usize = 32;
    /// Upper bound on `channel + NUL + payload` for single-datagram framing.
    ///
    /// Chosen so a short frame fits a standard 1500-byte path MTU with room
    /// for the IP and UDP headers.
    pub const SHORT_MESSAGE_MAX_SIZE: usize = 1400;
    /// Per-fragment payload budget for fragmented framing. The channel name
    /// and its NUL terminator count against fragment 0's budget.
    pub const FRAGMENT_MAX_PAYLOAD: usize = 1400;
    /// Hard ceiling on the reassembled size of a fragmented message.
    ///
    /// This is the transport's advertised MTU, not the IP-level one.
    pub const MTU: usize = 1 << 20;
    /// Largest UDP datagram the receive path will accept.
    pub const MAX_DATAGRAM_SIZE: usize = 65535;
    /// Largest number of fragments a single message may be split into.
    pub const MAX_FRAGMENTS: usize = 65535;
    /// Default capacity of the receive ring arena.
    pub const RINGBUF_SIZE: usize = 2 * 1024 * 1024;
    /// Default depth of the scratch-packet pool.
    pub const DEFAULT_RECV_BUFS: usize = 16;
    /// Default cap on the summed payload sizes of all in-progress reassemblies.
    pub const MAX_FRAG_BUF_TOTAL_SIZE: u32 = 1 << 24;
    /// Default cap on the number of in-progress reassemblies.
    pub const MAX_NUM_FRAG_BUFS: usize = 1000;
}

/// Configuration options for the transport.
pub mod config;
/// Error types and results.
pub mod error;
/// Reusable scratch-packet descriptors for the receive path.
pub mod packet_pool;
/// Fixed-capacity ring arena backing in-flight datagrams.
pub mod ring_buffer;
