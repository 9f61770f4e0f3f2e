//! Reusable scratch-packet descriptors for the receive path.
//!
//! A [`ScratchPacket`] is the handle that carries one datagram from the
//! kernel to completion: it owns a [`Region`] of the ring arena plus the
//! sender address, receive timestamp and observed size captured at read
//! time. Descriptors live on the pool's empty queue when idle and are
//! checked out by the receive path one at a time.

use std::collections::VecDeque;
use std::net::SocketAddr;

use crate::ring_buffer::Region;

/// A reusable handle for one in-flight datagram.
#[derive(Debug, Default)]
pub struct ScratchPacket {
    /// Backing region of the ring arena, present while checked out.
    pub region: Option<Region>,
    /// Sender address of the last datagram read into the region.
    pub from: Option<SocketAddr>,
    /// Receive timestamp of the last datagram, microseconds since the epoch.
    pub recv_utime: i64,
    /// Observed size of the last datagram in bytes.
    pub size: usize,
}

impl ScratchPacket {
    /// Clears the per-datagram fields. The region, if any, is untouched.
    pub fn reset(&mut self) {
        self.from = None;
        self.recv_utime = 0;
        self.size = 0;
    }
}

/// A fixed-depth pool of scratch-packet descriptors.
#[derive(Debug)]
pub struct PacketPool {
    empty: VecDeque<ScratchPacket>,
}

impl PacketPool {
    /// Creates a pool holding `depth` descriptors.
    pub fn with_depth(depth: usize) -> Self {
        let mut empty = VecDeque::with_capacity(depth);
        for _ in 0..depth {
            empty.push_back(ScratchPacket::default());
        }
        Self { empty }
    }

    /// Checks a descriptor out of the empty queue.
    ///
    /// Returns `None` when every descriptor is already in flight; the caller
    /// treats that as buffer exhaustion and drops the datagram.
    pub fn checkout(&mut self) -> Option<ScratchPacket> {
        self.empty.pop_front()
    }

    /// Returns a descriptor to the empty queue.
    ///
    /// The descriptor must no longer hold an arena region: the region is
    /// either released or transferred to a completed message first.
    pub fn checkin(&mut self, packet: ScratchPacket) {
        assert!(
            packet.region.is_none(),
            "checked-in packet still owns an arena region"
        );
        self.empty.push_back(packet);
    }

    /// Returns the number of descriptors currently available.
    pub fn available(&self) -> usize {
        self.empty.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_depth() {
        let pool = PacketPool::with_depth(4);
        assert_eq!(pool.available(), 4);
    }

    #[test]
    fn test_checkout_and_checkin() {
        let mut pool = PacketPool::with_depth(2);

        let packet = pool.checkout().unwrap();
        assert_eq!(pool.available(), 1);

        pool.checkin(packet);
        assert_eq!(pool.available(), 2);
    }

    #[test]
    fn test_checkout_exhaustion() {
        let mut pool = PacketPool::with_depth(1);
        let packet = pool.checkout().unwrap();
        assert!(pool.checkout().is_none());
        pool.checkin(packet);
        assert!(pool.checkout().is_some());
    }

    #[test]
    fn test_reset_clears_datagram_fields() {
        let mut packet = ScratchPacket::default();
        packet.from = Some("127.0.0.1:1234".parse().unwrap());
        packet.recv_utime = 42;
        packet.size = 100;

        packet.reset();
        assert!(packet.from.is_none());
        assert_eq!(packet.recv_utime, 0);
        assert_eq!(packet.size, 0);
    }
}
