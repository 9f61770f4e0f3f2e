//! Datagram ingest and message reassembly.
//!
//! One receive iteration pulls a single datagram from the kernel into a
//! scratch region of the ring arena, classifies it by magic, and either
//! finalizes a short message in place or folds a fragment into the sender's
//! reassembly record. A completed message is parked on the receiver until
//! the next `recv` call retires it, which is when its arena region (if any)
//! goes back to the ring.

use std::io;
use std::net::{SocketAddr, UdpSocket};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use tracing::{debug, warn};

use groupcast_core::{
    config::Config,
    constants::{MAX_DATAGRAM_SIZE, MTU},
    error::Result,
    packet_pool::{PacketPool, ScratchPacket},
    ring_buffer::RingBuffer,
};
use groupcast_protocol::{
    frame::parse_channel,
    header::{frame_kind, FrameKind, LongHeader, LONG_HEADER_SIZE, SHORT_HEADER_SIZE},
};

use crate::fragment_table::{FragmentBuffer, FragmentTable};
use crate::message::{Assembled, Backing, Message};
use crate::statistics::ReceiveStats;

/// Kernel receive buffers below this are suspiciously small for fragmented
/// traffic; one warning is emitted when a large message meets one.
const SMALL_KERNEL_RBUF: usize = 262145;

fn timestamp_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_micros() as i64)
        .unwrap_or(0)
}

fn is_would_block(error: &io::Error) -> bool {
    matches!(error.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut)
}

pub(crate) struct Receiver {
    socket: UdpSocket,
    ring: RingBuffer,
    pool: PacketPool,
    table: FragmentTable,
    stats: ReceiveStats,
    /// Scratch packet bound to an arena region while a datagram (or a whole
    /// fragment train) is in flight.
    inflight: Option<ScratchPacket>,
    /// Completed message parked until the caller asks for the next one.
    current: Option<Assembled>,
    kernel_rbuf_size: usize,
    warned_small_kernel_buf: bool,
}

impl Receiver {
    pub fn new(socket: UdpSocket, config: &Config, kernel_rbuf_size: usize) -> Self {
        Self {
            socket,
            ring: RingBuffer::new(config.ringbuf_capacity),
            pool: PacketPool::with_depth(config.recv_slots),
            table: FragmentTable::new(config.max_frag_buf_total_size, config.max_frag_bufs),
            stats: ReceiveStats::new(),
            inflight: None,
            current: None,
            kernel_rbuf_size,
            warned_small_kernel_buf: false,
        }
    }

    /// Delivers the next complete message, or `None` on timeout.
    ///
    /// The previously delivered message is retired on entry: its arena
    /// region is released and its scratch storage reused.
    pub fn recv(&mut self, timeout: Option<Duration>) -> Result<Option<Message<'_>>> {
        self.retire_current();

        self.stats.observe_buffer(self.ring.free_fraction());
        self.stats.maybe_report();

        let deadline = timeout.map(|timeout| Instant::now() + timeout);
        loop {
            if !self.read_one(deadline)? {
                return Ok(None);
            }
            if self.current.is_some() {
                return Ok(self.current_message());
            }
        }
    }

    /// Releases the resources of the message delivered by the previous call.
    fn retire_current(&mut self) {
        if let Some(message) = self.current.take() {
            if let Backing::Ring(region) = message.backing {
                self.ring.release(region);
            }
        }
    }

    /// Builds the caller-facing view of the parked message.
    fn current_message(&self) -> Option<Message<'_>> {
        let message = self.current.as_ref()?;
        let buffer = match &message.backing {
            Backing::Ring(region) => self.ring.get(region),
            Backing::Heap(data) => data.as_slice(),
        };
        Some(Message {
            channel: &message.channel,
            data: &buffer[message.data_offset..message.data_offset + message.data_size],
            recv_utime: message.recv_utime,
            from: message.from,
        })
    }

    /// Checks a scratch packet out of the pool and backs it with a
    /// maximum-datagram-sized arena region.
    fn checkout_scratch(&mut self) -> Option<ScratchPacket> {
        let mut packet = self.pool.checkout()?;
        match self.ring.reserve(MAX_DATAGRAM_SIZE) {
            Some(region) => {
                packet.region = Some(region);
                Some(packet)
            }
            None => {
                self.pool.checkin(packet);
                None
            }
        }
    }

    /// Reads and processes one datagram. Returns `Ok(false)` when the
    /// deadline expired before anything arrived.
    fn read_one(&mut self, deadline: Option<Instant>) -> Result<bool> {
        let timeout = match deadline {
            Some(deadline) => {
                let now = Instant::now();
                if now >= deadline {
                    return Ok(false);
                }
                Some(deadline - now)
            }
            None => None,
        };
        self.socket.set_read_timeout(timeout)?;

        if self.inflight.is_none() {
            self.inflight = self.checkout_scratch();
        }
        if self.inflight.is_none() {
            // no scratch packet or no arena space: consume one datagram from
            // the kernel and drop it
            let mut sink = [0u8; 1];
            return match self.socket.recv_from(&mut sink) {
                Ok(_) => {
                    self.stats.discarded_bad += 1;
                    Ok(true)
                }
                Err(error) if is_would_block(&error) => Ok(false),
                Err(error) => {
                    warn!("recv failed: {}", error);
                    self.stats.discarded_bad += 1;
                    Ok(true)
                }
            };
        }

        let received = {
            let packet = self.inflight.as_ref().expect("scratch packet vanished");
            let region = packet.region.as_ref().expect("scratch packet without region");
            self.socket.recv_from(self.ring.get_mut(region))
        };
        match received {
            Ok((size, from)) => {
                let utime = timestamp_now();
                let packet = self.inflight.as_mut().expect("scratch packet vanished");
                packet.size = size;
                packet.from = Some(from);
                packet.recv_utime = utime;
                self.process_datagram(size, utime, from);
                Ok(true)
            }
            Err(error) if is_would_block(&error) => Ok(false),
            Err(error) => {
                warn!("recv failed: {}", error);
                self.stats.discarded_bad += 1;
                Ok(true)
            }
        }
    }

    /// Classifies the datagram sitting in the in-flight region and runs the
    /// matching completion path.
    fn process_datagram(&mut self, size: usize, utime: i64, from: SocketAddr) {
        if size < SHORT_HEADER_SIZE {
            // too short to carry any header
            self.stats.discarded_bad += 1;
            return;
        }
        let kind = {
            let datagram = self.inflight_datagram(size);
            frame_kind(datagram)
        };
        match kind {
            Some(FrameKind::Short) => self.finish_short(size, utime, from),
            Some(FrameKind::Long) => self.handle_fragment(size, utime, from),
            None => {
                debug!("bad magic");
                self.stats.discarded_bad += 1;
            }
        }
    }

    /// The bytes of the datagram most recently read into the in-flight
    /// region.
    fn inflight_datagram(&self, size: usize) -> &[u8] {
        let packet = self.inflight.as_ref().expect("no in-flight packet");
        let region = packet.region.as_ref().expect("in-flight packet without region");
        &self.ring.get(region)[..size]
    }

    /// Short-message path: the datagram is the whole message, finalized in
    /// place inside the arena.
    fn finish_short(&mut self, size: usize, utime: i64, from: SocketAddr) {
        let parsed = parse_channel(&self.inflight_datagram(size)[SHORT_HEADER_SIZE..])
            .map(|(channel, consumed)| (channel.to_owned(), SHORT_HEADER_SIZE + consumed));
        let Some((channel, data_offset)) = parsed else {
            debug!("bad channel name");
            self.stats.discarded_bad += 1;
            return;
        };

        let mut packet = self.inflight.take().expect("no in-flight packet");
        let mut region = packet.region.take().expect("in-flight packet without region");
        // keep only the bytes the datagram actually used
        self.ring.shrink_last(&mut region, size);
        packet.reset();
        self.pool.checkin(packet);

        self.stats.udp_rx += 1;
        self.current = Some(Assembled {
            channel,
            recv_utime: utime,
            from,
            backing: Backing::Ring(region),
            data_offset,
            data_size: size - data_offset,
        });
    }

    /// Fragment path: fold the chunk into the sender's reassembly record,
    /// finalizing when the last outstanding fragment lands.
    fn handle_fragment(&mut self, size: usize, utime: i64, from: SocketAddr) {
        if size < LONG_HEADER_SIZE {
            self.stats.discarded_bad += 1;
            return;
        }
        let header = match LongHeader::decode(self.inflight_datagram(size)) {
            Ok(header) => header,
            Err(_) => {
                self.stats.discarded_bad += 1;
                return;
            }
        };

        // a fragment from a newer message invalidates whatever this sender
        // was assembling
        if let Some(index) = self.table.lookup(&from) {
            let record = self.table.get(index);
            if record.msg_seqno != header.msg_seqno || record.total_size != header.msg_size {
                let stale = self.table.remove(index);
                debug!(
                    "dropping message on [{}] ({} fragments missing)",
                    stale.channel, stale.fragments_remaining
                );
            }
        }

        if header.msg_size as usize > MTU {
            debug!("rejecting huge message ({} bytes)", header.msg_size);
            self.stats.discarded_bad += 1;
            return;
        }

        let mut data_start = LONG_HEADER_SIZE;
        let mut frag_size = size - LONG_HEADER_SIZE;

        if header.fragment_no == 0 {
            // fragment 0 carries the channel name ahead of its chunk
            let parsed = parse_channel(&self.inflight_datagram(size)[LONG_HEADER_SIZE..])
                .map(|(channel, consumed)| (channel.to_owned(), consumed));
            let Some((channel, consumed)) = parsed else {
                debug!("bad channel name");
                self.stats.discarded_bad += 1;
                return;
            };
            data_start += consumed;
            frag_size -= consumed;

            if self.table.lookup(&from).is_none() {
                if header.fragments_in_msg == 0 {
                    self.stats.discarded_bad += 1;
                    return;
                }
                let created = self.table.insert(FragmentBuffer {
                    channel,
                    from,
                    data: vec![0; header.msg_size as usize],
                    total_size: header.msg_size,
                    fragments_remaining: header.fragments_in_msg,
                    msg_seqno: header.msg_seqno,
                    first_utime: utime,
                    last_utime: utime,
                });
                if !created {
                    self.stats.discarded_bad += 1;
                    return;
                }
            }
        }

        let Some(index) = self.table.lookup(&from) else {
            // the opening fragment was missed; nothing to assemble into
            return;
        };

        if self.kernel_rbuf_size < SMALL_KERNEL_RBUF
            && header.msg_size as usize > self.kernel_rbuf_size
            && !self.warned_small_kernel_buf
        {
            self.warned_small_kernel_buf = true;
            warn!(
                "large fragmented messages are arriving but the kernel UDP receive \
                 buffer is only {} bytes; drops are likely",
                self.kernel_rbuf_size
            );
        }

        let total_size = self.table.get(index).total_size;
        if header.fragment_offset as usize + frag_size > total_size as usize {
            debug!(
                "dropping invalid fragment (off: {}, {} / {})",
                header.fragment_offset, frag_size, total_size
            );
            self.table.remove(index);
            self.stats.discarded_bad += 1;
            return;
        }

        {
            let packet = self.inflight.as_ref().expect("no in-flight packet");
            let region = packet.region.as_ref().expect("in-flight packet without region");
            let datagram = &self.ring.get(region)[..size];
            let record = self.table.get_mut(index);
            record.data[header.fragment_offset as usize..][..frag_size]
                .copy_from_slice(&datagram[data_start..data_start + frag_size]);
            record.last_utime = utime;
            record.fragments_remaining -= 1;
        }
        if self.table.get(index).fragments_remaining > 0 {
            return;
        }

        // last fragment: the record's buffer becomes the message, the
        // scratch region goes straight back to the arena
        let record = self.table.remove(index);
        let mut packet = self.inflight.take().expect("no in-flight packet");
        let region = packet.region.take().expect("in-flight packet without region");
        self.ring.release(region);
        packet.reset();
        self.pool.checkin(packet);

        self.stats.udp_rx += 1;
        self.current = Some(Assembled {
            channel: record.channel,
            recv_utime: record.first_utime,
            from: record.from,
            backing: Backing::Heap(record.data),
            data_offset: 0,
            data_size: record.total_size as usize,
        });
    }

    #[cfg(test)]
    fn inject(&mut self, datagram: &[u8], from: SocketAddr, utime: i64) -> bool {
        self.retire_current();
        if self.inflight.is_none() {
            self.inflight = self.checkout_scratch();
        }
        let Some(packet) = self.inflight.as_mut() else {
            self.stats.discarded_bad += 1;
            return false;
        };
        let region = packet.region.as_ref().expect("scratch packet without region");
        self.ring.get_mut(region)[..datagram.len()].copy_from_slice(datagram);
        self.process_datagram(datagram.len(), utime, from);
        self.current.is_some()
    }
}
