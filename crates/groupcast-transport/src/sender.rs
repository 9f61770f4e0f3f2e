//! Message transmission: the single-datagram path and the fragmenting path.
//!
//! The sequence counter and the encode scratch buffer sit behind one mutex
//! so a fragment train is never interleaved with another caller's message
//! and no two messages share a sequence number.

use std::net::{SocketAddr, UdpSocket};
use std::sync::Mutex;

use tracing::trace;

use groupcast_core::{
    constants::{
        CHANNEL_MAXLEN, FRAGMENT_MAX_PAYLOAD, MAX_FRAGMENTS, SHORT_MESSAGE_MAX_SIZE,
    },
    error::{ErrorKind, Result},
};
use groupcast_protocol::{
    frame::{fragment_count, FrameEncoder, Fragmenter},
    header::LONG_HEADER_SIZE,
};

struct SendState {
    msg_seqno: u32,
    scratch: Vec<u8>,
}

pub(crate) struct Sender {
    socket: UdpSocket,
    dest: SocketAddr,
    state: Mutex<SendState>,
}

impl Sender {
    pub fn new(socket: UdpSocket, dest: SocketAddr) -> Self {
        Self {
            socket,
            dest,
            state: Mutex::new(SendState {
                msg_seqno: 0,
                scratch: Vec::with_capacity(LONG_HEADER_SIZE + FRAGMENT_MAX_PAYLOAD),
            }),
        }
    }

    /// Publishes one message to the group, fragmenting when the channel,
    /// terminator and payload together exceed the short-framing budget.
    pub fn send(&self, channel: &str, payload: &[u8]) -> Result<()> {
        if channel.len() > CHANNEL_MAXLEN {
            return Err(ErrorKind::ChannelTooLong(channel.len()));
        }

        let mut state = self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let state = &mut *state;

        let total = channel.len() + 1 + payload.len();
        if total <= SHORT_MESSAGE_MAX_SIZE {
            state.scratch.clear();
            FrameEncoder::short_into(&mut state.scratch, state.msg_seqno, channel, payload)?;
            trace!(
                "transmitting {} byte [{}] payload ({} byte datagram)",
                payload.len(),
                channel,
                state.scratch.len()
            );
            let sent = self.socket.send_to(&state.scratch, self.dest);
            state.msg_seqno = state.msg_seqno.wrapping_add(1);
            sent?;
            return Ok(());
        }

        if fragment_count(channel.len(), payload.len()) > MAX_FRAGMENTS {
            return Err(ErrorKind::MessageTooLarge(payload.len()));
        }

        let mut fragmenter = Fragmenter::new(state.msg_seqno, channel, payload);
        trace!(
            "transmitting {} byte [{}] payload in {} fragments",
            payload.len(),
            channel,
            fragmenter.fragments_in_msg()
        );
        let result = loop {
            state.scratch.clear();
            match fragmenter.next_into(&mut state.scratch) {
                Ok(false) => break Ok(()),
                Ok(true) => {
                    // a failed fragment aborts the rest of the train
                    if let Err(error) = self.socket.send_to(&state.scratch, self.dest) {
                        break Err(ErrorKind::Io(error));
                    }
                }
                Err(error) => break Err(ErrorKind::Io(error)),
            }
        };
        // the sequence number is spent even on a partial send; reusing it
        // would corrupt a receiver holding the partial record
        state.msg_seqno = state.msg_seqno.wrapping_add(1);
        result
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use groupcast_protocol::header::{
        frame_kind, FrameKind, LongHeader, ShortHeader, SHORT_HEADER_SIZE,
    };

    use super::*;

    fn sender_and_sink() -> (Sender, UdpSocket) {
        let sink = UdpSocket::bind("127.0.0.1:0").unwrap();
        sink.set_read_timeout(Some(Duration::from_secs(2))).unwrap();
        let socket = UdpSocket::bind("127.0.0.1:0").unwrap();
        let dest = sink.local_addr().unwrap();
        (Sender::new(socket, dest), sink)
    }

    fn read_datagram(sink: &UdpSocket) -> Vec<u8> {
        let mut buffer = vec![0u8; 65535];
        let (size, _) = sink.recv_from(&mut buffer).unwrap();
        buffer.truncate(size);
        buffer
    }

    #[test]
    fn test_short_send_produces_one_datagram() {
        let (sender, sink) = sender_and_sink();
        sender.send("FOO", &[1, 2, 3]).unwrap();

        let datagram = read_datagram(&sink);
        assert_eq!(frame_kind(&datagram), Some(FrameKind::Short));
        let header = ShortHeader::decode(&datagram).unwrap();
        assert_eq!(header.msg_seqno, 0);
        assert_eq!(&datagram[SHORT_HEADER_SIZE..], b"FOO\0\x01\x02\x03");
    }

    #[test]
    fn test_sequence_number_advances_per_message() {
        let (sender, sink) = sender_and_sink();
        sender.send("A", &[0]).unwrap();
        sender.send("A", &[0]).unwrap();

        let first = ShortHeader::decode(&read_datagram(&sink)).unwrap();
        let second = ShortHeader::decode(&read_datagram(&sink)).unwrap();
        assert_eq!(first.msg_seqno, 0);
        assert_eq!(second.msg_seqno, 1);
    }

    #[test]
    fn test_large_send_fragments() {
        let (sender, sink) = sender_and_sink();
        let payload = vec![9u8; 10_000];
        sender.send("X", &payload).unwrap();

        let mut headers = Vec::new();
        for _ in 0..8 {
            let datagram = read_datagram(&sink);
            assert_eq!(frame_kind(&datagram), Some(FrameKind::Long));
            headers.push(LongHeader::decode(&datagram).unwrap());
        }
        assert!(headers.iter().all(|header| header.msg_seqno == 0));
        assert!(headers.iter().all(|header| header.fragments_in_msg == 8));
        assert!(headers.iter().all(|header| header.msg_size == 10_000));
        // a following short message uses the next sequence number
        sender.send("X", &[1]).unwrap();
        let short = ShortHeader::decode(&read_datagram(&sink)).unwrap();
        assert_eq!(short.msg_seqno, 1);
    }

    #[test]
    fn test_channel_too_long_is_refused() {
        let (sender, _sink) = sender_and_sink();
        let channel = "a".repeat(CHANNEL_MAXLEN + 1);
        assert!(matches!(
            sender.send(&channel, &[0]),
            Err(ErrorKind::ChannelTooLong(_))
        ));
        // the boundary length is still fine
        let channel = "a".repeat(CHANNEL_MAXLEN);
        sender.send(&channel, &[0]).unwrap();
    }
}
