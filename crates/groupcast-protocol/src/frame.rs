//! Frame assembly for the send path and channel parsing for the receive path.

use std::io;
use std::str;

use groupcast_core::constants::{CHANNEL_MAXLEN, FRAGMENT_MAX_PAYLOAD};

use crate::header::{LongHeader, ShortHeader};

/// Parses a NUL-terminated channel name from the bytes following a header.
///
/// Returns the channel and the number of bytes consumed (name plus
/// terminator), or `None` when the terminator is missing within the
/// datagram, the name exceeds [`CHANNEL_MAXLEN`], or it is not valid UTF-8.
pub fn parse_channel(bytes: &[u8]) -> Option<(&str, usize)> {
    let nul = bytes.iter().position(|&b| b == 0)?;
    if nul > CHANNEL_MAXLEN {
        return None;
    }
    let channel = str::from_utf8(&bytes[..nul]).ok()?;
    Some((channel, nul + 1))
}

/// Returns the number of fragments needed to carry `payload_len` bytes on a
/// channel whose name is `channel_len` bytes.
///
/// The channel name and its terminator count against fragment 0's budget,
/// so they inflate the total.
pub fn fragment_count(channel_len: usize, payload_len: usize) -> usize {
    let total = channel_len + 1 + payload_len;
    total / FRAGMENT_MAX_PAYLOAD + usize::from(total % FRAGMENT_MAX_PAYLOAD != 0)
}

/// Serializes whole frames for transmission.
pub struct FrameEncoder;

impl FrameEncoder {
    /// Appends a complete short frame to `buffer`: header, NUL-terminated
    /// channel, payload.
    pub fn short_into(
        buffer: &mut Vec<u8>,
        msg_seqno: u32,
        channel: &str,
        payload: &[u8],
    ) -> io::Result<()> {
        ShortHeader { msg_seqno }.encode_into(buffer)?;
        buffer.extend_from_slice(channel.as_bytes());
        buffer.push(0);
        buffer.extend_from_slice(payload);
        Ok(())
    }
}

/// Splits one message into a train of long frames.
///
/// Fragment 0 carries the channel name ahead of its payload chunk; the
/// header's `fragment_offset` and `msg_size` fields measure raw payload
/// bytes only. Every frame shares the message's sequence number.
pub struct Fragmenter<'a> {
    msg_seqno: u32,
    channel: &'a str,
    payload: &'a [u8],
    offset: usize,
    next_fragment: u16,
    fragments_in_msg: u16,
}

impl<'a> Fragmenter<'a> {
    /// Creates a fragmenter for one message.
    ///
    /// The caller is responsible for checking that the message needs at most
    /// 65535 fragments; see [`fragment_count`].
    pub fn new(msg_seqno: u32, channel: &'a str, payload: &'a [u8]) -> Self {
        Self {
            msg_seqno,
            channel,
            payload,
            offset: 0,
            next_fragment: 0,
            fragments_in_msg: fragment_count(channel.len(), payload.len()) as u16,
        }
    }

    /// Returns the total number of frames this message fragments into.
    pub fn fragments_in_msg(&self) -> u16 {
        self.fragments_in_msg
    }

    /// Appends the next frame to `buffer`.
    ///
    /// Returns `Ok(false)` without touching the buffer once every fragment
    /// has been emitted.
    pub fn next_into(&mut self, buffer: &mut Vec<u8>) -> io::Result<bool> {
        if self.next_fragment >= self.fragments_in_msg {
            return Ok(false);
        }
        LongHeader {
            msg_seqno: self.msg_seqno,
            msg_size: self.payload.len() as u32,
            fragment_offset: self.offset as u32,
            fragment_no: self.next_fragment,
            fragments_in_msg: self.fragments_in_msg,
        }
        .encode_into(buffer)?;

        let budget = if self.next_fragment == 0 {
            buffer.extend_from_slice(self.channel.as_bytes());
            buffer.push(0);
            FRAGMENT_MAX_PAYLOAD - (self.channel.len() + 1)
        } else {
            FRAGMENT_MAX_PAYLOAD
        };
        let chunk = budget.min(self.payload.len() - self.offset);
        buffer.extend_from_slice(&self.payload[self.offset..self.offset + chunk]);
        self.offset += chunk;
        self.next_fragment += 1;
        Ok(true)
    }
}
