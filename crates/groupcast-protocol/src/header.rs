//! Decoding and serialization of the two datagram headers.
//!
//! All multi-byte fields are network byte order. The codec never touches
//! anything past the header bytes; channel and payload handling live in
//! [`crate::frame`].

use std::io::{self, Cursor};

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};

use groupcast_core::constants::{MAGIC_LONG, MAGIC_SHORT};

/// Size of the short header in bytes: magic + sequence number.
pub const SHORT_HEADER_SIZE: usize = 8;
/// Size of the long header in bytes.
pub const LONG_HEADER_SIZE: usize = 20;

/// The frame type identified by a datagram's leading magic.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameKind {
    /// Single-datagram message.
    Short,
    /// One fragment of a multi-datagram message.
    Long,
}

/// Reads the leading magic and classifies the datagram.
///
/// Returns `None` for truncated datagrams and unknown magics alike; the
/// caller counts both as discards.
pub fn frame_kind(datagram: &[u8]) -> Option<FrameKind> {
    let mut cursor = Cursor::new(datagram);
    match cursor.read_u32::<BigEndian>().ok()? {
        MAGIC_SHORT => Some(FrameKind::Short),
        MAGIC_LONG => Some(FrameKind::Long),
        _ => None,
    }
}

/// Header of a single-datagram message.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ShortHeader {
    /// Rolling per-sender message sequence number.
    pub msg_seqno: u32,
}

impl ShortHeader {
    /// Decodes a short header from the start of a datagram.
    pub fn decode(datagram: &[u8]) -> io::Result<Self> {
        let mut cursor = Cursor::new(datagram);
        let magic = cursor.read_u32::<BigEndian>()?;
        if magic != MAGIC_SHORT {
            return Err(io::Error::new(io::ErrorKind::InvalidData, "bad short-frame magic"));
        }
        let msg_seqno = cursor.read_u32::<BigEndian>()?;
        Ok(Self { msg_seqno })
    }

    /// Appends the encoded header to `buffer`.
    pub fn encode_into(&self, buffer: &mut Vec<u8>) -> io::Result<()> {
        buffer.write_u32::<BigEndian>(MAGIC_SHORT)?;
        buffer.write_u32::<BigEndian>(self.msg_seqno)?;
        Ok(())
    }
}

/// Header of one fragment of a multi-datagram message.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LongHeader {
    /// Sequence number shared by every fragment of the message.
    pub msg_seqno: u32,
    /// Total payload size across all fragments, excluding the channel name.
    pub msg_size: u32,
    /// Byte offset of this fragment's chunk within the full payload.
    pub fragment_offset: u32,
    /// Index of this fragment, starting at 0.
    pub fragment_no: u16,
    /// Total number of fragments in the message.
    pub fragments_in_msg: u16,
}

impl LongHeader {
    /// Decodes a long header from the start of a datagram.
    pub fn decode(datagram: &[u8]) -> io::Result<Self> {
        let mut cursor = Cursor::new(datagram);
        let magic = cursor.read_u32::<BigEndian>()?;
        if magic != MAGIC_LONG {
            return Err(io::Error::new(io::ErrorKind::InvalidData, "bad long-frame magic"));
        }
        let msg_seqno = cursor.read_u32::<BigEndian>()?;
        let msg_size = cursor.read_u32::<BigEndian>()?;
        let fragment_offset = cursor.read_u32::<BigEndian>()?;
        let fragment_no = cursor.read_u16::<BigEndian>()?;
        let fragments_in_msg = cursor.read_u16::<BigEndian>()?;
        Ok(Self { msg_seqno, msg_size, fragment_offset, fragment_no, fragments_in_msg })
    }

    /// Appends the encoded header to `buffer`.
    pub fn encode_into(&self, buffer: &mut Vec<u8>) -> io::Result<()> {
        buffer.write_u32::<BigEndian>(MAGIC_LONG)?;
        buffer.write_u32::<BigEndian>(self.msg_seqno)?;
        buffer.write_u32::<BigEndian>(self.msg_size)?;
        buffer.write_u32::<BigEndian>(self.fragment_offset)?;
        buffer.write_u16::<BigEndian>(self.fragment_no)?;
        buffer.write_u16::<BigEndian>(self.fragments_in_msg)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_header_roundtrip() {
        let header = ShortHeader { msg_seqno: 0xdead_beef };
        let mut buffer = Vec::new();
        header.encode_into(&mut buffer).unwrap();
        assert_eq!(buffer.len(), SHORT_HEADER_SIZE);

        let decoded = ShortHeader::decode(&buffer).unwrap();
        assert_eq!(decoded, header);
    }

    #[test]
    fn test_long_header_roundtrip() {
        let header = LongHeader {
            msg_seqno: 7,
            msg_size: 10_000,
            fragment_offset: 1367,
            fragment_no: 1,
            fragments_in_msg: 8,
        };
        let mut buffer = Vec::new();
        header.encode_into(&mut buffer).unwrap();
        assert_eq!(buffer.len(), LONG_HEADER_SIZE);

        let decoded = LongHeader::decode(&buffer).unwrap();
        assert_eq!(decoded, header);
    }

    #[test]
    fn test_magic_is_network_byte_order() {
        let mut buffer = Vec::new();
        ShortHeader { msg_seqno: 0 }.encode_into(&mut buffer).unwrap();
        assert_eq!(&buffer[..4], &[0x4c, 0x43, 0x30, 0x32]);

        buffer.clear();
        LongHeader {
            msg_seqno: 0,
            msg_size: 0,
            fragment_offset: 0,
            fragment_no: 0,
            fragments_in_msg: 1,
        }
        .encode_into(&mut buffer)
        .unwrap();
        assert_eq!(&buffer[..4], &[0x4c, 0x43, 0x30, 0x33]);
    }

    #[test]
    fn test_frame_kind_classification() {
        let mut short = Vec::new();
        ShortHeader { msg_seqno: 1 }.encode_into(&mut short).unwrap();
        assert_eq!(frame_kind(&short), Some(FrameKind::Short));

        let mut long = Vec::new();
        LongHeader {
            msg_seqno: 1,
            msg_size: 5000,
            fragment_offset: 0,
            fragment_no: 0,
            fragments_in_msg: 4,
        }
        .encode_into(&mut long)
        .unwrap();
        assert_eq!(frame_kind(&long), Some(FrameKind::Long));

        assert_eq!(frame_kind(&[0xde, 0xad, 0xbe, 0xef]), None);
        assert_eq!(frame_kind(&[0x4c, 0x43]), None);
    }

    #[test]
    fn test_decode_rejects_wrong_magic() {
        let mut buffer = Vec::new();
        LongHeader {
            msg_seqno: 1,
            msg_size: 0,
            fragment_offset: 0,
            fragment_no: 0,
            fragments_in_msg: 1,
        }
        .encode_into(&mut buffer)
        .unwrap();
        assert!(ShortHeader::decode(&buffer).is_err());

        buffer.clear();
        ShortHeader { msg_seqno: 1 }.encode_into(&mut buffer).unwrap();
        assert!(LongHeader::decode(&buffer).is_err());
    }

    #[test]
    fn test_decode_rejects_truncated_header() {
        let mut buffer = Vec::new();
        LongHeader {
            msg_seqno: 1,
            msg_size: 100,
            fragment_offset: 0,
            fragment_no: 0,
            fragments_in_msg: 1,
        }
        .encode_into(&mut buffer)
        .unwrap();
        assert!(LongHeader::decode(&buffer[..LONG_HEADER_SIZE - 1]).is_err());
    }
}
