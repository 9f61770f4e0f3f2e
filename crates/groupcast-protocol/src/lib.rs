#![warn(missing_docs)]

//! groupcast-protocol: the wire format of the multicast transport.
//!
//! Two frame types travel on the wire, distinguished by a 32-bit magic in
//! network byte order at offset 0:
//!
//! - a *short* frame carries a whole message in one datagram: header,
//!   NUL-terminated channel name, payload;
//! - a *long* frame carries one fragment of a larger message. Fragment 0
//!   additionally carries the channel name between header and payload chunk.
//!
//! This crate is pure codec: parsing and serialization only, no I/O.

/// Frame assembly and channel parsing.
pub mod frame;
/// Short and long header codec.
pub mod header;
