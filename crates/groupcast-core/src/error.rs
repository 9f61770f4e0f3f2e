//! Error types surfaced through the public API.
//!
//! Datagram-level problems (bad magic, short reads, fragment bounds
//! violations, buffer exhaustion) are never surfaced here; the transport's
//! contract is best-effort delivery and those only move the statistics
//! counters. What remains is caller error on the send side and socket
//! failures.

use thiserror::Error;

use crate::constants::CHANNEL_MAXLEN;

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, ErrorKind>;

/// Errors returned by the transport.
#[derive(Debug, Error)]
pub enum ErrorKind {
    /// The channel name exceeds [`CHANNEL_MAXLEN`] bytes.
    #[error("channel name is {0} bytes, limit is {CHANNEL_MAXLEN}")]
    ChannelTooLong(usize),
    /// The payload would require more than 65535 fragments.
    #[error("payload of {0} bytes is too large for a single message")]
    MessageTooLarge(usize),
    /// An underlying socket operation failed.
    #[error("socket error: {0}")]
    Io(#[from] std::io::Error),
}
