#![warn(missing_docs)]

//! Groupcast: a small public API facade for the workspace.
//!
//! This crate re-exports the types needed to publish and subscribe on a
//! UDP multicast group:
//!
//! - the endpoint and the messages it delivers (`Endpoint`, `Message`)
//! - configuration (`Config`)
//! - the error taxonomy (`ErrorKind`, `Result`)
//!
//! Example
//! ```ignore
//! use std::time::Duration;
//! use groupcast::{Config, Endpoint};
//!
//! let mut endpoint = Endpoint::bind(Config::default()).unwrap();
//! endpoint.send("GREETING", b"hello").unwrap();
//!
//! // loopback delivery means we hear ourselves
//! if let Some(message) = endpoint.recv(Some(Duration::from_secs(1))).unwrap() {
//!     assert_eq!(message.channel(), "GREETING");
//!     assert_eq!(message.data(), b"hello");
//! }
//! ```

// Core config and errors
pub use groupcast_core::config::Config;
pub use groupcast_core::constants;
pub use groupcast_core::error::{ErrorKind, Result};
// Transport: the endpoint and delivered messages
pub use groupcast_transport::{Endpoint, Message};

/// Convenience prelude with the most commonly used items.
pub mod prelude {
    pub use crate::{Config, Endpoint, ErrorKind, Message, Result};
}
