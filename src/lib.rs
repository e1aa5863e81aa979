//! Interactive resolve-then-fetch client.
//!
//! A domain name is resolved to an address with a unicast DNS query ([`resolver`]), and the
//! resolved address is then used to retrieve content with a minimal HTTP/1.1 request ([`fetch`]).
//! [`session`] drives both in a prompt/continue loop.

mod config;
mod error;
mod hex;
mod num;
#[cfg(test)]
mod testing;

pub mod fetch;
pub mod message;
pub mod name;
pub mod packet;
pub mod resolver;
pub mod session;

pub use config::{Config, Mode};
pub use error::{Error, ErrorKind};

/// Size of the buffer DNS queries are encoded into.
///
/// Unicast DNS messages are limited to 512 Bytes, and a query for a single name always fits.
pub const DNS_BUFFER_SIZE: usize = 512;

/// Default size of the receive buffers used for resolver replies and fetched content.
///
/// Anything the peer sends beyond this many bytes is cut off.
pub const DEFAULT_BUFFER_SIZE: usize = 1024;
