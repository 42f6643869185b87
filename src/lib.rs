//! A small mDNS (RFC 6762) / DNS-SD (RFC 6763) wire codec and multicast
//! transport.
//!
//! `mdnslib` decodes and encodes mDNS datagrams over caller-owned buffers
//! with no internal heap allocation, and provides a thin `socket2`-backed
//! transport for joining the standard multicast groups. It does not cache
//! responses, resolve name conflicts, or speak DNSSEC or TCP fallback —
//! those are left to the application built on top, the same way
//! `original_source/mdns.c`'s header only ever deals with one datagram at
//! a time and leaves retries and caching to its caller.
//!
//! ```no_run
//! use mdnslib::encode::encode_discovery_query;
//! use mdnslib::cursor::Writer;
//! use mdnslib::transport::MdnsSocket;
//!
//! let socket = MdnsSocket::open_ipv4()?;
//! let mut buf = [0u8; 512];
//! let mut writer = Writer::new(&mut buf);
//! let len = encode_discovery_query(&mut writer, false)?;
//! socket.send_multicast(&buf[..len])?;
//! # Ok::<(), mdnslib::error::MdnsError>(())
//! ```
pub mod cursor;
pub mod decode;
pub mod encode;
pub mod error;
pub mod message;
pub mod name;
pub mod record;
pub mod receiver;
pub mod transport;

pub use error::{MdnsError, MdnsResult};
