//! A dedicated error type for everything that can go wrong decoding, encoding
//! or transporting an mDNS message: I/O, malformed wire data, truncated
//! buffers, etc.
use std::fmt;
use std::io;

#[derive(Debug)]
pub enum MdnsError {
    /// Ran out of buffer space during a read or a write.
    Truncated,
    /// Reserved label bits, a forward/cyclic name pointer, an oversized
    /// label, or an otherwise impossible on-wire value.
    Malformed(&'static str),
    /// A recognized but unhandled rtype/rclass combination reached a call
    /// site that only supports the typed record set.
    Unsupported,
    Io(io::Error),
}

impl fmt::Display for MdnsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MdnsError::Truncated => write!(f, "buffer truncated"),
            MdnsError::Malformed(reason) => write!(f, "malformed mDNS message: {}", reason),
            MdnsError::Unsupported => write!(f, "unsupported record type"),
            MdnsError::Io(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl std::error::Error for MdnsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            MdnsError::Io(e) => Some(e),
            _ => None,
        }
    }
}

/// A specific custom `Result` for all functions in this crate.
pub type MdnsResult<T> = Result<T, MdnsError>;

impl From<io::Error> for MdnsError {
    fn from(err: io::Error) -> Self {
        MdnsError::Io(err)
    }
}
