//! # Compound Addresses
//!
//! An ordered list of typed transport parameters handed to the session runtime
//! as one serialised buffer.

mod chunk;
mod compound;
mod element;

pub use chunk::parse_chunk;
pub use chunk::MAX_KEY_LEN;
pub use compound::CompoundAddress;
pub use compound::SerializedAddress;
pub use element::AddressElement;

use crate::guid::ParseGuidError;

/// Failures while building or decoding an address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The chunk has no `=` between key and value.
    MissingSeparator(String),
    /// The key is longer than `MAX_KEY_LEN` bytes.
    KeyTooLong { chunk: String, len: usize },
    /// The key is neither an alias nor GUID text.
    InvalidIdentifier(ParseGuidError),
    /// A `b:` value is not an even-length run of hex digits.
    InvalidHex { chunk: String, reason: String },
    /// A serialised address could not be decoded.
    Codec(dppack::Error),
    /// A serialised element lacks its `type` or `data` entry.
    MissingField(&'static str),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::MissingSeparator(chunk) => write!(f, "could not parse address chunk '{}': expected KEY=VALUE", chunk),
            Error::KeyTooLong { chunk, len } => {
                write!(f, "could not parse address chunk '{}': key is {} bytes, limit is {}", chunk, len, MAX_KEY_LEN)
            }
            Error::InvalidIdentifier(e) => write!(f, "could not parse address key: {}", e),
            Error::InvalidHex { chunk, reason } => write!(f, "could not parse address chunk '{}': {}", chunk, reason),
            Error::Codec(e) => write!(f, "address codec error: {}", e),
            Error::MissingField(field) => write!(f, "serialised address element is missing '{}'", field),
        }
    }
}

impl std::error::Error for Error {}

impl From<dppack::Error> for Error {
    fn from(e: dppack::Error) -> Self { Self::Codec(e) }
}

impl From<ParseGuidError> for Error {
    fn from(e: ParseGuidError) -> Self { Self::InvalidIdentifier(e) }
}

pub type Result<T> = std::result::Result<T, Error>;
