//! # Session Runtime
//!
//! The collaborator that actually creates or joins a session and carries lobby
//! messages between this process and the application.
//!
//! ## Philosophy
//!
//! - **Byte-Oriented Replies**: `send_message` moves an already encoded payload.
//! - **Raw Delivery**: `receive_message` hands back undecoded messages; the receive
//!   loop decodes each one exactly once.

use std::fmt;

use crate::guid::Guid;
use crate::lobby::RawMessage;
use crate::session::SessionDescriptor;

/// Runtime-assigned handle of the launched application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AppId(pub u32);

impl fmt::Display for AppId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Errors raised by a session runtime.
#[derive(Debug, Clone)]
pub enum Error {
    /// The selected service provider is not built in and was not registered.
    ProviderUnavailable(Guid),
    /// The runtime refused or failed to establish the session.
    LaunchFailed { code: u32, reason: String },
    /// The link to the runtime dropped mid-session.
    ConnectionLost(String),
    /// The runtime sent something that does not fit the protocol.
    Protocol(String),
    /// A frame exceeded the size limit.
    PayloadTooLarge(usize),
    /// Generic I/O failure.
    Io(String),
    /// Frame encoding failed.
    Codec(dppack::Error),
    /// The compound address could not be serialised.
    Address(crate::address::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ProviderUnavailable(guid) => write!(f, "service provider {} is not available", guid),
            Self::LaunchFailed { code, reason } => write!(f, "launch failed ({:#010x}): {}", code, reason),
            Self::ConnectionLost(msg) => write!(f, "connection lost: {}", msg),
            Self::Protocol(msg) => write!(f, "protocol violation: {}", msg),
            Self::PayloadTooLarge(len) => write!(f, "frame of {} bytes is too large", len),
            Self::Io(msg) => write!(f, "I/O error: {}", msg),
            Self::Codec(e) => write!(f, "frame codec error: {}", e),
            Self::Address(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for Error {}

impl From<dppack::Error> for Error {
    fn from(e: dppack::Error) -> Self { Self::Codec(e) }
}

impl From<crate::address::Error> for Error {
    fn from(e: crate::address::Error) -> Self { Self::Address(e) }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        match e.kind() {
            std::io::ErrorKind::UnexpectedEof
            | std::io::ErrorKind::BrokenPipe
            | std::io::ErrorKind::ConnectionReset => Self::ConnectionLost(e.to_string()),
            _ => Self::Io(e.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Establishes a session and exchanges lobby messages with its application.
///
/// This trait is designed to be object-safe (`&dyn SessionRuntime`).
#[async_trait::async_trait]
pub trait SessionRuntime: Send + Sync {
    /// Creates or joins the session described by `desc`.
    async fn launch(&self, desc: &SessionDescriptor) -> Result<AppId>;

    /// Waits for the next inbound message.
    ///
    /// Returns `Ok(None)` once the session has ended.
    async fn receive_message(&self, app: AppId) -> Result<Option<RawMessage>>;

    /// Sends an encoded payload to the application.
    async fn send_message(&self, app: AppId, payload: &[u8]) -> Result<()>;
}
