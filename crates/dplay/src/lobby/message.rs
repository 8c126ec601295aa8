//! # Lobby Messages
//!
//! Raw runtime messages are decoded once, on receipt, into `LobbyMessage`.
//! System payloads follow the lobby structure layout: a little-endian `u32`
//! type first, then the fields of that type.

use crate::guid::Guid;

/// `flags` value of an application-defined message.
pub const FLAG_STANDARD: u32 = 0;
/// `flags` value written for system messages; any non-zero value reads as system.
pub const FLAG_SYSTEM: u32 = 1;

pub const SYS_CONNECTION_SETTINGS_READ: u32 = 1;
pub const SYS_CONNECT_FAILED: u32 = 2;
pub const SYS_CONNECT_SUCCEEDED: u32 = 3;
pub const SYS_APP_TERMINATED: u32 = 4;
pub const SYS_GET_PROPERTY: u32 = 7;
pub const SYS_GET_PROPERTY_RESPONSE: u32 = 8;
pub const SYS_NEW_SESSION_HOST: u32 = 9;

/// Encoded size of a property response.
pub const GET_PROPERTY_RESPONSE_LEN: usize = 52;

/// A message as delivered by the runtime, before interpretation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawMessage {
    pub flags: u32,
    pub data: Vec<u8>,
}

/// A system payload was too short for its type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    Truncated { kind: &'static str, needed: usize, found: usize },
}

impl std::fmt::Display for DecodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DecodeError::Truncated { kind, needed, found } => {
                write!(f, "{} message needs {} bytes, got {}", kind, needed, found)
            }
        }
    }
}

impl std::error::Error for DecodeError {}

/// A property request from the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GetProperty {
    pub request_id: u32,
    pub player: Guid,
    pub property_tag: Guid,
}

/// Outcome reported in a property response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultCode {
    Ok,
    /// No property store backs this lobby.
    UnknownProperty,
}

impl ResultCode {
    pub fn to_hresult(self) -> u32 {
        match self {
            ResultCode::Ok => 0,
            ResultCode::UnknownProperty => 0x8877_0456,
        }
    }

    pub fn from_hresult(hr: u32) -> Option<Self> {
        match hr {
            0 => Some(ResultCode::Ok),
            0x8877_0456 => Some(ResultCode::UnknownProperty),
            _ => None,
        }
    }
}

/// Reply to a `GetProperty`, correlated by request id, player and tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetPropertyResponse {
    pub request_id: u32,
    pub player: Guid,
    pub property_tag: Guid,
    pub result: ResultCode,
    pub data: Vec<u8>,
}

impl GetPropertyResponse {
    /// The "unsupported" answer for a request.
    pub fn unknown_property(request: &GetProperty) -> Self {
        Self {
            request_id: request.request_id,
            player: request.player,
            property_tag: request.property_tag,
            result: ResultCode::UnknownProperty,
            data: Vec::new(),
        }
    }

    /// `type, request id, player, tag, hr, data size, data` with at least one data word.
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(GET_PROPERTY_RESPONSE_LEN + self.data.len());
        out.extend_from_slice(&SYS_GET_PROPERTY_RESPONSE.to_le_bytes());
        out.extend_from_slice(&self.request_id.to_le_bytes());
        out.extend_from_slice(&self.player.to_bytes());
        out.extend_from_slice(&self.property_tag.to_bytes());
        out.extend_from_slice(&self.result.to_hresult().to_le_bytes());
        out.extend_from_slice(&(self.data.len() as u32).to_le_bytes());
        out.extend_from_slice(&self.data);
        out.resize(out.len().max(GET_PROPERTY_RESPONSE_LEN), 0);
        out
    }

    pub fn decode(data: &[u8]) -> Result<Self, DecodeError> {
        let mut r = Reader::new("GETPROPERTYRESPONSE", data);
        r.require(GET_PROPERTY_RESPONSE_LEN)?;
        let _kind = r.u32();
        let request_id = r.u32();
        let player = r.guid();
        let property_tag = r.guid();
        let hr = r.u32();
        let size = r.u32() as usize;
        let result = ResultCode::from_hresult(hr).unwrap_or(ResultCode::UnknownProperty);
        r.require(48 + size.max(4))?;
        let data = r.take(size).to_vec();
        Ok(Self { request_id, player, property_tag, result, data })
    }
}

/// The fixed set of system message shapes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SystemMessage {
    AppTerminated,
    NewSessionHost { instance: Option<Guid> },
    ConnectionSettingsRead { instance: Option<Guid> },
    ConnectFailed { instance: Option<Guid> },
    ConnectSucceeded { instance: Option<Guid> },
    GetProperty(GetProperty),
    Unknown(u32),
}

impl SystemMessage {
    pub fn kind(&self) -> u32 {
        match self {
            SystemMessage::ConnectionSettingsRead { .. } => SYS_CONNECTION_SETTINGS_READ,
            SystemMessage::ConnectFailed { .. } => SYS_CONNECT_FAILED,
            SystemMessage::ConnectSucceeded { .. } => SYS_CONNECT_SUCCEEDED,
            SystemMessage::AppTerminated => SYS_APP_TERMINATED,
            SystemMessage::GetProperty(_) => SYS_GET_PROPERTY,
            SystemMessage::NewSessionHost { .. } => SYS_NEW_SESSION_HOST,
            SystemMessage::Unknown(kind) => *kind,
        }
    }

    pub fn decode(data: &[u8]) -> Result<Self, DecodeError> {
        let mut r = Reader::new("system", data);
        r.require(4)?;
        let kind = r.u32();
        let instance = if r.remaining() >= 16 { Some(r.guid()) } else { None };

        let message = match kind {
            SYS_APP_TERMINATED => SystemMessage::AppTerminated,
            SYS_NEW_SESSION_HOST => SystemMessage::NewSessionHost { instance },
            SYS_CONNECTION_SETTINGS_READ => SystemMessage::ConnectionSettingsRead { instance },
            SYS_CONNECT_FAILED => SystemMessage::ConnectFailed { instance },
            SYS_CONNECT_SUCCEEDED => SystemMessage::ConnectSucceeded { instance },
            SYS_GET_PROPERTY => {
                let mut r = Reader::new("GETPROPERTY", data);
                r.require(40)?;
                let _kind = r.u32();
                SystemMessage::GetProperty(GetProperty {
                    request_id: r.u32(),
                    player: r.guid(),
                    property_tag: r.guid(),
                })
            }
            other => SystemMessage::Unknown(other),
        };
        Ok(message)
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut out = self.kind().to_le_bytes().to_vec();
        match self {
            SystemMessage::NewSessionHost { instance }
            | SystemMessage::ConnectionSettingsRead { instance }
            | SystemMessage::ConnectFailed { instance }
            | SystemMessage::ConnectSucceeded { instance } => {
                if let Some(guid) = instance {
                    out.extend_from_slice(&guid.to_bytes());
                }
            }
            SystemMessage::GetProperty(req) => {
                out.extend_from_slice(&req.request_id.to_le_bytes());
                out.extend_from_slice(&req.player.to_bytes());
                out.extend_from_slice(&req.property_tag.to_bytes());
            }
            SystemMessage::AppTerminated | SystemMessage::Unknown(_) => {}
        }
        out
    }
}

/// A decoded lobby message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LobbyMessage {
    /// Application-defined payload with no meaning here.
    Standard(Vec<u8>),
    System(SystemMessage),
}

impl LobbyMessage {
    pub fn decode(raw: RawMessage) -> Result<Self, DecodeError> {
        match raw.flags {
            FLAG_STANDARD => Ok(LobbyMessage::Standard(raw.data)),
            _ => Ok(LobbyMessage::System(SystemMessage::decode(&raw.data)?)),
        }
    }

    pub fn encode(&self) -> RawMessage {
        match self {
            LobbyMessage::Standard(data) => RawMessage { flags: FLAG_STANDARD, data: data.clone() },
            LobbyMessage::System(msg) => RawMessage { flags: FLAG_SYSTEM, data: msg.encode() },
        }
    }
}

/// Little-endian field reader; callers check lengths with `require` first.
struct Reader<'a> {
    kind: &'static str,
    full: usize,
    buf: &'a [u8],
}

impl<'a> Reader<'a> {
    fn new(kind: &'static str, buf: &'a [u8]) -> Self {
        Self { kind, full: buf.len(), buf }
    }

    fn require(&self, needed: usize) -> Result<(), DecodeError> {
        if self.full < needed {
            return Err(DecodeError::Truncated { kind: self.kind, needed, found: self.full });
        }
        Ok(())
    }

    fn remaining(&self) -> usize {
        self.buf.len()
    }

    fn take(&mut self, n: usize) -> &'a [u8] {
        let (head, tail) = self.buf.split_at(n.min(self.buf.len()));
        self.buf = tail;
        head
    }

    fn u32(&mut self) -> u32 {
        let mut word = [0u8; 4];
        let head = self.take(4);
        word[..head.len()].copy_from_slice(head);
        u32::from_le_bytes(word)
    }

    fn guid(&mut self) -> Guid {
        let mut raw = [0u8; 16];
        let head = self.take(16);
        raw[..head.len()].copy_from_slice(head);
        Guid::from_bytes(raw)
    }
}
