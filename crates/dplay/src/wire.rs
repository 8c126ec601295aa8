//! # Runtime Frames
//!
//! The envelope exchanged with a session runtime over a byte stream.
//!
//! Each frame is `[Len: u32 LE][Variant]`, the variant name selecting the frame
//! kind and its payload a map of named fields.
//!
//! ## Invariants
//! - **Panic Safety**: All decoding paths return `Result`, never panicking on unknown data.
//! - **Forward Compatibility**: Unknown map fields are skipped.

use dppack::Decoder;
use dppack::Encoder;
use tokio::io::AsyncRead;
use tokio::io::AsyncReadExt;
use tokio::io::AsyncWrite;
use tokio::io::AsyncWriteExt;

use crate::address::SerializedAddress;
use crate::guid::Guid;
use crate::lobby::RawMessage;
use crate::runtime::AppId;
use crate::runtime::Error;
use crate::runtime::Result;
use crate::session::SessionDescriptor;

/// Largest frame body accepted in either direction.
pub const MAX_FRAME_LEN: usize = 1 << 20;

/// Everything the runtime needs to create or join a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchRequest {
    pub host: bool,
    pub session: Guid,
    pub application: Guid,
    pub provider: Guid,
    pub player: String,
    pub name: Option<String>,
    pub password: Option<String>,
    pub address: SerializedAddress,
}

impl LaunchRequest {
    pub fn from_descriptor(desc: &SessionDescriptor) -> Result<Self> {
        Ok(Self {
            host: desc.is_host(),
            session: desc.session_id,
            application: desc.application,
            provider: desc.service_provider,
            player: desc.player_name.clone().unwrap_or_default(),
            name: desc.session_name.clone(),
            password: desc.session_password.clone(),
            address: desc.address.serialize()?,
        })
    }

    fn encode(&self, enc: &mut Encoder) -> Result<()> {
        enc.map_begin()?;
        write_map_bool(enc, "host", self.host)?;
        write_map_guid(enc, "session", &self.session)?;
        write_map_guid(enc, "application", &self.application)?;
        write_map_guid(enc, "provider", &self.provider)?;
        write_map_str(enc, "player", &self.player)?;
        if let Some(name) = &self.name {
            write_map_str(enc, "name", name)?;
        }
        if let Some(password) = &self.password {
            write_map_str(enc, "password", password)?;
        }
        write_map_bytes(enc, "address", &self.address.bytes)?;
        write_map_u32(enc, "elements", self.address.count as u32)?;
        enc.map_end()?;
        Ok(())
    }

    fn decode(mut dec: Decoder<'_>) -> Result<Self> {
        let mut map = dec.map()?;
        let mut host = None;
        let mut session = None;
        let mut application = None;
        let mut provider = None;
        let mut player = None;
        let mut name = None;
        let mut password = None;
        let mut address = None;
        let mut count = None;

        while let Some((key, mut val)) = map.next()? {
            match key {
                "host" => host = Some(val.bool()?),
                "session" => session = Some(Guid::from_bytes(val.guid()?)),
                "application" => application = Some(Guid::from_bytes(val.guid()?)),
                "provider" => provider = Some(Guid::from_bytes(val.guid()?)),
                "player" => player = Some(val.str()?.to_string()),
                "name" => name = Some(val.str()?.to_string()),
                "password" => password = Some(val.str()?.to_string()),
                "address" => address = Some(val.bytes()?.to_vec()),
                "elements" => count = Some(val.u32()? as usize),
                _ => val.skip()?,
            }
        }
        expect_end(&dec, "Launch")?;

        Ok(Self {
            host: required(host, "host")?,
            session: required(session, "session")?,
            application: required(application, "application")?,
            provider: required(provider, "provider")?,
            player: required(player, "player")?,
            name,
            password,
            address: SerializedAddress {
                bytes: required(address, "address")?,
                count: required(count, "elements")?,
            },
        })
    }
}

/// One unit of the runtime protocol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// Lobby to runtime: create or join a session.
    Launch(LaunchRequest),
    /// Runtime to lobby: the application is running.
    Launched { app: AppId },
    /// Runtime to lobby: the session could not be established.
    LaunchFailed { code: u32, reason: String },
    /// Runtime to lobby: an inbound lobby message.
    Message { app: AppId, message: RawMessage },
    /// Lobby to runtime: a reply for the application.
    Send { app: AppId, data: Vec<u8> },
    /// Runtime to lobby: the application is gone.
    Terminated { app: AppId },
}

impl Frame {
    pub fn name(&self) -> &'static str {
        match self {
            Frame::Launch(_) => "Launch",
            Frame::Launched { .. } => "Launched",
            Frame::LaunchFailed { .. } => "LaunchFailed",
            Frame::Message { .. } => "Message",
            Frame::Send { .. } => "Send",
            Frame::Terminated { .. } => "Terminated",
        }
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut enc = Encoder::new();
        enc.variant_begin(self.name())?;
        match self {
            Frame::Launch(request) => request.encode(&mut enc)?,
            Frame::Launched { app } | Frame::Terminated { app } => {
                enc.map_begin()?;
                write_map_u32(&mut enc, "app", app.0)?;
                enc.map_end()?;
            }
            Frame::LaunchFailed { code, reason } => {
                enc.map_begin()?;
                write_map_u32(&mut enc, "code", *code)?;
                write_map_str(&mut enc, "reason", reason)?;
                enc.map_end()?;
            }
            Frame::Message { app, message } => {
                enc.map_begin()?;
                write_map_u32(&mut enc, "app", app.0)?;
                write_map_u32(&mut enc, "flags", message.flags)?;
                write_map_bytes(&mut enc, "data", &message.data)?;
                enc.map_end()?;
            }
            Frame::Send { app, data } => {
                enc.map_begin()?;
                write_map_u32(&mut enc, "app", app.0)?;
                write_map_bytes(&mut enc, "data", data)?;
                enc.map_end()?;
            }
        }
        enc.variant_end()?;
        Ok(enc.into_bytes()?)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let mut dec = Decoder::new(bytes);
        let (kind, body) = dec.variant()?;
        expect_end(&dec, "frame")?;
        if kind == "Launch" {
            return Ok(Frame::Launch(LaunchRequest::decode(body)?));
        }

        let fields = Fields::decode(body, kind)?;
        match kind {
            "Launched" => Ok(Frame::Launched { app: fields.app()? }),
            "Terminated" => Ok(Frame::Terminated { app: fields.app()? }),
            "LaunchFailed" => Ok(Frame::LaunchFailed {
                code: required(fields.code, "code")?,
                reason: fields.reason.unwrap_or_default(),
            }),
            "Message" => Ok(Frame::Message {
                app: fields.app()?,
                message: RawMessage {
                    flags: required(fields.flags, "flags")?,
                    data: required(fields.data, "data")?,
                },
            }),
            "Send" => Ok(Frame::Send {
                app: fields.app()?,
                data: required(fields.data, "data")?,
            }),
            other => Err(Error::Protocol(format!("unknown frame '{}'", other))),
        }
    }
}

/// Fields shared by the small frames.
#[derive(Default)]
struct Fields {
    app: Option<u32>,
    code: Option<u32>,
    reason: Option<String>,
    flags: Option<u32>,
    data: Option<Vec<u8>>,
}

impl Fields {
    fn decode(mut dec: Decoder<'_>, kind: &str) -> Result<Self> {
        let mut map = dec.map()?;
        let mut fields = Fields::default();
        while let Some((key, mut val)) = map.next()? {
            match key {
                "app" => fields.app = Some(val.u32()?),
                "code" => fields.code = Some(val.u32()?),
                "reason" => fields.reason = Some(val.str()?.to_string()),
                "flags" => fields.flags = Some(val.u32()?),
                "data" => fields.data = Some(val.bytes()?.to_vec()),
                _ => val.skip()?,
            }
        }
        expect_end(&dec, kind)?;
        Ok(fields)
    }

    fn app(&self) -> Result<AppId> {
        required(self.app, "app").map(AppId)
    }
}

/// Reads one length-prefixed frame. A clean end of stream yields `None`.
pub async fn read_frame<R>(reader: &mut R) -> Result<Option<Frame>>
where
    R: AsyncRead + Unpin + ?Sized,
{
    let mut len_bytes = [0u8; 4];
    let first = reader.read(&mut len_bytes).await?;
    if first == 0 {
        return Ok(None);
    }
    reader.read_exact(&mut len_bytes[first..]).await?;

    let len = u32::from_le_bytes(len_bytes) as usize;
    if len > MAX_FRAME_LEN {
        return Err(Error::PayloadTooLarge(len));
    }

    let mut body = vec![0u8; len];
    reader.read_exact(&mut body).await?;
    Frame::decode(&body).map(Some)
}

/// Writes one length-prefixed frame and flushes.
pub async fn write_frame<W>(writer: &mut W, frame: &Frame) -> Result<()>
where
    W: AsyncWrite + Unpin + ?Sized,
{
    let body = frame.encode()?;
    if body.len() > MAX_FRAME_LEN {
        return Err(Error::PayloadTooLarge(body.len()));
    }
    writer.write_all(&(body.len() as u32).to_le_bytes()).await?;
    writer.write_all(&body).await?;
    writer.flush().await?;
    Ok(())
}

// Helper functions

/// Rejects bytes left over after a complete item.
fn expect_end(dec: &Decoder<'_>, what: &str) -> Result<()> {
    match dec.remaining() {
        0 => Ok(()),
        extra => Err(Error::Protocol(format!("{} extra bytes after {}", extra, what))),
    }
}

fn required<T>(value: Option<T>, field: &str) -> Result<T> {
    value.ok_or_else(|| Error::Protocol(format!("missing {}", field)))
}

fn write_map_u32(enc: &mut Encoder, key: &str, val: u32) -> Result<()> {
    enc.variant_begin(key)?;
    enc.u32(val)?;
    enc.variant_end()?;
    Ok(())
}

fn write_map_bool(enc: &mut Encoder, key: &str, val: bool) -> Result<()> {
    enc.variant_begin(key)?;
    enc.bool(val)?;
    enc.variant_end()?;
    Ok(())
}

fn write_map_guid(enc: &mut Encoder, key: &str, val: &Guid) -> Result<()> {
    enc.variant_begin(key)?;
    enc.guid(&val.to_bytes())?;
    enc.variant_end()?;
    Ok(())
}

fn write_map_str(enc: &mut Encoder, key: &str, val: &str) -> Result<()> {
    enc.variant_begin(key)?;
    enc.str(val)?;
    enc.variant_end()?;
    Ok(())
}

fn write_map_bytes(enc: &mut Encoder, key: &str, val: &[u8]) -> Result<()> {
    enc.variant_begin(key)?;
    enc.bytes(val)?;
    enc.variant_end()?;
    Ok(())
}
