//! A `SessionRuntime` reached over any async byte stream.

use std::sync::Arc;

use tokio::io::AsyncRead;
use tokio::io::AsyncWrite;
use tokio::net::TcpStream;
use tokio::net::ToSocketAddrs;
use tokio::net::tcp::OwnedReadHalf;
use tokio::net::tcp::OwnedWriteHalf;
use tokio::sync::Mutex;

use crate::lobby::RawMessage;
use crate::provider::ProviderTable;
use crate::runtime::AppId;
use crate::runtime::Error;
use crate::runtime::Result;
use crate::runtime::SessionRuntime;
use crate::session::SessionDescriptor;
use crate::wire;
use crate::wire::Frame;
use crate::wire::LaunchRequest;

/// Runtime client speaking the frame protocol of `crate::wire`.
///
/// Launch is refused locally when the selected provider is missing from the
/// provider table.
pub struct StreamRuntime<R, W> {
    reader: Mutex<R>,
    writer: Mutex<W>,
    providers: Arc<ProviderTable>,
}

/// A runtime reached over TCP.
pub type TcpRuntime = StreamRuntime<OwnedReadHalf, OwnedWriteHalf>;

impl TcpRuntime {
    pub async fn connect(addr: impl ToSocketAddrs, providers: Arc<ProviderTable>) -> Result<Self> {
        let stream = TcpStream::connect(addr).await?;
        let (reader, writer) = stream.into_split();
        Ok(Self::new(reader, writer, providers))
    }
}

impl<R, W> StreamRuntime<R, W>
where
    R: AsyncRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    pub fn new(reader: R, writer: W, providers: Arc<ProviderTable>) -> Self {
        Self {
            reader: Mutex::new(reader),
            writer: Mutex::new(writer),
            providers,
        }
    }

    async fn write(&self, frame: &Frame) -> Result<()> {
        let mut writer = self.writer.lock().await;
        wire::write_frame(&mut *writer, frame).await
    }

    async fn read(&self) -> Result<Option<Frame>> {
        let mut reader = self.reader.lock().await;
        wire::read_frame(&mut *reader).await
    }
}

#[async_trait::async_trait]
impl<R, W> SessionRuntime for StreamRuntime<R, W>
where
    R: AsyncRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    async fn launch(&self, desc: &SessionDescriptor) -> Result<AppId> {
        if !self.providers.contains(&desc.service_provider) {
            return Err(Error::ProviderUnavailable(desc.service_provider));
        }

        let request = LaunchRequest::from_descriptor(desc)?;
        tracing::debug!(session = %request.session, elements = request.address.count, "sending launch request");
        self.write(&Frame::Launch(request)).await?;

        match self.read().await? {
            Some(Frame::Launched { app }) => Ok(app),
            Some(Frame::LaunchFailed { code, reason }) => Err(Error::LaunchFailed { code, reason }),
            Some(other) => Err(Error::Protocol(format!("expected launch reply, got {}", other.name()))),
            None => Err(Error::ConnectionLost("runtime closed before replying to launch".into())),
        }
    }

    async fn receive_message(&self, app: AppId) -> Result<Option<RawMessage>> {
        loop {
            match self.read().await? {
                Some(Frame::Message { app: target, message }) if target == app => return Ok(Some(message)),
                Some(Frame::Message { app: target, .. }) => {
                    tracing::debug!(%target, "dropping message for another application");
                }
                Some(Frame::Terminated { app: target }) if target == app => return Ok(None),
                Some(Frame::Terminated { app: target }) => {
                    tracing::debug!(%target, "ignoring termination of another application");
                }
                Some(other) => {
                    return Err(Error::Protocol(format!("unexpected {} frame while receiving", other.name())));
                }
                None => return Ok(None),
            }
        }
    }

    async fn send_message(&self, app: AppId, payload: &[u8]) -> Result<()> {
        self.write(&Frame::Send { app, data: payload.to_vec() }).await
    }
}
