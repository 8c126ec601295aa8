//! # Lobby Message Dispatch
//!
//! Classifies each inbound message and decides whether the receive loop goes on.
//! Only `AppTerminated` stops the loop, and only `GetProperty` is answered.

use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;

use super::GetPropertyResponse;
use super::LobbyMessage;
use super::SystemMessage;
use crate::runtime;
use crate::runtime::AppId;
use crate::runtime::SessionRuntime;

/// Whether the receive loop should keep going after a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Stop,
}

/// Consumes one decoded message per call.
#[async_trait::async_trait]
pub trait MessageHandler: Send + Sync {
    async fn handle(&self, runtime: &dyn SessionRuntime, app: AppId, message: LobbyMessage) -> Flow;

    /// Replies successfully handed to the runtime so far.
    fn replies_sent(&self) -> usize {
        0
    }
}

/// The lobby side of the message contract.
///
/// Property queries are answered with `UnknownProperty`; there is no property store.
#[derive(Debug, Default)]
pub struct LobbyDispatcher {
    replies: AtomicUsize,
}

impl LobbyDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    async fn answer_property(
        &self,
        runtime: &dyn SessionRuntime,
        app: AppId,
        response: GetPropertyResponse,
    ) -> runtime::Result<()> {
        runtime.send_message(app, &response.encode()).await?;
        self.replies.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}

#[async_trait::async_trait]
impl MessageHandler for LobbyDispatcher {
    async fn handle(&self, runtime: &dyn SessionRuntime, app: AppId, message: LobbyMessage) -> Flow {
        let system = match message {
            LobbyMessage::Standard(data) => {
                tracing::debug!(len = data.len(), "received standard message");
                return Flow::Continue;
            }
            LobbyMessage::System(system) => system,
        };

        match system {
            SystemMessage::AppTerminated => {
                tracing::info!("received APPTERMINATED message");
                Flow::Stop
            }
            SystemMessage::NewSessionHost { instance } => {
                tracing::info!(?instance, "received NEWSESSIONHOST message");
                Flow::Continue
            }
            SystemMessage::ConnectionSettingsRead { instance } => {
                tracing::info!(?instance, "received CONNECTIONSETTINGSREAD message");
                Flow::Continue
            }
            SystemMessage::ConnectFailed { instance } => {
                // not fatal to the session
                tracing::warn!(?instance, "received CONNECTFAILED message");
                Flow::Continue
            }
            SystemMessage::ConnectSucceeded { instance } => {
                tracing::info!(?instance, "received CONNECTSUCCEEDED message");
                Flow::Continue
            }
            SystemMessage::GetProperty(request) => {
                tracing::info!(
                    request_id = request.request_id,
                    player = %request.player,
                    tag = %request.property_tag,
                    "received GETPROPERTY message"
                );
                let response = GetPropertyResponse::unknown_property(&request);
                if let Err(e) = self.answer_property(runtime, app, response).await {
                    tracing::warn!(request_id = request.request_id, "could not answer GETPROPERTY: {}", e);
                }
                Flow::Continue
            }
            SystemMessage::Unknown(kind) => {
                tracing::info!(kind, "received unknown message");
                Flow::Continue
            }
        }
    }

    fn replies_sent(&self) -> usize {
        self.replies.load(Ordering::Relaxed)
    }
}
