//! # Session Orchestration
//!
//! Validate, register the built-in provider if selected, launch, pump lobby
//! messages, unregister. The provider guard covers every exit path.

use std::fmt;

use crate::guid::Guid;
use crate::lobby;
use crate::lobby::LoopSummary;
use crate::lobby::MessageHandler;
use crate::provider;
use crate::provider::ProviderGuard;
use crate::provider::ProviderRegistry;
use crate::runtime;
use crate::runtime::AppId;
use crate::runtime::SessionRuntime;
use crate::session;
use crate::session::SessionDescriptor;

#[derive(Debug, Clone)]
pub enum Error {
    /// Required descriptor fields are missing; nothing was attempted.
    Invalid(session::Error),
    /// The built-in provider could not be registered.
    Register(provider::Error),
    /// The runtime could not establish the session.
    Launch(runtime::Error),
    /// The runtime failed while messages were being received.
    Receive(runtime::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Invalid(e) => write!(f, "{}", e),
            Error::Register(e) => write!(f, "could not register DPRun service provider: {}", e),
            Error::Launch(e) => write!(f, "could not launch session: {}", e),
            Error::Receive(e) => write!(f, "lobby message loop failed: {}", e),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Invalid(e) => Some(e),
            Error::Register(e) => Some(e),
            Error::Launch(e) | Error::Receive(e) => Some(e),
        }
    }
}

impl From<session::Error> for Error {
    fn from(e: session::Error) -> Self { Self::Invalid(e) }
}

impl From<provider::Error> for Error {
    fn from(e: provider::Error) -> Self { Self::Register(e) }
}

pub type Result<T> = std::result::Result<T, Error>;

/// What happened during a completed session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionReport {
    pub app: AppId,
    pub session_id: Guid,
    pub messages: LoopSummary,
    /// Replies the handler sent during the session.
    pub replies: usize,
}

/// Runs one session from launch to termination.
///
/// `on_launched` is called once the runtime has accepted the session.
pub async fn run_session(
    runtime: &dyn SessionRuntime,
    registry: &dyn ProviderRegistry,
    desc: &SessionDescriptor,
    handler: &dyn MessageHandler,
    on_launched: impl FnOnce(AppId, Guid),
) -> Result<SessionReport> {
    desc.validate()?;

    let guard = ProviderGuard::acquire(registry, desc.service_provider)?;

    tracing::info!(elements = desc.address.len(), "address:");
    for element in desc.address.elements() {
        tracing::info!("  {}", element);
    }

    let app = match runtime.launch(desc).await {
        Ok(app) => app,
        Err(e) => {
            release(guard);
            return Err(Error::Launch(e));
        }
    };

    tracing::info!(%app, "launched session {}", desc.session_id);
    on_launched(app, desc.session_id);

    let outcome = lobby::process_messages(runtime, app, handler).await;
    release(guard);

    let messages = outcome.map_err(Error::Receive)?;
    let replies = handler.replies_sent();
    tracing::info!(handled = messages.handled, skipped = messages.skipped, replies, "session finished");

    Ok(SessionReport { app, session_id: desc.session_id, messages, replies })
}

/// Unregisters; a failure is reported but never changes the outcome.
fn release(guard: ProviderGuard<'_>) {
    if let Err(e) = guard.release() {
        tracing::warn!("could not unregister DPRun service provider: {}", e);
    }
}
