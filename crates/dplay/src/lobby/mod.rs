//! # Lobby Protocol
//!
//! Typed lobby messages, the dispatcher that reacts to them, and the receive loop
//! that drives both.

mod dispatch;
mod message;

pub use dispatch::Flow;
pub use dispatch::LobbyDispatcher;
pub use dispatch::MessageHandler;
pub use message::*;

use crate::runtime;
use crate::runtime::AppId;
use crate::runtime::SessionRuntime;

/// Counters from one run of the receive loop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoopSummary {
    /// Messages handed to the handler.
    pub handled: usize,
    /// Messages dropped because they could not be decoded.
    pub skipped: usize,
    /// The handler asked to stop, as opposed to the runtime ending the session.
    pub stopped_by_handler: bool,
}

/// Receives messages until the handler says stop or the runtime ends the session.
///
/// Each message is decoded once; undecodable ones are logged and skipped.
/// Runtime errors end the loop and are returned.
pub async fn process_messages(
    runtime: &dyn SessionRuntime,
    app: AppId,
    handler: &dyn MessageHandler,
) -> runtime::Result<LoopSummary> {
    let mut summary = LoopSummary::default();

    while let Some(raw) = runtime.receive_message(app).await? {
        tracing::trace!(flags = raw.flags, data = %hex::encode_upper(&raw.data), "receiving message");

        let message = match LobbyMessage::decode(raw) {
            Ok(message) => message,
            Err(e) => {
                tracing::warn!("skipping lobby message: {}", e);
                summary.skipped += 1;
                continue;
            }
        };

        summary.handled += 1;
        if handler.handle(runtime, app, message).await == Flow::Stop {
            summary.stopped_by_handler = true;
            break;
        }
    }

    Ok(summary)
}
