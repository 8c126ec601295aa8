//! # dplay
//!
//! Host or join a peer-to-peer session from a description of it, then serve the
//! lobby side of the session until the application terminates.
//!
//! ## Architecture
//!
//! - `address`: typed transport parameters collected into one serialised buffer.
//! - `session`: the descriptor assembled from command-line options.
//! - `lobby`: typed lobby messages, their dispatcher and the receive loop.
//! - `runtime` / `stream` / `wire`: the session runtime contract and a client for it.
//! - `provider`: availability of transport providers, including the built-in one.
//! - `launch`: ties the above together for one session.
//!
//! ```no_run
//! # async fn example(runtime: &dyn dplay::runtime::SessionRuntime) -> Result<(), Box<dyn std::error::Error>> {
//! use std::sync::Arc;
//! use dplay::guid;
//! use dplay::lobby::LobbyDispatcher;
//! use dplay::provider::BuiltinProvider;
//! use dplay::provider::ProviderTable;
//! use dplay::session::SessionDescriptor;
//! use dplay::session::SessionOption;
//!
//! let desc: SessionDescriptor = [
//!     SessionOption::Host(None),
//!     SessionOption::Player("alice".into()),
//!     SessionOption::Application("{5BFDB060-06A4-11D0-9C4F-00A0C905425E}".parse()?),
//!     SessionOption::ServiceProvider(guid::DPSPGUID_TCPIP),
//!     SessionOption::Address(dplay::address::parse_chunk("INet=127.0.0.1")?),
//! ]
//! .into_iter()
//! .collect();
//!
//! let registry = BuiltinProvider::new(Arc::new(ProviderTable::with_system_providers()));
//! let dispatcher = LobbyDispatcher::new();
//! dplay::launch::run_session(runtime, &registry, &desc, &dispatcher, |_, _| {}).await?;
//! # Ok(())
//! # }
//! ```

pub mod address;
pub mod guid;
pub mod launch;
pub mod lobby;
pub mod provider;
pub mod runtime;
pub mod session;
pub mod stream;
pub mod wire;
