//! # dprun
//!
//! Launches one lobby session from the command line and serves it until the
//! application terminates.

mod cli;

use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use dplay::guid::Guid;
use dplay::launch;
use dplay::lobby::LobbyDispatcher;
use dplay::provider::BuiltinProvider;
use dplay::provider::ProviderTable;
use dplay::session::SessionDescriptor;
use dplay::session::SessionOption;
use dplay::stream::TcpRuntime;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    tracing_subscriber::fmt::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .with_writer(std::io::stderr)
        .init();

    let (cli, options) = match Cli::try_parse_options(std::env::args_os()) {
        Ok(parsed) => parsed,
        Err(e) => {
            let _ = e.print();
            return if e.use_stderr() { ExitCode::FAILURE } else { ExitCode::SUCCESS };
        }
    };

    match run(cli, options).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli, options: Vec<SessionOption>) -> anyhow::Result<()> {
    let desc: SessionDescriptor = options.into_iter().collect();
    // refuse before touching the network
    desc.validate()?;

    let providers = Arc::new(ProviderTable::with_system_providers());
    let runtime = TcpRuntime::connect(cli.runtime.as_str(), providers.clone())
        .await
        .with_context(|| format!("could not reach session runtime at {}", cli.runtime))?;
    let registry = BuiltinProvider::new(providers);
    let dispatcher = LobbyDispatcher::new();

    let session_id_file = cli.session_id_file.as_deref();
    let report = launch::run_session(&runtime, &registry, &desc, &dispatcher, |_, session_id| {
        if let Some(path) = session_id_file {
            if let Err(e) = write_session_id(path, session_id) {
                tracing::warn!("{:#}", e);
            }
        }
    })
    .await?;

    tracing::info!(
        app = %report.app,
        replies = report.replies,
        "session {} complete",
        report.session_id
    );
    Ok(())
}

fn write_session_id(path: &Path, session_id: Guid) -> anyhow::Result<()> {
    std::fs::write(path, session_id.to_string())
        .with_context(|| format!("could not write session id to {}", path.display()))
}

#[cfg(test)]
mod tests;
