//! # Command Line
//!
//! Flags map one-to-one onto `SessionOption`s. Scalars keep the last occurrence;
//! `--service-provider` and `--address` are replayed in the order they were given,
//! since both append address elements.

use std::ffi::OsString;
use std::path::PathBuf;

use clap::ArgMatches;
use clap::CommandFactory;
use clap::FromArgMatches;
use clap::Parser;
use dplay::address;
use dplay::address::AddressElement;
use dplay::guid;
use dplay::guid::Guid;
use dplay::session::SessionOption;

/// Default TCP address of the session runtime.
pub const DEFAULT_RUNTIME_ADDR: &str = "127.0.0.1:47624";

#[derive(Parser, Debug)]
#[command(name = "dprun")]
#[command(about = "Host or join a DirectPlay session through a lobby launch")]
#[command(args_override_self = true)]
pub struct Cli {
    /// Host a session. [SESSION] is the instance GUID to use; a random one if omitted.
    #[arg(short = 'H', long, value_name = "SESSION", num_args = 0..=1, conflicts_with = "join")]
    pub host: Option<Option<Guid>>,

    /// Join the session with instance GUID SESSION.
    #[arg(short = 'J', long, value_name = "SESSION")]
    pub join: Option<Guid>,

    /// Name of the local player.
    #[arg(short, long, value_name = "NAME")]
    pub player: Option<String>,

    /// GUID of the application to start.
    #[arg(short = 'A', long, value_name = "GUID")]
    pub application: Option<Guid>,

    /// Service provider GUID or one of TCPIP, IPX, SERIAL, MODEM, DPRUN.
    #[arg(short, long, value_name = "GUID", value_parser = guid::service_provider)]
    pub service_provider: Vec<Guid>,

    /// Address part as KEY=VALUE; VALUE may be "i:<number>", "b:<hex>" or a string.
    ///
    /// KEY is a GUID or one of TotalSize, ServiceProvider, LobbyProvider, Phone,
    /// PhoneW, Modem, ModemW, INet, INetW, INetPort, ComPort.
    #[arg(short = 'a', long, value_name = "KEY=VALUE", value_parser = parse_address)]
    pub address: Vec<AddressElement>,

    /// Name of the session to host or join.
    #[arg(short = 'n', long, value_name = "NAME")]
    pub session_name: Option<String>,

    /// Password of the session to host or join.
    #[arg(short = 'q', long, value_name = "PASSWORD")]
    pub session_password: Option<String>,

    /// TCP address of the session runtime.
    #[arg(long, value_name = "ADDR", default_value = DEFAULT_RUNTIME_ADDR)]
    pub runtime: String,

    /// Write the launched session's instance GUID to this file.
    #[arg(long, value_name = "PATH")]
    pub session_id_file: Option<PathBuf>,
}

fn parse_address(chunk: &str) -> address::Result<AddressElement> {
    address::parse_chunk(chunk)
}

impl Cli {
    /// Parses `args` (program name first) into flags and ordered session options.
    pub fn try_parse_options<I, T>(args: I) -> Result<(Self, Vec<SessionOption>), clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let matches = Self::command().try_get_matches_from(args)?;
        let cli = Self::from_arg_matches(&matches)?;
        let options = cli.session_options(&matches);
        Ok((cli, options))
    }

    fn session_options(&self, matches: &ArgMatches) -> Vec<SessionOption> {
        let mut options = Vec::new();

        if let Some(session) = self.host {
            options.push(SessionOption::Host(session));
        }
        if let Some(session) = self.join {
            options.push(SessionOption::Join(session));
        }
        if let Some(player) = &self.player {
            options.push(SessionOption::Player(player.clone()));
        }
        if let Some(app) = self.application {
            options.push(SessionOption::Application(app));
        }
        if let Some(name) = &self.session_name {
            options.push(SessionOption::SessionName(name.clone()));
        }
        if let Some(password) = &self.session_password {
            options.push(SessionOption::SessionPassword(password.clone()));
        }

        let providers = matches
            .indices_of("service_provider")
            .into_iter()
            .flatten()
            .zip(self.service_provider.iter().map(|p| SessionOption::ServiceProvider(*p)));
        let addresses = matches
            .indices_of("address")
            .into_iter()
            .flatten()
            .zip(self.address.iter().map(|a| SessionOption::Address(a.clone())));

        let mut ordered: Vec<(usize, SessionOption)> = providers.chain(addresses).collect();
        ordered.sort_by_key(|(index, _)| *index);
        options.extend(ordered.into_iter().map(|(_, option)| option));

        options
    }
}
