//! # Session Descriptor
//!
//! Everything needed to host or join a session, assembled one option at a time.
//! Validation is deferred to `validate` so option order never matters.

use std::fmt;

use crate::address::AddressElement;
use crate::address::CompoundAddress;
use crate::guid::DPAID_SERVICE_PROVIDER;
use crate::guid::Guid;

/// Host a new session or join an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionMode {
    Host,
    Join,
}

/// A field that must be set before launch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequiredField {
    Mode,
    PlayerName,
    Application,
    ServiceProvider,
    /// Joining needs the id of the session to join.
    SessionId,
}

impl fmt::Display for RequiredField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let flag = match self {
            RequiredField::Mode => "--host or --join",
            RequiredField::PlayerName => "--player",
            RequiredField::Application => "--application",
            RequiredField::ServiceProvider => "--service-provider",
            RequiredField::SessionId => "--join <session>",
        };
        write!(f, "{}", flag)
    }
}

/// Descriptor validation failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Every missing field, in a fixed order.
    MissingRequiredField(Vec<RequiredField>),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::MissingRequiredField(fields) => {
                write!(f, "missing")?;
                for (i, field) in fields.iter().enumerate() {
                    write!(f, "{} {}", if i == 0 { "" } else { "," }, field)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for Error {}

pub type Result<T> = std::result::Result<T, Error>;

/// One parsed command-line setting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionOption {
    /// Host, optionally with a fixed session instance id.
    Host(Option<Guid>),
    Join(Guid),
    Player(String),
    Application(Guid),
    /// Sets the provider and appends a matching `ServiceProvider` element.
    ServiceProvider(Guid),
    Address(AddressElement),
    SessionName(String),
    SessionPassword(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionDescriptor {
    pub mode: Option<SessionMode>,
    pub session_id: Guid,
    pub application: Guid,
    pub service_provider: Guid,
    pub player_name: Option<String>,
    pub session_name: Option<String>,
    pub session_password: Option<String>,
    pub address: CompoundAddress,
}

impl SessionDescriptor {
    /// Null identifiers and an empty address.
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies an option. Scalars are overwritten; addresses accumulate.
    pub fn apply(&mut self, option: SessionOption) {
        match option {
            SessionOption::Host(session) => {
                self.mode = Some(SessionMode::Host);
                self.session_id = session.unwrap_or_else(Guid::new_random);
            }
            SessionOption::Join(session) => {
                self.mode = Some(SessionMode::Join);
                self.session_id = session;
            }
            SessionOption::Player(name) => self.player_name = Some(name),
            SessionOption::Application(app) => self.application = app,
            SessionOption::ServiceProvider(provider) => {
                self.service_provider = provider;
                self.address.add_element(DPAID_SERVICE_PROVIDER, provider.to_bytes());
            }
            SessionOption::Address(element) => self.address.add(element),
            SessionOption::SessionName(name) => self.session_name = Some(name),
            SessionOption::SessionPassword(password) => self.session_password = Some(password),
        }
    }

    pub fn is_host(&self) -> bool {
        self.mode == Some(SessionMode::Host)
    }

    /// Checks the required fields, reporting all that are missing at once.
    pub fn validate(&self) -> Result<()> {
        let mut missing = Vec::new();
        match self.mode {
            None => missing.push(RequiredField::Mode),
            Some(SessionMode::Join) if self.session_id.is_null() => missing.push(RequiredField::SessionId),
            Some(_) => {}
        }
        if self.player_name.as_deref().is_none_or(str::is_empty) {
            missing.push(RequiredField::PlayerName);
        }
        if self.application.is_null() {
            missing.push(RequiredField::Application);
        }
        if self.service_provider.is_null() {
            missing.push(RequiredField::ServiceProvider);
        }

        if missing.is_empty() {
            Ok(())
        } else {
            Err(Error::MissingRequiredField(missing))
        }
    }
}

impl FromIterator<SessionOption> for SessionDescriptor {
    fn from_iter<T: IntoIterator<Item = SessionOption>>(iter: T) -> Self {
        let mut desc = Self::new();
        for option in iter {
            desc.apply(option);
        }
        desc
    }
}
