//! # Service Provider Registry
//!
//! The set of transport providers a runtime can launch with. This tool's own
//! provider (`DPRUN`) is only present while registered, and registration is
//! held by a `ProviderGuard` so every exit path unregisters it.

use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use crate::guid;
use crate::guid::Guid;

/// Registry failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    AlreadyRegistered(Guid),
    NotRegistered(Guid),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::AlreadyRegistered(guid) => write!(f, "service provider {} is already registered", guid),
            Error::NotRegistered(guid) => write!(f, "service provider {} is not registered", guid),
        }
    }
}

impl std::error::Error for Error {}

pub type Result<T> = std::result::Result<T, Error>;

/// Makes a provider discoverable by the session runtime.
pub trait ProviderRegistry: Send + Sync {
    fn register(&self) -> Result<()>;
    fn unregister(&self) -> Result<()>;
}

/// Providers currently available, keyed by GUID.
#[derive(Debug, Default)]
pub struct ProviderTable {
    entries: DashMap<Guid, String>,
}

impl ProviderTable {
    /// An empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// IPX, TCP/IP, serial and modem, but not `DPRUN`.
    pub fn with_system_providers() -> Self {
        let table = Self::new();
        for (name, provider) in guid::SERVICE_PROVIDER_ALIASES {
            if provider != guid::DPSPGUID_DPRUN {
                table.entries.insert(provider, name.to_string());
            }
        }
        table
    }

    pub fn contains(&self, guid: &Guid) -> bool {
        self.entries.contains_key(guid)
    }

    pub fn name(&self, guid: &Guid) -> Option<String> {
        self.entries.get(guid).map(|entry| entry.value().clone())
    }

    pub fn insert(&self, guid: Guid, name: impl Into<String>) -> Result<()> {
        match self.entries.entry(guid) {
            Entry::Occupied(_) => Err(Error::AlreadyRegistered(guid)),
            Entry::Vacant(slot) => {
                slot.insert(name.into());
                Ok(())
            }
        }
    }

    pub fn remove(&self, guid: &Guid) -> Result<()> {
        self.entries.remove(guid).map(|_| ()).ok_or(Error::NotRegistered(*guid))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Registers this tool's `DPRUN` provider into a shared table.
#[derive(Debug, Clone)]
pub struct BuiltinProvider {
    table: Arc<ProviderTable>,
}

impl BuiltinProvider {
    pub fn new(table: Arc<ProviderTable>) -> Self {
        Self { table }
    }
}

impl ProviderRegistry for BuiltinProvider {
    fn register(&self) -> Result<()> {
        self.table.insert(guid::DPSPGUID_DPRUN, "DPRUN")?;
        tracing::debug!("registered DPRun service provider");
        Ok(())
    }

    fn unregister(&self) -> Result<()> {
        self.table.remove(&guid::DPSPGUID_DPRUN)?;
        tracing::debug!("unregistered DPRun service provider");
        Ok(())
    }
}

/// Scoped registration of the built-in provider.
///
/// Registers on `acquire` only when `DPRUN` is the selected provider.
/// Unregisters on `release`, or on drop if never released.
pub struct ProviderGuard<'a> {
    registry: Option<&'a dyn ProviderRegistry>,
}

impl<'a> ProviderGuard<'a> {
    pub fn acquire(registry: &'a dyn ProviderRegistry, provider: Guid) -> Result<Self> {
        if provider != guid::DPSPGUID_DPRUN {
            return Ok(Self { registry: None });
        }
        registry.register()?;
        Ok(Self { registry: Some(registry) })
    }

    pub fn is_registered(&self) -> bool {
        self.registry.is_some()
    }

    /// Unregisters now and reports the outcome.
    pub fn release(mut self) -> Result<()> {
        match self.registry.take() {
            Some(registry) => registry.unregister(),
            None => Ok(()),
        }
    }
}

impl Drop for ProviderGuard<'_> {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.take() {
            if let Err(e) = registry.unregister() {
                tracing::warn!("could not unregister DPRun service provider: {}", e);
            }
        }
    }
}
