//! # Identifiers
//!
//! 128-bit identifiers in the braced `{8-4-4-4-12}` text form, plus the well-known
//! address data types and service providers.

use std::fmt;
use std::str::FromStr;

/// The text did not match `{XXXXXXXX-XXXX-XXXX-XXXX-XXXXXXXXXXXX}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseGuidError(pub String);

impl fmt::Display for ParseGuidError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid GUID '{}', required format: {{xxxxxxxx-xxxx-xxxx-xxxx-xxxxxxxxxxxx}}",
            self.0
        )
    }
}

impl std::error::Error for ParseGuidError {}

/// A 128-bit identifier with the Windows field layout.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Guid {
    pub data1: u32,
    pub data2: u16,
    pub data3: u16,
    pub data4: [u8; 8],
}

impl Guid {
    pub const NULL: Guid = Guid::from_fields(0, 0, 0, [0; 8]);

    pub const fn from_fields(data1: u32, data2: u16, data3: u16, data4: [u8; 8]) -> Self {
        Self { data1, data2, data3, data4 }
    }

    /// A random version-4 identifier.
    pub fn new_random() -> Self {
        let mut raw: [u8; 16] = rand::random();
        raw[7] = (raw[7] & 0x0F) | 0x40;
        raw[8] = (raw[8] & 0x3F) | 0x80;
        Self::from_bytes(raw)
    }

    pub fn is_null(&self) -> bool {
        *self == Self::NULL
    }

    /// In-memory layout: the first three fields little-endian, then `data4` verbatim.
    pub fn to_bytes(&self) -> [u8; 16] {
        let mut out = [0u8; 16];
        out[0..4].copy_from_slice(&self.data1.to_le_bytes());
        out[4..6].copy_from_slice(&self.data2.to_le_bytes());
        out[6..8].copy_from_slice(&self.data3.to_le_bytes());
        out[8..16].copy_from_slice(&self.data4);
        out
    }

    pub fn from_bytes(raw: [u8; 16]) -> Self {
        let mut data4 = [0u8; 8];
        data4.copy_from_slice(&raw[8..16]);
        Self {
            data1: u32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]),
            data2: u16::from_le_bytes([raw[4], raw[5]]),
            data3: u16::from_le_bytes([raw[6], raw[7]]),
            data4,
        }
    }
}

impl FromStr for Guid {
    type Err = ParseGuidError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseGuidError(s.to_string());

        let inner = s
            .strip_prefix('{')
            .and_then(|rest| rest.strip_suffix('}'))
            .ok_or_else(err)?;

        let groups: Vec<&str> = inner.split('-').collect();
        let widths = [8, 4, 4, 4, 12];
        if groups.len() != widths.len()
            || groups.iter().zip(widths).any(|(g, w)| g.len() != w || !g.bytes().all(|b| b.is_ascii_hexdigit()))
        {
            return Err(err());
        }

        let data1 = u32::from_str_radix(groups[0], 16).map_err(|_| err())?;
        let data2 = u16::from_str_radix(groups[1], 16).map_err(|_| err())?;
        let data3 = u16::from_str_radix(groups[2], 16).map_err(|_| err())?;

        let mut tail = [0u8; 8];
        let joined = format!("{}{}", groups[3], groups[4]);
        hex::decode_to_slice(&joined, &mut tail).map_err(|_| err())?;

        Ok(Self { data1, data2, data3, data4: tail })
    }
}

impl fmt::Display for Guid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let d = &self.data4;
        write!(
            f,
            "{{{:08X}-{:04X}-{:04X}-{:02X}{:02X}-{:02X}{:02X}{:02X}{:02X}{:02X}{:02X}}}",
            self.data1, self.data2, self.data3, d[0], d[1], d[2], d[3], d[4], d[5], d[6], d[7]
        )
    }
}

impl fmt::Debug for Guid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

// ============================================================================
//  ADDRESS DATA TYPES
// ============================================================================

pub const DPAID_TOTAL_SIZE: Guid = Guid::from_fields(0x1318F560, 0x912C, 0x11D0, [0x9D, 0xAA, 0x00, 0xA0, 0xC9, 0x0A, 0x43, 0xCB]);
pub const DPAID_SERVICE_PROVIDER: Guid = Guid::from_fields(0x07D916C0, 0xE0AF, 0x11CF, [0x9C, 0x4E, 0x00, 0xA0, 0xC9, 0x05, 0x42, 0x5E]);
pub const DPAID_LOBBY_PROVIDER: Guid = Guid::from_fields(0x59B95640, 0x9667, 0x11D0, [0xA7, 0x7D, 0x00, 0x00, 0xF8, 0x03, 0xAB, 0xFC]);
pub const DPAID_PHONE: Guid = Guid::from_fields(0x78EC89A0, 0xE0AF, 0x11CF, [0x9C, 0x4E, 0x00, 0xA0, 0xC9, 0x05, 0x42, 0x5E]);
pub const DPAID_PHONE_W: Guid = Guid::from_fields(0xBA5A7A70, 0x9DBF, 0x11D0, [0x9C, 0xC1, 0x00, 0xA0, 0xC9, 0x05, 0x42, 0x5E]);
pub const DPAID_MODEM: Guid = Guid::from_fields(0xF6DCC200, 0xA2FE, 0x11D0, [0x9C, 0x4F, 0x00, 0xA0, 0xC9, 0x05, 0x42, 0x5E]);
pub const DPAID_MODEM_W: Guid = Guid::from_fields(0x01FD92E0, 0xA2FF, 0x11D0, [0x9C, 0x4F, 0x00, 0xA0, 0xC9, 0x05, 0x42, 0x5E]);
pub const DPAID_INET: Guid = Guid::from_fields(0xC4A54DA0, 0xE0AF, 0x11CF, [0x9C, 0x4E, 0x00, 0xA0, 0xC9, 0x05, 0x42, 0x5E]);
pub const DPAID_INET_W: Guid = Guid::from_fields(0xE63232A0, 0x9DBF, 0x11D0, [0x9C, 0xC1, 0x00, 0xA0, 0xC9, 0x05, 0x42, 0x5E]);
pub const DPAID_INET_PORT: Guid = Guid::from_fields(0xE4524541, 0x8EA5, 0x11D1, [0x8A, 0x96, 0x00, 0x60, 0x97, 0xB0, 0x14, 0x11]);
pub const DPAID_COM_PORT: Guid = Guid::from_fields(0xF2F0CE00, 0xE0AF, 0x11CF, [0x9C, 0x4E, 0x00, 0xA0, 0xC9, 0x05, 0x42, 0x5E]);

/// Address key aliases accepted by `--address`. Matching is exact and case-sensitive.
pub const ADDRESS_KEY_ALIASES: [(&str, Guid); 11] = [
    ("TotalSize", DPAID_TOTAL_SIZE),
    ("ServiceProvider", DPAID_SERVICE_PROVIDER),
    ("LobbyProvider", DPAID_LOBBY_PROVIDER),
    ("Phone", DPAID_PHONE),
    ("PhoneW", DPAID_PHONE_W),
    ("Modem", DPAID_MODEM),
    ("ModemW", DPAID_MODEM_W),
    ("INet", DPAID_INET),
    ("INetW", DPAID_INET_W),
    ("INetPort", DPAID_INET_PORT),
    ("ComPort", DPAID_COM_PORT),
];

// ============================================================================
//  SERVICE PROVIDERS
// ============================================================================

pub const DPSPGUID_IPX: Guid = Guid::from_fields(0x685BC400, 0x9D2C, 0x11CF, [0xA9, 0xCD, 0x00, 0xAA, 0x00, 0x68, 0x86, 0xE3]);
pub const DPSPGUID_TCPIP: Guid = Guid::from_fields(0x36E95EE0, 0x8577, 0x11CF, [0x96, 0x0C, 0x00, 0x80, 0xC7, 0x53, 0x4E, 0x82]);
pub const DPSPGUID_SERIAL: Guid = Guid::from_fields(0x0F1D6860, 0x88D9, 0x11CF, [0x9C, 0x4E, 0x00, 0xA0, 0xC9, 0x05, 0x42, 0x5E]);
pub const DPSPGUID_MODEM: Guid = Guid::from_fields(0x44EAA760, 0xCB68, 0x11CF, [0x9C, 0x4E, 0x00, 0xA0, 0xC9, 0x05, 0x42, 0x5E]);
/// This tool's own provider; only available while registered.
pub const DPSPGUID_DPRUN: Guid = Guid::from_fields(0xB1ED2367, 0x609B, 0x4C5C, [0x87, 0x55, 0xD2, 0xA2, 0x9B, 0xB9, 0xA5, 0x54]);

/// Service provider aliases accepted by `--service-provider`.
pub const SERVICE_PROVIDER_ALIASES: [(&str, Guid); 5] = [
    ("IPX", DPSPGUID_IPX),
    ("TCPIP", DPSPGUID_TCPIP),
    ("SERIAL", DPSPGUID_SERIAL),
    ("MODEM", DPSPGUID_MODEM),
    ("DPRUN", DPSPGUID_DPRUN),
];

fn lookup(table: &[(&str, Guid)], token: &str) -> Result<Guid, ParseGuidError> {
    match table.iter().find(|(alias, _)| *alias == token) {
        Some((_, guid)) => Ok(*guid),
        None => token.parse(),
    }
}

/// Resolves an address key alias, falling back to GUID text.
pub fn address_key(token: &str) -> Result<Guid, ParseGuidError> {
    lookup(&ADDRESS_KEY_ALIASES, token)
}

/// Resolves a service provider alias, falling back to GUID text.
pub fn service_provider(token: &str) -> Result<Guid, ParseGuidError> {
    lookup(&SERVICE_PROVIDER_ALIASES, token)
}

/// Human name for a well-known provider.
pub fn provider_name(guid: &Guid) -> Option<&'static str> {
    SERVICE_PROVIDER_ALIASES
        .iter()
        .find(|(_, g)| g == guid)
        .map(|(name, _)| *name)
}
