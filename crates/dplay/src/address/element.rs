use std::fmt;

use crate::guid::Guid;

/// Payload bytes shown by `Display` before truncation.
const DISPLAY_LIMIT: usize = 99;

/// One typed key/value transport parameter.
///
/// The payload is length-prefixed binary data and is kept exactly as supplied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressElement {
    data_type: Guid,
    payload: Vec<u8>,
}

impl AddressElement {
    pub fn new(data_type: Guid, payload: impl Into<Vec<u8>>) -> Self {
        Self { data_type, payload: payload.into() }
    }

    /// Stores a number as 4 little-endian bytes.
    pub fn from_u32(data_type: Guid, value: u32) -> Self {
        Self::new(data_type, value.to_le_bytes())
    }

    /// Stores a string with its trailing NUL byte counted in the payload.
    pub fn from_str_nul(data_type: Guid, value: &str) -> Self {
        let mut payload = Vec::with_capacity(value.len() + 1);
        payload.extend_from_slice(value.as_bytes());
        payload.push(0);
        Self::new(data_type, payload)
    }

    pub fn data_type(&self) -> Guid {
        self.data_type
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    pub fn len(&self) -> usize {
        self.payload.len()
    }

    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }
}

impl fmt::Display for AddressElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let shown = &self.payload[..self.payload.len().min(DISPLAY_LIMIT)];
        let shown = match shown.iter().position(|&b| b == 0) {
            Some(nul) => &shown[..nul],
            None => shown,
        };
        write!(f, "{} - {}", self.data_type, String::from_utf8_lossy(shown))
    }
}
