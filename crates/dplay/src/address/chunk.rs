//! `KEY=VALUE` address chunks from the command line.
//!
//! ```text
//! {685BC400-9D2C-11cf-A9CD-00AA006886E3}=i:8000
//! INetPort=b:401F
//! INet=127.0.0.1
//! ```

use super::AddressElement;
use super::Error;
use super::Result;
use crate::guid;

/// Longest key accepted before the `=`.
pub const MAX_KEY_LEN: usize = 55;

/// Parses one `KEY=VALUE` chunk into an element.
///
/// The split happens at the first `=`; the value may contain further `=` signs.
pub fn parse_chunk(chunk: &str) -> Result<AddressElement> {
    let Some((key, value)) = chunk.split_once('=') else {
        return Err(Error::MissingSeparator(chunk.to_string()));
    };
    if key.len() > MAX_KEY_LEN {
        return Err(Error::KeyTooLong { chunk: chunk.to_string(), len: key.len() });
    }

    let data_type = guid::address_key(key)?;

    if let Some(digits) = value.strip_prefix("i:") {
        return Ok(AddressElement::from_u32(data_type, atoi(digits) as u32));
    }

    if let Some(hex_text) = value.strip_prefix("b:") {
        let payload = hex::decode(hex_text).map_err(|e| Error::InvalidHex {
            chunk: chunk.to_string(),
            reason: e.to_string(),
        })?;
        return Ok(AddressElement::new(data_type, payload));
    }

    Ok(AddressElement::from_str_nul(data_type, value))
}

/// C `atoi`: optional whitespace and sign, then the longest digit prefix.
/// No digits yields zero; overflow wraps.
fn atoi(text: &str) -> i32 {
    let text = text.trim_start();
    let (negative, digits) = match text.as_bytes().first() {
        Some(b'-') => (true, &text[1..]),
        Some(b'+') => (false, &text[1..]),
        _ => (false, text),
    };

    let value = digits
        .bytes()
        .take_while(u8::is_ascii_digit)
        .fold(0i32, |acc, b| acc.wrapping_mul(10).wrapping_add(i32::from(b - b'0')));

    if negative { value.wrapping_neg() } else { value }
}

#[cfg(test)]
mod tests {
    use super::atoi;

    #[test]
    fn test_atoi_legacy_semantics() {
        assert_eq!(atoi("8000"), 8000);
        assert_eq!(atoi("  42abc"), 42);
        assert_eq!(atoi("-1"), -1);
        assert_eq!(atoi("+7"), 7);
        assert_eq!(atoi("port"), 0);
        assert_eq!(atoi(""), 0);
    }
}
