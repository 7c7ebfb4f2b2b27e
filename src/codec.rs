//! Hex string and little-endian field helpers shared by every decoder.

use crate::error::{DecodeError, Result};

/// Convert a hex string to bytes.
///
/// Both upper and lower case digits are accepted. No separators are allowed;
/// use [`clean_hex`] first for values read as `"aa bb cc"`.
///
/// # Errors
///
/// * `DecodeError::InvalidHex` - odd length or a non-hex character
///
/// # Example
///
/// ```rust
/// use beacon_listener::codec::hex_string_to_bytes;
///
/// assert_eq!(hex_string_to_bytes("01FF").unwrap(), vec![0x01, 0xFF]);
/// assert!(hex_string_to_bytes("0").is_err());
/// ```
pub fn hex_string_to_bytes(hex_str: &str) -> Result<Vec<u8>> {
    if !hex_str.len().is_multiple_of(2) {
        return Err(DecodeError::InvalidHex(format!(
            "Odd number of hex characters: {}",
            hex_str.len()
        )));
    }

    hex::decode(hex_str).map_err(|_| DecodeError::InvalidHex(hex_str.to_string()))
}

/// Render bytes as lowercase hex, two digits per byte, no separators.
#[must_use]
pub fn bytes_to_hex_string(bytes: &[u8]) -> String {
    hex::encode(bytes)
}

/// Strip whitespace, `:` separators and a leading `0x` from a characteristic value.
#[must_use]
pub fn clean_hex(value: &str) -> String {
    value
        .trim()
        .trim_start_matches("0x")
        .chars()
        .filter(|c| !c.is_whitespace() && *c != ':')
        .collect()
}

fn field(bytes: &[u8], offset: usize, width: usize) -> Result<&[u8]> {
    offset
        .checked_add(width)
        .and_then(|end| bytes.get(offset..end))
        .ok_or(DecodeError::OutOfRange {
            offset,
            width,
            len: bytes.len(),
        })
}

/// Little-endian unsigned 16-bit read at `offset`.
///
/// # Errors
///
/// * `DecodeError::OutOfRange` - `offset + 1` is past the end of `bytes`
pub fn short_unsigned_at(bytes: &[u8], offset: usize) -> Result<u16> {
    let b = field(bytes, offset, 2)?;
    Ok(u16::from_le_bytes([b[0], b[1]]))
}

/// Little-endian signed 16-bit read at `offset`.
///
/// Computed as `(i8(high) << 8) | low` in 32-bit arithmetic. The result
/// always fits in an `i16` and equals `i16::from_le_bytes`.
///
/// # Errors
///
/// * `DecodeError::OutOfRange` - `offset + 1` is past the end of `bytes`
pub fn short_signed_at(bytes: &[u8], offset: usize) -> Result<i16> {
    let b = field(bytes, offset, 2)?;
    let upper = i32::from(b[1].cast_signed());
    let lower = i32::from(b[0]);
    // (-128..=127) << 8 | (0..=255) stays within i16
    Ok(((upper << 8) | lower) as i16)
}

/// Little-endian unsigned 24-bit read at `offset`.
///
/// # Errors
///
/// * `DecodeError::OutOfRange` - fewer than 3 bytes remain at `offset`
pub fn three_byte_unsigned_at(bytes: &[u8], offset: usize) -> Result<u32> {
    let b = field(bytes, offset, 3)?;
    Ok(u32::from_le_bytes([b[0], b[1], b[2], 0]))
}
