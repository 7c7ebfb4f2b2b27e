//! Bluetooth device addresses as carried in HCI advertising reports.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A 48-bit Bluetooth device address, most significant byte first.
///
/// HCI transmits addresses least significant byte first; use
/// [`DeviceAddress::from_hci_bytes`] for bytes taken straight from an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct DeviceAddress(pub [u8; 6]);

impl DeviceAddress {
    /// Build an address from the little-endian byte order used on the HCI wire.
    #[must_use]
    pub fn from_hci_bytes(mut bytes: [u8; 6]) -> Self {
        bytes.reverse();
        Self(bytes)
    }
}

impl fmt::Display for DeviceAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(f, "{a:02X}:{b:02X}:{c:02X}:{d:02X}:{e:02X}:{g:02X}")
    }
}

/// Errors returned when parsing an address string.
#[derive(Error, Debug, PartialEq)]
pub enum ParseAddressError {
    #[error("invalid address: expected 6 parts, got {0}")]
    InvalidLength(usize),
    #[error("invalid address: part {0} has wrong length")]
    InvalidPartLength(usize),
    #[error("invalid address: '{0}' is not valid hex")]
    InvalidHex(String),
}

impl FromStr for DeviceAddress {
    type Err = ParseAddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(':').collect();
        if parts.len() != 6 {
            return Err(ParseAddressError::InvalidLength(parts.len()));
        }

        let mut bytes = [0u8; 6];
        for (i, (part, byte)) in parts.iter().zip(bytes.iter_mut()).enumerate() {
            if part.len() != 2 {
                return Err(ParseAddressError::InvalidPartLength(i));
            }
            *byte = u8::from_str_radix(part, 16)
                .map_err(|_| ParseAddressError::InvalidHex((*part).to_string()))?;
        }

        Ok(Self(bytes))
    }
}

/// Address type byte of an advertising report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressType {
    Public,
    Random,
    PublicIdentity,
    RandomIdentity,
    Other(u8),
}

impl From<u8> for AddressType {
    fn from(raw: u8) -> Self {
        match raw {
            0x00 => AddressType::Public,
            0x01 => AddressType::Random,
            0x02 => AddressType::PublicIdentity,
            0x03 => AddressType::RandomIdentity,
            other => AddressType::Other(other),
        }
    }
}

impl From<AddressType> for u8 {
    fn from(kind: AddressType) -> Self {
        match kind {
            AddressType::Public => 0x00,
            AddressType::Random => 0x01,
            AddressType::PublicIdentity => 0x02,
            AddressType::RandomIdentity => 0x03,
            AddressType::Other(raw) => raw,
        }
    }
}
