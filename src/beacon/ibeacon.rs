//! Apple iBeacon frames.
//!
//! An iBeacon is a Manufacturer Specific Data structure starting with the
//! Apple company code (`0x004C`, little-endian) and the iBeacon type/length
//! bytes `02 15`, followed by a 16 byte proximity UUID, big-endian major and
//! minor numbers and the calibrated tx power.

use super::{Beacon, BeaconFactory, BeaconFlags, BeaconKind};
use crate::ad::{AD_TYPE_FLAGS, AD_TYPE_MANUFACTURER_DATA, ad_structures};
use crate::error::{DecodeError, Result};
use uuid::Uuid;

/// Company code and beacon type bytes that open an iBeacon structure.
pub const IBEACON_PREFIX: [u8; 4] = [0x4C, 0x00, 0x02, 0x15];

// prefix + uuid + major + minor + tx power
const IBEACON_DATA_LENGTH: usize = 4 + 16 + 2 + 2 + 1;

// Advertising data framing
const PACKET_LENGTH: &str = "1e";
const MANUFACTURER_HEADER: &str = "1aff4c000215";

/// Format specific part of an iBeacon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IBeacon {
    pub uuid: Uuid,
    pub major: u16,
    pub minor: u16,
}

impl IBeacon {
    #[must_use]
    pub fn new(uuid: Uuid, major: u16, minor: u16) -> Self {
        Self { uuid, major, minor }
    }

    pub(super) fn encode(&self, flags: &str, tx_power: &str) -> String {
        format!(
            "{PACKET_LENGTH}{flags}{MANUFACTURER_HEADER}{}{:04x}{:04x}{tx_power}00",
            self.uuid.simple(),
            self.major,
            self.minor
        )
    }
}

/// Recognises iBeacon advertisements.
#[derive(Debug, Default, Clone, Copy)]
pub struct IBeaconFactory;

impl BeaconFactory for IBeaconFactory {
    fn kind(&self) -> BeaconKind {
        BeaconKind::IBeacon
    }

    fn parse_eir(&self, data: &[u8]) -> Result<Option<Beacon>> {
        let mut flags = BeaconFlags::NONE;

        for structure in ad_structures(data) {
            let structure = structure?;
            match structure.ad_type {
                AD_TYPE_FLAGS if !structure.data.is_empty() => {
                    flags = BeaconFlags::from_byte(structure.data[0]);
                }
                AD_TYPE_MANUFACTURER_DATA if structure.data.starts_with(&IBEACON_PREFIX) => {
                    let mut beacon = decode_manufacturer_data(structure.data)?;
                    beacon.flags = flags;
                    return Ok(Some(beacon));
                }
                _ => {}
            }
        }

        Ok(None)
    }
}

fn decode_manufacturer_data(data: &[u8]) -> Result<Beacon> {
    if data.len() < IBEACON_DATA_LENGTH {
        return Err(DecodeError::invalid_length(IBEACON_DATA_LENGTH, data.len()));
    }

    let mut uuid = [0u8; 16];
    uuid.copy_from_slice(&data[4..20]);
    let major = u16::from_be_bytes([data[20], data[21]]);
    let minor = u16::from_be_bytes([data[22], data[23]]);
    let tx_power = data[24].cast_signed();

    Ok(Beacon::ibeacon(
        IBeacon::new(Uuid::from_bytes(uuid), major, minor),
        tx_power,
    ))
}
