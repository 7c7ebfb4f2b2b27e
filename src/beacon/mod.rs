//! Beacon frames shared by the Eddystone and iBeacon codecs.
//!
//! A [`Beacon`] is the common part of every advertised beacon (flags, tx
//! power, and the address/RSSI it was received with) plus a tagged
//! [`BeaconFrame`] holding the format specific fields. Decoding goes through a
//! [`BeaconFactory`] per format; encoding produces the hex string handed to
//! the controller's "LE Set Advertising Data" command.

pub mod eddystone;
pub mod ibeacon;

use crate::address::DeviceAddress;
use crate::error::{DecodeError, EncodeError, Result};
use crate::report::{AdvertisingReportRecord, AdvertisingReportSet};
use log::{debug, warn};
use std::fmt;

pub use eddystone::{EddystoneFactory, EddystoneFrame, FrameType, UrlScheme};
pub use ibeacon::{IBeacon, IBeaconFactory};

// Framing shared by both encoders
const FLAGS_STRUCTURE: &str = "0201";

/// The five low bits of the AD Flags structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BeaconFlags {
    pub le_limited: bool,
    pub le_general: bool,
    pub br_edr_supported: bool,
    pub le_br_controller: bool,
    pub le_br_host: bool,
}

impl BeaconFlags {
    /// No flag bits set, as decoded from an advertisement without a Flags structure.
    pub const NONE: Self = Self {
        le_limited: false,
        le_general: false,
        br_edr_supported: false,
        le_br_controller: false,
        le_br_host: false,
    };

    /// Unpack bits 0-4 of a Flags byte. The top three bits are ignored.
    #[must_use]
    pub fn from_byte(raw: u8) -> Self {
        Self {
            le_limited: raw & 0x01 != 0,
            le_general: raw & 0x02 != 0,
            br_edr_supported: raw & 0x04 != 0,
            le_br_controller: raw & 0x08 != 0,
            le_br_host: raw & 0x10 != 0,
        }
    }

    /// Pack the flags into a byte whose top three bits are zero.
    #[must_use]
    pub fn to_byte(self) -> u8 {
        u8::from(self.le_limited)
            | u8::from(self.le_general) << 1
            | u8::from(self.br_edr_supported) << 2
            | u8::from(self.le_br_controller) << 3
            | u8::from(self.le_br_host) << 4
    }
}

impl Default for BeaconFlags {
    /// Flags used for beacons built locally: `0x1a`.
    fn default() -> Self {
        Self {
            le_limited: false,
            le_general: true,
            br_edr_supported: false,
            le_br_controller: true,
            le_br_host: true,
        }
    }
}

/// Beacon format, used for filtering and as an output tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BeaconKind {
    Eddystone,
    IBeacon,
}

impl fmt::Display for BeaconKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BeaconKind::Eddystone => write!(f, "eddystone"),
            BeaconKind::IBeacon => write!(f, "ibeacon"),
        }
    }
}

/// Format specific part of a beacon.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BeaconFrame {
    Eddystone(EddystoneFrame),
    IBeacon(IBeacon),
}

/// A beacon advertisement, either decoded from a report or built for transmission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Beacon {
    pub flags: BeaconFlags,
    /// Calibrated tx power in dBm
    pub tx_power: i8,
    /// Set by [`BeaconFactory::create_beacons`] from the report
    pub rssi: Option<i8>,
    /// Set by [`BeaconFactory::create_beacons`] from the report
    pub address: Option<DeviceAddress>,
    pub frame: BeaconFrame,
}

impl Beacon {
    /// A locally built Eddystone beacon with default flags.
    #[must_use]
    pub fn eddystone(frame: EddystoneFrame, tx_power: i8) -> Self {
        Self::new(BeaconFrame::Eddystone(frame), tx_power)
    }

    /// A locally built iBeacon with default flags.
    #[must_use]
    pub fn ibeacon(ibeacon: IBeacon, tx_power: i8) -> Self {
        Self::new(BeaconFrame::IBeacon(ibeacon), tx_power)
    }

    fn new(frame: BeaconFrame, tx_power: i8) -> Self {
        Self {
            flags: BeaconFlags::default(),
            tx_power,
            rssi: None,
            address: None,
            frame,
        }
    }

    #[must_use]
    pub fn kind(&self) -> BeaconKind {
        match self.frame {
            BeaconFrame::Eddystone(_) => BeaconKind::Eddystone,
            BeaconFrame::IBeacon(_) => BeaconKind::IBeacon,
        }
    }

    /// Build the advertising data hex string for this beacon.
    ///
    /// # Errors
    ///
    /// Returns an [`EncodeError`] when the frame cannot be put on the wire
    /// (URL too long or with an unknown scheme, TLM/EID frames, malformed UID).
    pub fn try_encode(&self) -> std::result::Result<String, EncodeError> {
        let flags = flags_hex(self.flags);
        let tx_power = tx_power_hex(self.tx_power);
        match &self.frame {
            BeaconFrame::Eddystone(frame) => frame.encode(&flags, &tx_power),
            BeaconFrame::IBeacon(ibeacon) => Ok(ibeacon.encode(&flags, &tx_power)),
        }
    }

    /// Best-effort variant of [`Beacon::try_encode`].
    ///
    /// Refusals are logged as warnings and yield an empty string, so callers
    /// must check for empty output before transmitting.
    #[must_use]
    pub fn encode(&self) -> String {
        self.try_encode().unwrap_or_else(|e| {
            warn!("Not encoding {} beacon: {}", self.kind(), e);
            String::new()
        })
    }
}

/// Render a tx power as a two's-complement byte, e.g. `-59` as `c5`.
#[must_use]
pub fn tx_power_hex(tx_power: i8) -> String {
    format!("{:02x}", tx_power.cast_unsigned())
}

/// Render the Flags AD structure, `02 01 <flags>`.
fn flags_hex(flags: BeaconFlags) -> String {
    format!("{FLAGS_STRUCTURE}{:02x}", flags.to_byte())
}

/// A report whose beacon structure matched but failed to decode.
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedReport {
    pub address: DeviceAddress,
    pub kind: BeaconKind,
    pub error: DecodeError,
}

impl fmt::Display for SkippedReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.address, self.error)
    }
}

/// Result of decoding one report batch with one factory.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BeaconBatch {
    /// Decoded beacons in report order
    pub beacons: Vec<Beacon>,
    /// Malformed reports, in report order
    pub skipped: Vec<SkippedReport>,
}

/// Turns advertising reports into beacons of one format.
pub trait BeaconFactory: Send + Sync {
    /// Beacon format this factory recognises.
    fn kind(&self) -> BeaconKind;

    /// Look for a beacon in one AD payload.
    ///
    /// Returns `Ok(None)` when the payload carries no beacon of this format.
    ///
    /// # Errors
    ///
    /// Returns a [`crate::DecodeError`] when the payload is truncated or a
    /// matching structure is too short for its frame.
    fn parse_eir(&self, data: &[u8]) -> Result<Option<Beacon>>;

    /// Decode one report, stamping the beacon with the report's address and RSSI.
    ///
    /// # Errors
    ///
    /// Same as [`BeaconFactory::parse_eir`].
    fn beacon_from_record(&self, record: &AdvertisingReportRecord) -> Result<Option<Beacon>> {
        Ok(self.parse_eir(&record.report_data)?.map(|mut beacon| {
            beacon.address = Some(record.address);
            beacon.rssi = Some(record.rssi);
            beacon
        }))
    }

    /// Decode every report of an event, skipping reports that are not beacons.
    ///
    /// Called once per received batch. Malformed reports are logged at debug
    /// level and returned in [`BeaconBatch::skipped`] instead of failing the
    /// whole batch.
    fn create_beacons(&self, set: &AdvertisingReportSet) -> BeaconBatch {
        let mut batch = BeaconBatch::default();
        for record in &set.reports {
            match self.beacon_from_record(record) {
                Ok(Some(beacon)) => batch.beacons.push(beacon),
                Ok(None) => {}
                Err(error) => {
                    debug!(
                        "Skipping {} report from {}: {}",
                        self.kind(),
                        record.address,
                        error
                    );
                    batch.skipped.push(SkippedReport {
                        address: record.address,
                        kind: self.kind(),
                        error,
                    });
                }
            }
        }
        batch
    }
}
