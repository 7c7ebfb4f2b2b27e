//! `beacon-listener` library.
//!
//! Wire-format core for BLE beacons: a hex/byte codec, an AD structure
//! walker, the HCI LE Advertising Report parser, Eddystone and iBeacon
//! codecs, and the TI SensorTag value decoders.
//!
//! The binary (`src/main.rs`) is responsible for process setup and exit codes.
//! The core “business logic” lives in [`crate::app`] where it can be tested
//! deterministically with an injected advertisement source + injected output streams.

pub mod ad;
pub mod address;
pub mod advertising;
pub mod app;
pub mod beacon;
pub mod codec;
pub mod error;
pub mod observation;
pub mod output;
pub mod report;
pub mod scanner;
pub mod sensortag;
pub mod throttle;

#[cfg(test)]
pub(crate) mod test_utils;

// Re-export commonly used types at the crate root
pub use address::DeviceAddress;
pub use beacon::{
    Beacon, BeaconBatch, BeaconFactory, BeaconFlags, BeaconFrame, BeaconKind, EddystoneFactory,
    EddystoneFrame, IBeacon, IBeaconFactory, SkippedReport,
};
pub use error::{DecodeError, EncodeError};
pub use observation::Observation;
pub use output::OutputFormatter;
pub use output::influxdb::InfluxDbFormatter;
pub use report::{AdvertisingReportRecord, AdvertisingReportSet, parse_advertisement};
pub use scanner::{Backend, BackendConfig, RawEvent, ScanError};
pub use throttle::{Throttle, parse_duration};
