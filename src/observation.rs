//! A beacon seen by the scanner.

use crate::beacon::Beacon;
use std::time::SystemTime;

/// A decoded beacon together with the time its report was received.
///
/// Address and RSSI live on the beacon itself, filled in from the
/// advertising report it was decoded from.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub beacon: Beacon,
    /// Timestamp when the report was received
    pub timestamp: SystemTime,
}

impl Observation {
    #[must_use]
    pub fn new(beacon: Beacon, timestamp: SystemTime) -> Self {
        Self { beacon, timestamp }
    }

    /// An observation stamped with the current time.
    #[must_use]
    pub fn now(beacon: Beacon) -> Self {
        Self::new(beacon, SystemTime::now())
    }
}
