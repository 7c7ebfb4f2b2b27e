//! Output formatters for beacon observations.
//!
//! This module provides a trait for formatting observations and the InfluxDB
//! line protocol implementation used by the scanner.

pub mod influxdb;

use crate::observation::Observation;

/// Trait for formatting observations into output strings.
///
/// Implementations of this trait convert an `Observation` into a formatted
/// string suitable for a specific output format.
pub trait OutputFormatter: Send + Sync {
    /// Format an observation.
    ///
    /// # Arguments
    /// * `observation` - The beacon to format (includes timestamp)
    ///
    /// # Returns
    /// A formatted string representation of the observation
    fn format(&self, observation: &Observation) -> String;
}
