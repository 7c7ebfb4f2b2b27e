//! InfluxDB line protocol output formatter.

use crate::beacon::{BeaconFrame, EddystoneFrame};
use crate::observation::Observation;
use crate::output::OutputFormatter;
use crate::sensortag::{Firmware, SensorReading};
use log::debug;
use std::collections::BTreeMap;
use std::fmt;
use std::time::SystemTime;

/// Field values for InfluxDB line protocol
#[derive(Debug, PartialEq)]
pub enum FieldValue {
    Float(f64),
    Integer(i64),
    String(String),
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            FieldValue::Float(num) => write!(f, "{num}"),
            FieldValue::Integer(num) => write!(f, "{num}i"),
            FieldValue::String(s) => {
                write!(f, "\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\""))
            }
        }
    }
}

/// Data point in InfluxDB line protocol
#[derive(Debug)]
pub struct DataPoint {
    pub measurement: String,
    pub tag_set: BTreeMap<String, String>,
    pub field_set: BTreeMap<String, FieldValue>,
    pub timestamp: Option<SystemTime>,
}

fn fmt_tags(data_point: &DataPoint, fmt: &mut fmt::Formatter) -> fmt::Result {
    for (key, value) in data_point.tag_set.iter() {
        write!(fmt, ",{}={}", key, value)?;
    }
    Ok(())
}

fn fmt_fields(data_point: &DataPoint, fmt: &mut fmt::Formatter) -> fmt::Result {
    let mut first = true;
    for (key, value) in data_point.field_set.iter() {
        if first {
            first = false;
        } else {
            write!(fmt, ",")?;
        }
        write!(fmt, "{}={}", key, value)?;
    }
    Ok(())
}

fn fmt_timestamp(data_point: &DataPoint, fmt: &mut fmt::Formatter) -> fmt::Result {
    // Clocks before the epoch get no timestamp, the server fills in its own
    if let Some(since_epoch) = data_point
        .timestamp
        .and_then(|time| time.duration_since(SystemTime::UNIX_EPOCH).ok())
    {
        write!(fmt, " {}", since_epoch.as_nanos())?;
    }
    Ok(())
}

impl fmt::Display for DataPoint {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        write!(fmt, "{}", self.measurement)?;
        fmt_tags(self, fmt)?;
        write!(fmt, " ")?;
        fmt_fields(self, fmt)?;
        fmt_timestamp(self, fmt)
    }
}

/// InfluxDB line protocol formatter.
///
/// Formats beacon observations according to the InfluxDB line protocol
/// specification, one line per observation.
pub struct InfluxDbFormatter {
    /// The measurement name in InfluxDB
    measurement_name: String,
}

impl InfluxDbFormatter {
    /// Create a new InfluxDB formatter.
    ///
    /// # Arguments
    /// * `measurement_name` - The measurement name to use in the line protocol
    pub fn new(measurement_name: String) -> Self {
        Self { measurement_name }
    }

    /// Build the tag set for InfluxDB line protocol.
    ///
    /// Tags include the device address (when known), the beacon kind and,
    /// for Eddystone, the frame type.
    fn tag_set(&self, observation: &Observation) -> BTreeMap<String, String> {
        let beacon = &observation.beacon;
        let mut tags = BTreeMap::new();
        if let Some(address) = beacon.address {
            tags.insert("address".to_string(), address.to_string());
        }
        tags.insert("kind".to_string(), beacon.kind().to_string());
        if let BeaconFrame::Eddystone(frame) = &beacon.frame {
            tags.insert("frame".to_string(), frame.frame_type().to_string());
        }
        tags
    }

    /// Build the field set for InfluxDB line protocol.
    ///
    /// Only includes fields the frame carries.
    fn field_set(&self, observation: &Observation) -> BTreeMap<String, FieldValue> {
        let beacon = &observation.beacon;
        let mut fields = BTreeMap::new();

        macro_rules! add {
            ($name:literal, $val:expr) => {
                fields.insert($name.into(), $val);
            };
        }

        if let Some(rssi) = beacon.rssi {
            add!("rssi", FieldValue::Integer(i64::from(rssi)));
        }
        add!("tx_power", FieldValue::Integer(i64::from(beacon.tx_power)));
        add!("flags", FieldValue::Integer(i64::from(beacon.flags.to_byte())));

        match &beacon.frame {
            BeaconFrame::Eddystone(EddystoneFrame::Uid {
                namespace,
                instance,
            }) => {
                add!("namespace", FieldValue::String(namespace.clone()));
                add!("instance", FieldValue::String(instance.clone()));
            }
            BeaconFrame::Eddystone(frame @ EddystoneFrame::Url { .. }) => {
                if let Some(url) = frame.full_url() {
                    add!("url", FieldValue::String(url));
                }
            }
            BeaconFrame::Eddystone(_) => {}
            BeaconFrame::IBeacon(ibeacon) => {
                add!(
                    "uuid",
                    FieldValue::String(ibeacon.uuid.hyphenated().to_string())
                );
                add!("major", FieldValue::Integer(i64::from(ibeacon.major)));
                add!("minor", FieldValue::Integer(i64::from(ibeacon.minor)));
            }
        }

        fields
    }

    fn to_data_point(&self, observation: &Observation) -> DataPoint {
        DataPoint {
            measurement: self.measurement_name.clone(),
            tag_set: self.tag_set(observation),
            field_set: self.field_set(observation),
            timestamp: Some(observation.timestamp),
        }
    }
}

impl OutputFormatter for InfluxDbFormatter {
    fn format(&self, observation: &Observation) -> String {
        format!("{}", self.to_data_point(observation))
    }
}

/// Render a decoded SensorTag reading as one line, without a timestamp.
///
/// NaN and infinite values have no line protocol representation and are
/// left out. Returns `None` when no field remains.
///
/// # Example
/// ```
/// use beacon_listener::output::influxdb::format_reading;
/// use beacon_listener::sensortag::{Firmware, SensorReading};
///
/// let line = format_reading("sensortag", Firmware::Cc2650, &SensorReading::Light(100.0));
/// assert_eq!(line.unwrap(), "sensortag,firmware=cc2650,sensor=light light=100");
///
/// let line = format_reading("sensortag", Firmware::Cc2650, &SensorReading::Light(f64::NAN));
/// assert!(line.is_none());
/// ```
pub fn format_reading(
    measurement: &str,
    firmware: Firmware,
    reading: &SensorReading,
) -> Option<String> {
    let mut tag_set = BTreeMap::new();
    tag_set.insert("firmware".to_string(), firmware.to_string());
    tag_set.insert("sensor".to_string(), reading.sensor().to_string());

    let mut field_set = BTreeMap::new();
    if let SensorReading::FirmwareRevision(revision) = reading {
        field_set.insert("revision".to_string(), FieldValue::String(revision.clone()));
    }
    for (name, value) in reading.fields() {
        if value.is_finite() {
            field_set.insert(name.to_string(), FieldValue::Float(value));
        } else {
            debug!("Dropping non-finite {} {name}: {value}", reading.sensor());
        }
    }

    if field_set.is_empty() {
        return None;
    }

    let data_point = DataPoint {
        measurement: measurement.to_string(),
        tag_set,
        field_set,
        timestamp: None,
    };
    Some(format!("{}", data_point))
}
