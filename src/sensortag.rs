//! Decoders for TI SensorTag characteristic values.
//!
//! Every decoder takes the characteristic value as a hex string (spaces and
//! `:` separators allowed) and the firmware generation, and returns the value
//! in physical units. Offsets, scales and sign flips differ between the
//! CC2541 and CC2650 tags.

use crate::codec::{
    clean_hex, hex_string_to_bytes, short_signed_at, short_unsigned_at, three_byte_unsigned_at,
};
use crate::error::{DecodeError, Result};
use log::debug;
use std::fmt;

/// SensorTag hardware generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, clap::ValueEnum)]
pub enum Firmware {
    #[default]
    Cc2541,
    Cc2650,
}

impl Firmware {
    /// Guess the generation from the advertised device name.
    #[must_use]
    pub fn from_device_name(name: &str) -> Self {
        if name.contains("CC2650 SensorTag") {
            Firmware::Cc2650
        } else {
            Firmware::Cc2541
        }
    }
}

impl fmt::Display for Firmware {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Firmware::Cc2541 => write!(f, "cc2541"),
            Firmware::Cc2650 => write!(f, "cc2650"),
        }
    }
}

/// SensorTag sensors with a decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum Sensor {
    Temperature,
    Accelerometer,
    Humidity,
    Magnetometer,
    Barometer,
    Gyroscope,
    Light,
    /// Simple keys service status
    Keys,
    /// Device information firmware revision string
    FirmwareRevision,
}

impl fmt::Display for Sensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Sensor::Temperature => "temperature",
            Sensor::Accelerometer => "accelerometer",
            Sensor::Humidity => "humidity",
            Sensor::Magnetometer => "magnetometer",
            Sensor::Barometer => "barometer",
            Sensor::Gyroscope => "gyroscope",
            Sensor::Light => "light",
            Sensor::Keys => "keys",
            Sensor::FirmwareRevision => "firmware-revision",
        };
        f.write_str(name)
    }
}

/// Ambient (die) and object (IR) temperature in degrees Celsius.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Temperature {
    pub ambient: f64,
    pub object: f64,
}

/// Pressed state of the SensorTag buttons.
///
/// `side` is the side key on CC2541 and the reed relay on CC2650.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Keys {
    pub left: bool,
    pub right: bool,
    pub side: bool,
}

/// A three axis reading.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Axes<T> {
    pub x: T,
    pub y: T,
    pub z: T,
}

/// Coefficients of the CC2541 barometer calibration characteristic.
///
/// `c[0..4]` are unsigned, `c[4..8]` signed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BarometerCalibration {
    pub c: [i32; 8],
}

impl BarometerCalibration {
    const LENGTH: usize = 16;

    /// Parse the 16 byte calibration value.
    ///
    /// # Errors
    ///
    /// * `DecodeError::InvalidHex` - the value is not hex
    /// * `DecodeError::InvalidLength` - fewer than 16 bytes
    pub fn from_hex(value: &str) -> Result<Self> {
        let bytes = value_bytes(value)?;
        if bytes.len() < Self::LENGTH {
            return Err(DecodeError::invalid_length(Self::LENGTH, bytes.len()));
        }

        let mut c = [0i32; 8];
        for (i, coefficient) in c.iter_mut().enumerate() {
            *coefficient = if i < 4 {
                i32::from(short_unsigned_at(&bytes, i * 2)?)
            } else {
                i32::from(short_signed_at(&bytes, i * 2)?)
            };
        }
        Ok(Self { c })
    }
}

/// A decoded reading of any sensor.
#[derive(Debug, Clone, PartialEq)]
pub enum SensorReading {
    Temperature(Temperature),
    Acceleration(Axes<f64>),
    /// Relative humidity in %
    Humidity(f32),
    MagneticField(Axes<f32>),
    /// Pressure in hPa
    Pressure(f64),
    Gyroscope(Axes<f32>),
    /// Illuminance in lux
    Light(f64),
    Keys(Keys),
    FirmwareRevision(String),
}

impl SensorReading {
    /// Sensor the reading came from.
    #[must_use]
    pub fn sensor(&self) -> Sensor {
        match self {
            SensorReading::Temperature(_) => Sensor::Temperature,
            SensorReading::Acceleration(_) => Sensor::Accelerometer,
            SensorReading::Humidity(_) => Sensor::Humidity,
            SensorReading::MagneticField(_) => Sensor::Magnetometer,
            SensorReading::Pressure(_) => Sensor::Barometer,
            SensorReading::Gyroscope(_) => Sensor::Gyroscope,
            SensorReading::Light(_) => Sensor::Light,
            SensorReading::Keys(_) => Sensor::Keys,
            SensorReading::FirmwareRevision(_) => Sensor::FirmwareRevision,
        }
    }

    /// Named numeric values of the reading, widened to `f64`.
    ///
    /// Keys are `0.0` or `1.0`. A firmware revision has no numeric values.
    #[must_use]
    pub fn fields(&self) -> Vec<(&'static str, f64)> {
        match *self {
            SensorReading::Temperature(t) => vec![("ambient", t.ambient), ("object", t.object)],
            SensorReading::Acceleration(a) => vec![("x", a.x), ("y", a.y), ("z", a.z)],
            SensorReading::Humidity(h) => vec![("humidity", f64::from(h))],
            SensorReading::MagneticField(a) | SensorReading::Gyroscope(a) => vec![
                ("x", f64::from(a.x)),
                ("y", f64::from(a.y)),
                ("z", f64::from(a.z)),
            ],
            SensorReading::Pressure(p) => vec![("pressure", p)],
            SensorReading::Light(l) => vec![("light", l)],
            SensorReading::Keys(k) => vec![
                ("left", f64::from(u8::from(k.left))),
                ("right", f64::from(u8::from(k.right))),
                ("side", f64::from(u8::from(k.side))),
            ],
            SensorReading::FirmwareRevision(_) => Vec::new(),
        }
    }
}

fn value_bytes(value: &str) -> Result<Vec<u8>> {
    hex_string_to_bytes(&clean_hex(value))
}

/// Decode any sensor value.
///
/// # Errors
///
/// Whatever the sensor specific decoder returns.
pub fn decode(
    sensor: Sensor,
    value: &str,
    firmware: Firmware,
    calibration: Option<&BarometerCalibration>,
) -> Result<SensorReading> {
    debug!("Received {sensor} value: {value}");
    Ok(match sensor {
        Sensor::Temperature => SensorReading::Temperature(decode_temperature(value, firmware)?),
        Sensor::Accelerometer => {
            SensorReading::Acceleration(decode_acceleration(value, firmware)?)
        }
        Sensor::Humidity => SensorReading::Humidity(decode_humidity(value, firmware)?),
        Sensor::Magnetometer => {
            SensorReading::MagneticField(decode_magnetic_field(value, firmware)?)
        }
        Sensor::Barometer => {
            SensorReading::Pressure(decode_pressure(value, firmware, calibration)?)
        }
        Sensor::Gyroscope => SensorReading::Gyroscope(decode_gyroscope(value, firmware)?),
        Sensor::Light => SensorReading::Light(decode_light(value)?),
        Sensor::Keys => SensorReading::Keys(decode_keys(value, firmware)?),
        Sensor::FirmwareRevision => {
            SensorReading::FirmwareRevision(decode_firmware_revision(value, firmware)?)
        }
    })
}

/// IR temperature sensor.
///
/// CC2650 reports both temperatures in 1/128 degree steps with the two low
/// bits unused. CC2541 reports the die temperature and the raw thermopile
/// voltage, which is converted with the TMP006 model.
///
/// # Errors
///
/// * `DecodeError::InvalidHex` - the value is not hex
/// * `DecodeError::OutOfRange` - fewer than 4 bytes
pub fn decode_temperature(value: &str, firmware: Firmware) -> Result<Temperature> {
    let bytes = value_bytes(value)?;
    let ambient = short_unsigned_at(&bytes, 2)?;

    match firmware {
        Firmware::Cc2650 => {
            let object = short_unsigned_at(&bytes, 0)?;
            Ok(Temperature {
                ambient: f64::from(ambient >> 2) * 0.03125,
                object: f64::from(object >> 2) * 0.03125,
            })
        }
        Firmware::Cc2541 => {
            let object = short_signed_at(&bytes, 0)?;
            let ambient = f64::from(ambient) / 128.0;
            Ok(Temperature {
                ambient,
                object: thermopile_temperature(ambient, object),
            })
        }
    }
}

fn thermopile_temperature(ambient: f64, raw_object: i16) -> f64 {
    const S0: f64 = 5.593e-14;
    const A1: f64 = 1.75e-3;
    const A2: f64 = -1.678e-5;
    const B0: f64 = -2.94e-5;
    const B1: f64 = -5.7e-7;
    const B2: f64 = 4.63e-9;
    const C2: f64 = 13.4;
    const T_REF: f64 = 298.15;

    let v_obj = f64::from(raw_object) * 0.000_000_156_25;
    let t_die = ambient + 273.15;
    let dt = t_die - T_REF;

    let s = S0 * (1.0 + A1 * dt + A2 * dt.powi(2));
    let v_os = B0 + B1 * dt + B2 * dt.powi(2);
    let f_obj = v_obj - v_os + C2 * (v_obj - v_os).powi(2);

    (t_die.powi(4) + f_obj / s).powf(0.25) - 273.15
}

/// Accelerometer in g.
///
/// CC2650 sends the movement characteristic (accelerometer at offsets 6, 8
/// and 10, 4096 per g). CC2541 sends three signed bytes, 64 per g.
///
/// # Errors
///
/// * `DecodeError::InvalidHex` - the value is not hex
/// * `DecodeError::OutOfRange` / `InvalidLength` - value too short
pub fn decode_acceleration(value: &str, firmware: Firmware) -> Result<Axes<f64>> {
    let bytes = value_bytes(value)?;

    match firmware {
        Firmware::Cc2650 => {
            const SCALE: f32 = 4096.0;
            let x = f32::from(short_signed_at(&bytes, 6)?);
            let y = f32::from(short_signed_at(&bytes, 8)?);
            let z = f32::from(short_signed_at(&bytes, 10)?);
            Ok(Axes {
                x: f64::from(-(x / SCALE)),
                y: f64::from(y / SCALE),
                z: f64::from(-(z / SCALE)),
            })
        }
        Firmware::Cc2541 => {
            let [x, y, z, ..] = bytes.as_slice() else {
                return Err(DecodeError::invalid_length(3, bytes.len()));
            };
            Ok(Axes {
                x: f64::from(x.cast_signed()) / 64.0,
                y: f64::from(y.cast_signed()) / 64.0,
                z: -f64::from(z.cast_signed()) / 64.0,
            })
        }
    }
}

/// Relative humidity in %.
///
/// # Errors
///
/// * `DecodeError::InvalidHex` - the value is not hex
/// * `DecodeError::OutOfRange` - fewer than 4 bytes
pub fn decode_humidity(value: &str, firmware: Firmware) -> Result<f32> {
    let bytes = value_bytes(value)?;
    let raw = short_unsigned_at(&bytes, 2)?;

    Ok(match firmware {
        Firmware::Cc2650 => f32::from(raw) / 65536.0 * 100.0,
        Firmware::Cc2541 => {
            // Two status bits
            let raw = raw & !0x3;
            -6.0 + 125.0 * (f32::from(raw) / 65535.0)
        }
    })
}

/// Magnetometer in µT.
///
/// # Errors
///
/// * `DecodeError::InvalidHex` - the value is not hex
/// * `DecodeError::OutOfRange` - value too short (18 bytes on CC2650, 6 on CC2541)
pub fn decode_magnetic_field(value: &str, firmware: Firmware) -> Result<Axes<f32>> {
    let bytes = value_bytes(value)?;

    match firmware {
        Firmware::Cc2650 => {
            // Integer quotient, 6
            const SCALE: f32 = (32768 / 4912) as f32;
            Ok(Axes {
                x: f32::from(short_signed_at(&bytes, 12)?) / SCALE,
                y: f32::from(short_signed_at(&bytes, 14)?) / SCALE,
                z: f32::from(short_signed_at(&bytes, 16)?) / SCALE,
            })
        }
        Firmware::Cc2541 => {
            const SCALE: f32 = 2000.0 / 65536.0;
            Ok(Axes {
                x: -(f32::from(short_signed_at(&bytes, 0)?) * SCALE),
                y: -(f32::from(short_signed_at(&bytes, 2)?) * SCALE),
                z: f32::from(short_signed_at(&bytes, 4)?) * SCALE,
            })
        }
    }
}

/// Barometric pressure in hPa.
///
/// CC2650 values longer than 4 bytes carry a 24-bit pressure at offset 3,
/// shorter ones an SFLOAT at offset 2. CC2541 needs the calibration
/// characteristic to turn the raw temperature and pressure into hPa.
///
/// # Errors
///
/// * `DecodeError::InvalidHex` - the value is not hex
/// * `DecodeError::OutOfRange` - value too short
/// * `DecodeError::MissingCalibration` - CC2541 without `calibration`
pub fn decode_pressure(
    value: &str,
    firmware: Firmware,
    calibration: Option<&BarometerCalibration>,
) -> Result<f64> {
    let bytes = value_bytes(value)?;

    match firmware {
        Firmware::Cc2650 if bytes.len() > 4 => {
            Ok(f64::from(three_byte_unsigned_at(&bytes, 3)?) / 100.0)
        }
        Firmware::Cc2650 => Ok(sfloat(short_unsigned_at(&bytes, 2)?, 1.0) / 100.0),
        Firmware::Cc2541 => {
            let calibration =
                calibration.ok_or_else(|| DecodeError::MissingCalibration(firmware.to_string()))?;
            let t_r = f64::from(short_signed_at(&bytes, 0)?);
            let p_r = f64::from(short_unsigned_at(&bytes, 2)?);
            let c = calibration.c.map(f64::from);

            let s = c[2]
                + c[3] * t_r / 2f64.powi(17)
                + c[4] * t_r / 2f64.powi(15) * t_r / 2f64.powi(19);
            let o = c[5] * 2f64.powi(14)
                + c[6] * t_r / 2f64.powi(3)
                + c[7] * t_r / 2f64.powi(15) * t_r / 2f64.powi(4);
            Ok((s * p_r + o) / 2f64.powi(14) / 100.0)
        }
    }
}

/// Gyroscope in degrees per second.
///
/// Both generations send y, x, z in that order.
///
/// # Errors
///
/// * `DecodeError::InvalidHex` - the value is not hex
/// * `DecodeError::OutOfRange` - fewer than 6 bytes
pub fn decode_gyroscope(value: &str, firmware: Firmware) -> Result<Axes<f32>> {
    let bytes = value_bytes(value)?;
    let y = f32::from(short_signed_at(&bytes, 0)?);
    let x = f32::from(short_signed_at(&bytes, 2)?);
    let z = f32::from(short_signed_at(&bytes, 4)?);

    Ok(match firmware {
        Firmware::Cc2650 => {
            const SCALE: f32 = (65535 / 500) as f32;
            Axes {
                x: x / SCALE,
                y: y / SCALE,
                z: z / SCALE,
            }
        }
        Firmware::Cc2541 => {
            const SCALE: f32 = 500.0 / 65536.0;
            Axes {
                x: x * SCALE,
                y: -(y * SCALE),
                z: z * SCALE,
            }
        }
    })
}

/// Optical sensor in lux, an SFLOAT at offset 0.
///
/// # Errors
///
/// * `DecodeError::InvalidHex` - the value is not hex
/// * `DecodeError::OutOfRange` - fewer than 2 bytes
pub fn decode_light(value: &str) -> Result<f64> {
    let bytes = value_bytes(value)?;
    Ok(sfloat(short_unsigned_at(&bytes, 0)?, 0.01))
}

/// 12-bit mantissa, 4-bit exponent: `mantissa * (scale * 2^exponent)`.
fn sfloat(raw: u16, scale: f64) -> f64 {
    let mantissa = f64::from(raw & 0x0FFF);
    let exponent = i32::from(raw >> 12);
    mantissa * (scale * 2f64.powi(exponent))
}

/// Simple keys status byte.
///
/// CC2541: bit 0 right, bit 1 left, bit 2 side key. CC2650: bit 0 left
/// (user), bit 1 right (power), bit 2 reed relay. `00` means nothing pressed.
///
/// # Errors
///
/// * `DecodeError::InvalidHex` - the value is not hex
/// * `DecodeError::InvalidLength` - empty value
pub fn decode_keys(value: &str, firmware: Firmware) -> Result<Keys> {
    let bytes = value_bytes(value)?;
    let &[status, ..] = bytes.as_slice() else {
        return Err(DecodeError::invalid_length(1, 0));
    };

    let (left, right) = match firmware {
        Firmware::Cc2541 => (0x02, 0x01),
        Firmware::Cc2650 => (0x01, 0x02),
    };
    Ok(Keys {
        left: status & left != 0,
        right: status & right != 0,
        side: status & 0x04 != 0,
    })
}

/// Firmware revision string from its characteristic value.
///
/// CC2541 values end with a NUL byte written as ` 00`, which is dropped.
///
/// # Errors
///
/// * `DecodeError::InvalidHex` - the value is not hex
pub fn decode_firmware_revision(value: &str, firmware: Firmware) -> Result<String> {
    let value = match firmware {
        Firmware::Cc2650 => value,
        Firmware::Cc2541 => value
            .char_indices()
            .rev()
            .nth(2)
            .map_or("", |(end, _)| &value[..end]),
    };
    Ok(value_bytes(value)?.into_iter().map(char::from).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn cc2650_temperature_zero() {
        let t = decode_temperature("00 00 00 00", Firmware::Cc2650).unwrap();
        assert_eq!(t, Temperature { ambient: 0.0, object: 0.0 });
    }

    #[test]
    fn cc2650_temperature() {
        let t = decode_temperature("e0 0b 48 0d", Firmware::Cc2650).unwrap();
        assert_eq!(t.object, 23.75);
        assert_eq!(t.ambient, 26.5625);
    }

    #[test]
    fn cc2541_temperature() {
        let t = decode_temperature("a0 ff 80 0c", Firmware::Cc2541).unwrap();
        assert_eq!(t.ambient, 25.0);
        assert_close(t.object, 27.399_920_644_732_845);
    }

    #[rstest]
    #[case(Firmware::Cc2650, "00 00 00 00 00 00 00 10 00 f0 00 08", (-1.0, -1.0, -0.5))]
    #[case(Firmware::Cc2541, "40 c0 20", (1.0, -1.0, -0.5))]
    fn acceleration(
        #[case] firmware: Firmware,
        #[case] value: &str,
        #[case] expected: (f64, f64, f64),
    ) {
        let a = decode_acceleration(value, firmware).unwrap();
        assert_eq!((a.x, a.y, a.z), expected);
    }

    #[test]
    fn cc2541_acceleration_too_short() {
        assert_eq!(
            decode_acceleration("40 c0", Firmware::Cc2541),
            Err(DecodeError::invalid_length(3, 2))
        );
    }

    #[test]
    fn humidity() {
        assert_eq!(
            decode_humidity("00 00 00 80", Firmware::Cc2650).unwrap(),
            50.0
        );
        let h = decode_humidity("00 00 03 80", Firmware::Cc2541).unwrap();
        assert!((h - 56.500_95).abs() < 1e-4);
    }

    #[test]
    fn magnetic_field() {
        let mut value = "00 ".repeat(12);
        value.push_str("58 02 a8 fd 00 00");
        let m = decode_magnetic_field(&value, Firmware::Cc2650).unwrap();
        assert_eq!((m.x, m.y, m.z), (100.0, -100.0, 0.0));

        let m = decode_magnetic_field("00 40 00 c0 00 40", Firmware::Cc2541).unwrap();
        assert_eq!((m.x, m.y, m.z), (-500.0, 500.0, 500.0));

        assert!(matches!(
            decode_magnetic_field("00 40 00 c0 00 40", Firmware::Cc2650),
            Err(DecodeError::OutOfRange { .. })
        ));
    }

    #[test]
    fn gyroscope_reads_y_first() {
        let g = decode_gyroscope("fa fe 83 00 00 00", Firmware::Cc2650).unwrap();
        assert_eq!((g.x, g.y, g.z), (1.0, -2.0, 0.0));

        let g = decode_gyroscope("00 40 00 40 00 c0", Firmware::Cc2541).unwrap();
        assert_eq!((g.x, g.y, g.z), (125.0, -125.0, -125.0));
    }

    #[test]
    fn cc2650_pressure() {
        assert_eq!(
            decode_pressure("00 00 00 a0 86 01", Firmware::Cc2650, None).unwrap(),
            1000.0
        );
        assert_eq!(
            decode_pressure("00 00 64 20", Firmware::Cc2650, None).unwrap(),
            4.0
        );
    }

    #[test]
    fn cc2541_pressure_regression() {
        let calibration =
            BarometerCalibration::from_hex("d4 b6 a4 6a 51 d1 2e 8b c0 fc d4 dd d3 cf a9 f1")
                .unwrap();
        assert_eq!(
            calibration.c,
            [46804, 27300, 53585, 35630, -832, -8748, -12333, -3671]
        );

        let p = decode_pressure("f5 6b 70 78", Firmware::Cc2541, Some(&calibration)).unwrap();
        assert_close(p, 1_032.313_858_074_579_5);
    }

    #[test]
    fn cc2541_pressure_needs_calibration() {
        assert_eq!(
            decode_pressure("f5 6b 70 78", Firmware::Cc2541, None),
            Err(DecodeError::MissingCalibration("cc2541".into()))
        );
        assert_eq!(
            BarometerCalibration::from_hex("d4 b6"),
            Err(DecodeError::invalid_length(16, 2))
        );
    }

    #[test]
    fn light() {
        assert_eq!(decode_light("64 20").unwrap(), 4.0);
        assert_eq!(decode_light("00 00").unwrap(), 0.0);
    }

    #[test]
    fn firmware_revision() {
        assert_eq!(
            decode_firmware_revision("31 2e 33 30", Firmware::Cc2650).unwrap(),
            "1.30"
        );
        assert_eq!(
            decode_firmware_revision("31 2e 35 00", Firmware::Cc2541).unwrap(),
            "1.5"
        );
    }

    #[rstest]
    #[case(Firmware::Cc2541, "01", Keys { left: false, right: true, side: false })]
    #[case(Firmware::Cc2541, "02", Keys { left: true, right: false, side: false })]
    #[case(Firmware::Cc2650, "01", Keys { left: true, right: false, side: false })]
    #[case(Firmware::Cc2650, "06", Keys { left: false, right: true, side: true })]
    #[case(Firmware::Cc2650, "00", Keys::default())]
    fn keys(#[case] firmware: Firmware, #[case] value: &str, #[case] expected: Keys) {
        assert_eq!(decode_keys(value, firmware).unwrap(), expected);
    }

    #[test]
    fn keys_need_a_status_byte() {
        assert_eq!(
            decode_keys("", Firmware::Cc2650),
            Err(DecodeError::invalid_length(1, 0))
        );
    }

    #[test]
    fn firmware_from_device_name() {
        assert_eq!(
            Firmware::from_device_name("CC2650 SensorTag"),
            Firmware::Cc2650
        );
        assert_eq!(Firmware::from_device_name("SensorTag"), Firmware::Cc2541);
    }

    #[test]
    fn decode_dispatches_by_sensor() {
        let reading = decode(Sensor::Light, "64 20", Firmware::Cc2650, None).unwrap();
        assert_eq!(reading, SensorReading::Light(4.0));
        assert_eq!(reading.fields(), vec![("light", 4.0)]);

        let reading = decode(Sensor::Humidity, "00 00 00 80", Firmware::Cc2650, None).unwrap();
        assert_eq!(reading.fields(), vec![("humidity", 50.0)]);

        let reading =
            decode(Sensor::FirmwareRevision, "31 2e 33 30", Firmware::Cc2650, None).unwrap();
        assert_eq!(reading, SensorReading::FirmwareRevision("1.30".into()));
        assert_eq!(reading.sensor(), Sensor::FirmwareRevision);
        assert!(reading.fields().is_empty());

        let reading = decode(Sensor::Keys, "04", Firmware::Cc2541, None).unwrap();
        assert_eq!(
            reading.fields(),
            vec![("left", 0.0), ("right", 0.0), ("side", 1.0)]
        );

        assert!(matches!(
            decode(Sensor::Temperature, "zz", Firmware::Cc2650, None),
            Err(DecodeError::InvalidHex(_))
        ));
    }
}
