//! Error types for the advertisement, beacon and sensor codecs.

use thiserror::Error;

/// Result type alias for decode operations
pub type Result<T> = std::result::Result<T, DecodeError>;

/// Errors that can occur while decoding raw bytes.
///
/// An advertisement that simply is not a beacon (wrong header, unknown
/// company prefix, other AD types) is not an error: decoders return
/// `Ok(None)` for those.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DecodeError {
    /// Odd-length or non-hex input to the byte codec
    #[error("Invalid hex string: {0}")]
    InvalidHex(String),

    /// A fixed-width field read past the end of the buffer
    #[error("Cannot read {width} bytes at offset {offset} from a {len} byte buffer")]
    OutOfRange {
        offset: usize,
        width: usize,
        len: usize,
    },

    /// An AD structure declares more bytes than remain in the payload
    #[error("AD structure at offset {offset} declares {declared} bytes but only {remaining} remain")]
    TruncatedRecord {
        offset: usize,
        declared: usize,
        remaining: usize,
    },

    /// An HCI advertising report declares more bytes than the event holds
    #[error("Malformed advertising report: {0}")]
    MalformedReport(String),

    /// Data length is invalid for the value being decoded
    #[error("Invalid data length: {0}")]
    InvalidLength(String),

    /// CC2541 barometer readings need the calibration characteristic
    #[error("Barometer calibration data is required for {0}")]
    MissingCalibration(String),
}

impl DecodeError {
    /// Create a new `InvalidLength` error
    #[must_use]
    pub fn invalid_length(expected: usize, actual: usize) -> Self {
        Self::InvalidLength(format!("Expected at least {expected} bytes, got {actual}"))
    }

    /// Create a new `MalformedReport` error for a field that overruns the event buffer
    #[must_use]
    pub fn report_overrun(field: &str, needed: usize, len: usize) -> Self {
        Self::MalformedReport(format!(
            "{field} needs {needed} bytes but the event is {len} bytes long"
        ))
    }
}

/// Reasons a beacon refuses to produce advertising data.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EncodeError {
    /// Compressed URL body does not fit the 17 byte budget
    #[error("URL body is {0} bytes after compression, at most 17 fit in a frame")]
    UrlTooLong(usize),

    /// URL does not start with one of the four encodable schemes
    #[error("URL has no encodable scheme: {0}")]
    UnknownUrlScheme(String),

    /// Frame type without an encoder
    #[error("Encoding {0} frames is not implemented")]
    NotImplemented(String),

    /// A field value cannot be represented on the wire
    #[error("Invalid {field}: {value}")]
    InvalidField { field: &'static str, value: String },
}
