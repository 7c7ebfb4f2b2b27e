//! Eddystone frames.
//!
//! See <https://github.com/google/eddystone/blob/master/protocol-specification.md>.
//! An Eddystone advertisement lists the `0xFEAA` service in a 16-bit UUID
//! list and carries the frame in the Service Data structure for that UUID:
//! frame type, tx power, then the frame specific payload.

use super::{Beacon, BeaconFactory, BeaconFlags, BeaconKind};
use crate::ad::{AD_TYPE_FLAGS, AD_TYPE_SERVICE_DATA_UUID16, AD_TYPE_UUID16_LIST, ad_structures};
use crate::codec::{bytes_to_hex_string, hex_string_to_bytes};
use crate::error::{DecodeError, EncodeError, Result};
use std::fmt;

/// Eddystone service UUID `0xFEAA` as it appears on the wire.
pub const EDDYSTONE_UUID: [u8; 2] = [0xAA, 0xFE];

/// Longest compressed URL body that fits in a frame.
pub const URL_MAX_LENGTH: usize = 17;

const UID_NAMESPACE_LENGTH: usize = 10;
const UID_INSTANCE_LENGTH: usize = 6;

// Advertising data framing
const UID_PACKET_LENGTH: &str = "1e";
const SERVICE_UUID_LIST: &str = "0303aafe";
const UID_SERVICE_DATA_HEADER: &str = "1716aafe";
const SERVICE_DATA_TYPE: &str = "16aafe";

/// URL suffixes indexed by their compression code.
const DOMAINS: [&str; 14] = [
    ".com/", ".org/", ".edu/", ".net/", ".info/", ".biz/", ".gov/", ".com", ".org", ".edu",
    ".net", ".info", ".biz", ".gov",
];

/// Eddystone frame type byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameType {
    Uid,
    Url,
    Tlm,
    Eid,
    Reserved,
}

impl FrameType {
    #[must_use]
    pub fn code(self) -> u8 {
        match self {
            FrameType::Uid => 0x00,
            FrameType::Url => 0x10,
            FrameType::Tlm => 0x20,
            FrameType::Eid => 0x30,
            FrameType::Reserved => 0x40,
        }
    }

    /// Frame type for a code, `None` for codes that are not Eddystone frames.
    #[must_use]
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0x00 => Some(FrameType::Uid),
            0x10 => Some(FrameType::Url),
            0x20 => Some(FrameType::Tlm),
            0x30 => Some(FrameType::Eid),
            0x40 => Some(FrameType::Reserved),
            _ => None,
        }
    }
}

impl fmt::Display for FrameType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FrameType::Uid => "uid",
            FrameType::Url => "url",
            FrameType::Tlm => "tlm",
            FrameType::Eid => "eid",
            FrameType::Reserved => "reserved",
        };
        f.write_str(name)
    }
}

/// URL scheme prefix of an Eddystone-URL frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UrlScheme {
    HttpWww,
    HttpsWww,
    Http,
    Https,
    /// Scheme code outside `0x00..=0x03`; decodes with an empty prefix
    Unknown(u8),
}

impl UrlScheme {
    const KNOWN: [UrlScheme; 4] = [
        UrlScheme::HttpWww,
        UrlScheme::HttpsWww,
        UrlScheme::Http,
        UrlScheme::Https,
    ];

    #[must_use]
    pub fn prefix(self) -> &'static str {
        match self {
            UrlScheme::HttpWww => "http://www.",
            UrlScheme::HttpsWww => "https://www.",
            UrlScheme::Http => "http://",
            UrlScheme::Https => "https://",
            UrlScheme::Unknown(_) => "",
        }
    }

    #[must_use]
    pub fn code(self) -> u8 {
        match self {
            UrlScheme::HttpWww => 0x00,
            UrlScheme::HttpsWww => 0x01,
            UrlScheme::Http => 0x02,
            UrlScheme::Https => 0x03,
            UrlScheme::Unknown(code) => code,
        }
    }

    #[must_use]
    pub fn from_code(code: u8) -> Self {
        Self::KNOWN
            .into_iter()
            .find(|scheme| scheme.code() == code)
            .unwrap_or(UrlScheme::Unknown(code))
    }

    /// First known scheme whose prefix starts `url`, checked in code order.
    #[must_use]
    pub fn detect(url: &str) -> Option<Self> {
        Self::KNOWN
            .into_iter()
            .find(|scheme| url.starts_with(scheme.prefix()))
    }
}

/// Frame specific part of an Eddystone beacon.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EddystoneFrame {
    /// Namespace (10 bytes) and instance (6 bytes) as lowercase hex
    Uid { namespace: String, instance: String },
    /// `body` is the URL with the scheme prefix removed
    Url { scheme: UrlScheme, body: String },
    Tlm,
    Eid,
    Reserved,
}

impl EddystoneFrame {
    #[must_use]
    pub fn uid(namespace: &str, instance: &str) -> Self {
        EddystoneFrame::Uid {
            namespace: namespace.to_lowercase(),
            instance: instance.to_lowercase(),
        }
    }

    /// Split `url` into its scheme and body.
    ///
    /// A URL without one of the four encodable schemes is kept whole with an
    /// unknown scheme; encoding such a frame is refused.
    #[must_use]
    pub fn url(url: &str) -> Self {
        match UrlScheme::detect(url) {
            Some(scheme) => EddystoneFrame::Url {
                scheme,
                body: url[scheme.prefix().len()..].to_string(),
            },
            None => EddystoneFrame::Url {
                scheme: UrlScheme::Unknown(0xFF),
                body: url.to_string(),
            },
        }
    }

    #[must_use]
    pub fn frame_type(&self) -> FrameType {
        match self {
            EddystoneFrame::Uid { .. } => FrameType::Uid,
            EddystoneFrame::Url { .. } => FrameType::Url,
            EddystoneFrame::Tlm => FrameType::Tlm,
            EddystoneFrame::Eid => FrameType::Eid,
            EddystoneFrame::Reserved => FrameType::Reserved,
        }
    }

    /// Full URL of a URL frame, scheme prefix included.
    #[must_use]
    pub fn full_url(&self) -> Option<String> {
        match self {
            EddystoneFrame::Url { scheme, body } => Some(format!("{}{}", scheme.prefix(), body)),
            _ => None,
        }
    }

    pub(super) fn encode(
        &self,
        flags: &str,
        tx_power: &str,
    ) -> std::result::Result<String, EncodeError> {
        match self {
            EddystoneFrame::Uid {
                namespace,
                instance,
            } => {
                check_hex_field("namespace", namespace, UID_NAMESPACE_LENGTH)?;
                check_hex_field("instance", instance, UID_INSTANCE_LENGTH)?;
                Ok(format!(
                    "{UID_PACKET_LENGTH}{flags}{SERVICE_UUID_LIST}{UID_SERVICE_DATA_HEADER}{:02x}{tx_power}{namespace}{instance}0000",
                    FrameType::Uid.code()
                ))
            }
            EddystoneFrame::Url { scheme, body } => {
                if let UrlScheme::Unknown(_) = scheme {
                    return Err(EncodeError::UnknownUrlScheme(body.clone()));
                }
                let compressed = encode_url(body);
                if compressed.len() > URL_MAX_LENGTH {
                    return Err(EncodeError::UrlTooLong(compressed.len()));
                }
                let padding = "00".repeat(URL_MAX_LENGTH - compressed.len());
                Ok(format!(
                    "{:02x}{flags}{SERVICE_UUID_LIST}{:02x}{SERVICE_DATA_TYPE}{:02x}{tx_power}{:02x}{}{padding}",
                    14 + compressed.len(),
                    6 + compressed.len(),
                    FrameType::Url.code(),
                    scheme.code(),
                    bytes_to_hex_string(&compressed),
                ))
            }
            other => Err(EncodeError::NotImplemented(other.frame_type().to_string())),
        }
    }
}

fn check_hex_field(
    field: &'static str,
    value: &str,
    bytes: usize,
) -> std::result::Result<(), EncodeError> {
    if value.len() == bytes * 2 && hex_string_to_bytes(value).is_ok() {
        Ok(())
    } else {
        Err(EncodeError::InvalidField {
            field,
            value: value.to_string(),
        })
    }
}

/// Compress a URL body (scheme already removed).
///
/// Scans left to right; at each position the lowest domain code whose suffix
/// matches is emitted, otherwise the byte itself.
#[must_use]
pub fn encode_url(body: &str) -> Vec<u8> {
    let bytes = body.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut pos = 0;
    while pos < bytes.len() {
        let rest = &bytes[pos..];
        match DOMAINS
            .iter()
            .position(|domain| rest.starts_with(domain.as_bytes()))
        {
            Some(code) => {
                out.push(code as u8);
                pos += DOMAINS[code].len();
            }
            None => {
                out.push(bytes[pos]);
                pos += 1;
            }
        }
    }
    out
}

/// Expand a compressed URL body. Bytes up to `0x0D` are domain codes, the
/// rest are literal characters.
#[must_use]
pub fn decode_url(body: &[u8]) -> String {
    let mut url = String::with_capacity(body.len());
    for &byte in body {
        match DOMAINS.get(usize::from(byte)) {
            Some(domain) => url.push_str(domain),
            None => url.push(char::from(byte)),
        }
    }
    url
}

/// Recognises Eddystone advertisements.
#[derive(Debug, Default, Clone, Copy)]
pub struct EddystoneFactory;

impl BeaconFactory for EddystoneFactory {
    fn kind(&self) -> BeaconKind {
        BeaconKind::Eddystone
    }

    fn parse_eir(&self, data: &[u8]) -> Result<Option<Beacon>> {
        let mut flags = BeaconFlags::NONE;
        let mut listed = false;

        for structure in ad_structures(data) {
            let structure = structure?;
            match structure.ad_type {
                AD_TYPE_FLAGS if !structure.data.is_empty() => {
                    flags = BeaconFlags::from_byte(structure.data[0]);
                }
                AD_TYPE_UUID16_LIST if structure.data.starts_with(&EDDYSTONE_UUID) => {
                    listed = true;
                }
                AD_TYPE_SERVICE_DATA_UUID16
                    if listed && structure.data.starts_with(&EDDYSTONE_UUID) =>
                {
                    return decode_service_data(&structure.data[2..], flags);
                }
                _ => {}
            }
        }

        Ok(None)
    }
}

/// Decode the service data following the `0xFEAA` UUID.
fn decode_service_data(data: &[u8], flags: BeaconFlags) -> Result<Option<Beacon>> {
    let (&code, &tx_power, payload) = match data {
        [code, tx_power, payload @ ..] => (code, tx_power, payload),
        _ => return Err(DecodeError::invalid_length(2, data.len())),
    };

    let Some(frame_type) = FrameType::from_code(code) else {
        return Ok(None);
    };

    let frame = match frame_type {
        FrameType::Uid => {
            let needed = UID_NAMESPACE_LENGTH + UID_INSTANCE_LENGTH;
            if payload.len() < needed {
                return Err(DecodeError::invalid_length(needed, payload.len()));
            }
            let (namespace, rest) = payload.split_at(UID_NAMESPACE_LENGTH);
            EddystoneFrame::Uid {
                namespace: bytes_to_hex_string(namespace),
                instance: bytes_to_hex_string(&rest[..UID_INSTANCE_LENGTH]),
            }
        }
        FrameType::Url => {
            let Some((&scheme, body)) = payload.split_first() else {
                return Err(DecodeError::invalid_length(1, 0));
            };
            EddystoneFrame::Url {
                scheme: UrlScheme::from_code(scheme),
                body: decode_url(body),
            }
        }
        FrameType::Tlm => EddystoneFrame::Tlm,
        FrameType::Eid => EddystoneFrame::Eid,
        FrameType::Reserved => EddystoneFrame::Reserved,
    };

    let mut beacon = Beacon::eddystone(frame, tx_power.cast_signed());
    beacon.flags = flags;
    Ok(Some(beacon))
}
