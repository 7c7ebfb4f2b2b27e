//! HCI LE Advertising Report event parser.
//!
//! See Bluetooth Core 4.0, Vol 2 Part E, 7.7.65.2 LE Advertising Report Event.
//! The input is one H4 packet: packet type, event code, parameter length,
//! sub-event code, report count, then the reports back to back.

use crate::address::{AddressType, DeviceAddress};
use crate::error::{DecodeError, Result};

/// H4 packet type of HCI events
pub const HCI_EVENT_PKT: u8 = 0x04;
/// LE Meta event code
pub const EVT_LE_META_EVENT: u8 = 0x3E;
/// LE Meta sub-event code for advertising reports
pub const EVT_LE_ADVERTISING_REPORT: u8 = 0x02;

const HEADER_LENGTH: usize = 5;

/// Advertising event type of a single report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AdvertisingEventType {
    /// ADV_IND
    ConnectableUndirected,
    /// ADV_DIRECT_IND
    ConnectableDirected,
    /// ADV_SCAN_IND
    ScannableUndirected,
    /// ADV_NONCONN_IND
    NonConnectableUndirected,
    /// SCAN_RSP
    ScanResponse,
    Other(u8),
}

impl From<u8> for AdvertisingEventType {
    fn from(raw: u8) -> Self {
        match raw {
            0x00 => Self::ConnectableUndirected,
            0x01 => Self::ConnectableDirected,
            0x02 => Self::ScannableUndirected,
            0x03 => Self::NonConnectableUndirected,
            0x04 => Self::ScanResponse,
            other => Self::Other(other),
        }
    }
}

/// One report out of an LE Advertising Report event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdvertisingReportRecord {
    pub event_type: AdvertisingEventType,
    pub address_type: AddressType,
    pub address: DeviceAddress,
    /// Raw AD payload (`length` bytes)
    pub report_data: Vec<u8>,
    /// Signed RSSI in dBm, the byte right after the payload
    pub rssi: i8,
}

impl AdvertisingReportRecord {
    /// Declared AD payload length
    #[must_use]
    pub fn length(&self) -> usize {
        self.report_data.len()
    }
}

/// A parsed LE Advertising Report event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdvertisingReportSet {
    pub packet_type: u8,
    pub event_code: u8,
    pub parameter_length: u8,
    pub subevent_code: u8,
    /// Report count announced by the event header
    pub number_of_reports: u8,
    /// Reports in the order they appear in the event
    pub reports: Vec<AdvertisingReportRecord>,
}

/// Cursor over an event buffer that reports overruns as `MalformedReport`.
struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn take(&mut self, field: &str, n: usize) -> Result<&'a [u8]> {
        let end = self.pos + n;
        let bytes = self
            .buf
            .get(self.pos..end)
            .ok_or_else(|| DecodeError::report_overrun(field, end, self.buf.len()))?;
        self.pos = end;
        Ok(bytes)
    }

    fn byte(&mut self, field: &str) -> Result<u8> {
        Ok(self.take(field, 1)?[0])
    }
}

/// Parse one raw HCI event buffer into its advertising reports.
///
/// # Returns
///
/// * `Ok(Some(set))` - the buffer is an LE Advertising Report event
/// * `Ok(None)` - the buffer is some other packet or event (not an error)
///
/// # Errors
///
/// * `DecodeError::MalformedReport` - a report declares more bytes than the buffer holds
///
/// # Example
///
/// ```rust
/// use beacon_listener::report::parse_advertisement;
///
/// // Command complete event, not an advertisement
/// assert_eq!(parse_advertisement(&[0x04, 0x0E, 0x04, 0x01, 0x0C, 0x20, 0x00]), Ok(None));
/// ```
pub fn parse_advertisement(buf: &[u8]) -> Result<Option<AdvertisingReportSet>> {
    if buf.len() < 2 || buf[0] != HCI_EVENT_PKT || buf[1] != EVT_LE_META_EVENT {
        return Ok(None);
    }
    if buf.get(3).is_some_and(|&sub| sub != EVT_LE_ADVERTISING_REPORT) {
        return Ok(None);
    }

    let mut reader = Reader { buf, pos: 0 };
    let header = reader.take("event header", HEADER_LENGTH)?;
    let number_of_reports = header[4];

    let mut reports = Vec::with_capacity(usize::from(number_of_reports));
    for _ in 0..number_of_reports {
        let event_type = reader.byte("event type")?.into();
        let address_type = reader.byte("address type")?.into();

        let mut raw_address = [0u8; 6];
        raw_address.copy_from_slice(reader.take("address", 6)?);

        let length = usize::from(reader.byte("data length")?);
        let report_data = reader.take("AD payload", length)?.to_vec();
        let rssi = reader.byte("RSSI")?.cast_signed();

        reports.push(AdvertisingReportRecord {
            event_type,
            address_type,
            address: DeviceAddress::from_hci_bytes(raw_address),
            report_data,
            rssi,
        });
    }

    Ok(Some(AdvertisingReportSet {
        packet_type: header[0],
        event_code: header[1],
        parameter_length: header[2],
        subevent_code: header[3],
        number_of_reports,
        reports,
    }))
}
