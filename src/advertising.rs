//! HCI commands that turn a controller into a beacon.
//!
//! The packets are H4 framed (leading `0x01` command packet type) so they can
//! be written as-is to a raw HCI socket.

use crate::codec::hex_string_to_bytes;
use crate::error::{DecodeError, Result};

/// H4 packet type of HCI commands
pub const HCI_COMMAND_PKT: u8 = 0x01;

/// LE Controller commands
pub const OGF_LE_CTL: u16 = 0x08;
pub const OCF_LE_SET_ADVERTISING_PARAMETERS: u16 = 0x0006;
pub const OCF_LE_SET_ADVERTISING_DATA: u16 = 0x0008;
pub const OCF_LE_SET_ADVERTISE_ENABLE: u16 = 0x000A;

/// Advertising data is at most 31 bytes plus its length byte.
pub const MAX_ADVERTISING_DATA: usize = 32;

const ADV_NONCONN_IND: u8 = 0x03;
const OWN_ADDRESS_PUBLIC: u8 = 0x00;
const PEER_ADDRESS_PUBLIC: u8 = 0x00;
const ALL_CHANNELS: u8 = 0x07;
const FILTER_POLICY_ACCEPT_ALL: u8 = 0x00;

/// Create an HCI command packet
#[must_use]
pub fn hci_command_packet(ogf: u16, ocf: u16, params: &[u8]) -> Vec<u8> {
    let opcode = (ogf << 10) | ocf;
    let mut packet = Vec::with_capacity(4 + params.len());
    packet.push(HCI_COMMAND_PKT);
    packet.extend_from_slice(&opcode.to_le_bytes());
    packet.push(params.len() as u8);
    packet.extend_from_slice(params);
    packet
}

/// LE Set Advertising Parameters for a non-connectable beacon.
///
/// Intervals are in 0.625 ms units.
#[must_use]
pub fn set_advertising_parameters(interval_min: u16, interval_max: u16) -> Vec<u8> {
    let mut params = Vec::with_capacity(15);
    params.extend_from_slice(&interval_min.to_le_bytes());
    params.extend_from_slice(&interval_max.to_le_bytes());
    params.push(ADV_NONCONN_IND);
    params.push(OWN_ADDRESS_PUBLIC);
    params.push(PEER_ADDRESS_PUBLIC);
    params.extend_from_slice(&[0u8; 6]);
    params.push(ALL_CHANNELS);
    params.push(FILTER_POLICY_ACCEPT_ALL);
    hci_command_packet(OGF_LE_CTL, OCF_LE_SET_ADVERTISING_PARAMETERS, &params)
}

/// LE Set Advertising Data carrying the output of [`crate::Beacon::encode`].
///
/// # Errors
///
/// * `DecodeError::InvalidHex` - `encoded` is empty (a refused encode) or not hex
/// * `DecodeError::InvalidLength` - more than 32 bytes
pub fn set_advertising_data(encoded: &str) -> Result<Vec<u8>> {
    if encoded.is_empty() {
        return Err(DecodeError::InvalidHex("no advertising data".into()));
    }
    let data = hex_string_to_bytes(encoded)?;
    if data.len() > MAX_ADVERTISING_DATA {
        return Err(DecodeError::InvalidLength(format!(
            "Advertising data is {} bytes, at most {MAX_ADVERTISING_DATA} fit",
            data.len()
        )));
    }
    Ok(hci_command_packet(
        OGF_LE_CTL,
        OCF_LE_SET_ADVERTISING_DATA,
        &data,
    ))
}

/// LE Set Advertise Enable.
#[must_use]
pub fn set_advertising_enable(enable: bool) -> Vec<u8> {
    hci_command_packet(OGF_LE_CTL, OCF_LE_SET_ADVERTISE_ENABLE, &[u8::from(enable)])
}
