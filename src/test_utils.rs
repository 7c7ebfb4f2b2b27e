use crate::address::DeviceAddress;

/// A stable device address for unit tests, as it appears on the HCI wire.
pub const TEST_HCI_ADDRESS: [u8; 6] = [0x13, 0x71, 0xDA, 0x7D, 0x1A, 0x00];

/// `TEST_HCI_ADDRESS` in display order.
pub const TEST_ADDRESS: DeviceAddress = DeviceAddress([0x00, 0x1A, 0x7D, 0xDA, 0x71, 0x13]);

/// iBeacon advertisement: UUID f7826da6-4fa2-4e98-8024-bc5b71e0893e,
/// major 1000, minor 42, tx power -59 dBm, flags 0x06.
pub const IBEACON_PAYLOAD: &[u8] = &[
    0x02, 0x01, 0x06, // flags
    0x1A, 0xFF, 0x4C, 0x00, 0x02, 0x15, // Apple iBeacon prefix
    0xF7, 0x82, 0x6D, 0xA6, 0x4F, 0xA2, 0x4E, 0x98, 0x80, 0x24, 0xBC, 0x5B, 0x71, 0xE0, 0x89,
    0x3E, // UUID
    0x03, 0xE8, // major
    0x00, 0x2A, // minor
    0xC5, // tx power
];

/// Eddystone UID advertisement: namespace 00010203040506070809,
/// instance 0a0b0c0d0e0f, tx power -21 dBm, flags 0x06.
pub const EDDYSTONE_UID_PAYLOAD: &[u8] = &[
    0x02, 0x01, 0x06, // flags
    0x03, 0x03, 0xAA, 0xFE, // Eddystone service UUID
    0x17, 0x16, 0xAA, 0xFE, 0x00, 0xEB, // service data, UID frame, tx power
    0x00, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09, // namespace
    0x0A, 0x0B, 0x0C, 0x0D, 0x0E, 0x0F, // instance
    0x00, 0x00, // reserved
];

/// Eddystone URL advertisement for `http://www.example.com`, tx power -21 dBm.
pub const EDDYSTONE_URL_PAYLOAD: &[u8] = &[
    0x02, 0x01, 0x06, // flags
    0x03, 0x03, 0xAA, 0xFE, // Eddystone service UUID
    0x0E, 0x16, 0xAA, 0xFE, 0x10, 0xEB, // service data, URL frame, tx power
    0x00, // http://www.
    b'e', b'x', b'a', b'm', b'p', b'l', b'e', 0x07, // example.com
];

/// Build a complete H4 LE Advertising Report event.
///
/// Each report is `(event type, address in HCI byte order, AD payload, rssi)`
/// and is written with a public address type.
pub fn hci_event(reports: &[(u8, [u8; 6], &[u8], i8)]) -> Vec<u8> {
    let mut params = vec![0x02, reports.len() as u8];
    for (event_type, address, data, rssi) in reports {
        params.push(*event_type);
        params.push(0x00);
        params.extend_from_slice(address);
        params.push(data.len() as u8);
        params.extend_from_slice(data);
        params.push(rssi.cast_unsigned());
    }

    let mut event = vec![0x04, 0x3E, params.len() as u8];
    event.extend(params);
    event
}

/// A non-connectable iBeacon advertisement from `TEST_ADDRESS` at -67 dBm.
pub fn ibeacon_event() -> Vec<u8> {
    hci_event(&[(0x03, TEST_HCI_ADDRESS, IBEACON_PAYLOAD, -67)])
}

/// A non-connectable Eddystone UID advertisement from `TEST_ADDRESS` at -70 dBm.
pub fn eddystone_uid_event() -> Vec<u8> {
    hci_event(&[(0x03, TEST_HCI_ADDRESS, EDDYSTONE_UID_PAYLOAD, -70)])
}

/// A non-connectable Eddystone URL advertisement from `TEST_ADDRESS` at -70 dBm.
pub fn eddystone_url_event() -> Vec<u8> {
    hci_event(&[(0x03, TEST_HCI_ADDRESS, EDDYSTONE_URL_PAYLOAD, -70)])
}
