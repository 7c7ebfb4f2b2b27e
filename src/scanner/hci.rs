//! Raw HCI socket backend.
//!
//! This backend uses raw Linux HCI sockets to receive LE advertising reports
//! and to send advertising commands without requiring the BlueZ daemon. It
//! requires CAP_NET_RAW and CAP_NET_ADMIN capabilities or root privileges.

use super::{RAW_EVENT_CHANNEL_BUFFER_SIZE, RawEvent, ScanError};
use crate::advertising::{OGF_LE_CTL, hci_command_packet};
use crate::report::{EVT_LE_META_EVENT, HCI_EVENT_PKT};
use libc::{AF_BLUETOOTH, SOCK_CLOEXEC, SOCK_RAW, c_int, c_void, sockaddr, socklen_t};
use log::{debug, info, warn};
use std::io;
use std::mem;
use std::os::fd::{AsRawFd, FromRawFd, OwnedFd};
use tokio::io::unix::AsyncFd;
use tokio::sync::mpsc;

// HCI protocol constants
const BTPROTO_HCI: c_int = 1;
const SOL_HCI: c_int = 0;
const HCI_FILTER: c_int = 2;
const HCI_CHANNEL_RAW: u16 = 0;

// HCI commands
const OCF_LE_SET_SCAN_PARAMETERS: u16 = 0x000B;
const OCF_LE_SET_SCAN_ENABLE: u16 = 0x000C;

// Scan types
const LE_SCAN_PASSIVE: u8 = 0x00;

// Own address type
const LE_PUBLIC_ADDRESS: u8 = 0x00;

// Filter policy
const FILTER_POLICY_ACCEPT_ALL: u8 = 0x00;

// Max HCI event size: header + 255 parameter bytes
const MAX_EVENT_SIZE: usize = 258;

/// HCI socket address structure
#[repr(C)]
struct SockaddrHci {
    hci_family: u16,
    hci_dev: u16,
    hci_channel: u16,
}

/// HCI filter structure for raw sockets
#[repr(C)]
struct HciFilter {
    type_mask: u32,
    event_mask: [u32; 2],
    opcode: u16,
}

impl HciFilter {
    fn new() -> Self {
        Self {
            type_mask: 0,
            event_mask: [0, 0],
            opcode: 0,
        }
    }

    fn set_ptype(&mut self, ptype: u8) {
        self.type_mask |= 1 << u32::from(ptype);
    }

    fn set_event(&mut self, event: u8) {
        let bit = usize::from(event);
        self.event_mask[bit / 32] |= 1 << (bit % 32);
    }
}

/// LE Set Scan Parameters command parameters
fn le_set_scan_parameters(interval: u16, window: u16) -> Vec<u8> {
    let mut params = Vec::with_capacity(7);
    params.push(LE_SCAN_PASSIVE);
    params.extend_from_slice(&interval.to_le_bytes());
    params.extend_from_slice(&window.to_le_bytes());
    params.push(LE_PUBLIC_ADDRESS);
    params.push(FILTER_POLICY_ACCEPT_ALL);
    hci_command_packet(OGF_LE_CTL, OCF_LE_SET_SCAN_PARAMETERS, &params)
}

/// LE Set Scan Enable command parameters
fn le_set_scan_enable(enable: bool, filter_duplicates: bool) -> Vec<u8> {
    hci_command_packet(
        OGF_LE_CTL,
        OCF_LE_SET_SCAN_ENABLE,
        &[u8::from(enable), u8::from(filter_duplicates)],
    )
}

/// Open a raw HCI socket
fn open_hci_socket() -> Result<OwnedFd, ScanError> {
    // Create a raw Bluetooth HCI socket using libc directly
    // since nix doesn't support BTPROTO_HCI
    // SOCK_NONBLOCK is required for AsyncFd to work properly
    let fd = unsafe {
        libc::socket(
            AF_BLUETOOTH,
            SOCK_RAW | SOCK_CLOEXEC | libc::SOCK_NONBLOCK,
            BTPROTO_HCI,
        )
    };

    if fd < 0 {
        return Err(ScanError::Bluetooth(format!(
            "Failed to create HCI socket: {}",
            io::Error::last_os_error()
        )));
    }

    Ok(unsafe { OwnedFd::from_raw_fd(fd) })
}

/// Bind HCI socket to a device
fn bind_hci_socket(fd: &OwnedFd, dev_id: u16) -> Result<(), ScanError> {
    let addr = SockaddrHci {
        hci_family: AF_BLUETOOTH as u16,
        hci_dev: dev_id,
        hci_channel: HCI_CHANNEL_RAW,
    };

    let ret = unsafe {
        libc::bind(
            fd.as_raw_fd(),
            &addr as *const SockaddrHci as *const sockaddr,
            mem::size_of::<SockaddrHci>() as socklen_t,
        )
    };

    if ret < 0 {
        return Err(ScanError::Bluetooth(format!(
            "Failed to bind HCI socket to hci{}: {}",
            dev_id,
            io::Error::last_os_error()
        )));
    }

    Ok(())
}

/// Set HCI socket filter
fn set_hci_filter(fd: &OwnedFd) -> Result<(), ScanError> {
    let mut filter = HciFilter::new();
    filter.set_ptype(HCI_EVENT_PKT);
    filter.set_event(EVT_LE_META_EVENT);

    let ret = unsafe {
        libc::setsockopt(
            fd.as_raw_fd(),
            SOL_HCI,
            HCI_FILTER,
            &filter as *const HciFilter as *const c_void,
            mem::size_of::<HciFilter>() as socklen_t,
        )
    };

    if ret < 0 {
        return Err(ScanError::Bluetooth(format!(
            "Failed to set HCI filter: {}",
            io::Error::last_os_error()
        )));
    }

    Ok(())
}

/// Send an HCI command
fn send_hci_command(fd: &OwnedFd, packet: &[u8]) -> Result<(), ScanError> {
    debug!("HCI command: {}", crate::codec::bytes_to_hex_string(packet));
    let ret = unsafe {
        libc::write(
            fd.as_raw_fd(),
            packet.as_ptr() as *const c_void,
            packet.len(),
        )
    };

    if ret < 0 {
        return Err(ScanError::Bluetooth(format!(
            "Failed to send HCI command: {}",
            io::Error::last_os_error()
        )));
    }

    Ok(())
}

/// Open a socket bound to `device` for sending commands
fn command_socket(device: u16) -> Result<OwnedFd, ScanError> {
    let fd = open_hci_socket()?;
    bind_hci_socket(&fd, device)?;
    Ok(fd)
}

/// Configure LE scanning parameters
fn configure_le_scan(fd: &OwnedFd) -> Result<(), ScanError> {
    // Passive scan, 10ms interval, 10ms window (0.625ms units)
    send_hci_command(fd, &le_set_scan_parameters(0x0010, 0x0010))?;
    // Report duplicates, beacons repeat the same advertisement
    send_hci_command(fd, &le_set_scan_enable(true, false))?;
    Ok(())
}

/// Whether `packet` is an LE meta event
fn is_le_meta_event(packet: &[u8]) -> bool {
    packet.len() >= 4 && packet[0] == HCI_EVENT_PKT && packet[1] == EVT_LE_META_EVENT
}

/// Start forwarding LE meta events from a controller using raw HCI sockets.
///
/// This function opens a raw HCI socket, configures a passive LE scan and
/// forwards every LE meta event through the returned channel. Runs
/// indefinitely until interrupted.
///
/// # Arguments
/// * `device` - HCI device index, 0 for `hci0`
///
/// # Requirements
/// - CAP_NET_RAW and CAP_NET_ADMIN capabilities or root privileges
/// - An available HCI device
pub async fn start_scan(device: u16) -> Result<mpsc::Receiver<RawEvent>, ScanError> {
    // Open and configure HCI socket for receiving events
    let fd = open_hci_socket()?;
    bind_hci_socket(&fd, device)?;
    set_hci_filter(&fd)?;

    // We need a separate socket for sending commands
    let cmd_fd = command_socket(device)?;
    configure_le_scan(&cmd_fd)?;
    info!("Scanning on hci{device}");

    let (tx, rx) = mpsc::channel(RAW_EVENT_CHANNEL_BUFFER_SIZE);

    // Wrap in AsyncFd for async I/O
    let async_fd = AsyncFd::new(fd)
        .map_err(|e| ScanError::Bluetooth(format!("Failed to create async fd: {}", e)))?;

    // Spawn a task to read and forward HCI events
    tokio::spawn(async move {
        let _cmd_fd = cmd_fd; // Keep command socket alive
        let mut buf = [0u8; MAX_EVENT_SIZE];

        loop {
            // Wait for the socket to be readable
            let mut guard = match async_fd.readable().await {
                Ok(guard) => guard,
                Err(e) => {
                    warn!("HCI socket closed: {e}");
                    break;
                }
            };

            // Drain all available packets before waiting again
            loop {
                let n = match guard.try_io(|inner| {
                    let ret = unsafe {
                        libc::read(
                            inner.as_raw_fd(),
                            buf.as_mut_ptr() as *mut c_void,
                            buf.len(),
                        )
                    };
                    if ret < 0 {
                        Err(io::Error::last_os_error())
                    } else {
                        Ok(ret as usize)
                    }
                }) {
                    Ok(Ok(n)) if n > 0 => n,
                    Ok(Ok(_)) => break, // EOF or empty read
                    Ok(Err(e)) => {
                        debug!("HCI read failed: {e}");
                        break;
                    }
                    Err(_) => break, // WouldBlock - no more data
                };

                if is_le_meta_event(&buf[..n]) && tx.send(buf[..n].to_vec()).await.is_err() {
                    // Receiver dropped
                    return;
                }
            }
        }
    });

    Ok(rx)
}

/// Send advertising command packets to `device`, in order.
///
/// Built with the helpers in [`crate::advertising`].
pub fn advertise(device: u16, packets: &[Vec<u8>]) -> Result<(), ScanError> {
    let fd = command_socket(device)?;
    for packet in packets {
        send_hci_command(&fd, packet)?;
    }
    info!("Sent {} advertising commands to hci{device}", packets.len());
    Ok(())
}
