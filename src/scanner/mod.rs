//! Raw advertisement sources.
//!
//! A backend produces raw H4 HCI packets (packet type byte first) on a
//! channel; parsing them into advertising reports and beacons happens in the
//! caller. Backends differ only in where the packets come from: a live
//! controller over a raw HCI socket, or a btsnoop capture.

pub mod btsnoop;

#[cfg(feature = "hci")]
pub mod hci;

use std::io;
use std::path::PathBuf;
use thiserror::Error;
use tokio::sync::mpsc;

/// One raw H4 HCI packet.
pub type RawEvent = Vec<u8>;

/// Error type for scanner operations.
#[derive(Error, Debug)]
pub enum ScanError {
    /// Bluetooth/adapter related error
    #[error("Bluetooth error: {0}")]
    Bluetooth(String),
    /// Reading a capture failed
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    /// A btsnoop capture is malformed
    #[error("Invalid btsnoop capture: {0}")]
    InvalidSnoop(String),
    /// Backend not available (not compiled in)
    #[error("Backend '{0}' not available (not compiled in)")]
    BackendNotAvailable(String),
}

/// Channel buffer size for raw events.
pub const RAW_EVENT_CHANNEL_BUFFER_SIZE: usize = 100;

/// Available advertisement sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Backend {
    /// Raw HCI socket backend (direct kernel access, no daemon required)
    #[cfg(feature = "hci")]
    Hci,
    /// btsnoop capture file or stream (e.g. `hcidump -R -w -`)
    Btsnoop,
}

impl Default for Backend {
    fn default() -> Self {
        #[cfg(feature = "hci")]
        return Backend::Hci;
        #[cfg(not(feature = "hci"))]
        return Backend::Btsnoop;
    }
}

impl std::fmt::Display for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            #[cfg(feature = "hci")]
            Backend::Hci => write!(f, "hci"),
            Backend::Btsnoop => write!(f, "btsnoop"),
        }
    }
}

impl std::str::FromStr for Backend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            #[cfg(feature = "hci")]
            "hci" | "raw" => Ok(Backend::Hci),
            "btsnoop" | "snoop" => Ok(Backend::Btsnoop),
            _ => Err(format!("Unknown backend: {}", s)),
        }
    }
}

/// Where a backend reads from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendConfig {
    pub backend: Backend,
    /// HCI device index (`hci0` is 0)
    pub device: u16,
    /// btsnoop capture path, `-` for stdin
    pub input: PathBuf,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            backend: Backend::default(),
            device: 0,
            input: PathBuf::from("-"),
        }
    }
}

/// Open the configured source.
///
/// This is the main entry point for creating a source. It dispatches to the
/// appropriate backend implementation based on `config.backend`.
///
/// # Returns
/// A receiver of raw HCI packets. The channel closes when the source ends.
pub async fn open_source(config: &BackendConfig) -> Result<mpsc::Receiver<RawEvent>, ScanError> {
    match config.backend {
        #[cfg(feature = "hci")]
        Backend::Hci => hci::start_scan(config.device).await,
        Backend::Btsnoop => btsnoop::start_reading(&config.input).await,
    }
}
