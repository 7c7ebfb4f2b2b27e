//! btsnoop capture backend.
//!
//! Replays HCI traffic captured with `hcidump -R -w <file>` or `btmon -w`,
//! either from a file or streamed on stdin (`hcidump -R -w - | beacon-listener
//! scan --backend btsnoop`).
//!
//! File layout (all integers big-endian):
//!
//! ```text
//! header:  "btsnoop\0" | u32 version (1) | u32 datalink
//! record:  u32 original length | u32 included length | u32 flags
//!          | u32 cumulative drops | i64 timestamp (µs since 0 AD) | data
//! ```

use super::{RAW_EVENT_CHANNEL_BUFFER_SIZE, RawEvent, ScanError};
use crate::report::HCI_EVENT_PKT;
use log::{debug, info, warn};
use std::io::ErrorKind;
use std::path::Path;
use tokio::io::{AsyncRead, AsyncReadExt, BufReader};
use tokio::sync::mpsc;

/// File magic
pub const BTSNOOP_MAGIC: &[u8; 8] = b"btsnoop\0";
/// Un-encapsulated HCI, no packet type byte
pub const DATALINK_HCI_H1: u32 = 1001;
/// HCI UART, packet type byte first
pub const DATALINK_HCI_H4: u32 = 1002;

const SUPPORTED_VERSION: u32 = 1;
const RECORD_HEADER_LENGTH: usize = 24;
// HCI packets never come close to this
const MAX_RECORD_LENGTH: usize = 0x1_0000;

// H1 record flags
const FLAG_RECEIVED: u32 = 0x01;
const FLAG_COMMAND_OR_EVENT: u32 = 0x02;

// H4 packet types used when framing H1 records
const HCI_COMMAND_PKT: u8 = 0x01;
const HCI_ACLDATA_PKT: u8 = 0x02;

/// One capture record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BtSnoopRecord {
    pub original_length: u32,
    pub flags: u32,
    pub cumulative_drops: u32,
    /// Microseconds since midnight, January 1st, 0 AD
    pub timestamp: i64,
    pub data: Vec<u8>,
}

/// Streaming reader over a btsnoop capture.
#[derive(Debug)]
pub struct BtSnoopReader<R> {
    reader: R,
    datalink: u32,
}

impl<R: AsyncRead + Unpin> BtSnoopReader<R> {
    /// Read and validate the file header.
    ///
    /// # Errors
    ///
    /// * `ScanError::InvalidSnoop` - wrong magic, version or datalink
    /// * `ScanError::Io` - the underlying read failed
    pub async fn new(mut reader: R) -> Result<Self, ScanError> {
        let mut header = [0u8; 16];
        read_exact(&mut reader, &mut header, "file header").await?;
        if &header[..8] != BTSNOOP_MAGIC {
            return Err(ScanError::InvalidSnoop("missing btsnoop magic".into()));
        }

        let version = be_u32(&header[8..12]);
        if version != SUPPORTED_VERSION {
            return Err(ScanError::InvalidSnoop(format!(
                "unsupported version {version}"
            )));
        }

        let datalink = be_u32(&header[12..16]);
        if datalink != DATALINK_HCI_H1 && datalink != DATALINK_HCI_H4 {
            return Err(ScanError::InvalidSnoop(format!(
                "unsupported datalink {datalink}"
            )));
        }

        Ok(Self { reader, datalink })
    }

    #[must_use]
    pub fn datalink(&self) -> u32 {
        self.datalink
    }

    /// Next record, or `None` at a clean end of file.
    ///
    /// # Errors
    ///
    /// * `ScanError::InvalidSnoop` - the file ends inside a record
    /// * `ScanError::Io` - the underlying read failed
    pub async fn next_record(&mut self) -> Result<Option<BtSnoopRecord>, ScanError> {
        let mut header = [0u8; RECORD_HEADER_LENGTH];
        // End of file is only clean on a record boundary
        if self.reader.read(&mut header[..1]).await? == 0 {
            return Ok(None);
        }
        read_exact(&mut self.reader, &mut header[1..], "record header").await?;

        let included = be_u32(&header[4..8]) as usize;
        if included > MAX_RECORD_LENGTH {
            return Err(ScanError::InvalidSnoop(format!(
                "record claims {included} bytes"
            )));
        }

        let mut data = vec![0u8; included];
        read_exact(&mut self.reader, &mut data, "record data").await?;

        let mut timestamp = [0u8; 8];
        timestamp.copy_from_slice(&header[16..24]);

        Ok(Some(BtSnoopRecord {
            original_length: be_u32(&header[0..4]),
            flags: be_u32(&header[8..12]),
            cumulative_drops: be_u32(&header[12..16]),
            timestamp: i64::from_be_bytes(timestamp),
            data,
        }))
    }

    /// Next record as an H4 packet.
    ///
    /// # Errors
    ///
    /// Same as [`BtSnoopReader::next_record`].
    pub async fn next_packet(&mut self) -> Result<Option<RawEvent>, ScanError> {
        Ok(self
            .next_record()
            .await?
            .map(|record| to_h4(self.datalink, record)))
    }
}

/// Frame a record as an H4 packet.
///
/// H4 captures already are. H1 records get the packet type derived from the
/// record flags: received command/event records are events, sent ones
/// commands, everything else ACL data.
#[must_use]
pub fn to_h4(datalink: u32, record: BtSnoopRecord) -> RawEvent {
    if datalink == DATALINK_HCI_H4 {
        return record.data;
    }

    let packet_type = if record.flags & FLAG_COMMAND_OR_EVENT == 0 {
        HCI_ACLDATA_PKT
    } else if record.flags & FLAG_RECEIVED != 0 {
        HCI_EVENT_PKT
    } else {
        HCI_COMMAND_PKT
    };

    let mut packet = Vec::with_capacity(record.data.len() + 1);
    packet.push(packet_type);
    packet.extend(record.data);
    packet
}

fn be_u32(bytes: &[u8]) -> u32 {
    u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}

/// `read_exact` with a stream that ends early reported as a truncated `what`.
async fn read_exact<R: AsyncRead + Unpin>(
    reader: &mut R,
    buf: &mut [u8],
    what: &str,
) -> Result<(), ScanError> {
    match reader.read_exact(buf).await {
        Ok(_) => Ok(()),
        Err(e) if e.kind() == ErrorKind::UnexpectedEof => {
            Err(ScanError::InvalidSnoop(format!("{what} is truncated")))
        }
        Err(e) => Err(e.into()),
    }
}

/// Start replaying a btsnoop capture.
///
/// `path` of `-` reads stdin. The file header is validated before this
/// returns; record errors end the stream and are logged.
///
/// # Returns
/// A receiver of H4 packets, closed at the end of the capture.
pub async fn start_reading(path: &Path) -> Result<mpsc::Receiver<RawEvent>, ScanError> {
    let input: Box<dyn AsyncRead + Unpin + Send> = if path == Path::new("-") {
        Box::new(tokio::io::stdin())
    } else {
        Box::new(tokio::fs::File::open(path).await?)
    };

    let mut reader = BtSnoopReader::new(BufReader::new(input)).await?;
    info!(
        "Reading btsnoop capture from {} (datalink {})",
        path.display(),
        reader.datalink()
    );

    let (tx, rx) = mpsc::channel(RAW_EVENT_CHANNEL_BUFFER_SIZE);

    tokio::spawn(async move {
        let mut packets = 0usize;
        loop {
            match reader.next_packet().await {
                Ok(Some(packet)) => {
                    packets += 1;
                    if tx.send(packet).await.is_err() {
                        debug!("Receiver dropped, stopping btsnoop replay");
                        break;
                    }
                }
                Ok(None) => {
                    info!("End of btsnoop capture after {packets} records");
                    break;
                }
                Err(e) => {
                    warn!("Stopping btsnoop replay: {e}");
                    break;
                }
            }
        }
    });

    Ok(rx)
}
