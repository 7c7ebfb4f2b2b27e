//! Core application runner (business logic) for `beacon-listener`.
//!
//! This module is intentionally decoupled from process setup and exit codes
//! so it can be tested deterministically with an injected advertisement
//! source and injected output streams.

use crate::address::DeviceAddress;
use crate::advertising::{set_advertising_data, set_advertising_enable, set_advertising_parameters};
use crate::beacon::{
    Beacon, BeaconFactory, BeaconFlags, BeaconKind, EddystoneFactory, EddystoneFrame, IBeacon,
    IBeaconFactory,
};
use crate::error::{DecodeError, EncodeError};
use crate::observation::Observation;
use crate::output::OutputFormatter;
use crate::output::influxdb::{InfluxDbFormatter, format_reading};
use crate::report::parse_advertisement;
use crate::scanner::{Backend, BackendConfig, RawEvent, ScanError};
use crate::sensortag::{BarometerCalibration, Firmware, Sensor, decode};
use crate::throttle::Throttle;
use clap::{Args, Parser, Subcommand, ValueEnum};
use log::debug;
use std::fmt;
use std::future::Future;
use std::io;
use std::io::Write;
use std::path::PathBuf;
use std::pin::Pin;
use std::time::{Duration, SystemTime};
use thiserror::Error;
use tokio::sync::mpsc;
use uuid::Uuid;

/// Command line of the `beacon-listener` binary.
#[derive(Parser, Debug, Clone)]
#[command(author, about, version)]
pub struct Cli {
    /// Verbose output: debug logging, and print parse errors for malformed packets
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Scan for beacons and print them in InfluxDB line protocol
    Scan(ScanOptions),
    /// Build the advertising data of a beacon
    Encode {
        #[command(subcommand)]
        beacon: EncodeBeacon,
    },
    /// Decode a TI SensorTag characteristic value
    Sensortag(SensortagOptions),
}

/// Beacon formats to look for while scanning.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum BeaconSelection {
    Eddystone,
    #[value(name = "ibeacon")]
    IBeacon,
    #[default]
    All,
}

impl BeaconSelection {
    /// Factories for the selected formats, Eddystone first.
    #[must_use]
    pub fn factories(self) -> Vec<Box<dyn BeaconFactory>> {
        match self {
            BeaconSelection::Eddystone => vec![Box::new(EddystoneFactory)],
            BeaconSelection::IBeacon => vec![Box::new(IBeaconFactory)],
            BeaconSelection::All => vec![Box::new(EddystoneFactory), Box::new(IBeaconFactory)],
        }
    }
}

/// Configuration for the scan loop.
#[derive(Args, Debug, Clone)]
pub struct ScanOptions {
    /// Where advertisements come from
    #[arg(long, default_value_t, value_enum)]
    pub backend: Backend,

    /// HCI device index, 0 for hci0
    #[arg(long, default_value_t = 0)]
    pub device: u16,

    /// btsnoop capture to read, `-` for stdin
    #[arg(long, default_value = "-")]
    pub input: PathBuf,

    /// Beacon formats to report
    #[arg(long, default_value_t, value_enum)]
    pub beacon: BeaconSelection,

    /// The name of the measurement in InfluxDB line protocol.
    #[arg(long, default_value = "beacon")]
    pub measurement: String,

    /// Throttle events per beacon to at most one per interval.
    /// Accepts duration with suffix: 3s, 1m, 500ms, 2h.
    /// Without suffix, value is interpreted as seconds.
    #[arg(long, value_parser = crate::throttle::parse_duration)]
    pub throttle: Option<Duration>,

    /// Only report these devices (XX:XX:XX:XX:XX:XX), may be repeated
    #[arg(long = "address", value_name = "ADDRESS")]
    pub addresses: Vec<DeviceAddress>,
}

impl ScanOptions {
    /// Whether reports from `address` pass the `--address` filter.
    #[must_use]
    pub fn accepts(&self, address: DeviceAddress) -> bool {
        self.addresses.is_empty() || self.addresses.contains(&address)
    }

    #[must_use]
    pub fn backend_config(&self) -> BackendConfig {
        BackendConfig {
            backend: self.backend,
            device: self.device,
            input: self.input.clone(),
        }
    }
}

/// Beacon to encode.
#[derive(Subcommand, Debug, Clone)]
pub enum EncodeBeacon {
    /// Eddystone UID frame
    EddystoneUid {
        /// 10 byte namespace as 20 hex characters
        #[arg(long)]
        namespace: String,
        /// 6 byte instance as 12 hex characters
        #[arg(long)]
        instance: String,
        #[command(flatten)]
        options: EncodeOptions,
    },
    /// Eddystone URL frame
    EddystoneUrl {
        /// URL starting with http://, https://, http://www. or https://www.
        #[arg(long)]
        url: String,
        #[command(flatten)]
        options: EncodeOptions,
    },
    /// Apple iBeacon
    Ibeacon {
        #[arg(long)]
        uuid: Uuid,
        #[arg(long)]
        major: u16,
        #[arg(long)]
        minor: u16,
        #[command(flatten)]
        options: EncodeOptions,
    },
}

impl EncodeBeacon {
    /// Build the beacon described on the command line.
    #[must_use]
    pub fn to_beacon(&self) -> Beacon {
        let mut beacon = match self {
            EncodeBeacon::EddystoneUid {
                namespace,
                instance,
                options,
            } => Beacon::eddystone(EddystoneFrame::uid(namespace, instance), options.tx_power),
            EncodeBeacon::EddystoneUrl { url, options } => {
                Beacon::eddystone(EddystoneFrame::url(url), options.tx_power)
            }
            EncodeBeacon::Ibeacon {
                uuid,
                major,
                minor,
                options,
            } => Beacon::ibeacon(IBeacon::new(*uuid, *major, *minor), options.tx_power),
        };
        beacon.flags = self.options().flags.apply(beacon.flags);
        beacon
    }

    #[must_use]
    pub fn options(&self) -> &EncodeOptions {
        match self {
            EncodeBeacon::EddystoneUid { options, .. }
            | EncodeBeacon::EddystoneUrl { options, .. }
            | EncodeBeacon::Ibeacon { options, .. } => options,
        }
    }
}

/// Options shared by every encoded beacon.
#[derive(Args, Debug, Clone)]
pub struct EncodeOptions {
    /// Calibrated tx power in dBm
    #[arg(long, allow_negative_numbers = true)]
    pub tx_power: i8,

    #[command(flatten)]
    pub flags: FlagOverrides,

    /// Configure the controller to transmit the beacon
    #[arg(long)]
    pub advertise: bool,

    /// HCI device index used with --advertise
    #[arg(long, default_value_t = 0)]
    pub device: u16,

    /// Minimum advertising interval in 0.625 ms units
    #[arg(long, default_value_t = 0x00A0)]
    pub interval_min: u16,

    /// Maximum advertising interval in 0.625 ms units
    #[arg(long, default_value_t = 0x00A0)]
    pub interval_max: u16,
}

/// Overrides for the advertising flags of an encoded beacon.
#[derive(Args, Debug, Clone, Default)]
pub struct FlagOverrides {
    /// LE limited discoverable mode
    #[arg(long)]
    pub le_limited: Option<bool>,
    /// LE general discoverable mode
    #[arg(long)]
    pub le_general: Option<bool>,
    /// BR/EDR supported
    #[arg(long)]
    pub br_edr_supported: Option<bool>,
    /// Simultaneous LE and BR/EDR, controller
    #[arg(long)]
    pub le_br_controller: Option<bool>,
    /// Simultaneous LE and BR/EDR, host
    #[arg(long)]
    pub le_br_host: Option<bool>,
}

impl FlagOverrides {
    #[must_use]
    pub fn apply(&self, flags: BeaconFlags) -> BeaconFlags {
        BeaconFlags {
            le_limited: self.le_limited.unwrap_or(flags.le_limited),
            le_general: self.le_general.unwrap_or(flags.le_general),
            br_edr_supported: self.br_edr_supported.unwrap_or(flags.br_edr_supported),
            le_br_controller: self.le_br_controller.unwrap_or(flags.le_br_controller),
            le_br_host: self.le_br_host.unwrap_or(flags.le_br_host),
        }
    }
}

/// SensorTag value to decode.
#[derive(Args, Debug, Clone)]
pub struct SensortagOptions {
    /// SensorTag generation [default: cc2541, or detected from --device-name]
    #[arg(long, value_enum)]
    pub firmware: Option<Firmware>,

    /// Advertised device name, used to detect the generation
    #[arg(long)]
    pub device_name: Option<String>,

    /// Sensor the value was read from
    #[arg(value_enum)]
    pub sensor: Sensor,

    /// Characteristic value as hex, bytes may be separate arguments
    #[arg(required = true, num_args = 1..)]
    pub value: Vec<String>,

    /// CC2541 barometer calibration characteristic as hex
    #[arg(long)]
    pub calibration: Option<String>,

    /// The name of the measurement in InfluxDB line protocol.
    #[arg(long, default_value = "sensortag")]
    pub measurement: String,
}

impl SensortagOptions {
    /// `--firmware` if given, else the generation named by `--device-name`.
    #[must_use]
    pub fn firmware(&self) -> Firmware {
        self.firmware
            .or_else(|| self.device_name.as_deref().map(Firmware::from_device_name))
            .unwrap_or_default()
    }
}

/// Errors returned by the application runners.
#[derive(Error, Debug)]
pub enum RunError {
    #[error(transparent)]
    Scan(#[from] ScanError),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error(transparent)]
    Encode(#[from] EncodeError),
    #[error("{0} reading has no finite values")]
    EmptyReading(Sensor),
}

/// Advertisement source abstraction to enable deterministic unit tests without
/// Bluetooth hardware.
pub trait RawAdvertisementSource: Send + Sync {
    fn open<'a>(
        &'a self,
        config: &'a BackendConfig,
    ) -> Pin<Box<dyn Future<Output = Result<mpsc::Receiver<RawEvent>, ScanError>> + Send + 'a>>;
}

/// Real source that delegates to the compiled-in backends.
#[derive(Debug, Default, Clone, Copy)]
pub struct RealSource;

impl RawAdvertisementSource for RealSource {
    fn open<'a>(
        &'a self,
        config: &'a BackendConfig,
    ) -> Pin<Box<dyn Future<Output = Result<mpsc::Receiver<RawEvent>, ScanError>> + Send + 'a>>
    {
        Box::pin(crate::scanner::open_source(config))
    }
}

fn write_observation(
    formatter: &dyn OutputFormatter,
    observation: &Observation,
    out: &mut dyn Write,
) -> io::Result<()> {
    let line = formatter.format(observation);
    writeln!(out, "{line}")
}

/// Run the selected subcommand.
pub async fn run(
    cli: Cli,
    source: &dyn RawAdvertisementSource,
    out: &mut dyn Write,
    err: &mut dyn Write,
) -> Result<(), RunError> {
    match cli.command {
        Command::Scan(options) => run_scan(options, cli.verbose, source, out, err).await,
        Command::Encode { beacon } => run_encode(&beacon, out),
        Command::Sensortag(options) => run_sensortag(&options, out),
    }
}

/// Run the scan loop, writing formatted output to `out` and verbose errors to `err`.
///
/// - Each advertising report batch is handed once to every selected factory.
/// - Every beacon found is optionally filtered by address, throttled per
///   (address, beacon kind), formatted and written as a line to `out`.
/// - Packets that are not advertising reports are skipped silently.
/// - Malformed packets and reports are written to `err` only when `verbose` is true.
pub async fn run_scan(
    options: ScanOptions,
    verbose: bool,
    source: &dyn RawAdvertisementSource,
    out: &mut dyn Write,
    err: &mut dyn Write,
) -> Result<(), RunError> {
    let factories = options.beacon.factories();
    scan_with(&options, &factories, verbose, source, out, err).await
}

async fn scan_with(
    options: &ScanOptions,
    factories: &[Box<dyn BeaconFactory>],
    verbose: bool,
    source: &dyn RawAdvertisementSource,
    out: &mut dyn Write,
    err: &mut dyn Write,
) -> Result<(), RunError> {
    let formatter = InfluxDbFormatter::new(options.measurement.clone());

    // Create throttle if interval is specified
    let mut throttle: Option<Throttle<(Option<DeviceAddress>, BeaconKind)>> =
        options.throttle.map(Throttle::new);

    let mut events = source.open(&options.backend_config()).await?;

    while let Some(event) = events.recv().await {
        let set = match parse_advertisement(&event) {
            Ok(Some(set)) => set,
            Ok(None) => continue,
            Err(decode_err) => {
                debug!("Skipping malformed packet: {decode_err}");
                report_malformed(err, verbose, &decode_err)?;
                continue;
            }
        };
        let timestamp = SystemTime::now();

        for factory in factories {
            let batch = factory.create_beacons(&set);

            for skipped in batch.skipped.iter().filter(|s| options.accepts(s.address)) {
                report_malformed(err, verbose, skipped)?;
            }

            for beacon in batch.beacons {
                if beacon.address.is_some_and(|address| !options.accepts(address)) {
                    continue;
                }

                let should_emit = throttle
                    .as_mut()
                    .is_none_or(|t| t.should_emit((beacon.address, beacon.kind())));

                if should_emit {
                    write_observation(&formatter, &Observation::new(beacon, timestamp), out)?;
                }
            }
        }
    }

    Ok(())
}

/// Print a malformed packet or report to `err` in verbose mode.
fn report_malformed(
    err: &mut dyn Write,
    verbose: bool,
    what: &dyn fmt::Display,
) -> io::Result<()> {
    if verbose {
        writeln!(err, "{what}")?;
    }
    Ok(())
}

/// Encode a beacon, write its advertising data to `out` and optionally hand it
/// to the controller.
pub fn run_encode(beacon: &EncodeBeacon, out: &mut dyn Write) -> Result<(), RunError> {
    let encoded = beacon.to_beacon().try_encode()?;
    writeln!(out, "{encoded}")?;

    let options = beacon.options();
    if options.advertise {
        let packets = vec![
            set_advertising_parameters(options.interval_min, options.interval_max),
            set_advertising_data(&encoded)?,
            set_advertising_enable(true),
        ];
        advertise(options.device, &packets)?;
    }
    Ok(())
}

#[cfg(feature = "hci")]
fn advertise(device: u16, packets: &[Vec<u8>]) -> Result<(), ScanError> {
    crate::scanner::hci::advertise(device, packets)
}

#[cfg(not(feature = "hci"))]
fn advertise(_device: u16, _packets: &[Vec<u8>]) -> Result<(), ScanError> {
    Err(ScanError::BackendNotAvailable("hci".to_string()))
}

/// Decode a SensorTag value and write it as a line to `out`.
pub fn run_sensortag(options: &SensortagOptions, out: &mut dyn Write) -> Result<(), RunError> {
    let calibration = options
        .calibration
        .as_deref()
        .map(BarometerCalibration::from_hex)
        .transpose()?;
    let firmware = options.firmware();
    let value = options.value.join(" ");
    let reading = decode(options.sensor, &value, firmware, calibration.as_ref())?;
    let line = format_reading(&options.measurement, firmware, &reading)
        .ok_or(RunError::EmptyReading(options.sensor))?;
    writeln!(out, "{line}")?;
    Ok(())
}
