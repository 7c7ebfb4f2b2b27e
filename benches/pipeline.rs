//! Benchmarks for the advertisement processing pipeline.
//!
//! Covers the synchronous decode path (report parsing + beacon factories) and
//! the full application loop with a FakeSource feeding raw HCI events
//! through run_scan, as in the app.rs tests.

use beacon_listener::app::{BeaconSelection, RawAdvertisementSource, ScanOptions, run_scan};
use beacon_listener::{
    Backend, BackendConfig, BeaconFactory, EddystoneFactory, IBeaconFactory, RawEvent, ScanError,
    parse_advertisement,
};
use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use tokio::runtime::Runtime;
use tokio::sync::mpsc;

/// iBeacon advertisement data (flags + Apple manufacturer data)
const IBEACON_PAYLOAD: &[u8] = &[
    0x02, 0x01, 0x06, 0x1A, 0xFF, 0x4C, 0x00, 0x02, 0x15, 0xF7, 0x82, 0x6D, 0xA6, 0x4F, 0xA2,
    0x4E, 0x98, 0x80, 0x24, 0xBC, 0x5B, 0x71, 0xE0, 0x89, 0x3E, 0x03, 0xE8, 0x00, 0x2A, 0xC5,
];

/// Eddystone URL advertisement data for http://www.example.com
const EDDYSTONE_URL_PAYLOAD: &[u8] = &[
    0x02, 0x01, 0x06, 0x03, 0x03, 0xAA, 0xFE, 0x0E, 0x16, 0xAA, 0xFE, 0x10, 0xEB, 0x00, b'e',
    b'x', b'a', b'm', b'p', b'l', b'e', 0x07,
];

/// Wrap AD payloads into one LE Advertising Report event, one report each.
fn advertising_event(address_byte: u8, payloads: &[&[u8]]) -> RawEvent {
    let mut params = vec![0x02, payloads.len() as u8];
    for payload in payloads {
        params.extend_from_slice(&[0x03, 0x00, address_byte, 0x71, 0xDA, 0x7D, 0x1A, 0x00]);
        params.push(payload.len() as u8);
        params.extend_from_slice(payload);
        params.push(0xBD); // -67 dBm
    }
    let mut event = vec![0x04, 0x3E, params.len() as u8];
    event.extend(params);
    event
}

/// A fake source that replays raw events, similar to the one in app.rs tests.
struct FakeSource {
    events: Vec<RawEvent>,
}

impl RawAdvertisementSource for FakeSource {
    fn open<'a>(
        &'a self,
        _config: &'a BackendConfig,
    ) -> Pin<Box<dyn Future<Output = Result<mpsc::Receiver<RawEvent>, ScanError>> + Send + 'a>>
    {
        let events = self.events.clone();
        Box::pin(async move {
            let (tx, rx) = mpsc::channel::<RawEvent>(events.len().max(1));
            tokio::spawn(async move {
                for event in events {
                    let _ = tx.send(event).await;
                }
            });
            Ok(rx)
        })
    }
}

fn default_options() -> ScanOptions {
    ScanOptions {
        backend: Backend::Btsnoop,
        device: 0,
        input: PathBuf::from("-"),
        beacon: BeaconSelection::All,
        measurement: "beacon".to_string(),
        throttle: None,
        addresses: Vec::new(),
    }
}

fn run(rt: &Runtime, events: Vec<RawEvent>, options: ScanOptions) -> Vec<u8> {
    let source = FakeSource { events };
    let mut out = Vec::<u8>::with_capacity(256);
    let mut err = Vec::<u8>::new();
    rt.block_on(async {
        run_scan(options, false, &source, &mut out, &mut err)
            .await
            .unwrap();
    });
    out
}

/// Benchmark the synchronous decode path: event -> report set -> beacons
fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode");
    group.throughput(Throughput::Elements(1));

    let ibeacon = advertising_event(0x13, &[IBEACON_PAYLOAD]);
    group.bench_function("parse_advertisement", |b| {
        b.iter(|| black_box(parse_advertisement(black_box(&ibeacon))))
    });

    let factories: Vec<Box<dyn BeaconFactory>> =
        vec![Box::new(EddystoneFactory), Box::new(IBeaconFactory)];
    for (name, event) in [
        ("ibeacon", ibeacon.clone()),
        ("eddystone_url", advertising_event(0x13, &[EDDYSTONE_URL_PAYLOAD])),
    ] {
        let set = parse_advertisement(&event).unwrap().unwrap();
        group.bench_function(BenchmarkId::new("factories", name), |b| {
            b.iter(|| {
                for factory in &factories {
                    black_box(factory.create_beacons(black_box(&set)));
                }
            })
        });
    }

    group.finish();
}

/// Benchmark batch processing through the full pipeline
fn bench_batch_pipeline(c: &mut Criterion) {
    let mut group = c.benchmark_group("batch_pipeline");
    let rt = Runtime::new().unwrap();

    for batch_size in [1, 10, 100] {
        group.throughput(Throughput::Elements(batch_size as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(batch_size),
            &batch_size,
            |b, &size| {
                let events: Vec<RawEvent> = (0..size)
                    .map(|i| advertising_event(i as u8, &[IBEACON_PAYLOAD, EDDYSTONE_URL_PAYLOAD]))
                    .collect();
                b.iter(|| black_box(run(&rt, events.clone(), default_options())))
            },
        );
    }

    group.finish();
}

/// Benchmark with throttling enabled (one device advertising over and over)
fn bench_throttled_pipeline(c: &mut Criterion) {
    let mut group = c.benchmark_group("throttled_pipeline");
    let rt = Runtime::new().unwrap();

    let events: Vec<RawEvent> = (0..100)
        .map(|_| advertising_event(0x13, &[IBEACON_PAYLOAD]))
        .collect();

    group.throughput(Throughput::Elements(100));
    group.bench_function("100_same_beacon_throttled", |b| {
        b.iter(|| {
            let mut options = default_options();
            options.throttle = Some(std::time::Duration::from_secs(3600));
            let out = run(&rt, events.clone(), options);

            // Only the first observation passes the throttle
            debug_assert_eq!(out.iter().filter(|&&b| b == b'\n').count(), 1);

            black_box(out)
        })
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_decode,
    bench_batch_pipeline,
    bench_throttled_pipeline,
);
criterion_main!(benches);
