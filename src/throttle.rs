//! Event throttling for beacon observations.
//!
//! This module provides per-key throttling to limit how often observations
//! are emitted for each beacon. Beacons advertise several times a second
//! while their content rarely changes.

use std::collections::HashMap;
use std::hash::Hash;
use std::time::{Duration, Instant};

/// A throttle that limits the rate of events per key.
///
/// Each key is tracked independently, allowing at most one event per `interval`
/// duration. The first event for a key is always allowed.
#[derive(Debug)]
pub struct Throttle<K> {
    /// Minimum time between events for each key
    interval: Duration,
    /// Last emitted event time for each key
    last_seen: HashMap<K, Instant>,
}

impl<K: Hash + Eq> Throttle<K> {
    /// Create a new throttle with the specified minimum interval between events.
    ///
    /// # Arguments
    /// * `interval` - Minimum duration between events for each key
    ///
    /// # Example
    /// ```
    /// use std::time::Duration;
    /// use beacon_listener::throttle::Throttle;
    ///
    /// let mut throttle = Throttle::new(Duration::from_secs(3));
    /// assert!(throttle.should_emit("AA:BB:CC:DD:EE:FF"));
    /// assert!(!throttle.should_emit("AA:BB:CC:DD:EE:FF"));
    /// ```
    pub fn new(interval: Duration) -> Self {
        Throttle {
            interval,
            last_seen: HashMap::new(),
        }
    }

    /// Check if an event for the given key should be allowed.
    ///
    /// Returns `true` if enough time has passed since the last emitted event
    /// for this key (or if this is the first event). If `true` is returned,
    /// the internal timer for this key is reset.
    ///
    /// # Arguments
    /// * `key` - Identifies the event source
    ///
    /// # Returns
    /// `true` if the event should be emitted, `false` if it should be throttled
    pub fn should_emit(&mut self, key: K) -> bool {
        let now = Instant::now();

        match self.last_seen.get(&key) {
            Some(last) if now.duration_since(*last) < self.interval => false,
            _ => {
                self.last_seen.insert(key, now);
                true
            }
        }
    }
}

/// Duration suffixes, `ms` ahead of `m` and `s`.
const UNITS: [(&str, &str, u64); 4] = [
    ("ms", "milliseconds", 1),
    ("h", "hours", 3_600_000),
    ("m", "minutes", 60_000),
    ("s", "seconds", 1_000),
];

/// Parse a duration from a human-readable string.
///
/// Supports the following suffixes:
/// - `s` or no suffix: seconds
/// - `m`: minutes
/// - `h`: hours
/// - `ms`: milliseconds
///
/// # Examples
/// ```
/// use beacon_listener::throttle::parse_duration;
/// use std::time::Duration;
///
/// assert_eq!(parse_duration("3s").unwrap(), Duration::from_secs(3));
/// assert_eq!(parse_duration("1m").unwrap(), Duration::from_secs(60));
/// assert_eq!(parse_duration("500ms").unwrap(), Duration::from_millis(500));
/// ```
pub fn parse_duration(src: &str) -> Result<Duration, String> {
    let src = src.trim();

    if src.is_empty() {
        return Err("empty duration string".to_string());
    }

    let (num, unit, millis) = UNITS
        .iter()
        .find_map(|&(suffix, unit, millis)| {
            src.strip_suffix(suffix).map(|num| (num, unit, millis))
        })
        .unwrap_or((src, "seconds", 1_000));

    let value: u64 = num
        .trim()
        .parse()
        .map_err(|_| format!("invalid {unit}: {num}"))?;
    value
        .checked_mul(millis)
        .map(Duration::from_millis)
        .ok_or_else(|| format!("duration too long: {src}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::DeviceAddress;
    use crate::beacon::BeaconKind;
    use rstest::rstest;

    const TAG: DeviceAddress = DeviceAddress([0x00, 0x1A, 0x7D, 0xDA, 0x71, 0x13]);
    const OTHER: DeviceAddress = DeviceAddress([0xAA, 0xBB, 0xCC, 0xDD, 0xEE, 0xFF]);

    #[test]
    fn first_event_per_key_passes() {
        let mut throttle = Throttle::new(Duration::from_secs(1));
        assert!(throttle.should_emit((TAG, BeaconKind::IBeacon)));
        assert!(!throttle.should_emit((TAG, BeaconKind::IBeacon)));
    }

    #[test]
    fn keys_are_independent() {
        let mut throttle = Throttle::new(Duration::from_secs(1));
        // A device advertising both formats is throttled per format
        assert!(throttle.should_emit((TAG, BeaconKind::IBeacon)));
        assert!(throttle.should_emit((TAG, BeaconKind::Eddystone)));
        assert!(throttle.should_emit((OTHER, BeaconKind::IBeacon)));

        for _ in 0..10 {
            assert!(!throttle.should_emit((TAG, BeaconKind::IBeacon)));
            assert!(!throttle.should_emit((TAG, BeaconKind::Eddystone)));
            assert!(!throttle.should_emit((OTHER, BeaconKind::IBeacon)));
        }
    }

    #[test]
    fn zero_interval_never_blocks() {
        let mut throttle = Throttle::new(Duration::ZERO);
        assert!(throttle.should_emit(TAG));
        assert!(throttle.should_emit(TAG));
    }

    #[test]
    fn allowed_again_after_interval() {
        let mut throttle = Throttle::new(Duration::from_millis(10));
        assert!(throttle.should_emit(TAG));
        assert!(!throttle.should_emit(TAG));

        std::thread::sleep(Duration::from_millis(15));
        assert!(throttle.should_emit(TAG));
        assert!(!throttle.should_emit(TAG));
    }

    #[test]
    fn blocked_event_does_not_reset_timer() {
        let mut throttle = Throttle::new(Duration::from_millis(30));

        assert!(throttle.should_emit(TAG)); // t=0, timer starts

        std::thread::sleep(Duration::from_millis(10));
        assert!(!throttle.should_emit(TAG)); // t=10, blocked, timer NOT reset

        std::thread::sleep(Duration::from_millis(10));
        assert!(!throttle.should_emit(TAG)); // t=20, still blocked

        std::thread::sleep(Duration::from_millis(15));
        assert!(throttle.should_emit(TAG)); // t=35, past the interval from t=0
    }

    #[rstest]
    #[case("3s", Duration::from_secs(3))]
    #[case("0s", Duration::ZERO)]
    #[case("1m", Duration::from_secs(60))]
    #[case("2h", Duration::from_secs(7200))]
    #[case("500ms", Duration::from_millis(500))]
    #[case("10", Duration::from_secs(10))]
    #[case(" 3s ", Duration::from_secs(3))]
    #[case("3 s", Duration::from_secs(3))]
    fn parses_durations(#[case] src: &str, #[case] expected: Duration) {
        assert_eq!(parse_duration(src).unwrap(), expected);
    }

    #[rstest]
    #[case("")]
    #[case("abc")]
    #[case("-1s")]
    #[case("1.5s")]
    #[case("99999999999999999h")]
    fn rejects_bad_durations(#[case] src: &str) {
        assert!(parse_duration(src).is_err());
    }

    #[test]
    fn error_names_the_unit() {
        assert_eq!(parse_duration("xm").unwrap_err(), "invalid minutes: x");
    }
}
