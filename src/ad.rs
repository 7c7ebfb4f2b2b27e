//! Advertising Data (AD / EIR) structure walker.
//!
//! An advertising payload is a sequence of `length, type, data...` records
//! where `length` counts the type byte and the data but not itself. A zero
//! length byte ends the payload early (controllers pad with zeros).

use crate::error::{DecodeError, Result};

/// AD type: Flags
pub const AD_TYPE_FLAGS: u8 = 0x01;
/// AD type: Complete List of 16-bit Service UUIDs
pub const AD_TYPE_UUID16_LIST: u8 = 0x03;
/// AD type: Service Data - 16-bit UUID
pub const AD_TYPE_SERVICE_DATA_UUID16: u8 = 0x16;
/// AD type: Manufacturer Specific Data
pub const AD_TYPE_MANUFACTURER_DATA: u8 = 0xFF;

/// One AD structure borrowed from the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdStructure<'a> {
    /// Offset of the length byte within the payload
    pub offset: usize,
    /// AD type byte
    pub ad_type: u8,
    /// The `length - 1` bytes following the type byte
    pub data: &'a [u8],
}

/// Iterator over the AD structures of a payload.
///
/// The walk is driven only by the borrowed slice and a cursor, so cloning
/// the iterator (or calling [`ad_structures`] again) restarts it. After the
/// first error the iterator is exhausted.
#[derive(Debug, Clone)]
pub struct AdStructures<'a> {
    data: &'a [u8],
    cursor: usize,
    done: bool,
}

/// Walk the AD structures of `payload`.
///
/// # Example
///
/// ```rust
/// use beacon_listener::ad::ad_structures;
///
/// let mut walker = ad_structures(&[0x02, 0x01, 0x06, 0x00]);
/// let flags = walker.next().unwrap().unwrap();
/// assert_eq!((flags.ad_type, flags.data), (0x01, &[0x06][..]));
/// assert!(walker.next().is_none());
/// ```
#[must_use]
pub fn ad_structures(payload: &[u8]) -> AdStructures<'_> {
    AdStructures {
        data: payload,
        cursor: 0,
        done: false,
    }
}

impl<'a> Iterator for AdStructures<'a> {
    type Item = Result<AdStructure<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done || self.cursor >= self.data.len() {
            return None;
        }

        let offset = self.cursor;
        let size = usize::from(self.data[offset]);
        if size == 0 {
            self.done = true;
            return None;
        }

        let remaining = self.data.len() - offset - 1;
        if size > remaining {
            self.done = true;
            return Some(Err(DecodeError::TruncatedRecord {
                offset,
                declared: size,
                remaining,
            }));
        }

        self.cursor = offset + size + 1;
        Some(Ok(AdStructure {
            offset,
            ad_type: self.data[offset + 1],
            data: &self.data[offset + 2..self.cursor],
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_structure_then_zero_terminator() {
        let payload = [0x02, 0x01, 0x06, 0x00];
        let items: Vec<_> = ad_structures(&payload).collect();
        assert_eq!(
            items,
            vec![Ok(AdStructure {
                offset: 0,
                ad_type: 0x01,
                data: &[0x06]
            })]
        );
    }

    #[test]
    fn walks_every_structure_in_order() {
        let payload = [
            0x02, 0x01, 0x1A, // flags
            0x03, 0x03, 0xAA, 0xFE, // 16-bit UUID list
            0x01, 0x09, // empty local name
        ];
        let types: Vec<u8> = ad_structures(&payload)
            .map(|s| s.unwrap().ad_type)
            .collect();
        assert_eq!(types, vec![0x01, 0x03, 0x09]);

        let last = ad_structures(&payload).last().unwrap().unwrap();
        assert_eq!(last.offset, 7);
        assert!(last.data.is_empty());
    }

    #[test]
    fn truncated_structure_is_an_error_and_ends_the_walk() {
        let payload = [0x02, 0x01, 0x06, 0x05, 0xFF, 0x4C];
        let mut walker = ad_structures(&payload);
        assert!(walker.next().unwrap().is_ok());
        assert_eq!(
            walker.next(),
            Some(Err(DecodeError::TruncatedRecord {
                offset: 3,
                declared: 5,
                remaining: 2
            }))
        );
        assert!(walker.next().is_none());
    }

    #[test]
    fn empty_payload_yields_nothing() {
        assert_eq!(ad_structures(&[]).count(), 0);
        assert_eq!(ad_structures(&[0x00, 0x02, 0x01]).count(), 0);
    }

    #[test]
    fn clone_restarts_from_the_same_position() {
        let payload = [0x02, 0x01, 0x06, 0x02, 0x0A, 0xF4];
        let mut walker = ad_structures(&payload);
        walker.next();
        let replay = walker.clone();
        assert_eq!(walker.count(), 1);
        assert_eq!(replay.count(), 1);
    }
}
