//! Modular comparison utilities for transport sequence numbers and picture identifiers.
//!
//! Transport sequence numbers are 16-bit counters that wrap at 65536. A received
//! number is interpreted relative to a reference through the signed difference
//! modulo 2^16: `[0, 32767]` is forward (including "exactly the expected one"),
//! `[-32768, -1]` is backward. Picture identifiers wrap at their declared width
//! (7 or 15 bits) instead.

use crate::types::{PictureId, SequenceNumber};

/// Signed distance from `expected` to `received`, modulo 2^16.
///
/// # Parameters
/// - `received`: The sequence number carried by the packet.
/// - `expected`: The sequence number the stream expected next.
///
/// # Returns
/// A value in `[-32768, 32767]`; zero means `received == expected`.
#[inline]
pub fn sequence_distance(received: SequenceNumber, expected: SequenceNumber) -> i16 {
    received.value().wrapping_sub(expected.value()) as i16
}

/// Returns `true` if `received` is at most `max_gap` packets ahead of `expected`.
///
/// A gap of zero means "exactly expected". Backward numbers never qualify.
///
/// # Parameters
/// - `received`: The sequence number carried by the packet.
/// - `expected`: The sequence number the stream expected next.
/// - `max_gap`: The largest tolerated number of missing packets.
#[inline]
pub fn is_within_gap(received: SequenceNumber, expected: SequenceNumber, max_gap: u16) -> bool {
    let distance = sequence_distance(received, expected);
    distance >= 0 && (distance as u16) <= max_gap
}

/// Returns `true` if `received` is the picture directly following `previous`.
///
/// The comparison uses the width declared by `received`, so a sender that moves
/// from the 7-bit to the 15-bit form is still compared modulo its new width.
///
/// # Parameters
/// - `received`: Picture identifier of the packet that starts a new unit.
/// - `previous`: Picture identifier of the last unit that was started.
#[inline]
pub fn is_next_picture(received: PictureId, previous: PictureId) -> bool {
    previous.successor(received.width).value == received.value
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PictureIdWidth;

    fn sn(value: u16) -> SequenceNumber {
        SequenceNumber::new(value)
    }

    #[test]
    fn sequence_distance_basic() {
        assert_eq!(sequence_distance(sn(10), sn(10)), 0);
        assert_eq!(sequence_distance(sn(12), sn(10)), 2);
        assert_eq!(sequence_distance(sn(8), sn(10)), -2);
    }

    #[test]
    fn sequence_distance_across_wraparound() {
        // Last seen 65535, so 0 is expected.
        let expected = sn(65535).next();
        assert_eq!(sequence_distance(sn(0), expected), 0);
        assert_eq!(sequence_distance(sn(1), expected), 1);
        assert_eq!(sequence_distance(sn(65535), expected), -1);
        assert_eq!(sequence_distance(sn(32767), sn(0)), 32767);
        assert_eq!(sequence_distance(sn(32768), sn(0)), -32768);
    }

    #[test]
    fn is_within_gap_respects_threshold() {
        assert!(is_within_gap(sn(5), sn(5), 1));
        assert!(is_within_gap(sn(6), sn(5), 1));
        assert!(!is_within_gap(sn(7), sn(5), 1));
        assert!(is_within_gap(sn(7), sn(5), 2));
        assert!(!is_within_gap(sn(4), sn(5), 1));
        assert!(is_within_gap(sn(0), sn(65535), 1));
    }

    #[test]
    fn next_picture_short_and_long() {
        let prev = PictureId::new(0x7F, PictureIdWidth::Short);
        assert!(is_next_picture(
            PictureId::new(0, PictureIdWidth::Short),
            prev
        ));
        assert!(!is_next_picture(
            PictureId::new(1, PictureIdWidth::Short),
            prev
        ));

        let prev_long = PictureId::new(0x7FFF, PictureIdWidth::Long);
        assert!(is_next_picture(
            PictureId::new(0, PictureIdWidth::Long),
            prev_long
        ));

        // Switching widths compares modulo the new width.
        let prev_short = PictureId::new(0x7F, PictureIdWidth::Short);
        assert!(is_next_picture(
            PictureId::new(0x80, PictureIdWidth::Long),
            prev_short
        ));
    }
}
