//! Generic depacketization constants.
//!
//! Defines values shared by every payload handler and the transport framing
//! constants used when parsing full RTP packets. Format-specific constants live
//! in their handler modules.

use std::time::Duration;

// --- Reassembly Limits ---

/// Default upper bound for one reassembled access unit (4 MiB).
pub const DEFAULT_MAX_UNIT_SIZE: usize = 4 * 1024 * 1024;
/// First allocation made by an accumulator once it receives data.
pub const ACCUMULATOR_INITIAL_CAPACITY: usize = 1500;
/// Tolerated transport-sequence gap when salvaging a unit without picture ids.
pub const DEFAULT_SALVAGE_SEQUENCE_GAP: u16 = 1;
/// Streams idle for longer than this are eligible for pruning.
pub const DEFAULT_STREAM_IDLE_TIMEOUT: Duration = Duration::from_secs(5 * 60);

// --- RTP Fixed Header (RFC 3550, Sec 5.1) ---

/// Length of the fixed RTP header without CSRCs or extension.
pub const RTP_FIXED_HEADER_LENGTH: usize = 12;
/// RTP version carried in the two most significant bits.
pub const RTP_VERSION: u8 = 2;
/// Mask for the padding (P) bit in the first octet.
pub const RTP_PADDING_BIT_MASK: u8 = 0b0010_0000;
/// Mask for the extension (X) bit in the first octet.
pub const RTP_EXTENSION_BIT_MASK: u8 = 0b0001_0000;
/// Mask for the CSRC count (CC) in the first octet.
pub const RTP_CSRC_COUNT_MASK: u8 = 0b0000_1111;
/// Mask for the marker (M) bit in the second octet.
pub const RTP_MARKER_BIT_MASK: u8 = 0b1000_0000;
/// Mask for the payload type in the second octet.
pub const RTP_PAYLOAD_TYPE_MASK: u8 = 0b0111_1111;
