//! Constants for QCELP interleaved payloads (RFC 2658).

// --- Payload Header (RFC 2658, Sec 6) ---

/// Mask of the interleave length (LLL) after shifting.
pub const QCELP_INTERLEAVE_LENGTH_MASK: u8 = 0b0000_0111;
/// Shift of the interleave length field in the header octet.
pub const QCELP_INTERLEAVE_LENGTH_SHIFT: u8 = 3;
/// Mask of the interleave index (NNN).
pub const QCELP_INTERLEAVE_INDEX_MASK: u8 = 0b0000_0111;
/// Largest interleave length a sender may use.
pub const QCELP_MAX_INTERLEAVE_LENGTH: u8 = 5;
/// Number of slots when the interleave length is at its maximum.
pub const QCELP_MAX_SLOTS: usize = QCELP_MAX_INTERLEAVE_LENGTH as usize + 1;
/// Smallest valid payload: header octet plus one rate octet.
pub const QCELP_MIN_PAYLOAD_LENGTH: usize = 2;

// --- Frames ---

/// Frame length (rate octet included) indexed by the rate octet.
pub const QCELP_FRAME_SIZES: [usize; 5] = [1, 4, 8, 17, 35];
/// Largest frame.
pub const QCELP_MAX_FRAME_SIZE: usize = 35;
/// Frames a single packet may carry.
pub const QCELP_MAX_FRAMES_PER_PACKET: usize = 10;
/// Bytes a slot may carry forward: every frame of a packet but the first.
pub const QCELP_SLOT_CAPACITY: usize = QCELP_MAX_FRAME_SIZE * (QCELP_MAX_FRAMES_PER_PACKET - 1);
/// Largest payload accepted, header octet included.
pub const QCELP_MAX_PAYLOAD_LENGTH: usize = 1 + QCELP_MAX_FRAME_SIZE * QCELP_MAX_FRAMES_PER_PACKET;
/// Media clock ticks covered by one frame (20 ms at 8 kHz).
pub const QCELP_FRAME_DURATION: u32 = 160;
/// Unit emitted in place of a frame that was lost.
pub const QCELP_ERASURE_FRAME: [u8; 1] = [0x00];
