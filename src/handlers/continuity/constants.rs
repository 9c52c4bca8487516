//! Constants for continuity-tracked formats.
//!
//! Values for VP8 are taken from RFC 7741 (payload descriptor) and RFC 6386
//! (frame tag).

// --- VP8 Payload Descriptor (RFC 7741, Sec 4.2) ---

/// Extended control bits present (X).
pub const VP8_X_BIT_MASK: u8 = 0b1000_0000;
/// Start of VP8 partition (S).
pub const VP8_S_BIT_MASK: u8 = 0b0001_0000;
/// Partition index (PID), including the reserved bit above it.
pub const VP8_PARTITION_ID_MASK: u8 = 0b0000_1111;
/// Picture ID present (I) in the extension octet.
pub const VP8_I_BIT_MASK: u8 = 0b1000_0000;
/// TL0PICIDX present (L) in the extension octet.
pub const VP8_L_BIT_MASK: u8 = 0b0100_0000;
/// TID present (T) in the extension octet.
pub const VP8_T_BIT_MASK: u8 = 0b0010_0000;
/// KEYIDX present (K) in the extension octet.
pub const VP8_K_BIT_MASK: u8 = 0b0001_0000;
/// Extended 15-bit picture ID flag (M) in the first picture ID octet.
pub const VP8_PICTURE_ID_M_BIT_MASK: u8 = 0b1000_0000;

// --- VP8 Frame Tag (RFC 6386, Sec 9.1) ---

/// Length of the frame tag opening every VP8 frame.
pub const VP8_FRAME_TAG_LENGTH: usize = 3;
/// Inverse key frame flag (P) in the first frame tag octet.
pub const VP8_INTER_FRAME_BIT_MASK: u8 = 0b0000_0001;
/// Shift extracting the low bits of the first partition size from octet 0.
pub const VP8_FIRST_PARTITION_SIZE_SHIFT: u8 = 5;
