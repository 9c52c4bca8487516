//! Payload header constants for the concatenation framings.

// --- VP9 Payload Descriptor ---

/// Picture ID present (I).
pub const VP9_I_BIT_MASK: u8 = 0b1000_0000;
/// Inter-picture predicted (P).
pub const VP9_P_BIT_MASK: u8 = 0b0100_0000;
/// Layer indices present (L).
pub const VP9_L_BIT_MASK: u8 = 0b0010_0000;
/// Flexible mode (F).
pub const VP9_F_BIT_MASK: u8 = 0b0001_0000;
/// Start of frame (B).
pub const VP9_B_BIT_MASK: u8 = 0b0000_1000;
/// Scalability structure present (V).
pub const VP9_V_BIT_MASK: u8 = 0b0000_0010;
/// Extended (15-bit) picture ID flag (M) in the first picture ID octet.
pub const VP9_PICTURE_ID_M_BIT_MASK: u8 = 0b1000_0000;
/// Another P_DIFF follows (N).
pub const VP9_P_DIFF_N_BIT_MASK: u8 = 0b0000_0001;
/// Reference indices allowed in flexible mode.
pub const VP9_MAX_REFERENCE_PICTURES: usize = 3;
/// Resolution present per spatial layer (Y).
pub const VP9_SS_Y_BIT_MASK: u8 = 0b0001_0000;
/// Picture group description present (G).
pub const VP9_SS_G_BIT_MASK: u8 = 0b0000_1000;
/// Width and height of one spatial layer.
pub const VP9_SS_RESOLUTION_LENGTH: usize = 4;

// --- H.263 Payload Header (RFC 4629, Sec 5.1) ---

/// Picture start (P): two zero bytes of the start code were omitted.
pub const H263_P_BIT_MASK: u16 = 0x0400;
/// Video redundancy coding byte present (V).
pub const H263_V_BIT_MASK: u16 = 0x0200;
/// Length of the extra picture header (PLEN).
pub const H263_PLEN_MASK: u16 = 0x01F8;
/// Shift applied after masking PLEN.
pub const H263_PLEN_SHIFT: u16 = 3;
/// Start code bytes restored when P is set.
pub const H263_START_CODE_PREFIX: [u8; 2] = [0x00, 0x00];
