//! VP8 payload descriptor parsing (RFC 7741).
//!
//! ```text
//!       0 1 2 3 4 5 6 7
//!      +-+-+-+-+-+-+-+-+
//!      |X|R|N|S|R| PID | (REQUIRED)
//!      +-+-+-+-+-+-+-+-+
//! X:   |I|L|T|K| RSV   | (OPTIONAL)
//!      +-+-+-+-+-+-+-+-+
//! I:   |M| PictureID   | (OPTIONAL, second octet if M)
//!      +-+-+-+-+-+-+-+-+
//! L:   |   TL0PICIDX   | (OPTIONAL)
//!      +-+-+-+-+-+-+-+-+
//! T/K: |TID|Y| KEYIDX  | (OPTIONAL)
//!      +-+-+-+-+-+-+-+-+
//! ```

use super::constants::*;
use super::format::{ContinuityFormat, ContinuityPacket, UnitStart};

use crate::cursor::ByteCursor;
use crate::error::ParsingError;
use crate::packet_defs::PayloadFormat;
use crate::types::{PictureId, PictureIdWidth};

/// VP8 payload descriptor parser.
#[derive(Debug, Clone, Copy, Default)]
pub struct Vp8Format;

impl ContinuityFormat for Vp8Format {
    fn format(&self) -> PayloadFormat {
        PayloadFormat::Vp8
    }

    fn parse<'a>(&self, payload: &'a [u8]) -> Result<ContinuityPacket<'a>, ParsingError> {
        let mut cursor = ByteCursor::new(payload, "VP8 payload descriptor");
        let required = cursor.read_u8()?;
        let partition_start = required & VP8_S_BIT_MASK != 0;
        let partition_id = required & VP8_PARTITION_ID_MASK;

        let mut picture_id = None;
        if required & VP8_X_BIT_MASK != 0 {
            let extension = cursor.read_u8()?;
            if extension & VP8_I_BIT_MASK != 0 {
                let first = cursor.read_u8()?;
                picture_id = Some(if first & VP8_PICTURE_ID_M_BIT_MASK != 0 {
                    let second = cursor.read_u8()?;
                    PictureId::new(u16::from_be_bytes([first, second]), PictureIdWidth::Long)
                } else {
                    PictureId::new(u16::from(first), PictureIdWidth::Short)
                });
            }
            if extension & VP8_L_BIT_MASK != 0 {
                cursor.skip(1)?;
            }
            if extension & (VP8_T_BIT_MASK | VP8_K_BIT_MASK) != 0 {
                cursor.skip(1)?;
            }
        }

        let body = cursor.take_rest();
        if body.is_empty() {
            return Err(ParsingError::NotEnoughData {
                needed: payload.len() + 1,
                got: payload.len(),
                context: "VP8 payload",
            });
        }

        let unit_start = if partition_start && partition_id == 0 {
            Some(parse_frame_tag(body)?)
        } else {
            None
        };

        Ok(ContinuityPacket {
            unit_start,
            picture_id,
            body,
        })
    }
}

/// Reads key-frame flag and first partition size from a VP8 frame tag.
fn parse_frame_tag(body: &[u8]) -> Result<UnitStart, ParsingError> {
    let mut cursor = ByteCursor::new(body, "VP8 frame tag");
    let tag = cursor.read_bytes(VP8_FRAME_TAG_LENGTH)?;
    let size_low = usize::from(tag[0] >> VP8_FIRST_PARTITION_SIZE_SHIFT);
    let size_high = usize::from(u16::from_le_bytes([tag[1], tag[2]]));
    Ok(UnitStart {
        key_unit: tag[0] & VP8_INTER_FRAME_BIT_MASK == 0,
        first_partition_size: ((size_high << 3) | size_low) + VP8_FRAME_TAG_LENGTH,
    })
}
