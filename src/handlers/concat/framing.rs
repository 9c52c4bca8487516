//! Payload headers of the formats reassembled by plain concatenation.
//!
//! Each framing strips its format's payload header and reports whether the
//! packet explicitly starts a new access unit. Parsing never touches stream
//! state, so a malformed header leaves the in-progress unit intact.

use super::constants::*;

use crate::cursor::ByteCursor;
use crate::error::ParsingError;

/// Payload header layout in front of each fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConcatFraming {
    /// No payload header; the whole payload is unit data.
    Plain,
    /// VP9 payload descriptor.
    Vp9,
    /// RFC 4629 H.263 payload header.
    H263,
}

/// One fragment with its payload header removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fragment<'a> {
    /// `Some(true)` if the header marks the first packet of a unit, `None` if
    /// the framing carries no such indication.
    pub unit_start: Option<bool>,
    /// Bytes to emit in front of `body` (restored start codes).
    pub prefix: &'static [u8],
    /// Unit data carried by this packet.
    pub body: &'a [u8],
}

impl ConcatFraming {
    /// Strips the payload header from `payload`.
    ///
    /// # Errors
    /// - [`ParsingError::NotEnoughData`] - The payload ends inside its header or carries no data
    /// - [`ParsingError::InvalidFieldValue`] - A header field is out of range
    pub fn parse(self, payload: &[u8]) -> Result<Fragment<'_>, ParsingError> {
        match self {
            ConcatFraming::Plain => parse_plain(payload),
            ConcatFraming::Vp9 => parse_vp9(payload),
            ConcatFraming::H263 => parse_h263(payload),
        }
    }

    /// Returns `true` if a unit may only be opened by a packet flagged as its start.
    pub fn requires_start_flag(self) -> bool {
        matches!(self, ConcatFraming::Vp9)
    }
}

fn parse_plain(payload: &[u8]) -> Result<Fragment<'_>, ParsingError> {
    if payload.is_empty() {
        return Err(ParsingError::NotEnoughData {
            needed: 1,
            got: 0,
            context: "concatenated payload",
        });
    }
    Ok(Fragment {
        unit_start: None,
        prefix: &[],
        body: payload,
    })
}

fn parse_vp9(payload: &[u8]) -> Result<Fragment<'_>, ParsingError> {
    let mut cursor = ByteCursor::new(payload, "VP9 payload descriptor");
    let flags = cursor.read_u8()?;
    let flexible = flags & VP9_F_BIT_MASK != 0;

    if flags & VP9_I_BIT_MASK != 0 {
        let first = cursor.read_u8()?;
        if first & VP9_PICTURE_ID_M_BIT_MASK != 0 {
            cursor.skip(1)?;
        }
    }

    if flags & VP9_L_BIT_MASK != 0 {
        cursor.skip(1)?;
        if !flexible {
            // TL0PICIDX
            cursor.skip(1)?;
        }
    }

    if flexible && flags & VP9_P_BIT_MASK != 0 {
        let mut references = 0;
        loop {
            let p_diff = cursor.read_u8()?;
            references += 1;
            if references > VP9_MAX_REFERENCE_PICTURES {
                return Err(ParsingError::InvalidFieldValue {
                    field: "vp9_p_diff",
                    description: format!(
                        "more than {} reference indices",
                        VP9_MAX_REFERENCE_PICTURES
                    ),
                });
            }
            if p_diff & VP9_P_DIFF_N_BIT_MASK == 0 {
                break;
            }
        }
    }

    if flags & VP9_V_BIT_MASK != 0 {
        skip_vp9_scalability_structure(&mut cursor)?;
    }

    let body = cursor.take_rest();
    if body.is_empty() {
        return Err(ParsingError::NotEnoughData {
            needed: payload.len() + 1,
            got: payload.len(),
            context: "VP9 payload",
        });
    }
    Ok(Fragment {
        unit_start: Some(flags & VP9_B_BIT_MASK != 0),
        prefix: &[],
        body,
    })
}

fn skip_vp9_scalability_structure(cursor: &mut ByteCursor<'_>) -> Result<(), ParsingError> {
    let header = cursor.read_u8()?;
    let spatial_layers = usize::from(header >> 5) + 1;
    if header & VP9_SS_Y_BIT_MASK != 0 {
        cursor.skip(spatial_layers * VP9_SS_RESOLUTION_LENGTH)?;
    }
    if header & VP9_SS_G_BIT_MASK != 0 {
        let pictures = cursor.read_u8()?;
        for _ in 0..pictures {
            let picture = cursor.read_u8()?;
            let references = usize::from((picture >> 2) & 0x03);
            cursor.skip(references)?;
        }
    }
    Ok(())
}

fn parse_h263(payload: &[u8]) -> Result<Fragment<'_>, ParsingError> {
    let mut cursor = ByteCursor::new(payload, "H.263 payload header");
    let header = cursor.read_u16_be()?;
    let picture_start = header & H263_P_BIT_MASK != 0;
    if header & H263_V_BIT_MASK != 0 {
        cursor.skip(1)?;
    }
    let extra_header_length = usize::from((header & H263_PLEN_MASK) >> H263_PLEN_SHIFT);
    cursor.skip(extra_header_length)?;

    Ok(Fragment {
        unit_start: None,
        prefix: if picture_start {
            &H263_START_CODE_PREFIX
        } else {
            &[]
        },
        body: cursor.take_rest(),
    })
}
