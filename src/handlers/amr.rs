//! AMR and AMR-WB octet-aligned payloads (RFC 4867, Sec 4.4).
//!
//! A packet holds a codec mode request octet, one table-of-contents octet per
//! frame and then the speech data of every frame. Each packet becomes one
//! access unit in storage layout: every frame is preceded by its TOC octet with
//! the F and Q bits cleared.

use std::any::Any;
use std::time::Instant;

use bytes::BytesMut;
use tracing::warn;

use crate::error::{DepacketizeError, ParsingError};
use crate::packet_defs::{AccessUnit, Depacketized, PayloadFormat, TransportPacket};
use crate::params::{DepacketizerConfig, FormatParameters};
use crate::traits::{PayloadHandler, StreamState, downcast_state_mut};
use crate::types::StreamId;

/// Follow bit (F) of a TOC octet: another TOC octet follows.
pub const AMR_TOC_FOLLOW_BIT_MASK: u8 = 0b1000_0000;
/// Frame type (FT) and quality (Q) kept in storage layout.
pub const AMR_TOC_STORAGE_MASK: u8 = 0b0111_1100;
/// Shift of the frame type within a TOC octet.
pub const AMR_TOC_FRAME_TYPE_SHIFT: u8 = 3;
/// Mask of the frame type after shifting.
pub const AMR_TOC_FRAME_TYPE_MASK: u8 = 0b0000_1111;

/// Speech bytes per frame type, narrowband.
pub const AMR_NB_FRAME_SIZES: [usize; 16] =
    [12, 13, 15, 17, 19, 20, 26, 31, 5, 0, 0, 0, 0, 0, 0, 0];
/// Speech bytes per frame type, wideband.
pub const AMR_WB_FRAME_SIZES: [usize; 16] =
    [17, 23, 32, 36, 40, 46, 50, 58, 60, 5, 5, 0, 0, 0, 0, 0];

/// Per-stream state: AMR payloads carry everything per packet.
#[derive(Debug)]
pub struct AmrState {
    stream_id: StreamId,
    format: PayloadFormat,
    last_accessed: Instant,
}

impl StreamState for AmrState {
    fn format(&self) -> PayloadFormat {
        self.format
    }

    fn stream_id(&self) -> StreamId {
        self.stream_id
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn last_accessed(&self) -> Instant {
        self.last_accessed
    }

    fn set_last_accessed(&mut self, now: Instant) {
        self.last_accessed = now;
    }
}

/// AMR / AMR-WB handler.
#[derive(Debug, Clone, Copy)]
pub struct AmrHandler {
    format: PayloadFormat,
    frame_sizes: &'static [usize; 16],
}

impl AmrHandler {
    /// Narrowband AMR.
    pub fn narrowband() -> Self {
        Self {
            format: PayloadFormat::Amr,
            frame_sizes: &AMR_NB_FRAME_SIZES,
        }
    }

    /// Wideband AMR.
    pub fn wideband() -> Self {
        Self {
            format: PayloadFormat::AmrWb,
            frame_sizes: &AMR_WB_FRAME_SIZES,
        }
    }
}

fn unsupported(key: &str, value: &str, reason: &str) -> DepacketizeError {
    DepacketizeError::InvalidParameter {
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

impl PayloadHandler for AmrHandler {
    fn format(&self) -> PayloadFormat {
        self.format
    }

    fn create_stream_state(
        &self,
        stream_id: StreamId,
        _config: &DepacketizerConfig,
        creation_time: Instant,
    ) -> Box<dyn StreamState> {
        Box::new(AmrState {
            stream_id,
            format: self.format,
            last_accessed: creation_time,
        })
    }

    fn init_stream_state(
        &self,
        _state: &mut dyn StreamState,
        parameters: &FormatParameters,
    ) -> Result<(), DepacketizeError> {
        if parameters.get_flag("octet-align")? != Some(true) {
            return Err(unsupported(
                "octet-align",
                parameters.get("octet-align").unwrap_or(""),
                "only the octet-aligned mode is supported",
            ));
        }
        if parameters.get_flag("crc")? == Some(true) {
            return Err(unsupported("crc", "1", "frame CRCs are not supported"));
        }
        if let Some(interleaving) = parameters.get_u32("interleaving")? {
            if interleaving != 0 {
                return Err(unsupported(
                    "interleaving",
                    &interleaving.to_string(),
                    "interleaved AMR is not supported",
                ));
            }
        }
        if let Some(channels) = parameters.get_u32("channels")? {
            if channels != 1 {
                return Err(unsupported(
                    "channels",
                    &channels.to_string(),
                    "only mono is supported",
                ));
            }
        }
        Ok(())
    }

    fn handle_packet(
        &self,
        state: &mut dyn StreamState,
        packet: &TransportPacket<'_>,
    ) -> Result<Depacketized, DepacketizeError> {
        let state = downcast_state_mut::<AmrState>(state, self.format)?;
        let buf = packet.payload;

        let mut frames = 1;
        while frames < buf.len() && buf[frames] & AMR_TOC_FOLLOW_BIT_MASK != 0 {
            frames += 1;
        }
        if 1 + frames >= buf.len() {
            return Err(ParsingError::NotEnoughData {
                needed: 2 + frames,
                got: buf.len(),
                context: "AMR speech data",
            }
            .into());
        }

        let tocs = &buf[1..=frames];
        let mut speech = &buf[1 + frames..];
        let mut unit = BytesMut::with_capacity(buf.len() - 1);
        let mut truncated = false;
        for &toc in tocs {
            let frame_type =
                usize::from((toc >> AMR_TOC_FRAME_TYPE_SHIFT) & AMR_TOC_FRAME_TYPE_MASK);
            let size = self.frame_sizes[frame_type];
            if size > speech.len() {
                warn!(
                    stream = %state.stream_id,
                    seq = %packet.sequence_number,
                    "too little speech data in packet"
                );
                truncated = true;
                break;
            }
            unit.extend_from_slice(&[toc & AMR_TOC_STORAGE_MASK]);
            unit.extend_from_slice(&speech[..size]);
            speech = &speech[size..];
        }
        if !truncated && !speech.is_empty() {
            warn!(
                stream = %state.stream_id,
                seq = %packet.sequence_number,
                surplus = speech.len(),
                "too much speech data in packet"
            );
        }

        Ok(Depacketized::Ready(
            AccessUnit::new(unit.freeze(), packet.timestamp).with_corrupt(truncated),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(handler: &AmrHandler) -> Box<dyn StreamState> {
        handler.create_stream_state(StreamId::new(1), &DepacketizerConfig::default(), Instant::now())
    }

    fn handle(handler: &AmrHandler, payload: &[u8]) -> Result<AccessUnit, DepacketizeError> {
        let mut state = state(handler);
        handler
            .handle_packet(state.as_mut(), &TransportPacket::new(payload, 1u16, 160u32, true))
            .map(|r| r.into_unit().unwrap())
    }

    #[test]
    fn two_frames_are_converted_to_storage_layout() {
        let handler = AmrHandler::narrowband();
        // CMR, TOC(F=1, FT=7 (31 bytes), Q=1), TOC(F=0, FT=8 (SID, 5 bytes), Q=1).
        let mut payload = vec![0xF0, 0x80 | (7 << 3) | 0x04, (8 << 3) | 0x04];
        payload.extend_from_slice(&[0xAA; 31]);
        payload.extend_from_slice(&[0xBB; 5]);
        let unit = handle(&handler, &payload).unwrap();
        assert_eq!(unit.len(), 1 + 31 + 1 + 5);
        assert_eq!(unit.data[0], (7 << 3) | 0x04);
        assert_eq!(unit.data[32], (8 << 3) | 0x04);
        assert!(!unit.corrupt);
    }

    #[test]
    fn short_speech_data_truncates_and_marks_corrupt() {
        let handler = AmrHandler::wideband();
        let mut payload = vec![0xF0, 0x80, 0x00];
        payload.extend_from_slice(&[0x11; 17 + 3]);
        let unit = handle(&handler, &payload).unwrap();
        assert_eq!(unit.len(), 1 + 17);
        assert!(unit.corrupt);
    }

    #[test]
    fn surplus_speech_data_is_dropped() {
        let handler = AmrHandler::narrowband();
        let mut payload = vec![0xF0, 8 << 3];
        payload.extend_from_slice(&[0x22; 9]);
        let unit = handle(&handler, &payload).unwrap();
        assert_eq!(unit.len(), 1 + 5);
        assert!(!unit.corrupt);
    }

    #[test]
    fn packet_without_speech_is_invalid() {
        let handler = AmrHandler::narrowband();
        assert!(handle(&handler, &[0xF0]).unwrap_err().is_invalid_data());
        assert!(handle(&handler, &[0xF0, 0x80, 0x80]).unwrap_err().is_invalid_data());
        assert!(handle(&handler, &[0xF0, 0x3C]).unwrap_err().is_invalid_data());
    }

    #[test]
    fn parameters_must_describe_octet_aligned_mono() {
        let handler = AmrHandler::narrowband();
        let mut state = state(&handler);
        let ok = FormatParameters::parse_fmtp("octet-align; mode-set=0,2,5,7");
        handler.init_stream_state(state.as_mut(), &ok).unwrap();

        for fmtp in [
            "",
            "octet-align=0",
            "octet-align=1; crc=1",
            "octet-align=1; interleaving=4",
            "octet-align=1; channels=2",
        ] {
            let params = FormatParameters::parse_fmtp(fmtp);
            assert!(
                matches!(
                    handler.init_stream_state(state.as_mut(), &params),
                    Err(DepacketizeError::InvalidParameter { .. })
                ),
                "accepted {:?}",
                fmtp
            );
        }
    }
}
