//! `PayloadHandler` implementation for concatenation-reassembled formats.
//!
//! Fragments are appended in delivery order until the marker flag closes the
//! unit. A timestamp change while a unit is open means its end marker was lost:
//! the partial unit is dropped before the new one is opened.

use std::time::Instant;

use tracing::{debug, trace};

use super::context::ConcatState;
use super::framing::{ConcatFraming, Fragment};

use crate::error::DepacketizeError;
use crate::packet_defs::{AccessUnit, Depacketized, PayloadFormat, TransportPacket};
use crate::params::DepacketizerConfig;
use crate::traits::{PayloadHandler, StreamState, downcast_state_mut};
use crate::types::StreamId;

/// Handler for formats whose units are plain concatenations of packet payloads.
#[derive(Debug, Clone, Copy)]
pub struct ConcatHandler {
    format: PayloadFormat,
    framing: ConcatFraming,
}

impl ConcatHandler {
    /// Creates a handler for `format` whose packets carry `framing` headers.
    pub fn new(format: PayloadFormat, framing: ConcatFraming) -> Self {
        Self { format, framing }
    }

    /// DV video: no payload header.
    pub fn dv() -> Self {
        Self::new(PayloadFormat::Dv, ConcatFraming::Plain)
    }

    /// VP9 video.
    pub fn vp9() -> Self {
        Self::new(PayloadFormat::Vp9, ConcatFraming::Vp9)
    }

    /// H.263 (1998 revision) with the RFC 4629 payload header.
    pub fn h263_1998() -> Self {
        Self::new(PayloadFormat::H263_1998, ConcatFraming::H263)
    }

    /// H.263 (2000 revision) with the RFC 4629 payload header.
    pub fn h263_2000() -> Self {
        Self::new(PayloadFormat::H263_2000, ConcatFraming::H263)
    }

    /// Framing parsed by this handler.
    pub fn framing(&self) -> ConcatFraming {
        self.framing
    }
}

impl PayloadHandler for ConcatHandler {
    fn format(&self) -> PayloadFormat {
        self.format
    }

    fn create_stream_state(
        &self,
        stream_id: StreamId,
        config: &DepacketizerConfig,
        creation_time: Instant,
    ) -> Box<dyn StreamState> {
        Box::new(ConcatState::new(
            stream_id,
            self.format,
            config.max_unit_size,
            creation_time,
        ))
    }

    fn handle_packet(
        &self,
        state: &mut dyn StreamState,
        packet: &TransportPacket<'_>,
    ) -> Result<Depacketized, DepacketizeError> {
        let state = downcast_state_mut::<ConcatState>(state, self.format)?;
        let fragment = self.framing.parse(packet.payload)?;

        if state.accumulator.is_open() {
            if packet.timestamp != state.unit_timestamp {
                discard_unterminated(state, "timestamp changed without end marker");
            } else if fragment.unit_start == Some(true) {
                discard_unterminated(state, "new unit started without end marker");
            }
        }

        if !state.accumulator.is_open() {
            if self.framing.requires_start_flag() && fragment.unit_start != Some(true) {
                trace!(
                    stream = %state.stream_id,
                    seq = %packet.sequence_number,
                    "no unit in progress, dropping continuation fragment"
                );
                return Ok(Depacketized::NeedMoreInput);
            }
            state.accumulator.open()?;
            state.unit_timestamp = packet.timestamp;
        }

        if let Err(e) = append_fragment(state, &fragment) {
            debug!(stream = %state.stream_id, error = %e, "dropping unit in progress");
            state.accumulator.discard();
            state.discarded_units += 1;
            return Err(e);
        }
        state.last_sequence_number = Some(packet.sequence_number);

        if !packet.marker {
            return Ok(Depacketized::NeedMoreInput);
        }
        let data = state.accumulator.close()?;
        Ok(Depacketized::Ready(AccessUnit::new(
            data,
            state.unit_timestamp,
        )))
    }
}

fn append_fragment(state: &mut ConcatState, fragment: &Fragment<'_>) -> Result<(), DepacketizeError> {
    if !fragment.prefix.is_empty() {
        state.accumulator.append(fragment.prefix)?;
    }
    state.accumulator.append(fragment.body)
}

fn discard_unterminated(state: &mut ConcatState, reason: &'static str) {
    debug!(
        stream = %state.stream_id,
        timestamp = %state.unit_timestamp,
        bytes = state.accumulator.len(),
        reason,
        "discarding unterminated unit"
    );
    state.accumulator.discard();
    state.discarded_units += 1;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Timestamp;

    fn new_state(handler: &ConcatHandler, max_unit_size: usize) -> Box<dyn StreamState> {
        let config = DepacketizerConfig {
            max_unit_size,
            ..Default::default()
        };
        handler.create_stream_state(StreamId::new(1), &config, Instant::now())
    }

    fn concat_state(state: &mut Box<dyn StreamState>) -> &mut ConcatState {
        state.as_any_mut().downcast_mut::<ConcatState>().unwrap()
    }

    #[test]
    fn fragments_concatenate_until_marker() {
        let handler = ConcatHandler::dv();
        let mut state = new_state(&handler, 1024);

        let r1 = handler
            .handle_packet(state.as_mut(), &TransportPacket::new(b"AB", 1u16, 90u32, false))
            .unwrap();
        assert_eq!(r1, Depacketized::NeedMoreInput);
        let r2 = handler
            .handle_packet(state.as_mut(), &TransportPacket::new(b"CD", 2u16, 90u32, true))
            .unwrap();
        let unit = r2.into_unit().unwrap();
        assert_eq!(&unit.data[..], b"ABCD");
        assert_eq!(unit.timestamp, Timestamp::new(90));
        assert!(!unit.corrupt);
        assert!(!concat_state(&mut state).accumulator.is_open());
    }

    #[test]
    fn timestamp_change_discards_unterminated_unit() {
        let handler = ConcatHandler::dv();
        let mut state = new_state(&handler, 1024);

        handler
            .handle_packet(state.as_mut(), &TransportPacket::new(b"old", 1u16, 100u32, false))
            .unwrap();
        let unit = handler
            .handle_packet(state.as_mut(), &TransportPacket::new(b"new", 2u16, 200u32, true))
            .unwrap()
            .into_unit()
            .unwrap();
        assert_eq!(&unit.data[..], b"new");
        assert_eq!(unit.timestamp, Timestamp::new(200));
        assert_eq!(concat_state(&mut state).discarded_units, 1);
    }

    #[test]
    fn vp9_continuation_without_start_is_dropped() {
        let handler = ConcatHandler::vp9();
        let mut state = new_state(&handler, 1024);

        let result = handler
            .handle_packet(state.as_mut(), &TransportPacket::new(&[0x00, 0x11], 1u16, 5u32, true))
            .unwrap();
        assert_eq!(result, Depacketized::NeedMoreInput);

        handler
            .handle_packet(state.as_mut(), &TransportPacket::new(&[0x08, 0x22], 2u16, 5u32, false))
            .unwrap();
        let unit = handler
            .handle_packet(state.as_mut(), &TransportPacket::new(&[0x04, 0x33], 3u16, 5u32, true))
            .unwrap()
            .into_unit()
            .unwrap();
        assert_eq!(&unit.data[..], &[0x22, 0x33]);
    }

    #[test]
    fn vp9_start_flag_restarts_unterminated_unit() {
        let handler = ConcatHandler::vp9();
        let mut state = new_state(&handler, 1024);

        handler
            .handle_packet(state.as_mut(), &TransportPacket::new(&[0x08, 0x01], 1u16, 7u32, false))
            .unwrap();
        let unit = handler
            .handle_packet(state.as_mut(), &TransportPacket::new(&[0x0C, 0x02], 2u16, 7u32, true))
            .unwrap()
            .into_unit()
            .unwrap();
        assert_eq!(&unit.data[..], &[0x02]);
    }

    #[test]
    fn h263_picture_start_restores_zero_bytes() {
        let handler = ConcatHandler::h263_1998();
        let mut state = new_state(&handler, 1024);
        let unit = handler
            .handle_packet(
                state.as_mut(),
                &TransportPacket::new(&[0x04, 0x00, 0x80, 0x02], 1u16, 0u32, true),
            )
            .unwrap()
            .into_unit()
            .unwrap();
        assert_eq!(&unit.data[..], &[0x00, 0x00, 0x80, 0x02]);
    }

    #[test]
    fn malformed_header_leaves_unit_in_progress_intact() {
        let handler = ConcatHandler::h263_2000();
        let mut state = new_state(&handler, 1024);
        handler
            .handle_packet(state.as_mut(), &TransportPacket::new(&[0x00, 0x00, 0xAA], 1u16, 0u32, false))
            .unwrap();
        let err = handler
            .handle_packet(state.as_mut(), &TransportPacket::new(&[0x00], 2u16, 0u32, true))
            .unwrap_err();
        assert!(err.is_invalid_data());
        assert_eq!(concat_state(&mut state).accumulator.len(), 1);

        let unit = handler
            .handle_packet(state.as_mut(), &TransportPacket::new(&[0x00, 0x00, 0xBB], 3u16, 0u32, true))
            .unwrap()
            .into_unit()
            .unwrap();
        assert_eq!(&unit.data[..], &[0xAA, 0xBB]);
    }

    #[test]
    fn oversized_unit_is_dropped_and_reported() {
        let handler = ConcatHandler::dv();
        let mut state = new_state(&handler, 4);
        handler
            .handle_packet(state.as_mut(), &TransportPacket::new(b"abc", 1u16, 0u32, false))
            .unwrap();
        let err = handler
            .handle_packet(state.as_mut(), &TransportPacket::new(b"de", 2u16, 0u32, false))
            .unwrap_err();
        assert_eq!(
            err,
            DepacketizeError::UnitTooLarge { size: 5, limit: 4 }
        );
        let concat = concat_state(&mut state);
        assert!(!concat.accumulator.is_open());
        assert!(concat.accumulator.is_empty());
    }
}
