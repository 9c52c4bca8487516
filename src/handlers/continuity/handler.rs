//! `PayloadHandler` implementation for continuity-tracked formats.

use std::time::Instant;

use super::context::ContinuityState;
use super::format::ContinuityFormat;
use super::state_machine;
use super::vp8::Vp8Format;

use crate::error::DepacketizeError;
use crate::packet_defs::{Depacketized, PayloadFormat, TransportPacket};
use crate::params::DepacketizerConfig;
use crate::traits::{PayloadHandler, StreamState, downcast_state_mut};
use crate::types::StreamId;

/// Continuity-tracking handler, generic over the payload header format.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContinuityHandler<F: ContinuityFormat> {
    format: F,
}

impl<F: ContinuityFormat> ContinuityHandler<F> {
    /// Creates a handler parsing packets with `format`.
    pub fn new(format: F) -> Self {
        Self { format }
    }
}

impl ContinuityHandler<Vp8Format> {
    /// VP8 video.
    pub fn vp8() -> Self {
        Self::new(Vp8Format)
    }
}

impl<F: ContinuityFormat> PayloadHandler for ContinuityHandler<F> {
    fn format(&self) -> PayloadFormat {
        self.format.format()
    }

    fn create_stream_state(
        &self,
        stream_id: StreamId,
        config: &DepacketizerConfig,
        creation_time: Instant,
    ) -> Box<dyn StreamState> {
        Box::new(ContinuityState::new(
            stream_id,
            self.format.format(),
            config,
            creation_time,
        ))
    }

    fn handle_packet(
        &self,
        state: &mut dyn StreamState,
        packet: &TransportPacket<'_>,
    ) -> Result<Depacketized, DepacketizeError> {
        let state = downcast_state_mut::<ContinuityState>(state, self.format.format())?;
        let parsed = self.format.parse(packet.payload)?;
        state_machine::process_packet(state, &parsed, packet)
    }

    fn next_pending(&self, state: &mut dyn StreamState) -> Result<Depacketized, DepacketizeError> {
        let state = downcast_state_mut::<ContinuityState>(state, self.format.format())?;
        Ok(state_machine::take_pending(state))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::continuity::context::ContinuityMode;

    fn vp8_key_start(first_partition_size: usize, extra: &[u8]) -> Vec<u8> {
        let size = first_partition_size - 3;
        let mut payload = vec![
            0x10,
            ((size & 0x7) as u8) << 5,
            ((size >> 3) & 0xFF) as u8,
            ((size >> 11) & 0xFF) as u8,
        ];
        payload.extend_from_slice(extra);
        payload
    }

    #[test]
    fn vp8_packets_are_reassembled() {
        let handler = ContinuityHandler::vp8();
        let mut state = handler.create_stream_state(
            StreamId::new(1),
            &DepacketizerConfig::default(),
            Instant::now(),
        );

        let first = vp8_key_start(3, b"abc");
        let r = handler
            .handle_packet(state.as_mut(), &TransportPacket::new(&first, 100u16, 9000u32, false))
            .unwrap();
        assert_eq!(r, Depacketized::NeedMoreInput);

        let second = [0x00, b'x', b'y'];
        let unit = handler
            .handle_packet(state.as_mut(), &TransportPacket::new(&second, 101u16, 9000u32, true))
            .unwrap()
            .into_unit()
            .unwrap();
        assert_eq!(&unit.data[..], &[&first[1..], &b"xy"[..]].concat()[..]);
        assert!(!unit.corrupt);
    }

    #[test]
    fn malformed_packet_does_not_touch_state() {
        let handler = ContinuityHandler::vp8();
        let mut state = handler.create_stream_state(
            StreamId::new(1),
            &DepacketizerConfig::default(),
            Instant::now(),
        );
        let first = vp8_key_start(3, b"");
        handler
            .handle_packet(state.as_mut(), &TransportPacket::new(&first, 1u16, 0u32, false))
            .unwrap();

        let err = handler
            .handle_packet(state.as_mut(), &TransportPacket::new(&[0x80], 2u16, 0u32, true))
            .unwrap_err();
        assert!(err.is_invalid_data());

        let continuity = state.as_any().downcast_ref::<ContinuityState>().unwrap();
        assert_eq!(continuity.mode(), ContinuityMode::Assembling);
        assert_eq!(continuity.expected_sequence, 2);
        assert_eq!(continuity.accumulator.len(), 3);
    }

    #[test]
    fn next_pending_is_empty_on_fresh_state() {
        let handler = ContinuityHandler::vp8();
        let mut state = handler.create_stream_state(
            StreamId::new(1),
            &DepacketizerConfig::default(),
            Instant::now(),
        );
        assert_eq!(
            handler.next_pending(state.as_mut()).unwrap(),
            Depacketized::NeedMoreInput
        );
    }
}
