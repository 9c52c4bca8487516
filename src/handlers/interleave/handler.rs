//! `PayloadHandler` implementation for QCELP interleaved audio.

use std::time::Instant;

use tracing::debug;

use super::constants::QCELP_MAX_INTERLEAVE_LENGTH;
use super::context::InterleaveState;
use super::reconstruction::{drain_stored_frame, store_packet};

use crate::error::DepacketizeError;
use crate::packet_defs::{Depacketized, PayloadFormat, TransportPacket};
use crate::params::{DepacketizerConfig, FormatParameters};
use crate::traits::{PayloadHandler, StreamState, downcast_state_mut};
use crate::types::StreamId;

/// Format parameter carrying the negotiated interleave length.
pub const INTERLEAVING_PARAMETER: &str = "interleaving";

/// QCELP handler (RFC 2658).
#[derive(Debug, Clone, Copy, Default)]
pub struct InterleaveHandler;

impl InterleaveHandler {
    /// Creates the handler.
    pub fn new() -> Self {
        Self
    }
}

impl PayloadHandler for InterleaveHandler {
    fn format(&self) -> PayloadFormat {
        PayloadFormat::Qcelp
    }

    fn create_stream_state(
        &self,
        stream_id: StreamId,
        _config: &DepacketizerConfig,
        creation_time: Instant,
    ) -> Box<dyn StreamState> {
        Box::new(InterleaveState::new(stream_id, creation_time))
    }

    fn init_stream_state(
        &self,
        state: &mut dyn StreamState,
        parameters: &FormatParameters,
    ) -> Result<(), DepacketizeError> {
        let state = downcast_state_mut::<InterleaveState>(state, self.format())?;
        if let Some(length) = parameters.get_u32(INTERLEAVING_PARAMETER)? {
            if length > u32::from(QCELP_MAX_INTERLEAVE_LENGTH) {
                return Err(DepacketizeError::InvalidParameter {
                    key: INTERLEAVING_PARAMETER.to_string(),
                    value: length.to_string(),
                    reason: format!("must be between 0 and {}", QCELP_MAX_INTERLEAVE_LENGTH),
                });
            }
            state.group_size = length as u8;
            debug!(stream = %state.stream_id, interleaving = length, "interleave length negotiated");
        }
        Ok(())
    }

    fn handle_packet(
        &self,
        state: &mut dyn StreamState,
        packet: &TransportPacket<'_>,
    ) -> Result<Depacketized, DepacketizeError> {
        let state = downcast_state_mut::<InterleaveState>(state, self.format())?;
        store_packet(state, packet.payload, packet.timestamp)
    }

    fn next_pending(&self, state: &mut dyn StreamState) -> Result<Depacketized, DepacketizeError> {
        let state = downcast_state_mut::<InterleaveState>(state, self.format())?;
        if !state.draining {
            return Ok(Depacketized::NeedMoreInput);
        }
        drain_stored_frame(state)
    }
}
