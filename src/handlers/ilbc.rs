//! iLBC payloads (RFC 3952).
//!
//! Every packet carries a whole number of fixed-size blocks; the block size
//! follows from the negotiated `mode` parameter.

use std::any::Any;
use std::time::Instant;

use tracing::debug;

use crate::error::{DepacketizeError, ParsingError};
use crate::packet_defs::{AccessUnit, Depacketized, PayloadFormat, TransportPacket};
use crate::params::{DepacketizerConfig, FormatParameters};
use crate::traits::{PayloadHandler, StreamState, downcast_state_mut};
use crate::types::StreamId;

/// Format parameter selecting the frame duration.
pub const ILBC_MODE_PARAMETER: &str = "mode";
/// Block size in bytes for 20 ms frames.
pub const ILBC_20MS_BLOCK_SIZE: usize = 38;
/// Block size in bytes for 30 ms frames.
pub const ILBC_30MS_BLOCK_SIZE: usize = 50;

/// Per-stream block size.
#[derive(Debug)]
pub struct IlbcState {
    stream_id: StreamId,
    block_size: usize,
    last_accessed: Instant,
}

impl IlbcState {
    /// Size of one coded block for this stream.
    pub fn block_size(&self) -> usize {
        self.block_size
    }
}

impl StreamState for IlbcState {
    fn format(&self) -> PayloadFormat {
        PayloadFormat::Ilbc
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

/// iLBC handler; one access unit per packet.
#[derive(Debug, Clone, Copy, Default)]
pub struct IlbcHandler;

impl IlbcHandler {
    /// Creates the handler.
    pub fn new() -> Self {
        Self
    }
}

impl PayloadHandler for IlbcHandler {
    fn format(&self) -> PayloadFormat {
        PayloadFormat::Ilbc
    }

    fn create_stream_state(
        &self,
        stream_id: StreamId,
        _config: &DepacketizerConfig,
        creation_time: Instant,
    ) -> Box<dyn StreamState> {
        Box::new(IlbcState {
            stream_id,
            block_size: ILBC_30MS_BLOCK_SIZE,
            last_accessed: creation_time,
        })
    }

    fn init_stream_state(
        &self,
        state: &mut dyn StreamState,
        parameters: &FormatParameters,
    ) -> Result<(), DepacketizeError> {
        let state = downcast_state_mut::<IlbcState>(state, self.format())?;
        state.block_size = match parameters.get_u32(ILBC_MODE_PARAMETER)? {
            None | Some(30) => ILBC_30MS_BLOCK_SIZE,
            Some(20) => ILBC_20MS_BLOCK_SIZE,
            Some(other) => {
                return Err(DepacketizeError::InvalidParameter {
                    key: ILBC_MODE_PARAMETER.to_string(),
                    value: other.to_string(),
                    reason: "only 20 and 30 ms modes exist".to_string(),
                });
            }
        };
        debug!(stream = %state.stream_id, block_size = state.block_size, "iLBC mode selected");
        Ok(())
    }

    fn handle_packet(
        &self,
        state: &mut dyn StreamState,
        packet: &TransportPacket<'_>,
    ) -> Result<Depacketized, DepacketizeError> {
        let state = downcast_state_mut::<IlbcState>(state, self.format())?;
        let len = packet.payload.len();
        if len == 0 || len % state.block_size != 0 {
            return Err(ParsingError::InvalidFieldValue {
                field: "iLBC payload length",
                description: format!("{} is not a multiple of {}", len, state.block_size),
            }
            .into());
        }
        Ok(Depacketized::Ready(AccessUnit::new(
            packet.payload.to_vec(),
            packet.timestamp,
        )))
    }
}
