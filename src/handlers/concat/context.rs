//! Stream state for concatenation-reassembled formats.

use std::any::Any;
use std::time::Instant;

use crate::accumulator::FragmentAccumulator;
use crate::packet_defs::PayloadFormat;
use crate::traits::StreamState;
use crate::types::{SequenceNumber, StreamId, Timestamp};

/// Reassembly state of one concatenation stream.
#[derive(Debug)]
pub struct ConcatState {
    /// Identifier of the owning stream.
    pub stream_id: StreamId,
    /// Format the stream was negotiated with.
    pub format: PayloadFormat,
    /// Bytes of the unit in progress.
    pub accumulator: FragmentAccumulator,
    /// Timestamp shared by every fragment of the unit in progress.
    pub unit_timestamp: Timestamp,
    /// Sequence number of the last accepted packet.
    pub last_sequence_number: Option<SequenceNumber>,
    /// Units dropped because their end marker never arrived.
    pub discarded_units: u64,
    /// Time of the last delivered packet.
    pub last_accessed: Instant,
}

impl ConcatState {
    /// Creates an idle state whose units may not exceed `max_unit_size` bytes.
    pub fn new(
        stream_id: StreamId,
        format: PayloadFormat,
        max_unit_size: usize,
        creation_time: Instant,
    ) -> Self {
        Self {
            stream_id,
            format,
            accumulator: FragmentAccumulator::new(max_unit_size),
            unit_timestamp: Timestamp::default(),
            last_sequence_number: None,
            discarded_units: 0,
            last_accessed: creation_time,
        }
    }
}

impl StreamState for ConcatState {
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
