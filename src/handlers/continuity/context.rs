//! Stream state for continuity-tracked formats.

use std::any::Any;
use std::collections::VecDeque;
use std::time::Instant;

use crate::accumulator::FragmentAccumulator;
use crate::packet_defs::{AccessUnit, PayloadFormat};
use crate::params::DepacketizerConfig;
use crate::traits::StreamState;
use crate::types::{PictureId, SequenceNumber, StreamId, Timestamp};

/// Coarse state of a continuity-tracked stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContinuityMode {
    /// Continuity was lost; everything is dropped until a key unit arrives.
    Desynced,
    /// In sync, no unit in progress.
    Idle,
    /// In sync, a unit is being accumulated.
    Assembling,
}

/// Reassembly state of one continuity-tracked stream.
///
/// `sequence_ok == false` implies the accumulator is closed and empty.
#[derive(Debug)]
pub struct ContinuityState {
    /// Identifier of the owning stream.
    pub stream_id: StreamId,
    /// Format the stream was negotiated with.
    pub format: PayloadFormat,
    /// Bytes of the unit in progress.
    pub accumulator: FragmentAccumulator,
    /// Timestamp of the unit in progress.
    pub unit_timestamp: Timestamp,
    /// Transport sequence number expected next.
    pub expected_sequence: SequenceNumber,
    /// Picture identifier of the last unit started, if it carried one.
    pub last_picture_id: Option<PictureId>,
    /// `false` while desynchronized.
    pub sequence_ok: bool,
    /// Set once a key unit has been seen; non-key units are untrusted before that.
    pub have_seen_key_unit: bool,
    /// Length of the mandatory first partition of the unit in progress.
    pub first_partition_size: usize,
    /// Loss was detected inside the unit in progress.
    pub unit_corrupt: bool,
    /// A unit since the last key unit was damaged; later units reference it.
    pub sequence_dirty: bool,
    /// Completed units not yet handed out, oldest first.
    pub pending: VecDeque<AccessUnit>,
    /// Largest tolerated sequence gap when salvaging without picture ids.
    pub salvage_sequence_gap: u16,
    /// Time of the last delivered packet.
    pub last_accessed: Instant,
}

impl ContinuityState {
    /// Creates state for a stream that has not yet seen any packet.
    pub fn new(
        stream_id: StreamId,
        format: PayloadFormat,
        config: &DepacketizerConfig,
        creation_time: Instant,
    ) -> Self {
        Self {
            stream_id,
            format,
            accumulator: FragmentAccumulator::new(config.max_unit_size),
            unit_timestamp: Timestamp::default(),
            expected_sequence: SequenceNumber::default(),
            last_picture_id: None,
            sequence_ok: true,
            have_seen_key_unit: false,
            first_partition_size: 0,
            unit_corrupt: false,
            sequence_dirty: false,
            pending: VecDeque::new(),
            salvage_sequence_gap: config.salvage_sequence_gap,
            last_accessed: creation_time,
        }
    }

    /// Current coarse state.
    pub fn mode(&self) -> ContinuityMode {
        if !self.sequence_ok {
            ContinuityMode::Desynced
        } else if self.accumulator.is_open() {
            ContinuityMode::Assembling
        } else {
            ContinuityMode::Idle
        }
    }

    /// Returns `true` if the unit in progress already holds its whole first partition.
    pub fn first_partition_complete(&self) -> bool {
        self.accumulator.is_open() && self.accumulator.len() >= self.first_partition_size
    }
}

impl StreamState for ContinuityState {
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
