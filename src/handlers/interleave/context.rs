//! Stream state for interleaved formats.

use std::any::Any;
use std::time::Instant;

use super::constants::{QCELP_MAX_SLOTS, QCELP_SLOT_CAPACITY};

use crate::packet_defs::PayloadFormat;
use crate::traits::StreamState;
use crate::types::{StreamId, Timestamp};

/// Frames carried forward from one packet of the current interleave group.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InterleaveSlot {
    data: Vec<u8>,
    position: usize,
}

impl InterleaveSlot {
    /// Replaces the slot content with `frames`, at most `QCELP_SLOT_CAPACITY` bytes.
    pub fn fill(&mut self, frames: &[u8]) {
        debug_assert!(frames.len() <= QCELP_SLOT_CAPACITY);
        self.data.clear();
        self.data.extend_from_slice(frames);
        self.position = 0;
    }

    /// Forgets everything stored in the slot.
    pub fn clear(&mut self) {
        self.data.clear();
        self.position = 0;
    }

    /// Bytes not yet handed out.
    pub fn remaining(&self) -> &[u8] {
        &self.data[self.position..]
    }

    /// Returns `true` once every stored byte has been handed out.
    pub fn is_exhausted(&self) -> bool {
        self.position >= self.data.len()
    }

    /// Marks `len` bytes as handed out.
    pub fn consume(&mut self, len: usize) {
        self.position = (self.position + len).min(self.data.len());
    }

    /// Number of bytes stored, consumed or not.
    pub fn stored_len(&self) -> usize {
        self.data.len()
    }
}

/// A packet of the next group held back while the previous group drains.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StashedPacket {
    /// Complete payload, header octet included.
    pub payload: Vec<u8>,
    /// Transport timestamp of the packet.
    pub timestamp: Timestamp,
}

/// Reassembly state of one interleaved stream.
///
/// At most `group_size + 1` slots hold data; each slot holds at most
/// `QCELP_SLOT_CAPACITY` bytes.
#[derive(Debug)]
pub struct InterleaveState {
    /// Identifier of the owning stream.
    pub stream_id: StreamId,
    /// Interleave length `L` of the current group (`L + 1` slots).
    pub group_size: u8,
    /// Slot expected next, or being drained.
    pub slot_index: u8,
    /// Carried-forward frames, one slot per interleave index.
    pub slots: [InterleaveSlot; QCELP_MAX_SLOTS],
    /// No slot of the current group has frames left.
    pub group_finished: bool,
    /// Stored frames are ready to be handed out.
    pub draining: bool,
    /// Number of complete drain rounds over the slots in this group.
    pub drain_pass: u32,
    /// Timestamp of the first frame of the current group.
    pub group_base: Timestamp,
    /// First packet of the next group, received before the current one drained.
    pub stash: Option<StashedPacket>,
    /// Time of the last delivered packet.
    pub last_accessed: Instant,
}

impl InterleaveState {
    /// Creates state for a stream with no packets yet.
    pub fn new(stream_id: StreamId, creation_time: Instant) -> Self {
        Self {
            stream_id,
            group_size: 0,
            slot_index: 0,
            slots: Default::default(),
            group_finished: true,
            draining: false,
            drain_pass: 0,
            group_base: Timestamp::default(),
            stash: None,
            last_accessed: creation_time,
        }
    }

    /// Clears every slot from `from` up to and including `to`.
    pub fn clear_slots(&mut self, from: u8, to: u8) {
        for slot in self
            .slots
            .iter_mut()
            .take(usize::from(to) + 1)
            .skip(usize::from(from))
        {
            slot.clear();
        }
    }

    /// Number of slots currently holding data.
    pub fn live_slots(&self) -> usize {
        self.slots.iter().filter(|slot| slot.stored_len() > 0).count()
    }

    /// Returns `true` if no slot of the current group has frames left.
    pub fn all_slots_exhausted(&self) -> bool {
        self.slots
            .iter()
            .take(usize::from(self.group_size) + 1)
            .all(InterleaveSlot::is_exhausted)
    }
}

impl StreamState for InterleaveState {
    fn format(&self) -> PayloadFormat {
        PayloadFormat::Qcelp
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
