//! Interleaved frame reconstruction.
//!
//! A sender with interleave length `L` spreads consecutive frames round-robin
//! over a group of `L + 1` packets: the packet with index `N` carries frames
//! `N`, `N + (L + 1)`, `N + 2(L + 1)`, and so on. The first frame of each packet
//! is emitted as soon as the packet arrives; the rest is kept in the packet's
//! slot and handed out, one frame per call, once the last packet of the group
//! has been seen. Lost packets surface as erasure frames.

use bytes::Bytes;
use tracing::{debug, warn};

use super::constants::*;
use super::context::{InterleaveState, StashedPacket};

use crate::cursor::ByteCursor;
use crate::error::{DepacketizeError, ParsingError};
use crate::packet_defs::{AccessUnit, Depacketized};
use crate::types::Timestamp;

/// One validated interleaved packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InterleavedPacket<'a> {
    /// Interleave length `L`.
    pub group_size: u8,
    /// Interleave index `N`, at most `L`.
    pub index: u8,
    /// First frame, emitted immediately.
    pub first_frame: &'a [u8],
    /// Remaining frames, kept for later drain rounds.
    pub remainder: &'a [u8],
}

/// Parses and validates an interleaved payload.
///
/// # Errors
/// - [`ParsingError::NotEnoughData`] - The payload is shorter than its header or first frame
/// - [`ParsingError::InvalidFieldValue`] - Interleave fields, rate octet or frame count are out of range
pub fn parse_interleaved(payload: &[u8]) -> Result<InterleavedPacket<'_>, ParsingError> {
    let mut cursor = ByteCursor::new(payload, "QCELP payload header");
    if payload.len() < QCELP_MIN_PAYLOAD_LENGTH {
        return Err(ParsingError::NotEnoughData {
            needed: QCELP_MIN_PAYLOAD_LENGTH,
            got: payload.len(),
            context: "QCELP payload header",
        });
    }
    let header = cursor.read_u8()?;
    let group_size = (header >> QCELP_INTERLEAVE_LENGTH_SHIFT) & QCELP_INTERLEAVE_LENGTH_MASK;
    let index = header & QCELP_INTERLEAVE_INDEX_MASK;
    if group_size > QCELP_MAX_INTERLEAVE_LENGTH {
        return Err(ParsingError::InvalidFieldValue {
            field: "qcelp_interleave_length",
            description: format!(
                "{} exceeds the maximum of {}",
                group_size, QCELP_MAX_INTERLEAVE_LENGTH
            ),
        });
    }
    if index > group_size {
        return Err(ParsingError::InvalidFieldValue {
            field: "qcelp_interleave_index",
            description: format!("{} exceeds the interleave length {}", index, group_size),
        });
    }

    let frame_size = frame_size(cursor.peek_u8()?)?;
    let first_frame = cursor.read_bytes(frame_size)?;
    let remainder = cursor.take_rest();
    if remainder.len() > QCELP_SLOT_CAPACITY {
        return Err(ParsingError::InvalidFieldValue {
            field: "qcelp_frame_count",
            description: format!(
                "{} trailing bytes exceed the {} bytes of {} frames",
                remainder.len(),
                QCELP_SLOT_CAPACITY,
                QCELP_MAX_FRAMES_PER_PACKET - 1
            ),
        });
    }

    Ok(InterleavedPacket {
        group_size,
        index,
        first_frame,
        remainder,
    })
}

fn frame_size(rate: u8) -> Result<usize, ParsingError> {
    QCELP_FRAME_SIZES
        .get(usize::from(rate))
        .copied()
        .ok_or_else(|| ParsingError::InvalidFieldValue {
            field: "qcelp_rate",
            description: format!("rate octet {} is not a known frame rate", rate),
        })
}

/// Length of the frame at the start of `stored`, if it is well formed.
fn stored_frame_length(stored: &[u8]) -> Result<usize, ParsingError> {
    let mut cursor = ByteCursor::new(stored, "stored QCELP frame");
    let len = frame_size(cursor.peek_u8()?)?;
    cursor.read_bytes(len)?;
    Ok(len)
}

/// Feeds one packet into the interleave state.
///
/// # Returns
/// The packet's first frame, or, if the packet opens a new group before the
/// previous one was drained, the next stored frame of the previous group.
///
/// # Errors
/// - [`DepacketizeError::Parsing`] - The packet is malformed; state is unchanged
pub fn store_packet(
    state: &mut InterleaveState,
    payload: &[u8],
    timestamp: Timestamp,
) -> Result<Depacketized, DepacketizeError> {
    let packet = parse_interleaved(payload)?;

    if packet.group_size != state.group_size {
        if state.live_slots() > 0 {
            warn!(
                stream = %state.stream_id,
                from = state.group_size,
                to = packet.group_size,
                "interleave length changed, dropping stored frames"
            );
        }
        state.group_size = packet.group_size;
        state.slot_index = 0;
        state.clear_slots(0, QCELP_MAX_INTERLEAVE_LENGTH);
        state.stash = None;
        state.draining = false;
    }

    if packet.index < state.slot_index {
        if state.group_finished {
            state.slot_index = 0;
        } else {
            debug!(
                stream = %state.stream_id,
                missing_from = state.slot_index,
                "group ended early, draining before next group"
            );
            state.clear_slots(state.slot_index, state.group_size);
            state.stash = Some(StashedPacket {
                payload: payload.to_vec(),
                timestamp,
            });
            state.slot_index = 0;
            return drain_stored_frame(state);
        }
    }
    if packet.index > state.slot_index {
        debug!(
            stream = %state.stream_id,
            expected = state.slot_index,
            received = packet.index,
            "missed interleaved packets"
        );
        state.clear_slots(state.slot_index, packet.index - 1);
    }

    let index = packet.index;
    state.slots[usize::from(index)].fill(packet.remainder);
    state.group_finished = packet.remainder.is_empty();
    state.group_base = Timestamp::new(
        timestamp
            .value()
            .wrapping_sub(u32::from(index) * QCELP_FRAME_DURATION),
    );
    state.drain_pass = 0;
    if index == state.group_size {
        state.slot_index = 0;
        state.draining = !state.group_finished;
    } else {
        state.slot_index = index + 1;
        state.draining = false;
    }

    Ok(Depacketized::Ready(AccessUnit::new(
        Bytes::copy_from_slice(packet.first_frame),
        timestamp,
    )))
}

/// Hands out the next stored frame, an erasure for a lost one, or the first
/// frame of a stashed packet once the previous group is exhausted.
///
/// # Errors
/// - [`DepacketizeError::Parsing`] - A stashed packet turned out to be malformed
pub fn drain_stored_frame(state: &mut InterleaveState) -> Result<Depacketized, DepacketizeError> {
    if state.group_finished && state.slot_index == 0 {
        state.draining = false;
        return match state.stash.take() {
            Some(stashed) => store_packet(state, &stashed.payload, stashed.timestamp),
            None => Ok(Depacketized::NeedMoreInput),
        };
    }

    let index = state.slot_index;
    let frame_number =
        (state.drain_pass + 1) * (u32::from(state.group_size) + 1) + u32::from(index);
    let timestamp = state
        .group_base
        .wrapping_add(frame_number.wrapping_mul(QCELP_FRAME_DURATION));

    let stream_id = state.stream_id;
    let slot = &mut state.slots[usize::from(index)];
    let unit = if slot.is_exhausted() {
        erasure(timestamp)
    } else {
        match stored_frame_length(slot.remaining()) {
            Ok(len) => {
                let frame = Bytes::copy_from_slice(&slot.remaining()[..len]);
                slot.consume(len);
                AccessUnit::new(frame, timestamp)
            }
            Err(e) => {
                debug!(stream = %stream_id, slot = index, error = %e, "malformed stored frame");
                slot.clear();
                erasure(timestamp)
            }
        }
    };

    state.group_finished = state.all_slots_exhausted();
    if index == state.group_size {
        state.slot_index = 0;
        state.drain_pass += 1;
        state.draining = !state.group_finished || state.stash.is_some();
    } else {
        state.slot_index = index + 1;
        state.draining = true;
    }
    Ok(Depacketized::Ready(unit))
}

fn erasure(timestamp: Timestamp) -> AccessUnit {
    AccessUnit::new(Bytes::from_static(&QCELP_ERASURE_FRAME), timestamp).with_corrupt(true)
}
