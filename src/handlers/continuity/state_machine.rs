//! Continuity-tracking state machine.
//!
//! Every packet is classified as a unit start (key or non-key) or a
//! continuation and checked against the expected transport sequence number,
//! the unit timestamp and, when present, the picture identifier. Loss that
//! leaves the first partition of a unit intact is tolerated: the unit is still
//! emitted, flagged corrupt, and every later unit stays flagged until the next
//! key unit since it references a damaged picture. Any other loss
//! desynchronizes the stream until the next key unit.

use tracing::{debug, trace, warn};

use super::context::ContinuityState;
use super::format::{ContinuityPacket, UnitStart};

use crate::encodings::{is_next_picture, is_within_gap};
use crate::error::DepacketizeError;
use crate::packet_defs::{AccessUnit, Depacketized, TransportPacket};

/// What the start-of-unit checks decided.
enum StartOutcome {
    /// The packet was dropped.
    Dropped,
    /// A new unit was opened, possibly after salvaging the previous one.
    Started { salvaged: Option<AccessUnit> },
}

/// Runs one parsed packet through the state machine.
///
/// # Errors
/// - [`DepacketizeError::UnitTooLarge`] - The unit outgrew the size limit; it was dropped
/// - [`DepacketizeError::OutOfMemory`] - The unit could not grow; it was dropped
pub(super) fn process_packet(
    state: &mut ContinuityState,
    parsed: &ContinuityPacket<'_>,
    packet: &TransportPacket<'_>,
) -> Result<Depacketized, DepacketizeError> {
    let salvaged = match parsed.unit_start {
        Some(start) => match start_unit(state, &start, parsed, packet)? {
            StartOutcome::Dropped => return Ok(Depacketized::NeedMoreInput),
            StartOutcome::Started { salvaged } => salvaged,
        },
        None => {
            if !continue_unit(state, packet) {
                return Ok(Depacketized::NeedMoreInput);
            }
            None
        }
    };

    state.expected_sequence = packet.sequence_number.next();
    if let Err(e) = state.accumulator.append(parsed.body) {
        warn!(stream = %state.stream_id, error = %e, "dropping unit in progress");
        state.accumulator.discard();
        state.unit_corrupt = false;
        state.sequence_ok = false;
        state.pending.extend(salvaged);
        return Err(e);
    }

    let completed = if packet.marker {
        let data = state.accumulator.close()?;
        let corrupt = state.unit_corrupt || state.sequence_dirty;
        let unit = AccessUnit::new(data, state.unit_timestamp).with_corrupt(corrupt);
        state.unit_corrupt = false;
        Some(unit)
    } else {
        None
    };

    state.pending.extend(salvaged);
    state.pending.extend(completed);
    Ok(take_pending(state))
}

/// Hands out the oldest unit held back by [`process_packet`].
pub(super) fn take_pending(state: &mut ContinuityState) -> Depacketized {
    match state.pending.pop_front() {
        Some(unit) => Depacketized::Ready(unit),
        None => Depacketized::NeedMoreInput,
    }
}

fn start_unit(
    state: &mut ContinuityState,
    start: &UnitStart,
    parsed: &ContinuityPacket<'_>,
    packet: &TransportPacket<'_>,
) -> Result<StartOutcome, DepacketizeError> {
    if start.key_unit {
        if state.accumulator.is_open() {
            debug!(
                stream = %state.stream_id,
                bytes = state.accumulator.len(),
                "key unit replaces unterminated unit"
            );
            state.accumulator.discard();
        }
        state.sequence_ok = true;
        state.have_seen_key_unit = true;
        state.sequence_dirty = false;
        open_unit(state, start, parsed, packet, false)?;
        return Ok(StartOutcome::Started { salvaged: None });
    }

    if !state.sequence_ok {
        trace!(stream = %state.stream_id, seq = %packet.sequence_number, "desynced, dropping non-key unit");
        return Ok(StartOutcome::Dropped);
    }
    if !state.have_seen_key_unit {
        break_sequence(state, packet, "key unit missing");
        return Ok(StartOutcome::Dropped);
    }

    let salvageable = state.first_partition_complete();
    let mut new_unit_corrupt = false;
    match (parsed.picture_id, state.last_picture_id) {
        (Some(received), Some(previous)) => {
            if !is_next_picture(received, previous) {
                if !salvageable {
                    break_sequence(state, packet, "missed a picture");
                    return Ok(StartOutcome::Dropped);
                }
                new_unit_corrupt = true;
            } else if state.accumulator.is_open() && !salvageable {
                break_sequence(state, packet, "missed first partition of previous picture");
                return Ok(StartOutcome::Dropped);
            }
        }
        _ => {
            if state.accumulator.is_open() {
                let gap_ok = is_within_gap(
                    packet.sequence_number,
                    state.expected_sequence,
                    state.salvage_sequence_gap,
                );
                if !(gap_ok && salvageable) {
                    break_sequence(state, packet, "missed too much");
                    return Ok(StartOutcome::Dropped);
                }
            } else if packet.sequence_number != state.expected_sequence {
                break_sequence(state, packet, "missed unknown data");
                return Ok(StartOutcome::Dropped);
            }
        }
    }

    let salvaged = if state.accumulator.is_open() {
        debug!(
            stream = %state.stream_id,
            timestamp = %state.unit_timestamp,
            bytes = state.accumulator.len(),
            "salvaging unit without end marker"
        );
        let data = state.accumulator.close()?;
        state.sequence_dirty = true;
        Some(AccessUnit::new(data, state.unit_timestamp).with_corrupt(true))
    } else {
        None
    };
    if new_unit_corrupt {
        state.sequence_dirty = true;
    }

    open_unit(state, start, parsed, packet, new_unit_corrupt)?;
    Ok(StartOutcome::Started { salvaged })
}

fn open_unit(
    state: &mut ContinuityState,
    start: &UnitStart,
    parsed: &ContinuityPacket<'_>,
    packet: &TransportPacket<'_>,
    corrupt: bool,
) -> Result<(), DepacketizeError> {
    state.accumulator.open()?;
    state.unit_timestamp = packet.timestamp;
    state.first_partition_size = start.first_partition_size;
    state.unit_corrupt = corrupt;
    state.last_picture_id = parsed.picture_id;
    Ok(())
}

/// Checks a continuation packet. Returns `false` if it must be dropped.
fn continue_unit(state: &mut ContinuityState, packet: &TransportPacket<'_>) -> bool {
    if !state.sequence_ok {
        return false;
    }
    if !state.accumulator.is_open() || packet.timestamp != state.unit_timestamp {
        break_sequence(state, packet, "received no start marker");
        return false;
    }
    if packet.sequence_number != state.expected_sequence {
        if !state.first_partition_complete() {
            break_sequence(state, packet, "missed part of the first partition");
            return false;
        }
        debug!(
            stream = %state.stream_id,
            seq = %packet.sequence_number,
            expected = %state.expected_sequence,
            "lost a later partition, unit will be flagged corrupt"
        );
        state.unit_corrupt = true;
        state.sequence_dirty = true;
    }
    true
}

fn break_sequence(state: &mut ContinuityState, packet: &TransportPacket<'_>, reason: &'static str) {
    warn!(
        stream = %state.stream_id,
        seq = %packet.sequence_number,
        timestamp = %packet.timestamp,
        reason,
        "sequence broken, waiting for key unit"
    );
    state.sequence_ok = false;
    state.accumulator.discard();
    state.unit_corrupt = false;
}
