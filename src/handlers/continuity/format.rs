//! Format seam of the continuity-tracking handler.
//!
//! The state machine is format-agnostic. A [`ContinuityFormat`] reduces each
//! payload to the three facts it needs: does the packet start a unit (and if
//! so is it a key unit and how large is its mandatory first partition), which
//! picture it belongs to, and which bytes belong to the unit.

use std::fmt::Debug;

use crate::error::ParsingError;
use crate::packet_defs::PayloadFormat;
use crate::types::PictureId;

/// Header facts of a packet that opens a new access unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnitStart {
    /// The unit can be decoded without any earlier unit.
    pub key_unit: bool,
    /// Byte length of the unit's mandatory leading partition.
    pub first_partition_size: usize,
}

/// One payload reduced to what the continuity state machine consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContinuityPacket<'a> {
    /// Present if this packet starts a new unit.
    pub unit_start: Option<UnitStart>,
    /// Explicit picture identifier, when the sender includes one.
    pub picture_id: Option<PictureId>,
    /// Unit bytes carried by the packet, payload header removed.
    pub body: &'a [u8],
}

/// Payload header parser for a continuity-tracked format.
pub trait ContinuityFormat: Send + Sync + Debug + 'static {
    /// Format implemented by this parser.
    fn format(&self) -> PayloadFormat;

    /// Parses the payload header of one packet.
    ///
    /// # Errors
    /// - [`ParsingError`] - The header is truncated or inconsistent
    fn parse<'a>(&self, payload: &'a [u8]) -> Result<ContinuityPacket<'a>, ParsingError>;
}
