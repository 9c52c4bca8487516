//! Data model shared by every payload handler.
//!
//! Defines the packet handed to handlers ([`TransportPacket`]), the reconstructed
//! output ([`AccessUnit`]), the per-call outcome ([`Depacketized`]) and the set of
//! payload formats known to the default registry ([`PayloadFormat`]).

use std::fmt;

use bytes::Bytes;

use crate::constants::{
    RTP_CSRC_COUNT_MASK, RTP_EXTENSION_BIT_MASK, RTP_FIXED_HEADER_LENGTH, RTP_MARKER_BIT_MASK,
    RTP_PADDING_BIT_MASK, RTP_PAYLOAD_TYPE_MASK, RTP_VERSION,
};
use crate::cursor::ByteCursor;
use crate::error::ParsingError;
use crate::types::{SequenceNumber, Timestamp};

/// Payload formats with a built-in handler, named by their SDP encoding name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PayloadFormat {
    /// VP8 video (continuity-tracking reassembly).
    Vp8,
    /// VP9 video (descriptor-stripping concatenation).
    Vp9,
    /// DV video (plain concatenation).
    Dv,
    /// H.263 with the RFC 4629 payload header, 1998 variant.
    H263_1998,
    /// H.263 with the RFC 4629 payload header, 2000 variant.
    H263_2000,
    /// QCELP audio (interleaved reconstruction).
    Qcelp,
    /// AMR narrowband audio, octet-aligned.
    Amr,
    /// AMR wideband audio, octet-aligned.
    AmrWb,
    /// iLBC audio.
    Ilbc,
    /// A format provided by a handler outside this crate.
    Custom(&'static str),
}

impl PayloadFormat {
    /// Every built-in format, in registration order.
    pub const BUILT_IN: [PayloadFormat; 9] = [
        PayloadFormat::Vp8,
        PayloadFormat::Vp9,
        PayloadFormat::Dv,
        PayloadFormat::H263_1998,
        PayloadFormat::H263_2000,
        PayloadFormat::Qcelp,
        PayloadFormat::Amr,
        PayloadFormat::AmrWb,
        PayloadFormat::Ilbc,
    ];

    /// SDP encoding name of the format.
    pub fn name(self) -> &'static str {
        match self {
            PayloadFormat::Vp8 => "VP8",
            PayloadFormat::Vp9 => "VP9",
            PayloadFormat::Dv => "DV",
            PayloadFormat::H263_1998 => "H263-1998",
            PayloadFormat::H263_2000 => "H263-2000",
            PayloadFormat::Qcelp => "QCELP",
            PayloadFormat::Amr => "AMR",
            PayloadFormat::AmrWb => "AMR-WB",
            PayloadFormat::Ilbc => "iLBC",
            PayloadFormat::Custom(name) => name,
        }
    }

    /// Looks up a built-in format by encoding name, ignoring ASCII case.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::BUILT_IN
            .into_iter()
            .find(|format| format.name().eq_ignore_ascii_case(name))
    }
}

impl fmt::Display for PayloadFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One transport packet as seen by a payload handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransportPacket<'a> {
    /// Payload bytes following the transport header.
    pub payload: &'a [u8],
    /// Transport sequence number.
    pub sequence_number: SequenceNumber,
    /// Transport timestamp.
    pub timestamp: Timestamp,
    /// Marker flag: this packet completes the current access unit.
    pub marker: bool,
}

impl<'a> TransportPacket<'a> {
    /// Creates a packet view from already-parsed transport fields.
    pub fn new(
        payload: &'a [u8],
        sequence_number: impl Into<SequenceNumber>,
        timestamp: impl Into<Timestamp>,
        marker: bool,
    ) -> Self {
        Self {
            payload,
            sequence_number: sequence_number.into(),
            timestamp: timestamp.into(),
            marker,
        }
    }
}

/// A parsed RTP packet (RFC 3550 fixed header).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RtpPacket<'a> {
    /// Payload type number.
    pub payload_type: u8,
    /// Synchronization source identifier.
    pub ssrc: u32,
    /// Transport fields and payload handed to handlers.
    pub packet: TransportPacket<'a>,
}

impl<'a> RtpPacket<'a> {
    /// Parses the fixed header, CSRC list, header extension and padding of `datagram`.
    ///
    /// # Errors
    /// - [`ParsingError::NotEnoughData`] - Truncated header, CSRC list or extension
    /// - [`ParsingError::InvalidRtpVersion`] - Version field is not 2
    /// - [`ParsingError::InvalidFieldValue`] - Padding count larger than the packet
    pub fn parse(datagram: &'a [u8]) -> Result<Self, ParsingError> {
        let mut cursor = ByteCursor::new(datagram, "RTP header");
        let first = cursor.read_u8()?;
        let version = first >> 6;
        if version != RTP_VERSION {
            return Err(ParsingError::InvalidRtpVersion(version));
        }
        let second = cursor.read_u8()?;
        let sequence_number = cursor.read_u16_be()?;
        let timestamp = cursor.read_u32_be()?;
        let ssrc = cursor.read_u32_be()?;
        debug_assert_eq!(cursor.position(), RTP_FIXED_HEADER_LENGTH);

        let csrc_count = (first & RTP_CSRC_COUNT_MASK) as usize;
        cursor.skip(4 * csrc_count)?;

        if first & RTP_EXTENSION_BIT_MASK != 0 {
            let _profile_defined = cursor.read_u16_be()?;
            let extension_words = cursor.read_u16_be()? as usize;
            cursor.skip(4 * extension_words)?;
        }

        let mut payload = cursor.take_rest();
        if first & RTP_PADDING_BIT_MASK != 0 {
            let padding = datagram.last().copied().unwrap_or(0) as usize;
            if padding > payload.len() {
                return Err(ParsingError::InvalidFieldValue {
                    field: "rtp_padding",
                    description: format!(
                        "padding of {} bytes exceeds the {} byte payload",
                        padding,
                        payload.len()
                    ),
                });
            }
            payload = &payload[..payload.len() - padding];
        }

        Ok(Self {
            payload_type: second & RTP_PAYLOAD_TYPE_MASK,
            ssrc,
            packet: TransportPacket::new(
                payload,
                sequence_number,
                timestamp,
                second & RTP_MARKER_BIT_MASK != 0,
            ),
        })
    }
}

/// One reconstructed access unit, ready for the decoder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessUnit {
    /// Complete encoded unit.
    pub data: Bytes,
    /// Presentation timestamp in media clock units.
    pub timestamp: Timestamp,
    /// Set when loss was detected and the unit was salvaged rather than captured cleanly.
    pub corrupt: bool,
}

impl AccessUnit {
    /// Creates a cleanly captured unit.
    pub fn new(data: impl Into<Bytes>, timestamp: Timestamp) -> Self {
        Self {
            data: data.into(),
            timestamp,
            corrupt: false,
        }
    }

    /// Sets the corrupt flag.
    pub fn with_corrupt(mut self, corrupt: bool) -> Self {
        self.corrupt = corrupt;
        self
    }

    /// Length of the unit in bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if the unit carries no bytes.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Outcome of feeding one packet to a handler, or of polling it for pending output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Depacketized {
    /// Nothing to emit yet.
    NeedMoreInput,
    /// One access unit is complete.
    Ready(AccessUnit),
}

impl Depacketized {
    /// Converts into the contained unit, if any.
    pub fn into_unit(self) -> Option<AccessUnit> {
        match self {
            Depacketized::NeedMoreInput => None,
            Depacketized::Ready(unit) => Some(unit),
        }
    }

    /// Returns `true` for [`Depacketized::Ready`].
    pub fn is_ready(&self) -> bool {
        matches!(self, Depacketized::Ready(_))
    }
}
