//! Common test utilities for depacketization integration tests.
//!
//! Packet builders for each payload format plus a minimal continuity-tracked
//! format with a two byte header, used to exercise the state machine without
//! VP8 framing noise.

#![allow(dead_code)] // Not every test binary uses every helper.

use std::sync::Arc;
use std::time::Instant;

use rtpdepack::handlers::ContinuityHandler;
use rtpdepack::handlers::continuity::{ContinuityFormat, ContinuityPacket, UnitStart};
use rtpdepack::handlers::interleave::constants::QCELP_FRAME_SIZES;
use rtpdepack::time::mock_clock::MockClock;
use rtpdepack::{
    AccessUnit, DepacketizerConfig, DepacketizerEngine, FormatParameters, HandlerRegistry,
    ParsingError, PayloadFormat, PictureId, PictureIdWidth, StreamId,
};

/// Stream id used by single-stream tests.
pub const TEST_STREAM: StreamId = StreamId::new(1);

/// Encoding name of [`TwoByteFormat`].
pub const TWO_BYTE_FORMAT_NAME: &str = "X-TWO-BYTE";

/// Continuation flag of the [`TwoByteFormat`] header.
pub const TWO_BYTE_CONTINUATION_FLAG: u8 = 0x80;

/// Continuity-tracked test format.
///
/// ```text
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |C| sequence low7 |   size hi8    |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// ```
///
/// `C = 0` starts a key unit whose first partition is `size hi8` bytes long;
/// the 7-bit sequence doubles as a short picture id on start packets.
#[derive(Debug, Clone, Copy, Default)]
pub struct TwoByteFormat;

impl ContinuityFormat for TwoByteFormat {
    fn format(&self) -> PayloadFormat {
        PayloadFormat::Custom(TWO_BYTE_FORMAT_NAME)
    }

    fn parse<'a>(&self, payload: &'a [u8]) -> Result<ContinuityPacket<'a>, ParsingError> {
        if payload.len() < 3 {
            return Err(ParsingError::NotEnoughData {
                needed: 3,
                got: payload.len(),
                context: "two byte header",
            });
        }
        let continuation = payload[0] & TWO_BYTE_CONTINUATION_FLAG != 0;
        let (unit_start, picture_id) = if continuation {
            (None, None)
        } else {
            (
                Some(UnitStart {
                    key_unit: true,
                    first_partition_size: usize::from(payload[1]),
                }),
                Some(PictureId::new(
                    u16::from(payload[0] & 0x7F),
                    PictureIdWidth::Short,
                )),
            )
        };
        Ok(ContinuityPacket {
            unit_start,
            picture_id,
            body: &payload[2..],
        })
    }
}

/// Builds a [`TwoByteFormat`] payload.
pub fn two_byte_packet(continuation: bool, sequence: u16, size: u8, body: &[u8]) -> Vec<u8> {
    let flag = if continuation {
        TWO_BYTE_CONTINUATION_FLAG
    } else {
        0
    };
    let mut payload = vec![flag | (sequence as u8 & 0x7F), size];
    payload.extend_from_slice(body);
    payload
}

/// Registry with every built-in handler plus the [`TwoByteFormat`] handler.
pub fn registry_with_test_formats() -> Arc<HandlerRegistry> {
    let mut registry = HandlerRegistry::with_default_handlers();
    registry
        .register(Box::new(ContinuityHandler::new(TwoByteFormat)))
        .unwrap();
    Arc::new(registry)
}

/// Creates an engine driven by a `MockClock`.
///
/// # Returns
/// The engine and the clock, which tests advance by hand.
pub fn create_test_engine(config: DepacketizerConfig) -> (DepacketizerEngine, Arc<MockClock>) {
    let clock = Arc::new(MockClock::new(Instant::now()));
    let engine = DepacketizerEngine::new(registry_with_test_formats(), config, clock.clone());
    (engine, clock)
}

/// Creates an engine with default configuration and one stream of `format`.
pub fn engine_with_stream(format: &str, fmtp: &str) -> DepacketizerEngine {
    let (mut engine, _) = create_test_engine(DepacketizerConfig::default());
    engine
        .init(TEST_STREAM, format, &FormatParameters::parse_fmtp(fmtp))
        .unwrap();
    engine
}

// --- VP8 ---

/// Header fields of one VP8 test packet.
#[derive(Debug, Clone, Copy, Default)]
pub struct Vp8Header {
    /// `Some((key_frame, first_partition_size))` for the first packet of a frame.
    pub start: Option<(bool, usize)>,
    /// Picture id written with the I bit, 7-bit if below 128.
    pub picture_id: Option<u16>,
}

impl Vp8Header {
    /// Header of the first packet of a key frame.
    pub fn key(first_partition_size: usize) -> Self {
        Self {
            start: Some((true, first_partition_size)),
            picture_id: None,
        }
    }

    /// Header of the first packet of an inter frame.
    pub fn inter(first_partition_size: usize) -> Self {
        Self {
            start: Some((false, first_partition_size)),
            picture_id: None,
        }
    }

    /// Header of a continuation packet.
    pub fn continuation() -> Self {
        Self::default()
    }

    /// Adds a picture id.
    pub fn with_picture_id(mut self, picture_id: u16) -> Self {
        self.picture_id = Some(picture_id);
        self
    }
}

/// Bytes a VP8 frame starts with: the 3-byte frame tag.
pub fn vp8_frame_tag(key_frame: bool, first_partition_size: usize) -> [u8; 3] {
    let size = first_partition_size - 3;
    let inter_bit = if key_frame { 0x00 } else { 0x01 };
    [
        (((size & 0x7) as u8) << 5) | inter_bit,
        ((size >> 3) & 0xFF) as u8,
        ((size >> 11) & 0xFF) as u8,
    ]
}

/// Builds a VP8 payload; start packets get a frame tag in front of `data`.
pub fn vp8_packet(header: Vp8Header, data: &[u8]) -> Vec<u8> {
    let mut required = 0u8;
    if header.start.is_some() {
        required |= 0x10;
    }
    let mut payload = Vec::new();
    match header.picture_id {
        Some(id) => {
            payload.push(required | 0x80);
            payload.push(0x80);
            if id < 0x80 {
                payload.push(id as u8);
            } else {
                payload.extend_from_slice(&(0x8000 | id).to_be_bytes());
            }
        }
        None => payload.push(required),
    }
    if let Some((key_frame, first_partition_size)) = header.start {
        payload.extend_from_slice(&vp8_frame_tag(key_frame, first_partition_size));
    }
    payload.extend_from_slice(data);
    payload
}

/// Unit bytes expected from a frame whose packets carried `chunks`.
pub fn vp8_unit(key_frame: bool, first_partition_size: usize, chunks: &[&[u8]]) -> Vec<u8> {
    let mut unit = vp8_frame_tag(key_frame, first_partition_size).to_vec();
    for chunk in chunks {
        unit.extend_from_slice(chunk);
    }
    unit
}

// --- QCELP ---

/// A QCELP frame of `rate` whose body bytes are all `fill`.
pub fn qcelp_frame(rate: u8, fill: u8) -> Vec<u8> {
    let mut frame = vec![fill; QCELP_FRAME_SIZES[usize::from(rate)]];
    frame[0] = rate;
    frame
}

/// An interleaved QCELP payload.
pub fn qcelp_packet(group_size: u8, index: u8, frames: &[Vec<u8>]) -> Vec<u8> {
    let mut payload = vec![(group_size << 3) | index];
    for frame in frames {
        payload.extend_from_slice(frame);
    }
    payload
}

// --- RTP ---

/// Wraps `payload` in a minimal RTP header (payload type 96).
pub fn rtp_datagram(sequence_number: u16, timestamp: u32, marker: bool, payload: &[u8]) -> Vec<u8> {
    let mut datagram = vec![0x80, if marker { 0x80 | 96 } else { 96 }];
    datagram.extend_from_slice(&sequence_number.to_be_bytes());
    datagram.extend_from_slice(&timestamp.to_be_bytes());
    datagram.extend_from_slice(&0x1234_5678u32.to_be_bytes());
    datagram.extend_from_slice(payload);
    datagram
}

/// Concatenated data of several units.
pub fn concat_units(units: &[AccessUnit]) -> Vec<u8> {
    units.iter().flat_map(|unit| unit.data.iter().copied()).collect()
}
