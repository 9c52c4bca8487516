//! `rtpdepack`: Reassembly of codec access units from real-time transport payloads.
//!
//! Packets arrive small, possibly lost and one payload format per stream. This
//! library buffers their fragments, detects loss, salvages what is still usable
//! and hands out complete access units. The primary entry point is the
//! [`DepacketizerEngine`].
//!
//! ## Core Concepts
//!
//! - **[`DepacketizerEngine`]**: Owns every stream's state and dispatches packets.
//! - **Handlers**: One [`PayloadHandler`] per payload format, looked up by encoding
//!   name in a shared [`HandlerRegistry`].
//! - **Stream state**: Everything a stream remembers between packets, created by its
//!   handler as a boxed [`StreamState`].
//!
//! ## Quick Start
//!
//! ```rust
//! use rtpdepack::{DepacketizerEngine, FormatParameters, StreamId};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut engine = DepacketizerEngine::default();
//!     let stream = StreamId::new(1);
//!     engine.init(stream, "DV", &FormatParameters::new())?;
//!
//!     assert!(engine.deliver(stream, b"first ", 100u16, 9000u32, false)?.is_empty());
//!     let units = engine.deliver(stream, b"second", 101u16, 9000u32, true)?;
//!
//!     assert_eq!(&units[0].data[..], b"first second");
//!     assert!(!units[0].corrupt);
//!     Ok(())
//! }
//! ```
//!
//! ## Supported Formats
//!
//! - **VP8**: Continuity tracking with first-partition salvage
//! - **VP9, DV, H263-1998, H263-2000**: Marker-terminated concatenation
//! - **QCELP**: Interleave reconstruction with erasures
//! - **AMR, AMR-WB, iLBC**: One unit per packet
//!
//! Additional formats plug in by registering a custom [`PayloadHandler`].

pub mod accumulator;
pub mod constants;
pub mod cursor;
pub mod encodings;
pub mod engine;
pub mod error;
pub mod handlers;
pub mod packet_defs;
pub mod params;
pub mod registry;
pub mod stream_manager;
pub mod time;
pub mod traits;
pub mod types;

pub use accumulator::FragmentAccumulator;
pub use cursor::ByteCursor;
pub use engine::DepacketizerEngine;
pub use error::{DepacketizeError, ParsingError};
pub use packet_defs::{AccessUnit, Depacketized, PayloadFormat, RtpPacket, TransportPacket};
pub use params::{DepacketizerConfig, FormatParameters};
pub use registry::HandlerRegistry;
pub use traits::{PayloadHandler, StreamState};
pub use types::{PictureId, PictureIdWidth, SequenceNumber, StreamId, Timestamp};
pub use time::mock_clock::MockClock;

#[cfg(test)]
mod tidy;
