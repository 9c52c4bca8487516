//! Interleave reconstruction handler (QCELP, RFC 2658).
//!
//! - `reconstruction`: Packet validation, slot storage and the drain schedule.
//! - `context`: `InterleaveState` with its bounded slot buffers.
//! - `handler`: `InterleaveHandler`, the `PayloadHandler` implementation.

pub mod constants;
pub mod context;
pub mod handler;
pub mod reconstruction;

pub use self::context::{InterleaveSlot, InterleaveState, StashedPacket};
pub use self::handler::InterleaveHandler;
pub use self::reconstruction::{InterleavedPacket, parse_interleaved};
