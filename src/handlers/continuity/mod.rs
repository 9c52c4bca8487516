//! Continuity-tracking handler.
//!
//! Reassembles formats that split a frame into a mandatory first partition
//! followed by dependent partitions, and that may carry an explicit picture
//! identifier. Loss is detected from transport sequence numbers, timestamps and
//! picture identifiers; partially received units are salvaged when their first
//! partition is complete.
//!
//! - `format`: `ContinuityFormat`, the seam between header parsing and the state machine.
//! - `vp8`: `Vp8Format`, the VP8 payload descriptor.
//! - `context`: `ContinuityState` and its coarse `ContinuityMode`.
//! - `state_machine`: Start/continuation classification, salvage and desync rules.
//! - `handler`: `ContinuityHandler`, the `PayloadHandler` implementation.

pub mod constants;
pub mod context;
pub mod format;
pub mod handler;
mod state_machine;
pub mod vp8;

pub use self::context::{ContinuityMode, ContinuityState};
pub use self::format::{ContinuityFormat, ContinuityPacket, UnitStart};
pub use self::handler::ContinuityHandler;
pub use self::vp8::Vp8Format;
