//! Generic concatenation handler.
//!
//! Used by every format whose access units are simply the concatenation of
//! packet payloads, terminated by the transport marker. The only per-format
//! difference is the payload header stripped from each packet (see
//! [`ConcatFraming`]).
//!
//! - `framing`: Payload header parsers (plain, VP9 descriptor, RFC 4629 H.263).
//! - `context`: `ConcatState`, the per-stream accumulator and unit timestamp.
//! - `handler`: `ConcatHandler`, the `PayloadHandler` implementation.

pub mod constants;
pub mod context;
pub mod framing;
pub mod handler;

pub use self::context::ConcatState;
pub use self::framing::{ConcatFraming, Fragment};
pub use self::handler::ConcatHandler;
