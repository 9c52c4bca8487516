//! Payload format handlers.
//!
//! - `continuity`: Partitioned video with loss salvage (VP8).
//! - `concat`: Marker-terminated concatenation (DV, VP9, H.263+).
//! - `interleave`: Interleaved audio reconstruction (QCELP).
//! - `amr`, `ilbc`: Audio formats producing one unit per packet.

pub mod amr;
pub mod concat;
pub mod continuity;
pub mod ilbc;
pub mod interleave;

pub use self::amr::AmrHandler;
pub use self::concat::ConcatHandler;
pub use self::continuity::{ContinuityHandler, Vp8Format};
pub use self::ilbc::IlbcHandler;
pub use self::interleave::InterleaveHandler;
