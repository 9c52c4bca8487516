//! Core depacketization traits.
//!
//! A [`PayloadHandler`] implements the reassembly rules of one payload format.
//! Handlers are stateless and shared; everything a stream remembers between
//! packets lives in the [`StreamState`] the handler creates for it. The engine
//! only ever sees boxed trait objects, so new formats plug in without touching it.

use std::any::Any;
use std::fmt::Debug;
use std::time::Instant;

use crate::error::DepacketizeError;
use crate::packet_defs::{Depacketized, PayloadFormat, TransportPacket};
use crate::params::{DepacketizerConfig, FormatParameters};
use crate::types::StreamId;

/// Per-stream reassembly state owned by the engine.
pub trait StreamState: Send + Sync + Debug {
    /// Payload format this state was created for.
    fn format(&self) -> PayloadFormat;
    /// Identifier of the stream owning this state.
    fn stream_id(&self) -> StreamId;
    /// Provides a reference to the state as `&dyn Any` for downcasting.
    fn as_any(&self) -> &dyn Any;
    /// Provides a mutable reference to the state as `&mut dyn Any` for downcasting.
    fn as_any_mut(&mut self) -> &mut dyn Any;
    /// Returns the `Instant` when a packet was last delivered to this stream.
    fn last_accessed(&self) -> Instant;
    /// Sets the last accessed time of this state.
    fn set_last_accessed(&mut self, now: Instant);
}

/// Reassembly rules for one payload format.
pub trait PayloadHandler: Send + Sync + Debug {
    /// Payload format implemented by this handler.
    fn format(&self) -> PayloadFormat;

    /// Creates fresh state for a new stream.
    ///
    /// # Parameters
    /// - `stream_id`: Identifier of the new stream.
    /// - `config`: Engine-wide limits (unit size cap, salvage gap).
    /// - `creation_time`: Initial value for the state's `last_accessed` time.
    ///
    /// # Returns
    /// A `Box` containing the handler-specific `StreamState`.
    fn create_stream_state(
        &self,
        stream_id: StreamId,
        config: &DepacketizerConfig,
        creation_time: Instant,
    ) -> Box<dyn StreamState>;

    /// Applies negotiated format parameters to freshly created state.
    ///
    /// Unknown keys are ignored. The default accepts any parameters.
    ///
    /// # Errors
    /// - [`DepacketizeError::InvalidParameter`] - A known key carries an unusable value
    fn init_stream_state(
        &self,
        _state: &mut dyn StreamState,
        _parameters: &FormatParameters,
    ) -> Result<(), DepacketizeError> {
        Ok(())
    }

    /// Feeds one transport packet into the stream.
    ///
    /// # Returns
    /// [`Depacketized::Ready`] when an access unit is available, otherwise
    /// [`Depacketized::NeedMoreInput`].
    ///
    /// # Errors
    /// - [`DepacketizeError::Parsing`] - The payload is malformed; state is unchanged
    /// - [`DepacketizeError::UnitTooLarge`] - The in-progress unit outgrew its limit and was dropped
    /// - [`DepacketizeError::OutOfMemory`] - The in-progress unit was dropped
    /// - [`DepacketizeError::Internal`] - `state` belongs to another handler
    fn handle_packet(
        &self,
        state: &mut dyn StreamState,
        packet: &TransportPacket<'_>,
    ) -> Result<Depacketized, DepacketizeError>;

    /// Returns the next unit already buffered from earlier input, if any.
    ///
    /// Formats that emit at most one unit per packet keep the default.
    ///
    /// # Errors
    /// - [`DepacketizeError::Internal`] - `state` belongs to another handler
    fn next_pending(&self, _state: &mut dyn StreamState) -> Result<Depacketized, DepacketizeError> {
        Ok(Depacketized::NeedMoreInput)
    }
}

/// Downcasts `state` to the concrete type a handler expects.
///
/// # Errors
/// - [`DepacketizeError::Internal`] - `state` is of a different type
pub fn downcast_state_mut<'a, T: StreamState + 'static>(
    state: &'a mut dyn StreamState,
    handler: PayloadFormat,
) -> Result<&'a mut T, DepacketizeError> {
    let stream_id = state.stream_id();
    let state_format = state.format();
    state.as_any_mut().downcast_mut::<T>().ok_or_else(|| {
        DepacketizeError::Internal(format!(
            "{} handler received {} state of stream {}",
            handler, state_format, stream_id
        ))
    })
}
