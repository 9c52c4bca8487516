//! Storage for per-stream reassembly state.
//!
//! The `StreamManager` owns one boxed [`StreamState`] per stream identifier. It
//! knows nothing about payload formats; creating and driving states is the job
//! of the engine and the registered handlers.

use std::collections::HashMap;

use crate::error::DepacketizeError;
use crate::traits::StreamState;
use crate::types::StreamId;

/// Per-stream state indexed by [`StreamId`].
#[derive(Debug, Default)]
pub struct StreamManager {
    streams: HashMap<StreamId, Box<dyn StreamState>>,
}

impl StreamManager {
    /// Creates an empty manager.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `state` under `stream_id`, replacing any previous state.
    ///
    /// # Returns
    /// The replaced state, if one existed.
    pub fn add_stream(
        &mut self,
        stream_id: StreamId,
        state: Box<dyn StreamState>,
    ) -> Option<Box<dyn StreamState>> {
        self.streams.insert(stream_id, state)
    }

    /// Returns `true` if a stream with this identifier exists.
    pub fn contains(&self, stream_id: StreamId) -> bool {
        self.streams.contains_key(&stream_id)
    }

    /// Retrieves the state of a stream.
    ///
    /// # Errors
    /// - [`DepacketizeError::UnknownStream`] - No stream exists for `stream_id`
    pub fn get_stream(&self, stream_id: StreamId) -> Result<&dyn StreamState, DepacketizeError> {
        self.streams
            .get(&stream_id)
            .map(|state| {
                let state: &dyn StreamState = &**state;
                state
            })
            .ok_or(DepacketizeError::UnknownStream(stream_id))
    }

    /// Retrieves the state of a stream for mutation.
    ///
    /// # Errors
    /// - [`DepacketizeError::UnknownStream`] - No stream exists for `stream_id`
    pub fn get_stream_mut(
        &mut self,
        stream_id: StreamId,
    ) -> Result<&mut Box<dyn StreamState>, DepacketizeError> {
        self.streams
            .get_mut(&stream_id)
            .ok_or(DepacketizeError::UnknownStream(stream_id))
    }

    /// Removes a stream, returning its state if it existed.
    pub fn remove_stream(&mut self, stream_id: StreamId) -> Option<Box<dyn StreamState>> {
        self.streams.remove(&stream_id)
    }

    /// Drops every stream.
    pub fn clear(&mut self) {
        self.streams.clear();
    }

    /// Number of live streams.
    pub fn stream_count(&self) -> usize {
        self.streams.len()
    }

    /// Iterates over all live streams in unspecified order.
    pub fn streams_iter(&self) -> impl Iterator<Item = (&StreamId, &Box<dyn StreamState>)> {
        self.streams.iter()
    }
}
