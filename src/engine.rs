//! The depacketization engine.
//!
//! This module provides the `DepacketizerEngine`, the single entry point used by
//! transport and session code. It owns the state of every active stream, routes
//! each delivered packet to the handler registered for the stream's format and
//! collects every access unit that packet made available.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::DepacketizeError;
use crate::packet_defs::{AccessUnit, Depacketized, RtpPacket, TransportPacket};
use crate::params::{DepacketizerConfig, FormatParameters};
use crate::registry::HandlerRegistry;
use crate::stream_manager::StreamManager;
use crate::time::{Clock, SystemClock};
use crate::types::{SequenceNumber, StreamId, Timestamp};

/// The main depacketization engine.
///
/// ## Usage
///
/// 1. Build a [`HandlerRegistry`] (usually [`HandlerRegistry::with_default_handlers`])
/// 2. Create an engine with [`DepacketizerEngine::new`]
/// 3. Call [`init`] once per negotiated stream
/// 4. Feed packets through [`deliver`] or [`deliver_rtp`]
/// 5. Periodically call [`prune_stale_streams`] to drop abandoned streams
///
/// [`init`]: Self::init
/// [`deliver`]: Self::deliver
/// [`deliver_rtp`]: Self::deliver_rtp
/// [`prune_stale_streams`]: Self::prune_stale_streams
#[derive(Debug)]
pub struct DepacketizerEngine {
    /// Handlers shared with other engines, looked up by the stream's format.
    registry: Arc<HandlerRegistry>,
    /// State of every initialized stream.
    streams: StreamManager,
    /// Limits handed to handlers when stream state is created.
    config: DepacketizerConfig,
    /// Time source for idle tracking only; loss detection never reads it.
    clock: Arc<dyn Clock>,
}

impl DepacketizerEngine {
    /// Creates an engine with no streams.
    ///
    /// # Parameters
    /// - `registry`: Handlers available to `init`.
    /// - `config`: Unit size cap, salvage gap and idle timeout.
    /// - `clock`: Clock used to stamp and prune streams.
    pub fn new(
        registry: Arc<HandlerRegistry>,
        config: DepacketizerConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        DepacketizerEngine {
            registry,
            streams: StreamManager::new(),
            config,
            clock,
        }
    }

    /// Establishes state for a newly negotiated stream.
    ///
    /// The stream only exists once its handler accepted `parameters`.
    ///
    /// # Errors
    /// - [`DepacketizeError::StreamExists`] - `stream_id` is already initialized
    /// - [`DepacketizeError::UnsupportedFormat`] - No handler is registered for `format_name`
    /// - [`DepacketizeError::InvalidParameter`] - The handler rejected a format parameter
    pub fn init(
        &mut self,
        stream_id: StreamId,
        format_name: &str,
        parameters: &FormatParameters,
    ) -> Result<(), DepacketizeError> {
        if self.streams.contains(stream_id) {
            return Err(DepacketizeError::StreamExists(stream_id));
        }
        let handler = self
            .registry
            .get(format_name)
            .ok_or_else(|| DepacketizeError::UnsupportedFormat(format_name.to_string()))?;

        let mut state = handler.create_stream_state(stream_id, &self.config, self.clock.now());
        handler.init_stream_state(state.as_mut(), parameters)?;
        debug!(stream = %stream_id, format = %handler.format(), "stream initialized");
        self.streams.add_stream(stream_id, state);
        Ok(())
    }

    /// Feeds one transport payload into a stream.
    ///
    /// # Returns
    /// Every access unit made available by this packet, oldest first. Empty when
    /// the stream needs more input.
    ///
    /// # Errors
    /// - [`DepacketizeError::UnknownStream`] - `stream_id` was never initialized
    /// - [`DepacketizeError::Parsing`] - The payload is malformed; the stream is unaffected
    /// - [`DepacketizeError::UnitTooLarge`] - The in-progress unit outgrew its limit and was dropped
    /// - [`DepacketizeError::OutOfMemory`] - The in-progress unit could not grow and was dropped
    ///
    /// Units that completed before a stream-level error stay buffered and come
    /// out first on the next successful delivery.
    pub fn deliver(
        &mut self,
        stream_id: StreamId,
        payload: &[u8],
        sequence_number: impl Into<SequenceNumber>,
        timestamp: impl Into<Timestamp>,
        marker: bool,
    ) -> Result<Vec<AccessUnit>, DepacketizeError> {
        let packet = TransportPacket::new(payload, sequence_number, timestamp, marker);
        self.deliver_packet(stream_id, &packet)
    }

    /// Parses a complete RTP datagram and delivers its payload.
    ///
    /// # Errors
    /// - [`DepacketizeError::Parsing`] - The RTP header is malformed
    /// - Everything [`deliver`](Self::deliver) can return
    pub fn deliver_rtp(
        &mut self,
        stream_id: StreamId,
        datagram: &[u8],
    ) -> Result<Vec<AccessUnit>, DepacketizeError> {
        let rtp = RtpPacket::parse(datagram)?;
        self.deliver_packet(stream_id, &rtp.packet)
    }

    /// Delivers an already framed transport packet.
    ///
    /// # Errors
    /// Same as [`deliver`](Self::deliver).
    pub fn deliver_packet(
        &mut self,
        stream_id: StreamId,
        packet: &TransportPacket<'_>,
    ) -> Result<Vec<AccessUnit>, DepacketizeError> {
        let state = self.streams.get_stream_mut(stream_id)?;
        let format = state.format();
        let handler = self.registry.handler_for(format).ok_or_else(|| {
            DepacketizeError::Internal(format!(
                "Stream {} ({}) exists, but no handler registered.",
                stream_id, format
            ))
        })?;

        let mut units = Vec::new();
        match handler.handle_packet(state.as_mut(), packet) {
            Ok(Depacketized::Ready(unit)) => units.push(unit),
            Ok(Depacketized::NeedMoreInput) => {}
            Err(e) => {
                if !e.is_invalid_data() {
                    warn!(stream = %stream_id, seq = %packet.sequence_number, error = %e, "unit dropped");
                }
                return Err(e);
            }
        }
        loop {
            match handler.next_pending(state.as_mut()) {
                Ok(Depacketized::Ready(unit)) => units.push(unit),
                Ok(Depacketized::NeedMoreInput) => break,
                Err(e) if units.is_empty() => return Err(e),
                Err(e) => {
                    warn!(stream = %stream_id, error = %e, "stopped draining pending units");
                    break;
                }
            }
        }

        state.set_last_accessed(self.clock.now());
        Ok(units)
    }

    /// Drops a stream and everything it buffered.
    ///
    /// # Errors
    /// - [`DepacketizeError::UnknownStream`] - `stream_id` was never initialized
    pub fn teardown(&mut self, stream_id: StreamId) -> Result<(), DepacketizeError> {
        self.streams
            .remove_stream(stream_id)
            .map(|_| debug!(stream = %stream_id, "stream torn down"))
            .ok_or(DepacketizeError::UnknownStream(stream_id))
    }

    /// Removes streams idle for longer than the configured timeout.
    ///
    /// Idle time is measured from the last successful delivery (or `init`).
    pub fn prune_stale_streams(&mut self) {
        let now = self.clock.now();
        let timeout = self.config.stream_idle_timeout;

        let stale: Vec<StreamId> = self
            .streams
            .streams_iter()
            .filter_map(|(stream_id, state)| {
                if now.duration_since(state.last_accessed()) > timeout {
                    Some(*stream_id)
                } else {
                    None
                }
            })
            .collect();

        for stream_id in stale {
            self.streams.remove_stream(stream_id);
            debug!(stream = %stream_id, "idle stream pruned");
        }
    }

    /// Provides access to the underlying `StreamManager`.
    pub fn stream_manager(&self) -> &StreamManager {
        &self.streams
    }

    /// Engine configuration.
    pub fn config(&self) -> &DepacketizerConfig {
        &self.config
    }

    /// Shared handler registry.
    pub fn registry(&self) -> &Arc<HandlerRegistry> {
        &self.registry
    }
}

impl Default for DepacketizerEngine {
    fn default() -> Self {
        Self::new(
            Arc::new(HandlerRegistry::with_default_handlers()),
            DepacketizerConfig::default(),
            Arc::new(SystemClock),
        )
    }
}
