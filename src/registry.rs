//! Registry mapping encoding names to payload handlers.
//!
//! Built once, then shared immutably (usually behind an `Arc`) by every engine
//! that dispatches packets to it.

use std::collections::HashMap;

use tracing::debug;

use crate::error::DepacketizeError;
use crate::handlers::{
    AmrHandler, ConcatHandler, ContinuityHandler, IlbcHandler, InterleaveHandler,
};
use crate::packet_defs::PayloadFormat;
use crate::traits::PayloadHandler;

/// Handlers keyed by their case-folded encoding name.
#[derive(Debug, Default)]
pub struct HandlerRegistry {
    handlers: HashMap<String, Box<dyn PayloadHandler>>,
}

impl HandlerRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding a handler for every built-in format.
    pub fn with_default_handlers() -> Self {
        let mut registry = Self::new();
        let handlers: [Box<dyn PayloadHandler>; 9] = [
            Box::new(ContinuityHandler::vp8()),
            Box::new(ConcatHandler::vp9()),
            Box::new(ConcatHandler::dv()),
            Box::new(ConcatHandler::h263_1998()),
            Box::new(ConcatHandler::h263_2000()),
            Box::new(InterleaveHandler::new()),
            Box::new(AmrHandler::narrowband()),
            Box::new(AmrHandler::wideband()),
            Box::new(IlbcHandler::new()),
        ];
        for handler in handlers {
            // Built-in formats have distinct names.
            let _ = registry.register(handler);
        }
        registry
    }

    /// Registers a handler under the encoding name of its format.
    ///
    /// # Errors
    /// - [`DepacketizeError::Internal`] - A handler for the same name is already registered
    pub fn register(&mut self, handler: Box<dyn PayloadHandler>) -> Result<(), DepacketizeError> {
        let format = handler.format();
        let key = registry_key(format.name());
        if self.handlers.contains_key(&key) {
            return Err(DepacketizeError::Internal(format!(
                "Payload handler for {} already registered.",
                format
            )));
        }
        debug!(format = %format, "payload handler registered");
        self.handlers.insert(key, handler);
        Ok(())
    }

    /// Looks up the handler for an encoding name, ignoring ASCII case.
    pub fn get(&self, name: &str) -> Option<&dyn PayloadHandler> {
        self.handlers.get(&registry_key(name)).map(|handler| handler.as_ref())
    }

    /// Looks up the handler serving `format`.
    pub fn handler_for(&self, format: PayloadFormat) -> Option<&dyn PayloadHandler> {
        self.get(format.name())
    }

    /// Returns `true` if a handler is registered for `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(&registry_key(name))
    }

    /// Number of registered handlers.
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Returns `true` if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Formats served by this registry, in no particular order.
    pub fn formats(&self) -> impl Iterator<Item = PayloadFormat> + '_ {
        self.handlers.values().map(|handler| handler.format())
    }
}

fn registry_key(name: &str) -> String {
    name.to_ascii_uppercase()
}
