//! Negotiated format parameters and engine configuration.
//!
//! [`FormatParameters`] is the key→value map produced by session negotiation
//! (typically the value of an SDP `a=fmtp:` line). Handlers read the keys they
//! understand and ignore everything else. [`DepacketizerConfig`] holds the
//! engine-wide limits applied to every stream.

use std::collections::BTreeMap;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_with::{DurationSeconds, serde_as};

use crate::constants::{
    DEFAULT_MAX_UNIT_SIZE, DEFAULT_SALVAGE_SEQUENCE_GAP, DEFAULT_STREAM_IDLE_TIMEOUT,
};
use crate::error::DepacketizeError;

/// Case-insensitive map of negotiated format parameters.
///
/// Keys are stored lower-cased. A key given without a value maps to an empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FormatParameters {
    entries: BTreeMap<String, String>,
}

impl FormatParameters {
    /// Creates an empty parameter set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses an SDP `fmtp` value such as `"mode=30; octet-align=1"`.
    ///
    /// Pairs are separated by `;`, whitespace around keys and values is ignored
    /// and empty segments are skipped. Parsing never fails: anything that is not
    /// a `key=value` pair is kept as a bare key.
    pub fn parse_fmtp(value: &str) -> Self {
        let mut parameters = Self::new();
        for segment in value.split(';') {
            let segment = segment.trim();
            if segment.is_empty() {
                continue;
            }
            match segment.split_once('=') {
                Some((key, value)) => parameters.insert(key.trim(), value.trim()),
                None => parameters.insert(segment, ""),
            }
        }
        parameters
    }

    /// Inserts or replaces a parameter.
    pub fn insert(&mut self, key: &str, value: &str) {
        self.entries
            .insert(key.to_ascii_lowercase(), value.to_string());
    }

    /// Returns the raw value of `key`, if present.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .get(&key.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Returns `true` if `key` was negotiated.
    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Parses the value of `key` as a number.
    ///
    /// # Errors
    /// - [`DepacketizeError::InvalidParameter`] - The value is not a valid number
    pub fn get_parsed<T: FromStr>(&self, key: &str) -> Result<Option<T>, DepacketizeError> {
        match self.get(key) {
            None => Ok(None),
            Some(raw) => raw
                .parse::<T>()
                .map(Some)
                .map_err(|_| DepacketizeError::InvalidParameter {
                    key: key.to_string(),
                    value: raw.to_string(),
                    reason: "not a valid number".to_string(),
                }),
        }
    }

    /// Parses the value of `key` as an unsigned 32-bit integer.
    ///
    /// # Errors
    /// - [`DepacketizeError::InvalidParameter`] - The value is not a valid number
    pub fn get_u32(&self, key: &str) -> Result<Option<u32>, DepacketizeError> {
        self.get_parsed::<u32>(key)
    }

    /// Interprets `key` as a 0/1 flag. A bare key counts as `1`.
    ///
    /// # Errors
    /// - [`DepacketizeError::InvalidParameter`] - The value is neither empty, `0` nor `1`
    pub fn get_flag(&self, key: &str) -> Result<Option<bool>, DepacketizeError> {
        match self.get(key) {
            None => Ok(None),
            Some("") | Some("1") => Ok(Some(true)),
            Some("0") => Ok(Some(false)),
            Some(other) => Err(DepacketizeError::InvalidParameter {
                key: key.to_string(),
                value: other.to_string(),
                reason: "expected 0 or 1".to_string(),
            }),
        }
    }

    /// Iterates over all parameters in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of parameters.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no parameters were negotiated.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: AsRef<str>, V: AsRef<str>> FromIterator<(K, V)> for FormatParameters {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut parameters = Self::new();
        for (key, value) in iter {
            parameters.insert(key.as_ref(), value.as_ref());
        }
        parameters
    }
}

/// Engine-wide limits applied to every stream.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DepacketizerConfig {
    /// Largest access unit any accumulator may hold, in bytes.
    pub max_unit_size: usize,
    /// Largest transport-sequence gap tolerated when salvaging a unit whose
    /// format carries no picture identifier.
    pub salvage_sequence_gap: u16,
    /// Idle time after which `prune_stale_streams` removes a stream.
    #[serde_as(as = "DurationSeconds<u64>")]
    pub stream_idle_timeout: Duration,
}

impl Default for DepacketizerConfig {
    fn default() -> Self {
        Self {
            max_unit_size: DEFAULT_MAX_UNIT_SIZE,
            salvage_sequence_gap: DEFAULT_SALVAGE_SEQUENCE_GAP,
            stream_idle_timeout: DEFAULT_STREAM_IDLE_TIMEOUT,
        }
    }
}
