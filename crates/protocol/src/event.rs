//! Event - one record read from the source store
//!
//! Events are schema-free JSON objects. Parsing extracts the two
//! attributes the pipeline depends on (`clientId` and `time`) and keeps
//! the full object untouched, so serialization reproduces the record
//! byte-for-byte, timestamps included.

use chrono::{DateTime, Utc};
use serde_json::Value;
use thiserror::Error;

/// Wire attribute holding the partition key
const CLIENT_ID_FIELD: &str = "clientId";

/// Wire attribute holding the event instant (RFC 3339 with timezone)
const TIME_FIELD: &str = "time";

/// Wire attribute holding the opaque event identifier
const EVENT_ID_FIELD: &str = "eventId";

/// A single event record with its extracted routing attributes
///
/// The original JSON object is carried verbatim; `client_id` and
/// `timestamp` are parsed once so the window predicate and the group-by
/// never re-read the raw value.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    value: Value,
    client_id: String,
    timestamp: DateTime<Utc>,
    encoded_len: usize,
}

impl Event {
    /// Parse a raw source record into an event
    ///
    /// Rejects records that are not JSON objects, that are missing a
    /// non-empty `clientId`, or whose `time` is absent or not a valid
    /// RFC 3339 timestamp. Rejected records are counted by the caller
    /// and never abort a run.
    pub fn parse(value: Value) -> Result<Self, EventError> {
        let object = value.as_object().ok_or(EventError::NotAnObject)?;

        let client_id = match object.get(CLIENT_ID_FIELD).and_then(Value::as_str) {
            Some(id) if !id.is_empty() => id.to_owned(),
            _ => return Err(EventError::MissingClientId),
        };

        let raw_time = object
            .get(TIME_FIELD)
            .and_then(Value::as_str)
            .ok_or(EventError::MissingTime)?;

        let timestamp = DateTime::parse_from_rfc3339(raw_time)
            .map_err(|source| EventError::InvalidTime {
                time: raw_time.to_owned(),
                source,
            })?
            .with_timezone(&Utc);

        // Compact encoding of a just-parsed object cannot fail; the
        // length feeds the partitioner's memory accounting.
        let encoded_len = serde_json::to_vec(&value).map(|v| v.len()).unwrap_or(0);

        Ok(Self {
            value,
            client_id,
            timestamp,
            encoded_len,
        })
    }

    /// The partition key this event belongs to
    #[inline]
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// The event instant, normalized to UTC
    #[inline]
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Opaque event identifier, if the record carries one
    ///
    /// Used for diagnostics and as the ordering tie-break; never
    /// required.
    pub fn event_id(&self) -> Option<&str> {
        self.value.get(EVENT_ID_FIELD).and_then(Value::as_str)
    }

    /// The full record as received from the source
    #[inline]
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Compact-encoded size in bytes
    #[inline]
    pub fn encoded_len(&self) -> usize {
        self.encoded_len
    }
}

/// Reasons a source record fails admission
#[derive(Debug, Error)]
pub enum EventError {
    /// Record is not a JSON object
    #[error("record is not a JSON object")]
    NotAnObject,

    /// `clientId` is absent, empty, or not a string
    #[error("record has no usable clientId")]
    MissingClientId,

    /// `time` is absent or not a string
    #[error("record has no time attribute")]
    MissingTime,

    /// `time` is present but not a valid RFC 3339 timestamp
    #[error("record time '{time}' is not a valid timestamp: {source}")]
    InvalidTime {
        time: String,
        #[source]
        source: chrono::ParseError,
    },
}
