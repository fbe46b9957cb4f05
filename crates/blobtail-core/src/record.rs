// Domain record types for decoded export output

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A value paired with the minute bucket it came from.
///
/// Fetch and decode happen out of order within a bucket, so the bucket
/// timestamp is carried alongside every produced value end-to-end.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Timestamped<T> {
    pub value: T,
    pub timestamp: DateTime<Utc>,
}

impl<T> Timestamped<T> {
    pub fn new(value: T, timestamp: DateTime<Utc>) -> Self {
        Self { value, timestamp }
    }

    /// Replace the value, keeping the bucket timestamp.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Timestamped<U> {
        Timestamped {
            value: f(self.value),
            timestamp: self.timestamp,
        }
    }
}

/// One exported device-log entry.
///
/// The export schema is open-ended; fields the struct does not name are kept
/// verbatim in `properties` so nothing is dropped on a round trip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceLog {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub log_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub install_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(flatten)]
    pub properties: serde_json::Map<String, serde_json::Value>,
}
