//! Row-level SQL operations, one module per table.

pub mod interaction_ops;
pub mod profile_ops;
pub mod session_ops;
pub mod stats_ops;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;

use intentlayer_core::errors::{IntentLayerResult, StorageError};

/// Fixed-width RFC 3339 so lexicographic order matches time order.
pub(crate) fn fmt_ts(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

pub(crate) fn parse_ts(raw: &str) -> IntentLayerResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| {
            StorageError::CorruptionDetected {
                details: format!("bad timestamp {raw:?}: {e}"),
            }
            .into()
        })
}

pub(crate) fn to_json<T: Serialize + ?Sized>(value: &T) -> IntentLayerResult<String> {
    Ok(serde_json::to_string(value)?)
}

pub(crate) fn from_json<T: DeserializeOwned>(raw: &str) -> IntentLayerResult<T> {
    Ok(serde_json::from_str(raw)?)
}
