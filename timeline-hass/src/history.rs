//! History payload normalization and at-or-before value lookups.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use timeline_core::TimelineError;

/// Request type understood by the host's history API.
pub const HISTORY_DURING_PERIOD: &str = "history/history_during_period";

/// History query a card asks the host to run on its behalf.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct HistoryRequest {
    #[serde(rename = "type")]
    pub request_type: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub entity_ids: Vec<String>,
    pub minimal_response: bool,
    pub no_attributes: bool,
}

impl HistoryRequest {
    pub fn during_period(
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
        entity_ids: Vec<String>,
        minimal: bool,
    ) -> Self {
        Self {
            request_type: HISTORY_DURING_PERIOD.to_string(),
            start_time,
            end_time,
            entity_ids,
            minimal_response: minimal,
            no_attributes: minimal,
        }
    }
}

/// One normalized history sample.
#[derive(Debug, Clone, PartialEq)]
pub struct RawSnapshot {
    pub state: String,
    pub timestamp: DateTime<Utc>,
}

/// Normalize the host's history payload: an object mapping entity ids to
/// snapshot arrays. Accepts the minimal (`s`/`lc`/`lu`) and the full
/// (`state`/`last_changed`) record encodings, with timestamps as epoch
/// seconds or RFC 3339 strings. Malformed records are skipped individually;
/// a payload that is not an object is the only hard error.
pub fn parse_history(payload: &Value) -> Result<HashMap<String, Vec<RawSnapshot>>, TimelineError> {
    let entries = payload.as_object().ok_or(TimelineError::MissingData)?;

    let mut by_entity = HashMap::with_capacity(entries.len());
    for (entity_id, samples) in entries {
        let Some(samples) = samples.as_array() else {
            log::debug!("history for {entity_id} is not an array, skipping");
            continue;
        };

        let mut snapshots = Vec::with_capacity(samples.len());
        for sample in samples {
            match parse_sample(sample) {
                Some(snapshot) => snapshots.push(snapshot),
                None => log::debug!("skipping malformed history sample for {entity_id}"),
            }
        }
        by_entity.insert(entity_id.clone(), snapshots);
    }

    Ok(by_entity)
}

fn parse_sample(sample: &Value) -> Option<RawSnapshot> {
    let state = field(sample, &["s", "state"])?.as_str()?.to_string();
    let timestamp = parse_timestamp(field(sample, &["lc", "lu", "last_changed"])?)?;
    Some(RawSnapshot { state, timestamp })
}

fn field<'a>(sample: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|key| sample.get(key))
        .find(|value| !value.is_null())
}

/// Epoch seconds (possibly fractional) or an RFC 3339 string.
pub fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    if let Some(seconds) = value.as_f64() {
        return DateTime::from_timestamp_millis((seconds * 1000.0).round() as i64);
    }
    let text = value.as_str()?;
    DateTime::parse_from_rfc3339(text)
        .map(|timestamp| timestamp.with_timezone(&Utc))
        .ok()
}

/// Time-ordered value list for one entity.
#[derive(Debug, Clone, Default)]
pub struct ValueIndex {
    samples: Vec<(DateTime<Utc>, String)>,
}

impl ValueIndex {
    pub fn from_snapshots(snapshots: &[RawSnapshot]) -> Self {
        let mut samples: Vec<_> = snapshots
            .iter()
            .map(|snapshot| (snapshot.timestamp, snapshot.state.clone()))
            .collect();
        samples.sort_by_key(|(timestamp, _)| *timestamp);
        Self { samples }
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Latest value at or before `at`, the earliest known value when nothing
    /// precedes `at`, and `None` only when the index is empty.
    pub fn value_at(&self, at: DateTime<Utc>) -> Option<&str> {
        if self.samples.is_empty() {
            return None;
        }
        let idx = self.samples.partition_point(|(timestamp, _)| *timestamp <= at);
        let (_, value) = if idx == 0 {
            &self.samples[0]
        } else {
            &self.samples[idx - 1]
        };
        Some(value.as_str())
    }
}
