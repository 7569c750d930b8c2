//! Core event model and list maintenance shared by the dashboard timeline cards.

use chrono::{DateTime, Datelike, Local, NaiveDateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};

/// Severity bucket derived from the server monitor's level sensor.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum ErrorLevel {
    Critical,
    Error,
    Unknown,
}

impl ErrorLevel {
    /// Total classification: anything that is not CRITICAL or ERROR lands in
    /// `Unknown`, including free-form strings like "WARN".
    pub fn classify(raw: &str) -> Self {
        match raw.trim().to_ascii_uppercase().as_str() {
            "CRITICAL" => ErrorLevel::Critical,
            "ERROR" => ErrorLevel::Error,
            _ => ErrorLevel::Unknown,
        }
    }
}

/// Back-reference to the entity whose state change produced an event.
///
/// Carries the camera id for sighting/sound events so the renderer can open
/// the matching clip browser without inspecting the message text.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EventSource {
    pub entity_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub camera: Option<String>,
}

impl EventSource {
    pub fn entity(entity_id: impl Into<String>) -> Self {
        Self {
            entity_id: entity_id.into(),
            camera: None,
        }
    }

    pub fn camera(entity_id: impl Into<String>, camera: impl Into<String>) -> Self {
        Self {
            entity_id: entity_id.into(),
            camera: Some(camera.into()),
        }
    }
}

/// One rendered timeline entry. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TimelineEvent {
    pub message: String,
    pub icon: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<ErrorLevel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<EventSource>,
    pub timestamp: DateTime<Utc>,
    pub formatted_time: String,
}

impl TimelineEvent {
    pub fn new(
        message: impl Into<String>,
        icon: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            message: message.into(),
            icon: icon.into(),
            color: None,
            level: None,
            source: None,
            timestamp,
            formatted_time: format_timestamp(timestamp),
        }
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    pub fn with_level(mut self, level: ErrorLevel) -> Self {
        self.level = Some(level);
        self
    }

    pub fn with_source(mut self, source: EventSource) -> Self {
        self.source = Some(source);
        self
    }
}

/// What the presentation layer receives: real events interleaved with
/// collapsed-run markers. Ellipsis markers carry no timestamp and never count
/// toward the display cap.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TimelineEntry {
    Event(TimelineEvent),
    Ellipsis { message: String },
}

impl TimelineEntry {
    pub fn is_ellipsis(&self) -> bool {
        matches!(self, TimelineEntry::Ellipsis { .. })
    }

    pub fn message(&self) -> &str {
        match self {
            TimelineEntry::Event(event) => &event.message,
            TimelineEntry::Ellipsis { message } => message,
        }
    }
}

/// Bounded, newest-first event list backing one card instance.
///
/// All mutation happens on `&mut self` from the host's serialized callbacks,
/// so a render never observes a partially-updated list.
#[derive(Debug, Clone, Default)]
pub struct EventList {
    events: Vec<TimelineEvent>,
}

impl EventList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn events(&self) -> &[TimelineEvent] {
        &self.events
    }

    /// Prepend a live event and re-apply the raw cap.
    pub fn push_live(&mut self, event: TimelineEvent, max_events: Option<usize>) {
        self.events.insert(0, event);
        self.truncate(max_events);
    }

    /// Fold reconstructed history into the list: live events that raced the
    /// history query stay, and one global re-sort restores newest-first order.
    pub fn merge_history(&mut self, events: Vec<TimelineEvent>, max_events: Option<usize>) {
        self.events.extend(events);
        self.events
            .sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        self.truncate(max_events);
    }

    fn truncate(&mut self, max_events: Option<usize>) {
        if let Some(max) = max_events {
            self.events.truncate(max);
        }
    }

    /// The display pipeline: age filter, then duplicate collapsing, then the
    /// cap over real events only.
    pub fn presentation(
        &self,
        max_events: Option<usize>,
        max_time_ago_hours: Option<f64>,
        now: DateTime<Utc>,
    ) -> Vec<TimelineEntry> {
        let filtered = filter_by_age(&self.events, max_time_ago_hours, now);
        let collapsed = collapse_consecutive_duplicates(filtered);
        apply_cap(collapsed, max_events)
    }
}

/// Drop events older than `now - max_hours`. Unset hours keep everything.
pub fn filter_by_age(
    events: &[TimelineEvent],
    max_hours: Option<f64>,
    now: DateTime<Utc>,
) -> Vec<TimelineEvent> {
    match max_hours {
        Some(hours) => {
            let cutoff = now - chrono::Duration::milliseconds((hours * 3_600_000.0) as i64);
            events
                .iter()
                .filter(|event| event.timestamp >= cutoff)
                .cloned()
                .collect()
        }
        None => events.to_vec(),
    }
}

/// Replace runs of 3+ consecutive equal-message events with the first two
/// plus an ellipsis marker. Runs of 1-2 pass through verbatim; any
/// non-matching event breaks the run.
pub fn collapse_consecutive_duplicates(events: Vec<TimelineEvent>) -> Vec<TimelineEntry> {
    let mut collapsed = Vec::with_capacity(events.len());
    let mut i = 0;

    while i < events.len() {
        let message = events[i].message.clone();
        let mut count = 1;
        while i + count < events.len() && events[i + count].message == message {
            count += 1;
        }

        if count > 2 {
            collapsed.push(TimelineEntry::Event(events[i].clone()));
            collapsed.push(TimelineEntry::Event(events[i + 1].clone()));
            collapsed.push(TimelineEntry::Ellipsis { message });
        } else {
            for event in &events[i..i + count] {
                collapsed.push(TimelineEntry::Event(event.clone()));
            }
        }
        i += count;
    }

    collapsed
}

/// Cap the collapsed list. Ellipsis markers pass through without consuming
/// quota; the first real event past the cap ends the walk.
pub fn apply_cap(entries: Vec<TimelineEntry>, max_events: Option<usize>) -> Vec<TimelineEntry> {
    let Some(max) = max_events else {
        return entries;
    };

    let mut limited = Vec::with_capacity(entries.len());
    let mut real = 0;
    for entry in entries {
        if entry.is_ellipsis() {
            limited.push(entry);
        } else if real < max {
            limited.push(entry);
            real += 1;
        } else {
            break;
        }
    }
    limited
}

/// Short local-clock stamp: 12-hour time with am/pm and a day/month date,
/// e.g. "3:07pm 14/6".
pub fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    format_naive(timestamp.with_timezone(&Local).naive_local())
}

fn format_naive(local: NaiveDateTime) -> String {
    let hour = local.hour();
    let suffix = if hour >= 12 { "pm" } else { "am" };
    let display_hour = match hour % 12 {
        0 => 12,
        h => h,
    };
    format!(
        "{display_hour}:{:02}{suffix} {}/{}",
        local.minute(),
        local.day(),
        local.month()
    )
}

/// Errors surfaced across the host boundary.
#[derive(Debug, thiserror::Error)]
pub enum TimelineError {
    #[error("history payload is not a per-entity object")]
    MissingData,
    #[error("could not read host data: {0}")]
    Parse(String),
}
