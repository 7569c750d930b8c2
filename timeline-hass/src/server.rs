//! Server monitor card core.
//!
//! Follows a free-text error-message sensor and a companion level sensor,
//! recording a timeline event whenever the message changes to something
//! material. Severity decides icon and colour.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use timeline_core::{
    ErrorLevel, EventList, EventSource, TimelineEntry, TimelineError, TimelineEvent,
};

use crate::history::{self, HistoryRequest, ValueIndex};
use crate::non_empty;
use crate::state::StateMap;

const DEFAULT_TITLE: &str = "Server Monitor";

const DEFAULT_ERROR_ICON: &str = "mdi:alert";
const DEFAULT_CRITICAL_ICON: &str = "mdi:alert-octagon";
const DEFAULT_UNKNOWN_ICON: &str = "mdi:help-circle";

const DEFAULT_ERROR_COLOR: &str = "#FFC2A2";
const DEFAULT_CRITICAL_COLOR: &str = "#FF9999";
const DEFAULT_UNKNOWN_COLOR: &str = "#FFEE99";

/// Look-back when no age limit is configured: effectively "everything".
const DEFAULT_WINDOW_HOURS: f64 = 365.0 * 24.0;

/// Sensor values that mean "no error" and never become events.
pub fn is_none_message(message: &str) -> bool {
    matches!(
        message.trim().to_ascii_lowercase().as_str(),
        "none" | "n/a" | "na" | "" | "unknown"
    )
}

/// Icon and colour for one severity bucket.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct LevelStyle {
    pub icon: String,
    pub color: String,
}

/// User configuration for the server monitor card. Absent, null, and empty
/// values read as unset; the two sensor ids are required for anything to
/// happen.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ServerMonitorConfig {
    pub error_message_sensor: String,
    pub error_level_sensor: String,
    pub title: Option<String>,
    pub max_events: Option<usize>,
    /// Hours; zero or negative behaves as unset.
    pub max_time_ago: Option<f64>,
    pub accent_color: Option<String>,
    pub error_color: Option<String>,
    pub critical_color: Option<String>,
    pub unknown_color: Option<String>,
    pub error_icon: Option<String>,
    pub critical_icon: Option<String>,
    pub unknown_icon: Option<String>,
}

impl ServerMonitorConfig {
    /// Style for a severity bucket: configured override first, then the
    /// hard-coded fallback. Total over all levels.
    pub fn level_style(&self, level: ErrorLevel) -> LevelStyle {
        let (icon, color, icon_default, color_default) = match level {
            ErrorLevel::Critical => (
                &self.critical_icon,
                &self.critical_color,
                DEFAULT_CRITICAL_ICON,
                DEFAULT_CRITICAL_COLOR,
            ),
            ErrorLevel::Error => (
                &self.error_icon,
                &self.error_color,
                DEFAULT_ERROR_ICON,
                DEFAULT_ERROR_COLOR,
            ),
            ErrorLevel::Unknown => (
                &self.unknown_icon,
                &self.unknown_color,
                DEFAULT_UNKNOWN_ICON,
                DEFAULT_UNKNOWN_COLOR,
            ),
        };
        LevelStyle {
            icon: non_empty(icon).unwrap_or(icon_default).to_string(),
            color: non_empty(color).unwrap_or(color_default).to_string(),
        }
    }

    fn age_limit(&self) -> Option<f64> {
        self.max_time_ago.filter(|hours| *hours > 0.0)
    }

    fn card_title(&self) -> String {
        non_empty(&self.title).unwrap_or(DEFAULT_TITLE).to_string()
    }

    /// Accent falls back to the error colour, then its default.
    fn accent(&self) -> String {
        non_empty(&self.accent_color)
            .or_else(|| non_empty(&self.error_color))
            .unwrap_or(DEFAULT_ERROR_COLOR)
            .to_string()
    }
}

/// Entries plus display parameters for the external renderer.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ServerRenderPayload {
    pub entries: Vec<TimelineEntry>,
    pub title: String,
    pub accent_color: String,
}

/// Server monitor core: owns the previous-message cache and the event list
/// for one card instance.
#[derive(Debug)]
pub struct ServerMonitor {
    config: ServerMonitorConfig,
    previous_message: Option<String>,
    list: EventList,
}

impl ServerMonitor {
    pub fn new(config: ServerMonitorConfig) -> Self {
        Self {
            config,
            previous_message: None,
            list: EventList::new(),
        }
    }

    pub fn config(&self) -> &ServerMonitorConfig {
        &self.config
    }

    /// Raw newest-first list, before the display pipeline.
    pub fn events(&self) -> &[TimelineEvent] {
        self.list.events()
    }

    /// Seed the previous-message cache so the first observed value never
    /// becomes an event.
    pub fn attach(&mut self, states: &StateMap) {
        if let Some(state) = states.state_of(&self.config.error_message_sensor) {
            self.previous_message = Some(state.to_string());
        }
    }

    pub fn update(&mut self, states: &StateMap) {
        self.update_at(states, Utc::now());
    }

    /// Live tick with an explicit clock.
    pub fn update_at(&mut self, states: &StateMap, now: DateTime<Utc>) {
        let Some(current) = states.state_of(&self.config.error_message_sensor) else {
            return;
        };

        let changed = self.previous_message.as_deref() != Some(current);
        if changed && self.previous_message.is_some() && !is_none_message(current) {
            let level = self.current_level(states);
            let event = self.build_event(current, level, now);
            self.list.push_live(event, self.config.max_events);
        }

        self.previous_message = Some(current.to_string());
    }

    /// History query for both sensors, or `None` when either is
    /// unconfigured (the card then runs on the live path alone).
    pub fn history_request(&self, now: DateTime<Utc>) -> Option<HistoryRequest> {
        if self.config.error_message_sensor.is_empty() || self.config.error_level_sensor.is_empty()
        {
            return None;
        }
        let hours = self.config.age_limit().unwrap_or(DEFAULT_WINDOW_HOURS);
        let start = now - Duration::milliseconds((hours * 3_600_000.0) as i64);
        Some(HistoryRequest::during_period(
            start,
            now,
            vec![
                self.config.error_message_sensor.clone(),
                self.config.error_level_sensor.clone(),
            ],
            false,
        ))
    }

    /// Rebuild the message timeline from history and fold it into the list.
    /// Levels are matched at-or-before each message change, falling back to
    /// the live level when the level sensor has no history.
    pub fn apply_history(
        &mut self,
        payload: &Value,
        states: &StateMap,
    ) -> Result<usize, TimelineError> {
        let mut by_entity = history::parse_history(payload)?;
        let messages = by_entity
            .remove(&self.config.error_message_sensor)
            .unwrap_or_default();
        let levels = by_entity
            .remove(&self.config.error_level_sensor)
            .unwrap_or_default();
        let index = ValueIndex::from_snapshots(&levels);

        let mut last_message: Option<&str> = None;
        let mut events = Vec::new();
        for snapshot in &messages {
            if is_none_message(&snapshot.state) {
                continue;
            }
            if last_message == Some(snapshot.state.as_str()) {
                continue;
            }
            last_message = Some(&snapshot.state);

            let level = match index.value_at(snapshot.timestamp) {
                Some(value) => ErrorLevel::classify(value),
                None => self.current_level(states),
            };
            events.push(self.build_event(&snapshot.state, level, snapshot.timestamp));
        }

        let count = events.len();
        self.list.merge_history(events, self.config.max_events);
        Ok(count)
    }

    /// Entries plus display parameters for the renderer.
    pub fn render_payload(&self, now: DateTime<Utc>) -> ServerRenderPayload {
        let entries =
            self.list
                .presentation(self.config.max_events, self.config.age_limit(), now);
        ServerRenderPayload {
            entries,
            title: self.config.card_title(),
            accent_color: self.config.accent(),
        }
    }

    /// Live severity, defaulting to ERROR when the level sensor is
    /// unconfigured or absent.
    fn current_level(&self, states: &StateMap) -> ErrorLevel {
        match states.state_of(&self.config.error_level_sensor) {
            Some(state) => ErrorLevel::classify(state),
            None => ErrorLevel::Error,
        }
    }

    fn build_event(
        &self,
        message: &str,
        level: ErrorLevel,
        timestamp: DateTime<Utc>,
    ) -> TimelineEvent {
        let style = self.config.level_style(level);
        TimelineEvent::new(message, style.icon, timestamp)
            .with_color(style.color)
            .with_level(level)
            .with_source(EventSource::entity(&self.config.error_message_sensor))
    }
}
