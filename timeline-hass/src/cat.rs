//! Cat activity card core.
//!
//! Watches a cat flap, a food bowl, and camera sensor clusters, turning
//! rising edges into timeline events. Camera sightings pick their subject
//! from a companion classification sensor; food-bowl events are debounced.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use timeline_core::{EventList, EventSource, TimelineEntry, TimelineError, TimelineEvent};

use crate::history::{self, HistoryRequest, RawSnapshot, ValueIndex};
use crate::non_empty;
use crate::state::StateMap;

/// Fallback icon colour when no colour is configured.
pub const DEFAULT_ICON_COLOR: &str = "var(--primary-color, #03a9f4)";

const FLAP_ICON: &str = "mdi:home-export-outline";
const BOWL_ICON: &str = "mdi:bowl";
const CAMERA_ICON: &str = "mdi:camera";
const SOUND_ICON: &str = "mdi:cast-audio-variant";

const FLAP_MESSAGE: &str = "Sadie used the cat flap";
const BOWL_MESSAGE: &str = "Sadie ate from her food bowl";

/// Repeat "ate" events inside this window are dropped.
const FOOD_BOWL_DEBOUNCE_MINUTES: i64 = 5;

/// Default history look-back when no age limit is configured.
const DEFAULT_WINDOW_HOURS: f64 = 24.0;

/// Sensor cluster of one camera position.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CameraEntities {
    /// Camera id carried on events for click-through into recorded clips.
    pub camera: String,
    pub occupancy: String,
    pub classification: String,
    pub sound_sensors: Vec<String>,
    /// Rendered into sighting and noise messages ("… by {location}").
    pub location: String,
}

/// Entity table watched by the cat card. The defaults reproduce the
/// deployment this card was written for.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CatEntities {
    pub cat_flap: String,
    pub food_bowl: String,
    pub cameras: Vec<CameraEntities>,
}

impl Default for CatEntities {
    fn default() -> Self {
        Self {
            cat_flap: "binary_sensor.sadies_cat_flap_state".into(),
            food_bowl: "binary_sensor.sadies_food_bowl_state".into(),
            cameras: vec![
                CameraEntities {
                    camera: "plc_kattcam".into(),
                    occupancy: "binary_sensor.plc_kattcam_cat_occupancy".into(),
                    classification: "sensor.plc_kattcam_cat_object_classification".into(),
                    sound_sensors: vec![
                        "binary_sensor.plc_kattcam_cat_sound".into(),
                        "binary_sensor.plc_kattcam_caterwaul_sound".into(),
                        "binary_sensor.plc_kattcam_hiss_sound".into(),
                        "binary_sensor.plc_kattcam_meow_sound".into(),
                    ],
                    location: "the hole under the fence".into(),
                },
                CameraEntities {
                    camera: "plc_kattcam_2".into(),
                    occupancy: "binary_sensor.plc_kattcam_2_cat_occupancy".into(),
                    classification: "sensor.plc_kattcam_2_cat_object_classification".into(),
                    sound_sensors: vec![
                        "binary_sensor.plc_kattcam_2_cat_sound".into(),
                        "binary_sensor.plc_kattcam_2_caterwaul_sound".into(),
                        "binary_sensor.plc_kattcam_2_hiss_sound".into(),
                        "binary_sensor.plc_kattcam_2_meow_sound".into(),
                    ],
                    location: "the back corner".into(),
                },
            ],
        }
    }
}

impl CatEntities {
    /// Edge-triggered entities: everything except the classification sensors.
    fn trigger_ids(&self) -> Vec<String> {
        let mut ids = vec![self.cat_flap.clone(), self.food_bowl.clone()];
        for camera in &self.cameras {
            ids.push(camera.occupancy.clone());
            ids.extend(camera.sound_sensors.iter().cloned());
        }
        ids
    }

    /// Everything the history query asks for, classification included.
    fn all_ids(&self) -> Vec<String> {
        let mut ids = self.trigger_ids();
        ids.extend(self.cameras.iter().map(|camera| camera.classification.clone()));
        ids
    }

    fn is_classification(&self, entity_id: &str) -> bool {
        self.cameras
            .iter()
            .any(|camera| camera.classification == entity_id)
    }

    fn camera_for_occupancy(&self, entity_id: &str) -> Option<&CameraEntities> {
        self.cameras.iter().find(|camera| camera.occupancy == entity_id)
    }

    fn camera_for_sound(&self, entity_id: &str) -> Option<&CameraEntities> {
        self.cameras
            .iter()
            .find(|camera| camera.sound_sensors.iter().any(|sensor| sensor == entity_id))
    }
}

/// User configuration for the cat card. Absent, null, and empty values read
/// as unset.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CatCardConfig {
    pub max_events: Option<usize>,
    /// Hours; zero or negative behaves as unset.
    pub max_time_ago: Option<f64>,
    pub sadie_icon_colour: Option<String>,
    pub other_cat_icon_colour: Option<String>,
    pub entities: CatEntities,
}

impl CatCardConfig {
    fn age_limit(&self) -> Option<f64> {
        self.max_time_ago.filter(|hours| *hours > 0.0)
    }

    fn sadie_colour(&self) -> String {
        non_empty(&self.sadie_icon_colour)
            .unwrap_or(DEFAULT_ICON_COLOR)
            .to_string()
    }

    /// Other-cat events fall back to the Sadie colour, then the default.
    fn other_cat_colour(&self) -> String {
        non_empty(&self.other_cat_icon_colour)
            .or_else(|| non_empty(&self.sadie_icon_colour))
            .unwrap_or(DEFAULT_ICON_COLOR)
            .to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Subject {
    Sadie,
    OtherCat,
}

/// Entries plus display parameters for the external renderer.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CatRenderPayload {
    pub entries: Vec<TimelineEntry>,
    pub default_icon_color: String,
    pub scrollbar_color: String,
}

/// Cat card core: owns the edge-detection cache and the event list for one
/// card instance, so several cards can coexist independently.
#[derive(Debug)]
pub struct CatTimeline {
    config: CatCardConfig,
    previous: HashMap<String, String>,
    last_food_bowl_event: Option<DateTime<Utc>>,
    list: EventList,
}

impl CatTimeline {
    pub fn new(config: CatCardConfig) -> Self {
        Self {
            config,
            previous: HashMap::new(),
            last_food_bowl_event: None,
            list: EventList::new(),
        }
    }

    pub fn config(&self) -> &CatCardConfig {
        &self.config
    }

    /// Raw newest-first list, before the display pipeline.
    pub fn events(&self) -> &[TimelineEvent] {
        self.list.events()
    }

    /// Seed the previous-state cache from the first full state map. Emits
    /// nothing; classification sensors are read live and not tracked.
    pub fn attach(&mut self, states: &StateMap) {
        for id in self.config.entities.trigger_ids() {
            if let Some(state) = states.state_of(&id) {
                self.previous.insert(id, state.to_string());
            }
        }
    }

    pub fn update(&mut self, states: &StateMap) {
        self.update_at(states, Utc::now());
    }

    /// Live tick with an explicit clock.
    pub fn update_at(&mut self, states: &StateMap, now: DateTime<Utc>) {
        let entities = self.config.entities.clone();

        if self.rising_edge(states, &entities.cat_flap, "on") {
            let event = self.build_event(
                FLAP_MESSAGE,
                FLAP_ICON,
                Subject::Sadie,
                EventSource::entity(&entities.cat_flap),
                now,
            );
            self.push_live(event);
        }

        if self.rising_edge(states, &entities.food_bowl, "off")
            && debounce_elapsed(self.last_food_bowl_event, now)
        {
            self.last_food_bowl_event = Some(now);
            let event = self.build_event(
                BOWL_MESSAGE,
                BOWL_ICON,
                Subject::Sadie,
                EventSource::entity(&entities.food_bowl),
                now,
            );
            self.push_live(event);
        }

        for camera in &entities.cameras {
            if self.rising_edge(states, &camera.occupancy, "on") {
                let classification = states.state_of(&camera.classification);
                let (message, subject) = sighting(camera, classification);
                let event = self.build_event(
                    &message,
                    CAMERA_ICON,
                    subject,
                    EventSource::camera(&camera.occupancy, &camera.camera),
                    now,
                );
                self.push_live(event);
            }

            for sensor in &camera.sound_sensors {
                if self.rising_edge(states, sensor, "on") {
                    let event = self.build_event(
                        &noise_message(camera),
                        SOUND_ICON,
                        Subject::OtherCat,
                        EventSource::camera(sensor, &camera.camera),
                        now,
                    );
                    self.push_live(event);
                }
            }
        }
    }

    /// History query covering the configured look-back window (24h default).
    pub fn history_request(&self, now: DateTime<Utc>) -> HistoryRequest {
        let hours = self.config.age_limit().unwrap_or(DEFAULT_WINDOW_HOURS);
        let start = now - hours_duration(hours);
        HistoryRequest::during_period(start, now, self.config.entities.all_ids(), true)
    }

    /// Reconstruct the events a live listener would have produced over the
    /// queried window and fold them into the list. The live state map backs
    /// classification lookups for entities with no recorded history.
    pub fn apply_history(
        &mut self,
        payload: &Value,
        states: &StateMap,
    ) -> Result<usize, TimelineError> {
        let by_entity = history::parse_history(payload)?;
        let entities = self.config.entities.clone();

        let mut classification: HashMap<String, ValueIndex> = HashMap::new();
        let mut changes: Vec<(String, RawSnapshot)> = Vec::new();
        for (entity_id, snapshots) in by_entity {
            if entities.is_classification(&entity_id) {
                classification.insert(entity_id, ValueIndex::from_snapshots(&snapshots));
            } else {
                changes.extend(snapshots.into_iter().map(|snapshot| (entity_id.clone(), snapshot)));
            }
        }
        changes.sort_by_key(|(_, snapshot)| snapshot.timestamp);

        // Reconstruction-local debounce, independent of the live stamp.
        let mut last_bowl: Option<DateTime<Utc>> = None;
        let mut events = Vec::new();

        for index in 0..changes.len() {
            let (entity_id, snapshot) = &changes[index];
            // A sample only counts as a change when it differs from the
            // globally preceding sample, entity included.
            let is_change = match index.checked_sub(1).map(|i| &changes[i]) {
                None => true,
                Some((previous_id, previous)) => {
                    previous_id != entity_id || previous.state != snapshot.state
                }
            };
            if !is_change {
                continue;
            }

            let timestamp = snapshot.timestamp;
            if *entity_id == entities.cat_flap && snapshot.state == "on" {
                events.push(self.build_event(
                    FLAP_MESSAGE,
                    FLAP_ICON,
                    Subject::Sadie,
                    EventSource::entity(&entities.cat_flap),
                    timestamp,
                ));
            } else if *entity_id == entities.food_bowl && snapshot.state == "off" {
                if debounce_elapsed(last_bowl, timestamp) {
                    last_bowl = Some(timestamp);
                    events.push(self.build_event(
                        BOWL_MESSAGE,
                        BOWL_ICON,
                        Subject::Sadie,
                        EventSource::entity(&entities.food_bowl),
                        timestamp,
                    ));
                }
            } else if let Some(camera) = entities.camera_for_occupancy(entity_id) {
                if snapshot.state == "on" {
                    let recorded = classification
                        .get(&camera.classification)
                        .and_then(|values| values.value_at(timestamp));
                    let value = recorded.or_else(|| states.state_of(&camera.classification));
                    let (message, subject) = sighting(camera, value);
                    events.push(self.build_event(
                        &message,
                        CAMERA_ICON,
                        subject,
                        EventSource::camera(&camera.occupancy, &camera.camera),
                        timestamp,
                    ));
                }
            } else if let Some(camera) = entities.camera_for_sound(entity_id) {
                if snapshot.state == "on" {
                    events.push(self.build_event(
                        &noise_message(camera),
                        SOUND_ICON,
                        Subject::OtherCat,
                        EventSource::camera(entity_id, &camera.camera),
                        timestamp,
                    ));
                }
            }
        }

        let count = events.len();
        self.list.merge_history(events, self.config.max_events);
        Ok(count)
    }

    /// Entries plus display parameters for the renderer.
    pub fn render_payload(&self, now: DateTime<Utc>) -> CatRenderPayload {
        let entries =
            self.list
                .presentation(self.config.max_events, self.config.age_limit(), now);
        let colour = self.config.sadie_colour();
        CatRenderPayload {
            entries,
            default_icon_color: colour.clone(),
            scrollbar_color: colour,
        }
    }

    /// True on a transition into `target`. Refreshes the previous-state
    /// cache for the entity whenever it is present in the map; an absent
    /// entity is a no-op that leaves the cache untouched.
    fn rising_edge(&mut self, states: &StateMap, entity_id: &str, target: &str) -> bool {
        let Some(current) = states.state_of(entity_id) else {
            return false;
        };
        let fired =
            current == target && self.previous.get(entity_id).map(String::as_str) != Some(target);
        self.previous.insert(entity_id.to_string(), current.to_string());
        fired
    }

    fn build_event(
        &self,
        message: &str,
        icon: &str,
        subject: Subject,
        source: EventSource,
        timestamp: DateTime<Utc>,
    ) -> TimelineEvent {
        let colour = match subject {
            Subject::Sadie => self.config.sadie_colour(),
            Subject::OtherCat => self.config.other_cat_colour(),
        };
        TimelineEvent::new(message, icon, timestamp)
            .with_color(colour)
            .with_source(source)
    }

    fn push_live(&mut self, event: TimelineEvent) {
        self.list.push_live(event, self.config.max_events);
    }
}

fn sighting(camera: &CameraEntities, classification: Option<&str>) -> (String, Subject) {
    if classification == Some("Sadie") {
        (
            format!("Sadie was seen by {}", camera.location),
            Subject::Sadie,
        )
    } else {
        (
            format!("A cat was seen by {}", camera.location),
            Subject::OtherCat,
        )
    }
}

fn noise_message(camera: &CameraEntities) -> String {
    format!("Cat noises were heard by {}", camera.location)
}

fn debounce_elapsed(last: Option<DateTime<Utc>>, at: DateTime<Utc>) -> bool {
    match last {
        Some(previous) => at - previous >= Duration::minutes(FOOD_BOWL_DEBOUNCE_MINUTES),
        None => true,
    }
}

fn hours_duration(hours: f64) -> Duration {
    Duration::milliseconds((hours * 3_600_000.0) as i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_717_999_200 + secs, 0).unwrap()
    }

    fn card() -> CatTimeline {
        CatTimeline::new(CatCardConfig::default())
    }

    fn base_states() -> StateMap {
        let mut states = StateMap::default();
        states.insert("binary_sensor.sadies_cat_flap_state", "off");
        states.insert("binary_sensor.sadies_food_bowl_state", "on");
        states.insert("binary_sensor.plc_kattcam_cat_occupancy", "off");
        states.insert("binary_sensor.plc_kattcam_2_cat_occupancy", "off");
        for camera in ["plc_kattcam", "plc_kattcam_2"] {
            for sound in ["cat", "caterwaul", "hiss", "meow"] {
                states.insert(format!("binary_sensor.{camera}_{sound}_sound"), "off");
            }
        }
        states
    }

    fn messages(card: &CatTimeline) -> Vec<&str> {
        card.events().iter().map(|event| event.message.as_str()).collect()
    }

    #[test]
    fn flap_fires_on_rising_edge_only() {
        let mut card = card();
        let mut states = base_states();
        card.attach(&states);

        states.insert("binary_sensor.sadies_cat_flap_state", "on");
        card.update_at(&states, at(0));
        assert_eq!(messages(&card), vec![FLAP_MESSAGE]);

        // Sustained "on" is not a new edge.
        card.update_at(&states, at(60));
        assert_eq!(card.events().len(), 1);

        states.insert("binary_sensor.sadies_cat_flap_state", "off");
        card.update_at(&states, at(120));
        states.insert("binary_sensor.sadies_cat_flap_state", "on");
        card.update_at(&states, at(180));
        assert_eq!(card.events().len(), 2);
    }

    #[test]
    fn absent_entity_leaves_cache_untouched() {
        let mut card = card();
        let mut states = StateMap::default();
        card.attach(&states);

        card.update_at(&states, at(0));
        assert!(card.events().is_empty());

        // First time the flap appears it is already "on": with no cached
        // previous value the edge fires.
        states.insert("binary_sensor.sadies_cat_flap_state", "on");
        card.update_at(&states, at(60));
        assert_eq!(card.events().len(), 1);
    }

    #[test]
    fn food_bowl_is_debounced_live() {
        let mut card = card();
        let mut states = base_states();
        card.attach(&states);

        states.insert("binary_sensor.sadies_food_bowl_state", "off");
        card.update_at(&states, at(0));
        assert_eq!(card.events().len(), 1);

        states.insert("binary_sensor.sadies_food_bowl_state", "on");
        card.update_at(&states, at(30));
        states.insert("binary_sensor.sadies_food_bowl_state", "off");
        card.update_at(&states, at(60));
        assert_eq!(card.events().len(), 1, "second edge inside the window");

        states.insert("binary_sensor.sadies_food_bowl_state", "on");
        card.update_at(&states, at(240));
        states.insert("binary_sensor.sadies_food_bowl_state", "off");
        card.update_at(&states, at(300));
        assert_eq!(card.events().len(), 2, "edge at the window boundary");
    }

    #[test]
    fn sighting_subject_follows_live_classification() {
        let mut card = card();
        let mut states = base_states();
        states.insert("sensor.plc_kattcam_cat_object_classification", "Sadie");
        card.attach(&states);

        states.insert("binary_sensor.plc_kattcam_cat_occupancy", "on");
        card.update_at(&states, at(0));
        assert_eq!(messages(&card), vec!["Sadie was seen by the hole under the fence"]);

        states.insert("binary_sensor.plc_kattcam_2_cat_occupancy", "on");
        card.update_at(&states, at(60));
        assert_eq!(
            messages(&card),
            vec![
                "A cat was seen by the back corner",
                "Sadie was seen by the hole under the fence",
            ]
        );

        let seen = &card.events()[0];
        assert_eq!(seen.source.as_ref().unwrap().camera.as_deref(), Some("plc_kattcam_2"));
    }

    #[test]
    fn sound_variants_share_one_message_per_camera() {
        let mut card = card();
        let mut states = base_states();
        card.attach(&states);

        states.insert("binary_sensor.plc_kattcam_hiss_sound", "on");
        states.insert("binary_sensor.plc_kattcam_meow_sound", "on");
        card.update_at(&states, at(0));

        assert_eq!(
            messages(&card),
            vec![
                "Cat noises were heard by the hole under the fence",
                "Cat noises were heard by the hole under the fence",
            ]
        );
    }

    #[test]
    fn sadie_events_use_sadie_colour_and_others_fall_back() {
        let config = CatCardConfig {
            sadie_icon_colour: Some("#ff0000".into()),
            other_cat_icon_colour: Some("#00ff00".into()),
            ..CatCardConfig::default()
        };
        let mut card = CatTimeline::new(config);
        let mut states = base_states();
        card.attach(&states);

        states.insert("binary_sensor.sadies_cat_flap_state", "on");
        states.insert("binary_sensor.plc_kattcam_cat_sound", "on");
        card.update_at(&states, at(0));

        let by_message: HashMap<&str, &str> = card
            .events()
            .iter()
            .map(|event| (event.message.as_str(), event.color.as_deref().unwrap()))
            .collect();
        assert_eq!(by_message[FLAP_MESSAGE], "#ff0000");
        assert_eq!(by_message["Cat noises were heard by the hole under the fence"], "#00ff00");
    }

    #[test]
    fn live_insertion_respects_the_raw_cap() {
        let config = CatCardConfig {
            max_events: Some(1),
            ..CatCardConfig::default()
        };
        let mut card = CatTimeline::new(config);
        let mut states = base_states();
        card.attach(&states);

        states.insert("binary_sensor.sadies_cat_flap_state", "on");
        card.update_at(&states, at(0));
        states.insert("binary_sensor.plc_kattcam_meow_sound", "on");
        card.update_at(&states, at(60));

        assert_eq!(
            messages(&card),
            vec!["Cat noises were heard by the hole under the fence"]
        );
    }

    #[test]
    fn history_request_covers_the_configured_window() {
        let card = card();
        let request = card.history_request(at(0));
        assert_eq!(request.end_time - request.start_time, Duration::hours(24));
        assert!(request.minimal_response);
        assert!(request
            .entity_ids
            .contains(&"sensor.plc_kattcam_cat_object_classification".to_string()));
        assert_eq!(request.entity_ids.len(), 14);

        let card = CatTimeline::new(CatCardConfig {
            max_time_ago: Some(6.0),
            ..CatCardConfig::default()
        });
        let request = card.history_request(at(0));
        assert_eq!(request.end_time - request.start_time, Duration::hours(6));
    }

    #[test]
    fn history_reconstruction_matches_live_edge_triggering() {
        let flap = "binary_sensor.sadies_cat_flap_state";
        let payload = json!({
            flap: [
                { "s": "off", "lc": at(0).timestamp() },
                { "s": "on", "lc": at(60).timestamp() },
                { "s": "off", "lc": at(120).timestamp() },
                { "s": "on", "lc": at(180).timestamp() }
            ]
        });

        let mut historical = card();
        historical.apply_history(&payload, &StateMap::default()).unwrap();

        let mut live = card();
        let mut states = base_states();
        live.attach(&states);
        for (state, secs) in [("off", 0), ("on", 60), ("off", 120), ("on", 180)] {
            states.insert(flap, state);
            live.update_at(&states, at(secs));
        }

        let historical_seen: Vec<_> = historical
            .events()
            .iter()
            .map(|event| (event.message.clone(), event.timestamp))
            .collect();
        let live_seen: Vec<_> = live
            .events()
            .iter()
            .map(|event| (event.message.clone(), event.timestamp))
            .collect();
        assert_eq!(historical_seen, live_seen);
    }

    #[test]
    fn history_bowl_debounce_is_reconstruction_local() {
        let bowl = "binary_sensor.sadies_food_bowl_state";
        let payload = json!({
            bowl: [
                { "s": "off", "lc": at(0).timestamp() },
                { "s": "on", "lc": at(30).timestamp() },
                { "s": "off", "lc": at(120).timestamp() },
                { "s": "on", "lc": at(200).timestamp() },
                { "s": "off", "lc": at(320).timestamp() }
            ]
        });

        let mut card = card();
        // A live bowl event just happened; the reconstruction must not be
        // suppressed by it.
        let mut states = base_states();
        card.attach(&states);
        states.insert(bowl, "off");
        card.update_at(&states, at(400));

        let added = card.apply_history(&payload, &StateMap::default()).unwrap();
        // Edges at 0s, 120s (suppressed), 320s: two historical events.
        assert_eq!(added, 2);
        assert_eq!(card.events().len(), 3);
    }

    #[test]
    fn history_change_detection_is_global_across_entities() {
        // Two occupancy samples of the same entity separated by another
        // entity's sample: the second sample counts as a change again even
        // though its own entity never left "on". Kept for compatibility with
        // the live card's history seeding.
        let occupancy = "binary_sensor.plc_kattcam_cat_occupancy";
        let flap = "binary_sensor.sadies_cat_flap_state";
        let payload = json!({
            occupancy: [
                { "s": "on", "lc": at(0).timestamp() },
                { "s": "on", "lc": at(120).timestamp() }
            ],
            flap: [
                { "s": "off", "lc": at(60).timestamp() }
            ]
        });

        let mut interleaved = card();
        let added = interleaved.apply_history(&payload, &StateMap::default()).unwrap();
        assert_eq!(added, 2);

        // Without the interleaved sample the duplicate is deduplicated.
        let payload = json!({
            occupancy: [
                { "s": "on", "lc": at(0).timestamp() },
                { "s": "on", "lc": at(120).timestamp() }
            ]
        });
        let mut plain = card();
        let added = plain.apply_history(&payload, &StateMap::default()).unwrap();
        assert_eq!(added, 1);
    }

    #[test]
    fn history_classification_falls_back_to_live_value() {
        let occupancy = "binary_sensor.plc_kattcam_cat_occupancy";
        let payload = json!({
            occupancy: [
                { "s": "on", "lc": at(0).timestamp() }
            ]
        });

        let mut states = StateMap::default();
        states.insert("sensor.plc_kattcam_cat_object_classification", "Sadie");

        let mut card = card();
        card.apply_history(&payload, &states).unwrap();
        assert_eq!(messages(&card), vec!["Sadie was seen by the hole under the fence"]);
    }

    #[test]
    fn history_classification_uses_value_at_trigger_time() {
        let occupancy = "binary_sensor.plc_kattcam_cat_occupancy";
        let classification = "sensor.plc_kattcam_cat_object_classification";
        let payload = json!({
            occupancy: [
                { "s": "on", "lc": at(100).timestamp() },
                { "s": "off", "lc": at(150).timestamp() },
                { "s": "on", "lc": at(300).timestamp() }
            ],
            classification: [
                { "s": "Sadie", "lc": at(0).timestamp() },
                { "s": "rat", "lc": at(200).timestamp() }
            ]
        });

        let mut card = card();
        card.apply_history(&payload, &StateMap::default()).unwrap();
        assert_eq!(
            messages(&card),
            vec![
                "A cat was seen by the hole under the fence",
                "Sadie was seen by the hole under the fence",
            ]
        );
    }

    #[test]
    fn config_deserializes_leniently() {
        let config: CatCardConfig = serde_json::from_value(json!({
            "max_events": 10,
            "max_time_ago": null,
            "sadie_icon_colour": ""
        }))
        .unwrap();
        assert_eq!(config.max_events, Some(10));
        assert_eq!(config.age_limit(), None);
        assert_eq!(config.sadie_colour(), DEFAULT_ICON_COLOR);
        assert_eq!(config.entities, CatEntities::default());
    }
}
