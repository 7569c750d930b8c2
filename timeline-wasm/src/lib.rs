//! Framework-neutral WASM <-> JavaScript bridge for the timeline cards.
//!
//! One exported wrapper per card. The embedding front end drives the
//! two-phase lifecycle (`attach`, then `update` per tick), runs the
//! `history_request` query against the host, and renders `render_payload`.

use chrono::Utc;
use serde_wasm_bindgen::{from_value, to_value};
use timeline_core::TimelineError;
use timeline_hass::{CatCardConfig, CatTimeline, ServerMonitor, ServerMonitorConfig, StateMap};
use wasm_bindgen::prelude::*;

fn install_panic_hook() {
    #[cfg(target_arch = "wasm32")]
    console_error_panic_hook::set_once();
}

fn parse_states(states: JsValue) -> Result<StateMap, JsValue> {
    from_value::<StateMap>(states)
        .map_err(|err| JsValue::from_str(&format!("could not read state map: {err}")))
}

fn parse_payload(payload: JsValue) -> Result<serde_json::Value, JsValue> {
    from_value::<serde_json::Value>(payload)
        .map_err(|err| JsValue::from_str(&format!("could not read history payload: {err}")))
}

fn format_timeline_error(err: TimelineError) -> String {
    format!("Timeline error: {err}")
}

#[wasm_bindgen]
pub struct CatCard {
    inner: CatTimeline,
}

#[wasm_bindgen]
impl CatCard {
    /// Build a card from the user's config object (or defaults).
    #[wasm_bindgen(constructor)]
    pub fn new(config: JsValue) -> Result<CatCard, JsValue> {
        install_panic_hook();

        let config = if config.is_undefined() || config.is_null() {
            CatCardConfig::default()
        } else {
            from_value::<CatCardConfig>(config)
                .map_err(|err| JsValue::from_str(&format!("could not read config: {err}")))?
        };
        Ok(CatCard {
            inner: CatTimeline::new(config),
        })
    }

    /// Seed edge detection from the first full state map.
    pub fn attach(&mut self, states: JsValue) -> Result<(), JsValue> {
        self.inner.attach(&parse_states(states)?);
        Ok(())
    }

    /// Live tick with the host's current state map.
    pub fn update(&mut self, states: JsValue) -> Result<(), JsValue> {
        self.inner.update(&parse_states(states)?);
        Ok(())
    }

    /// History query for the host's data layer.
    pub fn history_request(&self) -> Result<JsValue, JsValue> {
        to_value(&self.inner.history_request(Utc::now()))
            .map_err(|err| JsValue::from_str(&format!("could not serialize request: {err}")))
    }

    /// Fold a resolved history query into the timeline. Returns the number
    /// of reconstructed events.
    pub fn apply_history(&mut self, payload: JsValue, states: JsValue) -> Result<usize, JsValue> {
        let payload = parse_payload(payload)?;
        let states = parse_states(states)?;
        self.inner
            .apply_history(&payload, &states)
            .map_err(|err| JsValue::from_str(&format_timeline_error(err)))
    }

    /// Entries plus display parameters for the renderer.
    pub fn render_payload(&self) -> Result<JsValue, JsValue> {
        to_value(&self.inner.render_payload(Utc::now()))
            .map_err(|err| JsValue::from_str(&format!("could not serialize payload: {err}")))
    }
}

#[wasm_bindgen]
pub struct ServerMonitorCard {
    inner: ServerMonitor,
}

#[wasm_bindgen]
impl ServerMonitorCard {
    /// Build a card from the user's config object (or defaults).
    #[wasm_bindgen(constructor)]
    pub fn new(config: JsValue) -> Result<ServerMonitorCard, JsValue> {
        install_panic_hook();

        let config = if config.is_undefined() || config.is_null() {
            ServerMonitorConfig::default()
        } else {
            from_value::<ServerMonitorConfig>(config)
                .map_err(|err| JsValue::from_str(&format!("could not read config: {err}")))?
        };
        Ok(ServerMonitorCard {
            inner: ServerMonitor::new(config),
        })
    }

    /// Seed the previous-message cache from the first full state map.
    pub fn attach(&mut self, states: JsValue) -> Result<(), JsValue> {
        self.inner.attach(&parse_states(states)?);
        Ok(())
    }

    /// Live tick with the host's current state map.
    pub fn update(&mut self, states: JsValue) -> Result<(), JsValue> {
        self.inner.update(&parse_states(states)?);
        Ok(())
    }

    /// History query for the host's data layer, or null when the card's
    /// sensors are not configured.
    pub fn history_request(&self) -> Result<JsValue, JsValue> {
        to_value(&self.inner.history_request(Utc::now()))
            .map_err(|err| JsValue::from_str(&format!("could not serialize request: {err}")))
    }

    /// Fold a resolved history query into the timeline. Returns the number
    /// of reconstructed events.
    pub fn apply_history(&mut self, payload: JsValue, states: JsValue) -> Result<usize, JsValue> {
        let payload = parse_payload(payload)?;
        let states = parse_states(states)?;
        self.inner
            .apply_history(&payload, &states)
            .map_err(|err| JsValue::from_str(&format_timeline_error(err)))
    }

    /// Entries plus display parameters for the renderer.
    pub fn render_payload(&self) -> Result<JsValue, JsValue> {
        to_value(&self.inner.render_payload(Utc::now()))
            .map_err(|err| JsValue::from_str(&format!("could not serialize payload: {err}")))
    }
}
