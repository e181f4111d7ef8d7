// Copyright 2026 the UISpeaker Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Conversions between plain JS objects and core types.

use js_sys::{Object, Reflect};
use uispeaker_core::{SoundEntry, SpeakerConfig};
use wasm_bindgen::JsCast as _;
use wasm_bindgen::prelude::*;
use web_sys::Element;

/// Reads `{cdnBase, volume, muted, root, inputDebounce, mousemoveThrottle}`.
///
/// Missing, `null` or mistyped fields keep their defaults. A non-object
/// yields the defaults.
pub fn config_from_js(options: &JsValue) -> SpeakerConfig<Element> {
    let mut config = SpeakerConfig::default();
    if let Some(base) = field(options, "cdnBase").and_then(|v| v.as_string()) {
        config.cdn_base = base;
    }
    if let Some(volume) = field(options, "volume").and_then(|v| v.as_f64()) {
        #[expect(
            clippy::cast_possible_truncation,
            reason = "volume is clamped to [0, 1] downstream"
        )]
        let volume = volume as f32;
        config.volume = volume;
    }
    if let Some(muted) = field(options, "muted").and_then(|v| v.as_bool()) {
        config.muted = muted;
    }
    if let Some(root) = field(options, "root").and_then(|v| v.dyn_into::<Element>().ok()) {
        config.root = Some(root);
    }
    if let Some(ms) = field(options, "inputDebounce").and_then(|v| millis(&v)) {
        config.input_debounce_ms = ms;
    }
    if let Some(ms) = field(options, "mousemoveThrottle").and_then(|v| millis(&v)) {
        config.mousemove_throttle_ms = ms;
    }
    config
}

/// Reads a sound entry from a URL string or a
/// `{url, defaultEvent?, category?, description?, duration?}` object.
pub fn entry_from_js(value: &JsValue) -> Option<SoundEntry> {
    if let Some(url) = value.as_string() {
        return Some(SoundEntry::new(url));
    }
    let url = field(value, "url")?.as_string()?;
    Some(SoundEntry {
        url,
        default_event: field(value, "defaultEvent")
            .and_then(|v| v.as_string())
            .and_then(|e| e.parse().ok()),
        category: field(value, "category").and_then(|v| v.as_string()),
        description: field(value, "description").and_then(|v| v.as_string()),
        duration: field(value, "duration").and_then(|v| v.as_f64()),
    })
}

/// Writes `entry` as a plain object, with its `name`.
pub fn entry_to_js(name: &str, entry: &SoundEntry) -> Object {
    let object = Object::new();
    set(&object, "name", &JsValue::from_str(name));
    set(&object, "url", &JsValue::from_str(&entry.url));
    if let Some(event) = entry.default_event {
        set(&object, "defaultEvent", &JsValue::from_str(event.as_str()));
    }
    if let Some(category) = &entry.category {
        set(&object, "category", &JsValue::from_str(category));
    }
    if let Some(description) = &entry.description {
        set(&object, "description", &JsValue::from_str(description));
    }
    if let Some(duration) = entry.duration {
        set(&object, "duration", &JsValue::from_f64(duration));
    }
    object
}

/// Returns `object[key]` unless it is absent, `undefined` or `null`.
fn field(object: &JsValue, key: &str) -> Option<JsValue> {
    if !object.is_object() {
        return None;
    }
    Reflect::get(object, &JsValue::from_str(key))
        .ok()
        .filter(|v| !v.is_undefined() && !v.is_null())
}

fn set(object: &Object, key: &str, value: &JsValue) {
    // Defining a property on a fresh ordinary object cannot fail.
    let _ = Reflect::set(object, &JsValue::from_str(key), value);
}

/// Non-negative finite milliseconds.
fn millis(value: &JsValue) -> Option<u32> {
    value.as_f64().and_then(clamp_millis)
}

/// Truncates `ms` to whole milliseconds, saturating at `u32::MAX`. Negative
/// and non-finite values are rejected.
fn clamp_millis(ms: f64) -> Option<u32> {
    if !ms.is_finite() || ms < 0.0 {
        return None;
    }
    #[expect(
        clippy::cast_possible_truncation,
        reason = "clamped to the u32 range first"
    )]
    let ms = ms.min(f64::from(u32::MAX)) as u32;
    Some(ms)
}
