// Copyright 2026 the UISpeaker Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Script-tag build of uispeaker.
//!
//! Loading this module creates one page-wide engine and initializes it on
//! `document.body` as soon as the DOM is ready. The free functions below
//! forward to that engine:
//!
//! ```html
//! <script type="module">
//!   import init, * as UISpeaker from "./uispeaker_global.js";
//!   await init();
//!   UISpeaker.volume(0.5);
//! </script>
//! <button data-uispeaker="click">Save</button>
//! ```

#![cfg_attr(
    not(target_arch = "wasm32"),
    allow(dead_code, reason = "the entry point only runs in the browser")
)]

use uispeaker_web::UiSpeaker;
use wasm_bindgen::JsCast as _;
use wasm_bindgen::prelude::*;
use web_sys::Element;

/// Version of the script-tag API.
pub const VERSION: &str = uispeaker_core::VERSION;

thread_local! {
    static SPEAKER: UiSpeaker = UiSpeaker::new(JsValue::UNDEFINED);
}

fn with_speaker<R>(f: impl FnOnce(&UiSpeaker) -> R) -> R {
    SPEAKER.with(f)
}

/// Module start: installs console logging and schedules auto-init.
#[cfg_attr(all(target_arch = "wasm32", not(test)), wasm_bindgen(start))]
pub fn start() {
    uispeaker_web::install_logging(None);

    let Some(document) = web_sys::window().and_then(|w| w.document()) else {
        tracing::warn!("no document; auto-init skipped");
        return;
    };
    if document.ready_state() != "loading" {
        init(None);
        return;
    }
    let ready = Closure::<dyn FnMut()>::new(|| init(None));
    if let Err(err) = document
        .add_event_listener_with_callback("DOMContentLoaded", ready.as_ref().unchecked_ref())
    {
        tracing::warn!(?err, "failed to schedule auto-init");
        return;
    }
    // Fires once per page load; the closure lives as long as the page.
    ready.forget();
}

/// Binds `root` (default `document.body`). Idempotent.
#[wasm_bindgen]
pub fn init(root: Option<Element>) {
    with_speaker(|s| s.init(root));
}

/// Plays a sound by name or URL.
#[wasm_bindgen]
pub fn play(name: &str) {
    with_speaker(|s| s.play(name));
}

/// Sets the volume, clamped to `[0, 1]`.
#[wasm_bindgen]
pub fn volume(volume: f32) {
    with_speaker(|s| s.volume(volume));
}

/// Returns the stored volume.
#[wasm_bindgen(js_name = getVolume)]
pub fn get_volume() -> f32 {
    with_speaker(UiSpeaker::get_volume)
}

/// Silences output.
#[wasm_bindgen]
pub fn mute() {
    with_speaker(UiSpeaker::mute);
}

/// Restores output at the stored volume.
#[wasm_bindgen]
pub fn unmute() {
    with_speaker(UiSpeaker::unmute);
}

/// Returns `true` while muted.
#[wasm_bindgen(js_name = isMuted)]
pub fn is_muted() -> bool {
    with_speaker(UiSpeaker::is_muted)
}

/// Registers a custom sound from a URL string or an entry object.
#[wasm_bindgen]
pub fn register(name: &str, entry: JsValue) {
    with_speaker(|s| s.register(name, entry));
}

/// Removes a custom sound, returning whether it existed.
#[wasm_bindgen]
pub fn unregister(name: &str) -> bool {
    with_speaker(|s| s.unregister(name))
}

/// Sets the base URL for builtin and manifest files.
#[wasm_bindgen(js_name = setCdnBase)]
pub fn set_cdn_base(base: &str) {
    with_speaker(|s| s.set_cdn_base(base));
}

/// Every known sound name, sorted.
#[wasm_bindgen]
pub fn sounds() -> Vec<String> {
    with_speaker(UiSpeaker::sounds)
}

/// Releases every binding and closes audio. [`init`] may be called again.
#[wasm_bindgen]
pub fn destroy() {
    with_speaker(UiSpeaker::destroy);
}

/// Library version.
#[wasm_bindgen]
pub fn version() -> String {
    VERSION.into()
}
