// Copyright 2026 the UISpeaker Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Browser backend for uispeaker.
//!
//! This crate provides integration with browser APIs:
//!
//! - [`WebDom`]: [`DomHost`](uispeaker_core::dom::DomHost) over `web-sys`
//!   (event listeners, `MutationObserver`, `setTimeout`)
//! - [`WebAudio`]: [`AudioBackend`](uispeaker_core::audio::AudioBackend) over
//!   Web Audio (`fetch`, `decodeAudioData`, `GainNode`)
//! - [`UiSpeaker`]: the facade exported to JavaScript for bundler users
//! - [`logging`]: a `tracing` subscriber writing to the console

#![cfg_attr(
    not(target_arch = "wasm32"),
    allow(dead_code, reason = "the bindings only run in the browser")
)]

mod audio;
mod dom;
pub mod logging;
pub mod options;

use std::rc::Rc;

use js_sys::{Array, Promise};
use uispeaker_core::Speaker;
use wasm_bindgen::prelude::*;
use web_sys::Element;

pub use audio::WebAudio;
pub use dom::{WebDom, WebListener, WebTimer, WebWatcher};

/// The engine specialized to the browser.
pub type WebSpeaker = Speaker<WebDom, WebAudio>;

/// Installs console logging at `DEBUG` (`verbose`) or `WARN`.
///
/// Returns `false` if logging was already installed.
#[wasm_bindgen(js_name = installLogging)]
pub fn install_logging(verbose: Option<bool>) -> bool {
    let level = if verbose.unwrap_or(false) {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    logging::install(level)
}

/// Attribute-driven UI sound engine.
///
/// ```js
/// const speaker = new UiSpeaker({ volume: 0.6 });
/// speaker.init();
/// ```
#[wasm_bindgen]
#[derive(Debug)]
pub struct UiSpeaker {
    inner: Rc<WebSpeaker>,
    configured_root: bool,
}

#[wasm_bindgen]
impl UiSpeaker {
    /// Creates an engine from an options object. Nothing is bound until
    /// [`init`](Self::init).
    #[wasm_bindgen(constructor)]
    pub fn new(options: JsValue) -> Self {
        let config = options::config_from_js(&options);
        let configured_root = config.root.is_some();
        Self {
            inner: Rc::new(Speaker::new(Rc::new(WebDom::new()), WebAudio, config)),
            configured_root,
        }
    }

    /// Scans `root` (default: the configured root, then `document.body`)
    /// and starts observing it. Idempotent.
    pub fn init(&self, root: Option<Element>) {
        let root = match root {
            Some(root) => Some(root),
            None if self.configured_root => None,
            None => document_body(),
        };
        self.inner.init(root);
    }

    /// Plays a sound by name or URL.
    pub fn play(&self, name: &str) {
        self.inner.play(name);
    }

    /// Sets the volume, clamped to `[0, 1]`.
    pub fn volume(&self, volume: f32) {
        self.inner.volume(volume);
    }

    /// Returns the stored volume.
    #[wasm_bindgen(js_name = getVolume)]
    pub fn get_volume(&self) -> f32 {
        self.inner.get_volume()
    }

    /// Silences output.
    pub fn mute(&self) {
        self.inner.mute();
    }

    /// Restores output at the stored volume.
    pub fn unmute(&self) {
        self.inner.unmute();
    }

    /// Returns `true` while muted.
    #[wasm_bindgen(js_name = isMuted)]
    pub fn is_muted(&self) -> bool {
        self.inner.is_muted()
    }

    /// Registers a custom sound from a URL string or an entry object.
    pub fn register(&self, name: &str, entry: JsValue) {
        match options::entry_from_js(&entry) {
            Some(entry) => self.inner.register(name, entry),
            None => tracing::warn!(sound = name, "register: entry has no url"),
        }
    }

    /// Removes a custom sound, returning whether it existed.
    pub fn unregister(&self, name: &str) -> bool {
        self.inner.unregister(name)
    }

    /// Sets the base URL for builtin and manifest files.
    #[wasm_bindgen(js_name = setCdnBase)]
    pub fn set_cdn_base(&self, base: &str) {
        self.inner.set_cdn_base(base);
    }

    /// Returns the CDN base.
    #[wasm_bindgen(js_name = cdnBase)]
    pub fn cdn_base(&self) -> String {
        self.inner.cdn_base()
    }

    /// Every known sound name, sorted.
    pub fn sounds(&self) -> Vec<String> {
        self.inner.sounds()
    }

    /// Every known sound as `{name, url, defaultEvent?, ...}`.
    #[wasm_bindgen(js_name = soundDetails)]
    pub fn sound_details(&self) -> Array {
        self.inner
            .sound_details()
            .iter()
            .map(|(name, entry)| options::entry_to_js(name, entry))
            .collect()
    }

    /// The manifest version, or the builtin registry version.
    pub fn version(&self) -> String {
        self.inner.version()
    }

    /// Fetches a manifest and replaces the manifest layer. The promise
    /// always resolves; failures are logged.
    #[wasm_bindgen(js_name = loadManifest)]
    pub fn load_manifest(&self, url: String) -> Promise {
        let inner = Rc::clone(&self.inner);
        wasm_bindgen_futures::future_to_promise(async move {
            inner.load_manifest(&url).await;
            Ok(JsValue::UNDEFINED)
        })
    }

    /// Number of live element bindings.
    #[wasm_bindgen(js_name = boundCount)]
    pub fn bound_count(&self) -> usize {
        self.inner.bound_count()
    }

    /// Releases every binding and closes audio. `init` may be called again.
    pub fn destroy(&self) {
        self.inner.destroy();
    }
}

/// Crate version.
#[wasm_bindgen(js_name = libraryVersion)]
pub fn library_version() -> String {
    uispeaker_core::VERSION.into()
}

fn document_body() -> Option<Element> {
    let body = web_sys::window()?.document()?.body()?;
    Some(body.into())
}
