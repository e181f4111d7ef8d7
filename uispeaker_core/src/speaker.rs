// Copyright 2026 the UISpeaker Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Public facade.
//!
//! A [`Speaker`] wires a [`SpeakerConfig`] into a [`SoundRegistry`], an
//! [`AudioPipeline`] and, once [`init`](Speaker::init) runs, a [`Scanner`].
//! Every operation is infallible from the caller's side: misses and failures
//! are logged and end in silence.

use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec::Vec;
use core::cell::RefCell;
use core::fmt;

use crate::audio::{AudioBackend, AudioPipeline};
use crate::binder::ShapeOptions;
use crate::category::EventCategory;
use crate::dom::DomHost;
use crate::registry::{DEFAULT_CDN_BASE, SoundEntry, SoundRegistry, fetch_manifest};
use crate::scanner::{Scanner, TriggerFactory};

/// Construction options for a [`Speaker`].
#[derive(Clone, Debug, PartialEq)]
pub struct SpeakerConfig<E> {
    /// Base URL for builtin and manifest files.
    pub cdn_base: String,
    /// Initial volume in `[0, 1]`.
    pub volume: f32,
    /// Start muted.
    pub muted: bool,
    /// Root scanned by [`Speaker::init`] when none is passed.
    pub root: Option<E>,
    /// Quiet period before an `input` binding fires, in ms.
    pub input_debounce_ms: u32,
    /// Minimum spacing between `mousemove` fires, in ms.
    pub mousemove_throttle_ms: u32,
}

impl<E> Default for SpeakerConfig<E> {
    fn default() -> Self {
        let shape = ShapeOptions::default();
        Self {
            cdn_base: DEFAULT_CDN_BASE.into(),
            volume: 1.0,
            muted: false,
            root: None,
            input_debounce_ms: shape.input_debounce_ms,
            mousemove_throttle_ms: shape.mousemove_throttle_ms,
        }
    }
}

impl<E> SpeakerConfig<E> {
    /// Sets the CDN base.
    #[must_use]
    pub fn with_cdn_base(mut self, base: impl Into<String>) -> Self {
        self.cdn_base = base.into();
        self
    }

    /// Sets the initial volume.
    #[must_use]
    pub fn with_volume(mut self, volume: f32) -> Self {
        self.volume = volume;
        self
    }

    /// Sets the initial mute state.
    #[must_use]
    pub fn with_muted(mut self, muted: bool) -> Self {
        self.muted = muted;
        self
    }

    /// Sets the default root.
    #[must_use]
    pub fn with_root(mut self, root: E) -> Self {
        self.root = Some(root);
        self
    }

    /// Sets the input debounce.
    #[must_use]
    pub fn with_input_debounce_ms(mut self, ms: u32) -> Self {
        self.input_debounce_ms = ms;
        self
    }

    /// Sets the mousemove throttle.
    #[must_use]
    pub fn with_mousemove_throttle_ms(mut self, ms: u32) -> Self {
        self.mousemove_throttle_ms = ms;
        self
    }

    fn shape_options(&self) -> ShapeOptions {
        ShapeOptions {
            input_debounce_ms: self.input_debounce_ms,
            mousemove_throttle_ms: self.mousemove_throttle_ms,
        }
    }
}

/// The sound feedback engine for one document.
pub struct Speaker<H: DomHost + 'static, A: AudioBackend + 'static> {
    host: Rc<H>,
    registry: Rc<RefCell<SoundRegistry>>,
    pipeline: AudioPipeline<A>,
    options: ShapeOptions,
    default_root: Option<H::Element>,
    scanner: RefCell<Option<Scanner<H>>>,
}

impl<H: DomHost + 'static, A: AudioBackend + 'static> fmt::Debug for Speaker<H, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Speaker")
            .field("registry", &self.registry.borrow())
            .field("pipeline", &self.pipeline)
            .field("options", &self.options)
            .field("scanner", &self.scanner.borrow())
            .finish_non_exhaustive()
    }
}

impl<H: DomHost + 'static, A: AudioBackend + 'static> Speaker<H, A> {
    /// Creates an uninitialized speaker. Nothing touches the document or the
    /// audio output until [`init`](Self::init) or [`play`](Self::play).
    pub fn new(host: Rc<H>, backend: A, config: SpeakerConfig<H::Element>) -> Self {
        let options = config.shape_options();
        Self {
            host,
            registry: Rc::new(RefCell::new(SoundRegistry::new(&config.cdn_base))),
            pipeline: AudioPipeline::new(backend, config.volume, config.muted),
            options,
            default_root: config.root,
            scanner: RefCell::new(None),
        }
    }

    /// Scans `root` (or the configured root) and starts observing it.
    ///
    /// A no-op once initialized. Without any root this logs and returns
    /// without initializing, so it can be retried.
    pub fn init(&self, root: Option<H::Element>) {
        if self.is_initialized() {
            return;
        }
        let Some(root) = root.or_else(|| self.default_root.clone()) else {
            tracing::warn!("no root element; init skipped");
            return;
        };
        let scanner = Scanner::new(Rc::clone(&self.host), root, self.options, self.trigger_factory());
        scanner.start();
        *self.scanner.borrow_mut() = Some(scanner);
    }

    /// Returns `true` between [`init`](Self::init) and
    /// [`destroy`](Self::destroy).
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.scanner.borrow().is_some()
    }

    /// Resolves and plays `name`.
    pub fn play(&self, name: &str) {
        play_named(&self.registry, &self.pipeline, name);
    }

    /// Sets the volume, clamped to `[0, 1]`.
    pub fn volume(&self, volume: f32) {
        self.pipeline.set_volume(volume);
    }

    /// Returns the stored volume.
    #[must_use]
    pub fn get_volume(&self) -> f32 {
        self.pipeline.volume()
    }

    /// Silences output.
    pub fn mute(&self) {
        self.pipeline.mute();
    }

    /// Restores output at the stored volume.
    pub fn unmute(&self) {
        self.pipeline.unmute();
    }

    /// Returns `true` while muted.
    #[must_use]
    pub fn is_muted(&self) -> bool {
        self.pipeline.is_muted()
    }

    /// Adds or replaces a custom sound.
    pub fn register(&self, name: impl Into<String>, entry: SoundEntry) {
        self.registry.borrow_mut().register(name, entry);
    }

    /// Removes a custom sound, returning whether it existed.
    pub fn unregister(&self, name: &str) -> bool {
        self.registry.borrow_mut().unregister(name)
    }

    /// Sets the base URL for builtin and manifest files.
    pub fn set_cdn_base(&self, base: &str) {
        self.registry.borrow_mut().set_cdn_base(base);
    }

    /// Returns the normalized CDN base.
    #[must_use]
    pub fn cdn_base(&self) -> String {
        self.registry.borrow().cdn_base().into()
    }

    /// Every known sound name, sorted.
    #[must_use]
    pub fn sounds(&self) -> Vec<String> {
        self.registry.borrow().list()
    }

    /// Every known sound name with its resolved entry.
    #[must_use]
    pub fn sound_details(&self) -> Vec<(String, SoundEntry)> {
        self.registry.borrow().list_detailed()
    }

    /// The manifest version, or the builtin registry version.
    #[must_use]
    pub fn version(&self) -> String {
        self.registry.borrow().version().into()
    }

    /// Fetches a manifest and replaces the manifest layer with it.
    ///
    /// On failure the layer is unchanged and the error is logged.
    pub async fn load_manifest(&self, url: &str) {
        match fetch_manifest(self.pipeline.backend(), url).await {
            Ok(manifest) => {
                let count = manifest.sounds.len();
                self.registry.borrow_mut().apply_manifest(manifest);
                tracing::debug!(url, count, "manifest loaded");
            }
            Err(err) => tracing::warn!(%err, url, "failed to load manifest"),
        }
    }

    /// Number of live element bindings.
    #[must_use]
    pub fn bound_count(&self) -> usize {
        self.scanner
            .borrow()
            .as_ref()
            .map_or(0, Scanner::bound_count)
    }

    /// Returns `(sound, category)` for a bound element.
    #[must_use]
    pub fn binding_of(&self, element: &H::Element) -> Option<(String, EventCategory)> {
        self.scanner.borrow().as_ref()?.binding_of(element)
    }

    /// Returns the audio pipeline.
    #[must_use]
    pub fn pipeline(&self) -> &AudioPipeline<A> {
        &self.pipeline
    }

    /// Stops observation, releases every binding and closes the audio
    /// context. [`init`](Self::init) may be called again afterwards.
    pub fn destroy(&self) {
        let scanner = self.scanner.borrow_mut().take();
        if let Some(scanner) = scanner {
            scanner.stop();
        }
        self.pipeline.destroy();
    }

    fn trigger_factory(&self) -> TriggerFactory {
        let registry = Rc::clone(&self.registry);
        let pipeline = self.pipeline.clone();
        Rc::new(move |name: &str, _category: EventCategory| {
            let registry = Rc::clone(&registry);
            let pipeline = pipeline.clone();
            let name = String::from(name);
            Rc::new(move || play_named(&registry, &pipeline, &name))
        })
    }
}

impl<H: DomHost + 'static, A: AudioBackend + 'static> Drop for Speaker<H, A> {
    fn drop(&mut self) {
        self.destroy();
    }
}

/// Resolves `name` at fire time, so later registrations take effect on
/// existing bindings.
fn play_named<A: AudioBackend + 'static>(
    registry: &RefCell<SoundRegistry>,
    pipeline: &AudioPipeline<A>,
    name: &str,
) {
    let resolved = registry.borrow().resolve(name);
    match resolved {
        Some(entry) => pipeline.spawn_play(entry.url),
        None => tracing::warn!(sound = name, "sound not found"),
    }
}
