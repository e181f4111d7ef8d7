// Copyright 2026 the UISpeaker Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Deterministic test rig for uispeaker.
//!
//! [`Rig`] wires a [`SyntheticDom`] and a [`FakeAudio`] into a
//! [`Speaker`], with a [`LocalPool`] standing in for the browser event loop.
//! Every driver method ([`dispatch`](Rig::dispatch), [`flush`](Rig::flush),
//! [`advance`](Rig::advance)) runs spawned playback tasks until they stall,
//! so assertions see a settled state.
//!
//! ```
//! use uispeaker_harness::Rig;
//!
//! let mut rig = Rig::new();
//! let body = rig.dom.body();
//! let button = rig.dom.add(body, "button", &[("data-uispeaker", "click")]);
//! rig.init();
//! rig.click(button);
//! assert_eq!(rig.played(), vec![rig.cdn_url("click.mp3")]);
//! ```

mod audio;
mod dom;

#[cfg(test)]
mod scenarios;

use std::fmt;
use std::rc::Rc;

use futures::executor::LocalPool;
use uispeaker_core::dom::Signal;
use uispeaker_core::{Speaker, SpeakerConfig};

pub use audio::FakeAudio;
pub use dom::{ListenerId, NodeId, SyntheticDom, TimerId, WatcherId};

/// A speaker over a synthetic document and scripted audio.
pub struct Rig {
    /// The document.
    pub dom: Rc<SyntheticDom>,
    /// The audio backend script.
    pub audio: FakeAudio,
    /// The engine under test.
    pub speaker: Speaker<SyntheticDom, FakeAudio>,
    pool: LocalPool,
}

impl fmt::Debug for Rig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rig")
            .field("dom", &self.dom)
            .field("audio", &self.audio)
            .field("speaker", &self.speaker)
            .finish_non_exhaustive()
    }
}

impl Default for Rig {
    fn default() -> Self {
        Self::new()
    }
}

impl Rig {
    /// A rig with default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(SpeakerConfig::default())
    }

    /// A rig built from `config`.
    #[must_use]
    pub fn with_config(config: SpeakerConfig<NodeId>) -> Self {
        let pool = LocalPool::new();
        let dom = Rc::new(SyntheticDom::new());
        let audio = FakeAudio::new(pool.spawner());
        let speaker = Speaker::new(Rc::clone(&dom), audio.clone(), config);
        Self {
            dom,
            audio,
            speaker,
            pool,
        }
    }

    /// Initializes the speaker on `<body>`.
    pub fn init(&mut self) {
        self.speaker.init(Some(self.dom.body()));
        self.run();
    }

    /// Runs spawned tasks until none can make progress.
    pub fn run(&mut self) {
        self.pool.run_until_stalled();
    }

    /// Delivers pending mutation records, then runs tasks.
    pub fn flush(&mut self) {
        self.dom.flush();
        self.run();
    }

    /// Advances the clock by `ms`, then runs tasks.
    pub fn advance(&mut self, ms: u32) {
        self.dom.advance(ms);
        self.run();
    }

    /// Fires `signal` on `node`, then runs tasks.
    pub fn dispatch(&mut self, node: NodeId, signal: Signal) {
        self.dom.dispatch(node, signal);
        self.run();
    }

    /// Clicks `node`.
    pub fn click(&mut self, node: NodeId) {
        self.dispatch(node, Signal::Click);
    }

    /// Plays `name` through the facade, then runs tasks.
    pub fn play(&mut self, name: &str) {
        self.speaker.play(name);
        self.run();
    }

    /// Loads a manifest to completion.
    pub fn load_manifest(&mut self, url: &str) {
        self.pool.run_until(self.speaker.load_manifest(url));
    }

    /// URLs of every sound started so far.
    #[must_use]
    pub fn played(&self) -> Vec<String> {
        self.audio.started()
    }

    /// The URL `file` resolves to under the current CDN base.
    #[must_use]
    pub fn cdn_url(&self, file: &str) -> String {
        format!("{}/{file}", self.speaker.cdn_base())
    }
}
