// Copyright 2026 the UISpeaker Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scripted [`AudioBackend`].
//!
//! [`FakeAudio`] records every fetch, gain change and started source. A
//! buffer is just the URL it was fetched from, so assertions read as lists
//! of URLs. Fetches can be held open to exercise in-flight coalescing, made
//! to fail, or answered with a canned body.

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::rc::Rc;

use futures::channel::oneshot;
use futures::executor::LocalSpawner;
use futures::future::LocalBoxFuture;
use futures::task::LocalSpawnExt as _;
use uispeaker_core::audio::AudioBackend;
use uispeaker_core::error::{LoadError, PlaybackError};
use uispeaker_core::fetch::Fetcher;

#[derive(Default)]
struct Script {
    fetches: RefCell<Vec<String>>,
    failing: RefCell<BTreeSet<String>>,
    bodies: RefCell<BTreeMap<String, Vec<u8>>>,
    holding: Cell<bool>,
    held: RefCell<Vec<oneshot::Sender<()>>>,
    contexts: Cell<u32>,
    closed: Cell<u32>,
    resumes: Cell<u32>,
    gains: RefCell<Vec<f32>>,
    started: RefCell<Vec<String>>,
}

/// Recording audio backend. Clones share one script.
#[derive(Clone)]
pub struct FakeAudio {
    script: Rc<Script>,
    spawner: LocalSpawner,
}

impl fmt::Debug for FakeAudio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FakeAudio")
            .field("fetches", &self.script.fetches.borrow().len())
            .field("held", &self.script.held.borrow().len())
            .field("started", &self.script.started.borrow().len())
            .finish_non_exhaustive()
    }
}

impl FakeAudio {
    /// Creates a backend whose spawned tasks run on `spawner`.
    #[must_use]
    pub fn new(spawner: LocalSpawner) -> Self {
        Self {
            script: Rc::default(),
            spawner,
        }
    }

    /// Every URL fetched so far, in order.
    #[must_use]
    pub fn fetches(&self) -> Vec<String> {
        self.script.fetches.borrow().clone()
    }

    /// Number of fetches issued.
    #[must_use]
    pub fn fetch_count(&self) -> usize {
        self.script.fetches.borrow().len()
    }

    /// Makes fetches of `url` answer 404.
    pub fn fail(&self, url: &str) {
        self.script.failing.borrow_mut().insert(url.into());
    }

    /// Answers fetches of `url` with `body`.
    pub fn serve(&self, url: &str, body: &str) {
        self.script
            .bodies
            .borrow_mut()
            .insert(url.into(), body.as_bytes().to_vec());
    }

    /// While `true`, new fetches stay pending until
    /// [`release_fetches`](Self::release_fetches).
    pub fn hold_fetches(&self, hold: bool) {
        self.script.holding.set(hold);
    }

    /// Lets every held fetch complete.
    pub fn release_fetches(&self) {
        for gate in self.script.held.borrow_mut().drain(..) {
            let _ = gate.send(());
        }
    }

    /// URLs of every started source, in order.
    #[must_use]
    pub fn started(&self) -> Vec<String> {
        self.script.started.borrow().clone()
    }

    /// Number of contexts created.
    #[must_use]
    pub fn contexts_created(&self) -> u32 {
        self.script.contexts.get()
    }

    /// Number of contexts closed.
    #[must_use]
    pub fn contexts_closed(&self) -> u32 {
        self.script.closed.get()
    }

    /// Number of resume attempts.
    #[must_use]
    pub fn resumes(&self) -> u32 {
        self.script.resumes.get()
    }

    /// The last gain value written, if any.
    #[must_use]
    pub fn last_gain(&self) -> Option<f32> {
        self.script.gains.borrow().last().copied()
    }
}

impl Fetcher for FakeAudio {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, LoadError> {
        self.script.fetches.borrow_mut().push(url.into());
        if self.script.holding.get() {
            let (gate, wait) = oneshot::channel();
            self.script.held.borrow_mut().push(gate);
            // A dropped gate releases the fetch as well.
            let _ = wait.await;
        }
        if self.script.failing.borrow().contains(url) {
            return Err(LoadError::Status {
                url: url.into(),
                status: 404,
            });
        }
        if let Some(body) = self.script.bodies.borrow().get(url) {
            return Ok(body.clone());
        }
        Ok(url.as_bytes().to_vec())
    }
}

impl AudioBackend for FakeAudio {
    type Context = u32;
    type Gain = u32;
    type Buffer = String;

    fn create_context(&self) -> Result<(u32, u32), LoadError> {
        let id = self.script.contexts.get() + 1;
        self.script.contexts.set(id);
        Ok((id, id))
    }

    fn resume(&self, _context: &u32) {
        self.script.resumes.set(self.script.resumes.get() + 1);
    }

    async fn decode(&self, _context: &u32, url: &str, _bytes: Vec<u8>) -> Result<String, LoadError> {
        Ok(url.into())
    }

    fn set_gain(&self, _gain: &u32, value: f32) {
        self.script.gains.borrow_mut().push(value);
    }

    fn start(&self, _context: &u32, _gain: &u32, buffer: &String) -> Result<(), PlaybackError> {
        self.script.started.borrow_mut().push(buffer.clone());
        Ok(())
    }

    fn close(&self, _context: u32) {
        self.script.closed.set(self.script.closed.get() + 1);
    }

    fn spawn(&self, task: LocalBoxFuture<'static, ()>) {
        if let Err(err) = self.spawner.spawn_local(task) {
            tracing::warn!(?err, "failed to spawn audio task");
        }
    }
}
