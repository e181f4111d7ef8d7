// Copyright 2026 the UISpeaker Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Cached audio playback.
//!
//! [`AudioPipeline`] sits between the facade and an [`AudioBackend`]. It owns
//! the output context and its shared gain node, the decoded-buffer cache, the
//! in-flight load map and the volume/mute state.
//!
//! ## Loading
//!
//! [`load`](AudioPipeline::load) is check, then register, then await:
//!
//! 1. A cached buffer is returned immediately.
//! 2. If a load for the same URL is in flight, the caller queues a waiter and
//!    receives the leader's result.
//! 3. Otherwise the caller becomes the leader: it marks the URL in flight,
//!    fetches and decodes, caches on success, then settles every waiter.
//!
//! The in-flight marker is removed on success, on failure, and when the
//! leader's future is dropped. Failures are never cached.
//!
//! ## Teardown
//!
//! [`destroy`](AudioPipeline::destroy) closes the context and drops the cache
//! and in-flight map. A generation counter keeps loads started before the
//! teardown from writing into the fresh state that follows it.

use alloc::boxed::Box;
use alloc::collections::BTreeMap;
use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec::Vec;
use core::cell::RefCell;
use core::fmt;

use futures::channel::oneshot;
use futures::future::LocalBoxFuture;

use crate::error::{LoadError, PlaybackError};
use crate::fetch::Fetcher;

/// Platform audio operations.
///
/// The browser implementation wraps Web Audio; tests use a scripted fake.
#[allow(
    async_fn_in_trait,
    reason = "single-threaded host; futures are never sent across threads"
)]
pub trait AudioBackend: Fetcher {
    /// The audio output context.
    type Context: Clone;
    /// The shared gain node every source is routed through.
    type Gain: Clone;
    /// A decoded, playable buffer.
    type Buffer: Clone;

    /// Creates an output context with a gain node connected to its
    /// destination.
    fn create_context(&self) -> Result<(Self::Context, Self::Gain), LoadError>;

    /// Resumes `context` if it is suspended. Best effort; failures are
    /// swallowed.
    fn resume(&self, context: &Self::Context);

    /// Decodes the body fetched from `url` into a buffer.
    async fn decode(
        &self,
        context: &Self::Context,
        url: &str,
        bytes: Vec<u8>,
    ) -> Result<Self::Buffer, LoadError>;

    /// Sets the gain node's value.
    fn set_gain(&self, gain: &Self::Gain, value: f32);

    /// Starts a fresh one-shot source playing `buffer` through `gain`.
    fn start(
        &self,
        context: &Self::Context,
        gain: &Self::Gain,
        buffer: &Self::Buffer,
    ) -> Result<(), PlaybackError>;

    /// Closes `context`. Best effort.
    fn close(&self, context: Self::Context);

    /// Runs `task` to completion on the host's event loop.
    fn spawn(&self, task: LocalBoxFuture<'static, ()>);
}

type Waiter<B> = oneshot::Sender<Result<B, LoadError>>;

struct PipelineState<A: AudioBackend> {
    output: Option<(A::Context, A::Gain)>,
    cache: BTreeMap<String, A::Buffer>,
    loading: BTreeMap<String, Vec<Waiter<A::Buffer>>>,
    volume: f32,
    muted: bool,
    generation: u64,
}

impl<A: AudioBackend> PipelineState<A> {
    fn effective_gain(&self) -> f32 {
        if self.muted { 0.0 } else { self.volume }
    }
}

struct PipelineInner<A: AudioBackend> {
    backend: A,
    state: RefCell<PipelineState<A>>,
}

/// Volume-controlled, caching playback over an [`AudioBackend`].
///
/// Cloning yields another handle to the same pipeline.
pub struct AudioPipeline<A: AudioBackend> {
    inner: Rc<PipelineInner<A>>,
}

impl<A: AudioBackend> Clone for AudioPipeline<A> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<A: AudioBackend> fmt::Debug for AudioPipeline<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.borrow();
        f.debug_struct("AudioPipeline")
            .field("has_context", &state.output.is_some())
            .field("cached", &state.cache.len())
            .field("loading", &state.loading.len())
            .field("volume", &state.volume)
            .field("muted", &state.muted)
            .field("generation", &state.generation)
            .finish_non_exhaustive()
    }
}

impl<A: AudioBackend> AudioPipeline<A> {
    /// Creates a pipeline. No context is created until the first load.
    ///
    /// `volume` is clamped to `[0, 1]`; NaN selects full volume.
    pub fn new(backend: A, volume: f32, muted: bool) -> Self {
        Self {
            inner: Rc::new(PipelineInner {
                backend,
                state: RefCell::new(PipelineState {
                    output: None,
                    cache: BTreeMap::new(),
                    loading: BTreeMap::new(),
                    volume: sanitize_volume(volume).unwrap_or(1.0),
                    muted,
                    generation: 0,
                }),
            }),
        }
    }

    /// Returns the backend.
    #[must_use]
    pub fn backend(&self) -> &A {
        &self.inner.backend
    }

    /// Sets the volume, clamped to `[0, 1]`. Applied immediately unless
    /// muted. NaN is ignored.
    pub fn set_volume(&self, volume: f32) {
        let Some(volume) = sanitize_volume(volume) else {
            tracing::warn!("ignoring NaN volume");
            return;
        };
        let mut state = self.inner.state.borrow_mut();
        state.volume = volume;
        if !state.muted
            && let Some((_, gain)) = &state.output
        {
            self.inner.backend.set_gain(gain, volume);
        }
    }

    /// Returns the stored volume, which survives muting.
    #[must_use]
    pub fn volume(&self) -> f32 {
        self.inner.state.borrow().volume
    }

    /// Silences output without touching the stored volume.
    pub fn mute(&self) {
        self.set_muted(true);
    }

    /// Restores output at the stored volume.
    pub fn unmute(&self) {
        self.set_muted(false);
    }

    /// Returns `true` while muted.
    #[must_use]
    pub fn is_muted(&self) -> bool {
        self.inner.state.borrow().muted
    }

    /// Returns `true` once a context exists.
    #[must_use]
    pub fn has_context(&self) -> bool {
        self.inner.state.borrow().output.is_some()
    }

    /// Number of cached buffers.
    #[must_use]
    pub fn cached_count(&self) -> usize {
        self.inner.state.borrow().cache.len()
    }

    /// Returns `true` if a buffer for `url` is cached.
    #[must_use]
    pub fn is_cached(&self, url: &str) -> bool {
        self.inner.state.borrow().cache.contains_key(url)
    }

    /// Number of URLs with a load in flight.
    #[must_use]
    pub fn loading_count(&self) -> usize {
        self.inner.state.borrow().loading.len()
    }

    fn set_muted(&self, muted: bool) {
        let mut state = self.inner.state.borrow_mut();
        state.muted = muted;
        let value = state.effective_gain();
        if let Some((_, gain)) = &state.output {
            self.inner.backend.set_gain(gain, value);
        }
    }

    /// Returns the output context, creating it on first use.
    fn output(&self) -> Result<(A::Context, A::Gain), LoadError> {
        if let Some(output) = self.inner.state.borrow().output.clone() {
            return Ok(output);
        }
        let (context, gain) = self.inner.backend.create_context()?;
        let mut state = self.inner.state.borrow_mut();
        self.inner.backend.set_gain(&gain, state.effective_gain());
        state.output = Some((context.clone(), gain.clone()));
        tracing::debug!("audio context created");
        Ok((context, gain))
    }

    /// Returns the decoded buffer for `url`, fetching and decoding at most
    /// once across concurrent callers.
    pub async fn load(&self, url: &str) -> Result<A::Buffer, LoadError> {
        let (context, _) = self.output()?;

        let waiter = {
            let mut state = self.inner.state.borrow_mut();
            if let Some(buffer) = state.cache.get(url) {
                return Ok(buffer.clone());
            }
            match state.loading.get_mut(url) {
                Some(waiters) => {
                    let (tx, rx) = oneshot::channel();
                    waiters.push(tx);
                    Some(rx)
                }
                None => {
                    state.loading.insert(url.into(), Vec::new());
                    None
                }
            }
        };

        if let Some(rx) = waiter {
            return rx
                .await
                .unwrap_or_else(|_| Err(LoadError::Abandoned { url: url.into() }));
        }

        let guard = InFlight {
            inner: &self.inner,
            url,
            generation: self.inner.state.borrow().generation,
            settled: false,
        };
        let result = self.fetch_and_decode(&context, url).await;
        guard.settle(&result);
        result
    }

    async fn fetch_and_decode(
        &self,
        context: &A::Context,
        url: &str,
    ) -> Result<A::Buffer, LoadError> {
        let bytes = self.inner.backend.fetch(url).await?;
        self.inner.backend.decode(context, url, bytes).await
    }

    /// Loads and plays `url`. Failures are logged and swallowed.
    ///
    /// A muted pipeline skips loading entirely.
    pub async fn play(&self, url: &str) {
        if self.is_muted() {
            return;
        }
        let (context, _) = match self.output() {
            Ok(output) => output,
            Err(err) => {
                tracing::warn!(%err, "cannot play sound");
                return;
            }
        };
        self.inner.backend.resume(&context);

        let generation = self.inner.state.borrow().generation;
        let buffer = match self.load(url).await {
            Ok(buffer) => buffer,
            Err(err) => {
                tracing::warn!(%err, "cannot play sound");
                return;
            }
        };

        let output = {
            let state = self.inner.state.borrow();
            if state.generation != generation {
                return;
            }
            state.output.clone()
        };
        let Some((context, gain)) = output else {
            return;
        };
        if let Err(err) = self.inner.backend.start(&context, &gain, &buffer) {
            tracing::warn!(%err, url, "playback failed");
        }
    }

    /// Closes the context and drops cached and in-flight state.
    ///
    /// Later plays create a new context.
    pub fn destroy(&self) {
        let output = {
            let mut state = self.inner.state.borrow_mut();
            state.cache.clear();
            state.loading.clear();
            state.generation += 1;
            state.output.take()
        };
        if let Some((context, _)) = output {
            self.inner.backend.close(context);
            tracing::debug!("audio context closed");
        }
    }
}

impl<A: AudioBackend + 'static> AudioPipeline<A> {
    /// Spawns [`play`](Self::play) for `url` on the backend's event loop.
    pub fn spawn_play(&self, url: String) {
        let pipeline = self.clone();
        self.inner
            .backend
            .spawn(Box::pin(async move { pipeline.play(&url).await }));
    }
}

/// In-flight marker owned by the leader of a load.
///
/// Dropping it unsettled (the leader's future was dropped) removes the marker;
/// queued waiters then observe [`LoadError::Abandoned`].
struct InFlight<'a, A: AudioBackend> {
    inner: &'a PipelineInner<A>,
    url: &'a str,
    generation: u64,
    settled: bool,
}

impl<A: AudioBackend> InFlight<'_, A> {
    fn settle(mut self, result: &Result<A::Buffer, LoadError>) {
        self.settled = true;
        let waiters = {
            let mut state = self.inner.state.borrow_mut();
            if state.generation != self.generation {
                return;
            }
            let waiters = state.loading.remove(self.url).unwrap_or_default();
            if let Ok(buffer) = result {
                state.cache.insert(self.url.into(), buffer.clone());
                tracing::debug!(url = self.url, "cached sound");
            }
            waiters
        };
        for waiter in waiters {
            // A waiter whose caller went away is not an error.
            let _ = waiter.send(result.clone());
        }
    }
}

impl<A: AudioBackend> Drop for InFlight<'_, A> {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        let mut state = self.inner.state.borrow_mut();
        if state.generation == self.generation {
            state.loading.remove(self.url);
        }
    }
}

fn sanitize_volume(volume: f32) -> Option<f32> {
    (!volume.is_nan()).then(|| volume.clamp(0.0, 1.0))
}
