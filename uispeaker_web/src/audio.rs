// Copyright 2026 the UISpeaker Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Web Audio [`AudioBackend`].
//!
//! Fetching goes through `window.fetch`, decoding through
//! `decodeAudioData`. Every play creates a fresh `AudioBufferSourceNode`
//! connected to the shared `GainNode`; sources are one-shot and are never
//! reused.

use futures::future::LocalBoxFuture;
use js_sys::{ArrayBuffer, Uint8Array};
use uispeaker_core::audio::AudioBackend;
use uispeaker_core::error::{LoadError, PlaybackError};
use uispeaker_core::fetch::Fetcher;
use wasm_bindgen::JsCast as _;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;
use web_sys::{AudioBuffer, AudioContext, AudioContextState, GainNode, Response};

/// [`AudioBackend`] over the browser's Web Audio API.
#[derive(Clone, Copy, Debug, Default)]
pub struct WebAudio;

impl Fetcher for WebAudio {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, LoadError> {
        let fetch_error = |err: &JsValue| LoadError::Fetch {
            url: url.into(),
            reason: describe(err),
        };
        let window = web_sys::window().ok_or_else(|| LoadError::Fetch {
            url: url.into(),
            reason: "no window".into(),
        })?;

        let response: Response = JsFuture::from(window.fetch_with_str(url))
            .await
            .map_err(|e| fetch_error(&e))?
            .dyn_into()
            .map_err(|e| fetch_error(&e))?;
        if !response.ok() {
            return Err(LoadError::Status {
                url: url.into(),
                status: response.status(),
            });
        }

        let body = response.array_buffer().map_err(|e| fetch_error(&e))?;
        let body = JsFuture::from(body).await.map_err(|e| fetch_error(&e))?;
        Ok(Uint8Array::new(&body).to_vec())
    }
}

impl AudioBackend for WebAudio {
    type Context = AudioContext;
    type Gain = GainNode;
    type Buffer = AudioBuffer;

    fn create_context(&self) -> Result<(AudioContext, GainNode), LoadError> {
        let context_error = |err: JsValue| LoadError::Context {
            reason: describe(&err),
        };
        let context = AudioContext::new().map_err(context_error)?;
        let gain = context.create_gain().map_err(context_error)?;
        gain.connect_with_audio_node(&context.destination())
            .map_err(context_error)?;
        Ok((context, gain))
    }

    fn resume(&self, context: &AudioContext) {
        if context.state() != AudioContextState::Suspended {
            return;
        }
        if let Ok(promise) = context.resume() {
            // Autoplay policy may keep the context suspended until a gesture.
            wasm_bindgen_futures::spawn_local(async move {
                let _ = JsFuture::from(promise).await;
            });
        }
    }

    async fn decode(
        &self,
        context: &AudioContext,
        url: &str,
        bytes: Vec<u8>,
    ) -> Result<AudioBuffer, LoadError> {
        let decode_error = |err: &JsValue| LoadError::Decode {
            url: url.into(),
            reason: describe(err),
        };
        let data: ArrayBuffer = Uint8Array::from(bytes.as_slice()).buffer();
        let promise = context
            .decode_audio_data(&data)
            .map_err(|e| decode_error(&e))?;
        JsFuture::from(promise)
            .await
            .map_err(|e| decode_error(&e))?
            .dyn_into()
            .map_err(|e| decode_error(&e))
    }

    fn set_gain(&self, gain: &GainNode, value: f32) {
        gain.gain().set_value(value);
    }

    fn start(
        &self,
        context: &AudioContext,
        gain: &GainNode,
        buffer: &AudioBuffer,
    ) -> Result<(), PlaybackError> {
        let playback_error = |err: JsValue| PlaybackError {
            reason: describe(&err),
        };
        let source = context.create_buffer_source().map_err(playback_error)?;
        source.set_buffer(Some(buffer));
        source.connect_with_audio_node(gain).map_err(playback_error)?;
        source.start().map_err(playback_error)
    }

    fn close(&self, context: AudioContext) {
        if let Ok(promise) = context.close() {
            wasm_bindgen_futures::spawn_local(async move {
                let _ = JsFuture::from(promise).await;
            });
        }
    }

    fn spawn(&self, task: LocalBoxFuture<'static, ()>) {
        wasm_bindgen_futures::spawn_local(task);
    }
}

/// Best-effort text for a thrown JS value.
pub(crate) fn describe(value: &JsValue) -> String {
    if let Some(text) = value.as_string() {
        return text;
    }
    if let Some(error) = value.dyn_ref::<js_sys::Error>() {
        return error.message().into();
    }
    format!("{value:?}")
}
