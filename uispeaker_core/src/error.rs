// Copyright 2026 the UISpeaker Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Error types.
//!
//! None of these escape the [`Speaker`](crate::speaker::Speaker) facade: sound
//! is a non-critical enhancement, so every failure path ends in a log line and
//! silence. They exist so backends and the pipeline can report *why*.

use alloc::string::String;

use thiserror::Error;

/// Failure to turn a URL into a playable buffer.
///
/// `Clone` because a single fetch+decode result is fanned out to every
/// caller that was coalesced onto it.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum LoadError {
    /// The server answered with a non-2xx status.
    #[error("failed to load sound from {url} ({status})")]
    Status {
        /// Requested URL.
        url: String,
        /// HTTP status code.
        status: u16,
    },
    /// The request itself failed (network, CORS, aborted).
    #[error("failed to fetch {url}: {reason}")]
    Fetch {
        /// Requested URL.
        url: String,
        /// Platform description of the failure.
        reason: String,
    },
    /// The bytes arrived but could not be decoded as audio.
    #[error("failed to decode {url}: {reason}")]
    Decode {
        /// Requested URL.
        url: String,
        /// Platform description of the failure.
        reason: String,
    },
    /// The audio output context could not be created.
    #[error("audio context unavailable: {reason}")]
    Context {
        /// Platform description of the failure.
        reason: String,
    },
    /// The in-flight load this caller was waiting on went away before
    /// settling (pipeline destroyed, or its driver dropped).
    #[error("load of {url} was abandoned")]
    Abandoned {
        /// Requested URL.
        url: String,
    },
}

/// A decoded buffer could not be started.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("failed to start playback: {reason}")]
pub struct PlaybackError {
    /// Platform description of the failure.
    pub reason: String,
}

/// Failure to load a remote registry manifest.
#[derive(Debug, Error)]
pub enum ManifestError {
    /// The manifest could not be fetched.
    #[error(transparent)]
    Fetch(#[from] LoadError),
    /// The body was not valid UTF-8.
    #[error("manifest is not valid UTF-8")]
    Encoding,
    /// The body did not match the manifest schema.
    #[error("manifest is not valid JSON: {0}")]
    Parse(serde_json::Error),
}

/// An event override attribute named a category that does not exist.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("unknown event category {0:?}")]
pub struct UnknownCategory(pub String);
