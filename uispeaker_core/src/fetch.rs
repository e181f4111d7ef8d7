// Copyright 2026 the UISpeaker Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Byte fetching.

use alloc::vec::Vec;

use crate::error::LoadError;

/// Fetches the body of a URL.
///
/// Implementations must map a non-2xx response to [`LoadError::Status`] and
/// must not impose a timeout of their own.
#[allow(
    async_fn_in_trait,
    reason = "single-threaded host; futures are never sent across threads"
)]
pub trait Fetcher {
    /// Fetches `url` and returns the full response body.
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, LoadError>;
}
