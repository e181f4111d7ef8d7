// Copyright 2026 the UISpeaker Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Interaction categories.
//!
//! An [`EventCategory`] decides which native signal(s) drive playback for a
//! bound element. Categories are either inferred from the element shape (see
//! [`element`](crate::element)) or named explicitly through the
//! `data-uispeaker-event` attribute.

use core::fmt;
use core::str::FromStr;

use serde::Deserialize;

use crate::error::UnknownCategory;

/// The fixed set of interaction classes a sound can be attached to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventCategory {
    /// Pointer activation.
    Click,
    /// Text entry, debounced.
    Input,
    /// Pointer enters the element.
    Hover,
    /// Pointer moves over the element, throttled.
    Mousemove,
    /// A toggle widget opens.
    Open,
    /// A toggle widget closes.
    Close,
    /// The element gains focus.
    Focus,
    /// The element loses focus.
    Blur,
    /// Positive notification; fires on click when bound to an element.
    Success,
    /// Error notification; fires on click when bound to an element.
    Error,
    /// Warning notification; fires on click when bound to an element.
    Warning,
}

impl EventCategory {
    /// Every category, in declaration order.
    pub const ALL: [Self; 11] = [
        Self::Click,
        Self::Input,
        Self::Hover,
        Self::Mousemove,
        Self::Open,
        Self::Close,
        Self::Focus,
        Self::Blur,
        Self::Success,
        Self::Error,
        Self::Warning,
    ];

    /// Returns the attribute spelling of this category.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Click => "click",
            Self::Input => "input",
            Self::Hover => "hover",
            Self::Mousemove => "mousemove",
            Self::Open => "open",
            Self::Close => "close",
            Self::Focus => "focus",
            Self::Blur => "blur",
            Self::Success => "success",
            Self::Error => "error",
            Self::Warning => "warning",
        }
    }
}

impl fmt::Display for EventCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventCategory {
    type Err = UnknownCategory;

    /// Parses the exact attribute spelling (case-sensitive, no trimming).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| UnknownCategory(s.into()))
    }
}
