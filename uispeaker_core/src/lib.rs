// Copyright 2026 the UISpeaker Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Attribute-driven sound feedback for document UIs.
//!
//! `uispeaker_core` turns `data-uispeaker` attributes into native event
//! bindings that play short sounds. It is `no_std` compatible (with `alloc`)
//! and never touches a concrete DOM or audio API: platforms plug in through
//! the [`DomHost`](dom::DomHost) and [`AudioBackend`](audio::AudioBackend)
//! traits.
//!
//! # Architecture
//!
//! ```text
//!   Speaker::init(root)
//!       │
//!       ▼
//!   Scanner::start() ──► query marked ──► ElementShape ──► EventCategory
//!       │                                                     │
//!       │ Mutation batches                                    ▼
//!       └──────────────────────────────────────────► bind_event() ──► Binding
//!                                                                       │
//!                 ┌─────────────────────────── native signal fires ─────┘
//!                 ▼
//!   SoundRegistry::resolve() ──► AudioPipeline::play() ──► AudioBackend::start()
//! ```
//!
//! **[`registry`]**: Layered name → [`SoundEntry`](registry::SoundEntry)
//! resolution (custom, manifest, builtin, raw URL) and manifest parsing.
//!
//! **[`audio`]**: Lazily created output context, decode cache with in-flight
//! coalescing, volume and mute.
//!
//! **[`element`]**: Pure classification of an element snapshot into an
//! [`ElementKind`](element::ElementKind) and its inferred category.
//!
//! **[`binder`]**: Listener attachment with debounce, throttle and derived
//! open/close semantics. Produces a releasable [`Binding`](binder::Binding).
//!
//! **[`scanner`]**: Keeps exactly one binding per marked element as the
//! subtree changes.
//!
//! **[`speaker`]**: The public facade.
//!
//! **[`dom`]**: The host contract.
//!
//! # Crate features
//!
//! - `std` (disabled by default): Enables `std` support in dependencies.

#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

extern crate alloc;

pub mod audio;
pub mod binder;
pub mod category;
pub mod dom;
pub mod element;
pub mod error;
pub mod fetch;
pub mod registry;
pub mod scanner;
pub mod speaker;

pub use category::EventCategory;
pub use registry::SoundEntry;
pub use speaker::{Speaker, SpeakerConfig};

/// Library version.
pub const VERSION: &str = "0.1.0";
