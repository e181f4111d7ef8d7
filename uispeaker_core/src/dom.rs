// Copyright 2026 the UISpeaker Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Host contract for document integrations.
//!
//! The engine never touches a concrete DOM. Everything it needs from the page
//! goes through [`DomHost`]:
//!
//! - **Inspection**: tag names, attributes, and a marked-descendant query.
//! - **Identity**: a stable [`ElementKey`] per live element, used to key the
//!   active-bindings map.
//! - **Listeners**: attach/detach a handler for a native [`Signal`].
//! - **Observation**: per-element attribute watchers and a subtree observer
//!   delivering batched [`Mutation`] records.
//! - **Time**: one-shot timers and a millisecond clock for debounce and
//!   throttle.
//!
//! The browser implementation lives in `uispeaker_web`; the synthetic one used
//! by the lifecycle tests lives in `uispeaker_harness`.
//!
//! All handles (`Listener`, `Watcher`, `Timer`) are owned values. Passing one
//! back to the host (`unlisten`, `disconnect`, `clear_timeout`) releases it.

use alloc::boxed::Box;
use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec::Vec;

/// The trigger attribute naming the sound.
pub const ATTR_SOUND: &str = "data-uispeaker";
/// Optional attribute overriding the inferred event category.
pub const ATTR_EVENT: &str = "data-uispeaker-event";
/// Optional attribute naming the sound played on close transitions.
pub const ATTR_CLOSE: &str = "data-uispeaker-close";

/// Attributes whose mutation forces a rebind.
pub const WATCHED_ATTRIBUTES: &[&str] = &[ATTR_SOUND, ATTR_EVENT, ATTR_CLOSE];

/// Callback run when a native signal fires.
pub type Handler = Rc<dyn Fn()>;

/// Callback run with the name of a changed attribute.
pub type AttributeHandler = Rc<dyn Fn(&str)>;

/// Callback receiving one batch of subtree mutations.
pub type MutationSink<E> = Rc<dyn Fn(Vec<Mutation<E>>)>;

/// Stable identity of a live element.
///
/// Two handles to the same element must yield the same key for as long as the
/// element is reachable.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementKey(pub u64);

/// Native signals a binding can subscribe to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Signal {
    /// `click`
    Click,
    /// `input` (value changed; covers paste and autocomplete)
    Input,
    /// `keydown`
    KeyDown,
    /// `mouseenter`
    PointerEnter,
    /// `mousemove`
    PointerMove,
    /// `focus`
    Focus,
    /// `blur`
    Blur,
    /// `toggle` on a disclosure element
    Toggle,
    /// `close` on a modal dialog
    Close,
}

impl Signal {
    /// Returns the DOM event type for this signal.
    #[must_use]
    pub const fn event_type(self) -> &'static str {
        match self {
            Self::Click => "click",
            Self::Input => "input",
            Self::KeyDown => "keydown",
            Self::PointerEnter => "mouseenter",
            Self::PointerMove => "mousemove",
            Self::Focus => "focus",
            Self::Blur => "blur",
            Self::Toggle => "toggle",
            Self::Close => "close",
        }
    }
}

/// One structural or attribute change reported by a subtree observer.
#[derive(Clone, Debug, PartialEq)]
pub enum Mutation<E> {
    /// An element was inserted under the observed root.
    Added(E),
    /// An element was detached from the observed root.
    Removed(E),
    /// A filtered attribute changed on `target`.
    Attribute {
        /// Element whose attribute changed.
        target: E,
        /// Name of the changed attribute.
        name: String,
    },
}

/// Document operations the engine depends on.
pub trait DomHost {
    /// Handle to a live element.
    type Element: Clone + PartialEq + 'static;
    /// An attached native listener.
    type Listener;
    /// An attribute watcher or subtree observer.
    type Watcher;
    /// A pending one-shot timer.
    type Timer;

    /// Returns the stable identity of `element`.
    fn element_key(&self, element: &Self::Element) -> ElementKey;

    /// Returns the lowercase tag name.
    fn tag_name(&self, element: &Self::Element) -> String;

    /// Returns the value of `name`, or `None` when absent.
    fn attribute(&self, element: &Self::Element, name: &str) -> Option<String>;

    /// Returns `true` when `name` is present (any value, including empty).
    fn has_attribute(&self, element: &Self::Element, name: &str) -> bool {
        self.attribute(element, name).is_some()
    }

    /// Returns the normalized `type` of an `<input>`.
    ///
    /// The default mirrors the DOM: missing means `"text"`, comparison is
    /// case-insensitive.
    fn input_type(&self, element: &Self::Element) -> String {
        self.attribute(element, "type")
            .map(|t| t.to_ascii_lowercase())
            .unwrap_or_else(|| "text".into())
    }

    /// Returns every descendant of `scope` (excluding `scope`) carrying
    /// `attribute`, in document order.
    fn query_marked(&self, scope: &Self::Element, attribute: &str) -> Vec<Self::Element>;

    /// Attaches `handler` to `signal` on `element`.
    fn listen(&self, element: &Self::Element, signal: Signal, handler: Handler) -> Self::Listener;

    /// Detaches a listener returned by [`listen`](Self::listen).
    fn unlisten(&self, listener: Self::Listener);

    /// Watches `element` itself for changes to any attribute in `filter`.
    fn watch_attributes(
        &self,
        element: &Self::Element,
        filter: &'static [&'static str],
        handler: AttributeHandler,
    ) -> Self::Watcher;

    /// Observes insertions and removals anywhere under `root`, plus changes
    /// to the attributes in `filter`. Batches are delivered in order.
    fn observe_subtree(
        &self,
        root: &Self::Element,
        filter: &'static [&'static str],
        sink: MutationSink<Self::Element>,
    ) -> Self::Watcher;

    /// Stops a watcher or observer.
    fn disconnect(&self, watcher: Self::Watcher);

    /// Runs `callback` once after `delay_ms`.
    fn set_timeout(&self, delay_ms: u32, callback: Box<dyn FnOnce()>) -> Self::Timer;

    /// Cancels a timer. Clearing a timer that already fired is a no-op.
    fn clear_timeout(&self, timer: Self::Timer);

    /// Returns a monotonic timestamp in milliseconds.
    fn now_ms(&self) -> f64;
}
