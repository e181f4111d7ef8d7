// Copyright 2026 the UISpeaker Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Binding lifecycle.
//!
//! A [`Scanner`] owns every live [`Binding`] under a root element. Each
//! element moves through **unbound → bound → unbound**; a rebind is an unbind
//! followed by a bind, never an in-place patch.
//!
//! - [`start`](Scanner::start) binds every marked descendant of the root,
//!   then subscribes to subtree mutations.
//! - Added elements are bound, together with their marked descendants.
//! - Removed elements are unbound, together with their marked descendants.
//! - A change to any of the `data-uispeaker*` attributes unbinds the element
//!   and rebinds it if the trigger attribute is still there.
//! - [`stop`](Scanner::stop) disconnects observation and releases all
//!   bindings.
//!
//! The active-bindings map is keyed by [`ElementKey`], so a second bind of the
//! same element (duplicate observer delivery, overlapping subtree scans) is a
//! no-op.

use alloc::collections::BTreeMap;
use alloc::rc::{Rc, Weak};
use alloc::string::String;
use alloc::vec::Vec;
use core::cell::RefCell;
use core::fmt;

use crate::binder::{Binding, ShapeOptions, Trigger, Triggers, bind_event};
use crate::category::EventCategory;
use crate::dom::{ATTR_CLOSE, ATTR_SOUND, DomHost, ElementKey, Mutation, WATCHED_ATTRIBUTES};
use crate::element::{ElementShape, effective_event};

/// Builds the trigger for a sound name bound under a category.
pub type TriggerFactory = Rc<dyn Fn(&str, EventCategory) -> Trigger>;

/// One live element binding.
struct BoundElement<H: DomHost> {
    /// Value of `data-uispeaker` at bind time.
    sound_name: String,
    /// Value of `data-uispeaker-close` at bind time, if it was honored.
    close_sound: Option<String>,
    category: EventCategory,
    binding: Binding<H>,
}

impl<H: DomHost> fmt::Debug for BoundElement<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundElement")
            .field("sound_name", &self.sound_name)
            .field("close_sound", &self.close_sound)
            .field("category", &self.category)
            .field("binding", &self.binding)
            .finish_non_exhaustive()
    }
}

struct Lifecycle<H: DomHost + 'static> {
    host: Rc<H>,
    root: H::Element,
    options: ShapeOptions,
    make_trigger: TriggerFactory,
    bound: RefCell<BTreeMap<ElementKey, BoundElement<H>>>,
    observer: RefCell<Option<H::Watcher>>,
}

/// Keeps bindings in sync with a live subtree.
///
/// Dropping a `Scanner` stops it.
pub struct Scanner<H: DomHost + 'static> {
    inner: Rc<Lifecycle<H>>,
}

impl<H: DomHost + 'static> fmt::Debug for Scanner<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scanner")
            .field("options", &self.inner.options)
            .field("bound", &self.bound_count())
            .field("observing", &self.is_observing())
            .finish_non_exhaustive()
    }
}

impl<H: DomHost + 'static> Scanner<H> {
    /// Creates a scanner for `root`. Nothing is bound until
    /// [`start`](Self::start).
    pub fn new(
        host: Rc<H>,
        root: H::Element,
        options: ShapeOptions,
        make_trigger: TriggerFactory,
    ) -> Self {
        Self {
            inner: Rc::new(Lifecycle {
                host,
                root,
                options,
                make_trigger,
                bound: RefCell::new(BTreeMap::new()),
                observer: RefCell::new(None),
            }),
        }
    }

    /// Binds every marked descendant of the root and starts observing.
    ///
    /// A no-op while already observing.
    pub fn start(&self) {
        if self.is_observing() {
            return;
        }
        let inner = &self.inner;
        for element in inner.host.query_marked(&inner.root, ATTR_SOUND) {
            inner.bind(&element);
        }

        let weak: Weak<Lifecycle<H>> = Rc::downgrade(inner);
        let sink = Rc::new(move |batch: Vec<Mutation<H::Element>>| {
            if let Some(inner) = weak.upgrade() {
                inner.apply(batch);
            }
        });
        let observer = inner
            .host
            .observe_subtree(&inner.root, WATCHED_ATTRIBUTES, sink);
        *inner.observer.borrow_mut() = Some(observer);
        tracing::debug!(bound = self.bound_count(), "scanner started");
    }

    /// Disconnects observation and releases every binding. Idempotent.
    pub fn stop(&self) {
        let inner = &self.inner;
        let observer = inner.observer.borrow_mut().take();
        if let Some(observer) = observer {
            inner.host.disconnect(observer);
        }
        let bound = core::mem::take(&mut *inner.bound.borrow_mut());
        let released = bound.len();
        drop(bound);
        if released > 0 {
            tracing::debug!(released, "scanner stopped");
        }
    }

    /// Returns `true` between [`start`](Self::start) and [`stop`](Self::stop).
    #[must_use]
    pub fn is_observing(&self) -> bool {
        self.inner.observer.borrow().is_some()
    }

    /// Number of live bindings.
    #[must_use]
    pub fn bound_count(&self) -> usize {
        self.inner.bound.borrow().len()
    }

    /// Returns `(sound, category)` for `element` if it is bound.
    #[must_use]
    pub fn binding_of(&self, element: &H::Element) -> Option<(String, EventCategory)> {
        let key = self.inner.host.element_key(element);
        self.inner
            .bound
            .borrow()
            .get(&key)
            .map(|b| (b.sound_name.clone(), b.category))
    }
}

impl<H: DomHost + 'static> Drop for Scanner<H> {
    fn drop(&mut self) {
        self.stop();
    }
}

impl<H: DomHost + 'static> Lifecycle<H> {
    fn apply(&self, batch: Vec<Mutation<H::Element>>) {
        for mutation in batch {
            match mutation {
                Mutation::Added(element) => {
                    if self.host.has_attribute(&element, ATTR_SOUND) {
                        self.bind(&element);
                    }
                    for child in self.host.query_marked(&element, ATTR_SOUND) {
                        self.bind(&child);
                    }
                }
                Mutation::Removed(element) => {
                    self.unbind(&element);
                    for child in self.host.query_marked(&element, ATTR_SOUND) {
                        self.unbind(&child);
                    }
                }
                Mutation::Attribute { target, name } => {
                    if !WATCHED_ATTRIBUTES.contains(&name.as_str()) {
                        continue;
                    }
                    self.unbind(&target);
                    if self.host.has_attribute(&target, ATTR_SOUND) {
                        self.bind(&target);
                    }
                }
            }
        }
    }

    /// Binds `element` unless it is already bound or has no sound name.
    fn bind(&self, element: &H::Element) {
        let key = self.host.element_key(element);
        if self.bound.borrow().contains_key(&key) {
            return;
        }
        let Some(sound_name) = self
            .host
            .attribute(element, ATTR_SOUND)
            .filter(|name| !name.is_empty())
        else {
            return;
        };

        let shape = ElementShape::read(&*self.host, element);
        let category = effective_event(&*self.host, element, &shape);
        let mut triggers = Triggers::new((self.make_trigger)(&sound_name, category));

        let close_sound = if category == EventCategory::Open {
            self.host
                .attribute(element, ATTR_CLOSE)
                .filter(|name| !name.is_empty())
        } else {
            None
        };
        if let Some(close) = &close_sound {
            triggers = triggers.with_close((self.make_trigger)(close, EventCategory::Close));
        }

        let binding = bind_event(
            &self.host,
            element,
            shape.toggle_surface(),
            category,
            triggers,
            self.options,
        );
        tracing::debug!(sound = %sound_name, %category, tag = %shape.tag, "bound element");
        self.bound.borrow_mut().insert(
            key,
            BoundElement {
                sound_name,
                close_sound,
                category,
                binding,
            },
        );
    }

    /// Releases the binding of `element`, if any.
    fn unbind(&self, element: &H::Element) {
        let key = self.host.element_key(element);
        let removed = self.bound.borrow_mut().remove(&key);
        if let Some(entry) = removed {
            tracing::debug!(sound = %entry.sound_name, category = %entry.category, "unbound element");
        }
    }
}
