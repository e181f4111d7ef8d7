// Copyright 2026 the UISpeaker Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Event shaping: native listeners plus temporal policy.
//!
//! [`bind_event`] attaches whatever native listeners a category needs and
//! returns a [`Binding`] that owns them. Policies per category:
//!
//! | category                              | signal(s)            | policy                  |
//! |---------------------------------------|----------------------|-------------------------|
//! | `click`, `success`, `error`, `warning`| click                | direct                  |
//! | `focus` / `blur`                      | focus / blur         | direct                  |
//! | `hover`                               | pointer enter        | direct                  |
//! | `input`                               | input + key down     | trailing debounce       |
//! | `mousemove`                           | pointer move         | leading-edge throttle   |
//! | `open`                                | by [`ToggleSurface`] | primary on open, close trigger on close |
//! | `close`                               | by [`ToggleSurface`] | primary on close        |
//!
//! Releasing a binding detaches every listener and watcher and cancels a
//! pending debounce timer. Handlers also check a liveness flag, so nothing
//! fires after release even if the host delivers a stale callback.

use alloc::boxed::Box;
use alloc::rc::{Rc, Weak};
use alloc::vec::Vec;
use core::cell::{Cell, RefCell};
use core::fmt;

use crate::category::EventCategory;
use crate::dom::{DomHost, Handler, Signal};
use crate::element::ToggleSurface;

/// Callback that plays a sound.
pub type Trigger = Rc<dyn Fn()>;

const OPEN_FILTER: &[&str] = &["open"];
const STATE_FILTER: &[&str] = &["data-state"];

/// Temporal policy parameters.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ShapeOptions {
    /// Quiet period before an `input` binding fires, in ms.
    pub input_debounce_ms: u32,
    /// Minimum spacing between `mousemove` fires, in ms.
    pub mousemove_throttle_ms: u32,
}

impl Default for ShapeOptions {
    fn default() -> Self {
        Self {
            input_debounce_ms: 80,
            mousemove_throttle_ms: 100,
        }
    }
}

/// The callbacks one binding drives.
#[derive(Clone)]
pub struct Triggers {
    /// Fired for the bound category.
    pub primary: Trigger,
    /// Fired on the close half of an `open` binding.
    pub close: Option<Trigger>,
}

impl Triggers {
    /// Triggers with only a primary callback.
    pub fn new(primary: Trigger) -> Self {
        Self {
            primary,
            close: None,
        }
    }

    /// Adds a close callback.
    #[must_use]
    pub fn with_close(mut self, close: Trigger) -> Self {
        self.close = Some(close);
        self
    }
}

impl fmt::Debug for Triggers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Triggers")
            .field("primary", &"Fn()")
            .field("close", &self.close.as_ref().map(|_| "Fn()"))
            .finish()
    }
}

/// Live listeners for one element.
///
/// Dropping a `Binding` releases it.
pub struct Binding<H: DomHost> {
    host: Rc<H>,
    category: EventCategory,
    triggers: Triggers,
    live: Rc<Cell<bool>>,
    listeners: Vec<H::Listener>,
    watchers: Vec<H::Watcher>,
    timer: Option<Rc<RefCell<Option<H::Timer>>>>,
}

impl<H: DomHost> fmt::Debug for Binding<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Binding")
            .field("category", &self.category)
            .field("triggers", &self.triggers)
            .field("live", &self.live.get())
            .field("listeners", &self.listeners.len())
            .field("watchers", &self.watchers.len())
            .field("debounced", &self.timer.is_some())
            .finish_non_exhaustive()
    }
}

impl<H: DomHost> Binding<H> {
    fn new(host: Rc<H>, category: EventCategory, triggers: Triggers) -> Self {
        Self {
            host,
            category,
            triggers,
            live: Rc::new(Cell::new(true)),
            listeners: Vec::new(),
            watchers: Vec::new(),
            timer: None,
        }
    }

    /// Returns the category this binding was made for.
    #[must_use]
    pub fn category(&self) -> EventCategory {
        self.category
    }

    /// Returns the callbacks this binding drives.
    #[must_use]
    pub fn triggers(&self) -> &Triggers {
        &self.triggers
    }

    /// Returns `false` once released.
    #[must_use]
    pub fn is_live(&self) -> bool {
        self.live.get()
    }

    /// Number of attached native listeners plus watchers.
    #[must_use]
    pub fn attachment_count(&self) -> usize {
        self.listeners.len() + self.watchers.len()
    }

    /// Detaches everything and cancels a pending timer. Idempotent.
    pub fn release(&mut self) {
        self.live.set(false);
        for listener in self.listeners.drain(..) {
            self.host.unlisten(listener);
        }
        for watcher in self.watchers.drain(..) {
            self.host.disconnect(watcher);
        }
        if let Some(slot) = self.timer.take()
            && let Some(timer) = slot.borrow_mut().take()
        {
            self.host.clear_timeout(timer);
        }
    }

    /// Wraps `trigger` so it only runs while the binding is live.
    fn gate(&self, trigger: &Trigger) -> Handler {
        let live = Rc::clone(&self.live);
        let trigger = Rc::clone(trigger);
        Rc::new(move || {
            if live.get() {
                trigger();
            }
        })
    }

    fn listen(&mut self, element: &H::Element, signal: Signal, handler: Handler) {
        let listener = self.host.listen(element, signal, handler);
        self.listeners.push(listener);
    }
}

impl<H: DomHost> Drop for Binding<H> {
    fn drop(&mut self) {
        self.release();
    }
}

/// Attaches listeners for `category` on `element`.
///
/// `surface` selects the open/close mechanism and is only consulted for
/// [`EventCategory::Open`] and [`EventCategory::Close`].
pub fn bind_event<H: DomHost + 'static>(
    host: &Rc<H>,
    element: &H::Element,
    surface: ToggleSurface,
    category: EventCategory,
    triggers: Triggers,
    options: ShapeOptions,
) -> Binding<H> {
    let mut binding = Binding::new(Rc::clone(host), category, triggers);
    let primary = Rc::clone(&binding.triggers.primary);

    match category {
        EventCategory::Click
        | EventCategory::Success
        | EventCategory::Error
        | EventCategory::Warning => {
            let handler = binding.gate(&primary);
            binding.listen(element, Signal::Click, handler);
        }
        EventCategory::Focus => {
            let handler = binding.gate(&primary);
            binding.listen(element, Signal::Focus, handler);
        }
        EventCategory::Blur => {
            let handler = binding.gate(&primary);
            binding.listen(element, Signal::Blur, handler);
        }
        EventCategory::Hover => {
            let handler = binding.gate(&primary);
            binding.listen(element, Signal::PointerEnter, handler);
        }
        EventCategory::Input => {
            let handler = debounce(&mut binding, &primary, options.input_debounce_ms);
            binding.listen(element, Signal::Input, Rc::clone(&handler));
            binding.listen(element, Signal::KeyDown, handler);
        }
        EventCategory::Mousemove => {
            let handler = throttle(&binding, &primary, options.mousemove_throttle_ms);
            binding.listen(element, Signal::PointerMove, handler);
        }
        EventCategory::Open => {
            let on_close = binding.triggers.close.clone();
            bind_toggle(&mut binding, element, surface, Some(primary), on_close);
        }
        EventCategory::Close => {
            bind_toggle(&mut binding, element, surface, None, Some(primary));
        }
    }
    binding
}

/// Trailing-edge debounce: every call restarts a `delay_ms` timer; the
/// trigger fires once the timer survives.
fn debounce<H: DomHost + 'static>(
    binding: &mut Binding<H>,
    trigger: &Trigger,
    delay_ms: u32,
) -> Handler {
    let slot: Rc<RefCell<Option<H::Timer>>> = Rc::new(RefCell::new(None));
    binding.timer = Some(Rc::clone(&slot));

    let host: Weak<H> = Rc::downgrade(&binding.host);
    let live = Rc::clone(&binding.live);
    let fire = binding.gate(trigger);
    Rc::new(move || {
        let Some(host) = host.upgrade() else {
            return;
        };
        if !live.get() {
            return;
        }
        let previous = slot.borrow_mut().take();
        if let Some(previous) = previous {
            host.clear_timeout(previous);
        }
        // The timer callback leaves `slot` alone: the handle is dropped on
        // the next restart or on release, never from inside its own callback.
        let fire = Rc::clone(&fire);
        let timer = host.set_timeout(delay_ms, Box::new(move || fire()));
        *slot.borrow_mut() = Some(timer);
    })
}

/// Leading-edge throttle: fires immediately, then ignores calls until
/// `interval_ms` has passed since the last fire.
fn throttle<H: DomHost + 'static>(
    binding: &Binding<H>,
    trigger: &Trigger,
    interval_ms: u32,
) -> Handler {
    let host: Weak<H> = Rc::downgrade(&binding.host);
    let fire = binding.gate(trigger);
    let last_fired: Cell<Option<f64>> = Cell::new(None);
    let interval = f64::from(interval_ms);
    Rc::new(move || {
        let Some(host) = host.upgrade() else {
            return;
        };
        let now = host.now_ms();
        if last_fired.get().is_none_or(|last| now - last >= interval) {
            last_fired.set(Some(now));
            fire();
        }
    })
}

/// Wires open/close transitions for `surface`.
fn bind_toggle<H: DomHost + 'static>(
    binding: &mut Binding<H>,
    element: &H::Element,
    surface: ToggleSurface,
    on_open: Option<Trigger>,
    on_close: Option<Trigger>,
) {
    let on_open = on_open.map(|t| binding.gate(&t));
    let on_close = on_close.map(|t| binding.gate(&t));
    let host: Weak<H> = Rc::downgrade(&binding.host);

    match surface {
        ToggleSurface::Disclosure => {
            let target = element.clone();
            let handler: Handler = Rc::new(move || {
                let Some(host) = host.upgrade() else {
                    return;
                };
                let fire = if host.has_attribute(&target, "open") {
                    &on_open
                } else {
                    &on_close
                };
                if let Some(fire) = fire {
                    fire();
                }
            });
            binding.listen(element, Signal::Toggle, handler);
        }
        ToggleSurface::Modal => {
            if let Some(close) = &on_close {
                binding.listen(element, Signal::Close, Rc::clone(close));
            }
            let target = element.clone();
            let watcher = binding.host.watch_attributes(
                element,
                OPEN_FILTER,
                Rc::new(move |name: &str| {
                    let Some(host) = host.upgrade() else {
                        return;
                    };
                    if name != "open" {
                        return;
                    }
                    let fire = if host.has_attribute(&target, "open") {
                        &on_open
                    } else {
                        &on_close
                    };
                    if let Some(fire) = fire {
                        fire();
                    }
                }),
            );
            binding.watchers.push(watcher);
        }
        ToggleSurface::DataState => {
            let target = element.clone();
            let watcher = binding.host.watch_attributes(
                element,
                STATE_FILTER,
                Rc::new(move |name: &str| {
                    let Some(host) = host.upgrade() else {
                        return;
                    };
                    if name != "data-state" {
                        return;
                    }
                    let fire = match host.attribute(&target, "data-state").as_deref() {
                        Some("open") => &on_open,
                        Some("closed") => &on_close,
                        _ => return,
                    };
                    if let Some(fire) = fire {
                        fire();
                    }
                }),
            );
            binding.watchers.push(watcher);
        }
    }
}
