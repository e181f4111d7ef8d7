// Copyright 2026 the UISpeaker Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Browser [`DomHost`].
//!
//! [`WebDom`] maps the host contract onto `web-sys`:
//!
//! - identity: a `WeakMap` from element to a numeric id, so keys never keep
//!   detached elements alive;
//! - listeners: `addEventListener` with a boxed [`Closure`];
//! - observation: one `MutationObserver` per watcher;
//! - time: `setTimeout` / `clearTimeout` and `performance.now()`.
//!
//! Every handle owns its JS closure and detaches itself on drop, so passing
//! it back to the host and dropping it are the same thing.

use std::cell::Cell;
use std::fmt;

use js_sys::{Array, WeakMap};
use uispeaker_core::dom::{
    AttributeHandler, DomHost, ElementKey, Handler, Mutation, MutationSink, Signal,
};
use wasm_bindgen::JsCast as _;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;
use web_sys::{
    Element, Event, HtmlInputElement, MutationObserver, MutationObserverInit, MutationRecord,
    Node, NodeList,
};

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = performance, js_name = "now")]
    pub(crate) fn performance_now() -> f64;

    #[wasm_bindgen(js_name = "setTimeout")]
    fn set_timeout(callback: &JsValue, delay_ms: u32) -> i32;

    #[wasm_bindgen(js_name = "clearTimeout")]
    fn clear_timeout(id: i32);
}

type EventClosure = Closure<dyn FnMut(Event)>;
type ObserverClosure = Closure<dyn FnMut(Array, MutationObserver)>;

/// `DomHost` over the live document.
pub struct WebDom {
    ids: WeakMap,
    next_id: Cell<u32>,
}

impl fmt::Debug for WebDom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebDom")
            .field("assigned_ids", &self.next_id.get())
            .finish_non_exhaustive()
    }
}

impl Default for WebDom {
    fn default() -> Self {
        Self::new()
    }
}

impl WebDom {
    /// Creates a host with an empty identity map.
    #[must_use]
    pub fn new() -> Self {
        Self {
            ids: WeakMap::new(),
            next_id: Cell::new(0),
        }
    }
}

/// An attached event listener. Detaches on drop.
pub struct WebListener {
    target: Element,
    event: &'static str,
    closure: EventClosure,
}

impl fmt::Debug for WebListener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebListener")
            .field("event", &self.event)
            .finish_non_exhaustive()
    }
}

impl Drop for WebListener {
    fn drop(&mut self) {
        // Removing a listener that was never added is a no-op in the DOM.
        let _ = self
            .target
            .remove_event_listener_with_callback(self.event, self.closure.as_ref().unchecked_ref());
    }
}

/// A connected `MutationObserver`. Disconnects on drop.
pub struct WebWatcher {
    observer: Option<MutationObserver>,
    _closure: ObserverClosure,
}

impl fmt::Debug for WebWatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebWatcher")
            .field("connected", &self.observer.is_some())
            .finish_non_exhaustive()
    }
}

impl Drop for WebWatcher {
    fn drop(&mut self) {
        if let Some(observer) = self.observer.take() {
            observer.disconnect();
        }
    }
}

/// A pending `setTimeout`. Cleared on drop.
pub struct WebTimer {
    id: i32,
    _closure: Closure<dyn FnMut()>,
}

impl fmt::Debug for WebTimer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebTimer")
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}

impl Drop for WebTimer {
    fn drop(&mut self) {
        // Clearing an already fired timer is harmless.
        clear_timeout(self.id);
    }
}

impl DomHost for WebDom {
    type Element = Element;
    type Listener = WebListener;
    type Watcher = WebWatcher;
    type Timer = WebTimer;

    fn element_key(&self, element: &Element) -> ElementKey {
        if let Some(id) = self.ids.get(element).as_f64() {
            #[expect(
                clippy::cast_possible_truncation,
                reason = "ids are written from a u32 counter"
            )]
            let id = id as u32;
            return ElementKey(u64::from(id));
        }
        let id = self.next_id.get();
        self.next_id.set(id.wrapping_add(1));
        self.ids.set(element, &JsValue::from(id));
        ElementKey(u64::from(id))
    }

    fn tag_name(&self, element: &Element) -> String {
        element.tag_name().to_ascii_lowercase()
    }

    fn attribute(&self, element: &Element, name: &str) -> Option<String> {
        element.get_attribute(name)
    }

    fn has_attribute(&self, element: &Element, name: &str) -> bool {
        element.has_attribute(name)
    }

    fn input_type(&self, element: &Element) -> String {
        match element.dyn_ref::<HtmlInputElement>() {
            Some(input) => input.type_(),
            None => String::from("text"),
        }
    }

    fn query_marked(&self, scope: &Element, attribute: &str) -> Vec<Element> {
        match scope.query_selector_all(&format!("[{attribute}]")) {
            Ok(list) => elements(&list),
            Err(err) => {
                tracing::warn!(?err, attribute, "querySelectorAll failed");
                Vec::new()
            }
        }
    }

    fn listen(&self, element: &Element, signal: Signal, handler: Handler) -> WebListener {
        let closure = Closure::wrap(Box::new(move |_event: Event| handler()) as Box<dyn FnMut(_)>);
        let event = signal.event_type();
        if let Err(err) =
            element.add_event_listener_with_callback(event, closure.as_ref().unchecked_ref())
        {
            tracing::warn!(?err, event, "addEventListener failed");
        }
        WebListener {
            target: element.clone(),
            event,
            closure,
        }
    }

    fn unlisten(&self, listener: WebListener) {
        drop(listener);
    }

    fn watch_attributes(
        &self,
        element: &Element,
        filter: &'static [&'static str],
        handler: AttributeHandler,
    ) -> WebWatcher {
        let closure = Closure::wrap(Box::new(move |records: Array, _observer: MutationObserver| {
            for record in records.iter() {
                let record: MutationRecord = record.unchecked_into();
                if let Some(name) = record.attribute_name() {
                    handler(&name);
                }
            }
        }) as Box<dyn FnMut(_, _)>);

        let init = MutationObserverInit::new();
        init.set_attributes(true);
        init.set_attribute_filter(&filter_array(filter));
        connect(element, &init, closure)
    }

    fn observe_subtree(
        &self,
        root: &Element,
        filter: &'static [&'static str],
        sink: MutationSink<Element>,
    ) -> WebWatcher {
        let closure = Closure::wrap(Box::new(move |records: Array, _observer: MutationObserver| {
            let mut batch = Vec::new();
            for record in records.iter() {
                let record: MutationRecord = record.unchecked_into();
                collect_mutations(&record, &mut batch);
            }
            if !batch.is_empty() {
                sink(batch);
            }
        }) as Box<dyn FnMut(_, _)>);

        let init = MutationObserverInit::new();
        init.set_child_list(true);
        init.set_subtree(true);
        init.set_attributes(true);
        init.set_attribute_filter(&filter_array(filter));
        connect(root, &init, closure)
    }

    fn disconnect(&self, watcher: WebWatcher) {
        drop(watcher);
    }

    fn set_timeout(&self, delay_ms: u32, callback: Box<dyn FnOnce()>) -> WebTimer {
        let closure = Closure::once(move || callback());
        let id = set_timeout(closure.as_ref(), delay_ms);
        WebTimer {
            id,
            _closure: closure,
        }
    }

    fn clear_timeout(&self, timer: WebTimer) {
        drop(timer);
    }

    fn now_ms(&self) -> f64 {
        performance_now()
    }
}

/// Creates an observer for `closure` and starts it on `target`.
///
/// A failure leaves the watcher disconnected; it is logged, not returned.
fn connect(target: &Element, init: &MutationObserverInit, closure: ObserverClosure) -> WebWatcher {
    let observer = match MutationObserver::new(closure.as_ref().unchecked_ref()) {
        Ok(observer) => observer,
        Err(err) => {
            tracing::warn!(?err, "MutationObserver unavailable");
            return WebWatcher {
                observer: None,
                _closure: closure,
            };
        }
    };
    if let Err(err) = observer.observe_with_options(target, init) {
        tracing::warn!(?err, "MutationObserver.observe failed");
        return WebWatcher {
            observer: None,
            _closure: closure,
        };
    }
    WebWatcher {
        observer: Some(observer),
        _closure: closure,
    }
}

/// Appends the element-level mutations in `record`: added nodes before
/// removed nodes, then any attribute change.
fn collect_mutations(record: &MutationRecord, batch: &mut Vec<Mutation<Element>>) {
    match record.type_().as_str() {
        "childList" => {
            batch.extend(elements(&record.added_nodes()).into_iter().map(Mutation::Added));
            batch.extend(
                elements(&record.removed_nodes())
                    .into_iter()
                    .map(Mutation::Removed),
            );
        }
        "attributes" => {
            let target = record.target().and_then(|n| n.dyn_into::<Element>().ok());
            if let (Some(target), Some(name)) = (target, record.attribute_name()) {
                batch.push(Mutation::Attribute { target, name });
            }
        }
        _ => {}
    }
}

/// Keeps the element nodes of `list`, in order.
fn elements(list: &NodeList) -> Vec<Element> {
    (0..list.length())
        .filter_map(|i| list.item(i))
        .filter_map(|node: Node| node.dyn_into::<Element>().ok())
        .collect()
}

fn filter_array(filter: &[&str]) -> Array {
    filter.iter().map(|name| JsValue::from_str(name)).collect()
}
