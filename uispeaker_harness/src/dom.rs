// Copyright 2026 the UISpeaker Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! In-memory [`DomHost`].
//!
//! [`SyntheticDom`] is a small element tree with attributes, listeners,
//! observers and a manual clock. Nothing happens on its own:
//!
//! - native signals fire only through [`dispatch`](SyntheticDom::dispatch);
//! - mutation records queue up and are delivered by
//!   [`flush`](SyntheticDom::flush), like the browser's batched microtask
//!   delivery;
//! - timers fire only as [`advance`](SyntheticDom::advance) moves the clock.
//!
//! Tree edits made through the harness API record mutations for every
//! subtree observer whose root is the edited node or one of its ancestors.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;

use uispeaker_core::dom::{
    AttributeHandler, DomHost, ElementKey, Handler, Mutation, MutationSink, Signal,
};

/// Handle to a synthetic element.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u64);

/// Handle to an attached listener.
#[derive(Debug, PartialEq, Eq)]
pub struct ListenerId(u64);

/// Handle to an attribute watcher or subtree observer.
#[derive(Debug, PartialEq, Eq)]
pub struct WatcherId(u64);

/// Handle to a pending timer.
#[derive(Debug, PartialEq, Eq)]
pub struct TimerId(u64);

struct NodeData {
    tag: String,
    attributes: BTreeMap<String, String>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

struct ListenerEntry {
    node: NodeId,
    signal: Signal,
    handler: Handler,
}

struct AttributeWatch {
    node: NodeId,
    filter: &'static [&'static str],
    handler: AttributeHandler,
    pending: Vec<String>,
}

struct SubtreeWatch {
    root: NodeId,
    filter: &'static [&'static str],
    sink: MutationSink<NodeId>,
    pending: Vec<Mutation<NodeId>>,
}

struct TimerEntry {
    due: f64,
    callback: Box<dyn FnOnce()>,
}

struct DomState {
    nodes: BTreeMap<NodeId, NodeData>,
    body: NodeId,
    next_id: u64,
    listeners: BTreeMap<u64, ListenerEntry>,
    attribute_watches: BTreeMap<u64, AttributeWatch>,
    subtree_watches: BTreeMap<u64, SubtreeWatch>,
    timers: BTreeMap<u64, TimerEntry>,
    now: f64,
}

impl DomState {
    fn next_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn insert_node(&mut self, tag: &str) -> NodeId {
        let id = NodeId(self.next_id());
        self.nodes.insert(
            id,
            NodeData {
                tag: tag.to_ascii_lowercase(),
                attributes: BTreeMap::new(),
                parent: None,
                children: Vec::new(),
            },
        );
        id
    }

    /// `true` if `ancestor` is `node` or one of its ancestors.
    fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut cursor = Some(node);
        while let Some(current) = cursor {
            if current == ancestor {
                return true;
            }
            cursor = self.nodes.get(&current).and_then(|n| n.parent);
        }
        false
    }

    /// Queues `mutation` on every subtree observer covering `anchor`.
    fn record(&mut self, anchor: NodeId, mutation: &Mutation<NodeId>) {
        let roots: Vec<(u64, NodeId)> = self
            .subtree_watches
            .iter()
            .map(|(id, watch)| (*id, watch.root))
            .collect();
        for (id, root) in roots {
            if !self.contains(root, anchor) {
                continue;
            }
            if let Some(watch) = self.subtree_watches.get_mut(&id) {
                let wanted = match mutation {
                    Mutation::Attribute { name, .. } => watch.filter.contains(&name.as_str()),
                    Mutation::Added(_) | Mutation::Removed(_) => true,
                };
                if wanted {
                    watch.pending.push(mutation.clone());
                }
            }
        }
    }

    fn record_attribute(&mut self, node: NodeId, name: &str) {
        for watch in self.attribute_watches.values_mut() {
            if watch.node == node && watch.filter.contains(&name) {
                watch.pending.push(name.into());
            }
        }
        self.record(
            node,
            &Mutation::Attribute {
                target: node,
                name: name.into(),
            },
        );
    }

    fn detach(&mut self, node: NodeId) {
        let Some(parent) = self.nodes.get(&node).and_then(|n| n.parent) else {
            return;
        };
        if let Some(parent_data) = self.nodes.get_mut(&parent) {
            parent_data.children.retain(|child| *child != node);
        }
        if let Some(data) = self.nodes.get_mut(&node) {
            data.parent = None;
        }
        self.record(parent, &Mutation::Removed(node));
    }

    fn collect_marked(&self, scope: NodeId, attribute: &str, out: &mut Vec<NodeId>) {
        let Some(data) = self.nodes.get(&scope) else {
            return;
        };
        for child in &data.children {
            if self
                .nodes
                .get(child)
                .is_some_and(|c| c.attributes.contains_key(attribute))
            {
                out.push(*child);
            }
            self.collect_marked(*child, attribute, out);
        }
    }
}

/// Scripted, deterministic document.
pub struct SyntheticDom {
    state: RefCell<DomState>,
}

impl fmt::Debug for SyntheticDom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("SyntheticDom")
            .field("nodes", &state.nodes.len())
            .field("listeners", &state.listeners.len())
            .field("attribute_watches", &state.attribute_watches.len())
            .field("subtree_watches", &state.subtree_watches.len())
            .field("timers", &state.timers.len())
            .field("now", &state.now)
            .finish_non_exhaustive()
    }
}

impl Default for SyntheticDom {
    fn default() -> Self {
        Self::new()
    }
}

impl SyntheticDom {
    /// Creates a document holding an empty `<body>`.
    #[must_use]
    pub fn new() -> Self {
        let mut state = DomState {
            nodes: BTreeMap::new(),
            body: NodeId(0),
            next_id: 0,
            listeners: BTreeMap::new(),
            attribute_watches: BTreeMap::new(),
            subtree_watches: BTreeMap::new(),
            timers: BTreeMap::new(),
            now: 0.0,
        };
        state.body = state.insert_node("body");
        Self {
            state: RefCell::new(state),
        }
    }

    /// The `<body>` element.
    #[must_use]
    pub fn body(&self) -> NodeId {
        self.state.borrow().body
    }

    /// Creates a detached element.
    pub fn create(&self, tag: &str) -> NodeId {
        self.state.borrow_mut().insert_node(tag)
    }

    /// Creates an element with `attributes` and appends it to `parent`.
    ///
    /// Attributes are set while detached, so observers only see the
    /// insertion.
    pub fn add(&self, parent: NodeId, tag: &str, attributes: &[(&str, &str)]) -> NodeId {
        let node = self.create(tag);
        {
            let mut state = self.state.borrow_mut();
            if let Some(data) = state.nodes.get_mut(&node) {
                for (name, value) in attributes {
                    data.attributes.insert((*name).into(), (*value).into());
                }
            }
        }
        self.append(parent, node);
        node
    }

    /// Moves `child` under `parent`, detaching it from any previous parent.
    pub fn append(&self, parent: NodeId, child: NodeId) {
        let mut state = self.state.borrow_mut();
        if !state.nodes.contains_key(&parent) || !state.nodes.contains_key(&child) {
            return;
        }
        state.detach(child);
        if let Some(data) = state.nodes.get_mut(&child) {
            data.parent = Some(parent);
        }
        if let Some(data) = state.nodes.get_mut(&parent) {
            data.children.push(child);
        }
        state.record(parent, &Mutation::Added(child));
    }

    /// Detaches `node` from its parent. Its own subtree stays intact.
    pub fn remove(&self, node: NodeId) {
        self.state.borrow_mut().detach(node);
    }

    /// Sets an attribute.
    pub fn set_attribute(&self, node: NodeId, name: &str, value: &str) {
        let mut state = self.state.borrow_mut();
        let Some(data) = state.nodes.get_mut(&node) else {
            return;
        };
        data.attributes.insert(name.into(), value.into());
        state.record_attribute(node, name);
    }

    /// Removes an attribute, if present.
    pub fn remove_attribute(&self, node: NodeId, name: &str) {
        let mut state = self.state.borrow_mut();
        let Some(data) = state.nodes.get_mut(&node) else {
            return;
        };
        if data.attributes.remove(name).is_some() {
            state.record_attribute(node, name);
        }
    }

    /// Fires `signal` on `node`, running every matching listener in
    /// attachment order.
    pub fn dispatch(&self, node: NodeId, signal: Signal) {
        let handlers: Vec<Handler> = self
            .state
            .borrow()
            .listeners
            .values()
            .filter(|l| l.node == node && l.signal == signal)
            .map(|l| Handler::clone(&l.handler))
            .collect();
        for handler in handlers {
            handler();
        }
    }

    /// Delivers queued mutation records until none remain.
    ///
    /// Attribute watchers are delivered before subtree observers in each
    /// round; records produced during delivery go to the next round.
    pub fn flush(&self) {
        loop {
            let (attribute_rounds, subtree_rounds) = {
                let mut state = self.state.borrow_mut();
                let attribute_rounds: Vec<(AttributeHandler, Vec<String>)> = state
                    .attribute_watches
                    .values_mut()
                    .filter(|w| !w.pending.is_empty())
                    .map(|w| (AttributeHandler::clone(&w.handler), std::mem::take(&mut w.pending)))
                    .collect();
                let subtree_rounds: Vec<(MutationSink<NodeId>, Vec<Mutation<NodeId>>)> = state
                    .subtree_watches
                    .values_mut()
                    .filter(|w| !w.pending.is_empty())
                    .map(|w| (MutationSink::clone(&w.sink), std::mem::take(&mut w.pending)))
                    .collect();
                (attribute_rounds, subtree_rounds)
            };
            if attribute_rounds.is_empty() && subtree_rounds.is_empty() {
                return;
            }
            for (handler, names) in attribute_rounds {
                for name in names {
                    handler(&name);
                }
            }
            for (sink, batch) in subtree_rounds {
                sink(batch);
            }
        }
    }

    /// Moves the clock forward by `ms`, firing due timers in order.
    pub fn advance(&self, ms: u32) {
        let target = self.state.borrow().now + f64::from(ms);
        loop {
            let next = {
                let mut state = self.state.borrow_mut();
                let due = state
                    .timers
                    .iter()
                    .filter(|(_, t)| t.due <= target)
                    .min_by(|(a_id, a), (b_id, b)| a.due.total_cmp(&b.due).then(a_id.cmp(b_id)))
                    .map(|(id, _)| *id);
                due.and_then(|id| state.timers.remove(&id)).inspect(|timer| {
                    state.now = timer.due;
                })
            };
            match next {
                Some(timer) => (timer.callback)(),
                None => break,
            }
        }
        self.state.borrow_mut().now = target;
    }

    /// Current clock value in ms.
    #[must_use]
    pub fn now(&self) -> f64 {
        self.state.borrow().now
    }

    /// Number of listeners attached to `node`.
    #[must_use]
    pub fn listener_count(&self, node: NodeId) -> usize {
        self.state
            .borrow()
            .listeners
            .values()
            .filter(|l| l.node == node)
            .count()
    }

    /// Number of listeners in the whole document.
    #[must_use]
    pub fn total_listeners(&self) -> usize {
        self.state.borrow().listeners.len()
    }

    /// Number of live attribute watchers and subtree observers.
    #[must_use]
    pub fn watcher_count(&self) -> usize {
        let state = self.state.borrow();
        state.attribute_watches.len() + state.subtree_watches.len()
    }

    /// Number of pending timers.
    #[must_use]
    pub fn pending_timers(&self) -> usize {
        self.state.borrow().timers.len()
    }
}

impl DomHost for SyntheticDom {
    type Element = NodeId;
    type Listener = ListenerId;
    type Watcher = WatcherId;
    type Timer = TimerId;

    fn element_key(&self, element: &NodeId) -> ElementKey {
        ElementKey(element.0)
    }

    fn tag_name(&self, element: &NodeId) -> String {
        self.state
            .borrow()
            .nodes
            .get(element)
            .map(|n| n.tag.clone())
            .unwrap_or_default()
    }

    fn attribute(&self, element: &NodeId, name: &str) -> Option<String> {
        self.state
            .borrow()
            .nodes
            .get(element)?
            .attributes
            .get(name)
            .cloned()
    }

    fn query_marked(&self, scope: &NodeId, attribute: &str) -> Vec<NodeId> {
        let mut out = Vec::new();
        self.state
            .borrow()
            .collect_marked(*scope, attribute, &mut out);
        out
    }

    fn listen(&self, element: &NodeId, signal: Signal, handler: Handler) -> ListenerId {
        let mut state = self.state.borrow_mut();
        let id = state.next_id();
        state.listeners.insert(
            id,
            ListenerEntry {
                node: *element,
                signal,
                handler,
            },
        );
        ListenerId(id)
    }

    fn unlisten(&self, listener: ListenerId) {
        self.state.borrow_mut().listeners.remove(&listener.0);
    }

    fn watch_attributes(
        &self,
        element: &NodeId,
        filter: &'static [&'static str],
        handler: AttributeHandler,
    ) -> WatcherId {
        let mut state = self.state.borrow_mut();
        let id = state.next_id();
        state.attribute_watches.insert(
            id,
            AttributeWatch {
                node: *element,
                filter,
                handler,
                pending: Vec::new(),
            },
        );
        WatcherId(id)
    }

    fn observe_subtree(
        &self,
        root: &NodeId,
        filter: &'static [&'static str],
        sink: MutationSink<NodeId>,
    ) -> WatcherId {
        let mut state = self.state.borrow_mut();
        let id = state.next_id();
        state.subtree_watches.insert(
            id,
            SubtreeWatch {
                root: *root,
                filter,
                sink,
                pending: Vec::new(),
            },
        );
        WatcherId(id)
    }

    fn disconnect(&self, watcher: WatcherId) {
        let mut state = self.state.borrow_mut();
        state.attribute_watches.remove(&watcher.0);
        state.subtree_watches.remove(&watcher.0);
    }

    fn set_timeout(&self, delay_ms: u32, callback: Box<dyn FnOnce()>) -> TimerId {
        let mut state = self.state.borrow_mut();
        let id = state.next_id();
        let due = state.now + f64::from(delay_ms);
        state.timers.insert(id, TimerEntry { due, callback });
        TimerId(id)
    }

    fn clear_timeout(&self, timer: TimerId) {
        self.state.borrow_mut().timers.remove(&timer.0);
    }

    fn now_ms(&self) -> f64 {
        self.state.borrow().now
    }
}
