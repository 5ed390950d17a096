use super::document::Document;
use super::node::NodeId;
use serde::Serialize;
use std::collections::VecDeque;
use std::rc::Rc;

/// A dispatched DOM event
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Event {
    /// Event type, e.g. "click" or "input"
    pub kind: String,
    /// Node the event was dispatched on
    pub target: NodeId,
    pub bubbles: bool,
}

/// Listener callback, invoked with the event and the node it is registered on
pub type ListenerFn = Rc<dyn Fn(&Event, NodeId)>;

struct Listener {
    node: NodeId,
    kind: String,
    callback: ListenerFn,
}

impl std::fmt::Debug for Listener {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Listener")
            .field("node", &self.node)
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

/// Bounded record of dispatched events plus the registered listeners
#[derive(Debug)]
pub(crate) struct EventLog {
    entries: VecDeque<Event>,
    limit: usize,
    listeners: Vec<Listener>,
}

impl Default for EventLog {
    fn default() -> Self {
        Self {
            entries: VecDeque::new(),
            limit: crate::config::DEFAULT_EVENT_LOG_LIMIT,
            listeners: Vec::new(),
        }
    }
}

impl EventLog {
    fn record(&mut self, event: Event) {
        if self.limit == 0 {
            return;
        }
        while self.entries.len() >= self.limit {
            self.entries.pop_front();
        }
        self.entries.push_back(event);
    }
}

impl Document {
    /// Dispatch an event on `target`, running listeners on the target and, for bubbling
    /// events, on each ancestor.
    pub fn dispatch_event(&mut self, target: NodeId, kind: &str, bubbles: bool) {
        let event = Event {
            kind: kind.to_string(),
            target,
            bubbles,
        };
        log::trace!("dispatching {} on {}", kind, target);
        self.events.record(event.clone());

        let mut path = vec![target];
        if bubbles {
            path.extend(self.ancestors(target));
        }
        let callbacks: Vec<(NodeId, ListenerFn)> = path
            .iter()
            .flat_map(|node| {
                self.events
                    .listeners
                    .iter()
                    .filter(move |l| l.node == *node && l.kind == kind)
                    .map(|l| (l.node, Rc::clone(&l.callback)))
            })
            .collect();
        for (node, callback) in callbacks {
            callback(&event, node);
        }
    }

    /// Register a listener for `kind` events reaching `node`. Listeners stay registered
    /// while the node is detached, so a node moved back into the tree keeps them; drop them
    /// with [`remove_event_listeners`](Self::remove_event_listeners).
    pub fn add_event_listener(&mut self, node: NodeId, kind: &str, callback: impl Fn(&Event, NodeId) + 'static) {
        self.events.listeners.push(Listener {
            node,
            kind: kind.to_string(),
            callback: Rc::new(callback),
        });
    }

    /// Drop every listener on `node` and its descendants, returning how many were dropped
    pub fn remove_event_listeners(&mut self, node: NodeId) -> usize {
        let mut subtree = self.descendants(node);
        subtree.push(node);
        let before = self.events.listeners.len();
        self.events.listeners.retain(|l| !subtree.contains(&l.node));
        before - self.events.listeners.len()
    }

    /// Recorded events, oldest first
    pub fn events(&self) -> impl Iterator<Item = &Event> {
        self.events.entries.iter()
    }

    /// Drain the event log
    pub fn take_events(&mut self) -> Vec<Event> {
        self.events.entries.drain(..).collect()
    }

    /// Cap the event log; older events are dropped first
    pub fn set_event_log_limit(&mut self, limit: usize) {
        self.events.limit = limit;
        while self.events.entries.len() > limit {
            self.events.entries.pop_front();
        }
    }

    pub fn active_element(&self) -> Option<NodeId> {
        self.active_element
    }

    /// Move focus to `id`, blurring the previously focused element
    pub fn focus(&mut self, id: NodeId) {
        if !self.is_element(id) || self.active_element == Some(id) {
            return;
        }
        if let Some(previous) = self.active_element {
            self.blur(previous);
        }
        self.active_element = Some(id);
        self.dispatch_event(id, "focus", false);
    }

    /// Drop focus from `id` if it holds it
    pub fn blur(&mut self, id: NodeId) {
        if self.active_element != Some(id) {
            return;
        }
        self.active_element = None;
        self.dispatch_event(id, "blur", false);
    }

    /// Dispatch a bubbling click and run the default action: checkboxes toggle and
    /// radios check, each followed by `input` and `change`. Disabled controls ignore clicks.
    pub fn click(&mut self, id: NodeId) {
        if !self.is_element(id) || self.disabled(id) == Some(true) {
            return;
        }
        self.dispatch_event(id, "click", true);
        if !self.is_tag(id, "input") {
            return;
        }
        let changed = match self.input_type(id).as_deref() {
            Some("checkbox") => {
                let checked = self.checked(id).unwrap_or(false);
                self.set_checked(id, !checked)
            }
            Some("radio") if self.checked(id) != Some(true) => self.set_checked(id, true),
            _ => false,
        };
        if changed {
            self.dispatch_event(id, "input", true);
            self.dispatch_event(id, "change", true);
        }
    }
}
