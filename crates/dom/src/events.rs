//! Events and listener registries
//!
//! Listeners are kept per (node, event name) in a `DashMap`, the same shape
//! the CDP client uses for its method subscribers. Dispatch always clones
//! the callbacks out of the map before running them, so a listener may
//! register or remove listeners (itself included) while it runs.

use ahash::RandomState;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::cell::Cell;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::types::NodeId;

/// Listener callback. Receives the event being dispatched.
pub type EventCallback = Arc<dyn Fn(&Event) + Send + Sync>;

/// Handle returned by listener registration, used to remove the listener
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ListenerId(u64);

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "listener#{}", self.0)
    }
}

/// `Event.eventPhase`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum EventPhase {
    None = 0,
    Capturing = 1,
    AtTarget = 2,
    Bubbling = 3,
}

/// A dispatched event.
///
/// Routing fields are set by the document during dispatch. The flags a
/// listener may flip (`prevent_default`, `stop_propagation`) use `Cell` so
/// listeners only need a shared reference.
#[derive(Debug, Clone)]
pub struct Event {
    event_type: String,
    bubbles: bool,
    cancelable: bool,
    timestamp: f64,

    target: Option<NodeId>,
    current_target: Option<NodeId>,
    phase: EventPhase,

    default_prevented: Cell<bool>,
    propagation_stopped: Cell<bool>,
    immediate_propagation_stopped: Cell<bool>,
}

impl Event {
    /// Non-bubbling, non-cancelable event, like `new Event(type)`
    pub fn new(event_type: impl Into<String>) -> Self {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs_f64() * 1000.0)
            .unwrap_or(0.0);

        Self {
            event_type: event_type.into(),
            bubbles: false,
            cancelable: false,
            timestamp,
            target: None,
            current_target: None,
            phase: EventPhase::None,
            default_prevented: Cell::new(false),
            propagation_stopped: Cell::new(false),
            immediate_propagation_stopped: Cell::new(false),
        }
    }

    pub fn bubbling(mut self) -> Self {
        self.bubbles = true;
        self
    }

    pub fn cancelable(mut self) -> Self {
        self.cancelable = true;
        self
    }

    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    pub fn bubbles(&self) -> bool {
        self.bubbles
    }

    pub fn is_cancelable(&self) -> bool {
        self.cancelable
    }

    /// Milliseconds since the Unix epoch at creation
    pub fn timestamp(&self) -> f64 {
        self.timestamp
    }

    pub fn target(&self) -> Option<NodeId> {
        self.target
    }

    pub fn current_target(&self) -> Option<NodeId> {
        self.current_target
    }

    pub fn phase(&self) -> EventPhase {
        self.phase
    }

    /// Only has an effect on cancelable events
    pub fn prevent_default(&self) {
        if self.cancelable {
            self.default_prevented.set(true);
        }
    }

    pub fn default_prevented(&self) -> bool {
        self.default_prevented.get()
    }

    pub fn stop_propagation(&self) {
        self.propagation_stopped.set(true);
    }

    pub fn stop_immediate_propagation(&self) {
        self.propagation_stopped.set(true);
        self.immediate_propagation_stopped.set(true);
    }

    pub fn propagation_stopped(&self) -> bool {
        self.propagation_stopped.get()
    }

    pub(crate) fn immediate_propagation_stopped(&self) -> bool {
        self.immediate_propagation_stopped.get()
    }

    pub(crate) fn set_target(&mut self, target: NodeId) {
        self.target = Some(target);
    }

    pub(crate) fn enter(&mut self, node: NodeId, phase: EventPhase) {
        self.current_target = Some(node);
        self.phase = phase;
    }

    pub(crate) fn finish(&mut self) {
        self.current_target = None;
        self.phase = EventPhase::None;
        self.immediate_propagation_stopped.set(false);
    }
}

/// A registered listener, cloned out of the registry for dispatch
#[derive(Clone)]
pub(crate) struct Listener {
    pub id: ListenerId,
    pub capture: bool,
    pub callback: EventCallback,
}

type ListenerKey = (NodeId, String);

/// Listener storage for one listener API
#[derive(Default)]
pub(crate) struct ListenerRegistry {
    listeners: DashMap<ListenerKey, Vec<Listener>, RandomState>,
}

impl ListenerRegistry {
    pub fn add(&self, id: ListenerId, target: NodeId, name: &str, capture: bool, callback: EventCallback) {
        self.listeners
            .entry((target, name.to_string()))
            .or_default()
            .push(Listener {
                id,
                capture,
                callback,
            });
    }

    /// Returns false if no such listener was registered
    pub fn remove(&self, target: NodeId, name: &str, id: ListenerId) -> bool {
        let key = (target, name.to_string());

        let removed = match self.listeners.get_mut(&key) {
            Some(mut listeners) => {
                let before = listeners.len();
                listeners.retain(|l| l.id != id);
                before != listeners.len()
            }
            None => false,
        };

        self.listeners.remove_if(&key, |_, listeners| listeners.is_empty());
        removed
    }

    pub fn contains(&self, target: NodeId, name: &str, id: ListenerId) -> bool {
        self.listeners
            .get(&(target, name.to_string()))
            .map(|listeners| listeners.iter().any(|l| l.id == id))
            .unwrap_or(false)
    }

    /// Listeners registered right now, in registration order
    pub fn snapshot(&self, target: NodeId, name: &str) -> Vec<Listener> {
        self.listeners
            .get(&(target, name.to_string()))
            .map(|listeners| listeners.clone())
            .unwrap_or_default()
    }

    pub fn count(&self, target: NodeId, name: &str) -> usize {
        self.listeners
            .get(&(target, name.to_string()))
            .map(|listeners| listeners.len())
            .unwrap_or(0)
    }
}

/// Monotonic listener ID source shared by both registries of a document
#[derive(Debug, Default)]
pub(crate) struct ListenerIds {
    next: AtomicU64,
}

impl ListenerIds {
    pub fn next(&self) -> ListenerId {
        ListenerId(self.next.fetch_add(1, Ordering::Relaxed) + 1)
    }
}
