//! Listener registration strategies
//!
//! The host is probed once, when a `Dom` is built. Every later registration
//! goes straight to the chosen implementation with no per-call branching.
//!
//! | host                         | registrar           | readiness signal                       |
//! |------------------------------|---------------------|----------------------------------------|
//! | has `addEventListener`       | `StandardRegistrar` | `DOMContentLoaded`                     |
//! | `attachEvent` only           | `LegacyRegistrar`   | `onreadystatechange` until body exists |

use dom::{
    Document, Event, EventCallback, ListenerId, NodeId, Result, WeakDocument, CONTENT_LOADED,
    READY_STATE_CHANGE,
};
use parking_lot::Mutex;
use std::sync::Arc;

/// Callback for `wait_for_body`
pub type ReadyCallback = Box<dyn FnOnce() + Send>;

/// One way of talking to the host's listener API
pub trait ListenerRegistrar: Send + Sync {
    /// Human-readable name for logging
    fn name(&self) -> &'static str;

    fn register(
        &self,
        document: &Document,
        target: NodeId,
        event: &str,
        callback: EventCallback,
    ) -> Result<ListenerId>;

    fn unregister(
        &self,
        document: &Document,
        target: NodeId,
        event: &str,
        id: ListenerId,
    ) -> Result<bool>;

    /// Run `callback` once the host says the body is available, then stop
    /// listening.
    fn on_ready(&self, document: &Document, callback: ReadyCallback) -> Result<()>;
}

/// Probe the host and pick the registrar it supports
pub fn select(document: &Document) -> Box<dyn ListenerRegistrar> {
    if document.supports_add_event_listener() {
        Box::new(StandardRegistrar)
    } else {
        Box::new(LegacyRegistrar)
    }
}

/// `addEventListener(type, callback, false)`
#[derive(Debug, Default, Clone, Copy)]
pub struct StandardRegistrar;

impl ListenerRegistrar for StandardRegistrar {
    fn name(&self) -> &'static str {
        "addEventListener"
    }

    fn register(
        &self,
        document: &Document,
        target: NodeId,
        event: &str,
        callback: EventCallback,
    ) -> Result<ListenerId> {
        document.add_event_listener(target, event, callback, false)
    }

    fn unregister(
        &self,
        document: &Document,
        target: NodeId,
        event: &str,
        id: ListenerId,
    ) -> Result<bool> {
        document.remove_event_listener(target, event, id)
    }

    fn on_ready(&self, document: &Document, callback: ReadyCallback) -> Result<()> {
        one_shot::<Self>(document, CONTENT_LOADED, callback)
    }
}

/// `attachEvent("on" + type, callback)`. No capture phase on this path.
#[derive(Debug, Default, Clone, Copy)]
pub struct LegacyRegistrar;

impl LegacyRegistrar {
    fn handler_name(event: &str) -> String {
        format!("on{}", event)
    }
}

impl ListenerRegistrar for LegacyRegistrar {
    fn name(&self) -> &'static str {
        "attachEvent"
    }

    fn register(
        &self,
        document: &Document,
        target: NodeId,
        event: &str,
        callback: EventCallback,
    ) -> Result<ListenerId> {
        document.attach_event(target, &Self::handler_name(event), callback)
    }

    fn unregister(
        &self,
        document: &Document,
        target: NodeId,
        event: &str,
        id: ListenerId,
    ) -> Result<bool> {
        document.detach_event(target, &Self::handler_name(event), id)
    }

    fn on_ready(&self, document: &Document, callback: ReadyCallback) -> Result<()> {
        one_shot::<Self>(document, READY_STATE_CHANGE, callback)
    }
}

/// A readiness wait shared by its event handler and the registering call
struct PendingReady {
    document: WeakDocument,
    node: NodeId,
    event: &'static str,
    callback: Mutex<Option<ReadyCallback>>,
    registration: Mutex<Option<ListenerId>>,
}

impl PendingReady {
    /// If the body exists, drop the listener and run the callback. Both are
    /// taken out of their slots, so each happens at most once whichever
    /// caller gets here first.
    fn fire<R: ListenerRegistrar + Default>(&self, document: &Document) {
        if document.body().is_none() {
            return;
        }

        let id = self.registration.lock().take();
        if let Some(id) = id {
            if let Err(err) = R::default().unregister(document, self.node, self.event, id) {
                tracing::warn!(%err, event = self.event, "failed to remove readiness listener");
            }
        }

        let callback = self.callback.lock().take();
        if let Some(callback) = callback {
            tracing::debug!(document = %document.id(), event = self.event, "body ready");
            callback();
        }
    }
}

/// Listen for `event` on the document node. The first time it fires with
/// the body present, the handler unregisters itself and runs `callback`.
///
/// The body is checked again once the listener is in place, so a signal
/// delivered by another thread before registration is not missed. The
/// handler only keeps a weak document handle, so a pending wait does not
/// keep the document alive.
fn one_shot<R>(document: &Document, event: &'static str, callback: ReadyCallback) -> Result<()>
where
    R: ListenerRegistrar + Default + 'static,
{
    let pending = Arc::new(PendingReady {
        document: document.downgrade(),
        node: document.document_node(),
        event,
        callback: Mutex::new(Some(callback)),
        registration: Mutex::new(None),
    });

    let handler_state = pending.clone();
    let handler: EventCallback = Arc::new(move |_: &Event| {
        if let Some(document) = handler_state.document.upgrade() {
            handler_state.fire::<R>(&document);
        }
    });

    let id = R::default().register(document, pending.node, event, handler)?;
    *pending.registration.lock() = Some(id);

    pending.fire::<R>(document);
    Ok(())
}
