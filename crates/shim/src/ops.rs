//! The utility namespace
//!
//! Each method is a direct delegation to the host document. Errors from
//! the host come back unchanged.

use dom::{Document, Event, EventCallback, ListenerId, NodeId, Result};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::oneshot;

use crate::classes;
use crate::listener::{self, ListenerRegistrar};

/// DOM helpers bound to one document.
///
/// Construction probes the host once for `addEventListener`; the chosen
/// registration strategy is used for every listener afterwards.
pub struct Dom {
    document: Document,
    registrar: Box<dyn ListenerRegistrar>,
}

impl Dom {
    pub fn new(document: Document) -> Self {
        let registrar = listener::select(&document);
        tracing::debug!(
            document = %document.id(),
            registrar = registrar.name(),
            "selected listener registrar"
        );
        Self {
            document,
            registrar,
        }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Name of the registration strategy picked for this host
    pub fn registrar_name(&self) -> &'static str {
        self.registrar.name()
    }

    pub fn create_element(&self, name: &str) -> Result<NodeId> {
        self.document.create_element(name)
    }

    pub fn create_text(&self, text: &str) -> NodeId {
        self.document.create_text_node(text)
    }

    /// Replace the element's whole inline style with `style`
    pub fn style(&self, element: NodeId, style: &str) -> Result<()> {
        self.document.set_css_text(element, style)
    }

    pub fn append(&self, parent: NodeId, child: NodeId) -> Result<()> {
        self.document.append_child(parent, child)?;
        Ok(())
    }

    pub fn remove(&self, parent: NodeId, child: NodeId) -> Result<()> {
        self.document.remove_child(parent, child)?;
        Ok(())
    }

    pub fn has_class(&self, element: NodeId, class_name: &str) -> Result<bool> {
        let current = self.document.class_name(element)?;
        Ok(classes::contains(&current, class_name))
    }

    pub fn add_class(&self, element: NodeId, class_name: &str) -> Result<()> {
        let current = self.document.class_name(element)?;
        if let Some(updated) = classes::with_added(&current, class_name) {
            self.document.set_class_name(element, &updated)?;
        }
        Ok(())
    }

    pub fn remove_class(&self, element: NodeId, class_name: &str) -> Result<()> {
        let current = self.document.class_name(element)?;
        if let Some(updated) = classes::with_removed(&current, class_name) {
            self.document.set_class_name(element, &updated)?;
        }
        Ok(())
    }

    pub fn replace_class(&self, element: NodeId, old_class_name: &str, new_class_name: &str) -> Result<()> {
        let current = self.document.class_name(element)?;
        if let Some(updated) = classes::with_replaced(&current, old_class_name, new_class_name) {
            self.document.set_class_name(element, &updated)?;
        }
        Ok(())
    }

    /// Register `callback` for `event` on `element`. Registering the same
    /// callback twice makes it run twice.
    pub fn add_listener<F>(&self, element: NodeId, event: &str, callback: F) -> Result<ListenerId>
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        let callback: EventCallback = Arc::new(callback);
        self.registrar
            .register(&self.document, element, event, callback)
    }

    /// Undo `add_listener`; false if `id` was not registered for `event`
    pub fn remove_listener(&self, element: NodeId, event: &str, id: ListenerId) -> Result<bool> {
        self.registrar
            .unregister(&self.document, element, event, id)
    }

    /// Run `callback` as soon as `document.body` exists: right away if it
    /// already does, otherwise once, on the host's readiness signal.
    pub fn wait_for_body<F>(&self, callback: F) -> Result<()>
    where
        F: FnOnce() + Send + 'static,
    {
        if self.document.body().is_some() {
            callback();
            return Ok(());
        }

        tracing::debug!(
            document = %self.document.id(),
            ready_state = %self.document.ready_state(),
            registrar = self.registrar.name(),
            "body not available yet, deferring"
        );
        self.registrar.on_ready(&self.document, Box::new(callback))
    }

    /// Future form of `wait_for_body`, resolving to the body element.
    ///
    /// Resolves to `None` if the document is dropped before its body shows up.
    pub fn body_ready(&self) -> Result<impl Future<Output = Option<NodeId>> + Send + 'static> {
        let (tx, rx) = oneshot::channel();
        self.wait_for_body(move || {
            let _ = tx.send(()); // Receiver may be gone
        })?;

        let document = self.document.downgrade();
        Ok(async move {
            rx.await.ok()?;
            document.upgrade()?.body()
        })
    }
}

impl std::fmt::Debug for Dom {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dom")
            .field("document", &self.document)
            .field("registrar", &self.registrar.name())
            .finish()
    }
}
