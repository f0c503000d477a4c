//! Document - the host-facing API over the arena
//!
//! A `Document` is a cheap handle (`Arc` inside); clones share the same tree,
//! listeners and ready state. The lock around the arena is never held while
//! listener callbacks run, so callbacks are free to call back into the
//! document.
//!
//! The lifecycle methods (`insert_body`, `set_ready_state`,
//! `finish_loading`) are the parser's side of the contract: they are what
//! produces `readystatechange` and `DOMContentLoaded`.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Weak};
use uuid::Uuid;

use crate::arena::DomArena;
use crate::error::{DomError, Result};
use crate::events::{
    Event, EventCallback, EventPhase, Listener, ListenerId, ListenerIds, ListenerRegistry,
};
use crate::serializer::DomSerializer;
use crate::style::CssStyleDeclaration;
use crate::types::{DomNode, EventModel, NodeId, NodeType, ReadyState};
use crate::utils;

pub const CONTENT_LOADED: &str = "DOMContentLoaded";
pub const READY_STATE_CHANGE: &str = "readystatechange";

/// Prefix legacy handler names carry (`onclick`, `onreadystatechange`)
pub const LEGACY_PREFIX: &str = "on";

/// Document configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentConfig {
    pub id: String,
    pub url: String,
    pub event_model: EventModel,
    /// Ready state at construction
    pub ready_state: ReadyState,
    /// Build `<body>` up front. Forced on once the ready state leaves `loading`.
    pub with_body: bool,
}

impl Default for DocumentConfig {
    fn default() -> Self {
        Self {
            id: Uuid::now_v7().to_string(),
            url: "about:blank".to_string(),
            event_model: EventModel::Standard,
            ready_state: ReadyState::Complete,
            with_body: true,
        }
    }
}

impl DocumentConfig {
    /// Parse a JSON config; missing fields take their defaults
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// A document still being parsed: no body, `readyState == "loading"`
    pub fn loading(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ready_state: ReadyState::Loading,
            with_body: false,
            ..Self::default()
        }
    }

    pub fn with_event_model(mut self, event_model: EventModel) -> Self {
        self.event_model = event_model;
        self
    }
}

struct DocumentInner {
    config: DocumentConfig,
    arena: RwLock<DomArena>,
    ready_state: RwLock<ReadyState>,
    body: RwLock<Option<NodeId>>,

    document_node: NodeId,
    html: NodeId,
    head: NodeId,

    ids: ListenerIds,
    listeners: ListenerRegistry,
    legacy_listeners: ListenerRegistry,
}

/// HTML document handle
#[derive(Clone)]
pub struct Document {
    inner: Arc<DocumentInner>,
}

/// Non-owning document handle, for callbacks stored inside the document
#[derive(Clone)]
pub struct WeakDocument {
    inner: Weak<DocumentInner>,
}

impl WeakDocument {
    pub fn upgrade(&self) -> Option<Document> {
        self.inner.upgrade().map(|inner| Document { inner })
    }
}

impl Document {
    /// Create a document with `<html>`, `<head>` and (optionally) `<body>`
    pub fn new(config: DocumentConfig) -> Self {
        let mut arena = DomArena::new();

        let document_node = arena.add_node(DomNode::document());
        let html = arena.add_node(DomNode::element("html"));
        let head = arena.add_node(DomNode::element("head"));

        // Freshly created nodes: these appends cannot fail
        let skeleton = arena
            .set_root(document_node)
            .and_then(|_| arena.append_child(document_node, html))
            .and_then(|_| arena.append_child(html, head));
        debug_assert!(skeleton.is_ok(), "document skeleton: {:?}", skeleton);

        let body = if config.with_body || config.ready_state.is_parsed() {
            let body = arena.add_node(DomNode::element("body"));
            let appended = arena.append_child(html, body);
            debug_assert!(appended.is_ok(), "initial body: {:?}", appended);
            Some(body)
        } else {
            None
        };

        tracing::debug!(
            id = %config.id,
            url = %config.url,
            event_model = ?config.event_model,
            ready_state = %config.ready_state,
            "created document"
        );

        Self {
            inner: Arc::new(DocumentInner {
                ready_state: RwLock::new(config.ready_state),
                config,
                arena: RwLock::new(arena),
                body: RwLock::new(body),
                document_node,
                html,
                head,
                ids: ListenerIds::default(),
                listeners: ListenerRegistry::default(),
                legacy_listeners: ListenerRegistry::default(),
            }),
        }
    }

    /// `about:blank`, fully loaded, standard event model
    pub fn blank() -> Self {
        Self::new(DocumentConfig::default())
    }

    /// A document whose parser has not produced `<body>` yet
    pub fn loading(url: impl Into<String>) -> Self {
        Self::new(DocumentConfig::loading(url))
    }

    pub fn downgrade(&self) -> WeakDocument {
        WeakDocument {
            inner: Arc::downgrade(&self.inner),
        }
    }

    pub fn id(&self) -> &str {
        &self.inner.config.id
    }

    pub fn url(&self) -> &str {
        &self.inner.config.url
    }

    pub fn event_model(&self) -> EventModel {
        self.inner.config.event_model
    }

    /// Feature probe: does this host have `addEventListener`?
    pub fn supports_add_event_listener(&self) -> bool {
        self.event_model() == EventModel::Standard
    }

    /// The `#document` node
    pub fn document_node(&self) -> NodeId {
        self.inner.document_node
    }

    /// The `<html>` element
    pub fn document_element(&self) -> NodeId {
        self.inner.html
    }

    pub fn head(&self) -> NodeId {
        self.inner.head
    }

    /// `document.body`; `None` while the parser has not reached it
    pub fn body(&self) -> Option<NodeId> {
        *self.inner.body.read()
    }

    pub fn ready_state(&self) -> ReadyState {
        *self.inner.ready_state.read()
    }

    // ---- node construction ----

    pub fn create_element(&self, tag_name: &str) -> Result<NodeId> {
        if !utils::is_valid_element_name(tag_name) {
            return Err(DomError::InvalidCharacter(tag_name.to_string()));
        }
        Ok(self.inner.arena.write().add_node(DomNode::element(tag_name)))
    }

    pub fn create_text_node(&self, content: &str) -> NodeId {
        self.inner.arena.write().add_node(DomNode::text(content))
    }

    pub fn create_comment(&self, content: &str) -> NodeId {
        self.inner.arena.write().add_node(DomNode::comment(content))
    }

    // ---- node inspection ----

    /// Run `f` against a node under the read lock
    pub fn with_node<T>(&self, node_id: NodeId, f: impl FnOnce(&DomNode) -> T) -> Result<T> {
        let arena = self.inner.arena.read();
        Ok(f(arena.get(node_id)?))
    }

    pub fn node_name(&self, node_id: NodeId) -> Result<String> {
        self.with_node(node_id, |node| node.node_name.clone())
    }

    pub fn node_type(&self, node_id: NodeId) -> Result<NodeType> {
        self.with_node(node_id, |node| node.node_type)
    }

    /// `textContent`: the node's own data for text, concatenated descendant
    /// text for elements
    pub fn text_content(&self, node_id: NodeId) -> Result<String> {
        utils::get_text_content(&self.inner.arena.read(), node_id)
    }

    pub fn child_nodes(&self, node_id: NodeId) -> Result<Vec<NodeId>> {
        self.with_node(node_id, |node| node.children_ids.to_vec())
    }

    pub fn child_count(&self, node_id: NodeId) -> Result<usize> {
        self.with_node(node_id, |node| node.children_ids.len())
    }

    pub fn parent_node(&self, node_id: NodeId) -> Result<Option<NodeId>> {
        self.with_node(node_id, |node| node.parent_id)
    }

    /// Elements with the given tag name under the `#document` node
    pub fn get_elements_by_tag_name(&self, tag_name: &str) -> Result<Vec<NodeId>> {
        self.inner
            .arena
            .read()
            .find_by_tag(self.inner.document_node, tag_name)
    }

    pub fn outer_html(&self, node_id: NodeId) -> Result<String> {
        DomSerializer::new().serialize(&self.inner.arena.read(), node_id)
    }

    // ---- tree mutation ----

    /// `parent.appendChild(child)`; moves `child` if it is already attached
    pub fn append_child(&self, parent: NodeId, child: NodeId) -> Result<NodeId> {
        self.inner.arena.write().append_child(parent, child)?;
        tracing::trace!(parent, child, "appended child");
        Ok(child)
    }

    /// `parent.removeChild(child)`
    pub fn remove_child(&self, parent: NodeId, child: NodeId) -> Result<NodeId> {
        self.inner.arena.write().remove_child(parent, child)?;
        tracing::trace!(parent, child, "removed child");
        Ok(child)
    }

    // ---- attributes and style ----

    pub fn get_attribute(&self, element: NodeId, name: &str) -> Result<Option<String>> {
        let arena = self.inner.arena.read();
        Ok(arena.element(element)?.attr(name).map(str::to_string))
    }

    pub fn set_attribute(&self, element: NodeId, name: &str, value: &str) -> Result<()> {
        self.inner.arena.write().element_mut(element)?.set_attr(name, value);
        Ok(())
    }

    pub fn remove_attribute(&self, element: NodeId, name: &str) -> Result<Option<String>> {
        Ok(self.inner.arena.write().element_mut(element)?.remove_attr(name))
    }

    /// `element.className`; an absent attribute reads as `""`
    pub fn class_name(&self, element: NodeId) -> Result<String> {
        Ok(self.get_attribute(element, "class")?.unwrap_or_default())
    }

    pub fn set_class_name(&self, element: NodeId, class_name: &str) -> Result<()> {
        self.set_attribute(element, "class", class_name)
    }

    /// Snapshot of `element.style`
    pub fn style(&self, element: NodeId) -> Result<CssStyleDeclaration> {
        let arena = self.inner.arena.read();
        Ok(arena.element(element)?.style.clone().unwrap_or_default())
    }

    pub fn css_text(&self, element: NodeId) -> Result<String> {
        Ok(self.style(element)?.css_text())
    }

    /// `element.style.cssText = css_text`: replaces the whole block
    pub fn set_css_text(&self, element: NodeId, css_text: &str) -> Result<()> {
        let mut arena = self.inner.arena.write();
        let node = arena.element_mut(element)?;

        let serialized = CssStyleDeclaration::parse(css_text).css_text();
        node.set_attr("style", serialized);
        Ok(())
    }

    /// `element.style.setProperty(name, value)`
    pub fn set_style_property(&self, element: NodeId, name: &str, value: &str) -> Result<()> {
        let mut arena = self.inner.arena.write();
        let node = arena.element_mut(element)?;

        let mut style = node.style.clone().unwrap_or_default();
        style.set_property(name, value);
        node.set_attr("style", style.css_text());
        Ok(())
    }

    // ---- listeners ----

    /// `target.addEventListener(type, callback, capture)`
    pub fn add_event_listener(
        &self,
        target: NodeId,
        event_type: &str,
        callback: EventCallback,
        capture: bool,
    ) -> Result<ListenerId> {
        if !self.supports_add_event_listener() {
            return Err(DomError::NotSupported("addEventListener".to_string()));
        }
        self.with_node(target, |_| ())?;

        let id = self.inner.ids.next();
        self.inner
            .listeners
            .add(id, target, event_type, capture, callback);
        tracing::debug!(node = target, event_type, %id, capture, "added event listener");
        Ok(id)
    }

    /// `target.removeEventListener(type, callback)`; false if not registered
    pub fn remove_event_listener(
        &self,
        target: NodeId,
        event_type: &str,
        id: ListenerId,
    ) -> Result<bool> {
        if !self.supports_add_event_listener() {
            return Err(DomError::NotSupported("removeEventListener".to_string()));
        }

        let removed = self.inner.listeners.remove(target, event_type, id);
        tracing::debug!(node = target, event_type, %id, removed, "removed event listener");
        Ok(removed)
    }

    /// `target.attachEvent(name, callback)`, legacy hosts only.
    ///
    /// `name` is the handler name (`onclick`). A name without the `on`
    /// prefix is accepted but never matches a dispatched event.
    pub fn attach_event(&self, target: NodeId, name: &str, callback: EventCallback) -> Result<ListenerId> {
        if self.supports_add_event_listener() {
            return Err(DomError::NotSupported("attachEvent".to_string()));
        }
        self.with_node(target, |_| ())?;

        if !name.starts_with(LEGACY_PREFIX) {
            tracing::warn!(node = target, name, "legacy handler name without 'on' prefix will never fire");
        }

        let id = self.inner.ids.next();
        self.inner
            .legacy_listeners
            .add(id, target, name, false, callback);
        tracing::debug!(node = target, name, %id, "attached legacy handler");
        Ok(id)
    }

    /// `target.detachEvent(name, callback)`; false if not attached
    pub fn detach_event(&self, target: NodeId, name: &str, id: ListenerId) -> Result<bool> {
        if self.supports_add_event_listener() {
            return Err(DomError::NotSupported("detachEvent".to_string()));
        }

        let removed = self.inner.legacy_listeners.remove(target, name, id);
        tracing::debug!(node = target, name, %id, removed, "detached legacy handler");
        Ok(removed)
    }

    /// Number of listeners for `event_type` on `target`, both APIs combined
    pub fn listener_count(&self, target: NodeId, event_type: &str) -> usize {
        self.inner.listeners.count(target, event_type)
            + self
                .inner
                .legacy_listeners
                .count(target, &legacy_name(event_type))
    }

    /// `target.dispatchEvent(event)`.
    ///
    /// Capture phase from the root down, then the target, then (for bubbling
    /// events) back up. Legacy handlers run after standard listeners on each
    /// node and never see the capture phase. Returns `false` if a listener
    /// cancelled the event.
    pub fn dispatch_event(&self, target: NodeId, mut event: Event) -> Result<bool> {
        let path = self.inner.arena.read().ancestors(target)?;
        event.set_target(target);

        tracing::trace!(node = target, event_type = event.event_type(), depth = path.len(), "dispatching event");

        'dispatch: {
            for &node in path.iter().skip(1).rev() {
                event.enter(node, EventPhase::Capturing);
                self.invoke(node, &event, Some(true));
                if event.propagation_stopped() {
                    break 'dispatch;
                }
            }

            event.enter(target, EventPhase::AtTarget);
            self.invoke(target, &event, None);
            self.invoke_legacy(target, &event);
            if event.propagation_stopped() || !event.bubbles() {
                break 'dispatch;
            }

            for &node in path.iter().skip(1) {
                event.enter(node, EventPhase::Bubbling);
                self.invoke(node, &event, Some(false));
                self.invoke_legacy(node, &event);
                if event.propagation_stopped() {
                    break 'dispatch;
                }
            }
        }

        event.finish();
        Ok(!event.default_prevented())
    }

    /// Run standard listeners on one node. `capture` filters by phase;
    /// `None` runs both kinds (at-target phase).
    fn invoke(&self, node: NodeId, event: &Event, capture: Option<bool>) {
        let listeners = self.inner.listeners.snapshot(node, event.event_type());
        self.run(&self.inner.listeners, node, event.event_type(), listeners, event, capture);
    }

    fn invoke_legacy(&self, node: NodeId, event: &Event) {
        if event.immediate_propagation_stopped() {
            return;
        }
        let name = legacy_name(event.event_type());
        let listeners = self.inner.legacy_listeners.snapshot(node, &name);
        self.run(&self.inner.legacy_listeners, node, &name, listeners, event, None);
    }

    fn run(
        &self,
        registry: &ListenerRegistry,
        node: NodeId,
        name: &str,
        listeners: Vec<Listener>,
        event: &Event,
        capture: Option<bool>,
    ) {
        for listener in listeners {
            if event.immediate_propagation_stopped() {
                break;
            }
            if capture.is_some_and(|c| c != listener.capture) {
                continue;
            }
            // Removed by an earlier listener during this dispatch
            if !registry.contains(node, name, listener.id) {
                continue;
            }
            (listener.callback)(event);
        }
    }

    // ---- lifecycle ----

    /// Create `<body>` under `<html>` if the parser has not yet; returns it
    pub fn insert_body(&self) -> NodeId {
        let mut body = self.inner.body.write();
        if let Some(existing) = *body {
            return existing;
        }

        let mut arena = self.inner.arena.write();
        let id = arena.add_node(DomNode::element("body"));
        let appended = arena.append_child(self.inner.html, id);
        debug_assert!(appended.is_ok(), "inserted body: {:?}", appended);
        *body = Some(id);

        tracing::debug!(document = %self.id(), body = id, "body inserted");
        id
    }

    /// Advance `readyState`, firing `readystatechange` for every step and
    /// `DOMContentLoaded` when entering `interactive` on a standard host.
    ///
    /// Leaving `loading` implies the parser is done, so `<body>` is created
    /// first if it does not exist yet. Moving backwards is an error.
    ///
    /// Each step is claimed under the state lock, so a step fires once even
    /// when a listener (or another thread) advances the state meanwhile.
    pub fn set_ready_state(&self, state: ReadyState) -> Result<()> {
        let current = self.ready_state();
        if state < current {
            return Err(DomError::InvalidState(format!(
                "readyState cannot go from {} back to {}",
                current, state
            )));
        }

        while let Some(step) = self.advance_ready_state(state) {
            tracing::debug!(document = %self.id(), ready_state = %step, "ready state changed");

            let document = self.inner.document_node;
            self.dispatch_event(document, Event::new(READY_STATE_CHANGE))?;

            if step == ReadyState::Interactive && self.supports_add_event_listener() {
                self.dispatch_event(document, Event::new(CONTENT_LOADED).bubbling())?;
            }
        }

        Ok(())
    }

    /// Move one step towards `target`; `None` once the stored state is there
    fn advance_ready_state(&self, target: ReadyState) -> Option<ReadyState> {
        let mut ready_state = self.inner.ready_state.write();
        if *ready_state >= target {
            return None;
        }

        let next = ready_state.next()?;
        if next.is_parsed() {
            self.insert_body();
        }
        *ready_state = next;
        Some(next)
    }

    /// Parser finished and all subresources loaded
    pub fn finish_loading(&self) -> Result<()> {
        self.set_ready_state(ReadyState::Complete)
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::blank()
    }
}

impl std::fmt::Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Document")
            .field("id", &self.id())
            .field("url", &self.url())
            .field("event_model", &self.event_model())
            .field("ready_state", &self.ready_state())
            .finish()
    }
}

fn legacy_name(event_type: &str) -> String {
    format!("{}{}", LEGACY_PREFIX, event_type)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    fn counter() -> (Arc<AtomicUsize>, EventCallback) {
        let count = Arc::new(AtomicUsize::new(0));
        let inner = count.clone();
        (
            count,
            Arc::new(move |_: &Event| {
                inner.fetch_add(1, Ordering::SeqCst);
            }),
        )
    }

    #[test]
    fn test_blank_document_structure() {
        let doc = Document::blank();

        assert_eq!(doc.node_name(doc.document_node()).unwrap(), "#document");
        assert_eq!(doc.node_name(doc.document_element()).unwrap(), "HTML");
        assert_eq!(doc.ready_state(), ReadyState::Complete);

        let body = doc.body().unwrap();
        assert_eq!(doc.parent_node(body).unwrap(), Some(doc.document_element()));
        assert_eq!(
            doc.outer_html(doc.document_node()).unwrap(),
            "<html><head></head><body></body></html>"
        );
    }

    #[test]
    fn test_loading_document_has_no_body() {
        let doc = Document::loading("https://example.com/");

        assert_eq!(doc.body(), None);
        assert_eq!(doc.ready_state(), ReadyState::Loading);
        assert_eq!(doc.url(), "https://example.com/");
    }

    #[test]
    fn test_config_from_json_uses_defaults() {
        let config =
            DocumentConfig::from_json(r#"{"event_model": "legacy", "ready_state": "loading"}"#)
                .unwrap();

        assert_eq!(config.event_model, EventModel::Legacy);
        assert_eq!(config.ready_state, ReadyState::Loading);
        assert_eq!(config.url, "about:blank");
        assert!(!config.id.is_empty());

        assert!(matches!(
            DocumentConfig::from_json("{not json"),
            Err(DomError::Config(_))
        ));
    }

    #[test]
    fn test_create_element_validates_name() {
        let doc = Document::blank();

        assert!(doc.create_element("section").is_ok());
        assert!(matches!(
            doc.create_element("not valid"),
            Err(DomError::InvalidCharacter(_))
        ));
    }

    #[test]
    fn test_css_text_round_trip_through_attribute() {
        let doc = Document::blank();
        let el = doc.create_element("div").unwrap();

        doc.set_css_text(el, "font-size:12px").unwrap();
        assert_eq!(
            doc.style(el).unwrap().get_property_value("font-size"),
            Some("12px")
        );
        assert_eq!(
            doc.get_attribute(el, "style").unwrap().as_deref(),
            Some("font-size: 12px;")
        );

        doc.set_style_property(el, "color", "red").unwrap();
        assert_eq!(doc.css_text(el).unwrap(), "font-size: 12px; color: red;");
    }

    #[test]
    fn test_style_on_text_node_fails() {
        let doc = Document::blank();
        let text = doc.create_text_node("x");

        assert!(matches!(
            doc.set_css_text(text, "color: red"),
            Err(DomError::InvalidNodeType { .. })
        ));
    }

    #[test]
    fn test_dispatch_reaches_target_listener() {
        let doc = Document::blank();
        let el = doc.create_element("div").unwrap();
        let (count, cb) = counter();

        doc.add_event_listener(el, "test", cb, false).unwrap();
        assert!(doc.dispatch_event(el, Event::new("test")).unwrap());
        assert!(doc.dispatch_event(el, Event::new("other")).unwrap());

        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_dispatch_phases_order() {
        let doc = Document::blank();
        let body = doc.body().unwrap();
        let el = doc.create_element("button").unwrap();
        doc.append_child(body, el).unwrap();

        let log = Arc::new(Mutex::new(Vec::new()));
        let record = |label: &'static str| -> EventCallback {
            let log = log.clone();
            Arc::new(move |e: &Event| log.lock().unwrap().push((label, e.phase())))
        };

        doc.add_event_listener(body, "click", record("body-capture"), true).unwrap();
        doc.add_event_listener(body, "click", record("body-bubble"), false).unwrap();
        doc.add_event_listener(el, "click", record("target"), false).unwrap();

        doc.dispatch_event(el, Event::new("click").bubbling()).unwrap();

        assert_eq!(
            *log.lock().unwrap(),
            vec![
                ("body-capture", EventPhase::Capturing),
                ("target", EventPhase::AtTarget),
                ("body-bubble", EventPhase::Bubbling),
            ]
        );
    }

    #[test]
    fn test_non_bubbling_event_skips_ancestors() {
        let doc = Document::blank();
        let body = doc.body().unwrap();
        let el = doc.create_element("div").unwrap();
        doc.append_child(body, el).unwrap();
        let (count, cb) = counter();

        doc.add_event_listener(body, "focus", cb, false).unwrap();
        doc.dispatch_event(el, Event::new("focus")).unwrap();

        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_stop_propagation_and_prevent_default() {
        let doc = Document::blank();
        let body = doc.body().unwrap();
        let el = doc.create_element("a").unwrap();
        doc.append_child(body, el).unwrap();
        let (count, cb) = counter();

        doc.add_event_listener(
            el,
            "click",
            Arc::new(|e: &Event| {
                e.prevent_default();
                e.stop_propagation();
            }),
            false,
        )
        .unwrap();
        doc.add_event_listener(body, "click", cb, false).unwrap();

        let not_cancelled = doc
            .dispatch_event(el, Event::new("click").bubbling().cancelable())
            .unwrap();

        assert!(!not_cancelled);
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_stop_immediate_propagation_skips_same_node() {
        let doc = Document::blank();
        let el = doc.create_element("div").unwrap();
        let (count, cb) = counter();

        doc.add_event_listener(el, "x", Arc::new(|e: &Event| e.stop_immediate_propagation()), false)
            .unwrap();
        doc.add_event_listener(el, "x", cb, false).unwrap();
        doc.dispatch_event(el, Event::new("x")).unwrap();

        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_listener_removed_during_dispatch_is_skipped() {
        let doc = Document::blank();
        let el = doc.create_element("div").unwrap();
        let (count, cb) = counter();

        let second: Arc<Mutex<Option<ListenerId>>> = Arc::new(Mutex::new(None));
        let weak = doc.downgrade();
        let slot = second.clone();
        doc.add_event_listener(
            el,
            "x",
            Arc::new(move |_: &Event| {
                let id = slot.lock().unwrap().take();
                if let (Some(doc), Some(id)) = (weak.upgrade(), id) {
                    doc.remove_event_listener(el, "x", id).unwrap();
                }
            }),
            false,
        )
        .unwrap();
        let id = doc.add_event_listener(el, "x", cb, false).unwrap();
        *second.lock().unwrap() = Some(id);

        doc.dispatch_event(el, Event::new("x")).unwrap();

        assert_eq!(count.load(Ordering::SeqCst), 0);
        assert_eq!(doc.listener_count(el, "x"), 1);
    }

    #[test]
    fn test_duplicate_registration_fires_twice() {
        let doc = Document::blank();
        let el = doc.create_element("div").unwrap();
        let (count, cb) = counter();

        doc.add_event_listener(el, "x", cb.clone(), false).unwrap();
        doc.add_event_listener(el, "x", cb, false).unwrap();
        doc.dispatch_event(el, Event::new("x")).unwrap();

        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_legacy_host_uses_attach_event() {
        let doc = Document::new(DocumentConfig::default().with_event_model(EventModel::Legacy));
        let el = doc.create_element("div").unwrap();
        let (count, cb) = counter();

        assert!(!doc.supports_add_event_listener());
        assert!(matches!(
            doc.add_event_listener(el, "click", cb.clone(), false),
            Err(DomError::NotSupported(_))
        ));

        let id = doc.attach_event(el, "onclick", cb.clone()).unwrap();
        doc.attach_event(el, "click", cb).unwrap();
        doc.dispatch_event(el, Event::new("click")).unwrap();
        assert_eq!(count.load(Ordering::SeqCst), 1);

        assert!(doc.detach_event(el, "onclick", id).unwrap());
        doc.dispatch_event(el, Event::new("click")).unwrap();
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_standard_host_rejects_attach_event() {
        let doc = Document::blank();
        let el = doc.create_element("div").unwrap();
        let (_, cb) = counter();

        assert!(matches!(
            doc.attach_event(el, "onclick", cb),
            Err(DomError::NotSupported(_))
        ));
    }

    #[test]
    fn test_lifecycle_fires_in_order() {
        let doc = Document::loading("about:blank");
        let node = doc.document_node();
        let log = Arc::new(Mutex::new(Vec::new()));

        for event_type in [READY_STATE_CHANGE, CONTENT_LOADED] {
            let log = log.clone();
            let weak = doc.downgrade();
            doc.add_event_listener(
                node,
                event_type,
                Arc::new(move |e: &Event| {
                    let doc = weak.upgrade().unwrap();
                    log.lock().unwrap().push(format!(
                        "{}:{}:{}",
                        e.event_type(),
                        doc.ready_state(),
                        doc.body().is_some()
                    ));
                }),
                false,
            )
            .unwrap();
        }

        doc.finish_loading().unwrap();

        assert_eq!(
            *log.lock().unwrap(),
            vec![
                "readystatechange:interactive:true",
                "DOMContentLoaded:interactive:true",
                "readystatechange:complete:true",
            ]
        );
    }

    #[test]
    fn test_legacy_lifecycle_has_no_content_loaded() {
        let doc = Document::new(
            DocumentConfig::loading("about:blank").with_event_model(EventModel::Legacy),
        );
        let node = doc.document_node();
        let (changes, cb) = counter();

        doc.attach_event(node, "onreadystatechange", cb).unwrap();
        doc.attach_event(node, "onDOMContentLoaded", Arc::new(|_: &Event| panic!("not fired on legacy hosts")))
            .unwrap();
        doc.finish_loading().unwrap();

        assert_eq!(changes.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_ready_state_cannot_go_backwards() {
        let doc = Document::blank();

        assert!(matches!(
            doc.set_ready_state(ReadyState::Loading),
            Err(DomError::InvalidState(_))
        ));
        assert!(doc.set_ready_state(ReadyState::Complete).is_ok());
    }

    #[test]
    fn test_insert_body_is_idempotent() {
        let doc = Document::loading("about:blank");

        let first = doc.insert_body();
        let second = doc.insert_body();

        assert_eq!(first, second);
        assert_eq!(doc.get_elements_by_tag_name("body").unwrap(), vec![first]);
    }

    #[test]
    fn test_listener_advancing_state_fires_each_step_once() {
        let doc = Document::loading("about:blank");
        let node = doc.document_node();
        let states = Arc::new(Mutex::new(Vec::new()));

        let log = states.clone();
        let weak = doc.downgrade();
        doc.add_event_listener(
            node,
            READY_STATE_CHANGE,
            Arc::new(move |_: &Event| {
                let doc = weak.upgrade().unwrap();
                let state = doc.ready_state();
                log.lock().unwrap().push(state);
                if state == ReadyState::Interactive {
                    doc.set_ready_state(ReadyState::Complete).unwrap();
                }
            }),
            false,
        )
        .unwrap();

        doc.finish_loading().unwrap();

        assert_eq!(
            *states.lock().unwrap(),
            vec![ReadyState::Interactive, ReadyState::Complete]
        );
    }

    #[test]
    fn test_concurrent_finish_loading_fires_each_step_once() {
        for _ in 0..200 {
            let doc = Document::loading("about:blank");
            let (changes, cb) = counter();
            let (loaded, loaded_cb) = counter();
            doc.add_event_listener(doc.document_node(), READY_STATE_CHANGE, cb, false)
                .unwrap();
            doc.add_event_listener(doc.document_node(), CONTENT_LOADED, loaded_cb, false)
                .unwrap();

            std::thread::scope(|scope| {
                for _ in 0..2 {
                    scope.spawn(|| doc.finish_loading().unwrap());
                }
            });

            assert_eq!(changes.load(Ordering::SeqCst), 2);
            assert_eq!(loaded.load(Ordering::SeqCst), 1);
            assert_eq!(doc.ready_state(), ReadyState::Complete);
        }
    }
}
