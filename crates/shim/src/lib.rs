//! DOM utility helpers
//!
//! A thin convenience layer over the `dom` host: element and text creation,
//! inline style replacement, child insertion and removal, class-list edits
//! that work directly on the `className` string, event listener
//! registration that works with both host listener APIs, and a
//! body-ready hook.
//!
//! ```text
//! Dom ──→ Document (host)
//!  │
//!  └──→ Box<dyn ListenerRegistrar>   chosen once: addEventListener | attachEvent
//! ```

pub mod classes;
pub mod listener;
mod ops;

pub use listener::{LegacyRegistrar, ListenerRegistrar, ReadyCallback, StandardRegistrar};
pub use ops::Dom;

pub use dom::{Document, DocumentConfig, DomError, Event, EventModel, ListenerId, NodeId, ReadyState, Result};
