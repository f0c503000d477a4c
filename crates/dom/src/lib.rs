//! Document Object Model host
//!
//! An in-process stand-in for the browser document: arena-backed node tree,
//! inline styles, `addEventListener` / legacy `attachEvent` registries,
//! event dispatch and the `readyState` lifecycle.
//!
//! ## Core Design
//!
//! ```text
//! Document (Arc handle) ──→ RwLock<DomArena> ──→ Vec<DomNode>
//!        │                                          ↑
//!        └──→ ListenerRegistry (DashMap)        NodeId (u32)
//! ```

pub mod arena;
pub mod document;
pub mod error;
pub mod events;
pub mod serializer;
pub mod style;
pub mod types;
pub mod utils;

pub use arena::DomArena;
pub use document::{Document, DocumentConfig, WeakDocument, CONTENT_LOADED, READY_STATE_CHANGE};
pub use error::{DomError, Result};
pub use events::{Event, EventCallback, EventPhase, ListenerId};
pub use style::CssStyleDeclaration;
pub use types::*;
