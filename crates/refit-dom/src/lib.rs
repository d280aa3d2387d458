//! refit-dom: the host-document boundary.
//!
//! The engine never touches a concrete document; it speaks to a
//! [`HostDocument`] — declarative path queries, tree edits, opaque style
//! installation, and a subscribe/publish event bus of subtree-mutation
//! batches. Implementations:
//! - `MockDocument`: in-memory tree with scripted host reactions, for tests
//! - `CdpDocument` (refit-cdp): a live document over a debugging channel
//!
//! The host mutates its own document at arbitrary points while the engine is
//! suspended, so node handles are hints, not guarantees: callers re-validate
//! with `exists` (or simply re-query) after every await.

pub mod document;
pub mod error;
pub mod events;
pub mod mock;
pub mod selector;

pub use document::{HostDocument, NodeId};
pub use error::DomError;
pub use events::{DocumentEvent, EventBus, EventSubscription, Mutation, MutationKind};
pub use selector::{Matcher, NodeFacts, Selector};
