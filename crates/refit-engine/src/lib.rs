//! refit-engine: the customization engine.
//!
//! Rewrites the live interface of a third-party chat-workspace client in
//! place: waits for elements that do not exist yet, probes transient UI state
//! without visible flicker, applies a declarative set of tab transformations
//! with mirrored controls, and perpetually re-asserts relocations because the
//! host replaces the very nodes being customized.
//!
//! The engine is generic over [`refit_dom::HostDocument`]; it holds no lock
//! on the document and tolerates racing the host through idempotent, keyed
//! operations (remove-by-id before insert).

pub mod error;
pub mod nav;
pub mod orchestrator;
pub mod payloads;
pub mod prober;
pub mod selectors;
pub mod styles;
pub mod supervisor;
pub mod tabs;
pub mod waiter;
pub mod workspaces;

pub use error::EngineError;
pub use orchestrator::{Engine, EngineRun};
pub use supervisor::TaskHandle;
pub use waiter::WaitOptions;
