//! The host-document boundary trait.

use std::fmt;

use async_trait::async_trait;

use crate::error::DomError;
use crate::events::EventSubscription;
use crate::selector::Selector;

/// An opaque handle to one element in the host document.
///
/// Handles stay meaningful only while the host keeps the node attached; the
/// host replaces nodes at will during any engine suspension, so anything that
/// crosses an await re-validates with [`HostDocument::exists`] or re-queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The live, externally-mutated interface tree the engine operates on.
///
/// All operations are async to support channel-backed documents; the mock
/// answers immediately. The engine holds no lock on the document — it relies
/// on idempotent, keyed operations to tolerate racing the host.
#[async_trait]
pub trait HostDocument: Send + Sync {
    // Queries ---------------------------------------------------------------

    /// First match in document order, if any.
    async fn query(&self, selector: &Selector) -> Result<Option<NodeId>, DomError>;

    /// All matches in document order.
    async fn query_all(&self, selector: &Selector) -> Result<Vec<NodeId>, DomError>;

    /// First match among the descendants of `root`.
    async fn query_within(
        &self,
        root: NodeId,
        selector: &Selector,
    ) -> Result<Option<NodeId>, DomError>;

    /// All matches among the descendants of `root`, in document order.
    async fn query_all_within(
        &self,
        root: NodeId,
        selector: &Selector,
    ) -> Result<Vec<NodeId>, DomError>;

    /// Whether the node is still attached to the document.
    async fn exists(&self, node: NodeId) -> Result<bool, DomError>;

    /// Whether `node` is `ancestor` or sits inside its subtree.
    async fn contains(&self, ancestor: NodeId, node: NodeId) -> Result<bool, DomError>;

    async fn parent(&self, node: NodeId) -> Result<Option<NodeId>, DomError>;

    async fn children(&self, node: NodeId) -> Result<Vec<NodeId>, DomError>;

    // Element inspection ----------------------------------------------------

    async fn tag_name(&self, node: NodeId) -> Result<String, DomError>;

    /// Concatenated text of the subtree, trimmed.
    async fn text_content(&self, node: NodeId) -> Result<String, DomError>;

    async fn attribute(&self, node: NodeId, name: &str) -> Result<Option<String>, DomError>;

    /// Serialized markup of the subtree rooted at `node`.
    async fn outer_markup(&self, node: NodeId) -> Result<String, DomError>;

    /// Serialized markup of the node's contents.
    async fn inner_markup(&self, node: NodeId) -> Result<String, DomError>;

    // Element mutation ------------------------------------------------------

    async fn set_attribute(&self, node: NodeId, name: &str, value: &str) -> Result<(), DomError>;

    async fn add_class(&self, node: NodeId, class: &str) -> Result<(), DomError>;

    async fn remove_class(&self, node: NodeId, class: &str) -> Result<(), DomError>;

    /// Replace the node's contents with pre-serialized markup. The payload is
    /// opaque to the boundary, exactly like style payloads.
    async fn set_inner_markup(&self, node: NodeId, markup: &str) -> Result<(), DomError>;

    /// Create a detached element; it joins the document via `insert_before`
    /// or `append_child`.
    async fn create_element(&self, tag: &str) -> Result<NodeId, DomError>;

    /// Insert `node` under `parent`, before `reference` (append when `None`).
    /// Inserting an already-attached node relocates it.
    async fn insert_before(
        &self,
        parent: NodeId,
        node: NodeId,
        reference: Option<NodeId>,
    ) -> Result<(), DomError>;

    async fn append_child(&self, parent: NodeId, node: NodeId) -> Result<(), DomError>;

    async fn remove(&self, node: NodeId) -> Result<(), DomError>;

    // Interaction -----------------------------------------------------------

    /// Activate the element the way a user would.
    async fn click(&self, node: NodeId) -> Result<(), DomError>;

    /// Mark a control so *user* clicks on it are forwarded onto the event
    /// bus as [`crate::events::DocumentEvent::Click`]. Engine clicks via
    /// [`HostDocument::click`] are never forwarded, so the engine cannot
    /// trip its own click actions while probing.
    async fn forward_clicks(&self, node: NodeId) -> Result<(), DomError>;

    // Styles ----------------------------------------------------------------

    /// Install a named style payload. Installing over an existing key
    /// replaces the payload; it never duplicates.
    async fn install_style(&self, key: &str, payload: &str) -> Result<(), DomError>;

    /// Remove a named style payload. Removing an absent key is a no-op.
    async fn remove_style(&self, key: &str) -> Result<(), DomError>;

    async fn style_installed(&self, key: &str) -> Result<bool, DomError>;

    // Location --------------------------------------------------------------

    /// The document's current location string.
    async fn location(&self) -> Result<String, DomError>;

    /// Navigate the host document to a new location.
    async fn navigate(&self, url: &str) -> Result<(), DomError>;

    // Events ----------------------------------------------------------------

    /// Subscribe to document events. Dropping the subscription unsubscribes.
    fn subscribe(&self) -> EventSubscription;
}
