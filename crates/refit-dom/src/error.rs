//! Errors crossing the host-document boundary.

use thiserror::Error;

use crate::document::NodeId;

/// Normalized error for host-document operations. Backends map their own
/// transport failures into these categories so the engine stays
/// transport-agnostic.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomError {
    /// The node was valid once but the host has since detached or replaced it.
    #[error("node {0} is no longer attached to the host document")]
    NodeGone(NodeId),

    /// The node id was never handed out by this document.
    #[error("unknown node {0}")]
    UnknownNode(NodeId),

    /// The underlying channel to the host document failed.
    #[error("document transport failure: {0}")]
    Transport(String),

    /// The backend returned something the boundary cannot interpret.
    #[error("document protocol violation: {0}")]
    Protocol(String),
}

impl DomError {
    /// Whether the failure concerns a single stale node (retryable by
    /// re-querying) rather than the document as a whole.
    pub fn is_stale_node(&self) -> bool {
        matches!(self, Self::NodeGone(_) | Self::UnknownNode(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stale_node_classification() {
        assert!(DomError::NodeGone(NodeId(3)).is_stale_node());
        assert!(DomError::UnknownNode(NodeId(9)).is_stale_node());
        assert!(!DomError::Transport("boom".into()).is_stale_node());
        assert!(!DomError::Protocol("bad frame".into()).is_stale_node());
    }

    #[test]
    fn display_includes_node() {
        let msg = DomError::NodeGone(NodeId(7)).to_string();
        assert!(msg.contains("#7"), "msg={msg}");
    }
}
