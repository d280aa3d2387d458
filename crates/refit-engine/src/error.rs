//! Normalized error types for engine operations.

use std::fmt;

use refit_dom::DomError;

/// Errors an engine step can surface.
///
/// Steps are independent and best-effort: the orchestrator only propagates
/// failures from anchor waits and the workspace-count probe; cosmetic steps
/// log and continue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// A required root element is not present. Produced only on paths that
    /// query rather than wait; waiting on an anchor with no timeout suspends
    /// instead of reporting.
    MissingAnchor { selector: String },

    /// A bounded wait expired before the query matched.
    WaitTimeout { selector: String },

    /// A wait was cancelled via its cancellation token.
    WaitCancelled { selector: String },

    /// The host-document boundary failed underneath the engine.
    Document(DomError),
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingAnchor { selector } => {
                write!(f, "anchor element {selector:?} not present")
            }
            Self::WaitTimeout { selector } => {
                write!(f, "timed out waiting for {selector:?}")
            }
            Self::WaitCancelled { selector } => {
                write!(f, "wait for {selector:?} cancelled")
            }
            Self::Document(err) => write!(f, "host document: {err}"),
        }
    }
}

impl std::error::Error for EngineError {}

impl From<DomError> for EngineError {
    fn from(err: DomError) -> Self {
        Self::Document(err)
    }
}

impl EngineError {
    /// Whether this is a wait that ended without the element (timeout or
    /// cancellation) rather than a document failure.
    pub fn is_unresolved_wait(&self) -> bool {
        matches!(self, Self::WaitTimeout { .. } | Self::WaitCancelled { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_the_selector() {
        let err = EngineError::WaitTimeout {
            selector: ".p-tab_rail".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains(".p-tab_rail"), "msg={msg}");
    }

    #[test]
    fn unresolved_wait_classification() {
        assert!(EngineError::WaitTimeout {
            selector: "x".into()
        }
        .is_unresolved_wait());
        assert!(EngineError::WaitCancelled {
            selector: "x".into()
        }
        .is_unresolved_wait());
        assert!(!EngineError::MissingAnchor {
            selector: "x".into()
        }
        .is_unresolved_wait());
    }
}
