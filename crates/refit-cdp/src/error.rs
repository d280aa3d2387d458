//! Loader-side and channel errors, surfaced to the CLI caller.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CdpError {
    /// The discovery endpoint listed no suitable host-document target.
    #[error("no host document target found at {endpoint}")]
    NoTarget { endpoint: String },

    /// The chosen target exposes no debugger URL.
    #[error("target {title:?} has no debugger url")]
    NoDebuggerUrl { title: String },

    /// HTTP or WebSocket failure underneath the channel.
    #[error("debugging channel transport: {0}")]
    Transport(String),

    /// The peer answered with something outside the protocol.
    #[error("debugging channel protocol: {0}")]
    Protocol(String),

    /// A call exceeded the request timeout.
    #[error("debugging channel call {method:?} timed out")]
    CallTimeout { method: String },

    /// The evaluated source threw in the document's context; the thrown
    /// message is surfaced as-is.
    #[error("evaluation threw: {message}")]
    EvaluationThrew { message: String },
}

impl From<CdpError> for refit_dom::DomError {
    fn from(err: CdpError) -> Self {
        match err {
            CdpError::EvaluationThrew { message } => refit_dom::DomError::Protocol(message),
            CdpError::Protocol(message) => refit_dom::DomError::Protocol(message),
            other => refit_dom::DomError::Transport(other.to_string()),
        }
    }
}
