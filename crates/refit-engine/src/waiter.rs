//! Wait semantics for elements that do not exist yet.
//!
//! The element waiter is the sole suspension point in the engine: resolve
//! immediately if the query already matches, otherwise subscribe to the
//! document event bus and re-test on every batch. No timeout by default: an
//! unmatched query suspends until the document goes away, and callers that
//! want a bound pass one explicitly. The subscription is scope-owned and
//! released on every exit path.

use std::time::Duration;

use tokio_util::sync::CancellationToken;

use refit_dom::{HostDocument, NodeId, Selector};

use crate::error::EngineError;

/// Options for a wait: an optional deadline and a cancellation token.
///
/// The default waits forever and is never cancelled.
#[derive(Debug, Clone, Default)]
pub struct WaitOptions {
    pub timeout: Option<Duration>,
    pub cancel: CancellationToken,
}

impl WaitOptions {
    /// Wait forever (the default).
    pub fn forever() -> Self {
        Self::default()
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout: Some(timeout),
            cancel: CancellationToken::new(),
        }
    }

    pub fn cancelled_by(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }
}

/// Resolve once an element matching `selector` exists.
pub async fn wait_for_element(
    doc: &dyn HostDocument,
    selector: &Selector,
    opts: &WaitOptions,
) -> Result<NodeId, EngineError> {
    wait_for_element_excluding(doc, selector, None, opts).await
}

/// Resolve once an element matching `selector` exists whose `id` attribute is
/// not `excluded_id`. Supervisor loops use this to wait for the *next*
/// host-created instance while their own relocated, tagged instance still
/// matches the structural selector.
pub async fn wait_for_element_excluding(
    doc: &dyn HostDocument,
    selector: &Selector,
    excluded_id: Option<&str>,
    opts: &WaitOptions,
) -> Result<NodeId, EngineError> {
    // Fast path: the element may already be there.
    if let Some(node) = find_match(doc, selector, excluded_id).await? {
        return Ok(node);
    }

    let mut subscription = doc.subscribe();

    // The host may have rendered the element between the fast-path check and
    // the subscription; re-test once before suspending.
    if let Some(node) = find_match(doc, selector, excluded_id).await? {
        return Ok(node);
    }

    let deadline = opts.timeout.map(|t| tokio::time::Instant::now() + t);

    loop {
        tokio::select! {
            biased;
            _ = opts.cancel.cancelled() => {
                return Err(EngineError::WaitCancelled {
                    selector: selector.to_css(),
                });
            }
            _ = deadline_elapsed(deadline) => {
                return Err(EngineError::WaitTimeout {
                    selector: selector.to_css(),
                });
            }
            event = subscription.next() => {
                match event {
                    Some(_) => {
                        if let Some(node) = find_match(doc, selector, excluded_id).await? {
                            return Ok(node);
                        }
                    }
                    None => {
                        return Err(EngineError::Document(refit_dom::DomError::Transport(
                            "document event bus closed".into(),
                        )));
                    }
                }
            }
        }
    }
}

/// Resolve once no element matches `selector` (the prober's close step).
pub async fn wait_for_absence(
    doc: &dyn HostDocument,
    selector: &Selector,
    opts: &WaitOptions,
) -> Result<(), EngineError> {
    if doc.query(selector).await?.is_none() {
        return Ok(());
    }

    let mut subscription = doc.subscribe();

    if doc.query(selector).await?.is_none() {
        return Ok(());
    }

    let deadline = opts.timeout.map(|t| tokio::time::Instant::now() + t);

    loop {
        tokio::select! {
            biased;
            _ = opts.cancel.cancelled() => {
                return Err(EngineError::WaitCancelled {
                    selector: selector.to_css(),
                });
            }
            _ = deadline_elapsed(deadline) => {
                return Err(EngineError::WaitTimeout {
                    selector: selector.to_css(),
                });
            }
            event = subscription.next() => {
                match event {
                    Some(_) => {
                        if doc.query(selector).await?.is_none() {
                            return Ok(());
                        }
                    }
                    None => {
                        return Err(EngineError::Document(refit_dom::DomError::Transport(
                            "document event bus closed".into(),
                        )));
                    }
                }
            }
        }
    }
}

async fn find_match(
    doc: &dyn HostDocument,
    selector: &Selector,
    excluded_id: Option<&str>,
) -> Result<Option<NodeId>, EngineError> {
    match excluded_id {
        None => Ok(doc.query(selector).await?),
        Some(excluded) => {
            for node in doc.query_all(selector).await? {
                let id = doc.attribute(node, "id").await?;
                if id.as_deref() != Some(excluded) {
                    return Ok(Some(node));
                }
            }
            Ok(None)
        }
    }
}

/// Pends forever when no deadline is set.
async fn deadline_elapsed(deadline: Option<tokio::time::Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending::<()>().await,
    }
}
