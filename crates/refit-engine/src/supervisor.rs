//! Supervisor loops for host-recreated elements.
//!
//! Certain host-owned elements (the bottom control strip, the avatar
//! container) are destroyed and recreated by the host on internal view
//! changes. A supervisor loop relocates the current instance into a target
//! container, tags it with a stable id (removing any stale element carrying
//! that id first), then waits for the *next* untagged instance and recurs.
//! Strictly serial: relocation N+1 never begins before instance N's wait
//! resolves.
//!
//! The loop never terminates on its own; it owns a cancellation token so the
//! lifecycle is explicit — the CLI stops it on shutdown, tests in teardown.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use refit_core::Logger;
use refit_dom::{HostDocument, Selector};

use crate::error::EngineError;
use crate::selectors;
use crate::waiter::{wait_for_element, wait_for_element_excluding, WaitOptions};

/// Handle to a background engine task. Dropping the handle does not stop the
/// task; call [`TaskHandle::stop`] or [`TaskHandle::stopped`].
pub struct TaskHandle {
    name: String,
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl TaskHandle {
    pub fn new(name: impl Into<String>, cancel: CancellationToken, handle: JoinHandle<()>) -> Self {
        Self {
            name: name.into(),
            cancel,
            handle,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Request the task to stop. Returns immediately.
    pub fn stop(&self) {
        self.cancel.cancel();
    }

    /// Stop the task and wait for it to finish.
    pub async fn stopped(self) {
        self.cancel.cancel();
        let _ = self.handle.await;
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

/// What a relocation loop supervises.
#[derive(Debug, Clone)]
pub struct RelocationSpec {
    /// Task name, for logs and handles.
    pub name: String,
    /// The untagged selector the host's own instances match.
    pub source: Selector,
    /// The container instances are relocated into (appended).
    pub target: Selector,
    /// Stable id stamped onto the relocated instance; also the key used to
    /// drop stale instances from earlier rounds.
    pub tag_id: String,
}

/// Spawn a relocation loop for `spec`. Runs until stopped or until the
/// document goes away.
pub fn spawn_relocation_loop(
    doc: Arc<dyn HostDocument>,
    spec: RelocationSpec,
    logger: Logger,
) -> TaskHandle {
    let cancel = CancellationToken::new();
    let task_cancel = cancel.clone();
    let name = spec.name.clone();
    let handle = tokio::spawn(async move {
        relocation_loop(doc, spec, logger, task_cancel).await;
    });
    TaskHandle::new(name, cancel, handle)
}

async fn relocation_loop(
    doc: Arc<dyn HostDocument>,
    spec: RelocationSpec,
    logger: Logger,
    cancel: CancellationToken,
) {
    let wait = WaitOptions::forever().cancelled_by(cancel.clone());
    let logger = logger.with_field("loop", &spec.name);

    loop {
        // (3)+(4) of the cycle: this wait is also the entry point, so the
        // first pass picks up the instance that already exists.
        let instance = match wait_for_element_excluding(
            doc.as_ref(),
            &spec.source,
            Some(&spec.tag_id),
            &wait,
        )
        .await
        {
            Ok(node) => node,
            Err(EngineError::WaitCancelled { .. }) => return,
            Err(err) => {
                logger.warn_with("supervisor wait failed", &[("error", &err.to_string())]);
                return;
            }
        };

        // Drop stale instances from the previous round before re-inserting.
        match doc.query_all(&selectors::by_id(&spec.tag_id)).await {
            Ok(stale) => {
                for node in stale {
                    let _ = doc.remove(node).await;
                }
            }
            Err(err) => {
                logger.warn_with("stale lookup failed", &[("error", &err.to_string())]);
                return;
            }
        }

        // Tag, then relocate. The host may tear the instance down under us at
        // any point; a stale-node failure just restarts the cycle.
        if doc
            .set_attribute(instance, "id", &spec.tag_id)
            .await
            .is_err()
        {
            continue;
        }

        let target = match doc.query(&spec.target).await {
            Ok(Some(target)) => target,
            Ok(None) => match wait_for_element(doc.as_ref(), &spec.target, &wait).await {
                Ok(target) => target,
                Err(EngineError::WaitCancelled { .. }) => return,
                Err(err) => {
                    logger.warn_with("target wait failed", &[("error", &err.to_string())]);
                    return;
                }
            },
            Err(err) => {
                logger.warn_with("target lookup failed", &[("error", &err.to_string())]);
                return;
            }
        };

        if let Err(err) = doc.append_child(target, instance).await {
            logger.debug_with(
                "relocation lost a race with the host",
                &[("error", &err.to_string())],
            );
            continue;
        }

        logger.debug_with("relocated instance", &[("node", &instance.to_string())]);
    }
}
