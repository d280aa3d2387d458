//! Mirror buttons and the click-action dispatcher.
//!
//! The engine owns every control it injects. Each mirror button carries a
//! stable id derived from its source, and its behavior lives engine-side: the
//! document backend forwards user clicks onto the event bus, and the
//! dispatcher task performs the registered action.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio_util::sync::CancellationToken;

use refit_core::Logger;
use refit_dom::{DocumentEvent, HostDocument, NodeId, Selector};

use crate::error::EngineError;
use crate::prober::DiscreetProber;
use crate::selectors;
use crate::styles::StyleRegistry;
use crate::supervisor::TaskHandle;
use crate::waiter::{wait_for_absence, wait_for_element, WaitOptions};

/// What pressing an engine-owned control does.
#[derive(Debug, Clone)]
pub enum ClickAction {
    /// Activate the host element matching the selector.
    ClickTarget(Selector),
    /// Navigate the host document to a URL.
    Navigate(String),
    /// Land on the home tab and close the switcher menu the click opened.
    GoHome,
    /// Open the add-workspace flow through a discreet probe.
    AddWorkspace,
}

/// Registry mapping engine-owned controls to their actions. Cheap to clone;
/// clones share the table.
#[derive(Clone, Default)]
pub struct ClickActions {
    inner: Arc<Mutex<HashMap<NodeId, ClickAction>>>,
}

impl ClickActions {
    pub fn register(&self, node: NodeId, action: ClickAction) {
        self.lock().insert(node, action);
    }

    pub fn get(&self, node: NodeId) -> Option<ClickAction> {
        self.lock().get(&node).cloned()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<NodeId, ClickAction>> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

/// An injected mirror button: the outer container that sits in the nav strip
/// and the inner button users press.
#[derive(Debug, Clone, Copy)]
pub struct MirrorButton {
    pub container: NodeId,
    pub button: NodeId,
}

/// Build a mirror button shaped like the host's own nav buttons. The caller
/// inserts the container and registers the button's action.
pub async fn build_tab_button(
    doc: &dyn HostDocument,
    id: &str,
    aria_label: &str,
    icon_markup: &str,
) -> Result<MirrorButton, EngineError> {
    let container = doc.create_element("div").await?;
    doc.set_attribute(container, "id", id).await?;
    doc.add_class(container, "p-ia4_history_menu_button").await?;
    doc.add_class(container, "rf-tab-button").await?;

    let button = doc.create_element("button").await?;
    doc.add_class(button, "c-button-unstyled").await?;
    doc.add_class(button, "p-ia4_history_menu_button__button")
        .await?;
    doc.set_attribute(button, "data-qa", "top-nav-history-menu")
        .await?;
    doc.set_attribute(button, "aria-label", aria_label).await?;
    doc.set_attribute(button, "aria-disabled", "false").await?;
    doc.set_attribute(button, "aria-haspopup", "menu").await?;
    doc.set_attribute(button, "type", "button").await?;
    doc.set_attribute(button, "tabindex", "0").await?;
    doc.set_inner_markup(button, icon_markup).await?;

    doc.append_child(container, button).await?;
    doc.forward_clicks(button).await?;

    Ok(MirrorButton { container, button })
}

/// Spawn the dispatcher task that consumes forwarded clicks from the event
/// bus and performs the registered actions. One dispatcher per engine run.
pub fn spawn_click_dispatcher(
    doc: Arc<dyn HostDocument>,
    styles: StyleRegistry,
    actions: ClickActions,
    logger: Logger,
) -> TaskHandle {
    let cancel = CancellationToken::new();
    let task_cancel = cancel.clone();
    let handle = tokio::spawn(async move {
        dispatcher_loop(doc, styles, actions, logger, task_cancel).await;
    });
    TaskHandle::new("click-dispatcher", cancel, handle)
}

async fn dispatcher_loop(
    doc: Arc<dyn HostDocument>,
    styles: StyleRegistry,
    actions: ClickActions,
    logger: Logger,
    cancel: CancellationToken,
) {
    let mut subscription = doc.subscribe();
    let wait = WaitOptions::forever().cancelled_by(cancel.clone());

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => return,
            event = subscription.next() => {
                match event {
                    Some(DocumentEvent::Click(node)) => {
                        let Some(action) = actions.get(node) else { continue };
                        if let Err(err) = perform(&doc, &styles, &logger, &wait, action).await {
                            if matches!(err, EngineError::WaitCancelled { .. }) {
                                return;
                            }
                            logger.warn_with("click action failed", &[("error", &err.to_string())]);
                        }
                    }
                    Some(DocumentEvent::Mutations(_)) => {}
                    None => return,
                }
            }
        }
    }
}

async fn perform(
    doc: &Arc<dyn HostDocument>,
    styles: &StyleRegistry,
    logger: &Logger,
    wait: &WaitOptions,
    action: ClickAction,
) -> Result<(), EngineError> {
    match action {
        ClickAction::ClickTarget(selector) => match doc.query(&selector).await? {
            Some(target) => Ok(doc.click(target).await?),
            None => Err(EngineError::MissingAnchor {
                selector: selector.to_css(),
            }),
        },
        ClickAction::Navigate(url) => Ok(doc.navigate(&url).await?),
        ClickAction::GoHome => {
            if let Some(home) = doc.query(&selectors::rail_button("Home")).await? {
                doc.click(home).await?;
            } else {
                logger.warn("home rail button not found");
            }
            // The click that got us here opened the switcher menu; close it.
            let overlay =
                wait_for_element(doc.as_ref(), &selectors::modal_overlay(), wait).await?;
            doc.click(overlay).await?;
            wait_for_absence(doc.as_ref(), &selectors::modal_overlay(), wait).await
        }
        ClickAction::AddWorkspace => {
            let prober = DiscreetProber::new(doc.clone(), styles.clone(), logger.clone())
                .with_wait_options(wait.clone());
            prober.click_add_workspace().await
        }
    }
}
