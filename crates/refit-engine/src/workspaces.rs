//! Workspace mirroring: switch buttons for the other workspaces and the
//! add-workspace affordance.

use std::sync::Arc;

use refit_core::Logger;
use refit_dom::{HostDocument, NodeId};

use crate::error::EngineError;
use crate::nav::{self, ClickAction, ClickActions};
use crate::payloads::{ADD_WORKSPACE_BUTTONS, ADD_WORKSPACE_BUTTONS_KEY};
use crate::prober::DiscreetProber;
use crate::selectors;
use crate::styles::StyleRegistry;

/// One workspace read out of the switcher menu during a probe session.
/// Node handles die with the overlay, so the icon is kept as markup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspaceDescriptor {
    pub icon_markup: String,
    pub url: String,
}

pub struct WorkspaceMirror {
    doc: Arc<dyn HostDocument>,
    styles: StyleRegistry,
    actions: ClickActions,
    logger: Logger,
}

impl WorkspaceMirror {
    pub fn new(
        doc: Arc<dyn HostDocument>,
        styles: StyleRegistry,
        actions: ClickActions,
        logger: Logger,
    ) -> Self {
        Self {
            doc,
            styles,
            actions,
            logger,
        }
    }

    /// Multi-workspace branch: mirror each non-current workspace as a switch
    /// button in the rail, plus a cloned create-workspace button. Returns the
    /// number of workspace buttons built.
    pub async fn add_workspace_buttons(
        &self,
        prober: &DiscreetProber,
    ) -> Result<usize, EngineError> {
        let descriptors = prober.collect_workspaces().await?;
        self.logger.debug_with(
            "collected workspaces",
            &[("count", &descriptors.len().to_string())],
        );
        if descriptors.is_empty() {
            return Ok(0);
        }

        self.styles
            .install(ADD_WORKSPACE_BUTTONS_KEY, ADD_WORKSPACE_BUTTONS)
            .await?;

        let rail = match self.doc.query(&selectors::tab_rail()).await? {
            Some(rail) => rail,
            None => {
                return Err(EngineError::MissingAnchor {
                    selector: selectors::tab_rail().to_css(),
                })
            }
        };
        // Buttons slot in ahead of the host's third rail element, like the
        // host's own switcher entries.
        let reference = self.doc.children(rail).await?.get(2).copied();

        for descriptor in &descriptors {
            let id = workspace_button_id(&descriptor.url);
            self.remove_stale(&id).await?;

            let (container, inner) = self.build_rail_container(&id).await?;
            let button = self.doc.create_element("button").await?;
            self.doc.add_class(button, "c-button-unstyled").await?;
            self.doc.add_class(button, "p-account_switcher").await?;
            self.doc.add_class(button, "rf-account-switcher").await?;
            self.doc
                .set_attribute(button, "aria-label", "Switch workspaces…")
                .await?;
            self.doc
                .set_inner_markup(button, &descriptor.icon_markup)
                .await?;
            self.doc.append_child(inner, button).await?;
            self.doc.forward_clicks(button).await?;
            self.actions.register(
                button,
                ClickAction::Navigate(format!("https://{}", descriptor.url)),
            );

            self.doc.insert_before(rail, container, reference).await?;
        }

        if let Err(err) = self.add_rail_create_button(rail, reference).await {
            self.logger.warn_with(
                "create-workspace button skipped",
                &[("error", &err.to_string())],
            );
        }

        Ok(descriptors.len())
    }

    /// Single-workspace branch: mirror an add-workspace affordance into the
    /// secondary navigation in place of the hidden switcher.
    pub async fn add_create_workspace_nav_button(&self, nav: NodeId) -> Result<(), EngineError> {
        let icon = match self.doc.query(&selectors::create_button_icon()).await? {
            Some(icon) => icon,
            None => {
                return Err(EngineError::MissingAnchor {
                    selector: selectors::create_button_icon().to_css(),
                })
            }
        };
        let markup = self.doc.outer_markup(icon).await?;

        let id = "rf-create-workspace-nav-tab";
        self.remove_stale(id).await?;

        let button =
            nav::build_tab_button(self.doc.as_ref(), id, "Create workspace", &markup).await?;
        self.actions.register(button.button, ClickAction::AddWorkspace);

        let reference = self.doc.children(nav).await?.first().copied();
        self.doc
            .insert_before(nav, button.container, reference)
            .await?;
        Ok(())
    }

    /// The cloned create button that sits under the workspace buttons in the
    /// rail.
    async fn add_rail_create_button(
        &self,
        rail: NodeId,
        reference: Option<NodeId>,
    ) -> Result<(), EngineError> {
        let source = match self.doc.query(&selectors::create_button()).await? {
            Some(source) => source,
            None => {
                return Err(EngineError::MissingAnchor {
                    selector: selectors::create_button().to_css(),
                })
            }
        };
        let markup = self.doc.inner_markup(source).await?;

        // The slot id keys the whole container so re-runs replace it wholesale.
        let slot_id = "rf-create-workspace-button-slot";
        self.remove_stale(slot_id).await?;

        let (container, inner) = self.build_rail_container(slot_id).await?;
        let button = self.doc.create_element("button").await?;
        self.doc
            .set_attribute(button, "id", "rf-create-workspace-button")
            .await?;
        self.doc
            .add_class(button, "p-control_strip__create_button")
            .await?;
        self.doc.add_class(button, "p-account_switcher").await?;
        self.doc.set_inner_markup(button, &markup).await?;
        self.doc.append_child(inner, button).await?;
        self.doc.forward_clicks(button).await?;
        self.actions.register(button, ClickAction::AddWorkspace);

        self.doc.insert_before(rail, container, reference).await?;
        Ok(())
    }

    /// The rail wraps every entry in a focus container with a peek trigger;
    /// mirrored entries keep that shape so rail styling applies to them.
    async fn build_rail_container(&self, id: &str) -> Result<(NodeId, NodeId), EngineError> {
        let container = self.doc.create_element("div").await?;
        self.doc.set_attribute(container, "id", id).await?;
        self.doc
            .add_class(container, "active-managed-focus-container")
            .await?;
        self.doc.set_attribute(container, "role", "none").await?;
        self.doc
            .set_attribute(container, "style", "display: contents")
            .await?;

        let peek = self.doc.create_element("div").await?;
        self.doc.add_class(peek, "p-peek_trigger").await?;
        self.doc.set_attribute(peek, "role", "none").await?;

        let inner = self.doc.create_element("div").await?;
        self.doc.append_child(peek, inner).await?;
        self.doc.append_child(container, peek).await?;

        Ok((container, inner))
    }

    async fn remove_stale(&self, id: &str) -> Result<(), EngineError> {
        for stale in self.doc.query_all(&selectors::by_id(id)).await? {
            let _ = self.doc.remove(stale).await;
        }
        Ok(())
    }
}

/// Stable id for a workspace switch button, derived from the workspace URL.
pub fn workspace_button_id(url: &str) -> String {
    let slug: String = url
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .collect();
    format!("rf-workspace-{slug}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn workspace_button_id_is_stable_and_sanitized() {
        assert_eq!(
            workspace_button_id("bernie.example.test"),
            "rf-workspace-bernie-example-test"
        );
        assert_eq!(
            workspace_button_id("bernie.example.test"),
            workspace_button_id("bernie.example.test")
        );
    }
}
