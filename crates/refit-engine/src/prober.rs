//! Discreet probing of transient overlay state.
//!
//! Some state only exists inside a normally user-visible overlay (the
//! workspace-switcher menu). A probe session opens that overlay with its
//! content forced invisible, reads or clicks what it needs, closes it, and
//! removes the suppression style. The removal is guaranteed on every exit
//! path, found or not found, so a failed probe never leaves the host UI
//! broken. A probe whose expected content never appears suspends like any
//! other wait unless the caller bounded it.

use std::sync::Arc;

use refit_core::Logger;
use refit_dom::HostDocument;

use crate::error::EngineError;
use crate::payloads::{PROBE_SUPPRESSION, PROBE_SUPPRESSION_KEY};
use crate::selectors;
use crate::styles::StyleRegistry;
use crate::waiter::{wait_for_absence, wait_for_element, WaitOptions};
use crate::workspaces::WorkspaceDescriptor;

pub struct DiscreetProber {
    doc: Arc<dyn HostDocument>,
    styles: StyleRegistry,
    logger: Logger,
    wait: WaitOptions,
}

impl DiscreetProber {
    pub fn new(doc: Arc<dyn HostDocument>, styles: StyleRegistry, logger: Logger) -> Self {
        Self {
            doc,
            styles,
            logger,
            wait: WaitOptions::forever(),
        }
    }

    pub fn with_wait_options(mut self, wait: WaitOptions) -> Self {
        self.wait = wait;
        self
    }

    /// Count the workspaces listed in the switcher menu.
    pub async fn workspace_count(&self) -> Result<usize, EngineError> {
        self.open().await?;
        let counted = self.count_rows().await;
        self.settle(counted).await
    }

    /// Collect icon markup and URL for every workspace other than the
    /// current one (the first row). Rows missing either field are skipped.
    pub async fn collect_workspaces(&self) -> Result<Vec<WorkspaceDescriptor>, EngineError> {
        self.open().await?;
        let collected = self.read_rows().await;
        self.settle(collected).await
    }

    /// Click the add-workspace row inside the switcher menu.
    pub async fn click_add_workspace(&self) -> Result<(), EngineError> {
        self.open().await?;
        let clicked = self.click_add_row().await;
        self.settle(clicked).await
    }

    // Session protocol ------------------------------------------------------

    /// Step 1+2: install the suppression style, then trigger the overlay. If
    /// the trigger fails the style comes straight back out.
    async fn open(&self) -> Result<(), EngineError> {
        self.styles
            .install(PROBE_SUPPRESSION_KEY, PROBE_SUPPRESSION)
            .await?;

        let switcher = match self.doc.query(&selectors::workspace_switcher()).await {
            Ok(Some(node)) => node,
            Ok(None) => {
                let _ = self.styles.remove(PROBE_SUPPRESSION_KEY).await;
                return Err(EngineError::MissingAnchor {
                    selector: selectors::workspace_switcher().to_css(),
                });
            }
            Err(err) => {
                let _ = self.styles.remove(PROBE_SUPPRESSION_KEY).await;
                return Err(err.into());
            }
        };

        if let Err(err) = self.doc.click(switcher).await {
            let _ = self.styles.remove(PROBE_SUPPRESSION_KEY).await;
            return Err(err.into());
        }

        Ok(())
    }

    /// Steps 4+5: close the overlay, await its disappearance, and remove the
    /// suppression style no matter how the session body fared.
    async fn settle<T>(&self, body: Result<T, EngineError>) -> Result<T, EngineError> {
        let closed = self.close_overlay().await;
        let removed = self.styles.remove(PROBE_SUPPRESSION_KEY).await;

        match body {
            Err(err) => {
                if let Err(cleanup) = closed.and(removed) {
                    self.logger
                        .warn_with("probe cleanup failed", &[("error", &cleanup.to_string())]);
                }
                Err(err)
            }
            Ok(value) => {
                closed?;
                removed?;
                Ok(value)
            }
        }
    }

    async fn close_overlay(&self) -> Result<(), EngineError> {
        let overlay =
            wait_for_element(self.doc.as_ref(), &selectors::modal_overlay(), &self.wait).await?;
        self.doc.click(overlay).await?;
        wait_for_absence(self.doc.as_ref(), &selectors::modal_overlay(), &self.wait).await
    }

    // Session bodies --------------------------------------------------------

    async fn count_rows(&self) -> Result<usize, EngineError> {
        wait_for_element(
            self.doc.as_ref(),
            &selectors::switcher_workspace_row(),
            &self.wait,
        )
        .await?;
        let rows = self
            .doc
            .query_all(&selectors::switcher_workspace_row())
            .await?;
        Ok(rows.len())
    }

    async fn read_rows(&self) -> Result<Vec<WorkspaceDescriptor>, EngineError> {
        wait_for_element(
            self.doc.as_ref(),
            &selectors::switcher_workspace_row(),
            &self.wait,
        )
        .await?;
        let rows = self
            .doc
            .query_all(&selectors::switcher_workspace_row())
            .await?;

        let mut descriptors = Vec::new();
        // The first row is the current workspace; it needs no switch button.
        for row in rows.into_iter().skip(1) {
            let icon = self
                .doc
                .query_within(row, &selectors::workspace_row_icon())
                .await?;
            let url = self
                .doc
                .query_within(row, &selectors::workspace_row_url())
                .await?;
            match (icon, url) {
                (Some(icon), Some(url)) => {
                    // Snapshot now: the row nodes die with the overlay.
                    descriptors.push(WorkspaceDescriptor {
                        icon_markup: self.doc.outer_markup(icon).await?,
                        url: self.doc.text_content(url).await?,
                    });
                }
                _ => {
                    self.logger
                        .warn_with("workspace row missing icon or url", &[("row", &row.to_string())]);
                }
            }
        }
        Ok(descriptors)
    }

    async fn click_add_row(&self) -> Result<(), EngineError> {
        let add = wait_for_element(
            self.doc.as_ref(),
            &selectors::add_workspace_item(),
            &self.wait,
        )
        .await?;
        Ok(self.doc.click(add).await?)
    }
}
