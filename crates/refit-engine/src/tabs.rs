//! The tab processor: declarative per-tab transformations.
//!
//! Consumes the live tab elements in document order and the per-tab
//! configuration; decides per tab whether to hide it, mirror it into the
//! secondary navigation, or leave it untouched. Re-running is safe: mirror
//! buttons are keyed by the source tab's name and superseded instances are
//! removed before insertion, so a host re-render never accumulates
//! duplicates.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use refit_core::{Config, Logger};
use refit_dom::{DocumentEvent, HostDocument, NodeId};

use crate::error::EngineError;
use crate::nav::{self, ClickAction, ClickActions};
use crate::payloads::{
    TAB_BUTTONS, TAB_BUTTONS_KEY, TAB_HIDDEN_CLASS, TAB_RAIL_CHROME_SUPPRESSION,
};
use crate::selectors;
use crate::styles::StyleRegistry;
use crate::supervisor::TaskHandle;

/// What one tab resolved to, derived fresh on every processor run.
#[derive(Debug, Clone)]
pub struct TabDescriptor {
    /// Lower-cased visible label; the configuration key.
    pub name: String,
    pub hide: bool,
    pub create_nav_button: bool,
    pub source: NodeId,
}

/// Aggregate result of one processor run.
#[derive(Debug, Clone)]
pub struct TabOutcome {
    pub total: usize,
    pub hidden: usize,
    pub all_hidden: bool,
    /// Names of tabs that got mirror buttons, in source order.
    pub mirrored: Vec<String>,
}

pub struct TabProcessor<'a> {
    doc: Arc<dyn HostDocument>,
    styles: StyleRegistry,
    actions: ClickActions,
    config: &'a Config,
    logger: Logger,
}

impl<'a> TabProcessor<'a> {
    pub fn new(
        doc: Arc<dyn HostDocument>,
        styles: StyleRegistry,
        actions: ClickActions,
        config: &'a Config,
        logger: Logger,
    ) -> Self {
        Self {
            doc,
            styles,
            actions,
            config,
            logger,
        }
    }

    /// Process every tab under `tab_list`, mirroring into `nav`. Returns the
    /// outcome plus the observer tasks keeping mirrors in sync.
    pub async fn process(
        &self,
        tab_list: NodeId,
        nav: NodeId,
        workspace_count: usize,
    ) -> Result<(TabOutcome, Vec<TaskHandle>), EngineError> {
        self.styles.install(TAB_BUTTONS_KEY, TAB_BUTTONS).await?;

        let tabs = self.doc.children(tab_list).await?;
        let total = tabs.len();
        // Captured before any insert: every mirror goes ahead of the nav
        // area's own children, in source-tab order.
        let insert_ref = self.doc.children(nav).await?.first().copied();

        let mut hidden = 0usize;
        let mut mirrored = Vec::new();
        let mut tasks = Vec::new();

        for tab in tabs {
            let Some(descriptor) = self.describe(tab).await? else {
                continue;
            };

            if descriptor.hide {
                self.doc.add_class(tab, TAB_HIDDEN_CLASS).await?;
                hidden += 1;
            }

            let search_only = self.search_only_mirror(&descriptor.name, workspace_count);
            if !descriptor.create_nav_button && !search_only {
                continue;
            }

            match self
                .mirror_tab(&descriptor, nav, insert_ref, search_only)
                .await
            {
                Ok(mut observer_tasks) => {
                    tasks.append(&mut observer_tasks);
                    mirrored.push(descriptor.name.clone());
                }
                Err(err) => {
                    self.logger.warn_with(
                        "mirror skipped",
                        &[("tab", &descriptor.name), ("error", &err.to_string())],
                    );
                }
            }
        }

        let all_hidden = total > 0 && hidden == total;
        if all_hidden {
            // An empty rail is uglier than a missing one. Reinstalling under
            // the same key replaces the payload, so the suppression rule is
            // present exactly once no matter how often this runs.
            let payload = format!("{TAB_BUTTONS}{TAB_RAIL_CHROME_SUPPRESSION}");
            self.styles.install(TAB_BUTTONS_KEY, &payload).await?;
        }

        Ok((
            TabOutcome {
                total,
                hidden,
                all_hidden,
                mirrored,
            },
            tasks,
        ))
    }

    /// Derive a tab's descriptor from its live element. `None` when the tab
    /// has no label or no configuration entry — such tabs are left exactly
    /// as the host renders them.
    async fn describe(&self, tab: NodeId) -> Result<Option<TabDescriptor>, EngineError> {
        let Some(label) = self.doc.query_within(tab, &selectors::tab_label()).await? else {
            self.logger
                .debug_with("tab without label skipped", &[("node", &tab.to_string())]);
            return Ok(None);
        };
        let name = self.doc.text_content(label).await?.to_lowercase();

        let Some(tab_cfg) = self.config.tab(&name) else {
            self.logger.debug_with("unconfigured tab", &[("tab", &name)]);
            return Ok(None);
        };

        Ok(Some(TabDescriptor {
            name,
            hide: tab_cfg.hide,
            create_nav_button: tab_cfg.create_nav_button,
            source: tab,
        }))
    }

    /// The search-conditional mirror rule: a per-tab
    /// `create_nav_button_on_search`, or the single-workspace home-tab rule.
    /// Takes priority over a plain `hide` for the mirror's existence — the
    /// mirror stays in the DOM at all times and only its visibility tracks
    /// the location.
    fn search_only_mirror(&self, name: &str, workspace_count: usize) -> bool {
        if let Some(tab_cfg) = self.config.tab(name) {
            if tab_cfg.create_nav_button_on_search {
                return true;
            }
        }
        workspace_count <= 1
            && name == "home"
            && self
                .config
                .sidebar
                .if_one_workspace
                .home_tab
                .create_nav_button_on_search
    }

    async fn mirror_tab(
        &self,
        descriptor: &TabDescriptor,
        nav: NodeId,
        insert_ref: Option<NodeId>,
        search_only: bool,
    ) -> Result<Vec<TaskHandle>, EngineError> {
        let id = mirror_button_id(&descriptor.name);

        // Keyed removal before insertion.
        for stale in self.doc.query_all(&selectors::by_id(&id)).await? {
            let _ = self.doc.remove(stale).await;
        }

        let Some(icon) = self
            .doc
            .query_within(descriptor.source, &selectors::tab_icon())
            .await?
        else {
            return Err(EngineError::MissingAnchor {
                selector: selectors::tab_icon().to_css(),
            });
        };
        let icon_markup = self.doc.outer_markup(icon).await?;

        let aria_label = self.tab_aria_label(descriptor).await?;
        let button =
            nav::build_tab_button(self.doc.as_ref(), &id, &aria_label, &icon_markup).await?;
        self.actions.register(
            button.button,
            ClickAction::ClickTarget(selectors::rail_button(&aria_label)),
        );

        self.doc.insert_before(nav, button.container, insert_ref).await?;

        let mut tasks = Vec::new();
        if search_only {
            self.apply_search_visibility(button.container).await?;
            tasks.push(self.spawn_visibility_watcher(id.clone()));
        }
        tasks.push(self.spawn_icon_sync(icon, id));

        Ok(tasks)
    }

    /// The accessible label lives on the tab itself when the tab is a
    /// button, otherwise on the button inside it.
    async fn tab_aria_label(&self, descriptor: &TabDescriptor) -> Result<String, EngineError> {
        let tab = descriptor.source;
        let holder = if self.doc.tag_name(tab).await?.eq_ignore_ascii_case("button") {
            Some(tab)
        } else {
            self.doc
                .query_within(tab, &refit_dom::Selector::new(refit_dom::Matcher::tag("button")))
                .await?
        };
        if let Some(holder) = holder {
            if let Some(label) = self.doc.attribute(holder, "aria-label").await? {
                return Ok(label);
            }
        }
        Ok(descriptor.name.clone())
    }

    /// Visible iff the current location indicates an active search.
    async fn apply_search_visibility(&self, container: NodeId) -> Result<(), EngineError> {
        let location = self.doc.location().await?;
        if location_is_searching(&location) {
            self.doc.remove_class(container, TAB_HIDDEN_CLASS).await?;
        } else {
            self.doc.add_class(container, TAB_HIDDEN_CLASS).await?;
        }
        Ok(())
    }

    /// Re-evaluates the search predicate on every document mutation. The
    /// mirror is re-queried by id each round; a missing mirror is tolerated
    /// (a later processor run may recreate it under the same id).
    fn spawn_visibility_watcher(&self, id: String) -> TaskHandle {
        let doc = self.doc.clone();
        let cancel = CancellationToken::new();
        let task_cancel = cancel.clone();
        let name = format!("search-visibility:{id}");

        let handle = tokio::spawn(async move {
            let mut subscription = doc.subscribe();
            loop {
                tokio::select! {
                    biased;
                    _ = task_cancel.cancelled() => return,
                    event = subscription.next() => {
                        match event {
                            Some(DocumentEvent::Mutations(_)) => {}
                            Some(DocumentEvent::Click(_)) => continue,
                            None => return,
                        }
                        let Ok(Some(container)) = doc.query(&selectors::by_id(&id)).await else {
                            continue;
                        };
                        let Ok(location) = doc.location().await else { continue };
                        let result = if location_is_searching(&location) {
                            doc.remove_class(container, TAB_HIDDEN_CLASS).await
                        } else {
                            doc.add_class(container, TAB_HIDDEN_CLASS).await
                        };
                        if result.is_err() {
                            continue;
                        }
                    }
                }
            }
        });

        TaskHandle::new(name, cancel, handle)
    }

    /// Copies the source tab's icon markup into the mirror whenever the
    /// icon's subtree mutates (selected/unselected variants), without
    /// rebuilding the button.
    fn spawn_icon_sync(&self, icon: NodeId, id: String) -> TaskHandle {
        let doc = self.doc.clone();
        let cancel = CancellationToken::new();
        let task_cancel = cancel.clone();
        let name = format!("icon-sync:{id}");

        let handle = tokio::spawn(async move {
            let mut subscription = doc.subscribe();
            loop {
                tokio::select! {
                    biased;
                    _ = task_cancel.cancelled() => return,
                    event = subscription.next() => {
                        let batch = match event {
                            Some(DocumentEvent::Mutations(batch)) => batch,
                            Some(DocumentEvent::Click(_)) => continue,
                            None => return,
                        };
                        let mut relevant = batch.is_empty();
                        for mutation in &batch {
                            if doc.contains(icon, mutation.target).await.unwrap_or(false) {
                                relevant = true;
                                break;
                            }
                        }
                        if !relevant {
                            continue;
                        }
                        // The source icon dies with its tab; this observer
                        // dies with it.
                        if !doc.exists(icon).await.unwrap_or(false) {
                            return;
                        }
                        let Ok(markup) = doc.outer_markup(icon).await else { return };
                        let Ok(Some(container)) = doc.query(&selectors::by_id(&id)).await else {
                            continue;
                        };
                        let Ok(children) = doc.children(container).await else { continue };
                        let Some(button) = children.first().copied() else { continue };
                        let _ = doc.set_inner_markup(button, &markup).await;
                    }
                }
            }
        });

        TaskHandle::new(name, cancel, handle)
    }
}

/// Stable mirror-button id for a tab name.
pub fn mirror_button_id(name: &str) -> String {
    format!("rf-{name}-nav-tab")
}

/// The current-location predicate for search-conditional mirrors.
pub fn location_is_searching(location: &str) -> bool {
    location.ends_with("/search")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mirror_ids_are_stable_per_name() {
        assert_eq!(mirror_button_id("home"), "rf-home-nav-tab");
        assert_eq!(mirror_button_id("dms"), "rf-dms-nav-tab");
    }

    #[test]
    fn search_predicate_matches_suffix_only() {
        assert!(location_is_searching("https://app.example.test/client/T1/search"));
        assert!(!location_is_searching("https://app.example.test/client/T1"));
        assert!(!location_is_searching(
            "https://app.example.test/client/search/results"
        ));
    }
}
