//! The orchestrator: sequences the customization per configuration.
//!
//! Linear with conditional branches, terminal on the last configured step.
//! Anchor waits and the workspace-count probe are hard requirements; every
//! cosmetic step is independent and best-effort: a missing optional element
//! is logged and skipped, never aborting the steps after it.

use std::sync::Arc;

use refit_core::{Config, Logger};
use refit_dom::HostDocument;

use crate::error::EngineError;
use crate::nav::{self, ClickAction, ClickActions};
use crate::payloads;
use crate::prober::DiscreetProber;
use crate::selectors;
use crate::styles::StyleRegistry;
use crate::supervisor::{spawn_relocation_loop, RelocationSpec, TaskHandle};
use crate::tabs::{TabOutcome, TabProcessor};
use crate::waiter::{wait_for_element, WaitOptions};
use crate::workspaces::WorkspaceMirror;

/// The customization engine.
pub struct Engine {
    doc: Arc<dyn HostDocument>,
    config: Config,
    logger: Logger,
    wait: WaitOptions,
}

/// Result of one engine run. The run itself is done; the tasks keep the
/// document customized until stopped (normally: until the page goes away).
pub struct EngineRun {
    pub workspace_count: usize,
    pub tabs: TabOutcome,
    pub tasks: Vec<TaskHandle>,
}

impl EngineRun {
    /// Stop every background task and wait for each to finish.
    pub async fn shutdown(self) {
        for task in self.tasks {
            task.stopped().await;
        }
    }
}

impl Engine {
    pub fn new(doc: Arc<dyn HostDocument>, config: Config, logger: Logger) -> Self {
        Self {
            doc,
            config,
            logger,
            wait: WaitOptions::forever(),
        }
    }

    /// Bound or cancel the engine's waits. The default waits forever, which
    /// is the host-is-eventually-ready assumption this engine runs under.
    pub fn with_wait_options(mut self, wait: WaitOptions) -> Self {
        self.wait = wait;
        self
    }

    /// Run the customization once. Runs exactly once per attach; re-assertion
    /// against host re-renders is the returned tasks' job.
    pub async fn run(&self) -> Result<EngineRun, EngineError> {
        let cfg = &self.config;
        let styles = StyleRegistry::new(self.doc.clone());
        let actions = ClickActions::default();
        let mut tasks: Vec<TaskHandle> = Vec::new();

        self.logger.info("starting customization");

        // Cosmetic pre-steps: nothing here needs the anchors yet.
        if cfg.workspace.square_off {
            self.best_effort(
                "square_off",
                styles.install(payloads::SQUARE_OFF_KEY, payloads::SQUARE_OFF).await,
            );
        }
        if cfg.sidebar.hide {
            self.best_effort(
                "hide_sidebar",
                styles
                    .install(payloads::HIDE_SIDEBAR_KEY, payloads::HIDE_SIDEBAR)
                    .await,
            );
        }
        if cfg.sidebar.workspace_switcher.highlight {
            self.best_effort(
                "highlight_switcher",
                styles
                    .install(payloads::HIGHLIGHT_SWITCHER_KEY, payloads::HIGHLIGHT_SWITCHER)
                    .await,
            );
        }
        if cfg.sidebar.workspace_switcher.hide {
            self.best_effort(
                "hide_switcher",
                styles
                    .install(payloads::HIDE_SWITCHER_KEY, payloads::HIDE_SWITCHER)
                    .await,
            );
        }

        // Root anchors. No timeout by default: if the host never renders
        // these, the run suspends here.
        let tab_list =
            wait_for_element(self.doc.as_ref(), &selectors::tab_list(), &self.wait).await?;
        let nav =
            wait_for_element(self.doc.as_ref(), &selectors::history_navigation(), &self.wait)
                .await?;
        self.logger.debug("anchors resolved");

        // Mirror buttons are inert until the dispatcher consumes their
        // forwarded clicks, so it starts before any button is built.
        tasks.push(nav::spawn_click_dispatcher(
            self.doc.clone(),
            styles.clone(),
            actions.clone(),
            self.logger.component("dispatcher"),
        ));

        let prober = DiscreetProber::new(
            self.doc.clone(),
            styles.clone(),
            self.logger.component("prober"),
        )
        .with_wait_options(self.wait.clone());

        let workspace_count = prober.workspace_count().await?;
        self.logger
            .debug_with("workspace count", &[("count", &workspace_count.to_string())]);

        let processor = TabProcessor::new(
            self.doc.clone(),
            styles.clone(),
            actions.clone(),
            cfg,
            self.logger.component("tabs"),
        );
        let (tab_outcome, mut tab_tasks) = processor.process(tab_list, nav, workspace_count).await?;
        tasks.append(&mut tab_tasks);
        self.logger.info_with(
            "tabs processed",
            &[
                ("total", &tab_outcome.total.to_string()),
                ("hidden", &tab_outcome.hidden.to_string()),
                ("mirrored", &tab_outcome.mirrored.len().to_string()),
            ],
        );

        let mut sidebar_hidden = cfg.sidebar.hide;
        if !cfg.sidebar.hide {
            let mirror = WorkspaceMirror::new(
                self.doc.clone(),
                styles.clone(),
                actions.clone(),
                self.logger.component("workspaces"),
            );

            if workspace_count <= 1 {
                // Single-workspace branch: the switcher earns no rail space.
                if cfg.sidebar.if_one_workspace.hide_sidebar {
                    self.best_effort(
                        "hide_sidebar_one_workspace",
                        styles
                            .install(payloads::HIDE_SIDEBAR_KEY, payloads::HIDE_SIDEBAR)
                            .await,
                    );
                    sidebar_hidden = true;
                }
                if cfg
                    .sidebar
                    .if_one_workspace
                    .add_workspace_button
                    .create_nav_button
                {
                    self.best_effort(
                        "add_workspace_nav_button",
                        mirror.add_create_workspace_nav_button(nav).await,
                    );
                }
            } else {
                // Multi-workspace branch.
                if cfg.sidebar.workspace_switcher.click_to_go_home {
                    self.best_effort("click_to_go_home", self.rewire_switcher(&actions).await);
                }
                if cfg.sidebar.workspace_switcher.add_other_workspace_buttons {
                    self.best_effort(
                        "add_workspace_buttons",
                        mirror.add_workspace_buttons(&prober).await,
                    );
                }
            }

            if !sidebar_hidden {
                if cfg.control_strip.create_button.hide {
                    self.best_effort(
                        "hide_create_button",
                        styles
                            .install(payloads::HIDE_CREATE_BUTTON_KEY, payloads::HIDE_CREATE_BUTTON)
                            .await,
                    );
                } else if cfg.control_strip.move_up {
                    self.best_effort(
                        "move_control_strip_style",
                        styles
                            .install(payloads::MOVE_CONTROL_STRIP_KEY, payloads::MOVE_CONTROL_STRIP)
                            .await,
                    );
                    tasks.push(spawn_relocation_loop(
                        self.doc.clone(),
                        RelocationSpec {
                            name: "control-strip".into(),
                            source: selectors::control_strip_toolbar(),
                            target: selectors::tab_rail(),
                            tag_id: "rf-control-strip-toolbar-moved".into(),
                        },
                        self.logger.component("supervisor"),
                    ));
                }
            }
        }

        if cfg.control_strip.avatar.move_to_nav {
            match self.doc.query(&selectors::avatar_container()).await {
                Ok(Some(_)) => {
                    self.best_effort(
                        "avatar_modal_offset",
                        styles.install(payloads::AVATAR_NAV_KEY, payloads::AVATAR_NAV).await,
                    );
                    tasks.push(spawn_relocation_loop(
                        self.doc.clone(),
                        RelocationSpec {
                            name: "avatar".into(),
                            source: selectors::avatar_container(),
                            target: selectors::top_nav_right(),
                            tag_id: "rf-avatar-moved".into(),
                        },
                        self.logger.component("supervisor"),
                    ));
                }
                Ok(None) => {
                    // Missing optional element: skip, keep going.
                    self.logger.warn("avatar container not found, skipping relocation");
                }
                Err(err) => {
                    self.logger
                        .warn_with("avatar lookup failed", &[("error", &err.to_string())]);
                }
            }
        }

        self.logger.info("customization finished");

        Ok(EngineRun {
            workspace_count,
            tabs: tab_outcome,
            tasks,
        })
    }

    /// Rewire the switcher control: activating it now lands on home instead
    /// of the switcher menu (the dispatcher closes the menu the click opens).
    async fn rewire_switcher(&self, actions: &ClickActions) -> Result<(), EngineError> {
        match self.doc.query(&selectors::workspace_switcher()).await? {
            Some(switcher) => {
                self.doc.forward_clicks(switcher).await?;
                actions.register(switcher, ClickAction::GoHome);
                Ok(())
            }
            None => Err(EngineError::MissingAnchor {
                selector: selectors::workspace_switcher().to_css(),
            }),
        }
    }

    /// Log-and-continue for cosmetic steps; steps are independent.
    fn best_effort<T>(&self, step: &str, result: Result<T, EngineError>) {
        if let Err(err) = result {
            self.logger
                .warn_with("step skipped", &[("step", step), ("error", &err.to_string())]);
        }
    }
}
