//! Shared host-UI fixture: a mock document shaped like the chat client the
//! engine customizes, with the switcher menu scripted as a click reaction so
//! probe sessions behave like the real overlay.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use refit_core::Config;
use refit_dom::mock::{ClickBehavior, MockDocument, NodeBlueprint};
use refit_dom::{HostDocument, Matcher, NodeId, Selector};
use refit_engine::selectors;

pub struct HostFixture {
    pub doc: Arc<MockDocument>,
    pub tab_list: NodeId,
    pub nav: NodeId,
}

/// One rail tab: wrapper div holding the labeled button with its icon.
pub fn tab(label: &str) -> NodeBlueprint {
    NodeBlueprint::new("div").child(
        NodeBlueprint::new("button")
            .attr("aria-label", label)
            .child(
                NodeBlueprint::new("span")
                    .class("p-tab_rail__button__label")
                    .text(label),
            )
            .child(NodeBlueprint::new("svg").child(NodeBlueprint::new("path").attr("d", "M0 0"))),
    )
}

fn control_strip() -> NodeBlueprint {
    NodeBlueprint::new("div")
        .class("p-control_strip")
        .attr("role", "toolbar")
        .attr("aria-label", "Control strip")
        .child(NodeBlueprint::new("div").class("p-control_strip__status"))
        .child(NodeBlueprint::new("div").class("strip-secondary"))
        .child(
            NodeBlueprint::new("button")
                .class("p-control_strip__create_button")
                .child(
                    NodeBlueprint::new("span")
                        .class("p-control_strip__create_button__icon")
                        .child(
                            NodeBlueprint::new("svg")
                                .child(NodeBlueprint::new("path").attr("d", "M1 1")),
                        ),
                ),
        )
}

/// Script the workspace-switcher menu: clicking the switcher renders the
/// overlay with one row per workspace plus the add row; clicking the overlay
/// tears it down. Every open mints fresh nodes, like the host. Pass no
/// workspaces to leave the switcher inert (the menu never appears).
pub fn script_switcher_menu(doc: &MockDocument, workspaces: &[&str]) {
    if workspaces.is_empty() {
        return;
    }

    let mut menu = NodeBlueprint::new("div").class("p_team-switcher-menu");
    for name in workspaces {
        menu = menu.child(
            NodeBlueprint::new("div")
                .class("p_team-switcher-menu__item__team")
                .child(
                    NodeBlueprint::new("div")
                        .class("p_team-switcher-menu__item__team")
                        .child(
                            NodeBlueprint::new("div")
                                .class("p-account_switcher__row_icon")
                                .child(NodeBlueprint::new("img").attr("alt", name)),
                        )
                        .child(
                            NodeBlueprint::new("div")
                                .class("p-account_switcher__row_url")
                                .text(&format!("{name}.example.test")),
                        ),
                ),
        );
    }
    menu = menu.child(
        NodeBlueprint::new("button")
            .class("p-team_switcher_menu__item--add")
            .text("Add a workspace"),
    );

    let overlay = NodeBlueprint::new("div").class("ReactModal__Overlay").child(
        NodeBlueprint::new("div")
            .class("ReactModal__Content")
            .child(menu),
    );

    doc.on_click(
        selectors::workspace_switcher(),
        ClickBehavior::InsertUnder {
            parent: Selector::new(Matcher::tag("body")),
            blueprint: overlay,
        },
    );
    doc.on_click(selectors::modal_overlay(), ClickBehavior::RemoveSelf);
}

/// Build the full host UI and resolve the two root anchors.
pub async fn host_ui(workspaces: &[&str], labels: &[&str]) -> HostFixture {
    let doc = Arc::new(MockDocument::new());
    let root = doc.root();

    doc.insert_blueprint(
        root,
        &NodeBlueprint::new("div")
            .class("p-ia4_top_nav")
            .child(
                NodeBlueprint::new("div")
                    .attr("aria-label", "History Navigation")
                    .child(
                        NodeBlueprint::new("div")
                            .class("p-ia4_history_menu_button")
                            .class("host-back-button"),
                    ),
            )
            .child(NodeBlueprint::new("div").class("p-ia4_top_nav__right_container")),
    );

    let mut menu = NodeBlueprint::new("div")
        .class("p-tab_rail__tab_menu")
        .attr("role", "tablist");
    for label in labels {
        menu = menu.child(tab(label));
    }

    doc.insert_blueprint(
        root,
        &NodeBlueprint::new("div")
            .class("p-client_workspace_wrapper")
            .child(
                NodeBlueprint::new("div")
                    .class("p-tab_rail")
                    .child(
                        NodeBlueprint::new("div").child(
                            NodeBlueprint::new("button")
                                .class("c-button-unstyled")
                                .class("p-account_switcher"),
                        ),
                    )
                    .child(NodeBlueprint::new("div").class("rail-chrome"))
                    .child(menu),
            )
            .child(
                NodeBlueprint::new("div")
                    .class("p-client_workspace__layout")
                    .child(control_strip()),
            ),
    );

    script_switcher_menu(&doc, workspaces);

    let tab_list = doc
        .query(&selectors::tab_list())
        .await
        .expect("query tab list")
        .expect("tab list present");
    let nav = doc
        .query(&selectors::history_navigation())
        .await
        .expect("query nav")
        .expect("nav present");

    HostFixture { doc, tab_list, nav }
}

/// The five-tab layout most scenarios use.
pub async fn standard_fixture(workspaces: &[&str]) -> HostFixture {
    host_ui(workspaces, &["Home", "DMs", "Activity", "Files", "More"]).await
}

pub fn parse_config(yaml: &str) -> Config {
    refit_core::config::parse_config(yaml).expect("fixture config parses")
}

/// Poll an async condition until it holds or the test times out.
pub async fn eventually<F, Fut>(mut check: F, what: &str)
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    for _ in 0..400 {
        if check().await {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("condition never held: {what}");
}
