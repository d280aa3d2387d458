#![allow(clippy::expect_used, clippy::unwrap_used)]

//! Discreet prober sessions:
//! - the suppression style is absent before and after every session,
//!   whether or not the probed content was found
//! - workspace counting and descriptor collection read the scripted menu
//! - the overlay is closed again after every session

use std::sync::Arc;
use std::time::Duration;

use refit_core::Logger;
use refit_dom::HostDocument;
use refit_engine::payloads::PROBE_SUPPRESSION_KEY;
use refit_engine::prober::DiscreetProber;
use refit_engine::selectors;
use refit_engine::styles::StyleRegistry;
use refit_engine::waiter::WaitOptions;
use refit_engine::EngineError;

mod common;

fn prober_for(doc: &Arc<refit_dom::mock::MockDocument>) -> DiscreetProber {
    let doc: Arc<dyn HostDocument> = doc.clone();
    DiscreetProber::new(doc.clone(), StyleRegistry::new(doc), Logger::disabled())
}

#[tokio::test]
async fn workspace_count_reads_the_menu_and_cleans_up() {
    let fixture = common::standard_fixture(&["current", "bernie", "acme"]).await;
    let doc = fixture.doc;

    assert!(doc.style_payload(PROBE_SUPPRESSION_KEY).is_none());

    let count = prober_for(&doc).workspace_count().await.unwrap();
    assert_eq!(count, 3);

    // Style gone, overlay gone.
    assert!(doc.style_payload(PROBE_SUPPRESSION_KEY).is_none());
    assert!(doc
        .query(&selectors::modal_overlay())
        .await
        .unwrap()
        .is_none());

    // The switcher was actually opened (engine click on it).
    let switcher = doc
        .query(&selectors::workspace_switcher())
        .await
        .unwrap()
        .unwrap();
    assert!(doc.clicks().contains(&switcher));
}

#[tokio::test]
async fn missing_content_still_removes_the_suppression_style() {
    // No scripted menu: the switcher opens nothing, the rows never appear.
    let fixture = common::standard_fixture(&[]).await;
    let doc = fixture.doc;

    let prober = prober_for(&doc)
        .with_wait_options(WaitOptions::with_timeout(Duration::from_millis(50)));
    let err = match prober.workspace_count().await {
        Ok(count) => panic!("unexpected count: {count}"),
        Err(err) => err,
    };
    assert!(matches!(err, EngineError::WaitTimeout { .. }), "err={err}");
    assert!(doc.style_payload(PROBE_SUPPRESSION_KEY).is_none());
}

#[tokio::test]
async fn collect_skips_the_current_workspace() {
    let fixture = common::standard_fixture(&["current", "bernie", "acme"]).await;
    let doc = fixture.doc;

    let descriptors = prober_for(&doc).collect_workspaces().await.unwrap();
    assert_eq!(descriptors.len(), 2);
    assert_eq!(descriptors[0].url, "bernie.example.test");
    assert_eq!(descriptors[1].url, "acme.example.test");
    assert!(descriptors[0].icon_markup.contains("img"));

    assert!(doc.style_payload(PROBE_SUPPRESSION_KEY).is_none());
    assert!(doc
        .query(&selectors::modal_overlay())
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn add_workspace_clicks_the_add_row() {
    let fixture = common::standard_fixture(&["current"]).await;
    let doc = fixture.doc;

    prober_for(&doc).click_add_workspace().await.unwrap();

    // One of the recorded clicks was the add row (it died with the overlay,
    // but its markup is still readable from the handle).
    let mut clicked_add_row = false;
    for node in doc.clicks() {
        if let Ok(markup) = doc.outer_markup(node).await {
            if markup.contains("p-team_switcher_menu__item--add") {
                clicked_add_row = true;
            }
        }
    }
    assert!(clicked_add_row, "add row was never clicked");
    assert!(doc.style_payload(PROBE_SUPPRESSION_KEY).is_none());
}

#[tokio::test]
async fn sessions_are_reentrant() {
    let fixture = common::standard_fixture(&["current", "bernie"]).await;
    let doc = fixture.doc;
    let prober = prober_for(&doc);

    assert_eq!(prober.workspace_count().await.unwrap(), 2);
    assert_eq!(prober.workspace_count().await.unwrap(), 2);
    assert_eq!(prober.collect_workspaces().await.unwrap().len(), 1);
    assert!(doc.style_payload(PROBE_SUPPRESSION_KEY).is_none());
}
