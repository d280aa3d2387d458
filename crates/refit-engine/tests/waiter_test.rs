#![allow(clippy::expect_used, clippy::unwrap_used)]

//! Element waiter semantics:
//! - immediate resolve when the query already matches
//! - resolve on a later host render
//! - optional timeout and cancellation (default is wait-forever)
//! - untagged-instance exclusion for supervisor loops
//! - subscription released on every exit path

use std::time::Duration;

use tokio_util::sync::CancellationToken;

use refit_dom::mock::{MockDocument, NodeBlueprint};
use refit_dom::{HostDocument, Matcher, Selector};
use refit_engine::waiter::{
    wait_for_absence, wait_for_element, wait_for_element_excluding, WaitOptions,
};
use refit_engine::EngineError;

fn strip_selector() -> Selector {
    Selector::new(Matcher::any().class("p-control_strip"))
}

#[tokio::test]
async fn resolves_immediately_when_element_exists() {
    let doc = MockDocument::new();
    let node = doc.insert_blueprint(doc.root(), &NodeBlueprint::new("div").class("p-control_strip"));

    let found = wait_for_element(&doc, &strip_selector(), &WaitOptions::forever())
        .await
        .unwrap();
    assert_eq!(found, node);
}

#[tokio::test]
async fn resolves_when_host_renders_the_element_later() {
    let doc = std::sync::Arc::new(MockDocument::new());

    let inserter = {
        let doc = doc.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(30)).await;
            doc.insert_blueprint(doc.root(), &NodeBlueprint::new("div").class("p-control_strip"))
        })
    };

    let found = wait_for_element(doc.as_ref(), &strip_selector(), &WaitOptions::forever())
        .await
        .unwrap();
    let inserted = inserter.await.unwrap();
    assert_eq!(found, inserted);
}

#[tokio::test]
async fn optional_timeout_reports_instead_of_suspending() {
    let doc = MockDocument::new();

    let err = match wait_for_element(
        &doc,
        &strip_selector(),
        &WaitOptions::with_timeout(Duration::from_millis(40)),
    )
    .await
    {
        Ok(node) => panic!("unexpected match: {node}"),
        Err(err) => err,
    };
    assert!(
        matches!(err, EngineError::WaitTimeout { .. }),
        "err={err}"
    );
}

#[tokio::test]
async fn cancellation_ends_the_wait() {
    let doc = MockDocument::new();
    let cancel = CancellationToken::new();
    let opts = WaitOptions::forever().cancelled_by(cancel.clone());

    let canceller = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        cancel.cancel();
    });

    let err = match wait_for_element(&doc, &strip_selector(), &opts).await {
        Ok(node) => panic!("unexpected match: {node}"),
        Err(err) => err,
    };
    assert!(matches!(err, EngineError::WaitCancelled { .. }), "err={err}");
    canceller.await.unwrap();
}

#[tokio::test]
async fn excluding_skips_the_tagged_instance() {
    let doc = std::sync::Arc::new(MockDocument::new());
    let tagged = doc.insert_blueprint(
        doc.root(),
        &NodeBlueprint::new("div")
            .class("p-control_strip")
            .attr("id", "rf-moved"),
    );

    // Only the tagged instance exists: a bounded wait comes up empty.
    let err = match wait_for_element_excluding(
        doc.as_ref(),
        &strip_selector(),
        Some("rf-moved"),
        &WaitOptions::with_timeout(Duration::from_millis(40)),
    )
    .await
    {
        Ok(node) => panic!("matched the tagged instance: {node}"),
        Err(err) => err,
    };
    assert!(matches!(err, EngineError::WaitTimeout { .. }), "err={err}");

    // A fresh untagged instance resolves, and not to the tagged node.
    let inserter = {
        let doc = doc.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            doc.insert_blueprint(doc.root(), &NodeBlueprint::new("div").class("p-control_strip"))
        })
    };
    let found = wait_for_element_excluding(
        doc.as_ref(),
        &strip_selector(),
        Some("rf-moved"),
        &WaitOptions::forever(),
    )
    .await
    .unwrap();
    assert_eq!(found, inserter.await.unwrap());
    assert_ne!(found, tagged);
}

#[tokio::test]
async fn absence_resolves_once_the_element_is_gone() {
    let doc = std::sync::Arc::new(MockDocument::new());
    let node = doc.insert_blueprint(doc.root(), &NodeBlueprint::new("div").class("overlay"));
    let selector = Selector::new(Matcher::any().class("overlay"));

    let remover = {
        let doc = doc.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            doc.host_remove(node);
        })
    };

    wait_for_absence(doc.as_ref(), &selector, &WaitOptions::forever())
        .await
        .unwrap();
    remover.await.unwrap();
    assert!(doc.query(&selector).await.unwrap().is_none());
}

#[tokio::test]
async fn subscription_is_released_on_every_exit() {
    let doc = MockDocument::new();
    assert_eq!(doc.bus().subscriber_count(), 0);

    // Timeout path.
    let _ = wait_for_element(
        &doc,
        &strip_selector(),
        &WaitOptions::with_timeout(Duration::from_millis(20)),
    )
    .await;
    assert_eq!(doc.bus().subscriber_count(), 0);

    // Fast path never subscribes at all.
    doc.insert_blueprint(doc.root(), &NodeBlueprint::new("div").class("p-control_strip"));
    wait_for_element(&doc, &strip_selector(), &WaitOptions::forever())
        .await
        .unwrap();
    assert_eq!(doc.bus().subscriber_count(), 0);
}
