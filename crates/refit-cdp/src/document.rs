//! `HostDocument` over the debugging channel.
//!
//! `attach` evaluates a small page-side bridge exactly once: a node registry
//! (handle ↔ element), a MutationObserver publishing subtree batches, and a
//! click forwarder for engine-owned controls, all reporting through one
//! binding. After that, every trait method is a single evaluate call. The
//! bridge source is an opaque payload to this crate, like style payloads are
//! to the engine.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::sync::broadcast;

use refit_core::Logger;
use refit_dom::{
    DocumentEvent, DomError, EventBus, EventSubscription, HostDocument, Mutation, MutationKind,
    NodeId, Selector,
};

use crate::channel::{ChannelEvent, DebugChannel};
use crate::error::CdpError;
use crate::inject;

const BINDING_NAME: &str = "__rfEmit";

/// The page-side bridge. Idempotent: re-evaluating against an already
/// bridged document is a no-op.
const BRIDGE: &str = r#"
(() => {
  if (window.__rf) return "already-bridged";
  const nodes = new Map();
  let nextId = 1;
  let suppressForward = false;
  const idOf = (el) => {
    if (!el || el.nodeType !== 1) return null;
    if (!el.__rfNode) { el.__rfNode = nextId++; nodes.set(el.__rfNode, el); }
    return el.__rfNode;
  };
  const get = (id) => {
    const el = nodes.get(id);
    if (!el) throw new Error("rf-node-gone:" + id);
    return el;
  };
  const emit = (payload) => {
    if (window.__rfEmit) window.__rfEmit(JSON.stringify(payload));
  };
  const rf = {
    query: (sel) => idOf(document.querySelector(sel)),
    queryAll: (sel) => Array.from(document.querySelectorAll(sel)).map(idOf),
    queryWithin: (id, sel) => idOf(get(id).querySelector(sel)),
    queryAllWithin: (id, sel) => Array.from(get(id).querySelectorAll(sel)).map(idOf),
    exists: (id) => { const el = nodes.get(id); return !!el && el.isConnected; },
    contains: (a, b) => get(a) === get(b) || get(a).contains(get(b)),
    parent: (id) => idOf(get(id).parentElement),
    children: (id) => Array.from(get(id).children).map(idOf),
    tagName: (id) => get(id).tagName.toLowerCase(),
    text: (id) => (get(id).textContent || "").trim(),
    attr: (id, name) => get(id).getAttribute(name),
    setAttr: (id, name, value) => { get(id).setAttribute(name, value); return true; },
    addClass: (id, c) => { get(id).classList.add(c); return true; },
    removeClass: (id, c) => { get(id).classList.remove(c); return true; },
    inner: (id) => get(id).innerHTML,
    outer: (id) => get(id).outerHTML,
    setInner: (id, html) => { get(id).innerHTML = html; return true; },
    create: (tag) => idOf(document.createElement(tag)),
    insertBefore: (p, n, r) => {
      get(p).insertBefore(get(n), r == null ? null : get(r));
      return true;
    },
    append: (p, n) => { get(p).appendChild(get(n)); return true; },
    remove: (id) => { get(id).remove(); return true; },
    click: (id) => {
      suppressForward = true;
      try { get(id).click(); } finally { suppressForward = false; }
      return true;
    },
    forward: (id) => {
      get(id).addEventListener("click", () => {
        if (!suppressForward) emit({ click: id });
      });
      return true;
    },
    installStyle: (key, payload) => {
      rf.removeStyle(key);
      const style = document.createElement("style");
      style.id = key;
      style.textContent = payload;
      document.body.appendChild(style);
      return true;
    },
    removeStyle: (key) => {
      const el = document.getElementById(key);
      if (el) el.remove();
      return true;
    },
    styleInstalled: (key) => !!document.getElementById(key),
    location: () => window.location.href,
    navigate: (url) => { window.location.href = url; return true; },
  };
  const observer = new MutationObserver((mutations) => {
    const batch = [];
    for (const m of mutations) {
      const target = m.target.nodeType === 1 ? m.target : m.target.parentElement;
      batch.push({ target: idOf(target) || 0, kind: m.type });
    }
    emit({ mutations: batch });
  });
  observer.observe(document.body, {
    childList: true, subtree: true, attributes: true, characterData: true,
  });
  window.__rf = rf;
  return "bridged";
})()
"#;

/// A live host document reached over the debugging channel.
pub struct CdpDocument {
    channel: DebugChannel,
    bus: EventBus,
}

impl CdpDocument {
    /// Open the document: enable the runtime, register the binding, evaluate
    /// the bridge exactly once, and start pumping binding events onto the
    /// engine's event bus.
    pub async fn attach(channel: DebugChannel, logger: Logger) -> Result<Arc<Self>, CdpError> {
        channel.call("Runtime.enable", json!({})).await?;
        channel
            .call("Runtime.addBinding", json!({ "name": BINDING_NAME }))
            .await?;
        let outcome = inject::evaluate_once(&channel, BRIDGE).await?;
        logger.debug_with("bridge evaluated", &[("result", &outcome)]);

        let doc = Arc::new(Self {
            channel: channel.clone(),
            bus: EventBus::default(),
        });
        tokio::spawn(event_pump(channel.events(), doc.bus.clone(), logger));
        Ok(doc)
    }

    async fn eval(&self, expression: String) -> Result<Value, DomError> {
        let result = self
            .channel
            .call(
                "Runtime.evaluate",
                json!({ "expression": expression, "returnByValue": true }),
            )
            .await
            .map_err(DomError::from)?;

        if let Some(details) = result.get("exceptionDetails") {
            return Err(exception_to_dom_error(details));
        }

        Ok(result
            .get("result")
            .and_then(|r| r.get("value"))
            .cloned()
            .unwrap_or(Value::Null))
    }

    async fn eval_node_opt(&self, expression: String) -> Result<Option<NodeId>, DomError> {
        Ok(self.eval(expression).await?.as_u64().map(NodeId))
    }

    async fn eval_nodes(&self, expression: String) -> Result<Vec<NodeId>, DomError> {
        let value = self.eval(expression).await?;
        let Some(items) = value.as_array() else {
            return Err(DomError::Protocol(format!(
                "expected a node list, got {value}"
            )));
        };
        Ok(items
            .iter()
            .filter_map(Value::as_u64)
            .map(NodeId)
            .collect())
    }

    async fn eval_string(&self, expression: String) -> Result<String, DomError> {
        let value = self.eval(expression).await?;
        value
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| DomError::Protocol(format!("expected a string, got {value}")))
    }

    async fn eval_unit(&self, expression: String) -> Result<(), DomError> {
        self.eval(expression).await.map(|_| ())
    }
}

/// JS string literal with proper escaping.
fn js_str(s: &str) -> String {
    Value::String(s.to_string()).to_string()
}

fn js_node(node: NodeId) -> String {
    node.0.to_string()
}

fn exception_to_dom_error(details: &Value) -> DomError {
    let message = details
        .get("exception")
        .and_then(|e| e.get("description"))
        .and_then(Value::as_str)
        .or_else(|| details.get("text").and_then(Value::as_str))
        .unwrap_or("evaluation threw")
        .to_string();

    if let Some(idx) = message.find("rf-node-gone:") {
        let id: u64 = message[idx + "rf-node-gone:".len()..]
            .chars()
            .take_while(char::is_ascii_digit)
            .collect::<String>()
            .parse()
            .unwrap_or(0);
        return DomError::NodeGone(NodeId(id));
    }
    DomError::Protocol(message)
}

async fn event_pump(
    mut events: broadcast::Receiver<ChannelEvent>,
    bus: EventBus,
    logger: Logger,
) {
    loop {
        match events.recv().await {
            Ok(event) => {
                if event.method != "Runtime.bindingCalled" {
                    continue;
                }
                if event.params.get("name").and_then(Value::as_str) != Some(BINDING_NAME) {
                    continue;
                }
                let Some(payload) = event.params.get("payload").and_then(Value::as_str) else {
                    continue;
                };
                match serde_json::from_str::<Value>(payload) {
                    Ok(message) => publish(&bus, &message),
                    Err(err) => {
                        logger.warn_with("bad bridge payload", &[("error", &err.to_string())]);
                    }
                }
            }
            // A lagged receiver degrades to a resync hint downstream.
            Err(broadcast::error::RecvError::Lagged(_)) => {
                bus.publish(DocumentEvent::Mutations(Vec::new()));
            }
            Err(broadcast::error::RecvError::Closed) => return,
        }
    }
}

fn publish(bus: &EventBus, message: &Value) {
    if let Some(id) = message.get("click").and_then(Value::as_u64) {
        bus.publish(DocumentEvent::Click(NodeId(id)));
        return;
    }
    if let Some(items) = message.get("mutations").and_then(Value::as_array) {
        let batch: Vec<Mutation> = items
            .iter()
            .filter_map(|item| {
                let target = NodeId(item.get("target").and_then(Value::as_u64)?);
                let kind = match item.get("kind").and_then(Value::as_str)? {
                    "characterData" => MutationKind::CharacterData,
                    "attributes" => MutationKind::Attributes,
                    _ => MutationKind::ChildList,
                };
                Some(Mutation { target, kind })
            })
            .collect();
        bus.publish(DocumentEvent::Mutations(batch));
    }
}

#[async_trait]
impl HostDocument for CdpDocument {
    async fn query(&self, selector: &Selector) -> Result<Option<NodeId>, DomError> {
        self.eval_node_opt(format!("window.__rf.query({})", js_str(&selector.to_css())))
            .await
    }

    async fn query_all(&self, selector: &Selector) -> Result<Vec<NodeId>, DomError> {
        self.eval_nodes(format!(
            "window.__rf.queryAll({})",
            js_str(&selector.to_css())
        ))
        .await
    }

    async fn query_within(
        &self,
        root: NodeId,
        selector: &Selector,
    ) -> Result<Option<NodeId>, DomError> {
        self.eval_node_opt(format!(
            "window.__rf.queryWithin({}, {})",
            js_node(root),
            js_str(&selector.to_css())
        ))
        .await
    }

    async fn query_all_within(
        &self,
        root: NodeId,
        selector: &Selector,
    ) -> Result<Vec<NodeId>, DomError> {
        self.eval_nodes(format!(
            "window.__rf.queryAllWithin({}, {})",
            js_node(root),
            js_str(&selector.to_css())
        ))
        .await
    }

    async fn exists(&self, node: NodeId) -> Result<bool, DomError> {
        Ok(self
            .eval(format!("window.__rf.exists({})", js_node(node)))
            .await?
            .as_bool()
            .unwrap_or(false))
    }

    async fn contains(&self, ancestor: NodeId, node: NodeId) -> Result<bool, DomError> {
        Ok(self
            .eval(format!(
                "window.__rf.contains({}, {})",
                js_node(ancestor),
                js_node(node)
            ))
            .await?
            .as_bool()
            .unwrap_or(false))
    }

    async fn parent(&self, node: NodeId) -> Result<Option<NodeId>, DomError> {
        self.eval_node_opt(format!("window.__rf.parent({})", js_node(node)))
            .await
    }

    async fn children(&self, node: NodeId) -> Result<Vec<NodeId>, DomError> {
        self.eval_nodes(format!("window.__rf.children({})", js_node(node)))
            .await
    }

    async fn tag_name(&self, node: NodeId) -> Result<String, DomError> {
        self.eval_string(format!("window.__rf.tagName({})", js_node(node)))
            .await
    }

    async fn text_content(&self, node: NodeId) -> Result<String, DomError> {
        self.eval_string(format!("window.__rf.text({})", js_node(node)))
            .await
    }

    async fn attribute(&self, node: NodeId, name: &str) -> Result<Option<String>, DomError> {
        let value = self
            .eval(format!(
                "window.__rf.attr({}, {})",
                js_node(node),
                js_str(name)
            ))
            .await?;
        Ok(value.as_str().map(str::to_string))
    }

    async fn outer_markup(&self, node: NodeId) -> Result<String, DomError> {
        self.eval_string(format!("window.__rf.outer({})", js_node(node)))
            .await
    }

    async fn inner_markup(&self, node: NodeId) -> Result<String, DomError> {
        self.eval_string(format!("window.__rf.inner({})", js_node(node)))
            .await
    }

    async fn set_attribute(&self, node: NodeId, name: &str, value: &str) -> Result<(), DomError> {
        self.eval_unit(format!(
            "window.__rf.setAttr({}, {}, {})",
            js_node(node),
            js_str(name),
            js_str(value)
        ))
        .await
    }

    async fn add_class(&self, node: NodeId, class: &str) -> Result<(), DomError> {
        self.eval_unit(format!(
            "window.__rf.addClass({}, {})",
            js_node(node),
            js_str(class)
        ))
        .await
    }

    async fn remove_class(&self, node: NodeId, class: &str) -> Result<(), DomError> {
        self.eval_unit(format!(
            "window.__rf.removeClass({}, {})",
            js_node(node),
            js_str(class)
        ))
        .await
    }

    async fn set_inner_markup(&self, node: NodeId, markup: &str) -> Result<(), DomError> {
        self.eval_unit(format!(
            "window.__rf.setInner({}, {})",
            js_node(node),
            js_str(markup)
        ))
        .await
    }

    async fn create_element(&self, tag: &str) -> Result<NodeId, DomError> {
        self.eval_node_opt(format!("window.__rf.create({})", js_str(tag)))
            .await?
            .ok_or_else(|| DomError::Protocol("create returned no node".into()))
    }

    async fn insert_before(
        &self,
        parent: NodeId,
        node: NodeId,
        reference: Option<NodeId>,
    ) -> Result<(), DomError> {
        let reference = match reference {
            Some(reference) => js_node(reference),
            None => "null".to_string(),
        };
        self.eval_unit(format!(
            "window.__rf.insertBefore({}, {}, {reference})",
            js_node(parent),
            js_node(node)
        ))
        .await
    }

    async fn append_child(&self, parent: NodeId, node: NodeId) -> Result<(), DomError> {
        self.eval_unit(format!(
            "window.__rf.append({}, {})",
            js_node(parent),
            js_node(node)
        ))
        .await
    }

    async fn remove(&self, node: NodeId) -> Result<(), DomError> {
        self.eval_unit(format!("window.__rf.remove({})", js_node(node)))
            .await
    }

    async fn click(&self, node: NodeId) -> Result<(), DomError> {
        self.eval_unit(format!("window.__rf.click({})", js_node(node)))
            .await
    }

    async fn forward_clicks(&self, node: NodeId) -> Result<(), DomError> {
        self.eval_unit(format!("window.__rf.forward({})", js_node(node)))
            .await
    }

    async fn install_style(&self, key: &str, payload: &str) -> Result<(), DomError> {
        self.eval_unit(format!(
            "window.__rf.installStyle({}, {})",
            js_str(key),
            js_str(payload)
        ))
        .await
    }

    async fn remove_style(&self, key: &str) -> Result<(), DomError> {
        self.eval_unit(format!("window.__rf.removeStyle({})", js_str(key)))
            .await
    }

    async fn style_installed(&self, key: &str) -> Result<bool, DomError> {
        Ok(self
            .eval(format!("window.__rf.styleInstalled({})", js_str(key)))
            .await?
            .as_bool()
            .unwrap_or(false))
    }

    async fn location(&self) -> Result<String, DomError> {
        self.eval_string("window.__rf.location()".to_string()).await
    }

    async fn navigate(&self, url: &str) -> Result<(), DomError> {
        self.eval_unit(format!("window.__rf.navigate({})", js_str(url)))
            .await
    }

    fn subscribe(&self) -> EventSubscription {
        self.bus.subscribe()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn js_str_escapes_quotes_and_backslashes() {
        assert_eq!(js_str(r#"a"b\c"#), r#""a\"b\\c""#);
    }

    #[test]
    fn node_gone_exceptions_map_to_dom_errors() {
        let details = json!({
            "exception": {"description": "Error: rf-node-gone:42"}
        });
        assert_eq!(
            exception_to_dom_error(&details),
            DomError::NodeGone(NodeId(42))
        );

        let details = json!({"text": "Uncaught TypeError"});
        assert!(matches!(
            exception_to_dom_error(&details),
            DomError::Protocol(_)
        ));
    }

    #[test]
    fn bridge_click_payloads_reach_the_bus() {
        let bus = EventBus::default();
        let mut sub_rx = bus.subscribe();
        publish(&bus, &json!({"click": 9}));
        let event = futures_util::FutureExt::now_or_never(sub_rx.next())
            .flatten()
            .unwrap();
        assert_eq!(event, DocumentEvent::Click(NodeId(9)));
    }

    #[test]
    fn bridge_mutation_payloads_translate_kinds() {
        let bus = EventBus::default();
        let mut sub_rx = bus.subscribe();
        publish(
            &bus,
            &json!({"mutations": [
                {"target": 3, "kind": "attributes"},
                {"target": 4, "kind": "childList"},
                {"target": 5, "kind": "characterData"}
            ]}),
        );
        let event = futures_util::FutureExt::now_or_never(sub_rx.next())
            .flatten()
            .unwrap();
        match event {
            DocumentEvent::Mutations(batch) => {
                assert_eq!(batch.len(), 3);
                assert_eq!(batch[0].kind, MutationKind::Attributes);
                assert_eq!(batch[1].kind, MutationKind::ChildList);
                assert_eq!(batch[2].kind, MutationKind::CharacterData);
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }
}
