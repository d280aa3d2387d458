//! In-memory host document for unit testing.
//!
//! Holds a real tree, matches selectors in document order, and publishes
//! mutation batches like a live backend. Scripted click reactions let a test
//! play the host application: "when this control is clicked, render that
//! overlay", "when the overlay is clicked, tear it down" — which is exactly
//! the behavior the prober and supervisor code must survive.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::document::{HostDocument, NodeId};
use crate::error::DomError;
use crate::events::{DocumentEvent, EventBus, EventSubscription, Mutation, MutationKind};
use crate::selector::{Combinator, Matcher, NodeFacts, Selector};

const ROOT_ID: u64 = 1;

// ---------------------------------------------------------------------------
// Blueprints and scripted reactions
// ---------------------------------------------------------------------------

/// A subtree template a test instantiates into the document. Every
/// instantiation mints fresh node ids, the way a host re-render would.
#[derive(Debug, Clone, Default)]
pub struct NodeBlueprint {
    tag: String,
    classes: Vec<String>,
    attrs: Vec<(String, String)>,
    text: String,
    children: Vec<NodeBlueprint>,
}

impl NodeBlueprint {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_string(),
            ..Self::default()
        }
    }

    pub fn class(mut self, class: &str) -> Self {
        self.classes.push(class.to_string());
        self
    }

    pub fn attr(mut self, name: &str, value: &str) -> Self {
        self.attrs.push((name.to_string(), value.to_string()));
        self
    }

    pub fn text(mut self, text: &str) -> Self {
        self.text = text.to_string();
        self
    }

    pub fn child(mut self, child: NodeBlueprint) -> Self {
        self.children.push(child);
        self
    }
}

/// What the scripted host does when a matching element is clicked.
#[derive(Debug, Clone)]
pub enum ClickBehavior {
    /// Render a subtree under the first element matching `parent`.
    InsertUnder {
        parent: Selector,
        blueprint: NodeBlueprint,
    },
    /// Tear down the clicked element's subtree.
    RemoveSelf,
    /// Tear down every element matching the selector.
    RemoveMatching(Selector),
}

// ---------------------------------------------------------------------------
// Tree state
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct NodeData {
    tag: String,
    attrs: BTreeMap<String, String>,
    classes: Vec<String>,
    text: String,
    raw_markup: Option<String>,
    children: Vec<u64>,
    parent: Option<u64>,
}

struct TreeState {
    nodes: HashMap<u64, NodeData>,
    next_id: u64,
    styles: BTreeMap<String, String>,
    location: String,
    clicks: Vec<NodeId>,
    navigations: Vec<String>,
    click_forwarded: HashSet<u64>,
    reactions: Vec<(Selector, ClickBehavior)>,
}

impl TreeState {
    fn new() -> Self {
        let mut nodes = HashMap::new();
        nodes.insert(
            ROOT_ID,
            NodeData {
                tag: "body".to_string(),
                attrs: BTreeMap::new(),
                classes: Vec::new(),
                text: String::new(),
                raw_markup: None,
                children: Vec::new(),
                parent: None,
            },
        );
        Self {
            nodes,
            next_id: ROOT_ID + 1,
            styles: BTreeMap::new(),
            location: "https://app.example.test/client".to_string(),
            clicks: Vec::new(),
            navigations: Vec::new(),
            click_forwarded: HashSet::new(),
            reactions: Vec::new(),
        }
    }

    fn node(&self, id: NodeId) -> Result<&NodeData, DomError> {
        self.nodes.get(&id.0).ok_or(DomError::UnknownNode(id))
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut NodeData, DomError> {
        self.nodes.get_mut(&id.0).ok_or(DomError::UnknownNode(id))
    }

    fn is_attached(&self, id: u64) -> bool {
        let mut current = id;
        loop {
            if current == ROOT_ID {
                return true;
            }
            match self.nodes.get(&current).and_then(|n| n.parent) {
                Some(parent) => current = parent,
                None => return false,
            }
        }
    }

    fn facts(&self, id: u64) -> Option<NodeFacts<'_>> {
        let data = self.nodes.get(&id)?;
        Some(NodeFacts {
            tag: &data.tag,
            id: data.attrs.get("id").map(String::as_str),
            classes: &data.classes,
            attrs: &data.attrs,
        })
    }

    fn matcher_fits(&self, id: u64, matcher: &Matcher) -> bool {
        match self.facts(id) {
            Some(facts) => matcher.matches(&facts),
            None => false,
        }
    }

    fn matches_chain(&self, id: u64, head: &Matcher, tail: &[(Combinator, Matcher)]) -> bool {
        match tail.split_last() {
            None => self.matcher_fits(id, head),
            Some(((combinator, matcher), rest)) => {
                if !self.matcher_fits(id, matcher) {
                    return false;
                }
                let parent = self.nodes.get(&id).and_then(|n| n.parent);
                match combinator {
                    Combinator::Child => match parent {
                        Some(p) => self.matches_chain(p, head, rest),
                        None => false,
                    },
                    Combinator::Descendant => {
                        let mut ancestor = parent;
                        while let Some(p) = ancestor {
                            if self.matches_chain(p, head, rest) {
                                return true;
                            }
                            ancestor = self.nodes.get(&p).and_then(|n| n.parent);
                        }
                        false
                    }
                }
            }
        }
    }

    fn matches_selector(&self, id: u64, selector: &Selector) -> bool {
        let (head, tail) = selector.ancestry();
        self.matches_chain(id, head, tail)
    }

    /// Attached nodes in document (DFS preorder) order.
    fn document_order(&self, from: u64) -> Vec<u64> {
        let mut out = Vec::new();
        let mut stack = vec![from];
        while let Some(id) = stack.pop() {
            out.push(id);
            if let Some(node) = self.nodes.get(&id) {
                for child in node.children.iter().rev() {
                    stack.push(*child);
                }
            }
        }
        out
    }

    fn select_all(&self, from: u64, selector: &Selector, skip_self: bool) -> Vec<NodeId> {
        self.document_order(from)
            .into_iter()
            .filter(|id| !(skip_self && *id == from))
            .filter(|id| self.matches_selector(*id, selector))
            .map(NodeId)
            .collect()
    }

    fn detach(&mut self, id: u64) {
        let parent = self.nodes.get(&id).and_then(|n| n.parent);
        if let Some(parent_id) = parent {
            if let Some(parent_node) = self.nodes.get_mut(&parent_id) {
                parent_node.children.retain(|c| *c != id);
            }
        }
        if let Some(node) = self.nodes.get_mut(&id) {
            node.parent = None;
        }
    }

    fn instantiate(&mut self, blueprint: &NodeBlueprint, parent: u64) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        let mut attrs = BTreeMap::new();
        for (name, value) in &blueprint.attrs {
            attrs.insert(name.clone(), value.clone());
        }
        self.nodes.insert(
            id,
            NodeData {
                tag: blueprint.tag.clone(),
                attrs,
                classes: blueprint.classes.clone(),
                text: blueprint.text.clone(),
                raw_markup: None,
                children: Vec::new(),
                parent: Some(parent),
            },
        );
        for child in &blueprint.children {
            let child_id = self.instantiate(child, id);
            if let Some(node) = self.nodes.get_mut(&id) {
                node.children.push(child_id);
            }
        }
        id
    }

    fn serialize(&self, id: u64, include_self: bool) -> String {
        let Some(node) = self.nodes.get(&id) else {
            return String::new();
        };
        let mut inner = String::new();
        inner.push_str(&node.text);
        match &node.raw_markup {
            Some(raw) => inner.push_str(raw),
            None => {
                for child in &node.children {
                    inner.push_str(&self.serialize(*child, true));
                }
            }
        }
        if !include_self {
            return inner;
        }
        let mut open = format!("<{}", node.tag);
        if !node.classes.is_empty() {
            open.push_str(&format!(" class=\"{}\"", node.classes.join(" ")));
        }
        for (name, value) in &node.attrs {
            open.push_str(&format!(" {name}=\"{value}\""));
        }
        format!("{open}>{inner}</{}>", node.tag)
    }

    fn collect_text(&self, id: u64, out: &mut String) {
        if let Some(node) = self.nodes.get(&id) {
            out.push_str(&node.text);
            for child in &node.children {
                self.collect_text(*child, out);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// MockDocument
// ---------------------------------------------------------------------------

/// In-memory implementation of [`HostDocument`] for tests.
pub struct MockDocument {
    state: Mutex<TreeState>,
    bus: EventBus,
}

impl Default for MockDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl MockDocument {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(TreeState::new()),
            bus: EventBus::default(),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, TreeState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn publish_mutation(&self, target: NodeId, kind: MutationKind) {
        self.bus
            .publish(DocumentEvent::Mutations(vec![Mutation { target, kind }]));
    }

    /// The document body.
    pub fn root(&self) -> NodeId {
        NodeId(ROOT_ID)
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    // Host-side scripting ---------------------------------------------------

    /// Instantiate a blueprint under `parent`, as a host render would.
    pub fn insert_blueprint(&self, parent: NodeId, blueprint: &NodeBlueprint) -> NodeId {
        let id = {
            let mut state = self.lock();
            let id = state.instantiate(blueprint, parent.0);
            if let Some(node) = state.nodes.get_mut(&parent.0) {
                node.children.push(id);
            }
            id
        };
        self.publish_mutation(parent, MutationKind::ChildList);
        NodeId(id)
    }

    /// Tear a subtree down, as a host re-render would.
    pub fn host_remove(&self, node: NodeId) {
        let parent = {
            let mut state = self.lock();
            let parent = state.nodes.get(&node.0).and_then(|n| n.parent);
            state.detach(node.0);
            parent
        };
        if let Some(parent) = parent {
            self.publish_mutation(NodeId(parent), MutationKind::ChildList);
        }
    }

    /// Script a click reaction: when an element matching `target` is clicked,
    /// the host performs `behavior`.
    pub fn on_click(&self, target: Selector, behavior: ClickBehavior) {
        self.lock().reactions.push((target, behavior));
    }

    /// Change the host location (publishes a resync mutation, the way
    /// location changes surface through document mutations).
    pub fn set_location(&self, location: &str) {
        self.lock().location = location.to_string();
        self.publish_mutation(self.root(), MutationKind::CharacterData);
    }

    /// Simulate a user pressing an element: scripted reactions run and, for
    /// click-forwarded controls, a click event reaches the bus. Engine clicks
    /// ([`HostDocument::click`]) run the same reactions but are never
    /// forwarded — forwarding exists to carry *user* intent to the engine,
    /// and the engine already knows its own.
    pub fn press(&self, node: NodeId) {
        self.apply_click(node, true);
    }

    fn apply_click(&self, node: NodeId, user: bool) {
        let mut mutated_parents: Vec<NodeId> = Vec::new();
        let forwarded;
        {
            let mut state = self.lock();
            if !user {
                state.clicks.push(node);
            }
            forwarded = user && state.click_forwarded.contains(&node.0);

            let behaviors: Vec<ClickBehavior> = state
                .reactions
                .iter()
                .filter(|(sel, _)| state.matches_selector(node.0, sel))
                .map(|(_, b)| b.clone())
                .collect();

            for behavior in behaviors {
                match behavior {
                    ClickBehavior::InsertUnder { parent, blueprint } => {
                        if let Some(parent_id) = state.select_all(ROOT_ID, &parent, false).first() {
                            let parent_id = *parent_id;
                            let id = state.instantiate(&blueprint, parent_id.0);
                            if let Some(p) = state.nodes.get_mut(&parent_id.0) {
                                p.children.push(id);
                            }
                            mutated_parents.push(parent_id);
                        }
                    }
                    ClickBehavior::RemoveSelf => {
                        let parent = state.nodes.get(&node.0).and_then(|n| n.parent);
                        state.detach(node.0);
                        if let Some(parent) = parent {
                            mutated_parents.push(NodeId(parent));
                        }
                    }
                    ClickBehavior::RemoveMatching(selector) => {
                        for target in state.select_all(ROOT_ID, &selector, false) {
                            let parent = state.nodes.get(&target.0).and_then(|n| n.parent);
                            state.detach(target.0);
                            if let Some(parent) = parent {
                                mutated_parents.push(NodeId(parent));
                            }
                        }
                    }
                }
            }
        }
        for parent in mutated_parents {
            self.publish_mutation(parent, MutationKind::ChildList);
        }
        if forwarded {
            self.bus.publish(DocumentEvent::Click(node));
        }
    }

    // Test inspection -------------------------------------------------------

    /// Engine-triggered clicks, in order.
    pub fn clicks(&self) -> Vec<NodeId> {
        self.lock().clicks.clone()
    }

    pub fn navigations(&self) -> Vec<String> {
        self.lock().navigations.clone()
    }

    pub fn styles(&self) -> BTreeMap<String, String> {
        self.lock().styles.clone()
    }

    pub fn style_payload(&self, key: &str) -> Option<String> {
        self.lock().styles.get(key).cloned()
    }

    /// Class list of a node (empty for unknown nodes).
    pub fn classes_of(&self, node: NodeId) -> Vec<String> {
        self.lock()
            .nodes
            .get(&node.0)
            .map(|n| n.classes.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl HostDocument for MockDocument {
    async fn query(&self, selector: &Selector) -> Result<Option<NodeId>, DomError> {
        let state = self.lock();
        Ok(state.select_all(ROOT_ID, selector, true).into_iter().next())
    }

    async fn query_all(&self, selector: &Selector) -> Result<Vec<NodeId>, DomError> {
        let state = self.lock();
        Ok(state.select_all(ROOT_ID, selector, true))
    }

    async fn query_within(
        &self,
        root: NodeId,
        selector: &Selector,
    ) -> Result<Option<NodeId>, DomError> {
        let state = self.lock();
        state.node(root)?;
        Ok(state.select_all(root.0, selector, true).into_iter().next())
    }

    async fn query_all_within(
        &self,
        root: NodeId,
        selector: &Selector,
    ) -> Result<Vec<NodeId>, DomError> {
        let state = self.lock();
        state.node(root)?;
        Ok(state.select_all(root.0, selector, true))
    }

    async fn exists(&self, node: NodeId) -> Result<bool, DomError> {
        let state = self.lock();
        Ok(state.nodes.contains_key(&node.0) && state.is_attached(node.0))
    }

    async fn contains(&self, ancestor: NodeId, node: NodeId) -> Result<bool, DomError> {
        let state = self.lock();
        let mut current = Some(node.0);
        while let Some(id) = current {
            if id == ancestor.0 {
                return Ok(true);
            }
            current = state.nodes.get(&id).and_then(|n| n.parent);
        }
        Ok(false)
    }

    async fn parent(&self, node: NodeId) -> Result<Option<NodeId>, DomError> {
        let state = self.lock();
        Ok(state.node(node)?.parent.map(NodeId))
    }

    async fn children(&self, node: NodeId) -> Result<Vec<NodeId>, DomError> {
        let state = self.lock();
        Ok(state.node(node)?.children.iter().copied().map(NodeId).collect())
    }

    async fn tag_name(&self, node: NodeId) -> Result<String, DomError> {
        let state = self.lock();
        Ok(state.node(node)?.tag.clone())
    }

    async fn text_content(&self, node: NodeId) -> Result<String, DomError> {
        let state = self.lock();
        state.node(node)?;
        let mut out = String::new();
        state.collect_text(node.0, &mut out);
        Ok(out.trim().to_string())
    }

    async fn attribute(&self, node: NodeId, name: &str) -> Result<Option<String>, DomError> {
        let state = self.lock();
        Ok(state.node(node)?.attrs.get(name).cloned())
    }

    async fn outer_markup(&self, node: NodeId) -> Result<String, DomError> {
        let state = self.lock();
        state.node(node)?;
        Ok(state.serialize(node.0, true))
    }

    async fn inner_markup(&self, node: NodeId) -> Result<String, DomError> {
        let state = self.lock();
        state.node(node)?;
        Ok(state.serialize(node.0, false))
    }

    // Attribute edits publish only on actual change, like a real
    // MutationObserver: a no-op class re-add must not wake observers (the
    // visibility watcher re-asserts on every batch and would otherwise feed
    // itself).
    async fn set_attribute(&self, node: NodeId, name: &str, value: &str) -> Result<(), DomError> {
        let changed = {
            let mut state = self.lock();
            let previous = state
                .node_mut(node)?
                .attrs
                .insert(name.to_string(), value.to_string());
            previous.as_deref() != Some(value)
        };
        if changed {
            self.publish_mutation(node, MutationKind::Attributes);
        }
        Ok(())
    }

    async fn add_class(&self, node: NodeId, class: &str) -> Result<(), DomError> {
        let changed = {
            let mut state = self.lock();
            let data = state.node_mut(node)?;
            if data.classes.iter().any(|c| c == class) {
                false
            } else {
                data.classes.push(class.to_string());
                true
            }
        };
        if changed {
            self.publish_mutation(node, MutationKind::Attributes);
        }
        Ok(())
    }

    async fn remove_class(&self, node: NodeId, class: &str) -> Result<(), DomError> {
        let changed = {
            let mut state = self.lock();
            let data = state.node_mut(node)?;
            let before = data.classes.len();
            data.classes.retain(|c| c != class);
            data.classes.len() != before
        };
        if changed {
            self.publish_mutation(node, MutationKind::Attributes);
        }
        Ok(())
    }

    async fn set_inner_markup(&self, node: NodeId, markup: &str) -> Result<(), DomError> {
        {
            let mut state = self.lock();
            let children = state.node(node)?.children.clone();
            for child in children {
                state.detach(child);
            }
            state.node_mut(node)?.raw_markup = Some(markup.to_string());
        }
        self.publish_mutation(node, MutationKind::ChildList);
        Ok(())
    }

    async fn create_element(&self, tag: &str) -> Result<NodeId, DomError> {
        let mut state = self.lock();
        let id = state.next_id;
        state.next_id += 1;
        state.nodes.insert(
            id,
            NodeData {
                tag: tag.to_string(),
                attrs: BTreeMap::new(),
                classes: Vec::new(),
                text: String::new(),
                raw_markup: None,
                children: Vec::new(),
                parent: None,
            },
        );
        Ok(NodeId(id))
    }

    async fn insert_before(
        &self,
        parent: NodeId,
        node: NodeId,
        reference: Option<NodeId>,
    ) -> Result<(), DomError> {
        {
            let mut state = self.lock();
            state.node(parent)?;
            state.node(node)?;
            state.detach(node.0);
            let position = {
                let parent_node = state.node(parent)?;
                match reference {
                    Some(reference) => parent_node
                        .children
                        .iter()
                        .position(|c| *c == reference.0)
                        .unwrap_or(parent_node.children.len()),
                    None => parent_node.children.len(),
                }
            };
            state.node_mut(parent)?.children.insert(position, node.0);
            state.node_mut(node)?.parent = Some(parent.0);
        }
        self.publish_mutation(parent, MutationKind::ChildList);
        Ok(())
    }

    async fn append_child(&self, parent: NodeId, node: NodeId) -> Result<(), DomError> {
        self.insert_before(parent, node, None).await
    }

    async fn remove(&self, node: NodeId) -> Result<(), DomError> {
        let parent = {
            let mut state = self.lock();
            state.node(node)?;
            let parent = state.nodes.get(&node.0).and_then(|n| n.parent);
            state.detach(node.0);
            parent
        };
        if let Some(parent) = parent {
            self.publish_mutation(NodeId(parent), MutationKind::ChildList);
        }
        Ok(())
    }

    async fn click(&self, node: NodeId) -> Result<(), DomError> {
        {
            let state = self.lock();
            state.node(node)?;
        }
        self.apply_click(node, false);
        Ok(())
    }

    async fn forward_clicks(&self, node: NodeId) -> Result<(), DomError> {
        let mut state = self.lock();
        state.node(node)?;
        state.click_forwarded.insert(node.0);
        Ok(())
    }

    async fn install_style(&self, key: &str, payload: &str) -> Result<(), DomError> {
        self.lock()
            .styles
            .insert(key.to_string(), payload.to_string());
        Ok(())
    }

    async fn remove_style(&self, key: &str) -> Result<(), DomError> {
        self.lock().styles.remove(key);
        Ok(())
    }

    async fn style_installed(&self, key: &str) -> Result<bool, DomError> {
        Ok(self.lock().styles.contains_key(key))
    }

    async fn location(&self) -> Result<String, DomError> {
        Ok(self.lock().location.clone())
    }

    async fn navigate(&self, url: &str) -> Result<(), DomError> {
        self.lock().navigations.push(url.to_string());
        Ok(())
    }

    fn subscribe(&self) -> EventSubscription {
        self.bus.subscribe()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn rail_fixture() -> NodeBlueprint {
        NodeBlueprint::new("div").class("p-tab_rail").child(
            NodeBlueprint::new("div")
                .attr("role", "tablist")
                .child(
                    NodeBlueprint::new("button")
                        .attr("aria-label", "Home")
                        .child(NodeBlueprint::new("span").class("label").text("Home")),
                )
                .child(
                    NodeBlueprint::new("button")
                        .attr("aria-label", "DMs")
                        .child(NodeBlueprint::new("span").class("label").text("DMs")),
                ),
        )
    }

    #[tokio::test]
    async fn query_matches_in_document_order() {
        let doc = MockDocument::new();
        doc.insert_blueprint(doc.root(), &rail_fixture());

        let buttons = doc
            .query_all(&Selector::new(Matcher::tag("button")))
            .await
            .unwrap();
        assert_eq!(buttons.len(), 2);

        let first = doc
            .query(&Selector::new(Matcher::tag("button")))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(first, buttons[0]);
        assert_eq!(
            doc.attribute(first, "aria-label").await.unwrap().as_deref(),
            Some("Home")
        );
    }

    #[tokio::test]
    async fn descendant_and_child_chains() {
        let doc = MockDocument::new();
        doc.insert_blueprint(doc.root(), &rail_fixture());

        let nested = Selector::new(Matcher::any().class("p-tab_rail"))
            .descendant(Matcher::any().class("label"));
        assert_eq!(doc.query_all(&nested).await.unwrap().len(), 2);

        let child = Selector::new(Matcher::any().class("p-tab_rail"))
            .child(Matcher::any().attr("role", "tablist"));
        assert!(doc.query(&child).await.unwrap().is_some());

        // `child` must not match grandchildren.
        let wrong = Selector::new(Matcher::any().class("p-tab_rail"))
            .child(Matcher::any().class("label"));
        assert!(doc.query(&wrong).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn insert_before_relocates_attached_nodes() {
        let doc = MockDocument::new();
        let rail = doc.insert_blueprint(doc.root(), &rail_fixture());
        let extra = doc.insert_blueprint(doc.root(), &NodeBlueprint::new("div").class("strip"));

        doc.insert_before(rail, extra, None).await.unwrap();
        assert_eq!(doc.parent(extra).await.unwrap(), Some(rail));
        // Body no longer lists it.
        assert_eq!(doc.children(doc.root()).await.unwrap(), vec![rail]);
    }

    #[tokio::test]
    async fn removed_subtree_is_detached_but_ops_still_answer() {
        let doc = MockDocument::new();
        let rail = doc.insert_blueprint(doc.root(), &rail_fixture());
        doc.remove(rail).await.unwrap();
        assert!(!doc.exists(rail).await.unwrap());
        assert!(doc
            .query(&Selector::new(Matcher::tag("button")))
            .await
            .unwrap()
            .is_none());
        // The handle still answers, DOM-style, for detached nodes.
        assert_eq!(doc.tag_name(rail).await.unwrap(), "div");
    }

    #[tokio::test]
    async fn scripted_click_renders_and_tears_down_overlay() {
        let doc = MockDocument::new();
        doc.insert_blueprint(
            doc.root(),
            &NodeBlueprint::new("button").class("p-account_switcher"),
        );
        doc.on_click(
            Selector::new(Matcher::any().class("p-account_switcher")),
            ClickBehavior::InsertUnder {
                parent: Selector::new(Matcher::tag("body")),
                blueprint: NodeBlueprint::new("div")
                    .class("overlay")
                    .child(NodeBlueprint::new("div").class("menu")),
            },
        );
        doc.on_click(
            Selector::new(Matcher::any().class("overlay")),
            ClickBehavior::RemoveSelf,
        );

        let switcher = doc
            .query(&Selector::new(Matcher::any().class("p-account_switcher")))
            .await
            .unwrap()
            .unwrap();
        doc.click(switcher).await.unwrap();

        let overlay_sel = Selector::new(Matcher::any().class("overlay"));
        let overlay = doc.query(&overlay_sel).await.unwrap().unwrap();
        doc.click(overlay).await.unwrap();
        assert!(doc.query(&overlay_sel).await.unwrap().is_none());

        // Each open mints fresh nodes.
        doc.click(switcher).await.unwrap();
        let second = doc.query(&overlay_sel).await.unwrap().unwrap();
        assert_ne!(second, overlay);
    }

    #[tokio::test]
    async fn forwarded_clicks_reach_the_bus() {
        let doc = MockDocument::new();
        let button = doc.insert_blueprint(doc.root(), &NodeBlueprint::new("button"));
        doc.forward_clicks(button).await.unwrap();

        let mut sub = doc.subscribe();
        doc.press(button);
        loop {
            match sub.next().await {
                Some(DocumentEvent::Click(node)) => {
                    assert_eq!(node, button);
                    break;
                }
                Some(_) => continue,
                None => panic!("bus closed"),
            }
        }
        // press() is a user action, not an engine click.
        assert!(doc.clicks().is_empty());
    }

    #[tokio::test]
    async fn style_install_replaces_by_key() {
        let doc = MockDocument::new();
        doc.install_style("rf-test", "a{}").await.unwrap();
        doc.install_style("rf-test", "b{}").await.unwrap();
        assert_eq!(doc.styles().len(), 1);
        assert_eq!(doc.style_payload("rf-test").as_deref(), Some("b{}"));
        doc.remove_style("rf-test").await.unwrap();
        assert!(!doc.style_installed("rf-test").await.unwrap());
    }

    #[tokio::test]
    async fn mutations_are_published_for_tree_edits() {
        let doc = MockDocument::new();
        let mut sub = doc.subscribe();
        doc.insert_blueprint(doc.root(), &NodeBlueprint::new("div"));
        match sub.next().await {
            Some(DocumentEvent::Mutations(batch)) => {
                assert_eq!(batch.len(), 1);
                assert_eq!(batch[0].kind, MutationKind::ChildList);
                assert_eq!(batch[0].target, doc.root());
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[tokio::test]
    async fn inner_markup_roundtrip() {
        let doc = MockDocument::new();
        let icon = doc.insert_blueprint(
            doc.root(),
            &NodeBlueprint::new("svg").child(NodeBlueprint::new("path").attr("d", "M0 0")),
        );
        let mirror = doc.insert_blueprint(doc.root(), &NodeBlueprint::new("svg"));

        let markup = doc.inner_markup(icon).await.unwrap();
        assert!(markup.contains("path"));
        doc.set_inner_markup(mirror, &markup).await.unwrap();
        assert_eq!(doc.inner_markup(mirror).await.unwrap(), markup);
    }
}
