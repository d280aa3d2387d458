//! Declarative path queries over the host document.
//!
//! A [`Selector`] is a chain of structural/attribute [`Matcher`]s joined by
//! descendant or child combinators, the stable subset of CSS-like matching
//! both backends can interpret: the mock matches against its own tree, the
//! channel backend renders the chain to CSS text with [`Selector::to_css`].

use std::collections::BTreeMap;
use std::fmt;

/// How a matcher relates to the one before it in the chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combinator {
    /// Any ancestor matches the previous step.
    Descendant,
    /// The immediate parent matches the previous step.
    Child,
}

/// One step of a selector: tag/id/class/attribute constraints, all optional.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Matcher {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attrs: Vec<(String, Option<String>)>,
}

impl Matcher {
    /// Matches any element.
    pub fn any() -> Self {
        Self::default()
    }

    pub fn tag(name: &str) -> Self {
        Self {
            tag: Some(name.to_lowercase()),
            ..Self::default()
        }
    }

    pub fn class(self, class: &str) -> Self {
        let mut m = self;
        m.classes.push(class.to_string());
        m
    }

    pub fn id(self, id: &str) -> Self {
        let mut m = self;
        m.id = Some(id.to_string());
        m
    }

    /// Require an attribute with an exact value.
    pub fn attr(self, name: &str, value: &str) -> Self {
        let mut m = self;
        m.attrs.push((name.to_string(), Some(value.to_string())));
        m
    }

    /// Require an attribute to be present, any value.
    pub fn has_attr(self, name: &str) -> Self {
        let mut m = self;
        m.attrs.push((name.to_string(), None));
        m
    }

    /// Test this single step against one element's facts.
    pub fn matches(&self, facts: &NodeFacts<'_>) -> bool {
        if let Some(tag) = &self.tag {
            if !facts.tag.eq_ignore_ascii_case(tag) {
                return false;
            }
        }
        if let Some(id) = &self.id {
            if facts.id != Some(id.as_str()) {
                return false;
            }
        }
        for class in &self.classes {
            if !facts.classes.iter().any(|c| c == class) {
                return false;
            }
        }
        for (name, expected) in &self.attrs {
            match (facts.attrs.get(name.as_str()), expected) {
                (None, _) => return false,
                (Some(_), None) => {}
                (Some(actual), Some(expected)) => {
                    if actual != expected {
                        return false;
                    }
                }
            }
        }
        true
    }

    fn render(&self, out: &mut String) {
        use fmt::Write;
        if let Some(tag) = &self.tag {
            out.push_str(tag);
        }
        if let Some(id) = &self.id {
            let _ = write!(out, "#{id}");
        }
        for class in &self.classes {
            let _ = write!(out, ".{class}");
        }
        for (name, value) in &self.attrs {
            match value {
                Some(value) => {
                    let _ = write!(out, "[{name}={value:?}]");
                }
                None => {
                    let _ = write!(out, "[{name}]");
                }
            }
        }
        if self.tag.is_none() && self.id.is_none() && self.classes.is_empty() && self.attrs.is_empty()
        {
            out.push('*');
        }
    }
}

/// The element facts a matcher is tested against; backends produce these
/// from their own node representation.
#[derive(Debug, Clone)]
pub struct NodeFacts<'a> {
    pub tag: &'a str,
    pub id: Option<&'a str>,
    pub classes: &'a [String],
    pub attrs: &'a BTreeMap<String, String>,
}

/// A declarative path query: a head matcher plus combinator-joined steps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    head: Matcher,
    tail: Vec<(Combinator, Matcher)>,
}

impl Selector {
    pub fn new(head: Matcher) -> Self {
        Self {
            head,
            tail: Vec::new(),
        }
    }

    /// Append a descendant step.
    pub fn descendant(self, matcher: Matcher) -> Self {
        let mut s = self;
        s.tail.push((Combinator::Descendant, matcher));
        s
    }

    /// Append a child step.
    pub fn child(self, matcher: Matcher) -> Self {
        let mut s = self;
        s.tail.push((Combinator::Child, matcher));
        s
    }

    /// The matcher the candidate element itself must satisfy.
    pub fn target(&self) -> &Matcher {
        match self.tail.last() {
            Some((_, matcher)) => matcher,
            None => &self.head,
        }
    }

    /// The chain leading up to the target, outermost first.
    pub fn ancestry(&self) -> (&Matcher, &[(Combinator, Matcher)]) {
        (&self.head, &self.tail)
    }

    /// Render as CSS text for backends that speak selectors natively.
    pub fn to_css(&self) -> String {
        let mut out = String::new();
        self.head.render(&mut out);
        for (combinator, matcher) in &self.tail {
            match combinator {
                Combinator::Descendant => out.push(' '),
                Combinator::Child => out.push_str(" > "),
            }
            matcher.render(&mut out);
        }
        out
    }
}

impl From<Matcher> for Selector {
    fn from(head: Matcher) -> Self {
        Selector::new(head)
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_css())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
