//! Selector resolution
//!
//! A [`Selector`] names the element(s) an operation targets: a CSS selector, a path query,
//! or nodes that were already resolved. On the wire, strings carry a one-character marker:
//! `x` means path query, anything else means CSS. The marker is never part of the query.

pub mod builder;

pub use builder::XPath;

use crate::dom::{Document, NodeId};
use crate::error::Result;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Marker for path queries on the wire
pub const XPATH_MARKER: char = 'x';

/// Marker the driver uses for CSS selectors on the wire
pub const CSS_MARKER: char = 's';

/// Element(s) an operation targets
#[derive(Debug, Clone, PartialEq)]
pub enum Selector {
    Css(String),
    XPath(String),
    Node(NodeId),
    Nodes(Vec<NodeId>),
}

/// Node handle as it travels on the wire: `{"node": 3}`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct NodeRef {
    /// Node handle returned by an earlier call
    pub node: NodeId,
}

/// Selector as it travels on the wire
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum WireSelector {
    /// Marker-prefixed query: `x//div` (path query) or `s#id` (CSS)
    Query(String),
    /// One resolved node
    Node(NodeRef),
    /// Resolved nodes, in order
    Nodes(Vec<NodeRef>),
}

impl Selector {
    pub fn css(query: impl Into<String>) -> Self {
        Selector::Css(query.into())
    }

    pub fn xpath(query: impl Into<String>) -> Self {
        Selector::XPath(query.into())
    }

    /// Decode a marker-prefixed wire string
    pub fn from_wire(wire: &str) -> Self {
        let mut chars = wire.chars();
        match chars.next() {
            Some(XPATH_MARKER) => Selector::XPath(chars.as_str().to_string()),
            Some(_) => Selector::Css(chars.as_str().to_string()),
            None => Selector::Css(String::new()),
        }
    }

    /// Encode for the wire
    pub fn to_wire(&self) -> WireSelector {
        match self {
            Selector::Css(q) => WireSelector::Query(format!("{}{}", CSS_MARKER, q)),
            Selector::XPath(q) => WireSelector::Query(format!("{}{}", XPATH_MARKER, q)),
            Selector::Node(id) => WireSelector::Node(NodeRef { node: *id }),
            Selector::Nodes(ids) => WireSelector::Nodes(ids.iter().map(|id| NodeRef { node: *id }).collect()),
        }
    }

    /// Query text appended to error messages; node selectors have none
    pub fn annotation(&self) -> Option<&str> {
        match self {
            Selector::Css(q) | Selector::XPath(q) => Some(q),
            Selector::Node(_) | Selector::Nodes(_) => None,
        }
    }

    /// Resolve to the first matching node. No match is `Ok(None)`; a malformed query is an error.
    pub fn resolve_one(&self, doc: &Document) -> Result<Option<NodeId>> {
        let found = match self {
            Selector::Css(q) => doc.query_selector(q)?,
            Selector::XPath(q) => doc.evaluate_xpath(q)?.into_iter().next(),
            Selector::Node(id) => Some(*id).filter(|id| doc.contains(*id)),
            Selector::Nodes(ids) => ids.iter().copied().find(|id| doc.contains(*id)),
        };
        log::trace!("resolved {} to {:?}", self, found);
        Ok(found)
    }

    /// Resolve to every matching node in order
    pub fn resolve_many(&self, doc: &Document) -> Result<Vec<NodeId>> {
        let found = match self {
            Selector::Css(q) => doc.query_selector_all(q)?,
            Selector::XPath(q) => doc.evaluate_xpath(q)?,
            Selector::Node(id) => Some(*id).filter(|id| doc.contains(*id)).into_iter().collect(),
            Selector::Nodes(ids) => ids.iter().copied().filter(|id| doc.contains(*id)).collect(),
        };
        log::trace!("resolved {} to {} node(s)", self, found.len());
        Ok(found)
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selector::Css(q) => write!(f, "css `{}`", q),
            Selector::XPath(q) => write!(f, "xpath `{}`", q),
            Selector::Node(id) => write!(f, "{}", id),
            Selector::Nodes(ids) => write!(f, "{} node(s)", ids.len()),
        }
    }
}

fn is_path_query(query: &str) -> bool {
    query.starts_with('/') || query.starts_with("./") || query.starts_with('(')
}

/// Strings starting with `/`, `./` or `(` are path queries, as are those same strings
/// behind the wire `x` marker (`x//li`, which is never valid CSS). Anything else is CSS,
/// taken verbatim: `s.item` stays the CSS query for `<s class="item">`.
impl From<&str> for Selector {
    fn from(query: &str) -> Self {
        if is_path_query(query) {
            return Selector::XPath(query.to_string());
        }
        match query.strip_prefix(XPATH_MARKER) {
            Some(path) if is_path_query(path) => Selector::XPath(path.to_string()),
            _ => Selector::Css(query.to_string()),
        }
    }
}

impl From<String> for Selector {
    fn from(query: String) -> Self {
        Selector::from(query.as_str())
    }
}

impl From<NodeId> for Selector {
    fn from(id: NodeId) -> Self {
        Selector::Node(id)
    }
}

impl From<Vec<NodeId>> for Selector {
    fn from(ids: Vec<NodeId>) -> Self {
        Selector::Nodes(ids)
    }
}

impl From<XPath> for Selector {
    fn from(path: XPath) -> Self {
        Selector::XPath(path.into_string())
    }
}

impl From<WireSelector> for Selector {
    fn from(wire: WireSelector) -> Self {
        match wire {
            WireSelector::Query(q) => Selector::from_wire(&q),
            WireSelector::Node(r) => Selector::Node(r.node),
            WireSelector::Nodes(refs) => Selector::Nodes(refs.into_iter().map(|r| r.node).collect()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::ElementNode;
    use crate::error::ProbeError;
    use serde_json::json;

    fn fixture() -> Document {
        Document::from_elements([
            ElementNode::new("div").with_class("item").with_text("one"),
            ElementNode::new("div").with_class("item").with_text("two"),
        ])
    }

    #[test]
    fn test_wire_marker() {
        assert_eq!(Selector::from_wire("x//div"), Selector::xpath("//div"));
        assert_eq!(Selector::from_wire("s.item"), Selector::css(".item"));
        assert_eq!(Selector::from_wire("b#id"), Selector::css("#id"));
        assert_eq!(Selector::css(".item").to_wire(), WireSelector::Query("s.item".to_string()));
    }

    #[test]
    fn test_from_str_dispatch() {
        assert_eq!(Selector::from("//div"), Selector::xpath("//div"));
        assert_eq!(Selector::from("./span"), Selector::xpath("./span"));
        assert_eq!(Selector::from("(//div)[1]"), Selector::xpath("(//div)[1]"));
        assert_eq!(Selector::from("div > span"), Selector::css("div > span"));
        assert_eq!(Selector::from("x//li"), Selector::xpath("//li"));
        assert_eq!(Selector::from("x(//li)[2]"), Selector::xpath("(//li)[2]"));
        assert_eq!(Selector::from("x-panel"), Selector::css("x-panel"));
        assert_eq!(Selector::from("s.item"), Selector::css("s.item"));
    }

    #[test]
    fn test_wire_selector_json() {
        let query: WireSelector = serde_json::from_value(json!("x//div")).unwrap();
        assert_eq!(Selector::from(query), Selector::xpath("//div"));

        let node: WireSelector = serde_json::from_value(json!({"node": 4})).unwrap();
        assert_eq!(Selector::from(node), Selector::Node(NodeId(4)));

        let nodes: WireSelector = serde_json::from_value(json!([{"node": 1}, {"node": 2}])).unwrap();
        assert_eq!(Selector::from(nodes), Selector::Nodes(vec![NodeId(1), NodeId(2)]));
    }

    #[test]
    fn test_resolve() {
        let doc = fixture();
        let first = Selector::css(".item").resolve_one(&doc).unwrap().unwrap();
        assert_eq!(doc.text_content(first), "one");

        let all = Selector::xpath("//div[@class='item']").resolve_many(&doc).unwrap();
        assert_eq!(all.len(), 2);

        assert_eq!(Selector::Nodes(all.clone()).resolve_many(&doc).unwrap(), all);
        assert_eq!(Selector::css(".missing").resolve_one(&doc).unwrap(), None);
        assert!(Selector::css(".missing").resolve_many(&doc).unwrap().is_empty());
    }

    #[test]
    fn test_stale_handles_resolve_to_nothing() {
        let doc = fixture();
        assert_eq!(Selector::Node(NodeId(999)).resolve_one(&doc).unwrap(), None);
    }

    #[test]
    fn test_invalid_queries_are_errors() {
        let doc = fixture();
        assert!(matches!(
            Selector::xpath("//[").resolve_one(&doc),
            Err(ProbeError::InvalidXPath { .. })
        ));
        assert!(matches!(
            Selector::css("div[").resolve_many(&doc),
            Err(ProbeError::InvalidSelector { .. })
        ));
    }

    #[test]
    fn test_annotation() {
        assert_eq!(Selector::css("#a").annotation(), Some("#a"));
        assert_eq!(Selector::Node(NodeId(1)).annotation(), None);
    }
}
