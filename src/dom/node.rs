use super::element::BoundingBox;
use indexmap::IndexMap;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Handle to a node in a [`Document`](super::Document).
///
/// Handles are indices into the document's arena and stay valid for the lifetime of the
/// document, including after the node is detached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    /// Raw arena index
    pub fn index(self) -> usize {
        self.0
    }

    /// Wire representation of the handle: `{"node": <index>}`
    pub fn to_value(self) -> Value {
        serde_json::json!({ "node": self.0 })
    }

    /// Parse a `{"node": <index>}` handle
    pub fn from_value(value: &Value) -> Option<Self> {
        let object = value.as_object()?;
        if object.len() != 1 {
            return None;
        }
        object.get("node")?.as_u64().map(|n| NodeId(n as usize))
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "node#{}", self.0)
    }
}

/// Dirty form state. `None` means "not touched yet, fall back to the attribute".
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct FormState {
    pub value: Option<String>,
    pub checked: Option<bool>,
    pub selected: Option<bool>,
}

#[derive(Debug, Clone)]
pub(crate) struct ElementData {
    pub tag: String,
    pub attrs: IndexMap<String, String>,
    pub expando: Map<String, Value>,
    pub layout: Option<BoundingBox>,
    pub state: FormState,
}

impl ElementData {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            attrs: IndexMap::new(),
            expando: Map::new(),
            layout: None,
            state: FormState::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) enum NodeData {
    Document,
    Element(ElementData),
    Text(String),
}

#[derive(Debug, Clone)]
pub(crate) struct Node {
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub data: NodeData,
}

impl Node {
    pub fn new(data: NodeData) -> Self {
        Self {
            parent: None,
            children: Vec::new(),
            data,
        }
    }

    pub fn element(&self) -> Option<&ElementData> {
        match &self.data {
            NodeData::Element(element) => Some(element),
            _ => None,
        }
    }

    pub fn element_mut(&mut self) -> Option<&mut ElementData> {
        match &mut self.data {
            NodeData::Element(element) => Some(element),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_handle_value() {
        let id = NodeId(7);
        assert_eq!(id.to_value(), serde_json::json!({ "node": 7 }));
        assert_eq!(NodeId::from_value(&id.to_value()), Some(id));
        assert_eq!(NodeId::from_value(&serde_json::json!({ "node": 7, "x": 1 })), None);
        assert_eq!(NodeId::from_value(&serde_json::json!("node")), None);
    }

    #[test]
    fn test_element_tag_is_lowercased() {
        let element = ElementData::new("DIV");
        assert_eq!(element.tag, "div");
    }
}
