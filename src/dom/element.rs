use super::props::js_number;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Description of an element subtree, used to build documents.
///
/// `ElementNode` is the fixture format: it can be assembled with the builder methods or
/// deserialized from JSON and then appended to a [`Document`](super::Document).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ElementNode {
    /// HTML tag name (e.g., "div", "button", "input")
    pub tag_name: String,

    /// Element attributes in source order
    #[serde(default)]
    pub attributes: IndexMap<String, String>,

    /// Text placed before the child elements
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_content: Option<String>,

    /// Child elements
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ElementNode>,

    /// Expando properties assigned to the live element
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub properties: Map<String, Value>,

    /// Layout box; elements without one are laid out as 0x0
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bounding_box: Option<BoundingBox>,
}

/// Bounding box coordinates for an element
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl ElementNode {
    /// Create a new ElementNode
    pub fn new(tag_name: impl Into<String>) -> Self {
        Self {
            tag_name: tag_name.into(),
            attributes: IndexMap::new(),
            text_content: None,
            children: Vec::new(),
            properties: Map::new(),
            bounding_box: None,
        }
    }

    /// Builder method: add one attribute
    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Builder method: set the `id` attribute
    pub fn with_id(self, id: impl Into<String>) -> Self {
        self.with_attr("id", id)
    }

    /// Builder method: set the `class` attribute
    pub fn with_class(self, class: impl Into<String>) -> Self {
        self.with_attr("class", class)
    }

    /// Builder method: set text content
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text_content = Some(text.into());
        self
    }

    /// Builder method: set children
    pub fn with_children(mut self, children: Vec<ElementNode>) -> Self {
        self.children = children;
        self
    }

    /// Builder method: append a child
    pub fn with_child(mut self, child: ElementNode) -> Self {
        self.children.push(child);
        self
    }

    /// Builder method: set an expando property
    pub fn with_property(mut self, name: impl Into<String>, value: Value) -> Self {
        self.properties.insert(name.into(), value);
        self
    }

    /// Builder method: set the layout size
    pub fn with_size(mut self, width: f64, height: f64) -> Self {
        self.bounding_box = Some(BoundingBox::new(0.0, 0.0, width, height));
        self
    }

    /// Builder method: set bounding box
    pub fn with_bounding_box(mut self, x: f64, y: f64, width: f64, height: f64) -> Self {
        self.bounding_box = Some(BoundingBox::new(x, y, width, height));
        self
    }
}

/// Shorthand constructors for common fixtures
impl ElementNode {
    /// `<input type="...">`
    pub fn input(input_type: &str) -> Self {
        ElementNode::new("input").with_attr("type", input_type)
    }

    /// `<option value="...">text</option>`
    pub fn option(value: &str, text: &str) -> Self {
        ElementNode::new("option").with_attr("value", value).with_text(text)
    }

    /// `<select>` holding one option per `(value, text)` pair
    pub fn select(options: &[(&str, &str)]) -> Self {
        ElementNode::new("select").with_children(
            options
                .iter()
                .map(|(value, text)| ElementNode::option(value, text))
                .collect(),
        )
    }
}

impl BoundingBox {
    /// Create a new BoundingBox
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    /// Check if the bounding box has any extent
    pub fn has_extent(&self) -> bool {
        self.width > 0.0 || self.height > 0.0
    }

    /// JSON form, as returned by `getBoundingClientRect`
    pub fn to_value(&self) -> Value {
        serde_json::json!({
            "x": js_number(self.x),
            "y": js_number(self.y),
            "width": js_number(self.width),
            "height": js_number(self.height),
        })
    }
}
