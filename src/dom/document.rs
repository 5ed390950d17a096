use super::element::{BoundingBox, ElementNode};
use super::events::EventLog;
use super::node::{ElementData, Node, NodeData, NodeId};
use super::scripts::SnippetRegistry;
use super::{css, xpath};
use crate::error::Result;
use indexmap::IndexMap;
use std::collections::HashMap;

/// Elements that never produce a layout box
const NON_RENDERED_TAGS: &[&str] = &["head", "script", "style", "template", "noscript", "title", "meta", "link"];

/// Elements rendered on their own line by `innerText`
const BLOCK_TAGS: &[&str] = &[
    "address", "article", "aside", "blockquote", "dd", "details", "dialog", "div", "dl", "dt", "fieldset",
    "figcaption", "figure", "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6", "header", "hgroup", "hr",
    "li", "main", "nav", "ol", "p", "pre", "section", "summary", "table", "tr", "ul",
];

/// Elements serialized without a closing tag
const VOID_TAGS: &[&str] = &["area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "wbr"];

/// A live document: an arena of nodes addressed by [`NodeId`].
///
/// The document owns every node. Callers hold `NodeId` handles, which are plain indices
/// and are only meaningful against the document that produced them.
#[derive(Debug)]
pub struct Document {
    nodes: Vec<Node>,
    root: NodeId,
    html: NodeId,
    head: NodeId,
    body: NodeId,
    pub(crate) active_element: Option<NodeId>,
    pub(crate) events: EventLog,
    scripts: SnippetRegistry,
}

impl Document {
    /// Create an empty `<html><head></head><body></body></html>` document
    pub fn new() -> Self {
        let mut document = Self {
            nodes: vec![Node::new(NodeData::Document)],
            root: NodeId(0),
            html: NodeId(0),
            head: NodeId(0),
            body: NodeId(0),
            active_element: None,
            events: EventLog::default(),
            scripts: SnippetRegistry::default(),
        };
        let html = document.create_element("html");
        let head = document.create_element("head");
        let body = document.create_element("body");
        document.append_child(document.root, html);
        document.append_child(html, head);
        document.append_child(html, body);
        document.html = html;
        document.head = head;
        document.body = body;
        document
    }

    /// Create a document whose body holds the given element trees
    pub fn from_elements(elements: impl IntoIterator<Item = ElementNode>) -> Self {
        let mut document = Self::new();
        let body = document.body;
        for element in elements {
            document.append_tree(body, &element);
        }
        document
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn document_element(&self) -> NodeId {
        self.html
    }

    pub fn head(&self) -> NodeId {
        self.head
    }

    pub fn body(&self) -> NodeId {
        self.body
    }

    pub(crate) fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    pub(crate) fn element(&self, id: NodeId) -> Option<&ElementData> {
        self.node(id).and_then(Node::element)
    }

    pub(crate) fn element_mut(&mut self, id: NodeId) -> Option<&mut ElementData> {
        self.nodes.get_mut(id.0).and_then(Node::element_mut)
    }

    /// Whether the handle refers to a node of this document
    pub fn contains(&self, id: NodeId) -> bool {
        id.0 < self.nodes.len()
    }

    pub fn is_element(&self, id: NodeId) -> bool {
        self.element(id).is_some()
    }

    /// Lowercase tag name of an element
    pub fn tag_name(&self, id: NodeId) -> Option<&str> {
        self.element(id).map(|e| e.tag.as_str())
    }

    pub(crate) fn is_tag(&self, id: NodeId, tag: &str) -> bool {
        self.tag_name(id) == Some(tag)
    }

    /// Data of a text node
    pub fn text(&self, id: NodeId) -> Option<&str> {
        match &self.node(id)?.data {
            NodeData::Text(text) => Some(text),
            _ => None,
        }
    }

    // ----- tree construction -----

    /// Create a detached element
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.push(NodeData::Element(ElementData::new(tag)))
    }

    /// Create a detached text node
    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.push(NodeData::Text(text.to_string()))
    }

    fn push(&mut self, data: NodeData) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node::new(data));
        id
    }

    /// Append `child` as the last child of `parent`, detaching it from its current parent first
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        if !self.contains(parent) || !self.contains(child) || parent == child || self.is_ancestor(child, parent) {
            return;
        }
        self.remove(child);
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.push(child);
    }

    /// Append a text node to `parent`
    pub fn append_text(&mut self, parent: NodeId, text: &str) -> NodeId {
        let id = self.create_text(text);
        self.append_child(parent, id);
        id
    }

    /// Detach a node from its parent. The node and its subtree stay addressable.
    pub fn remove(&mut self, id: NodeId) {
        let Some(parent) = self.parent(id) else {
            return;
        };
        self.nodes[parent.0].children.retain(|c| *c != id);
        self.nodes[id.0].parent = None;
        if self.active_element.is_some_and(|active| active == id || self.is_ancestor(id, active)) {
            self.active_element = None;
        }
    }

    /// Build an [`ElementNode`] subtree and append it to `parent`
    pub fn append_tree(&mut self, parent: NodeId, tree: &ElementNode) -> NodeId {
        let id = self.create_element(&tree.tag_name);
        if let Some(element) = self.element_mut(id) {
            element.attrs = tree
                .attributes
                .iter()
                .map(|(k, v)| (k.to_ascii_lowercase(), v.clone()))
                .collect();
            element.expando = tree.properties.clone();
            element.layout = tree.bounding_box;
        }
        if let Some(text) = &tree.text_content {
            self.append_text(id, text);
        }
        for child in &tree.children {
            self.append_tree(id, child);
        }
        self.append_child(parent, id);
        id
    }

    // ----- navigation -----

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id)?.parent
    }

    /// Parent, if it is an element
    pub fn parent_element(&self, id: NodeId) -> Option<NodeId> {
        self.parent(id).filter(|p| self.is_element(*p))
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.node(id).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    pub fn element_children(&self, id: NodeId) -> Vec<NodeId> {
        self.children(id).iter().copied().filter(|c| self.is_element(*c)).collect()
    }

    fn sibling_elements(&self, id: NodeId) -> (Vec<NodeId>, Option<usize>) {
        let Some(parent) = self.parent(id) else {
            return (Vec::new(), None);
        };
        let siblings = self.element_children(parent);
        let position = siblings.iter().position(|s| *s == id);
        (siblings, position)
    }

    pub fn next_element_sibling(&self, id: NodeId) -> Option<NodeId> {
        let (siblings, position) = self.sibling_elements(id);
        position.and_then(|i| siblings.get(i + 1).copied())
    }

    pub fn previous_element_sibling(&self, id: NodeId) -> Option<NodeId> {
        let (siblings, position) = self.sibling_elements(id);
        position.and_then(|i| i.checked_sub(1)).map(|i| siblings[i])
    }

    /// Ancestors from the parent up to the document root
    pub fn ancestors(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut cursor = self.parent(id);
        while let Some(node) = cursor {
            out.push(node);
            cursor = self.parent(node);
        }
        out
    }

    /// Whether `ancestor` is a proper ancestor of `id`
    pub fn is_ancestor(&self, ancestor: NodeId, id: NodeId) -> bool {
        self.ancestors(id).contains(&ancestor)
    }

    pub fn is_connected(&self, id: NodeId) -> bool {
        id == self.root || self.ancestors(id).last() == Some(&self.root)
    }

    /// Descendants of `id` in document order, excluding `id`
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        self.collect_descendants(id, &mut out);
        out
    }

    fn collect_descendants(&self, id: NodeId, out: &mut Vec<NodeId>) {
        for child in self.children(id) {
            out.push(*child);
            self.collect_descendants(*child, out);
        }
    }

    /// Every connected element in document order
    pub fn all_elements(&self) -> Vec<NodeId> {
        self.descendants(self.root)
            .into_iter()
            .filter(|n| self.is_element(*n))
            .collect()
    }

    /// Document-order position of every connected node
    pub(crate) fn document_order(&self) -> HashMap<NodeId, usize> {
        std::iter::once(self.root)
            .chain(self.descendants(self.root))
            .enumerate()
            .map(|(i, n)| (n, i))
            .collect()
    }

    // ----- attributes -----

    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.element(id)?
            .attrs
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    pub fn has_attr(&self, id: NodeId, name: &str) -> bool {
        self.attr(id, name).is_some()
    }

    pub fn set_attr(&mut self, id: NodeId, name: &str, value: &str) {
        if let Some(element) = self.element_mut(id) {
            element.attrs.insert(name.to_ascii_lowercase(), value.to_string());
        }
    }

    /// Remove an attribute, reporting whether it was present
    pub fn remove_attr(&mut self, id: NodeId, name: &str) -> bool {
        self.element_mut(id)
            .and_then(|e| e.attrs.shift_remove(&name.to_ascii_lowercase()))
            .is_some()
    }

    /// Attributes in source order
    pub fn attrs(&self, id: NodeId) -> Vec<(&str, &str)> {
        self.element(id)
            .map(|e| e.attrs.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect())
            .unwrap_or_default()
    }

    pub fn class_list(&self, id: NodeId) -> Vec<String> {
        let mut classes: Vec<String> = Vec::new();
        for class in self.attr(id, "class").unwrap_or("").split_whitespace() {
            if !classes.iter().any(|c| c == class) {
                classes.push(class.to_string());
            }
        }
        classes
    }

    pub fn has_class(&self, id: NodeId, class: &str) -> bool {
        self.attr(id, "class")
            .is_some_and(|c| c.split_whitespace().any(|c| c == class))
    }

    // ----- style -----

    /// Inline style declarations, keyed by lowercase property name
    pub fn style_map(&self, id: NodeId) -> IndexMap<String, String> {
        let mut out = IndexMap::new();
        for declaration in self.attr(id, "style").unwrap_or("").split(';') {
            if let Some((name, value)) = declaration.split_once(':') {
                let name = name.trim().to_ascii_lowercase();
                if !name.is_empty() {
                    out.insert(name, value.trim().to_string());
                }
            }
        }
        out
    }

    pub fn style_value(&self, id: NodeId, property: &str) -> Option<String> {
        self.style_map(id).get(&property.to_ascii_lowercase()).cloned()
    }

    /// Set one inline style declaration; an empty value removes it
    pub fn set_style(&mut self, id: NodeId, property: &str, value: &str) {
        let mut map = self.style_map(id);
        let property = property.to_ascii_lowercase();
        if value.is_empty() {
            map.shift_remove(&property);
        } else {
            map.insert(property, value.to_string());
        }
        let serialized = map
            .iter()
            .map(|(k, v)| format!("{}: {};", k, v))
            .collect::<Vec<_>>()
            .join(" ");
        if serialized.is_empty() {
            self.remove_attr(id, "style");
        } else {
            self.set_attr(id, "style", &serialized);
        }
    }

    // ----- text -----

    /// Concatenated text of all descendant text nodes
    pub fn text_content(&self, id: NodeId) -> String {
        if let Some(text) = self.text(id) {
            return text.to_string();
        }
        self.descendants(id)
            .into_iter()
            .filter_map(|n| self.text(n))
            .collect()
    }

    /// Replace all children with a single text node
    pub fn set_text_content(&mut self, id: NodeId, text: &str) {
        if !self.is_element(id) {
            if let Some(node) = self.nodes.get_mut(id.0) {
                if let NodeData::Text(data) = &mut node.data {
                    *data = text.to_string();
                }
            }
            return;
        }
        for child in self.children(id).to_vec() {
            self.remove(child);
        }
        if !text.is_empty() {
            self.append_text(id, text);
        }
    }

    /// Rendered text: collapsed whitespace, block elements on their own lines.
    /// Elements that are not rendered report their `textContent`.
    pub fn inner_text(&self, id: NodeId) -> String {
        if !self.is_element(id) || !self.is_rendered(id) {
            return self.text_content(id);
        }
        let mut lines = vec![String::new()];
        self.collect_inner_text(id, &mut lines);
        let lines: Vec<&str> = lines.iter().map(|l| l.trim()).collect();
        let start = lines.iter().position(|l| !l.is_empty()).unwrap_or(lines.len());
        let end = lines.iter().rposition(|l| !l.is_empty()).map_or(start, |i| i + 1);
        lines[start..end].join("\n")
    }

    fn collect_inner_text(&self, id: NodeId, lines: &mut Vec<String>) {
        for child in self.children(id) {
            if let Some(text) = self.text(*child) {
                if let Some(line) = lines.last_mut() {
                    push_collapsed(line, text);
                }
                continue;
            }
            let Some(tag) = self.tag_name(*child) else {
                continue;
            };
            if !self.renders_itself(*child) {
                continue;
            }
            if tag == "br" {
                lines.push(String::new());
                continue;
            }
            let block = BLOCK_TAGS.contains(&tag);
            if block {
                break_line(lines);
            }
            self.collect_inner_text(*child, lines);
            if block {
                break_line(lines);
            }
        }
    }

    /// Serialized markup of the children of `id`
    pub fn inner_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        for child in self.children(id) {
            self.serialize(*child, &mut out);
        }
        out
    }

    fn serialize(&self, id: NodeId, out: &mut String) {
        if let Some(text) = self.text(id) {
            out.push_str(&escape_text(text));
            return;
        }
        let Some(element) = self.element(id) else {
            return;
        };
        out.push('<');
        out.push_str(&element.tag);
        for (name, value) in &element.attrs {
            out.push_str(&format!(" {}=\"{}\"", name, escape_attr(value)));
        }
        out.push('>');
        if VOID_TAGS.contains(&element.tag.as_str()) {
            return;
        }
        for child in self.children(id) {
            self.serialize(*child, out);
        }
        out.push_str(&format!("</{}>", element.tag));
    }

    // ----- layout -----

    pub fn set_bounding_box(&mut self, id: NodeId, bounding_box: BoundingBox) {
        if let Some(element) = self.element_mut(id) {
            element.layout = Some(bounding_box);
        }
    }

    /// Whether the element itself opts out of rendering (ignoring ancestors)
    fn renders_itself(&self, id: NodeId) -> bool {
        let Some(tag) = self.tag_name(id) else {
            return false;
        };
        !NON_RENDERED_TAGS.contains(&tag)
            && !self.has_attr(id, "hidden")
            && self.style_value(id, "display").as_deref() != Some("none")
    }

    /// Whether the element produces a layout box
    pub fn is_rendered(&self, id: NodeId) -> bool {
        if !self.is_element(id) || !self.is_connected(id) {
            return false;
        }
        std::iter::once(id)
            .chain(self.ancestors(id))
            .filter(|n| self.is_element(*n))
            .all(|n| self.renders_itself(n))
    }

    /// Client rect: the layout box when rendered, zeros otherwise
    pub fn bounding_box(&self, id: NodeId) -> BoundingBox {
        if !self.is_rendered(id) {
            return BoundingBox::default();
        }
        self.element(id).and_then(|e| e.layout).unwrap_or_default()
    }

    pub fn offset_width(&self, id: NodeId) -> f64 {
        self.bounding_box(id).width
    }

    pub fn offset_height(&self, id: NodeId) -> f64 {
        self.bounding_box(id).height
    }

    /// Nearest positioned (or table cell) ancestor, else `body`.
    /// `None` for unrendered, fixed-position, `html` and `body` elements.
    pub fn offset_parent(&self, id: NodeId) -> Option<NodeId> {
        if !self.is_rendered(id) || matches!(self.tag_name(id), Some("html" | "body")) {
            return None;
        }
        if self.style_value(id, "position").as_deref() == Some("fixed") {
            return None;
        }
        let mut cursor = self.parent_element(id);
        while let Some(ancestor) = cursor {
            let positioned = self
                .style_value(ancestor, "position")
                .is_some_and(|p| p != "static");
            if positioned || matches!(self.tag_name(ancestor), Some("body" | "td" | "th" | "table")) {
                return Some(ancestor);
            }
            cursor = self.parent_element(ancestor);
        }
        None
    }

    // ----- queries -----

    /// First element matching a CSS selector, in document order
    pub fn query_selector(&self, selector: &str) -> Result<Option<NodeId>> {
        Ok(self.query_selector_all(selector)?.into_iter().next())
    }

    /// Every element matching a CSS selector, in document order
    pub fn query_selector_all(&self, selector: &str) -> Result<Vec<NodeId>> {
        self.query_selector_all_from(self.root, selector)
    }

    /// Descendants of `scope` matching a CSS selector
    pub fn query_selector_all_from(&self, scope: NodeId, selector: &str) -> Result<Vec<NodeId>> {
        let list = css::SelectorList::parse(selector)?;
        Ok(self
            .descendants(scope)
            .into_iter()
            .filter(|n| list.matches(self, *n))
            .collect())
    }

    pub fn query_selector_from(&self, scope: NodeId, selector: &str) -> Result<Option<NodeId>> {
        Ok(self.query_selector_all_from(scope, selector)?.into_iter().next())
    }

    /// Whether `id` matches a CSS selector
    pub fn matches(&self, id: NodeId, selector: &str) -> Result<bool> {
        let list = css::SelectorList::parse(selector)?;
        Ok(list.matches(self, id))
    }

    /// Closest inclusive ancestor matching a CSS selector
    pub fn closest(&self, id: NodeId, selector: &str) -> Result<Option<NodeId>> {
        let list = css::SelectorList::parse(selector)?;
        Ok(std::iter::once(id)
            .chain(self.ancestors(id))
            .find(|n| list.matches(self, *n)))
    }

    /// Nodes selected by a path query evaluated against the document, in document order
    pub fn evaluate_xpath(&self, expr: &str) -> Result<Vec<NodeId>> {
        let parsed = xpath::Expr::parse(expr)?;
        xpath::select_nodes(self, &parsed, expr)
    }

    // ----- scripts -----

    pub fn scripts(&self) -> &SnippetRegistry {
        &self.scripts
    }

    pub fn scripts_mut(&mut self) -> &mut SnippetRegistry {
        &mut self.scripts
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

fn push_collapsed(line: &mut String, text: &str) {
    for ch in text.chars() {
        if ch.is_whitespace() {
            if !line.is_empty() && !line.ends_with(' ') {
                line.push(' ');
            }
        } else {
            line.push(ch);
        }
    }
}

fn break_line(lines: &mut Vec<String>) {
    if lines.last().is_some_and(|l| !l.trim().is_empty()) {
        lines.push(String::new());
    }
}

fn escape_text(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

fn escape_attr(value: &str) -> String {
    value.replace('&', "&amp;").replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list_fixture() -> Document {
        Document::from_elements([
            ElementNode::new("div").with_id("hello").with_text("Hello Biloba!"),
            ElementNode::new("ul")
                .with_id("list")
                .with_child(ElementNode::new("li").with_text("First Things"))
                .with_child(ElementNode::new("li").with_text("Second  Things"))
                .with_child(ElementNode::new("li").with_text("Third Things")),
            ElementNode::new("div")
                .with_attr("hidden", "")
                .with_child(ElementNode::new("span").with_id("hidden-child").with_text("Can't see me!")),
        ])
    }

    #[test]
    fn test_document_skeleton() {
        let doc = Document::new();
        assert_eq!(doc.tag_name(doc.document_element()), Some("html"));
        assert_eq!(doc.parent(doc.body()), Some(doc.document_element()));
        assert_eq!(doc.element_children(doc.document_element()), vec![doc.head(), doc.body()]);
        assert!(doc.is_connected(doc.body()));
    }

    #[test]
    fn test_append_and_remove() {
        let mut doc = Document::new();
        let div = doc.create_element("div");
        assert!(!doc.is_connected(div));

        doc.append_child(doc.body(), div);
        assert!(doc.is_connected(div));
        assert_eq!(doc.parent_element(div), Some(doc.body()));

        doc.remove(div);
        assert!(!doc.is_connected(div));
        assert!(doc.contains(div));
    }

    #[test]
    fn test_append_refuses_cycles() {
        let mut doc = Document::new();
        let outer = doc.create_element("div");
        let inner = doc.create_element("div");
        doc.append_child(outer, inner);
        doc.append_child(inner, outer);
        assert_eq!(doc.parent(outer), None);
    }

    #[test]
    fn test_inner_text_blocks_and_hidden() {
        let doc = list_fixture();
        let list = doc.query_selector("#list").unwrap().unwrap();
        assert_eq!(doc.inner_text(list), "First Things\nSecond Things\nThird Things");

        let hidden = doc.query_selector("#hidden-child").unwrap().unwrap();
        assert!(!doc.is_rendered(hidden));
        assert_eq!(doc.inner_text(hidden), "Can't see me!");
    }

    #[test]
    fn test_inner_text_inline_and_br() {
        let doc = Document::from_elements([ElementNode::new("p")
            .with_id("p")
            .with_text("  Hello ")
            .with_child(ElementNode::new("b").with_text(" World"))
            .with_child(ElementNode::new("br"))
            .with_child(ElementNode::new("span").with_text("again"))]);
        let p = doc.query_selector("#p").unwrap().unwrap();
        assert_eq!(doc.inner_text(p), "Hello World\nagain");
    }

    #[test]
    fn test_text_content_and_set() {
        let mut doc = list_fixture();
        let hello = doc.query_selector("#hello").unwrap().unwrap();
        assert_eq!(doc.text_content(hello), "Hello Biloba!");

        doc.set_text_content(hello, "Bye");
        assert_eq!(doc.text_content(hello), "Bye");
        assert_eq!(doc.children(hello).len(), 1);
    }

    #[test]
    fn test_style_roundtrip() {
        let mut doc = Document::from_elements([ElementNode::new("div").with_attr("style", "color: red; DISPLAY:block")]);
        let div = doc.query_selector("div").unwrap().unwrap();
        assert_eq!(doc.style_value(div, "display").as_deref(), Some("block"));

        doc.set_style(div, "display", "none");
        assert!(!doc.is_rendered(div));
        assert_eq!(doc.attr(div, "style"), Some("color: red; display: none;"));

        doc.set_style(div, "color", "");
        doc.set_style(div, "display", "");
        assert!(!doc.has_attr(div, "style"));
    }

    #[test]
    fn test_offset_parent_rules() {
        let doc = Document::from_elements([
            ElementNode::new("span").with_id("plain"),
            ElementNode::new("div").with_id("fixed").with_attr("style", "position: fixed"),
            ElementNode::new("div")
                .with_id("positioned")
                .with_attr("style", "position: relative")
                .with_child(ElementNode::new("i").with_id("inner")),
        ]);
        let plain = doc.query_selector("#plain").unwrap().unwrap();
        let fixed = doc.query_selector("#fixed").unwrap().unwrap();
        let positioned = doc.query_selector("#positioned").unwrap().unwrap();
        let inner = doc.query_selector("#inner").unwrap().unwrap();

        assert_eq!(doc.offset_parent(plain), Some(doc.body()));
        assert_eq!(doc.offset_parent(fixed), None);
        assert_eq!(doc.offset_parent(inner), Some(positioned));
        assert_eq!(doc.offset_parent(doc.body()), None);
    }

    #[test]
    fn test_bounding_box_hidden_is_zero() {
        let doc = Document::from_elements([
            ElementNode::new("div").with_id("shown").with_size(40.0, 10.0),
            ElementNode::new("div").with_id("gone").with_attr("hidden", "").with_size(40.0, 10.0),
        ]);
        let shown = doc.query_selector("#shown").unwrap().unwrap();
        let gone = doc.query_selector("#gone").unwrap().unwrap();
        assert_eq!(doc.offset_width(shown), 40.0);
        assert_eq!(doc.offset_height(gone), 0.0);
    }

    #[test]
    fn test_layout_updates() {
        let mut doc = Document::from_elements([ElementNode::new("div")
            .with_id("box")
            .with_bounding_box(5.0, 5.0, 20.0, 20.0)]);
        let id = doc.query_selector("#box").unwrap().unwrap();
        assert_eq!(doc.bounding_box(id), BoundingBox::new(5.0, 5.0, 20.0, 20.0));

        doc.set_bounding_box(id, BoundingBox::new(0.0, 0.0, 0.0, 0.0));
        assert_eq!(doc.offset_width(id), 0.0);
    }

    #[test]
    fn test_inner_html() {
        let doc = Document::from_elements([ElementNode::new("div")
            .with_id("wrap")
            .with_child(ElementNode::input("text").with_attr("value", "a\"b"))
            .with_child(ElementNode::new("em").with_text("1 < 2"))]);
        let wrap = doc.query_selector("#wrap").unwrap().unwrap();
        assert_eq!(
            doc.inner_html(wrap),
            "<input type=\"text\" value=\"a&quot;b\"><em>1 &lt; 2</em>"
        );
    }

    #[test]
    fn test_class_list_dedupes() {
        let doc = Document::from_elements([ElementNode::new("div").with_class("a b  a c")]);
        let div = doc.query_selector("div").unwrap().unwrap();
        assert_eq!(doc.class_list(div), vec!["a", "b", "c"]);
        assert!(doc.has_class(div, "c"));
    }
}
