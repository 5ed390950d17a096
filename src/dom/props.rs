//! Member reflection: the named properties and methods a node exposes to property
//! paths and `invokeOn`.

use super::document::Document;
use super::node::NodeId;
use crate::error::{ProbeError, Result};
use serde_json::{Map, Value};

/// A property read off a node
#[derive(Debug, Clone, PartialEq)]
pub enum Member {
    /// A plain value (including `null` for properties that exist but hold nothing)
    Value(Value),
    Node(NodeId),
    Nodes(Vec<NodeId>),
    /// The node's `dataset` view over its `data-*` attributes
    Dataset(NodeId),
    /// The node's inline `style` declarations
    Style(NodeId),
    /// A method callable through [`Document::call_method`]; reads as `null`
    Method,
}

/// Outcome of assigning a built-in property
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Assign {
    Done,
    ReadOnly,
    /// Not a built-in; the caller stores it as an expando
    NotBuiltin,
}

/// Element methods known to [`Document::call_method`]
pub const METHODS: &[&str] = &[
    "click",
    "focus",
    "blur",
    "scrollIntoView",
    "remove",
    "getAttribute",
    "setAttribute",
    "removeAttribute",
    "hasAttribute",
    "toggleAttribute",
    "matches",
    "closest",
    "querySelector",
    "querySelectorAll",
    "getBoundingClientRect",
];

/// Names of built-in properties that cannot be assigned
const READ_ONLY: &[&str] = &[
    "tagName",
    "nodeName",
    "localName",
    "dataset",
    "innerHTML",
    "options",
    "selectedOptions",
    "offsetWidth",
    "offsetHeight",
    "offsetParent",
    "parentElement",
    "children",
    "childElementCount",
    "firstElementChild",
    "lastElementChild",
    "nextElementSibling",
    "previousElementSibling",
    "isConnected",
];

/// JavaScript `String(v)` coercion
pub fn js_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => match n.as_f64() {
            Some(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", f as i64),
            _ => n.to_string(),
        },
        Value::String(s) => s.clone(),
        Value::Array(items) => items.iter().map(js_string).collect::<Vec<_>>().join(","),
        Value::Object(_) => "[object Object]".to_string(),
    }
}

/// JavaScript truthiness
pub fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// A JSON number, integral when the value is whole
pub fn js_number(n: f64) -> Value {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        Value::from(n as i64)
    } else {
        Value::from(n)
    }
}

/// `fooBar` -> `foo-bar`
pub fn camel_to_kebab(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for c in name.chars() {
        if c.is_ascii_uppercase() {
            out.push('-');
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

/// `foo-bar` -> `fooBar`
pub fn kebab_to_camel(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut upper = false;
    for c in name.chars() {
        if c == '-' {
            upper = true;
        } else if upper {
            out.push(c.to_ascii_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}

fn optional_node(id: Option<NodeId>) -> Member {
    id.map_or(Member::Value(Value::Null), Member::Node)
}

impl Document {
    /// Read a built-in property. `None` means the node has no such built-in.
    pub fn builtin_member(&self, id: NodeId, name: &str) -> Option<Member> {
        if let Some(text) = self.text(id) {
            return match name {
                "nodeName" => Some(Member::Value(Value::from("#text"))),
                "textContent" | "data" => Some(Member::Value(Value::from(text))),
                "parentElement" => Some(optional_node(self.parent_element(id))),
                "isConnected" => Some(Member::Value(Value::Bool(self.is_connected(id)))),
                _ => None,
            };
        }
        let tag = self.tag_name(id)?;
        let string = |s: String| Some(Member::Value(Value::String(s)));
        let attr_or_empty = |attr: &str| string(self.attr(id, attr).unwrap_or("").to_string());
        let flag = |b: bool| Some(Member::Value(Value::Bool(b)));
        match name {
            "tagName" | "nodeName" => string(tag.to_ascii_uppercase()),
            "localName" => string(tag.to_string()),
            "id" => attr_or_empty("id"),
            "className" => attr_or_empty("class"),
            "title" => attr_or_empty("title"),
            "hidden" => flag(self.has_attr(id, "hidden")),
            "classList" => Some(Member::Value(Value::from(self.class_list(id)))),
            "dataset" => Some(Member::Dataset(id)),
            "style" => Some(Member::Style(id)),
            "innerText" => string(self.inner_text(id)),
            "textContent" => string(self.text_content(id)),
            "innerHTML" => string(self.inner_html(id)),
            "name" if matches!(tag, "input" | "select" | "textarea" | "button" | "form" | "iframe") => {
                attr_or_empty("name")
            }
            "value" => self.value(id).and_then(string),
            "checked" => self.checked(id).and_then(flag),
            "disabled" => self.disabled(id).and_then(flag),
            "selected" => self.selected(id).and_then(flag),
            "type" => self.input_type(id).and_then(string),
            "multiple" if tag == "select" => flag(self.is_multiple(id)),
            "selectedIndex" if tag == "select" => Some(Member::Value(Value::from(self.selected_index(id)))),
            "options" if tag == "select" => Some(Member::Nodes(self.options(id))),
            "selectedOptions" if tag == "select" => Some(Member::Nodes(self.selected_options(id))),
            "placeholder" | "readOnly" | "required" if matches!(tag, "input" | "textarea") => match name {
                "placeholder" => attr_or_empty("placeholder"),
                "readOnly" => flag(self.has_attr(id, "readonly")),
                _ => flag(self.has_attr(id, "required")),
            },
            "offsetWidth" => Some(Member::Value(js_number(self.offset_width(id)))),
            "offsetHeight" => Some(Member::Value(js_number(self.offset_height(id)))),
            "offsetParent" => Some(optional_node(self.offset_parent(id))),
            "parentElement" => Some(optional_node(self.parent_element(id))),
            "children" => Some(Member::Nodes(self.element_children(id))),
            "childElementCount" => Some(Member::Value(Value::from(self.element_children(id).len()))),
            "firstElementChild" => Some(optional_node(self.element_children(id).first().copied())),
            "lastElementChild" => Some(optional_node(self.element_children(id).last().copied())),
            "nextElementSibling" => Some(optional_node(self.next_element_sibling(id))),
            "previousElementSibling" => Some(optional_node(self.previous_element_sibling(id))),
            "isConnected" => flag(self.is_connected(id)),
            _ if METHODS.contains(&name) => Some(Member::Method),
            _ => None,
        }
    }

    /// Read a property: built-ins first, then expandos
    pub fn get_member(&self, id: NodeId, name: &str) -> Option<Member> {
        self.builtin_member(id, name).or_else(|| {
            self.element(id)
                .and_then(|e| e.expando.get(name))
                .map(|v| Member::Value(v.clone()))
        })
    }

    /// Assign a built-in property
    pub fn set_builtin_member(&mut self, id: NodeId, name: &str, value: &Value) -> Assign {
        if self.builtin_member(id, name).is_none() {
            return Assign::NotBuiltin;
        }
        if READ_ONLY.contains(&name) {
            return Assign::ReadOnly;
        }
        if self.text(id).is_some() {
            return match name {
                "textContent" | "data" => {
                    self.set_text_content(id, &js_string(value));
                    Assign::Done
                }
                _ => Assign::ReadOnly,
            };
        }
        let text = js_string(value);
        let done = match name {
            "id" | "title" | "name" | "placeholder" => {
                self.set_attr(id, name, &text);
                true
            }
            "className" => {
                self.set_attr(id, "class", &text);
                true
            }
            "classList" => {
                let classes = match value {
                    Value::Array(items) => items.iter().map(js_string).collect::<Vec<_>>().join(" "),
                    other => js_string(other),
                };
                self.set_attr(id, "class", &classes);
                true
            }
            "hidden" | "readOnly" | "required" => {
                let attr = name.to_ascii_lowercase();
                if truthy(value) {
                    self.set_attr(id, &attr, "");
                } else {
                    self.remove_attr(id, &attr);
                }
                true
            }
            "style" => {
                self.set_attr(id, "style", &text);
                true
            }
            "innerText" | "textContent" => {
                self.set_text_content(id, &text);
                true
            }
            "value" => self.set_value(id, &text),
            "checked" => self.set_checked(id, truthy(value)),
            "disabled" => self.set_disabled(id, truthy(value)),
            "selected" => self.set_selected(id, truthy(value)),
            "type" => {
                self.set_attr(id, "type", &text);
                true
            }
            "multiple" => {
                if truthy(value) {
                    self.set_attr(id, "multiple", "");
                } else {
                    self.remove_attr(id, "multiple");
                }
                true
            }
            "selectedIndex" => {
                let index = value.as_f64().map_or(-1, |f| f as i64);
                self.set_selected_index(id, index)
            }
            _ => false,
        };
        if done { Assign::Done } else { Assign::ReadOnly }
    }

    /// Assign a property: built-ins through their setters, anything else as an expando.
    /// Errors when the property is a read-only built-in.
    pub fn set_member(&mut self, id: NodeId, name: &str, value: Value) -> std::result::Result<(), String> {
        match self.set_builtin_member(id, name, &value) {
            Assign::Done => Ok(()),
            Assign::ReadOnly => Err(format!("property \"{}\" is read-only", name)),
            Assign::NotBuiltin => match self.element_mut(id) {
                Some(element) => {
                    element.expando.insert(name.to_string(), value);
                    Ok(())
                }
                None => Err(format!("cannot set property \"{}\" on a text node", name)),
            },
        }
    }

    /// Read a `dataset` entry (`fooBar` reads `data-foo-bar`)
    pub fn dataset_get(&self, id: NodeId, key: &str) -> Option<String> {
        self.attr(id, &format!("data-{}", camel_to_kebab(key)))
            .map(str::to_string)
    }

    pub fn dataset_set(&mut self, id: NodeId, key: &str, value: &str) {
        self.set_attr(id, &format!("data-{}", camel_to_kebab(key)), value);
    }

    /// The `dataset` view as a plain object
    pub fn dataset(&self, id: NodeId) -> Map<String, Value> {
        self.attrs(id)
            .into_iter()
            .filter_map(|(name, value)| {
                name.strip_prefix("data-")
                    .map(|key| (kebab_to_camel(key), Value::from(value)))
            })
            .collect()
    }

    /// The inline style as a plain object with camelCase keys
    pub fn style_object(&self, id: NodeId) -> Map<String, Value> {
        self.style_map(id)
            .into_iter()
            .map(|(name, value)| (kebab_to_camel(&name), Value::from(value)))
            .collect()
    }

    /// Render a member as a JSON payload. Nodes become `{"node": n}` handles.
    pub fn member_to_value(&self, member: &Member) -> Value {
        match member {
            Member::Value(value) => value.clone(),
            Member::Node(id) => id.to_value(),
            Member::Nodes(ids) => Value::Array(ids.iter().map(|id| id.to_value()).collect()),
            Member::Dataset(id) => Value::Object(self.dataset(*id)),
            Member::Style(id) => Value::Object(self.style_object(*id)),
            Member::Method => Value::Null,
        }
    }

    /// Call an element method by name
    pub fn call_method(&mut self, id: NodeId, name: &str, args: &[Value]) -> Result<Value> {
        if !self.is_element(id) {
            return Err(ProbeError::Script(format!("element does not implement \"{}\"", name)));
        }
        let arg = |i: usize| -> Result<String> {
            match args.get(i) {
                Some(Value::String(s)) => Ok(s.clone()),
                Some(other) => Ok(js_string(other)),
                None => Err(ProbeError::InvalidArguments {
                    op: name.to_string(),
                    reason: format!("expected at least {} argument(s)", i + 1),
                }),
            }
        };
        let value = match name {
            "click" => {
                self.click(id);
                Value::Null
            }
            "focus" => {
                self.focus(id);
                Value::Null
            }
            "blur" => {
                self.blur(id);
                Value::Null
            }
            "scrollIntoView" => Value::Null,
            "remove" => {
                self.remove(id);
                Value::Null
            }
            "getAttribute" => self.attr(id, &arg(0)?).map_or(Value::Null, Value::from),
            "setAttribute" => {
                let (attr, value) = (arg(0)?, arg(1)?);
                self.set_attr(id, &attr, &value);
                Value::Null
            }
            "removeAttribute" => {
                self.remove_attr(id, &arg(0)?);
                Value::Null
            }
            "hasAttribute" => Value::Bool(self.has_attr(id, &arg(0)?)),
            "toggleAttribute" => {
                let attr = arg(0)?;
                let present = match args.get(1) {
                    Some(force) => truthy(force),
                    None => !self.has_attr(id, &attr),
                };
                if present {
                    if !self.has_attr(id, &attr) {
                        self.set_attr(id, &attr, "");
                    }
                } else {
                    self.remove_attr(id, &attr);
                }
                Value::Bool(present)
            }
            "matches" => Value::Bool(self.matches(id, &arg(0)?)?),
            "closest" => self.closest(id, &arg(0)?)?.map_or(Value::Null, NodeId::to_value),
            "querySelector" => self
                .query_selector_from(id, &arg(0)?)?
                .map_or(Value::Null, NodeId::to_value),
            "querySelectorAll" => Value::Array(
                self.query_selector_all_from(id, &arg(0)?)?
                    .into_iter()
                    .map(NodeId::to_value)
                    .collect(),
            ),
            "getBoundingClientRect" => self.bounding_box(id).to_value(),
            _ => return Err(ProbeError::Script(format!("element does not implement \"{}\"", name))),
        };
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::ElementNode;
    use serde_json::json;

    fn fixture() -> (Document, NodeId) {
        let doc = Document::from_elements([ElementNode::new("div")
            .with_id("card")
            .with_class("a b")
            .with_attr("data-user-name", "henry")
            .with_attr("style", "font-size: 12px")
            .with_property("flavor", json!("strawberry"))
            .with_child(ElementNode::new("span").with_text("hi"))]);
        let card = doc.query_selector("#card").unwrap().unwrap();
        (doc, card)
    }

    #[test]
    fn test_js_coercions() {
        assert_eq!(js_string(&json!(null)), "");
        assert_eq!(js_string(&json!(3.0)), "3");
        assert_eq!(js_string(&json!(2.5)), "2.5");
        assert_eq!(js_string(&json!(["a", 1])), "a,1");
        assert_eq!(js_string(&json!({"a": 1})), "[object Object]");
        assert!(truthy(&json!("x")));
        assert!(!truthy(&json!(0)));
        assert_eq!(js_number(80.0), json!(80));
    }

    #[test]
    fn test_case_conversions() {
        assert_eq!(camel_to_kebab("userName"), "user-name");
        assert_eq!(kebab_to_camel("font-size"), "fontSize");
    }

    #[test]
    fn test_builtin_members() {
        let (doc, card) = fixture();
        assert_eq!(doc.get_member(card, "tagName"), Some(Member::Value(json!("DIV"))));
        assert_eq!(doc.get_member(card, "classList"), Some(Member::Value(json!(["a", "b"]))));
        assert_eq!(doc.get_member(card, "parentElement"), Some(Member::Node(doc.body())));
        assert_eq!(doc.get_member(card, "checked"), None);
        assert_eq!(doc.get_member(card, "flavor"), Some(Member::Value(json!("strawberry"))));
        assert_eq!(doc.get_member(card, "offsetParent"), Some(Member::Node(doc.body())));
        assert_eq!(doc.get_member(doc.body(), "offsetParent"), Some(Member::Value(json!(null))));
    }

    #[test]
    fn test_dataset_and_style_views() {
        let (doc, card) = fixture();
        assert_eq!(doc.dataset_get(card, "userName").as_deref(), Some("henry"));
        assert_eq!(
            doc.member_to_value(&Member::Dataset(card)),
            json!({"userName": "henry"})
        );
        assert_eq!(doc.member_to_value(&Member::Style(card)), json!({"fontSize": "12px"}));
    }

    #[test]
    fn test_set_member() {
        let (mut doc, card) = fixture();
        doc.set_member(card, "className", json!("c")).unwrap();
        assert_eq!(doc.attr(card, "class"), Some("c"));

        doc.set_member(card, "classList", json!(["x", "y"])).unwrap();
        assert_eq!(doc.class_list(card), vec!["x", "y"]);

        doc.set_member(card, "answer", json!(42)).unwrap();
        assert_eq!(doc.get_member(card, "answer"), Some(Member::Value(json!(42))));

        let err = doc.set_member(card, "tagName", json!("P")).unwrap_err();
        assert_eq!(err, "property \"tagName\" is read-only");

        let err = doc.set_member(card, "click", json!(1)).unwrap_err();
        assert_eq!(err, "property \"click\" is read-only");
    }

    #[test]
    fn test_methods_are_members() {
        let (mut doc, card) = fixture();
        for &method in METHODS {
            assert_eq!(doc.get_member(card, method), Some(Member::Method), "{}", method);
            assert!(
                !matches!(doc.call_method(card, method, &[json!("span"), json!("x")]), Err(ProbeError::Script(_))),
                "{}",
                method
            );
        }
        assert_eq!(doc.member_to_value(&Member::Method), json!(null));
    }

    #[test]
    fn test_call_methods() {
        let (mut doc, card) = fixture();
        assert_eq!(doc.call_method(card, "getAttribute", &[json!("id")]).unwrap(), json!("card"));
        assert_eq!(doc.call_method(card, "getAttribute", &[json!("nope")]).unwrap(), json!(null));
        assert_eq!(doc.call_method(card, "toggleAttribute", &[json!("open")]).unwrap(), json!(true));
        assert!(doc.has_attr(card, "open"));
        assert_eq!(doc.call_method(card, "matches", &[json!("div.a")]).unwrap(), json!(true));

        let span = doc.call_method(card, "querySelector", &[json!("span")]).unwrap();
        assert_eq!(NodeId::from_value(&span).map(|s| doc.text_content(s)), Some("hi".to_string()));

        let err = doc.call_method(card, "explode", &[]).unwrap_err();
        assert_eq!(err.to_string(), "element does not implement \"explode\"");
        assert!(matches!(
            doc.call_method(card, "getAttribute", &[]),
            Err(ProbeError::InvalidArguments { .. })
        ));
    }
}
