//! Form values by control kind.
//!
//! Every control falls into one of five kinds. Each kind has one read and one write
//! function, looked up through a table indexed by the kind.

use super::element::{enabled_guard, visible_guard};
use super::outcome::Outcome;
use crate::dom::props::js_string;
use crate::dom::{Document, NodeId};
use serde_json::Value;

/// Semantic category of a form control
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlKind {
    TextLike = 0,
    Checkbox = 1,
    Radio = 2,
    SingleSelect = 3,
    MultiSelect = 4,
}

/// Read and write functions for one control kind. `write` runs after the visibility and
/// enabled guards have passed.
pub struct ValueCodec {
    pub read: fn(&Document, NodeId) -> Value,
    pub write: fn(&mut Document, NodeId, &Value) -> Outcome,
}

const CODECS: [ValueCodec; 5] = [
    ValueCodec {
        read: read_text,
        write: write_text,
    },
    ValueCodec {
        read: read_checkbox,
        write: write_checkbox,
    },
    ValueCodec {
        read: read_radio,
        write: write_radio,
    },
    ValueCodec {
        read: read_text,
        write: write_single_select,
    },
    ValueCodec {
        read: read_multi_select,
        write: write_multi_select,
    },
];

impl ControlKind {
    /// Classify an element by its `type`
    pub fn of(doc: &Document, id: NodeId) -> Self {
        match doc.input_type(id).as_deref() {
            Some("checkbox") if doc.is_tag(id, "input") => ControlKind::Checkbox,
            Some("radio") if doc.is_tag(id, "input") => ControlKind::Radio,
            Some("select-one") => ControlKind::SingleSelect,
            Some("select-multiple") => ControlKind::MultiSelect,
            _ => ControlKind::TextLike,
        }
    }

    pub fn codec(self) -> &'static ValueCodec {
        &CODECS[self as usize]
    }

    pub fn read(self, doc: &Document, id: NodeId) -> Value {
        (self.codec().read)(doc, id)
    }

    pub fn write(self, doc: &mut Document, id: NodeId, value: &Value) -> Outcome {
        (self.codec().write)(doc, id, value)
    }
}

/// Raise bubbling `input` and `change` on a control
pub(crate) fn notify_changed(doc: &mut Document, id: NodeId) {
    doc.dispatch_event(id, "input", true);
    doc.dispatch_event(id, "change", true);
}

fn read_text(doc: &Document, id: NodeId) -> Value {
    match doc.value(id) {
        Some(value) => Value::String(value),
        None => doc
            .element(id)
            .and_then(|e| e.expando.get("value").cloned())
            .unwrap_or(Value::Null),
    }
}

fn write_text(doc: &mut Document, id: NodeId, value: &Value) -> Outcome {
    doc.focus(id);
    if doc.has_value_property(id) {
        doc.set_value(id, &js_string(value));
    } else if let Some(element) = doc.element_mut(id) {
        element.expando.insert("value".to_string(), value.clone());
    }
    doc.blur(id);
    notify_changed(doc, id);
    Outcome::ok()
}

fn read_checkbox(doc: &Document, id: NodeId) -> Value {
    Value::Bool(doc.checked(id).unwrap_or(false))
}

fn write_checkbox(doc: &mut Document, id: NodeId, value: &Value) -> Outcome {
    let Some(checked) = value.as_bool() else {
        return Outcome::error("Checkboxes only accept boolean values");
    };
    doc.focus(id);
    doc.set_checked(id, checked);
    doc.blur(id);
    notify_changed(doc, id);
    Outcome::ok()
}

fn read_radio(doc: &Document, id: NodeId) -> Value {
    doc.radio_group(id)
        .into_iter()
        .find(|r| doc.checked(*r) == Some(true))
        .and_then(|r| doc.value(r))
        .map_or(Value::Null, Value::String)
}

fn write_radio(doc: &mut Document, id: NodeId, value: &Value) -> Outcome {
    let Some(wanted) = value.as_str() else {
        return Outcome::error("Radio inputs only accept string values");
    };
    let option = doc
        .radio_group(id)
        .into_iter()
        .find(|r| doc.value(*r).as_deref() == Some(wanted));
    let Some(option) = option else {
        return Outcome::error(format!("Radio input does not have option with value \"{}\"", wanted));
    };
    if !visible_guard(doc, option).success {
        return Outcome::error(format!("The \"{}\" option is not visible", wanted));
    }
    if !enabled_guard(doc, option).success {
        return Outcome::error(format!("The \"{}\" option is not enabled", wanted));
    }
    doc.focus(option);
    doc.set_checked(option, true);
    doc.blur(option);
    notify_changed(doc, option);
    Outcome::ok()
}

fn write_single_select(doc: &mut Document, id: NodeId, value: &Value) -> Outcome {
    let wanted = js_string(value);
    let known = doc
        .options(id)
        .into_iter()
        .any(|o| doc.attr(o, "value") == Some(wanted.as_str()));
    if !known {
        return Outcome::error(format!("Select input does not have option with value \"{}\"", wanted));
    }
    write_text(doc, id, value)
}

fn read_multi_select(doc: &Document, id: NodeId) -> Value {
    Value::Array(
        doc.selected_options(id)
            .into_iter()
            .filter_map(|o| doc.value(o))
            .map(Value::String)
            .collect(),
    )
}

fn write_multi_select(doc: &mut Document, id: NodeId, value: &Value) -> Outcome {
    let wanted: Option<Vec<&str>> = value
        .as_array()
        .and_then(|items| items.iter().map(Value::as_str).collect());
    let Some(wanted) = wanted else {
        return Outcome::error("Multi-select inputs only accept []string values");
    };
    let options = doc.options(id);
    let mut chosen = Vec::with_capacity(wanted.len());
    for name in wanted {
        let Some(option) = options
            .iter()
            .copied()
            .find(|o| doc.value(*o).as_deref() == Some(name))
        else {
            return Outcome::error(format!("The \"{}\" option does not exist", name));
        };
        if !enabled_guard(doc, option).success {
            return Outcome::error(format!("The \"{}\" option is not enabled", name));
        }
        chosen.push(option);
    }
    for option in &options {
        doc.set_selected(*option, false);
    }
    for option in chosen {
        doc.set_selected(option, true);
    }
    notify_changed(doc, id);
    Outcome::ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::ElementNode;
    use serde_json::json;

    fn fixture() -> Document {
        Document::from_elements([
            ElementNode::input("text").with_id("text").with_size(100.0, 20.0),
            ElementNode::input("checkbox").with_id("check").with_size(10.0, 10.0),
            ElementNode::input("radio")
                .with_id("red")
                .with_attr("name", "color")
                .with_attr("value", "red"),
            ElementNode::input("radio")
                .with_id("blue")
                .with_attr("name", "color")
                .with_attr("value", "blue"),
            ElementNode::input("radio")
                .with_id("green")
                .with_attr("name", "color")
                .with_attr("value", "green")
                .with_attr("disabled", ""),
            ElementNode::input("radio")
                .with_id("yellow")
                .with_attr("name", "color")
                .with_attr("value", "yellow")
                .with_attr("style", "display: none"),
            ElementNode::select(&[("a", "A"), ("b", "B")]).with_id("single"),
            ElementNode::select(&[("a", "A"), ("b", "B"), ("c", "C")])
                .with_id("multi")
                .with_attr("multiple", ""),
            ElementNode::new("select")
                .with_id("limited")
                .with_attr("multiple", "")
                .with_child(ElementNode::option("a", "A"))
                .with_child(ElementNode::option("b", "B").with_attr("disabled", "")),
            ElementNode::new("div").with_id("plain"),
        ])
    }

    fn find(doc: &Document, selector: &str) -> NodeId {
        doc.query_selector(selector).unwrap().unwrap()
    }

    fn event_kinds(doc: &Document) -> Vec<(String, NodeId)> {
        doc.events().map(|e| (e.kind.clone(), e.target)).collect()
    }

    #[test]
    fn test_kind_classification() {
        let doc = fixture();
        assert_eq!(ControlKind::of(&doc, find(&doc, "#text")), ControlKind::TextLike);
        assert_eq!(ControlKind::of(&doc, find(&doc, "#check")), ControlKind::Checkbox);
        assert_eq!(ControlKind::of(&doc, find(&doc, "#red")), ControlKind::Radio);
        assert_eq!(ControlKind::of(&doc, find(&doc, "#single")), ControlKind::SingleSelect);
        assert_eq!(ControlKind::of(&doc, find(&doc, "#multi")), ControlKind::MultiSelect);
        assert_eq!(ControlKind::of(&doc, find(&doc, "#plain")), ControlKind::TextLike);
    }

    #[test]
    fn test_text_write_focuses_and_notifies() {
        let mut doc = fixture();
        let text = find(&doc, "#text");
        let outcome = ControlKind::TextLike.write(&mut doc, text, &json!(42));
        assert!(outcome.success);
        assert_eq!(ControlKind::TextLike.read(&doc, text), json!("42"));
        let kinds: Vec<String> = event_kinds(&doc).into_iter().map(|(k, _)| k).collect();
        assert_eq!(kinds, vec!["focus", "blur", "input", "change"]);
    }

    #[test]
    fn test_checkbox_requires_bool() {
        let mut doc = fixture();
        let check = find(&doc, "#check");
        let outcome = ControlKind::Checkbox.write(&mut doc, check, &json!("x"));
        assert_eq!(outcome.error.as_deref(), Some("Checkboxes only accept boolean values"));
        assert_eq!(ControlKind::Checkbox.read(&doc, check), json!(false));
        assert_eq!(doc.events().count(), 0);

        ControlKind::Checkbox.write(&mut doc, check, &json!(true));
        assert_eq!(ControlKind::Checkbox.read(&doc, check), json!(true));
    }

    #[test]
    fn test_radio_notifies_chosen_option() {
        let mut doc = fixture();
        let red = find(&doc, "#red");
        let blue = find(&doc, "#blue");
        assert_eq!(ControlKind::Radio.read(&doc, red), json!(null));

        let outcome = ControlKind::Radio.write(&mut doc, red, &json!("blue"));
        assert!(outcome.success, "{:?}", outcome);
        assert_eq!(ControlKind::Radio.read(&doc, red), json!("blue"));
        assert_eq!(doc.checked(red), Some(false));
        assert!(event_kinds(&doc).contains(&("change".to_string(), blue)));
    }

    #[test]
    fn test_radio_errors() {
        let mut doc = fixture();
        let red = find(&doc, "#red");
        assert_eq!(
            ControlKind::Radio.write(&mut doc, red, &json!(1)).error.as_deref(),
            Some("Radio inputs only accept string values")
        );
        assert_eq!(
            ControlKind::Radio.write(&mut doc, red, &json!("purple")).error.as_deref(),
            Some("Radio input does not have option with value \"purple\"")
        );
        assert_eq!(
            ControlKind::Radio.write(&mut doc, red, &json!("green")).error.as_deref(),
            Some("The \"green\" option is not enabled")
        );
    }

    #[test]
    fn test_hidden_radio_option_keeps_selection() {
        let mut doc = fixture();
        let red = find(&doc, "#red");
        assert!(ControlKind::Radio.write(&mut doc, red, &json!("blue")).success);
        assert_eq!(
            ControlKind::Radio.write(&mut doc, red, &json!("yellow")).error.as_deref(),
            Some("The \"yellow\" option is not visible")
        );
        assert_eq!(ControlKind::Radio.read(&doc, red), json!("blue"));
        assert_eq!(doc.checked(find(&doc, "#yellow")), Some(false));
    }

    #[test]
    fn test_single_select() {
        let mut doc = fixture();
        let select = find(&doc, "#single");
        assert_eq!(ControlKind::SingleSelect.read(&doc, select), json!("a"));
        assert_eq!(
            ControlKind::SingleSelect.write(&mut doc, select, &json!("z")).error.as_deref(),
            Some("Select input does not have option with value \"z\"")
        );
        assert!(ControlKind::SingleSelect.write(&mut doc, select, &json!("b")).success);
        assert_eq!(ControlKind::SingleSelect.read(&doc, select), json!("b"));
    }

    #[test]
    fn test_multi_select_keeps_option_order() {
        let mut doc = fixture();
        let select = find(&doc, "#multi");
        assert!(ControlKind::MultiSelect.write(&mut doc, select, &json!(["c", "a"])).success);
        assert_eq!(ControlKind::MultiSelect.read(&doc, select), json!(["a", "c"]));

        let outcome = ControlKind::MultiSelect.write(&mut doc, select, &json!(["nonexistent"]));
        assert_eq!(outcome.error.as_deref(), Some("The \"nonexistent\" option does not exist"));
        assert_eq!(ControlKind::MultiSelect.read(&doc, select), json!(["a", "c"]));

        let outcome = ControlKind::MultiSelect.write(&mut doc, select, &json!(["a", 2]));
        assert_eq!(outcome.error.as_deref(), Some("Multi-select inputs only accept []string values"));
    }

    #[test]
    fn test_disabled_multi_select_option_keeps_selection() {
        let mut doc = fixture();
        let select = find(&doc, "#limited");
        assert!(ControlKind::MultiSelect.write(&mut doc, select, &json!(["a"])).success);
        let events = doc.events().count();

        let outcome = ControlKind::MultiSelect.write(&mut doc, select, &json!(["a", "b"]));
        assert_eq!(outcome.error.as_deref(), Some("The \"b\" option is not enabled"));
        assert_eq!(ControlKind::MultiSelect.read(&doc, select), json!(["a"]));
        assert_eq!(doc.events().count(), events);
    }

    #[test]
    fn test_plain_element_value_is_expando() {
        let mut doc = fixture();
        let plain = find(&doc, "#plain");
        assert_eq!(ControlKind::TextLike.read(&doc, plain), json!(null));
        ControlKind::TextLike.write(&mut doc, plain, &json!({"a": 1}));
        assert_eq!(ControlKind::TextLike.read(&doc, plain), json!({"a": 1}));
    }
}
