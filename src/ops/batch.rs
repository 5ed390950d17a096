//! Operations over every element a selector matches.
//!
//! Each element is handed to the matching single-element operation. Writers stop at the
//! first element that fails and leave earlier elements changed. Readers visit every
//! element and collect `null` where an element produced nothing.

use super::chain::{each, each_mut};
use super::element;
use super::outcome::Outcome;
use crate::dom::{Document, NodeId};
use crate::selector::Selector;
use serde_json::Value;

/// Collect one value per node
fn gather(doc: &Document, nodes: Vec<NodeId>, read: impl Fn(&Document, &Selector) -> Outcome) -> Outcome {
    let values = nodes
        .into_iter()
        .map(|id| read(doc, &Selector::Node(id)).result_or_null())
        .collect();
    Outcome::value(Value::Array(values))
}

/// Collect one value per node from an operation that may mutate the document
fn gather_mut(
    doc: &mut Document,
    nodes: Vec<NodeId>,
    mut call: impl FnMut(&mut Document, &Selector) -> Outcome,
) -> Outcome {
    let values = nodes
        .into_iter()
        .map(|id| call(doc, &Selector::Node(id)).result_or_null())
        .collect();
    Outcome::value(Value::Array(values))
}

/// Apply a writer to each node in order, stopping at the first failure
fn fail_fast(
    doc: &mut Document,
    nodes: Vec<NodeId>,
    mut write: impl FnMut(&mut Document, &Selector) -> Outcome,
) -> Outcome {
    for id in nodes {
        let outcome = write(doc, &Selector::Node(id));
        if !outcome.success {
            log::debug!("batch write stopped at {}", id);
            return outcome;
        }
    }
    Outcome::ok()
}

pub fn count(doc: &Document, selector: &Selector) -> Outcome {
    each(doc, selector, |_, nodes| Outcome::value(Value::from(nodes.len())))
}

pub fn click_each(doc: &mut Document, selector: &Selector) -> Outcome {
    each_mut(doc, selector, |doc, nodes| fail_fast(doc, nodes, element::click))
}

pub fn get_inner_texts(doc: &Document, selector: &Selector) -> Outcome {
    each(doc, selector, |doc, nodes| gather(doc, nodes, element::get_inner_text))
}

pub fn get_property_for_each(doc: &Document, selector: &Selector, path: &str) -> Outcome {
    each(doc, selector, |doc, nodes| {
        gather(doc, nodes, |doc, node| element::get_property(doc, node, path))
    })
}

pub fn get_properties_for_each(doc: &Document, selector: &Selector, paths: &[String]) -> Outcome {
    each(doc, selector, |doc, nodes| {
        gather(doc, nodes, |doc, node| element::get_properties(doc, node, paths))
    })
}

pub fn set_property_for_each(doc: &mut Document, selector: &Selector, path: &str, value: &Value) -> Outcome {
    each_mut(doc, selector, |doc, nodes| {
        fail_fast(doc, nodes, |doc, node| element::set_property(doc, node, path, value))
    })
}

pub fn invoke_on_each(doc: &mut Document, selector: &Selector, method: &str, args: &[Value]) -> Outcome {
    each_mut(doc, selector, |doc, nodes| {
        gather_mut(doc, nodes, |doc, node| element::invoke_on(doc, node, method, args))
    })
}

pub fn invoke_with_each(doc: &mut Document, selector: &Selector, source: &str, args: &[Value]) -> Outcome {
    each_mut(doc, selector, |doc, nodes| {
        gather_mut(doc, nodes, |doc, node| element::invoke_with(doc, node, source, args))
    })
}

/// Whether every match has the property. No matches is `false`.
pub fn each_has_property(doc: &Document, selector: &Selector, path: &str) -> Outcome {
    each(doc, selector, |doc, nodes| {
        let all = !nodes.is_empty()
            && nodes
                .iter()
                .all(|id| element::has_property(doc, &Selector::Node(*id), path).success);
        Outcome::check(all, format!("DOM elements do not all have property \"{}\"", path))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::ElementNode;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn fixture() -> Document {
        Document::from_elements([
            ElementNode::new("li")
                .with_class("item")
                .with_text("one")
                .with_property("payload", json!({"n": 1})),
            ElementNode::new("li")
                .with_class("item")
                .with_text("two")
                .with_property("tag", json!("second")),
            ElementNode::new("li")
                .with_class("item")
                .with_text("three")
                .with_property("payload", json!({"n": 3})),
        ])
    }

    #[test]
    fn test_count_zero_is_not_an_error() {
        let doc = fixture();
        assert_eq!(count(&doc, &Selector::css(".item")).result, Some(json!(3)));
        assert_eq!(count(&doc, &Selector::css(".none")), Outcome::value(json!(0)));
    }

    #[test]
    fn test_readers_are_total() {
        let doc = fixture();
        assert_eq!(
            get_inner_texts(&doc, &Selector::css(".item")).result,
            Some(json!(["one", "two", "three"]))
        );
        assert_eq!(
            get_property_for_each(&doc, &Selector::css(".item"), "payload.n").result,
            Some(json!([1, null, 3]))
        );
        assert_eq!(
            get_properties_for_each(&doc, &Selector::css(".item"), &["tag".to_string()]).result,
            Some(json!([{"tag": null}, {"tag": "second"}, {"tag": null}]))
        );
    }

    #[test]
    fn test_set_property_for_each_is_fail_fast() {
        let mut doc = fixture();
        let outcome = set_property_for_each(&mut doc, &Selector::css(".item"), "payload.seen", &json!(true));
        assert_eq!(
            outcome.error.as_deref(),
            Some("could not resolve property component \".payload\": .item")
        );
        assert_eq!(
            get_property_for_each(&doc, &Selector::css(".item"), "payload.seen").result,
            Some(json!([true, null, null]))
        );
    }

    #[test]
    fn test_click_each_stops_at_disabled() {
        let mut doc = Document::from_elements([
            ElementNode::input("checkbox").with_class("c"),
            ElementNode::input("checkbox").with_class("c").with_attr("disabled", ""),
            ElementNode::input("checkbox").with_class("c"),
        ]);
        let outcome = click_each(&mut doc, &Selector::css(".c"));
        assert_eq!(outcome.error.as_deref(), Some("DOM element is not enabled: .c"));
        assert_eq!(
            get_property_for_each(&doc, &Selector::css(".c"), "checked").result,
            Some(json!([true, false, false]))
        );
    }

    #[test]
    fn test_invoke_each() {
        let mut doc = fixture();
        let outcome = invoke_on_each(&mut doc, &Selector::css(".item"), "getAttribute", &[json!("class")]);
        assert_eq!(outcome.result, Some(json!(["item", "item", "item"])));

        let outcome = invoke_on_each(&mut doc, &Selector::css(".item"), "nope", &[]);
        assert_eq!(outcome.result, Some(json!([null, null, null])));

        doc.scripts_mut().define("(el, n) => el.textContent.length + n", |doc, el, args| {
            let n = args.first().and_then(Value::as_u64).unwrap_or(0);
            Ok(Value::from(doc.text_content(el).len() as u64 + n))
        });
        let outcome = invoke_with_each(
            &mut doc,
            &Selector::css(".item"),
            "(el, n) => el.textContent.length + n",
            &[json!(10)],
        );
        assert_eq!(outcome.result, Some(json!([13, 13, 15])));
    }

    #[test]
    fn test_each_has_property() {
        let doc = fixture();
        assert!(each_has_property(&doc, &Selector::css(".item"), "classList").success);
        assert!(!each_has_property(&doc, &Selector::css(".item"), "payload").success);
        let empty = each_has_property(&doc, &Selector::css(".none"), "id");
        assert!(!empty.success);
        assert_eq!(empty.error, None);
    }
}
