//! Operations on the first element a selector matches.

use super::chain::{one, one_mut};
use super::outcome::Outcome;
use super::property::{self, PropertyPath};
use super::value::{notify_changed, ControlKind};
use crate::dom::{Document, NodeId};
use crate::selector::Selector;
use serde_json::Value;

pub fn visible_guard(doc: &Document, id: NodeId) -> Outcome {
    let visible = doc.bounding_box(id).has_extent() || doc.offset_parent(id).is_some();
    Outcome::check(visible, "DOM element is not visible")
}

pub fn enabled_guard(doc: &Document, id: NodeId) -> Outcome {
    Outcome::check(doc.disabled(id) != Some(true), "DOM element is not enabled")
}

pub fn checked_guard(doc: &Document, id: NodeId) -> Outcome {
    Outcome::check(doc.checked(id) == Some(true), "DOM element is not checked")
}

/// Whether anything matches. Never an error: a malformed query simply matches nothing.
pub fn exists(doc: &Document, selector: &Selector) -> Outcome {
    let found = matches!(selector.resolve_one(doc), Ok(Some(_)));
    Outcome::check(found, "DOM element does not exist")
}

pub fn is_visible(doc: &Document, selector: &Selector) -> Outcome {
    one(doc, selector, &[], visible_guard)
}

pub fn is_enabled(doc: &Document, selector: &Selector) -> Outcome {
    one(doc, selector, &[], enabled_guard)
}

pub fn is_checked(doc: &Document, selector: &Selector) -> Outcome {
    one(doc, selector, &[], checked_guard)
}

pub fn click(doc: &mut Document, selector: &Selector) -> Outcome {
    one_mut(doc, selector, &[visible_guard, enabled_guard], |doc, id| {
        doc.click(id);
        Outcome::ok()
    })
}

pub fn get_inner_text(doc: &Document, selector: &Selector) -> Outcome {
    one(doc, selector, &[], |doc, id| Outcome::value(Value::String(doc.inner_text(id))))
}

pub fn get_class_list(doc: &Document, selector: &Selector) -> Outcome {
    one(doc, selector, &[], |doc, id| Outcome::value(Value::from(doc.class_list(id))))
}

/// Current value, read according to the control's kind
pub fn get_value(doc: &Document, selector: &Selector) -> Outcome {
    one(doc, selector, &[], |doc, id| {
        Outcome::value(ControlKind::of(doc, id).read(doc, id))
    })
}

/// Write a value the way a user edit would, raising `input` and `change`
pub fn set_value(doc: &mut Document, selector: &Selector, value: &Value) -> Outcome {
    one_mut(doc, selector, &[visible_guard, enabled_guard], |doc, id| {
        ControlKind::of(doc, id).write(doc, id, value)
    })
}

pub fn set_checked(doc: &mut Document, selector: &Selector, value: &Value) -> Outcome {
    one_mut(doc, selector, &[visible_guard, enabled_guard], |doc, id| {
        if !matches!(ControlKind::of(doc, id), ControlKind::Checkbox | ControlKind::Radio) {
            return Outcome::error("Only checkboxes and radio inputs can be checked");
        }
        let Some(checked) = value.as_bool() else {
            return Outcome::error("setChecked only accepts boolean values");
        };
        doc.focus(id);
        doc.set_checked(id, checked);
        doc.blur(id);
        notify_changed(doc, id);
        Outcome::ok()
    })
}

pub fn has_property(doc: &Document, selector: &Selector, path: &str) -> Outcome {
    one(doc, selector, &[], |doc, id| {
        let path = PropertyPath::parse(path);
        Outcome::check(
            path.exists(doc, id),
            format!("DOM element does not have property \"{}\"", path),
        )
    })
}

/// Value at a dotted path, `null` when the path does not resolve
pub fn get_property(doc: &Document, selector: &Selector, path: &str) -> Outcome {
    one(doc, selector, &[], |doc, id| {
        Outcome::value(PropertyPath::parse(path).get(doc, id).unwrap_or(Value::Null))
    })
}

pub fn get_properties(doc: &Document, selector: &Selector, paths: &[String]) -> Outcome {
    one(doc, selector, &[], |doc, id| {
        Outcome::value(Value::Object(property::collect(doc, id, paths)))
    })
}

pub fn set_property(doc: &mut Document, selector: &Selector, path: &str, value: &Value) -> Outcome {
    one_mut(doc, selector, &[], |doc, id| {
        match PropertyPath::parse(path).set(doc, id, value.clone()) {
            Ok(()) => Outcome::ok(),
            Err(message) => Outcome::error(message),
        }
    })
}

/// Call a named element method
pub fn invoke_on(doc: &mut Document, selector: &Selector, method: &str, args: &[Value]) -> Outcome {
    one_mut(doc, selector, &[], |doc, id| match doc.call_method(id, method, args) {
        Ok(value) => Outcome::value(value),
        Err(err) => Outcome::from(err),
    })
}

/// Run a registered snippet against the element
pub fn invoke_with(doc: &mut Document, selector: &Selector, source: &str, args: &[Value]) -> Outcome {
    one_mut(doc, selector, &[], |doc, id| match doc.run_snippet(source, id, args) {
        Ok(value) => Outcome::value(value),
        Err(err) => Outcome::from(err),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::ElementNode;
    use serde_json::json;

    fn fixture() -> Document {
        Document::from_elements([
            ElementNode::new("button")
                .with_id("go")
                .with_class("primary big")
                .with_text("Go"),
            ElementNode::new("button")
                .with_id("off")
                .with_attr("disabled", ""),
            ElementNode::new("div")
                .with_id("gone")
                .with_attr("style", "display: none"),
            ElementNode::input("checkbox").with_id("agree"),
            ElementNode::new("div")
                .with_id("card")
                .with_property("payload", json!({"a": {"b": {}}})),
        ])
    }

    #[test]
    fn test_exists_never_errors() {
        let doc = fixture();
        assert_eq!(exists(&doc, &Selector::css("#go")), Outcome::check(true, "DOM element does not exist"));
        let missing = exists(&doc, &Selector::css("#nope"));
        assert!(!missing.success);
        assert_eq!(missing.error, None);
        assert_eq!(exists(&doc, &Selector::xpath("//[")).error, None);
    }

    #[test]
    fn test_checks_report_guards() {
        let doc = fixture();
        assert!(is_visible(&doc, &Selector::css("#go")).success);
        let hidden = is_visible(&doc, &Selector::css("#gone"));
        assert!(!hidden.success);
        assert_eq!(hidden.guard.as_deref(), Some("DOM element is not visible"));
        assert_eq!(hidden.error, None);

        assert_eq!(
            is_enabled(&doc, &Selector::css("#off")).guard.as_deref(),
            Some("DOM element is not enabled")
        );
        assert!(!is_checked(&doc, &Selector::css("#agree")).success);
        assert_eq!(is_visible(&doc, &Selector::css("#gone")), is_visible(&doc, &Selector::css("#gone")));
    }

    #[test]
    fn test_not_found_for_every_single_element_op() {
        let mut doc = fixture();
        let sel = Selector::css("#missing");
        let outcomes = vec![
            is_visible(&doc, &sel),
            is_enabled(&doc, &sel),
            get_inner_text(&doc, &sel),
            get_value(&doc, &sel),
            get_property(&doc, &sel, "id"),
            has_property(&doc, &sel, "id"),
            click(&mut doc, &sel),
            set_value(&mut doc, &sel, &json!("x")),
            set_property(&mut doc, &sel, "id", &json!("x")),
            invoke_on(&mut doc, &sel, "click", &[]),
        ];
        for outcome in outcomes {
            assert_eq!(
                outcome.error.as_deref(),
                Some("could not find DOM element matching selector: #missing")
            );
        }
    }

    #[test]
    fn test_click_guards() {
        let mut doc = fixture();
        assert!(click(&mut doc, &Selector::css("#go")).success);
        assert_eq!(
            click(&mut doc, &Selector::css("#off")).error.as_deref(),
            Some("DOM element is not enabled: #off")
        );
        assert_eq!(
            click(&mut doc, &Selector::css("#gone")).error.as_deref(),
            Some("DOM element is not visible: #gone")
        );
    }

    #[test]
    fn test_click_toggles_checkbox() {
        let mut doc = fixture();
        click(&mut doc, &Selector::css("#agree"));
        assert!(is_checked(&doc, &Selector::css("#agree")).success);
    }

    #[test]
    fn test_text_and_classes() {
        let doc = fixture();
        assert_eq!(get_inner_text(&doc, &Selector::css("#go")).result, Some(json!("Go")));
        assert_eq!(
            get_class_list(&doc, &Selector::css("#go")).result,
            Some(json!(["primary", "big"]))
        );
    }

    #[test]
    fn test_checkbox_value_round_trip() {
        let mut doc = fixture();
        let sel = Selector::css("#agree");
        assert!(set_value(&mut doc, &sel, &json!(true)).success);
        assert_eq!(get_value(&doc, &sel).result, Some(json!(true)));

        let outcome = set_value(&mut doc, &sel, &json!("x"));
        assert_eq!(outcome.error.as_deref(), Some("Checkboxes only accept boolean values: #agree"));
        assert_eq!(get_value(&doc, &sel).result, Some(json!(true)));
    }

    #[test]
    fn test_set_checked() {
        let mut doc = fixture();
        assert!(set_checked(&mut doc, &Selector::css("#agree"), &json!(true)).success);
        assert!(is_checked(&doc, &Selector::css("#agree")).success);
        assert_eq!(
            set_checked(&mut doc, &Selector::css("#go"), &json!(true)).error.as_deref(),
            Some("Only checkboxes and radio inputs can be checked: #go")
        );
    }

    #[test]
    fn test_properties() {
        let mut doc = fixture();
        let card = Selector::css("#card");
        assert_eq!(get_property(&doc, &card, "payload.a.b.c").result, Some(json!(null)));
        assert!(has_property(&doc, &card, "payload.a.b").success);

        let missing = has_property(&doc, &card, "payload.x");
        assert_eq!(missing.guard.as_deref(), Some("DOM element does not have property \"payload.x\""));

        assert_eq!(
            set_property(&mut doc, &card, "payload.x.c", &json!(1)).error.as_deref(),
            Some("could not resolve property component \".x\": #card")
        );
        assert!(set_property(&mut doc, &card, "payload.a.b.c", &json!(1)).success);
        assert_eq!(
            get_properties(&doc, &card, &["id".to_string(), "payload.a.b.c".to_string()]).result,
            Some(json!({"id": "card", "payload.a.b.c": 1}))
        );
    }

    #[test]
    fn test_methods_count_as_properties() {
        let mut doc = fixture();
        let go = Selector::css("#go");
        assert!(has_property(&doc, &go, "click").success);
        assert!(has_property(&doc, &go, "getAttribute").success);
        assert_eq!(get_property(&doc, &go, "click").result, Some(json!(null)));
        assert!(!has_property(&doc, &go, "click.call").success);
        assert!(invoke_on(&mut doc, &go, "click", &[]).success);
    }

    #[test]
    fn test_invoke() {
        let mut doc = fixture();
        let card = Selector::css("#card");
        let outcome = invoke_on(&mut doc, &card, "getAttribute", &[json!("id")]);
        assert_eq!(outcome.result, Some(json!("card")));
        assert_eq!(
            invoke_on(&mut doc, &card, "fly", &[]).error.as_deref(),
            Some("element does not implement \"fly\": #card")
        );

        doc.scripts_mut().define("(el) => el.id", |doc, el, _| {
            Ok(Value::from(doc.attr(el, "id").unwrap_or("")))
        });
        assert_eq!(invoke_with(&mut doc, &card, "(el) => el.id", &[]).result, Some(json!("card")));
        assert_eq!(
            invoke_with(&mut doc, &card, "(el) => nope", &[]).error.as_deref(),
            Some("snippet is not defined: (el) => nope: #card")
        );
    }
}
