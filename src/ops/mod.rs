//! The page helper: every operation a driver can call, addressed by wire name.
//!
//! Operations take a selector plus operation-specific arguments and always answer with an
//! [`Outcome`]. Nothing in here returns a Rust error or panics across the call boundary.
//!
//! ```
//! use page_probe::dom::{Document, ElementNode};
//! use page_probe::ops::{Helper, Request};
//! use serde_json::json;
//!
//! let mut doc = Document::from_elements([ElementNode::new("button").with_id("go").with_text("Go")]);
//! let helper = Helper::with_defaults();
//!
//! let request: Request = serde_json::from_value(json!({"op": "getInnerText", "selector": "s#go"})).unwrap();
//! let outcome = helper.execute(&mut doc, &request);
//! assert_eq!(outcome.result, Some(json!("Go")));
//! ```

pub mod batch;
pub mod chain;
pub mod element;
pub mod outcome;
pub mod properties;
pub mod property;
pub mod value;

pub use chain::Guard;
pub use outcome::Outcome;
pub use properties::{Properties, PropertiesList};
pub use property::PropertyPath;
pub use value::ControlKind;

use crate::dom::Document;
use crate::error::{ProbeError, Result};
use crate::selector::{Selector, WireSelector};
use indexmap::IndexMap;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One call into the helper
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Request {
    /// Operation name, e.g. `click` or `getPropertyForEach`
    pub op: String,

    /// Marker-prefixed query string, a node handle, or a list of node handles
    pub selector: WireSelector,

    /// Operation-specific arguments
    #[serde(default)]
    pub args: Vec<Value>,
}

impl Request {
    /// A request with no arguments. String selectors go through `Selector::from`, so
    /// `"//li"` and `"x//li"` are path queries and everything else is CSS without a marker.
    pub fn new(op: impl Into<String>, selector: impl Into<Selector>) -> Self {
        Self {
            op: op.into(),
            selector: selector.into().to_wire(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, value: impl Into<Value>) -> Self {
        self.args.push(value.into());
        self
    }
}

/// Positional arguments of one call
#[derive(Debug, Clone, Copy)]
pub struct Args<'a> {
    op: &'a str,
    values: &'a [Value],
}

impl<'a> Args<'a> {
    pub fn new(op: &'a str, values: &'a [Value]) -> Self {
        Self { op, values }
    }

    fn invalid(&self, reason: String) -> ProbeError {
        ProbeError::InvalidArguments {
            op: self.op.to_string(),
            reason,
        }
    }

    pub fn value(&self, index: usize) -> Result<&'a Value> {
        self.values
            .get(index)
            .ok_or_else(|| self.invalid(format!("missing argument {}", index + 1)))
    }

    pub fn string(&self, index: usize) -> Result<&'a str> {
        self.value(index)?
            .as_str()
            .ok_or_else(|| self.invalid(format!("argument {} must be a string", index + 1)))
    }

    pub fn strings(&self, index: usize) -> Result<Vec<String>> {
        let items = self
            .value(index)?
            .as_array()
            .ok_or_else(|| self.invalid(format!("argument {} must be an array of strings", index + 1)))?;
        items
            .iter()
            .map(|item| {
                item.as_str()
                    .map(str::to_string)
                    .ok_or_else(|| self.invalid(format!("argument {} must be an array of strings", index + 1)))
            })
            .collect()
    }

    /// Everything from `from` on, for operations that forward extra arguments
    pub fn rest(&self, from: usize) -> &'a [Value] {
        self.values.get(from..).unwrap_or_default()
    }
}

/// An operation handler as stored in the helper table
pub type Handler = fn(&mut Document, &Selector, &Args<'_>) -> Result<Outcome>;

/// Operation table, built once when the helper is installed
#[derive(Clone)]
pub struct Helper {
    handlers: IndexMap<String, Handler>,
}

impl std::fmt::Debug for Helper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Helper")
            .field("operations", &self.handlers.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Helper {
    pub fn new() -> Self {
        Self {
            handlers: IndexMap::new(),
        }
    }

    /// Table holding every built-in operation
    pub fn with_defaults() -> Self {
        let mut helper = Self::new();

        helper.register("exists", |doc, sel, _| Ok(element::exists(doc, sel)));
        helper.register("count", |doc, sel, _| Ok(batch::count(doc, sel)));
        helper.register("isVisible", |doc, sel, _| Ok(element::is_visible(doc, sel)));
        helper.register("isEnabled", |doc, sel, _| Ok(element::is_enabled(doc, sel)));
        helper.register("isChecked", |doc, sel, _| Ok(element::is_checked(doc, sel)));
        helper.register("click", |doc, sel, _| Ok(element::click(doc, sel)));
        helper.register("clickEach", |doc, sel, _| Ok(batch::click_each(doc, sel)));
        helper.register("getInnerText", |doc, sel, _| Ok(element::get_inner_text(doc, sel)));
        helper.register("getInnerTexts", |doc, sel, _| Ok(batch::get_inner_texts(doc, sel)));
        helper.register("getClassList", |doc, sel, _| Ok(element::get_class_list(doc, sel)));
        helper.register("getValue", |doc, sel, _| Ok(element::get_value(doc, sel)));
        helper.register("setValue", |doc, sel, args| {
            Ok(element::set_value(doc, sel, args.value(0)?))
        });
        helper.register("setChecked", |doc, sel, args| {
            Ok(element::set_checked(doc, sel, args.value(0)?))
        });
        helper.register("hasProperty", |doc, sel, args| {
            Ok(element::has_property(doc, sel, args.string(0)?))
        });
        helper.register("eachHasProperty", |doc, sel, args| {
            Ok(batch::each_has_property(doc, sel, args.string(0)?))
        });
        helper.register("getProperty", |doc, sel, args| {
            Ok(element::get_property(doc, sel, args.string(0)?))
        });
        helper.register("getPropertyForEach", |doc, sel, args| {
            Ok(batch::get_property_for_each(doc, sel, args.string(0)?))
        });
        helper.register("getProperties", |doc, sel, args| {
            Ok(element::get_properties(doc, sel, &args.strings(0)?))
        });
        helper.register("getPropertiesForEach", |doc, sel, args| {
            Ok(batch::get_properties_for_each(doc, sel, &args.strings(0)?))
        });
        helper.register("setProperty", |doc, sel, args| {
            Ok(element::set_property(doc, sel, args.string(0)?, args.value(1)?))
        });
        helper.register("setPropertyForEach", |doc, sel, args| {
            Ok(batch::set_property_for_each(doc, sel, args.string(0)?, args.value(1)?))
        });
        helper.register("invokeOn", |doc, sel, args| {
            Ok(element::invoke_on(doc, sel, args.string(0)?, args.rest(1)))
        });
        helper.register("invokeOnEach", |doc, sel, args| {
            Ok(batch::invoke_on_each(doc, sel, args.string(0)?, args.rest(1)))
        });
        helper.register("invokeWith", |doc, sel, args| {
            Ok(element::invoke_with(doc, sel, args.string(0)?, args.rest(1)))
        });
        helper.register("invokeWithEach", |doc, sel, args| {
            Ok(batch::invoke_with_each(doc, sel, args.string(0)?, args.rest(1)))
        });

        helper
    }

    /// Add or replace an operation
    pub fn register(&mut self, name: impl Into<String>, handler: Handler) {
        self.handlers.insert(name.into(), handler);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    /// Operation names in registration order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.handlers.keys().map(String::as_str)
    }

    /// Run a request against the document
    pub fn execute(&self, doc: &mut Document, request: &Request) -> Outcome {
        let Some(handler) = self.handlers.get(&request.op) else {
            log::warn!("unknown operation {:?}", request.op);
            return ProbeError::UnknownOperation(request.op.clone()).into();
        };
        let selector = Selector::from(request.selector.clone());
        log::debug!("dispatching {} on {}", request.op, selector);
        let args = Args::new(&request.op, &request.args);
        handler(doc, &selector, &args).unwrap_or_else(Outcome::from)
    }
}

impl Default for Helper {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::ElementNode;
    use serde_json::json;

    fn fixture() -> Document {
        Document::from_elements([
            ElementNode::new("p").with_class("note").with_text("first"),
            ElementNode::new("p").with_class("note").with_text("second"),
        ])
    }

    #[test]
    fn test_defaults_cover_every_operation() {
        let helper = Helper::with_defaults();
        for name in [
            "exists",
            "count",
            "isVisible",
            "isEnabled",
            "isChecked",
            "click",
            "clickEach",
            "getInnerText",
            "getInnerTexts",
            "getClassList",
            "getValue",
            "setValue",
            "setChecked",
            "hasProperty",
            "eachHasProperty",
            "getProperty",
            "getPropertyForEach",
            "getProperties",
            "getPropertiesForEach",
            "setProperty",
            "setPropertyForEach",
            "invokeOn",
            "invokeOnEach",
            "invokeWith",
            "invokeWithEach",
        ] {
            assert!(helper.contains(name), "missing {}", name);
        }
        assert_eq!(helper.names().count(), 25);
    }

    #[test]
    fn test_request_from_json() {
        let request: Request = serde_json::from_value(json!({
            "op": "getPropertyForEach",
            "selector": "x//p",
            "args": ["textContent"],
        }))
        .unwrap();
        assert_eq!(request, Request::new("getPropertyForEach", Selector::xpath("//p")).arg("textContent"));

        let without_args: Request = serde_json::from_value(json!({"op": "count", "selector": "s.note"})).unwrap();
        assert!(without_args.args.is_empty());
    }

    #[test]
    fn test_execute() {
        let mut doc = fixture();
        let helper = Helper::with_defaults();
        let request = Request::new("getPropertyForEach", ".note").arg("textContent");
        assert_eq!(helper.execute(&mut doc, &request).result, Some(json!(["first", "second"])));

        let request = Request::new("count", Selector::css(".note"));
        assert_eq!(helper.execute(&mut doc, &request).result, Some(json!(2)));

        let request = Request::new("count", "x//p");
        assert_eq!(request.selector, WireSelector::Query("x//p".to_string()));
        assert_eq!(helper.execute(&mut doc, &request).result, Some(json!(2)));
    }

    #[test]
    fn test_unknown_operation_is_an_error_outcome() {
        let mut doc = fixture();
        let outcome = Helper::with_defaults().execute(&mut doc, &Request::new("explode", ".note"));
        assert_eq!(outcome.error.as_deref(), Some("unknown operation \"explode\""));
    }

    #[test]
    fn test_bad_arguments_are_error_outcomes() {
        let mut doc = fixture();
        let helper = Helper::with_defaults();

        let outcome = helper.execute(&mut doc, &Request::new("getProperty", ".note"));
        assert_eq!(
            outcome.error.as_deref(),
            Some("invalid arguments for getProperty: missing argument 1")
        );

        let outcome = helper.execute(&mut doc, &Request::new("getProperties", ".note").arg("id"));
        assert_eq!(
            outcome.error.as_deref(),
            Some("invalid arguments for getProperties: argument 1 must be an array of strings")
        );
    }

    #[test]
    fn test_register_custom_operation() {
        let mut doc = fixture();
        let mut helper = Helper::new();
        helper.register("textLength", |doc, sel, _| {
            Ok(chain::one(doc, sel, &[], |doc, id| {
                Outcome::value(json!(doc.text_content(id).len()))
            }))
        });
        let outcome = helper.execute(&mut doc, &Request::new("textLength", "p"));
        assert_eq!(outcome.result, Some(json!(5)));
    }
}
