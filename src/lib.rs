//! # page-probe
//!
//! An in-page automation helper: the half of a browser-automation driver that runs inside
//! the page. It resolves selectors, checks preconditions, performs DOM operations and
//! normalizes form values, answering every call with the same result envelope.
//!
//! ## Features
//!
//! - **Selector resolution**: CSS selectors, XPath 1.0 queries and node handles behind one type
//! - **Guarded operations**: clicks and value writes only happen on visible, enabled elements
//! - **Form value normalization**: text inputs, checkboxes, radio groups, single and multi-selects
//! - **Property paths**: dotted reads and writes such as `dataset.userName` or `style.color`
//! - **Request protocol**: JSON requests and [`Outcome`] responses with a published schema
//!
//! ## Usage
//!
//! ```rust
//! use page_probe::{Document, ElementNode, Request, Window};
//! use serde_json::json;
//!
//! let document = Document::from_elements([
//!     ElementNode::input("checkbox").with_id("agree"),
//!     ElementNode::select(&[("a", "A"), ("b", "B"), ("c", "C")])
//!         .with_id("letters")
//!         .with_attr("multiple", ""),
//! ]);
//!
//! let mut window = Window::new(document);
//! window.inject();
//!
//! let outcome = window.call(&Request::new("setValue", "#agree").arg(true));
//! assert!(outcome.success);
//!
//! window.call(&Request::new("setValue", "#letters").arg(json!(["c", "a"])));
//! let outcome = window.call(&Request::new("getValue", "#letters"));
//! assert_eq!(outcome.result, Some(json!(["a", "c"])));
//!
//! let outcome = window.call(&Request::new("click", "#missing"));
//! assert_eq!(
//!     outcome.error.as_deref(),
//!     Some("could not find DOM element matching selector: #missing")
//! );
//! ```
//!
//! ### Building path queries
//!
//! ```rust
//! use page_probe::{Selector, XPath};
//!
//! let submit: Selector = XPath::new("form").with_id("login").descendant(Some("button")).first().into();
//! assert_eq!(submit, Selector::xpath("//form[@id='login']//button[1]"));
//! ```
//!
//! ## Module Overview
//!
//! - [`dom`]: The page model: document tree, form state, layout, events and snippets
//! - [`selector`]: Selector types, wire encoding and the path-query builder
//! - [`ops`]: The helper's operations, the guard chain and the result envelope
//! - [`window`]: One-time helper injection and the call entry point
//! - [`config`]: Window options
//! - [`error`]: Error types and result aliases

pub mod config;
pub mod dom;
pub mod error;
pub mod ops;
pub mod selector;
pub mod window;

pub use config::WindowOptions;
pub use dom::{BoundingBox, Document, ElementNode, NodeId};
pub use error::{ProbeError, Result};
pub use ops::{Helper, Outcome, Properties, PropertiesList, Request};
pub use selector::{Selector, WireSelector, XPath};
pub use window::Window;
