//! Live page model
//!
//! This module provides the document the page helper operates on. It includes:
//! - Document: arena of nodes addressed by `NodeId` handles
//! - ElementNode: serializable description of an element subtree, used to build documents
//! - CSS selector and XPath evaluation
//! - Form control state, focus, clicks and event dispatch
//! - Member reflection (`get_member` / `set_member` / `call_method`)
//! - SnippetRegistry: page-side functions reachable through `invokeWith`

pub(crate) mod css;
pub mod document;
pub mod element;
pub mod events;
mod form;
pub mod node;
pub mod props;
pub mod scripts;
pub(crate) mod xpath;

pub use document::Document;
pub use element::{BoundingBox, ElementNode};
pub use events::{Event, ListenerFn};
pub use node::NodeId;
pub use props::{Assign, Member};
pub use scripts::{Snippet, SnippetRegistry};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_element_node_export() {
        let element = ElementNode::new("div");
        assert_eq!(element.tag_name, "div");
    }

    #[test]
    fn test_document_from_elements() {
        let doc = Document::from_elements([ElementNode::new("p").with_text("hello"), ElementNode::new("p")]);
        assert_eq!(doc.element_children(doc.body()).len(), 2);
        assert_eq!(doc.text_content(doc.body()), "hello");
    }
}
