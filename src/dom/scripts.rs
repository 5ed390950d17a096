use super::document::Document;
use super::node::NodeId;
use crate::error::{ProbeError, Result};
use indexmap::IndexMap;
use serde_json::Value;
use std::rc::Rc;

/// A page-side function: receives the document, the element it runs against and the
/// caller's arguments.
pub type Snippet = Rc<dyn Fn(&mut Document, NodeId, &[Value]) -> Result<Value>>;

/// Functions the page knows how to run, keyed by their source text.
///
/// `invokeWith` looks snippets up here instead of evaluating source, so only code that
/// was registered with the page can run against its elements.
#[derive(Default)]
pub struct SnippetRegistry {
    snippets: IndexMap<String, Snippet>,
}

impl std::fmt::Debug for SnippetRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.snippets.keys()).finish()
    }
}

impl SnippetRegistry {
    /// Register (or replace) the function behind `source`
    pub fn define(
        &mut self,
        source: impl Into<String>,
        snippet: impl Fn(&mut Document, NodeId, &[Value]) -> Result<Value> + 'static,
    ) {
        let source = source.into();
        log::debug!("defining snippet {:?}", source);
        self.snippets.insert(source, Rc::new(snippet));
    }

    pub fn get(&self, source: &str) -> Result<Snippet> {
        self.snippets
            .get(source)
            .cloned()
            .ok_or_else(|| ProbeError::UndefinedSnippet(source.to_string()))
    }

    pub fn contains(&self, source: &str) -> bool {
        self.snippets.contains_key(source)
    }

    pub fn len(&self) -> usize {
        self.snippets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snippets.is_empty()
    }
}

impl Document {
    /// Run a registered snippet against `id`
    pub fn run_snippet(&mut self, source: &str, id: NodeId, args: &[Value]) -> Result<Value> {
        let snippet = self.scripts().get(source)?;
        snippet(self, id, args)
    }
}
