//! Dotted property paths.
//!
//! A path like `dataset.userName` or `payload.items.0` is walked one segment at a time
//! from the element. Each step moves a [`Cursor`]: onto another node, a node list, one of
//! the `dataset`/`style` views, a location inside an expando value, or a plain value.

use crate::dom::props::{camel_to_kebab, js_string};
use crate::dom::{Document, Member, NodeId};
use serde_json::{Map, Value};
use std::fmt;

/// A parsed dotted path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyPath {
    source: String,
    segments: Vec<String>,
}

/// Where a path walk currently points
#[derive(Debug, Clone, PartialEq)]
enum Cursor {
    Node(NodeId),
    Nodes(Vec<NodeId>),
    Dataset(NodeId),
    Style(NodeId),
    /// A location inside an expando, addressed from the element
    Expando(NodeId, Vec<String>),
    Value(Value),
}

impl From<Member> for Cursor {
    fn from(member: Member) -> Self {
        match member {
            Member::Value(value) => Cursor::Value(value),
            Member::Node(id) => Cursor::Node(id),
            Member::Nodes(ids) => Cursor::Nodes(ids),
            Member::Dataset(id) => Cursor::Dataset(id),
            Member::Style(id) => Cursor::Style(id),
            Member::Method => Cursor::Value(Value::Null),
        }
    }
}

/// Child of a plain JSON value: object keys, plus `length` and indexes on arrays and strings
fn value_child(value: &Value, key: &str) -> Option<Value> {
    match value {
        Value::Object(map) => map.get(key).cloned(),
        Value::Array(items) if key == "length" => Some(Value::from(items.len())),
        Value::Array(items) => key.parse::<usize>().ok().and_then(|i| items.get(i).cloned()),
        Value::String(s) if key == "length" => Some(Value::from(s.chars().count())),
        Value::String(s) => key
            .parse::<usize>()
            .ok()
            .and_then(|i| s.chars().nth(i))
            .map(|c| Value::String(c.to_string())),
        _ => None,
    }
}

fn expando_value(doc: &Document, id: NodeId, path: &[String]) -> Option<Value> {
    let (first, rest) = path.split_first()?;
    let root = doc.element(id)?.expando.get(first)?.clone();
    rest.iter().try_fold(root, |value, key| value_child(&value, key))
}

fn expando_slot<'a>(doc: &'a mut Document, id: NodeId, path: &[String]) -> Option<&'a mut Value> {
    let (first, rest) = path.split_first()?;
    let mut slot = doc.element_mut(id)?.expando.get_mut(first)?;
    for key in rest {
        slot = match slot {
            Value::Object(map) => map.get_mut(key)?,
            Value::Array(items) => items.get_mut(key.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(slot)
}

/// How far past its current end a single write may grow an array
const MAX_ARRAY_GROWTH: usize = 1 << 16;

/// Checked new length for an array of `current` items
fn array_length(current: usize, requested: Option<usize>) -> Option<usize> {
    requested.filter(|&len| len <= current.saturating_add(MAX_ARRAY_GROWTH))
}

fn assign_child(target: &mut Value, key: &str, value: Value) -> Result<(), String> {
    match target {
        Value::Object(map) => {
            map.insert(key.to_string(), value);
            Ok(())
        }
        Value::Array(items) if key == "length" => {
            let requested = value.as_u64().and_then(|len| usize::try_from(len).ok());
            let len = array_length(items.len(), requested)
                .ok_or_else(|| format!("invalid array length {}", value))?;
            items.resize(len, Value::Null);
            Ok(())
        }
        Value::Array(items) => {
            let index = key
                .parse::<usize>()
                .map_err(|_| format!("cannot set property \"{}\" on an array", key))?;
            if index >= items.len() {
                let len = array_length(items.len(), index.checked_add(1))
                    .ok_or_else(|| format!("invalid array index {}", key))?;
                items.resize(len, Value::Null);
            }
            items[index] = value;
            Ok(())
        }
        _ => Err(format!("cannot set property \"{}\" on a primitive value", key)),
    }
}

impl Cursor {
    fn step(self, doc: &Document, key: &str) -> Option<Cursor> {
        match self {
            Cursor::Node(id) => {
                if let Some(member) = doc.builtin_member(id, key) {
                    return Some(member.into());
                }
                let has_expando = doc.element(id).is_some_and(|e| e.expando.contains_key(key));
                has_expando.then(|| Cursor::Expando(id, vec![key.to_string()]))
            }
            Cursor::Nodes(ids) => {
                if key == "length" {
                    return Some(Cursor::Value(Value::from(ids.len())));
                }
                key.parse::<usize>()
                    .ok()
                    .and_then(|i| ids.get(i).copied())
                    .map(Cursor::Node)
            }
            Cursor::Dataset(id) => doc
                .dataset_get(id, key)
                .map(|v| Cursor::Value(Value::String(v))),
            Cursor::Style(id) => {
                let value = doc.style_value(id, &camel_to_kebab(key)).unwrap_or_default();
                Some(Cursor::Value(Value::String(value)))
            }
            Cursor::Expando(id, mut path) => {
                let current = expando_value(doc, id, &path)?;
                value_child(&current, key)?;
                path.push(key.to_string());
                Some(Cursor::Expando(id, path))
            }
            Cursor::Value(value) => value_child(&value, key).map(Cursor::Value),
        }
    }

    fn into_value(self, doc: &Document) -> Value {
        match self {
            Cursor::Node(id) => id.to_value(),
            Cursor::Nodes(ids) => Value::Array(ids.into_iter().map(NodeId::to_value).collect()),
            Cursor::Dataset(id) => Value::Object(doc.dataset(id)),
            Cursor::Style(id) => Value::Object(doc.style_object(id)),
            Cursor::Expando(id, path) => expando_value(doc, id, &path).unwrap_or(Value::Null),
            Cursor::Value(value) => value,
        }
    }
}

impl PropertyPath {
    pub fn parse(source: &str) -> Self {
        Self {
            source: source.to_string(),
            segments: source.split('.').map(str::to_string).collect(),
        }
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    fn walk<'a>(doc: &Document, id: NodeId, segments: impl IntoIterator<Item = &'a String>) -> Option<Cursor> {
        segments
            .into_iter()
            .try_fold(Cursor::Node(id), |cursor, key| cursor.step(doc, key))
    }

    /// Whether every segment resolves on its predecessor
    pub fn exists(&self, doc: &Document, id: NodeId) -> bool {
        Self::walk(doc, id, &self.segments).is_some()
    }

    /// The value at the end of the path. `None` when a segment does not resolve, which is
    /// distinct from `Some(Value::Null)` for a property that exists and holds nothing.
    pub fn get(&self, doc: &Document, id: NodeId) -> Option<Value> {
        Self::walk(doc, id, &self.segments).map(|cursor| cursor.into_value(doc))
    }

    /// Walk all but the last segment, then assign the last one
    pub fn set(&self, doc: &mut Document, id: NodeId, value: Value) -> Result<(), String> {
        let Some((last, parents)) = self.segments.split_last() else {
            return Err("empty property path".to_string());
        };
        let mut cursor = Cursor::Node(id);
        for key in parents {
            cursor = cursor
                .step(doc, key)
                .ok_or_else(|| format!("could not resolve property component \".{}\"", key))?;
        }
        match cursor {
            Cursor::Node(node) => doc.set_member(node, last, value),
            Cursor::Dataset(node) => {
                doc.dataset_set(node, last, &js_string(&value));
                Ok(())
            }
            Cursor::Style(node) => {
                doc.set_style(node, &camel_to_kebab(last), &js_string(&value));
                Ok(())
            }
            Cursor::Expando(node, path) => match expando_slot(doc, node, &path) {
                Some(slot) => assign_child(slot, last, value),
                None => Err(format!("cannot set property \"{}\" on a primitive value", last)),
            },
            Cursor::Nodes(_) => Err(format!("property \"{}\" is read-only", last)),
            Cursor::Value(Value::Object(_) | Value::Array(_)) => Err(format!("property \"{}\" is read-only", last)),
            Cursor::Value(_) => Err(format!("cannot set property \"{}\" on a primitive value", last)),
        }
    }
}

impl From<&str> for PropertyPath {
    fn from(source: &str) -> Self {
        PropertyPath::parse(source)
    }
}

impl fmt::Display for PropertyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// Read several paths into one object keyed by path, `null` for paths that do not resolve
pub fn collect(doc: &Document, id: NodeId, paths: &[String]) -> Map<String, Value> {
    paths
        .iter()
        .map(|path| {
            let value = PropertyPath::parse(path).get(doc, id).unwrap_or(Value::Null);
            (path.clone(), value)
        })
        .collect()
}
