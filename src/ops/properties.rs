//! Typed access to `getProperties` and `getPropertiesForEach` payloads.
//!
//! Getters never fail: a missing, `null` or mistyped entry reads as the zero value of the
//! requested type.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One element's properties, keyed by path
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Properties(IndexMap<String, Value>);

fn as_string(value: Option<&Value>) -> String {
    value.and_then(Value::as_str).unwrap_or_default().to_string()
}

fn as_array(value: Option<&Value>) -> Vec<Value> {
    value.and_then(Value::as_array).cloned().unwrap_or_default()
}

impl Properties {
    /// Wrap a `getProperties` payload. Anything other than an object is empty.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(map) => Properties(map.into_iter().collect()),
            _ => Properties::default(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key).filter(|v| !v.is_null())
    }

    pub fn get_str(&self, key: &str) -> String {
        as_string(self.get(key))
    }

    pub fn get_i64(&self, key: &str) -> i64 {
        self.get(key)
            .and_then(|v| v.as_i64().or_else(|| v.as_f64().map(|f| f as i64)))
            .unwrap_or_default()
    }

    pub fn get_f64(&self, key: &str) -> f64 {
        self.get(key).and_then(Value::as_f64).unwrap_or_default()
    }

    pub fn get_bool(&self, key: &str) -> bool {
        self.get(key).and_then(Value::as_bool).unwrap_or_default()
    }

    /// String entries of an array; non-string items read as `""`
    pub fn get_strings(&self, key: &str) -> Vec<String> {
        as_array(self.get(key))
            .iter()
            .map(|v| as_string(Some(v)))
            .collect()
    }

    pub fn get_array(&self, key: &str) -> Vec<Value> {
        as_array(self.get(key))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Properties of every matched element, in match order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PropertiesList(Vec<Properties>);

impl PropertiesList {
    /// Wrap a `getPropertiesForEach` payload
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Array(items) => PropertiesList(items.into_iter().map(Properties::from_value).collect()),
            _ => PropertiesList::default(),
        }
    }

    /// First entry whose `key` satisfies `matches`. Missing entries are tested as `null`.
    pub fn find(&self, key: &str, matches: impl Fn(&Value) -> bool) -> Option<&Properties> {
        self.0
            .iter()
            .find(|p| matches(p.0.get(key).unwrap_or(&Value::Null)))
    }

    /// Every entry whose `key` satisfies `matches`
    pub fn filter(&self, key: &str, matches: impl Fn(&Value) -> bool) -> PropertiesList {
        PropertiesList(
            self.0
                .iter()
                .filter(|p| matches(p.0.get(key).unwrap_or(&Value::Null)))
                .cloned()
                .collect(),
        )
    }

    /// One value per entry, `null` where it is missing
    pub fn get(&self, key: &str) -> Vec<Value> {
        self.0
            .iter()
            .map(|p| p.get(key).cloned().unwrap_or(Value::Null))
            .collect()
    }

    pub fn get_str(&self, key: &str) -> Vec<String> {
        self.0.iter().map(|p| p.get_str(key)).collect()
    }

    pub fn get_i64(&self, key: &str) -> Vec<i64> {
        self.0.iter().map(|p| p.get_i64(key)).collect()
    }

    pub fn get_f64(&self, key: &str) -> Vec<f64> {
        self.0.iter().map(|p| p.get_f64(key)).collect()
    }

    pub fn get_bool(&self, key: &str) -> Vec<bool> {
        self.0.iter().map(|p| p.get_bool(key)).collect()
    }

    pub fn get_strings(&self, key: &str) -> Vec<Vec<String>> {
        self.0.iter().map(|p| p.get_strings(key)).collect()
    }

    pub fn get_array(&self, key: &str) -> Vec<Vec<Value>> {
        self.0.iter().map(|p| p.get_array(key)).collect()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Properties> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<'a> IntoIterator for &'a PropertiesList {
    type Item = &'a Properties;
    type IntoIter = std::slice::Iter<'a, Properties>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
