use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;

/// Hierarchical cache key such as `["contacts", "list", {"is_active": true}]`.
///
/// Parts are stored as canonical JSON: object keys are sorted and null
/// fields dropped, so logically identical parameter objects produce equal
/// keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QueryKey {
    parts: Vec<String>,
}

impl QueryKey {
    pub fn new(root: &str) -> Self {
        Self {
            parts: vec![Value::String(root.to_string()).to_string()],
        }
    }

    /// Appends a plain string segment
    pub fn segment(mut self, segment: impl AsRef<str>) -> Self {
        self.parts
            .push(Value::String(segment.as_ref().to_string()).to_string());
        self
    }

    /// Appends any serializable value, typically an id or a filter object
    pub fn with<P: Serialize + ?Sized>(mut self, part: &P) -> Self {
        let value = serde_json::to_value(part).unwrap_or(Value::Null);
        self.parts.push(canonicalize(value).to_string());
        self
    }

    pub fn starts_with(&self, prefix: &QueryKey) -> bool {
        self.parts.starts_with(&prefix.parts)
    }

    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }
}

fn canonicalize(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map
                .into_iter()
                .filter(|(_, v)| !v.is_null())
                .map(|(k, v)| (k, canonicalize(v)))
                .collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            Value::Object(entries.into_iter().collect::<Map<String, Value>>())
        }
        Value::Array(items) => Value::Array(items.into_iter().map(canonicalize).collect()),
        other => other,
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.parts.join(","))
    }
}
