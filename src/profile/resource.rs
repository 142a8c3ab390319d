//! One loaded profile document and key-path queries over it.
//!
//! Paths look like `/transports/tcp/@enabled`. Each segment names a mapping
//! key; a leading `@` is accepted and ignored, so `@enabled` and `enabled`
//! address the same key. When a segment lands on a sequence, every element
//! is searched, which is how multi-valued keys are expressed.

use crate::error::{ProfileError, ResourceNotFoundError};
use serde_yaml::{Mapping, Value};
use std::io::Read;

/// A parsed profile document.
#[derive(Debug, Clone)]
pub struct Resource {
    name: String,
    document: Value,
}

impl Resource {
    /// Parse a YAML document. An empty document yields an empty mapping.
    pub fn parse(name: &str, text: &str) -> Result<Self, ProfileError> {
        let document: Value =
            serde_yaml::from_str(text).map_err(|source| ProfileError::Malformed {
                resource: name.to_string(),
                source,
            })?;
        let document = match document {
            Value::Null => Value::Mapping(Mapping::new()),
            other => other,
        };
        Ok(Self {
            name: name.to_string(),
            document,
        })
    }

    pub fn from_reader<R: Read>(name: &str, mut reader: R) -> Result<Self, ProfileError> {
        let mut text = String::new();
        reader
            .read_to_string(&mut text)
            .map_err(|e| ResourceNotFoundError {
                resource: name.to_string(),
                reason: e.to_string(),
            })?;
        Self::parse(name, &text)
    }

    pub fn empty(name: &str) -> Self {
        Self {
            name: name.to_string(),
            document: Value::Mapping(Mapping::new()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// All nodes reached by `path`, in document order.
    pub fn select(&self, path: &str) -> Vec<&Value> {
        let mut current = vec![&self.document];
        for key in segments(path) {
            let mut next = Vec::new();
            for node in current {
                for candidate in spread(node) {
                    if let Value::Mapping(map) = candidate {
                        if let Some(found) = map.get(key) {
                            next.push(found);
                        }
                    }
                }
            }
            current = next;
        }
        current
    }

    /// Raw scalar strings reached by `path`, sequences flattened.
    pub fn scalars(&self, path: &str) -> Vec<String> {
        self.select(path)
            .into_iter()
            .flat_map(spread)
            .filter_map(scalar_to_string)
            .collect()
    }

    pub fn contains(&self, path: &str) -> bool {
        !self.select(path).is_empty()
    }

    /// Set the scalar at `path`, creating intermediate sections.
    pub fn set(&mut self, path: &str, value: &str) {
        let keys: Vec<&str> = segments(path).collect();
        let Some((last, parents)) = keys.split_last() else {
            return;
        };

        let mut node = &mut self.document;
        for key in parents {
            node = child_mapping(node, key);
        }
        if let Value::Mapping(map) = ensure_mapping(node) {
            map.insert(Value::String((*last).to_string()), Value::String(value.to_string()));
        }
    }
}

fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/')
        .filter(|s| !s.is_empty())
        .map(|s| s.strip_prefix('@').unwrap_or(s))
}

/// A sequence stands for each of its elements; anything else for itself.
fn spread(node: &Value) -> Vec<&Value> {
    match node {
        Value::Sequence(items) => items.iter().collect(),
        other => vec![other],
    }
}

fn scalar_to_string(node: &Value) -> Option<String> {
    match node {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn ensure_mapping(node: &mut Value) -> &mut Value {
    if !node.is_mapping() {
        *node = Value::Mapping(Mapping::new());
    }
    node
}

fn child_mapping<'a>(node: &'a mut Value, key: &str) -> &'a mut Value {
    let key_value = Value::String(key.to_string());
    match ensure_mapping(node) {
        Value::Mapping(map) => {
            let child = map
                .entry(key_value)
                .or_insert_with(|| Value::Mapping(Mapping::new()));
            ensure_mapping(child)
        }
        // ensure_mapping always leaves a mapping behind
        other => other,
    }
}
