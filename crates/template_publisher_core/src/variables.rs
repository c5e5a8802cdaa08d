use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::properties::PropertyError;

/// Substitution context handed to the template renderer.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
#[serde(transparent)]
pub struct TemplateVariables(BTreeMap<String, Value>);

impl TemplateVariables {
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// Returns the previous value when `name` was already present.
    pub fn insert(&mut self, name: impl Into<String>, value: Value) -> Option<Value> {
        self.0.insert(name.into(), value)
    }
}

impl From<Map<String, Value>> for TemplateVariables {
    fn from(values: Map<String, Value>) -> Self {
        Self(values.into_iter().collect())
    }
}

/// Splits on every `,` without trimming; empty segments are kept in order.
pub fn split_comma_list(value: &str) -> Vec<String> {
    value.split(',').map(str::to_string).collect()
}

/// Overlays comma-list expansions onto the harness literals.
///
/// Returns the merged variables plus the names whose literal value was
/// replaced by a comma-list value.
pub fn merge_variables(
    harness_literals: Map<String, Value>,
    comma_lists: &Map<String, Value>,
) -> Result<(TemplateVariables, Vec<String>), PropertyError> {
    let mut variables = TemplateVariables::from(harness_literals);
    let mut overridden = Vec::new();

    for (name, raw) in comma_lists {
        let Some(text) = raw.as_str() else {
            return Err(PropertyError::CommaListNotString { name: name.clone() });
        };
        let items = split_comma_list(text)
            .into_iter()
            .map(Value::String)
            .collect();
        if variables.insert(name.clone(), Value::Array(items)).is_some() {
            overridden.push(name.clone());
        }
    }

    Ok((variables, overridden))
}
