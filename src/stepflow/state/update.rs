// SPDX-License-Identifier: MIT

//! Partial state updates returned by steps

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

use crate::adk::error::StateError;

/// An ordered partial mapping of field name to new value
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StateUpdate {
    values: Map<String, Value>,
}

impl StateUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style setter
    pub fn set(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(key.into(), value.into());
    }

    /// Build an update from any serializable value that encodes to an object
    pub fn from_serializable<T: Serialize>(value: &T) -> Result<Self, StateError> {
        let value = serde_json::to_value(value).map_err(|e| StateError::Record(e.to_string()))?;
        match value {
            Value::Object(values) => Ok(Self { values }),
            other => Err(StateError::Record(format!(
                "update must be an object, got {}",
                other
            ))),
        }
    }

    /// Fold another update on top of this one; later keys win.
    ///
    /// The fold is key-wise overwrite and knows nothing about reducers. For
    /// overwrite fields, merging the extended update equals merging both in
    /// order; for append, max, min or merge fields the earlier value is
    /// dropped here, whereas sequential merges would combine both.
    pub fn extend(&mut self, other: StateUpdate) {
        for (k, v) in other.values {
            self.values.insert(k, v);
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.values.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.values.keys()
    }

    pub fn into_inner(self) -> Map<String, Value> {
        self.values
    }
}

impl From<Map<String, Value>> for StateUpdate {
    fn from(values: Map<String, Value>) -> Self {
        Self { values }
    }
}

impl FromIterator<(String, Value)> for StateUpdate {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

impl fmt::Display for StateUpdate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match serde_json::to_string(&self.values) {
            Ok(s) => write!(f, "{}", s),
            Err(_) => write!(f, "{:?}", self.values),
        }
    }
}
