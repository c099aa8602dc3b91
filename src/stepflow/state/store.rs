// SPDX-License-Identifier: MIT

//! Runtime state snapshots for workflow execution

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::Arc;

use super::schema::{FieldType, ReducerType, StateSchema};
use super::update::StateUpdate;
use crate::adk::error::StateError;

/// A typed state record.
///
/// The schema is derived from `Self::default()`, so every field a step or
/// router reads always has a defined starting value.
pub trait StateRecord: Serialize + DeserializeOwned + Default {
    /// Per-field reducers; fields not listed use overwrite
    fn reducers() -> Vec<(&'static str, ReducerType)> {
        Vec::new()
    }

    fn schema() -> Result<StateSchema, StateError> {
        StateSchema::from_record(&Self::default(), &Self::reducers())
    }
}

/// Immutable workflow state snapshot.
///
/// Snapshots never change in place: [`WorkflowState::merge`] returns a new
/// snapshot, so a step only ever sees a read view.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkflowState {
    schema: Arc<StateSchema>,
    fields: Map<String, Value>,
}

impl WorkflowState {
    /// Create a state from a schema and an initial mapping.
    ///
    /// Omitted fields take the schema default (or the type's zero value);
    /// initial keys outside the schema are rejected.
    pub fn new(schema: StateSchema, initial: Map<String, Value>) -> Result<Self, StateError> {
        let mut fields = Map::new();
        for (name, def) in &schema.fields {
            let value = def
                .default
                .clone()
                .unwrap_or_else(|| def.field_type.zero_value());
            fields.insert(name.clone(), value);
        }

        for (name, value) in initial {
            let def = schema.get(&name).ok_or_else(|| StateError::missing(&name))?;
            check_type(&name, def.field_type, &value)?;
            fields.insert(name, value);
        }

        Ok(Self {
            schema: Arc::new(schema),
            fields,
        })
    }

    /// Create a state holding only schema defaults
    pub fn with_defaults(schema: StateSchema) -> Result<Self, StateError> {
        Self::new(schema, Map::new())
    }

    /// Create a state from a typed record
    pub fn from_record<T: StateRecord>(record: &T) -> Result<Self, StateError> {
        let schema = T::schema()?;
        let value = serde_json::to_value(record).map_err(|e| StateError::Record(e.to_string()))?;
        match value {
            Value::Object(initial) => Self::new(schema, initial),
            _ => Err(StateError::Record(
                "state record must serialize to an object".to_string(),
            )),
        }
    }

    /// Get a field value; undeclared fields are an error
    pub fn get(&self, key: &str) -> Result<&Value, StateError> {
        self.fields.get(key).ok_or_else(|| StateError::missing(key))
    }

    /// Get a nested field value using dot notation (e.g., "result.intent")
    pub fn get_path(&self, path: &str) -> Option<&Value> {
        let mut parts = path.split('.');
        let mut current = self.fields.get(parts.next()?)?;
        for part in parts {
            current = match current {
                Value::Array(items) => items.get(part.parse::<usize>().ok()?)?,
                other => other.get(part)?,
            };
        }
        Some(current)
    }

    /// Decode the whole state into a typed view
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, StateError> {
        serde_json::from_value(self.to_json()).map_err(|e| StateError::Record(e.to_string()))
    }

    /// Decode a single field into a typed value
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Result<T, StateError> {
        let value = self.get(key)?.clone();
        serde_json::from_value(value).map_err(|e| StateError::Record(format!("{}: {}", key, e)))
    }

    /// Produce a new snapshot with `update` applied through each field's reducer
    pub fn merge(&self, update: &StateUpdate) -> Result<Self, StateError> {
        let mut next = self.clone();
        for (key, value) in update.iter() {
            next.apply(key, value.clone())?;
        }
        Ok(next)
    }

    fn apply(&mut self, key: &str, value: Value) -> Result<(), StateError> {
        let def = self.schema.get(key).ok_or_else(|| StateError::missing(key))?;
        let field_type = def.field_type;
        let reducer = def.reducer;

        match reducer {
            ReducerType::Overwrite => {
                check_type(key, field_type, &value)?;
                self.fields.insert(key.to_string(), value);
            }
            ReducerType::Append => {
                let arr = self
                    .fields
                    .entry(key.to_string())
                    .or_insert(Value::Array(vec![]));
                if arr.is_null() {
                    *arr = Value::Array(vec![]);
                }
                if let Value::Array(a) = arr {
                    match value {
                        Value::Array(new_items) => a.extend(new_items),
                        other => a.push(other),
                    }
                }
            }
            ReducerType::Max | ReducerType::Min => {
                let new = value.as_f64().ok_or_else(|| mismatch(key, "number", &value))?;
                let current = self.fields.get(key).and_then(|v| v.as_f64());
                let replace = match (current, reducer) {
                    (None, _) => true,
                    (Some(cur), ReducerType::Max) => new > cur,
                    (Some(cur), _) => new < cur,
                };
                if replace {
                    self.fields.insert(key.to_string(), value);
                }
            }
            ReducerType::Merge => {
                let new_obj = match value {
                    Value::Object(obj) => obj,
                    other => return Err(mismatch(key, "object", &other)),
                };
                let current = self
                    .fields
                    .entry(key.to_string())
                    .or_insert(Value::Object(Map::new()));
                if !current.is_object() {
                    *current = Value::Object(Map::new());
                }
                if let Value::Object(current_obj) = current {
                    for (k, v) in new_obj {
                        current_obj.insert(k, v);
                    }
                }
            }
        }
        Ok(())
    }

    /// Convert state to JSON object
    pub fn to_json(&self) -> Value {
        Value::Object(self.fields.clone())
    }

    /// Get all field names
    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.fields.keys()
    }

    pub fn schema(&self) -> &StateSchema {
        &self.schema
    }
}

fn check_type(key: &str, field_type: FieldType, value: &Value) -> Result<(), StateError> {
    if field_type.accepts(value) {
        Ok(())
    } else {
        Err(mismatch(key, field_type.name(), value))
    }
}

fn mismatch(key: &str, expected: &str, value: &Value) -> StateError {
    StateError::TypeMismatch {
        field: key.to_string(),
        expected: expected.to_string(),
        found: FieldType::of(value).name().to_string(),
    }
}
