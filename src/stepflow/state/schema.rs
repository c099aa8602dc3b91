// SPDX-License-Identifier: MIT

//! State schema definitions

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::adk::error::StateError;

/// Schema defining the workflow state structure
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
pub struct StateSchema {
    /// Field definitions
    #[serde(flatten)]
    pub fields: BTreeMap<String, StateFieldDef>,
}

/// Definition of a single state field
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct StateFieldDef {
    /// Type of the field
    #[serde(rename = "type")]
    pub field_type: FieldType,
    /// Reducer for merging values
    #[serde(default)]
    pub reducer: ReducerType,
    /// Default value
    pub default: Option<Value>,
}

/// Supported field types
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    String,
    Number,
    Boolean,
    Array,
    Object,
    /// Any JSON value, used for optional fields whose default is null
    Any,
}

/// Reducer types for merging values into state
#[derive(Debug, Clone, Copy, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ReducerType {
    /// Replace the value (default)
    #[default]
    Overwrite,
    /// Append to array
    Append,
    /// Keep maximum value
    Max,
    /// Keep minimum value
    Min,
    /// Shallow merge objects
    Merge,
}

impl FieldType {
    /// Infer the field type from a default value
    pub fn of(value: &Value) -> Self {
        match value {
            Value::String(_) => FieldType::String,
            Value::Number(_) => FieldType::Number,
            Value::Bool(_) => FieldType::Boolean,
            Value::Array(_) => FieldType::Array,
            Value::Object(_) => FieldType::Object,
            Value::Null => FieldType::Any,
        }
    }

    /// Only `Any` accepts null; a record field that starts out null is
    /// already inferred as `Any`
    pub fn accepts(&self, value: &Value) -> bool {
        matches!(
            (self, value),
            (FieldType::Any, _)
                | (FieldType::String, Value::String(_))
                | (FieldType::Number, Value::Number(_))
                | (FieldType::Boolean, Value::Bool(_))
                | (FieldType::Array, Value::Array(_))
                | (FieldType::Object, Value::Object(_))
        )
    }

    /// Value a field starts with when the schema gives no default
    pub fn zero_value(&self) -> Value {
        match self {
            FieldType::String => Value::String(String::new()),
            FieldType::Number => Value::from(0),
            FieldType::Boolean => Value::Bool(false),
            FieldType::Array => Value::Array(vec![]),
            FieldType::Object => Value::Object(serde_json::Map::new()),
            FieldType::Any => Value::Null,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Number => "number",
            FieldType::Boolean => "boolean",
            FieldType::Array => "array",
            FieldType::Object => "object",
            FieldType::Any => "any",
        }
    }
}

impl StateSchema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a field definition, builder style
    pub fn field(
        mut self,
        name: impl Into<String>,
        field_type: FieldType,
        reducer: ReducerType,
        default: Option<Value>,
    ) -> Self {
        self.fields.insert(
            name.into(),
            StateFieldDef {
                field_type,
                reducer,
                default,
            },
        );
        self
    }

    /// Derive a schema from a serializable record's default value.
    ///
    /// Every top-level key becomes a field typed after its value, with that
    /// value as the default. `reducers` overrides the overwrite reducer.
    pub fn from_record<T: Serialize>(
        record: &T,
        reducers: &[(&str, ReducerType)],
    ) -> Result<Self, StateError> {
        let value = serde_json::to_value(record).map_err(|e| StateError::Record(e.to_string()))?;
        let Value::Object(map) = value else {
            return Err(StateError::Record(
                "state record must serialize to an object".to_string(),
            ));
        };

        let mut schema = StateSchema::new();
        for (name, default) in map {
            schema = schema.field(
                name,
                FieldType::of(&default),
                ReducerType::Overwrite,
                Some(default),
            );
        }

        for (name, reducer) in reducers {
            let def = schema
                .fields
                .get_mut(*name)
                .ok_or_else(|| StateError::missing(*name))?;
            def.reducer = *reducer;
        }

        Ok(schema)
    }

    pub fn get(&self, name: &str) -> Option<&StateFieldDef> {
        self.fields.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }
}
