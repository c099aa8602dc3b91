// SPDX-License-Identifier: MIT

//! Inline local `$ref` pointers (`#/components/...`)

use serde_json::{Map, Value};

use crate::adk::error::OpenApiError;

/// Return `value` with every local reference replaced by its target.
///
/// A reference that is already being expanded higher up is left as-is, so
/// recursive schemas terminate. References to other documents are kept.
pub fn dereference(value: &Value, root: &Value) -> Result<Value, OpenApiError> {
    let mut stack = Vec::new();
    resolve(value, root, &mut stack)
}

fn resolve(value: &Value, root: &Value, stack: &mut Vec<String>) -> Result<Value, OpenApiError> {
    match value {
        Value::Object(obj) => {
            if let Some(Value::String(reference)) = obj.get("$ref") {
                return resolve_ref(reference, value, root, stack);
            }
            let mut out = Map::with_capacity(obj.len());
            for (k, v) in obj {
                out.insert(k.clone(), resolve(v, root, stack)?);
            }
            Ok(Value::Object(out))
        }
        Value::Array(items) => items
            .iter()
            .map(|v| resolve(v, root, stack))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        other => Ok(other.clone()),
    }
}

fn resolve_ref(
    reference: &str,
    original: &Value,
    root: &Value,
    stack: &mut Vec<String>,
) -> Result<Value, OpenApiError> {
    let Some(pointer) = reference.strip_prefix('#') else {
        return Ok(original.clone());
    };
    if stack.iter().any(|r| r == reference) {
        return Ok(original.clone());
    }

    let target = root
        .pointer(pointer)
        .ok_or_else(|| OpenApiError::UnresolvedRef(reference.to_string()))?;

    stack.push(reference.to_string());
    let resolved = resolve(target, root, stack);
    stack.pop();
    resolved
}
