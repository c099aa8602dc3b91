//! Condition expression evaluator

use super::ast::{CompareOp, Expression, Literal, Operand};
use crate::stepflow::state::WorkflowState;
use serde_json::Value;

/// Evaluate a condition expression against a state snapshot
pub fn evaluate(expr: &Expression, state: &WorkflowState) -> bool {
    match expr {
        Expression::True => true,
        Expression::False => false,
        Expression::Compare { left, op, right } => evaluate_compare(left, op, right, state),
        Expression::And(left, right) => evaluate(left, state) && evaluate(right, state),
        Expression::Or(left, right) => evaluate(left, state) || evaluate(right, state),
        Expression::Not(inner) => !evaluate(inner, state),
    }
}

fn evaluate_compare(left: &str, op: &CompareOp, right: &Operand, state: &WorkflowState) -> bool {
    let left_value = state.get_path(left);
    let right_value = match right {
        Operand::Literal(lit) => Some(literal_to_value(lit)),
        Operand::Field(path) => state.get_path(path).cloned(),
    };
    let right_value = right_value.as_ref();

    match op {
        CompareOp::Eq => values_equal(left_value, right_value),
        CompareOp::NotEq => !values_equal(left_value, right_value),
        CompareOp::Gt => compare_numbers(left_value, right_value, |a, b| a > b),
        CompareOp::Gte => compare_numbers(left_value, right_value, |a, b| a >= b),
        CompareOp::Lt => compare_numbers(left_value, right_value, |a, b| a < b),
        CompareOp::Lte => compare_numbers(left_value, right_value, |a, b| a <= b),
        CompareOp::Contains => check_contains(left_value, right_value),
    }
}

fn literal_to_value(lit: &Literal) -> Value {
    match lit {
        Literal::String(s) => Value::String(s.clone()),
        Literal::Number(n) => serde_json::Number::from_f64(*n)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        Literal::Boolean(b) => Value::Bool(*b),
        Literal::Null => Value::Null,
    }
}

static NULL: Value = Value::Null;

/// Missing values compare equal to null only
fn values_equal(left: Option<&Value>, right: Option<&Value>) -> bool {
    let left = left.unwrap_or(&NULL);
    let right = right.unwrap_or(&NULL);
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => match (a.as_f64(), b.as_f64()) {
            (Some(a), Some(b)) => (a - b).abs() < f64::EPSILON,
            _ => false,
        },
        (a, b) => a == b,
    }
}

fn compare_numbers<F>(left: Option<&Value>, right: Option<&Value>, cmp: F) -> bool
where
    F: Fn(f64, f64) -> bool,
{
    match (left.and_then(Value::as_f64), right.and_then(Value::as_f64)) {
        (Some(a), Some(b)) => cmp(a, b),
        _ => false,
    }
}

fn check_contains(left: Option<&Value>, right: Option<&Value>) -> bool {
    match (left, right) {
        // String contains substring
        (Some(Value::String(s)), Some(Value::String(substr))) => s.contains(substr.as_str()),
        // Array contains value
        (Some(Value::Array(arr)), Some(needle)) => {
            arr.iter().any(|v| values_equal(Some(v), Some(needle)))
        }
        _ => false,
    }
}
