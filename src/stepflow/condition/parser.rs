//! Simple condition expression parser
//!
//! Parses expressions like:
//! - `field == 'value'`
//! - `score > 0.8`
//! - `a == 'x' and b > 5`
//! - `index < size`
//!
//! `or` binds looser than `and`; parentheses group; `not` negates.

use super::ast::{CompareOp, Expression, Literal, Operand};
use crate::adk::error::ConditionError;

/// Parse a condition expression string into an AST
pub fn parse(input: &str) -> Result<Expression, ConditionError> {
    let input = input.trim();

    if input.is_empty() {
        return Err(ConditionError::InvalidExpression(input.to_string()));
    }
    if input == "true" {
        return Ok(Expression::True);
    }
    if input == "false" {
        return Ok(Expression::False);
    }

    if let Some(inner) = strip_outer_parens(input) {
        return parse(inner);
    }

    if let Some(pos) = find_top_level(input, " or ") {
        let left = parse(&input[..pos])?;
        let right = parse(&input[pos + 4..])?;
        return Ok(Expression::Or(Box::new(left), Box::new(right)));
    }
    if let Some(pos) = find_top_level(input, " and ") {
        let left = parse(&input[..pos])?;
        let right = parse(&input[pos + 5..])?;
        return Ok(Expression::And(Box::new(left), Box::new(right)));
    }

    if let Some(rest) = input.strip_prefix("not ") {
        return Ok(Expression::Not(Box::new(parse(rest)?)));
    }

    parse_comparison(input)
}

/// Returns the inside of `( ... )` when the parentheses wrap the whole input
fn strip_outer_parens(input: &str) -> Option<&str> {
    if !input.starts_with('(') || !input.ends_with(')') {
        return None;
    }
    let mut depth = 0i32;
    let mut in_string: Option<char> = None;
    for (i, c) in input.char_indices() {
        match (in_string, c) {
            (Some(q), c) if c == q => in_string = None,
            (Some(_), _) => {}
            (None, '\'' | '"') => in_string = Some(c),
            (None, '(') => depth += 1,
            (None, ')') => {
                depth -= 1;
                if depth == 0 && i != input.len() - 1 {
                    return None;
                }
            }
            _ => {}
        }
    }
    Some(&input[1..input.len() - 1])
}

/// Byte offset of `needle` outside quotes and parentheses
fn find_top_level(input: &str, needle: &str) -> Option<usize> {
    let mut depth = 0i32;
    let mut in_string: Option<char> = None;
    for (i, c) in input.char_indices() {
        match (in_string, c) {
            (Some(q), c) if c == q => in_string = None,
            (Some(_), _) => {}
            (None, '\'' | '"') => in_string = Some(c),
            (None, '(') => depth += 1,
            (None, ')') => depth -= 1,
            _ => {
                if depth == 0 && input[i..].starts_with(needle) {
                    return Some(i);
                }
            }
        }
    }
    None
}

fn parse_comparison(input: &str) -> Result<Expression, ConditionError> {
    for op in CompareOp::ALL {
        let needle = match op {
            CompareOp::Contains => " contains ".to_string(),
            _ => op.symbol().to_string(),
        };
        if let Some(pos) = find_top_level(input, &needle) {
            let left = input[..pos].trim();
            if !is_field_path(left) {
                return Err(ConditionError::InvalidExpression(input.to_string()));
            }
            let right = parse_operand(&input[pos + needle.len()..])?;
            return Ok(Expression::Compare {
                left: left.to_string(),
                op,
                right,
            });
        }
    }

    Err(ConditionError::InvalidExpression(input.to_string()))
}

fn parse_operand(input: &str) -> Result<Operand, ConditionError> {
    let input = input.trim();
    match parse_literal(input) {
        Ok(lit) => Ok(Operand::Literal(lit)),
        Err(_) if is_field_path(input) => Ok(Operand::Field(input.to_string())),
        Err(e) => Err(e),
    }
}

fn is_field_path(input: &str) -> bool {
    !input.is_empty()
        && !input.starts_with('.')
        && !input.ends_with('.')
        && input
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
}

fn parse_literal(input: &str) -> Result<Literal, ConditionError> {
    let input = input.trim();

    if input == "null" {
        return Ok(Literal::Null);
    }
    if input == "true" {
        return Ok(Literal::Boolean(true));
    }
    if input == "false" {
        return Ok(Literal::Boolean(false));
    }

    // String (single or double quotes)
    if input.len() >= 2
        && ((input.starts_with('\'') && input.ends_with('\''))
            || (input.starts_with('"') && input.ends_with('"')))
    {
        let s = &input[1..input.len() - 1];
        return Ok(Literal::String(s.to_string()));
    }

    if let Ok(n) = input.parse::<f64>() {
        return Ok(Literal::Number(n));
    }

    Err(ConditionError::InvalidLiteral(input.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lit(left: &str, op: CompareOp, right: Literal) -> Expression {
        Expression::compare(left, op, right)
    }

    #[test]
    fn test_parse_simple_equality() {
        let expr = parse("intent == 'search'").unwrap();
        assert_eq!(
            expr,
            lit("intent", CompareOp::Eq, Literal::String("search".to_string()))
        );
    }

    #[test]
    fn test_parse_not_equal() {
        let expr = parse("status != 'done'").unwrap();
        assert_eq!(
            expr,
            lit("status", CompareOp::NotEq, Literal::String("done".to_string()))
        );
    }

    #[test]
    fn test_parse_numeric_comparisons() {
        assert_eq!(
            parse("confidence > 0.8").unwrap(),
            lit("confidence", CompareOp::Gt, Literal::Number(0.8))
        );
        assert_eq!(
            parse("score >= 5").unwrap(),
            lit("score", CompareOp::Gte, Literal::Number(5.0))
        );
        assert_eq!(
            parse("count <= 10").unwrap(),
            lit("count", CompareOp::Lte, Literal::Number(10.0))
        );
        assert_eq!(
            parse("priority < 3").unwrap(),
            lit("priority", CompareOp::Lt, Literal::Number(3.0))
        );
    }

    #[test]
    fn test_parse_field_reference() {
        let expr = parse("endpoint_index < endpoint_size").unwrap();
        assert_eq!(
            expr,
            Expression::Compare {
                left: "endpoint_index".to_string(),
                op: CompareOp::Lt,
                right: Operand::Field("endpoint_size".to_string()),
            }
        );
    }

    #[test]
    fn test_parse_boolean_and_null() {
        assert_eq!(
            parse("is_draft == false").unwrap(),
            lit("is_draft", CompareOp::Eq, Literal::Boolean(false))
        );
        assert_eq!(
            parse("error == null").unwrap(),
            lit("error", CompareOp::Eq, Literal::Null)
        );
    }

    #[test]
    fn test_parse_contains() {
        let expr = parse("tags contains 'bug'").unwrap();
        assert_eq!(
            expr,
            lit("tags", CompareOp::Contains, Literal::String("bug".to_string()))
        );
    }

    #[test]
    fn test_parse_and() {
        let expr = parse("a == 'x' and b > 5").unwrap();
        match expr {
            Expression::And(left, right) => {
                assert_eq!(
                    *left,
                    lit("a", CompareOp::Eq, Literal::String("x".to_string()))
                );
                assert_eq!(*right, lit("b", CompareOp::Gt, Literal::Number(5.0)));
            }
            _ => panic!("Expected And expression"),
        }
    }

    #[test]
    fn test_or_binds_looser_than_and() {
        let expr = parse("a == 1 and b == 2 or c == 3").unwrap();
        match expr {
            Expression::Or(left, right) => {
                assert!(matches!(*left, Expression::And(_, _)));
                assert_eq!(*right, lit("c", CompareOp::Eq, Literal::Number(3.0)));
            }
            _ => panic!("Expected Or expression"),
        }
    }

    #[test]
    fn test_parentheses_group() {
        let expr = parse("a == 1 and (b == 2 or c == 3)").unwrap();
        match expr {
            Expression::And(_, right) => assert!(matches!(*right, Expression::Or(_, _))),
            _ => panic!("Expected And expression"),
        }
    }

    #[test]
    fn test_parse_not() {
        let expr = parse("not done == true").unwrap();
        assert_eq!(
            expr,
            Expression::Not(Box::new(lit("done", CompareOp::Eq, Literal::Boolean(true))))
        );
    }

    #[test]
    fn test_quoted_keywords_are_not_split() {
        let expr = parse("note == 'this and that'").unwrap();
        assert_eq!(
            expr,
            lit(
                "note",
                CompareOp::Eq,
                Literal::String("this and that".to_string())
            )
        );
    }

    #[test]
    fn test_parse_true_false() {
        assert_eq!(parse("true").unwrap(), Expression::True);
        assert_eq!(parse("false").unwrap(), Expression::False);
    }

    #[test]
    fn test_parse_double_quotes() {
        let expr = parse(r#"name == "hello""#).unwrap();
        assert_eq!(
            expr,
            lit("name", CompareOp::Eq, Literal::String("hello".to_string()))
        );
    }

    #[test]
    fn test_display_round_trips_router_conditions() {
        for source in [
            "endpoint_index < endpoint_size and error == null",
            "web_search_loop_count > max_web_search_loop_count",
            "keep_searching == true",
            "not (a == 1 or b == 'x')",
        ] {
            assert_eq!(parse(source).unwrap().to_string(), source);
        }
    }

    #[test]
    fn test_parse_invalid() {
        assert!(parse("this is not valid").is_err());
        assert!(parse("").is_err());
        assert!(parse("a == 'unterminated").is_err());
    }
}
