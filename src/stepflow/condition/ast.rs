// SPDX-License-Identifier: MIT

//! Parsed form of a router condition

use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// `field <op> operand`
    Compare {
        left: String,
        op: CompareOp,
        right: Operand,
    },
    And(Box<Expression>, Box<Expression>),
    Or(Box<Expression>, Box<Expression>),
    Not(Box<Expression>),
    True,
    False,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    NotEq,
    Gt,
    Gte,
    Lt,
    Lte,
    /// Substring or array membership
    Contains,
}

impl CompareOp {
    /// Operators in the order the parser tries them; two-character symbols
    /// come before their one-character prefixes
    pub const ALL: [CompareOp; 7] = [
        CompareOp::Eq,
        CompareOp::NotEq,
        CompareOp::Gte,
        CompareOp::Lte,
        CompareOp::Gt,
        CompareOp::Lt,
        CompareOp::Contains,
    ];

    pub fn symbol(self) -> &'static str {
        match self {
            CompareOp::Eq => "==",
            CompareOp::NotEq => "!=",
            CompareOp::Gt => ">",
            CompareOp::Gte => ">=",
            CompareOp::Lt => "<",
            CompareOp::Lte => "<=",
            CompareOp::Contains => "contains",
        }
    }
}

/// Right-hand side of a comparison: a literal or another state field
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Literal(Literal),
    /// Dot path into the state, e.g. `endpoint_size`
    Field(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    String(String),
    Number(f64),
    Boolean(bool),
    Null,
}

impl Expression {
    pub fn compare(left: impl Into<String>, op: CompareOp, right: Literal) -> Self {
        Expression::Compare {
            left: left.into(),
            op,
            right: Operand::Literal(right),
        }
    }

    /// Compare two state fields, e.g. `endpoint_index < endpoint_size`
    pub fn compare_fields(left: impl Into<String>, op: CompareOp, right: impl Into<String>) -> Self {
        Expression::Compare {
            left: left.into(),
            op,
            right: Operand::Field(right.into()),
        }
    }

    /// Every state path the expression reads, left to right
    pub fn fields(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_fields(&mut out);
        out
    }

    fn collect_fields<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Expression::Compare { left, right, .. } => {
                out.push(left);
                if let Operand::Field(path) = right {
                    out.push(path);
                }
            }
            Expression::And(l, r) | Expression::Or(l, r) => {
                l.collect_fields(out);
                r.collect_fields(out);
            }
            Expression::Not(inner) => inner.collect_fields(out),
            Expression::True | Expression::False => {}
        }
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::String(s) => write!(f, "'{}'", s),
            Literal::Number(n) => write!(f, "{}", n),
            Literal::Boolean(b) => write!(f, "{}", b),
            Literal::Null => f.write_str("null"),
        }
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Literal(lit) => lit.fmt(f),
            Operand::Field(path) => f.write_str(path),
        }
    }
}

/// Canonical text; `and` binds tighter than `or`, so only `or` inside `and`
/// or `not` needs parentheses
impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::True => f.write_str("true"),
            Expression::False => f.write_str("false"),
            Expression::Compare { left, op, right } => write!(f, "{} {} {}", left, op, right),
            Expression::Or(left, right) => write!(f, "{} or {}", left, right),
            Expression::And(left, right) => {
                write_grouped(f, left)?;
                f.write_str(" and ")?;
                write_grouped(f, right)
            }
            Expression::Not(inner) => {
                f.write_str("not ")?;
                match inner.as_ref() {
                    Expression::Compare { .. } | Expression::True | Expression::False => {
                        inner.fmt(f)
                    }
                    _ => write!(f, "({})", inner),
                }
            }
        }
    }
}

fn write_grouped(f: &mut fmt::Formatter<'_>, expr: &Expression) -> fmt::Result {
    match expr {
        Expression::Or(..) => write!(f, "({})", expr),
        _ => fmt::Display::fmt(expr, f),
    }
}
