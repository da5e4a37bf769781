use crate::collection::{validate_identifier, Document};
use crate::common::{Value, PLACEHOLDER};
use crate::errors::LedgerResult;
use itertools::Itertools;
use std::fmt::{Display, Formatter};

/// Comparison operator of a WHERE clause term.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    /// `=`, used for scalar values.
    Eq,
    /// `IN`, used for list values.
    In,
}

impl Operator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Eq => "=",
            Operator::In => "IN",
        }
    }
}

impl Display for Operator {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Infers the operator for a predicate value: `IN` for lists, `=` otherwise.
///
/// This is the only place where the operator is decided, so every statement
/// with a WHERE clause treats list values the same way.
pub fn operator_for_value(value: &Value) -> Operator {
    if value.is_array() {
        Operator::In
    } else {
        Operator::Eq
    }
}

/// One `name <op> ?` term of a WHERE clause together with the value bound to it.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldPredicate {
    name: String,
    operator: Operator,
    value: Value,
}

impl FieldPredicate {
    /// Creates a predicate whose operator is inferred from `value`.
    pub fn new(name: impl Into<String>, value: Value) -> Self {
        let operator = operator_for_value(&value);
        FieldPredicate {
            name: name.into(),
            operator,
            value,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn operator(&self) -> Operator {
        self.operator
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn into_value(self) -> Value {
        self.value
    }

    /// Renders `name <op> ?`.
    pub fn render(&self) -> String {
        format!("{} {} {}", self.name, self.operator, PLACEHOLDER)
    }
}

/// Splits a predicate map into ordered predicates, one per field.
pub fn predicates(predicate: &Document) -> LedgerResult<Vec<FieldPredicate>> {
    predicate
        .iter()
        .map(|(name, value)| -> LedgerResult<FieldPredicate> {
            validate_identifier(name)?;
            Ok(FieldPredicate::new(name.clone(), value.clone()))
        })
        .collect()
}

/// Joins predicates into a WHERE clause body: `a = ? AND b IN ?`.
pub fn join_predicates(predicates: &[FieldPredicate]) -> String {
    predicates.iter().map(FieldPredicate::render).join(" AND ")
}
