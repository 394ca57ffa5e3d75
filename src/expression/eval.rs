//! Predicate evaluation against in-memory rows.

use crate::access::Value;
use crate::expression::{
    AttributeRef, BinaryOperator, Expression, ExpressionError, ExpressionResult, UnaryOperator,
};
use std::cmp::Ordering;
use std::collections::HashMap;

/// Column values (and bound parameters) a predicate is evaluated against
#[derive(Debug, Clone, Default)]
pub struct Row {
    values: HashMap<AttributeRef, Value>,
    params: HashMap<String, Value>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, table: &str, column: &str, value: impl Into<Value>) -> Self {
        self.values
            .insert(AttributeRef::new(table, column), value.into());
        self
    }

    pub fn bind(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.params.insert(name.to_string(), value.into());
        self
    }

    pub fn get(&self, attr: &AttributeRef) -> Option<&Value> {
        self.values.get(attr)
    }
}

impl Expression {
    /// Evaluate with SQL three-valued logic; the result is Boolean or Null
    pub fn evaluate(&self, row: &Row) -> ExpressionResult<Value> {
        ExpressionEvaluator::new(row).evaluate(self)
    }

    /// WHERE-clause semantics: NULL counts as not matching
    pub fn matches(&self, row: &Row) -> ExpressionResult<bool> {
        Ok(matches!(self.evaluate(row)?, Value::Boolean(true)))
    }
}

/// Evaluator for predicates
pub struct ExpressionEvaluator<'a> {
    row: &'a Row,
}

impl<'a> ExpressionEvaluator<'a> {
    pub fn new(row: &'a Row) -> Self {
        Self { row }
    }

    pub fn evaluate(&self, expr: &Expression) -> ExpressionResult<Value> {
        match expr {
            Expression::Literal(value) => Ok(value.clone()),

            Expression::Column(attr) => {
                self.row
                    .get(attr)
                    .cloned()
                    .ok_or_else(|| ExpressionError::UnknownColumn {
                        column: attr.to_string(),
                    })
            }

            Expression::Param(param) => self
                .row
                .params
                .get(param.name())
                .cloned()
                .ok_or_else(|| ExpressionError::UnboundParameter {
                    name: param.name().to_string(),
                }),

            Expression::BinaryOp { op, left, right } => {
                let left_val = self.evaluate(left)?;
                let right_val = self.evaluate(right)?;
                self.evaluate_binary_op(*op, left_val, right_val)
            }

            Expression::UnaryOp { op, operand } => {
                let operand_val = self.evaluate(operand)?;
                self.evaluate_unary_op(*op, operand_val)
            }

            Expression::In { expr, list } => {
                let needle = self.evaluate(expr)?;
                if list.is_empty() {
                    return Ok(Value::Boolean(false));
                }
                if needle.is_null() {
                    return Ok(Value::Null);
                }
                let mut saw_null = false;
                for item in list {
                    match self.evaluate_binary_op(
                        BinaryOperator::Eq,
                        needle.clone(),
                        self.evaluate(item)?,
                    )? {
                        Value::Boolean(true) => return Ok(Value::Boolean(true)),
                        Value::Null => saw_null = true,
                        _ => {}
                    }
                }
                Ok(if saw_null {
                    Value::Null
                } else {
                    Value::Boolean(false)
                })
            }

            Expression::InSubquery { .. } => {
                Err(ExpressionError::Unsupported("IN (sub-query)".to_string()))
            }

            Expression::Between { expr, low, high } => {
                let value = self.evaluate(expr)?;
                let low = self.evaluate(low)?;
                let high = self.evaluate(high)?;
                let lower = self.evaluate_binary_op(BinaryOperator::GtEq, value.clone(), low)?;
                let upper = self.evaluate_binary_op(BinaryOperator::LtEq, value, high)?;
                self.evaluate_binary_op(BinaryOperator::And, lower, upper)
            }

            Expression::Constant(b) => Ok(Value::Boolean(*b)),

            Expression::Grouping(inner) => self.evaluate(inner),
        }
    }

    fn evaluate_binary_op(
        &self,
        op: BinaryOperator,
        left: Value,
        right: Value,
    ) -> ExpressionResult<Value> {
        match op {
            BinaryOperator::And => match (&left, &right) {
                (Value::Boolean(false), _) | (_, Value::Boolean(false)) => {
                    Ok(Value::Boolean(false))
                }
                (Value::Boolean(true), Value::Boolean(true)) => Ok(Value::Boolean(true)),
                (Value::Null | Value::Boolean(_), Value::Null | Value::Boolean(_)) => {
                    Ok(Value::Null)
                }
                _ => Err(self.invalid_operands(op, &left, &right)),
            },

            BinaryOperator::Or => match (&left, &right) {
                (Value::Boolean(true), _) | (_, Value::Boolean(true)) => Ok(Value::Boolean(true)),
                (Value::Boolean(false), Value::Boolean(false)) => Ok(Value::Boolean(false)),
                (Value::Null | Value::Boolean(_), Value::Null | Value::Boolean(_)) => {
                    Ok(Value::Null)
                }
                _ => Err(self.invalid_operands(op, &left, &right)),
            },

            _ => {
                if left.is_null() || right.is_null() {
                    return Ok(Value::Null);
                }
                let ordering = compare_values(&left, &right)
                    .ok_or_else(|| self.invalid_operands(op, &left, &right))?;
                let result = match op {
                    BinaryOperator::Eq => ordering == Ordering::Equal,
                    BinaryOperator::NotEq => ordering != Ordering::Equal,
                    BinaryOperator::Lt => ordering == Ordering::Less,
                    BinaryOperator::LtEq => ordering != Ordering::Greater,
                    BinaryOperator::Gt => ordering == Ordering::Greater,
                    BinaryOperator::GtEq => ordering != Ordering::Less,
                    BinaryOperator::And | BinaryOperator::Or => unreachable!(),
                };
                Ok(Value::Boolean(result))
            }
        }
    }

    fn evaluate_unary_op(&self, op: UnaryOperator, operand: Value) -> ExpressionResult<Value> {
        match op {
            UnaryOperator::IsNull => Ok(Value::Boolean(operand.is_null())),
        }
    }

    fn invalid_operands(&self, op: BinaryOperator, left: &Value, right: &Value) -> ExpressionError {
        ExpressionError::InvalidOperandTypes {
            operator: op.as_str().to_string(),
            left_type: left.data_type(),
            right_type: right.data_type(),
        }
    }
}

/// Numeric types compare across widths; other types only with themselves
fn compare_values(left: &Value, right: &Value) -> Option<Ordering> {
    fn numeric(value: &Value) -> Option<f64> {
        match value {
            Value::Int32(i) => Some(f64::from(*i)),
            Value::Int64(i) => Some(*i as f64),
            Value::Float64(f) => Some(*f),
            _ => None,
        }
    }

    match (left, right) {
        (Value::Int64(a), Value::Int64(b)) => Some(a.cmp(b)),
        (Value::Int32(a), Value::Int32(b)) => Some(a.cmp(b)),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        (Value::Boolean(a), Value::Boolean(b)) => Some(a.cmp(b)),
        _ => numeric(left)?.partial_cmp(&numeric(right)?),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expression::{Attribute, AttributeRef};

    fn tag() -> Attribute {
        Attribute::new(AttributeRef::new("items", "tag"), None)
    }

    #[test]
    fn test_null_equality_is_unknown() {
        let row = Row::new().with("items", "tag", Value::Null);
        let expr = Expression::binary_op(
            BinaryOperator::Eq,
            Expression::column("items", "tag"),
            Expression::literal("a"),
        );
        assert_eq!(expr.evaluate(&row).unwrap(), Value::Null);
        assert!(!expr.matches(&row).unwrap());
        assert!(tag().equals(Expression::Literal(Value::Null)).matches(&row).unwrap());
    }

    #[test]
    fn test_in_list_three_valued() {
        let with_null =
            tag().in_list(vec![Expression::literal("a"), Expression::Literal(Value::Null)]);
        let row_b = Row::new().with("items", "tag", "b");
        let row_a = Row::new().with("items", "tag", "a");
        assert_eq!(with_null.evaluate(&row_b).unwrap(), Value::Null);
        assert_eq!(with_null.evaluate(&row_a).unwrap(), Value::Boolean(true));
        assert!(!tag().in_list(vec![]).matches(&row_a).unwrap());
    }

    #[test]
    fn test_or_absorbs_unknown() {
        let expr = Expression::or(
            tag().in_list(vec![Expression::literal("a"), Expression::literal("b")]),
            tag().equals(Expression::Literal(Value::Null)),
        );
        assert!(expr.matches(&Row::new().with("items", "tag", Value::Null)).unwrap());
        assert!(expr.matches(&Row::new().with("items", "tag", "b")).unwrap());
        assert!(!expr.matches(&Row::new().with("items", "tag", "c")).unwrap());
    }

    #[test]
    fn test_between_mixed_widths() {
        let age = Attribute::new(AttributeRef::new("users", "age"), None);
        let expr = age.between(
            Some(Expression::literal(18)),
            Some(Expression::literal(65i64)),
            false,
        );
        assert!(expr.matches(&Row::new().with("users", "age", 65)).unwrap());
        assert!(!expr.matches(&Row::new().with("users", "age", 66)).unwrap());
        assert!(!expr.matches(&Row::new().with("users", "age", Value::Null)).unwrap());
    }

    #[test]
    fn test_params_and_errors() {
        let expr = tag().equals(Expression::param("t"));
        let row = Row::new().with("items", "tag", "x").bind("t", "x");
        assert!(expr.matches(&row).unwrap());

        let unbound = Row::new().with("items", "tag", "x");
        assert_eq!(
            expr.evaluate(&unbound),
            Err(ExpressionError::UnboundParameter {
                name: "t".to_string()
            })
        );

        let mismatched = Row::new().with("items", "tag", true);
        assert!(matches!(
            tag().equals(Expression::literal(1)).evaluate(&mismatched),
            Err(ExpressionError::InvalidOperandTypes { .. })
        ));

        assert!(matches!(
            tag().equals(Expression::literal(1)).evaluate(&Row::new()),
            Err(ExpressionError::UnknownColumn { .. })
        ));
    }
}
