//! Predicate tree definitions.

use crate::access::{DataType, Value};
use crate::expression::operator::{BinaryOperator, UnaryOperator};
use std::fmt;

/// A (table, column) pair identifying a predicate operand
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AttributeRef {
    pub table: String,
    pub column: String,
}

impl AttributeRef {
    pub fn new(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            column: column.into(),
        }
    }
}

impl fmt::Display for AttributeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{}\".\"{}\"", self.table, self.column)
    }
}

/// Opaque bound parameter. Never cast; the executor supplies its value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BindParam(pub String);

impl BindParam {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

/// A sub-query whose rows feed an `IN (...)` predicate
#[derive(Debug, Clone, PartialEq)]
pub struct SubQuery {
    pub entity: String,
    pub table: String,
    /// Selected column. `None` means the target entity's primary key.
    pub select: Option<String>,
    pub predicates: Vec<Expression>,
}

impl SubQuery {
    pub fn new(entity: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            entity: entity.into(),
            table: table.into(),
            select: None,
            predicates: Vec::new(),
        }
    }

    pub fn select(mut self, column: impl Into<String>) -> Self {
        self.select = Some(column.into());
        self
    }

    pub fn filter(mut self, predicate: Expression) -> Self {
        self.predicates.push(predicate);
        self
    }
}

impl fmt::Display for SubQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.select {
            Some(column) => write!(
                f,
                "SELECT {} FROM \"{}\"",
                AttributeRef::new(self.table.as_str(), column.as_str()),
                self.table
            )?,
            None => write!(f, "SELECT * FROM \"{}\"", self.table)?,
        }
        for (i, predicate) in self.predicates.iter().enumerate() {
            let keyword = if i == 0 { "WHERE" } else { "AND" };
            write!(f, " {} {}", keyword, predicate)?;
        }
        Ok(())
    }
}

/// Predicate tree node
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// Literal constant value
    Literal(Value),

    /// Column reference
    Column(AttributeRef),

    /// Bound parameter placeholder
    Param(BindParam),

    /// Binary operation
    BinaryOp {
        op: BinaryOperator,
        left: Box<Expression>,
        right: Box<Expression>,
    },

    /// Unary operation
    UnaryOp {
        op: UnaryOperator,
        operand: Box<Expression>,
    },

    /// Membership in a literal list. An empty list matches nothing.
    In {
        expr: Box<Expression>,
        list: Vec<Expression>,
    },

    /// Membership in the rows of a sub-query
    InSubquery {
        expr: Box<Expression>,
        subquery: Box<SubQuery>,
    },

    /// Inclusive range test
    Between {
        expr: Box<Expression>,
        low: Box<Expression>,
        high: Box<Expression>,
    },

    /// Always true (`1=1`) or always false (`1=0`)
    Constant(bool),

    /// Parenthesised sub-expression
    Grouping(Box<Expression>),
}

impl Expression {
    pub fn literal(value: impl Into<Value>) -> Self {
        Expression::Literal(value.into())
    }

    pub fn column(table: impl Into<String>, column: impl Into<String>) -> Self {
        Expression::Column(AttributeRef::new(table, column))
    }

    pub fn param(name: impl Into<String>) -> Self {
        Expression::Param(BindParam::new(name))
    }

    pub fn always_false() -> Self {
        Expression::Constant(false)
    }

    pub fn always_true() -> Self {
        Expression::Constant(true)
    }

    pub fn binary_op(op: BinaryOperator, left: Expression, right: Expression) -> Self {
        Expression::BinaryOp {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn unary_op(op: UnaryOperator, operand: Expression) -> Self {
        Expression::UnaryOp {
            op,
            operand: Box::new(operand),
        }
    }

    pub fn and(left: Expression, right: Expression) -> Self {
        Self::binary_op(BinaryOperator::And, left, right)
    }

    /// Disjunction, wrapped in a grouping so it composes safely with AND
    pub fn or(left: Expression, right: Expression) -> Self {
        Expression::Grouping(Box::new(Self::binary_op(BinaryOperator::Or, left, right)))
    }

    pub fn is_null(operand: Expression) -> Self {
        Self::unary_op(UnaryOperator::IsNull, operand)
    }

    /// AND together a sequence of predicates; an empty sequence is always true
    pub fn conjunction(predicates: impl IntoIterator<Item = Expression>) -> Self {
        predicates
            .into_iter()
            .reduce(Expression::and)
            .unwrap_or_else(Expression::always_true)
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Literal(value) => write!(f, "{}", value),
            Expression::Column(attr) => write!(f, "{}", attr),
            Expression::Param(param) => write!(f, ":{}", param.name()),
            Expression::BinaryOp { op, left, right } => {
                write!(f, "{} {} {}", left, op.as_str(), right)
            }
            Expression::UnaryOp { op, operand } => write!(f, "{} {}", operand, op.as_str()),
            Expression::In { expr, list } => {
                if list.is_empty() {
                    return write!(f, "1=0");
                }
                write!(f, "{} IN (", expr)?;
                for (i, item) in list.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, ")")
            }
            Expression::InSubquery { expr, subquery } => write!(f, "{} IN ({})", expr, subquery),
            Expression::Between { expr, low, high } => {
                write!(f, "{} BETWEEN {} AND {}", expr, low, high)
            }
            Expression::Constant(true) => write!(f, "1=1"),
            Expression::Constant(false) => write!(f, "1=0"),
            Expression::Grouping(inner) => write!(f, "({})", inner),
        }
    }
}

/// An attribute reference together with its declared column type.
///
/// This is the operand handlers build predicates on.
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    pub reference: AttributeRef,
    pub data_type: Option<DataType>,
}

impl Attribute {
    pub fn new(reference: AttributeRef, data_type: Option<DataType>) -> Self {
        Self {
            reference,
            data_type,
        }
    }

    pub fn name(&self) -> &str {
        &self.reference.column
    }

    fn operand(&self) -> Box<Expression> {
        Box::new(Expression::Column(self.reference.clone()))
    }

    /// `attr = value`, or `attr IS NULL` for a NULL literal
    pub fn equals(&self, value: Expression) -> Expression {
        match value {
            Expression::Literal(Value::Null) => Expression::is_null(*self.operand()),
            value => Expression::BinaryOp {
                op: BinaryOperator::Eq,
                left: self.operand(),
                right: Box::new(value),
            },
        }
    }

    pub fn in_list(&self, list: Vec<Expression>) -> Expression {
        Expression::In {
            expr: self.operand(),
            list,
        }
    }

    pub fn in_subquery(&self, subquery: SubQuery) -> Expression {
        Expression::InSubquery {
            expr: self.operand(),
            subquery: Box::new(subquery),
        }
    }

    fn compare(&self, op: BinaryOperator, value: Expression) -> Expression {
        Expression::BinaryOp {
            op,
            left: self.operand(),
            right: Box::new(value),
        }
    }

    /// Range predicate; a missing bound leaves that side open
    pub fn between(
        &self,
        low: Option<Expression>,
        high: Option<Expression>,
        exclude_end: bool,
    ) -> Expression {
        match (low, high) {
            (None, None) => Expression::always_true(),
            (Some(low), None) => self.compare(BinaryOperator::GtEq, low),
            (None, Some(high)) if exclude_end => self.compare(BinaryOperator::Lt, high),
            (None, Some(high)) => self.compare(BinaryOperator::LtEq, high),
            (Some(low), Some(high)) if exclude_end => Expression::and(
                self.compare(BinaryOperator::GtEq, low),
                self.compare(BinaryOperator::Lt, high),
            ),
            (Some(low), Some(high)) => Expression::Between {
                expr: self.operand(),
                low: Box::new(low),
                high: Box::new(high),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn age() -> Attribute {
        Attribute::new(AttributeRef::new("users", "age"), Some(DataType::Int32))
    }

    #[test]
    fn test_equals_renders_is_null_for_null() {
        assert_eq!(
            age().equals(Expression::literal(30)).to_string(),
            "\"users\".\"age\" = 30"
        );
        assert_eq!(
            age().equals(Expression::Literal(Value::Null)).to_string(),
            "\"users\".\"age\" IS NULL"
        );
        assert_eq!(
            age().equals(Expression::param("age")).to_string(),
            "\"users\".\"age\" = :age"
        );
    }

    #[test]
    fn test_in_list() {
        let expr = age().in_list(vec![Expression::literal(1), Expression::literal(2)]);
        assert_eq!(expr.to_string(), "\"users\".\"age\" IN (1, 2)");
        assert_eq!(age().in_list(vec![]).to_string(), "1=0");
    }

    #[test]
    fn test_between_bounds() {
        let lo = || Some(Expression::literal(18));
        let hi = || Some(Expression::literal(65));
        assert_eq!(
            age().between(lo(), hi(), false).to_string(),
            "\"users\".\"age\" BETWEEN 18 AND 65"
        );
        assert_eq!(
            age().between(lo(), hi(), true).to_string(),
            "\"users\".\"age\" >= 18 AND \"users\".\"age\" < 65"
        );
        assert_eq!(
            age().between(lo(), None, false).to_string(),
            "\"users\".\"age\" >= 18"
        );
        assert_eq!(
            age().between(None, hi(), true).to_string(),
            "\"users\".\"age\" < 65"
        );
        assert_eq!(
            age().between(None, hi(), false).to_string(),
            "\"users\".\"age\" <= 65"
        );
        assert_eq!(age().between(None, None, false), Expression::always_true());
    }

    #[test]
    fn test_or_is_grouped() {
        let expr = Expression::or(
            age().equals(Expression::literal(1)),
            age().equals(Expression::Literal(Value::Null)),
        );
        assert_eq!(
            expr.to_string(),
            "(\"users\".\"age\" = 1 OR \"users\".\"age\" IS NULL)"
        );
    }

    #[test]
    fn test_subquery_rendering() {
        let sub = SubQuery::new("User", "users")
            .select("id")
            .filter(Expression::binary_op(
                BinaryOperator::Eq,
                Expression::column("users", "active"),
                Expression::literal(true),
            ));
        let attr = Attribute::new(AttributeRef::new("posts", "author_id"), None);
        assert_eq!(
            attr.in_subquery(sub).to_string(),
            "\"posts\".\"author_id\" IN \
             (SELECT \"users\".\"id\" FROM \"users\" WHERE \"users\".\"active\" = TRUE)"
        );
    }

    #[test]
    fn test_conjunction() {
        assert_eq!(Expression::conjunction(vec![]), Expression::always_true());
        let both = Expression::conjunction(vec![
            Expression::always_false(),
            Expression::is_null(Expression::column("t", "c")),
        ]);
        assert_eq!(both.to_string(), "1=0 AND \"t\".\"c\" IS NULL");
    }
}
