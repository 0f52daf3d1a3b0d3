//! JSON-level filter expressions for querying container contents.
//!
//! Where [`Queryable`](crate::queryable::Queryable) composes over typed values,
//! a [`Query`] describes a filter over the raw JSON bodies, evaluated before
//! documents are decoded.
//!
//! ```ignore
//! use docstash::query::{Query, Filter, SortDirection};
//!
//! let query = Query::builder()
//!     .filter(Filter::eq("status", "active").and(Filter::gte("age", 18)))
//!     .sort("name", SortDirection::Asc)
//!     .limit(10)
//!     .build();
//!
//! let users: Vec<User> = container.query(&query)?;
//! ```
//!
//! Field names may use dots to reach into nested objects (`"address.city"`).

use serde_json::Value;

use crate::error::ContainerError;

/// Sort direction for query results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    /// Smallest first.
    Asc,
    /// Largest first.
    Desc,
}

/// Sort specification: a field and a direction.
#[derive(Debug, Clone)]
pub struct Sort {
    /// Dotted path of the field to sort on.
    pub field: String,
    pub direction: SortDirection,
}

/// Field comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldOp {
    /// Equal.
    Eq,
    /// Not equal. Also matches when the field is missing.
    Ne,
    /// Greater than.
    Gt,
    /// Greater than or equal.
    Gte,
    /// Less than.
    Lt,
    /// Less than or equal.
    Lte,
    /// String contains substring, or array contains element.
    Contains,
    /// String starts with the given prefix.
    StartsWith,
    /// String ends with the given suffix.
    EndsWith,
    /// Field value (or any element of an array field) is one of the given values.
    AnyOf,
}

/// A filter expression over JSON documents.
#[derive(Debug, Clone)]
pub enum Expr {
    /// All must match.
    And(Vec<Expr>),
    /// Any must match.
    Or(Vec<Expr>),
    /// Inverts the inner expression.
    Not(Box<Expr>),
    /// Field is present (`true`) or absent (`false`). JSON `null` counts as absent.
    Exists(String, bool),
    /// Compares the value at a dotted field path with `value`.
    Field {
        field: String,
        op: FieldOp,
        value: Value,
    },
}

impl Expr {
    /// Builds a [`Expr::Field`] comparison.
    pub fn field(field: String, op: FieldOp, value: Value) -> Self {
        Expr::Field { field, op, value }
    }

    /// Combines with `other` using logical AND, flattening an existing AND.
    pub fn and(self, other: Expr) -> Self {
        match self {
            Expr::And(mut list) => {
                list.push(other);
                Expr::And(list)
            }
            _ => Expr::And(vec![self, other]),
        }
    }

    /// Combines with `other` using logical OR, flattening an existing OR.
    pub fn or(self, other: Expr) -> Self {
        match self {
            Expr::Or(mut list) => {
                list.push(other);
                Expr::Or(list)
            }
            _ => Expr::Or(vec![self, other]),
        }
    }

    /// Negates this expression.
    pub fn not(self) -> Self {
        Expr::Not(Box::new(self))
    }
}

/// Constructors for common filter expressions.
pub struct Filter;

impl Filter {
    /// `field == value`.
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Expr {
        Expr::field(field.into(), FieldOp::Eq, value.into())
    }

    /// `field != value`, including documents without the field.
    pub fn ne(field: impl Into<String>, value: impl Into<Value>) -> Expr {
        Expr::field(field.into(), FieldOp::Ne, value.into())
    }

    /// `field > value`.
    pub fn gt(field: impl Into<String>, value: impl Into<Value>) -> Expr {
        Expr::field(field.into(), FieldOp::Gt, value.into())
    }

    /// `field >= value`.
    pub fn gte(field: impl Into<String>, value: impl Into<Value>) -> Expr {
        Expr::field(field.into(), FieldOp::Gte, value.into())
    }

    /// `field < value`.
    pub fn lt(field: impl Into<String>, value: impl Into<Value>) -> Expr {
        Expr::field(field.into(), FieldOp::Lt, value.into())
    }

    /// `field <= value`.
    pub fn lte(field: impl Into<String>, value: impl Into<Value>) -> Expr {
        Expr::field(field.into(), FieldOp::Lte, value.into())
    }

    /// String field contains `value` as a substring, or array field contains it as an element.
    pub fn contains(field: impl Into<String>, value: impl Into<Value>) -> Expr {
        Expr::field(field.into(), FieldOp::Contains, value.into())
    }

    /// String field starts with `value`.
    pub fn starts_with(field: impl Into<String>, value: impl Into<Value>) -> Expr {
        Expr::field(field.into(), FieldOp::StartsWith, value.into())
    }

    /// String field ends with `value`.
    pub fn ends_with(field: impl Into<String>, value: impl Into<Value>) -> Expr {
        Expr::field(field.into(), FieldOp::EndsWith, value.into())
    }

    /// Matches when the field equals one of `values`, or, for array fields,
    /// when any element does.
    pub fn any_of<V: Into<Value>>(field: impl Into<String>, values: impl IntoIterator<Item = V>) -> Expr {
        let values = values.into_iter().map(Into::into).collect::<Vec<Value>>();
        Expr::field(field.into(), FieldOp::AnyOf, Value::Array(values))
    }

    /// Field is present and not `null`.
    pub fn exists(field: impl Into<String>) -> Expr {
        Expr::Exists(field.into(), true)
    }

    /// Field is missing or `null`.
    pub fn not_exists(field: impl Into<String>) -> Expr {
        Expr::Exists(field.into(), false)
    }

    /// Every expression must match. An empty list matches everything.
    pub fn and(exprs: impl IntoIterator<Item = Expr>) -> Expr {
        Expr::And(exprs.into_iter().collect())
    }

    /// At least one expression must match.
    pub fn or(exprs: impl IntoIterator<Item = Expr>) -> Expr {
        Expr::Or(exprs.into_iter().collect())
    }
}

/// A structured query: optional filter, sort, offset and limit.
#[derive(Debug, Clone, Default)]
pub struct Query {
    /// Documents must match this expression. `None` matches all.
    pub filter: Option<Expr>,
    /// Maximum number of documents returned.
    pub limit: Option<usize>,
    /// Number of matching documents skipped after sorting.
    pub offset: Option<usize>,
    pub sort: Option<Sort>,
}

impl Query {
    /// Creates a query that matches every document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts building a query.
    pub fn builder() -> QueryBuilder {
        QueryBuilder::new()
    }
}

/// Fluent builder for [`Query`].
#[derive(Debug, Clone, Default)]
pub struct QueryBuilder {
    query: Query,
}

impl QueryBuilder {
    /// Creates a builder for a query that matches every document.
    pub fn new() -> Self {
        QueryBuilder { query: Query::default() }
    }

    /// Sets the filter, replacing any previous one.
    pub fn filter(mut self, filter: Expr) -> Self {
        self.query.filter = Some(filter);
        self
    }

    /// Caps the number of results.
    pub fn limit(mut self, limit: usize) -> Self {
        self.query.limit = Some(limit);
        self
    }

    /// Skips the first `offset` results.
    pub fn offset(mut self, offset: usize) -> Self {
        self.query.offset = Some(offset);
        self
    }

    /// Sorts results by `field`.
    pub fn sort(mut self, field: impl Into<String>, direction: SortDirection) -> Self {
        self.query.sort = Some(Sort { field: field.into(), direction });
        self
    }

    /// Finishes the query.
    pub fn build(self) -> Query {
        self.query
    }
}

/// Walks an [`Expr`] tree. Implemented by evaluators.
pub trait QueryVisitor {
    type Output;
    type Error: Into<ContainerError>;

    fn visit_and(&mut self, exprs: &[Expr]) -> Result<Self::Output, Self::Error>;
    fn visit_or(&mut self, exprs: &[Expr]) -> Result<Self::Output, Self::Error>;
    fn visit_not(&mut self, expr: &Expr) -> Result<Self::Output, Self::Error>;
    fn visit_exists(&mut self, field: &str, should_exist: bool) -> Result<Self::Output, Self::Error>;
    fn visit_field(&mut self, field: &str, op: FieldOp, value: &Value) -> Result<Self::Output, Self::Error>;

    /// Dispatches to the `visit_*` method for the expression's variant.
    fn visit_expr(&mut self, expr: &Expr) -> Result<Self::Output, Self::Error> {
        match expr {
            Expr::And(exprs) => self.visit_and(exprs),
            Expr::Or(exprs) => self.visit_or(exprs),
            Expr::Not(expr) => self.visit_not(expr),
            Expr::Exists(field, should_exist) => self.visit_exists(field, *should_exist),
            Expr::Field { field, op, value } => self.visit_field(field, *op, value),
        }
    }
}
