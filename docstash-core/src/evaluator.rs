//! Evaluation of filter expressions against JSON documents.

use std::{cmp::Ordering, convert::Infallible};

use serde_json::Value;

use crate::query::{Expr, FieldOp, QueryVisitor, SortDirection};

/// Looks up a possibly dotted field path. JSON `null` is reported as missing.
pub(crate) fn lookup<'a>(document: &'a Value, field: &str) -> Option<&'a Value> {
    field
        .split('.')
        .try_fold(document, |current, segment| match current {
            Value::Object(map) => map.get(segment),
            Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        })
        .filter(|value| !value.is_null())
}

/// Orders two JSON scalars of the same kind. Numbers compare as `f64`.
pub(crate) fn compare(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => a.as_f64()?.partial_cmp(&b.as_f64()?),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

/// Equality with numeric normalization, so `1` and `1.0` match.
fn equals(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Number(_), Value::Number(_)) => compare(left, right) == Some(Ordering::Equal),
        _ => left == right,
    }
}

/// Orders documents by a sort field; documents missing the field sort first
/// in ascending order.
pub(crate) fn compare_by_field(a: &Value, b: &Value, field: &str, direction: SortDirection) -> Ordering {
    let ordering = match (lookup(a, field), lookup(b, field)) {
        (Some(left), Some(right)) => compare(left, right).unwrap_or(Ordering::Equal),
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    };

    match direction {
        SortDirection::Asc => ordering,
        SortDirection::Desc => ordering.reverse(),
    }
}

pub(crate) struct DocumentEvaluator<'a> {
    document: &'a Value,
}

impl<'a> DocumentEvaluator<'a> {
    pub fn new(document: &'a Value) -> Self {
        Self { document }
    }

    pub fn matches(document: &'a Value, expr: &Expr) -> bool {
        match DocumentEvaluator::new(document).visit_expr(expr) {
            Ok(matched) => matched,
            Err(never) => match never {},
        }
    }
}

impl QueryVisitor for DocumentEvaluator<'_> {
    type Output = bool;
    type Error = Infallible;

    fn visit_and(&mut self, exprs: &[Expr]) -> Result<bool, Infallible> {
        for expr in exprs {
            if !self.visit_expr(expr)? {
                return Ok(false);
            }
        }

        Ok(true)
    }

    fn visit_or(&mut self, exprs: &[Expr]) -> Result<bool, Infallible> {
        for expr in exprs {
            if self.visit_expr(expr)? {
                return Ok(true);
            }
        }

        Ok(false)
    }

    fn visit_not(&mut self, expr: &Expr) -> Result<bool, Infallible> {
        Ok(!self.visit_expr(expr)?)
    }

    fn visit_exists(&mut self, field: &str, should_exist: bool) -> Result<bool, Infallible> {
        Ok(lookup(self.document, field).is_some() == should_exist)
    }

    fn visit_field(&mut self, field: &str, op: FieldOp, value: &Value) -> Result<bool, Infallible> {
        let Some(field_value) = lookup(self.document, field) else {
            // A missing field only satisfies "not equal".
            return Ok(op == FieldOp::Ne);
        };

        Ok(match op {
            FieldOp::Eq => equals(field_value, value),
            FieldOp::Ne => !equals(field_value, value),
            FieldOp::Gt | FieldOp::Gte | FieldOp::Lt | FieldOp::Lte => match compare(field_value, value) {
                Some(ordering) => match op {
                    FieldOp::Gt => ordering == Ordering::Greater,
                    FieldOp::Gte => ordering != Ordering::Less,
                    FieldOp::Lt => ordering == Ordering::Less,
                    _ => ordering != Ordering::Greater,
                },
                None => false,
            },
            FieldOp::Contains => match (field_value, value) {
                (Value::Array(items), needle) => items.iter().any(|item| equals(item, needle)),
                (Value::String(haystack), Value::String(needle)) => haystack.contains(needle.as_str()),
                _ => false,
            },
            FieldOp::StartsWith => match (field_value, value) {
                (Value::String(s), Value::String(prefix)) => s.starts_with(prefix.as_str()),
                _ => false,
            },
            FieldOp::EndsWith => match (field_value, value) {
                (Value::String(s), Value::String(suffix)) => s.ends_with(suffix.as_str()),
                _ => false,
            },
            FieldOp::AnyOf => {
                let candidates = match value {
                    Value::Array(values) => values.as_slice(),
                    single => std::slice::from_ref(single),
                };

                match field_value {
                    Value::Array(items) => items
                        .iter()
                        .any(|item| candidates.iter().any(|c| equals(item, c))),
                    scalar => candidates.iter().any(|c| equals(scalar, c)),
                }
            }
        })
    }
}
