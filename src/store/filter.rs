//! Row filters: a conjunction of column conditions, evaluated as SQL or in memory.

use serde_json::Value;
use std::cmp::Ordering;

use crate::error::AppError;
use crate::schema::TableDef;
use crate::store::Row;

#[derive(Clone, Debug, PartialEq)]
pub enum Cond {
    Eq(String, Value),
    Ne(String, Value),
    In(String, Vec<Value>),
    IsNull(String),
    NotNull(String),
}

impl Cond {
    pub fn column(&self) -> &str {
        match self {
            Cond::Eq(c, _) | Cond::Ne(c, _) | Cond::In(c, _) | Cond::IsNull(c) | Cond::NotNull(c) => c.as_str(),
        }
    }

    fn matches(&self, row: &Row) -> bool {
        let cell = row.get(self.column()).unwrap_or(&Value::Null);
        match self {
            // SQL semantics: comparisons against NULL are never true.
            Cond::Eq(_, v) => !cell.is_null() && values_equal(cell, v),
            Cond::Ne(_, v) => !cell.is_null() && !v.is_null() && !values_equal(cell, v),
            Cond::In(_, vs) => !cell.is_null() && vs.iter().any(|v| values_equal(cell, v)),
            Cond::IsNull(_) => cell.is_null(),
            Cond::NotNull(_) => !cell.is_null(),
        }
    }
}

/// AND of conditions. An empty filter matches every row.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Filter {
    pub conds: Vec<Cond>,
}

impl Filter {
    pub fn all() -> Self {
        Filter::default()
    }

    pub fn eq(column: &str, value: impl Into<Value>) -> Self {
        Filter::all().and_eq(column, value)
    }

    pub fn and_eq(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.conds.push(Cond::Eq(column.to_string(), value.into()));
        self
    }

    pub fn and_ne(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.conds.push(Cond::Ne(column.to_string(), value.into()));
        self
    }

    pub fn and_in<V: Into<Value>>(mut self, column: &str, values: impl IntoIterator<Item = V>) -> Self {
        self.conds
            .push(Cond::In(column.to_string(), values.into_iter().map(Into::into).collect()));
        self
    }

    pub fn and_null(mut self, column: &str) -> Self {
        self.conds.push(Cond::IsNull(column.to_string()));
        self
    }

    pub fn and_not_null(mut self, column: &str) -> Self {
        self.conds.push(Cond::NotNull(column.to_string()));
        self
    }

    pub fn matches(&self, row: &Row) -> bool {
        self.conds.iter().all(|c| c.matches(row))
    }

    /// Reject conditions on columns the table does not have.
    pub fn check(&self, table: &TableDef) -> Result<(), AppError> {
        for c in &self.conds {
            if !table.has_column(c.column()) {
                return Err(AppError::DataAccess(format!(
                    "unknown column {}.{}",
                    table.name,
                    c.column()
                )));
            }
        }
        Ok(())
    }
}

pub(crate) fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(n), Value::Number(m)) => n.as_f64() == m.as_f64(),
        _ => a == b,
    }
}

/// Total order used for in-memory ORDER BY: NULLs first, then numbers, booleans, strings.
pub(crate) fn compare_values(a: &Value, b: &Value) -> Ordering {
    fn rank(v: &Value) -> u8 {
        match v {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Number(_) => 2,
            Value::String(_) => 3,
            Value::Array(_) => 4,
            Value::Object(_) => 5,
        }
    }
    match (a, b) {
        (Value::Number(n), Value::Number(m)) => n
            .as_f64()
            .unwrap_or(0.0)
            .partial_cmp(&m.as_f64().unwrap_or(0.0))
            .unwrap_or(Ordering::Equal),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::String(x), Value::String(y)) => x.cmp(y),
        _ => rank(a).cmp(&rank(b)),
    }
}
