//! Builds parameterized SELECT, COUNT, INSERT, UPDATE, DELETE from a table descriptor.

use serde_json::Value;

use crate::error::AppError;
use crate::schema::TableDef;
use crate::store::{check_write, Cond, Filter, Row, SelectOptions};

/// Quote identifier for PostgreSQL (safe: only from the catalog).
pub fn quoted(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

#[derive(Debug)]
pub struct QueryBuf {
    pub sql: String,
    pub params: Vec<Value>,
}

impl QueryBuf {
    fn new() -> Self {
        QueryBuf {
            sql: String::new(),
            params: Vec::new(),
        }
    }

    fn push_param(&mut self, v: Value) -> u32 {
        let n = self.params.len() as u32 + 1;
        self.params.push(v);
        n
    }

    /// Placeholder with a cast to the column type so text-encoded values bind correctly.
    fn placeholder(&mut self, table: &TableDef, column: &str, v: Value) -> String {
        let n = self.push_param(v);
        match table.pg_type(column) {
            Some(t) => format!("${}::{}", n, t),
            None => format!("${}", n),
        }
    }
}

/// SELECT list: primary key then every catalog column.
fn select_column_list(table: &TableDef) -> String {
    std::iter::once(table.pk)
        .chain(table.columns.iter().map(|c| c.name))
        .map(quoted)
        .collect::<Vec<_>>()
        .join(", ")
}

fn where_clause(q: &mut QueryBuf, table: &TableDef, filter: &Filter) -> Result<String, AppError> {
    filter.check(table)?;
    let mut parts = Vec::with_capacity(filter.conds.len());
    for cond in &filter.conds {
        let col = quoted(cond.column());
        let part = match cond {
            Cond::Eq(c, v) => format!("{} = {}", col, q.placeholder(table, c, v.clone())),
            Cond::Ne(c, v) => format!("{} <> {}", col, q.placeholder(table, c, v.clone())),
            Cond::In(_, vs) if vs.is_empty() => "1 = 0".to_string(),
            Cond::In(c, vs) => {
                let phs: Vec<String> = vs.iter().map(|v| q.placeholder(table, c, v.clone())).collect();
                format!("{} IN ({})", col, phs.join(", "))
            }
            Cond::IsNull(_) => format!("{} IS NULL", col),
            Cond::NotNull(_) => format!("{} IS NOT NULL", col),
        };
        parts.push(part);
    }
    Ok(if parts.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", parts.join(" AND "))
    })
}

/// SELECT with filter, ORDER BY (default pk ascending), optional LIMIT/OFFSET.
pub fn select(table: &TableDef, filter: &Filter, options: &SelectOptions) -> Result<QueryBuf, AppError> {
    let mut q = QueryBuf::new();
    let where_sql = where_clause(&mut q, table, filter)?;
    let order_clause = match &options.order_by {
        Some(o) => {
            if !table.has_column(&o.column) {
                return Err(AppError::DataAccess(format!("unknown order column {}.{}", table.name, o.column)));
            }
            let dir = if o.descending { "DESC" } else { "ASC" };
            // Tie-break on the pk so pages are stable.
            if o.column == table.pk {
                format!(" ORDER BY {} {}", quoted(&o.column), dir)
            } else {
                format!(" ORDER BY {} {}, {} {}", quoted(&o.column), dir, quoted(table.pk), dir)
            }
        }
        None => format!(" ORDER BY {} ASC", quoted(table.pk)),
    };
    let limit_clause = options.limit.map(|n| format!(" LIMIT {}", n)).unwrap_or_default();
    let offset_clause = options.offset.map(|n| format!(" OFFSET {}", n)).unwrap_or_default();
    q.sql = format!(
        "SELECT {} FROM {}{}{}{}{}",
        select_column_list(table),
        quoted(table.name),
        where_sql,
        order_clause,
        limit_clause,
        offset_clause
    );
    Ok(q)
}

pub fn count(table: &TableDef, filter: &Filter) -> Result<QueryBuf, AppError> {
    let mut q = QueryBuf::new();
    let where_sql = where_clause(&mut q, table, filter)?;
    q.sql = format!("SELECT COUNT(*) AS \"total\" FROM {}{}", quoted(table.name), where_sql);
    Ok(q)
}

/// INSERT only the columns present in `data`; omitted columns take their DB default.
pub fn insert(table: &TableDef, data: &Row) -> Result<QueryBuf, AppError> {
    check_write(table, data)?;
    let mut q = QueryBuf::new();
    let mut cols = Vec::with_capacity(data.len());
    let mut placeholders = Vec::with_capacity(data.len());
    for (name, val) in data {
        cols.push(quoted(name));
        placeholders.push(q.placeholder(table, name, val.clone()));
    }
    q.sql = format!(
        "INSERT INTO {} ({}) VALUES ({}) RETURNING {}",
        quoted(table.name),
        cols.join(", "),
        placeholders.join(", "),
        select_column_list(table)
    );
    Ok(q)
}

/// UPDATE matching rows: SET only the columns present in `data`.
pub fn update(table: &TableDef, data: &Row, filter: &Filter) -> Result<QueryBuf, AppError> {
    check_write(table, data)?;
    let mut q = QueryBuf::new();
    let sets: Vec<String> = data
        .iter()
        .map(|(name, val)| format!("{} = {}", quoted(name), q.placeholder(table, name, val.clone())))
        .collect();
    let where_sql = where_clause(&mut q, table, filter)?;
    q.sql = format!(
        "UPDATE {} SET {}{} RETURNING {}",
        quoted(table.name),
        sets.join(", "),
        where_sql,
        select_column_list(table)
    );
    Ok(q)
}

pub fn delete(table: &TableDef, filter: &Filter) -> Result<QueryBuf, AppError> {
    let mut q = QueryBuf::new();
    let where_sql = where_clause(&mut q, table, filter)?;
    q.sql = format!(
        "DELETE FROM {}{} RETURNING {}",
        quoted(table.name),
        where_sql,
        select_column_list(table)
    );
    Ok(q)
}
