//! In-process store with the same filter, uniqueness and foreign-key semantics as the SQL backend.
//! Used for local runs (`DB_TYPE=memory`) and the HTTP test-suite.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

use crate::error::AppError;
use crate::schema::{TableDef, ALL_TABLES};
use crate::store::filter::{compare_values, values_equal};
use crate::store::{check_write, Filter, Row, SelectOptions, Store};

#[derive(Default)]
struct MemTable {
    next_id: i64,
    rows: BTreeMap<i64, Row>,
}

#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<HashMap<&'static str, MemTable>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn poisoned<T>(_: T) -> AppError {
        AppError::DataAccess("memory store lock poisoned".into())
    }
}

fn pk_of(table: &TableDef, row: &Row) -> i64 {
    row.get(table.pk).and_then(Value::as_i64).unwrap_or_default()
}

/// Coerce a written value the way the SQL casts would (e.g. "12" into an integer column).
fn coerce(pg_type: &str, v: Value) -> Value {
    match (pg_type, &v) {
        ("integer", Value::String(s)) => s.trim().parse::<i64>().map(Value::from).unwrap_or(v),
        ("integer", Value::Number(n)) if n.as_i64().is_none() => {
            n.as_f64().map(|f| Value::from(f.round() as i64)).unwrap_or(v)
        }
        ("double precision", Value::String(s)) => s
            .trim()
            .parse::<f64>()
            .ok()
            .and_then(serde_json::Number::from_f64)
            .map(Value::Number)
            .unwrap_or(v),
        ("double precision", Value::Number(n)) => n
            .as_f64()
            .and_then(serde_json::Number::from_f64)
            .map(Value::Number)
            .unwrap_or(v),
        ("text", Value::Number(_)) | ("text", Value::Bool(_)) => Value::String(v.to_string()),
        _ => v,
    }
}

fn check_not_null(table: &TableDef, row: &Row) -> Result<(), AppError> {
    for c in table.columns {
        if !c.nullable && row.get(c.name).map_or(true, Value::is_null) {
            return Err(AppError::DataAccess(format!(
                "null value in column {}.{} violates not-null constraint",
                table.name, c.name
            )));
        }
    }
    Ok(())
}

fn check_unique(table: &TableDef, mem: &MemTable, candidate: &Row, skip_pk: Option<i64>) -> Result<(), AppError> {
    for c in table.unique_columns() {
        let Some(v) = candidate.get(c.name).filter(|v| !v.is_null()) else { continue };
        let clash = mem
            .rows
            .iter()
            .any(|(id, r)| Some(*id) != skip_pk && r.get(c.name).is_some_and(|o| values_equal(o, v)));
        if clash {
            return Err(AppError::Conflict("Já existe um registro com o mesmo valor.".into()));
        }
    }
    Ok(())
}

fn check_references(
    table: &TableDef,
    tables: &HashMap<&'static str, MemTable>,
    candidate: &Row,
) -> Result<(), AppError> {
    for c in table.columns {
        let Some((target, _)) = c.references else { continue };
        let Some(id) = candidate.get(c.name).and_then(Value::as_i64) else { continue };
        let exists = tables.get(target).is_some_and(|t| t.rows.contains_key(&id));
        if !exists {
            return Err(AppError::Conflict("O registro está vinculado a outros registros.".into()));
        }
    }
    Ok(())
}

/// Restrict deletes of rows still referenced by another table.
fn check_not_referenced(table: &TableDef, tables: &HashMap<&'static str, MemTable>, ids: &[i64]) -> Result<(), AppError> {
    for other in ALL_TABLES {
        for c in other.columns.iter().filter(|c| c.references.map(|(t, _)| t) == Some(table.name)) {
            let referenced = tables.get(other.name).is_some_and(|t| {
                t.rows
                    .values()
                    .any(|r| r.get(c.name).and_then(Value::as_i64).is_some_and(|v| ids.contains(&v)))
            });
            if referenced {
                return Err(AppError::Conflict("O registro está vinculado a outros registros.".into()));
            }
        }
    }
    Ok(())
}

#[async_trait]
impl Store for MemoryStore {
    async fn select(
        &self,
        table: &'static TableDef,
        filter: &Filter,
        options: &SelectOptions,
    ) -> Result<Vec<Row>, AppError> {
        filter.check(table)?;
        let tables = self.tables.read().map_err(Self::poisoned)?;
        let mut rows: Vec<Row> = tables
            .get(table.name)
            .map(|t| t.rows.values().filter(|r| filter.matches(r)).cloned().collect())
            .unwrap_or_default();
        if let Some(order) = &options.order_by {
            if !table.has_column(&order.column) {
                return Err(AppError::DataAccess(format!("unknown order column {}.{}", table.name, order.column)));
            }
            rows.sort_by(|a, b| {
                let ord = compare_values(
                    a.get(&order.column).unwrap_or(&Value::Null),
                    b.get(&order.column).unwrap_or(&Value::Null),
                )
                .then_with(|| pk_of(table, a).cmp(&pk_of(table, b)));
                if order.descending {
                    ord.reverse()
                } else {
                    ord
                }
            });
        }
        let offset = options.offset.unwrap_or(0) as usize;
        let limit = options.limit.map(|n| n as usize).unwrap_or(usize::MAX);
        Ok(rows.into_iter().skip(offset).take(limit).collect())
    }

    async fn insert(&self, table: &'static TableDef, data: Row) -> Result<Option<Row>, AppError> {
        check_write(table, &data)?;
        let mut tables = self.tables.write().map_err(Self::poisoned)?;
        let mut row = Row::new();
        for c in table.columns {
            let v = match data.get(c.name) {
                Some(v) => coerce(c.pg_type, v.clone()),
                None => c.default.map(|d| d.value()).unwrap_or(Value::Null),
            };
            row.insert(c.name.to_string(), v);
        }
        check_not_null(table, &row)?;
        check_references(table, &tables, &row)?;
        let mem = tables.entry(table.name).or_default();
        check_unique(table, mem, &row, None)?;
        mem.next_id += 1;
        let id = mem.next_id;
        row.insert(table.pk.to_string(), Value::from(id));
        mem.rows.insert(id, row.clone());
        Ok(Some(row))
    }

    async fn update(&self, table: &'static TableDef, data: Row, filter: &Filter) -> Result<Vec<Row>, AppError> {
        check_write(table, &data)?;
        filter.check(table)?;
        let mut tables = self.tables.write().map_err(Self::poisoned)?;
        let ids: Vec<i64> = match tables.get(table.name) {
            Some(mem) => mem
                .rows
                .iter()
                .filter(|(_, r)| filter.matches(r))
                .map(|(id, _)| *id)
                .collect(),
            None => return Ok(Vec::new()),
        };
        let mut staged = Vec::with_capacity(ids.len());
        for id in &ids {
            let mut row = tables[table.name].rows[id].clone();
            for (k, v) in &data {
                let pg_type = table.pg_type(k).unwrap_or("text");
                row.insert(k.clone(), coerce(pg_type, v.clone()));
            }
            check_not_null(table, &row)?;
            check_references(table, &tables, &row)?;
            check_unique(table, &tables[table.name], &row, Some(*id))?;
            staged.push((*id, row));
        }
        let mem = tables.entry(table.name).or_default();
        let mut out = Vec::with_capacity(staged.len());
        for (id, row) in staged {
            mem.rows.insert(id, row.clone());
            out.push(row);
        }
        Ok(out)
    }

    async fn delete(&self, table: &'static TableDef, filter: &Filter) -> Result<Vec<Row>, AppError> {
        filter.check(table)?;
        let mut tables = self.tables.write().map_err(Self::poisoned)?;
        let ids: Vec<i64> = match tables.get(table.name) {
            Some(mem) => mem
                .rows
                .iter()
                .filter(|(_, r)| filter.matches(r))
                .map(|(id, _)| *id)
                .collect(),
            None => return Ok(Vec::new()),
        };
        check_not_referenced(table, &tables, &ids)?;
        let mem = tables.entry(table.name).or_default();
        Ok(ids.iter().filter_map(|id| mem.rows.remove(id)).collect())
    }

    async fn count(&self, table: &'static TableDef, filter: &Filter) -> Result<u64, AppError> {
        filter.check(table)?;
        let tables = self.tables.read().map_err(Self::poisoned)?;
        Ok(tables
            .get(table.name)
            .map(|t| t.rows.values().filter(|r| filter.matches(r)).count() as u64)
            .unwrap_or(0))
    }

    async fn query(&self, _sql: &str, _params: &[Value]) -> Result<Vec<Row>, AppError> {
        Err(AppError::DataAccess("raw SQL is not supported by the memory store".into()))
    }

    async fn ping(&self) -> Result<(), AppError> {
        Ok(())
    }
}
