//! Persistence adapter: a minimal table-oriented store over PostgreSQL or process memory.
//!
//! Handlers talk to `dyn Store` with table descriptors from [`crate::schema`] and typed
//! filters; rows travel as JSON objects and are decoded into records by the caller.

mod filter;
pub mod memory;
pub mod postgres;

pub use filter::{Cond, Filter};
pub use memory::MemoryStore;
pub use postgres::{ensure_database_exists, PgStore};

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::AppError;
use crate::schema::TableDef;

/// One table row keyed by column name.
pub type Row = serde_json::Map<String, Value>;

/// Largest page size the adapter will serve.
pub const MAX_PAGE_SIZE: u32 = 1000;

#[derive(Clone, Debug, PartialEq)]
pub struct OrderBy {
    pub column: String,
    pub descending: bool,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct SelectOptions {
    /// Defaults to the primary key ascending.
    pub order_by: Option<OrderBy>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

impl SelectOptions {
    pub fn order_asc(column: &str) -> Self {
        SelectOptions {
            order_by: Some(OrderBy {
                column: column.to_string(),
                descending: false,
            }),
            ..Default::default()
        }
    }

    pub fn order_desc(column: &str) -> Self {
        SelectOptions {
            order_by: Some(OrderBy {
                column: column.to_string(),
                descending: true,
            }),
            ..Default::default()
        }
    }

    pub fn limit(mut self, n: u32) -> Self {
        self.limit = Some(n.min(MAX_PAGE_SIZE));
        self
    }

    pub fn offset(mut self, n: u32) -> Self {
        self.offset = Some(n);
        self
    }
}

/// 1-based page request. `page < 1` reads as 1; `page_size` is clamped to `1..=MAX_PAGE_SIZE`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub page_size: u32,
}

impl PageRequest {
    pub fn new(page: i64, page_size: i64) -> Self {
        PageRequest {
            page: page.clamp(1, u32::MAX as i64) as u32,
            page_size: page_size.clamp(1, MAX_PAGE_SIZE as i64) as u32,
        }
    }

    pub fn offset(&self) -> u32 {
        (self.page - 1).saturating_mul(self.page_size)
    }
}

#[derive(Clone, Debug, Default)]
pub struct Page {
    pub rows: Vec<Row>,
    pub total: u64,
}

#[async_trait]
pub trait Store: Send + Sync {
    async fn select(&self, table: &'static TableDef, filter: &Filter, options: &SelectOptions)
        -> Result<Vec<Row>, AppError>;

    /// Insert one row; returns the created row, or `None` when nothing was written.
    async fn insert(&self, table: &'static TableDef, data: Row) -> Result<Option<Row>, AppError>;

    /// Update matching rows; returns them. Empty means nothing matched.
    async fn update(&self, table: &'static TableDef, data: Row, filter: &Filter) -> Result<Vec<Row>, AppError>;

    /// Delete matching rows; returns them.
    async fn delete(&self, table: &'static TableDef, filter: &Filter) -> Result<Vec<Row>, AppError>;

    async fn count(&self, table: &'static TableDef, filter: &Filter) -> Result<u64, AppError>;

    /// Raw parameterized SQL. Not every backend can run it.
    async fn query(&self, sql: &str, params: &[Value]) -> Result<Vec<Row>, AppError>;

    async fn ping(&self) -> Result<(), AppError>;

    async fn find(&self, table: &'static TableDef, filter: &Filter) -> Result<Option<Row>, AppError> {
        let rows = self
            .select(table, filter, &SelectOptions::order_asc(table.pk).limit(1))
            .await?;
        Ok(rows.into_iter().next())
    }

    async fn find_last(&self, table: &'static TableDef, filter: &Filter) -> Result<Option<Row>, AppError> {
        let rows = self
            .select(table, filter, &SelectOptions::order_desc(table.pk).limit(1))
            .await?;
        Ok(rows.into_iter().next())
    }

    /// Newest rows first; `total` counts every matching row.
    async fn paginate(&self, table: &'static TableDef, filter: &Filter, page: PageRequest) -> Result<Page, AppError> {
        let options = SelectOptions::order_desc(table.pk)
            .limit(page.page_size)
            .offset(page.offset());
        let rows = self.select(table, filter, &options).await?;
        let total = self.count(table, filter).await?;
        Ok(Page { rows, total })
    }
}

/// Decode a row into a record type.
pub fn decode<T: DeserializeOwned>(row: Row) -> Result<T, AppError> {
    Ok(serde_json::from_value(Value::Object(row))?)
}

pub fn decode_all<T: DeserializeOwned>(rows: Vec<Row>) -> Result<Vec<T>, AppError> {
    rows.into_iter().map(decode).collect()
}

/// Build a write payload from a serializable struct. `None` fields serialize as null.
pub fn to_row<T: serde::Serialize>(value: &T) -> Result<Row, AppError> {
    match serde_json::to_value(value)? {
        Value::Object(m) => Ok(m),
        _ => Err(AppError::Internal("write payload must be an object".into())),
    }
}

/// Reject write payloads naming columns the table does not have, or the primary key.
pub(crate) fn check_write(table: &TableDef, data: &Row) -> Result<(), AppError> {
    if data.is_empty() {
        return Err(AppError::DataAccess(format!("empty write to {}", table.name)));
    }
    for key in data.keys() {
        if key == table.pk || table.column(key).is_none() {
            return Err(AppError::DataAccess(format!("column {}.{} is not writable", table.name, key)));
        }
    }
    Ok(())
}
