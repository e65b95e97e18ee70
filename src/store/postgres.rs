//! PostgreSQL store: builder SQL executed through sqlx, rows returned as JSON objects.

use async_trait::async_trait;
use serde_json::Value;
use sqlx::postgres::{PgArguments, PgRow};
use sqlx::query::Query;
use sqlx::{ConnectOptions, PgPool, Postgres};
use std::str::FromStr;

use crate::error::AppError;
use crate::schema::TableDef;
use crate::sql::{self, PgBindValue, QueryBuf};
use crate::store::{Filter, Row, SelectOptions, Store};

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        PgStore { pool }
    }

    async fn fetch_all(&self, sql: &str, params: &[Value]) -> Result<Vec<Row>, AppError> {
        tracing::debug!(sql = %sql, params = ?params, "query");
        let rows = bind_all(sqlx::query(sql), params)
            .fetch_all(&self.pool)
            .await
            .map_err(map_db_error)?;
        Ok(rows.iter().map(row_to_json).collect())
    }

    async fn run(&self, q: QueryBuf) -> Result<Vec<Row>, AppError> {
        self.fetch_all(&q.sql, &q.params).await
    }
}

fn bind_all<'q>(
    mut query: Query<'q, Postgres, PgArguments>,
    params: &[Value],
) -> Query<'q, Postgres, PgArguments> {
    for p in params {
        query = query.bind(PgBindValue::from_json(p));
    }
    query
}

/// Constraint violations are client errors; everything else is a data-access failure.
fn map_db_error(e: sqlx::Error) -> AppError {
    if let Some(db) = e.as_database_error() {
        if db.is_unique_violation() {
            return AppError::Conflict("Já existe um registro com o mesmo valor.".into());
        }
        if db.is_foreign_key_violation() {
            return AppError::Conflict("O registro está vinculado a outros registros.".into());
        }
    }
    AppError::Db(e)
}

#[async_trait]
impl Store for PgStore {
    async fn select(
        &self,
        table: &'static TableDef,
        filter: &Filter,
        options: &SelectOptions,
    ) -> Result<Vec<Row>, AppError> {
        self.run(sql::select(table, filter, options)?).await
    }

    async fn insert(&self, table: &'static TableDef, data: Row) -> Result<Option<Row>, AppError> {
        let rows = self.run(sql::insert(table, &data)?).await?;
        Ok(rows.into_iter().next())
    }

    async fn update(&self, table: &'static TableDef, data: Row, filter: &Filter) -> Result<Vec<Row>, AppError> {
        self.run(sql::update(table, &data, filter)?).await
    }

    async fn delete(&self, table: &'static TableDef, filter: &Filter) -> Result<Vec<Row>, AppError> {
        self.run(sql::delete(table, filter)?).await
    }

    async fn count(&self, table: &'static TableDef, filter: &Filter) -> Result<u64, AppError> {
        let q = sql::count(table, filter)?;
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let mut query = sqlx::query_scalar::<_, i64>(&q.sql);
        for p in &q.params {
            query = query.bind(PgBindValue::from_json(p));
        }
        let total = query.fetch_one(&self.pool).await.map_err(map_db_error)?;
        Ok(total.max(0) as u64)
    }

    async fn query(&self, sql: &str, params: &[Value]) -> Result<Vec<Row>, AppError> {
        self.fetch_all(sql, params).await
    }

    async fn ping(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

fn row_to_json(row: &PgRow) -> Row {
    use sqlx::Column;
    use sqlx::Row as _;
    let mut map = Row::new();
    for col in row.columns() {
        let name = col.name();
        map.insert(name.to_string(), cell_to_value(row, name));
    }
    map
}

fn cell_to_value(row: &PgRow, name: &str) -> Value {
    use sqlx::Row as _;
    if let Ok(Some(n)) = row.try_get::<Option<i32>, _>(name) {
        return Value::Number(n.into());
    }
    if let Ok(Some(n)) = row.try_get::<Option<i64>, _>(name) {
        return Value::Number(n.into());
    }
    if let Ok(Some(n)) = row.try_get::<Option<i16>, _>(name) {
        return Value::Number(n.into());
    }
    if let Ok(Some(n)) = row.try_get::<Option<f64>, _>(name) {
        if let Some(n) = serde_json::Number::from_f64(n) {
            return Value::Number(n);
        }
    }
    if let Ok(Some(b)) = row.try_get::<Option<bool>, _>(name) {
        return Value::Bool(b);
    }
    if let Ok(Some(d)) = row.try_get::<Option<chrono::NaiveDate>, _>(name) {
        return Value::String(d.format("%Y-%m-%d").to_string());
    }
    if let Ok(Some(d)) = row.try_get::<Option<chrono::DateTime<chrono::Utc>>, _>(name) {
        return Value::String(d.to_rfc3339());
    }
    if let Ok(Some(s)) = row.try_get::<Option<String>, _>(name) {
        return Value::String(s);
    }
    if let Ok(Some(j)) = row.try_get::<Option<Value>, _>(name) {
        return j;
    }
    Value::Null
}

/// Ensure the database in `database_url` exists; create it if not. Connects to the
/// default `postgres` database to run CREATE DATABASE. Call before creating the main pool.
pub async fn ensure_database_exists(database_url: &str) -> Result<(), AppError> {
    let (admin_url, db_name) = parse_db_name_from_url(database_url)?;
    if db_name.is_empty() || db_name == "postgres" {
        return Ok(());
    }
    let opts = sqlx::postgres::PgConnectOptions::from_str(&admin_url)
        .map_err(|e| AppError::Validation(format!("invalid DATABASE_URL: {}", e)))?;
    let mut conn: sqlx::PgConnection = opts.connect().await?;
    let exists: (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM pg_database WHERE datname = $1)")
        .bind(&db_name)
        .fetch_one(&mut conn)
        .await?;
    if !exists.0 {
        tracing::info!(database = %db_name, "creating database");
        sqlx::query(&format!("CREATE DATABASE {}", sql::quoted(&db_name)))
            .execute(&mut conn)
            .await?;
    }
    Ok(())
}

fn parse_db_name_from_url(url: &str) -> Result<(String, String), AppError> {
    let path_start = url
        .rfind('/')
        .ok_or_else(|| AppError::Validation("DATABASE_URL: no path".into()))?
        + 1;
    let path_and_query = url.get(path_start..).unwrap_or("");
    let db_name = path_and_query.split('?').next().unwrap_or("").trim();
    let base = url.get(..path_start).unwrap_or(url);
    Ok((format!("{}postgres", base), db_name.to_string()))
}
