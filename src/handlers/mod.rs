//! HTTP handlers, one module per resource.

pub mod auth;
pub mod billing;
pub mod categories;
pub mod plans;
pub mod users;

use serde::de::DeserializeOwned;

use crate::error::AppError;
use crate::schema::TableDef;
use crate::store::{decode, Filter, Row, Store};

/// Load one record by primary key, or fail with a 404 carrying `missing`.
pub(crate) async fn fetch<T: DeserializeOwned>(
    store: &dyn Store,
    table: &'static TableDef,
    id: i64,
    missing: &str,
) -> Result<T, AppError> {
    match store.find(table, &Filter::eq(table.pk, id)).await? {
        Some(row) => decode(row),
        None => Err(AppError::NotFound(missing.to_string())),
    }
}

/// Update one record by primary key and return it. A missing record is a 404 even for an empty body.
pub(crate) async fn update_by_id<T: DeserializeOwned>(
    store: &dyn Store,
    table: &'static TableDef,
    id: i64,
    data: Row,
    missing: &str,
) -> Result<T, AppError> {
    if store.find(table, &Filter::eq(table.pk, id)).await?.is_none() {
        return Err(AppError::NotFound(missing.to_string()));
    }
    if data.is_empty() {
        return Err(AppError::Validation("Nenhum campo para atualizar.".into()));
    }
    match store.update(table, data, &Filter::eq(table.pk, id)).await?.into_iter().next() {
        Some(row) => decode(row),
        None => Err(AppError::NotFound(missing.to_string())),
    }
}

/// Friendly duplicate check ahead of an insert; the unique constraint still backs it.
pub(crate) async fn ensure_absent(
    store: &dyn Store,
    table: &'static TableDef,
    column: &str,
    value: &str,
    message: &str,
) -> Result<(), AppError> {
    if store.find(table, &Filter::eq(column, value)).await?.is_some() {
        return Err(AppError::Conflict(message.to_string()));
    }
    Ok(())
}

/// Insert one row and decode the created record.
pub(crate) async fn create<T: DeserializeOwned>(
    store: &dyn Store,
    table: &'static TableDef,
    data: Row,
) -> Result<T, AppError> {
    let row = store
        .insert(table, data)
        .await?
        .ok_or_else(|| AppError::DataAccess(format!("insert into {} returned no row", table.name)))?;
    decode(row)
}
