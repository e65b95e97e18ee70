//! Invoices (cobranças).

use axum::{extract::State, http::StatusCode, response::IntoResponse};

use crate::error::AppError;
use crate::extractors::{ApiPath, ValidJson};
use crate::handlers::{create, fetch, update_by_id};
use crate::models::{CreateInvoiceRequest, Invoice, InvoiceStatus, NextInvoice, UpdateInvoiceRequest, User};
use crate::response;
use crate::schema::{INVOICES, SUB_ACCOUNTS, USERS};
use crate::state::AppState;
use crate::store::{decode_all, to_row, Filter, SelectOptions};

const INVOICE_NOT_FOUND: &str = "Cobrança não encontrada.";

pub async fn create_invoice(
    State(state): State<AppState>,
    ValidJson(req): ValidJson<CreateInvoiceRequest>,
) -> Result<impl IntoResponse, AppError> {
    let invoice: Invoice = create(state.store.as_ref(), &INVOICES, to_row(&req)?).await?;
    tracing::info!(id = invoice.id_cobranca, "invoice created");
    Ok(response::created(invoice))
}

pub async fn next_invoice(
    State(state): State<AppState>,
    ApiPath(user_id): ApiPath<i64>,
) -> Result<impl IntoResponse, AppError> {
    let invoices: Vec<Invoice> = decode_all(
        state
            .store
            .select(
                &INVOICES,
                &Filter::eq("usuarioId", user_id),
                &SelectOptions::order_asc("vencimentoFatura"),
            )
            .await?,
    )?;
    let next = NextInvoice::from_invoices(invoices)
        .ok_or_else(|| AppError::NotFound("Nenhuma cobrança encontrada para o usuário.".into()))?;
    Ok(response::ok(next))
}

/// Open invoices of a user; failing that, every invoice of the sub-account with that id.
pub async fn list_invoices(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<impl IntoResponse, AppError> {
    let store = state.store.as_ref();
    let open = Filter::eq("usuarioId", id).and_ne("status", InvoiceStatus::Quitado.as_str());
    let invoices: Vec<Invoice> = decode_all(store.select(&INVOICES, &open, &SelectOptions::default()).await?)?;
    if !invoices.is_empty() {
        return Ok(response::ok(invoices));
    }
    if store.find(&SUB_ACCOUNTS, &Filter::eq("idSubContas", id)).await?.is_some() {
        let invoices: Vec<Invoice> = decode_all(
            store
                .select(&INVOICES, &Filter::eq("subContaId", id), &SelectOptions::default())
                .await?,
        )?;
        return Ok(response::ok(invoices));
    }
    fetch::<User>(store, &USERS, id, "Usuário ou subconta não encontrado.").await?;
    Ok(response::ok(Vec::<Invoice>::new()))
}

pub async fn list_all_invoices(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let invoices: Vec<Invoice> = decode_all(
        state
            .store
            .select(&INVOICES, &Filter::all(), &SelectOptions::default())
            .await?,
    )?;
    Ok(response::ok(invoices))
}

pub async fn update_invoice(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ValidJson(req): ValidJson<UpdateInvoiceRequest>,
) -> Result<impl IntoResponse, AppError> {
    let invoice: Invoice = update_by_id(state.store.as_ref(), &INVOICES, id, to_row(&req)?, INVOICE_NOT_FOUND).await?;
    tracing::info!(id, "invoice updated");
    Ok(response::ok(invoice))
}

pub async fn delete_invoice(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<impl IntoResponse, AppError> {
    let deleted = state.store.delete(&INVOICES, &Filter::eq("idCobranca", id)).await?;
    if deleted.is_empty() {
        return Err(AppError::NotFound(INVOICE_NOT_FOUND.into()));
    }
    tracing::info!(id, "invoice deleted");
    Ok(StatusCode::NO_CONTENT)
}
