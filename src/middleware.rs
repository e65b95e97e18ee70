//! Bearer-token authentication and the blocked-account guard.

use async_trait::async_trait;
use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::Response,
};
use serde_json::Value;

use crate::auth::{AccountKind, Claims};
use crate::error::AppError;
use crate::schema::{SUB_ACCOUNTS, USERS};
use crate::state::AppState;
use crate::store::Filter;

/// Reject requests without a valid bearer token; put the claims in the request extensions.
pub async fn verify_token(State(state): State<AppState>, mut request: Request, next: Next) -> Result<Response, AppError> {
    let token = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::Unauthorized("Token não fornecido.".into()))?;
    let claims = state.jwt.verify_token(token)?;
    request.extensions_mut().insert(claims);
    Ok(next.run(request).await)
}

/// Reject authenticated accounts flagged `bloqueado`. Must run after [`verify_token`].
pub async fn check_blocked(State(state): State<AppState>, request: Request, next: Next) -> Result<Response, AppError> {
    let claims = request
        .extensions()
        .get::<Claims>()
        .cloned()
        .ok_or_else(|| AppError::Unauthorized("Token não fornecido.".into()))?;
    let table = match claims.kind {
        AccountKind::Usuario => &USERS,
        AccountKind::Subconta => &SUB_ACCOUNTS,
    };
    let row = state
        .store
        .find(table, &Filter::eq(table.pk, claims.subject_id()?))
        .await?
        .ok_or_else(|| AppError::Unauthorized("Conta não encontrada.".into()))?;
    if row.get("bloqueado").and_then(Value::as_bool).unwrap_or(false) {
        tracing::info!(sub = %claims.sub, "blocked account rejected");
        return Err(AppError::Forbidden("Conta bloqueada.".into()));
    }
    Ok(next.run(request).await)
}

/// Claims of the authenticated caller, as left by [`verify_token`].
pub struct AuthUser(pub Claims);

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Claims>()
            .cloned()
            .map(AuthUser)
            .ok_or_else(|| AppError::Unauthorized("Token não fornecido.".into()))
    }
}
