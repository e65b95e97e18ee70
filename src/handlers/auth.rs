//! Login, password reset and the caller's own profile.

use axum::{extract::State, response::IntoResponse};
use serde::Serialize;
use serde_json::Value;

use crate::auth::{generate_reset_token, hash_password, verify_password, AccountKind};
use crate::error::AppError;
use crate::extractors::{ApiPath, ValidJson};
use crate::handlers::fetch;
use crate::mail::{reset_email, reset_link};
use crate::middleware::AuthUser;
use crate::models::{LoginRequest, ResetConfirmRequest, ResetRequest, SubAccount, User};
use crate::response;
use crate::schema::{SUB_ACCOUNTS, USERS};
use crate::state::AppState;
use crate::store::{decode, Filter, Row};

const USER_NOT_FOUND: &str = "Usuário não encontrado.";

/// Either kind of login subject, serialized as the bare record.
#[derive(Serialize)]
#[serde(untagged)]
pub enum Principal {
    Usuario(User),
    Subconta(SubAccount),
}

#[derive(Serialize)]
struct LoginResponse {
    token: String,
    user: Principal,
}

pub async fn login(
    State(state): State<AppState>,
    ValidJson(req): ValidJson<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let store = state.store.as_ref();
    let filter = Filter::eq(req.lookup_column(), req.login.as_str());

    let (id, kind, hash, user) = if let Some(row) = store.find(&USERS, &filter).await? {
        let user: User = decode(row)?;
        (user.id_usuario, AccountKind::Usuario, user.senha.clone(), Principal::Usuario(user))
    } else if let Some(row) = store.find(&SUB_ACCOUNTS, &filter).await? {
        let sub: SubAccount = decode(row)?;
        (sub.id_sub_contas, AccountKind::Subconta, sub.senha.clone(), Principal::Subconta(sub))
    } else {
        return Err(AppError::NotFound(USER_NOT_FOUND.into()));
    };

    if !verify_password(&req.senha, &hash) {
        tracing::info!(id, ?kind, "login rejected");
        return Err(AppError::Unauthorized("Credenciais inválidas.".into()));
    }
    let token = state.jwt.generate_token(id, kind)?;
    tracing::info!(id, ?kind, "login");
    Ok(response::ok(LoginResponse { token, user }))
}

pub async fn request_password_reset(
    State(state): State<AppState>,
    ValidJson(req): ValidJson<ResetRequest>,
) -> Result<impl IntoResponse, AppError> {
    let store = state.store.as_ref();
    let non_empty = |v: &Option<String>| v.as_deref().map(str::trim).filter(|s| !s.is_empty()).map(str::to_string);
    let filter = match (non_empty(&req.email), non_empty(&req.cpf)) {
        (Some(email), _) => Filter::eq("email", email),
        (None, Some(cpf)) => Filter::eq("cpf", cpf),
        (None, None) => return Err(AppError::Validation("É necessário fornecer um email ou CPF.".into())),
    };
    let user: User = match store.find(&USERS, &filter).await? {
        Some(row) => decode(row)?,
        None => return Err(AppError::NotFound(USER_NOT_FOUND.into())),
    };

    let token = generate_reset_token();
    let mut data = Row::new();
    data.insert("tokenResetSenha".into(), Value::String(token.clone()));
    store
        .update(&USERS, data, &Filter::eq("idUsuario", user.id_usuario))
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| AppError::NotFound(USER_NOT_FOUND.into()))?;

    let link = reset_link(&state.settings.reset_link_base, user.id_usuario, &token);
    state.mailer.send(reset_email(&user.email, &link)).await?;
    tracing::info!(id = user.id_usuario, "password reset requested");
    Ok(response::message(
        "Um link para redefinição de senha foi enviado para o seu email.",
    ))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PasswordChanged {
    message: &'static str,
    usuario_sem_senha: User,
}

/// The id and token must match in the same statement that swaps the hash, so a token works once.
pub async fn confirm_password_reset(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ValidJson(req): ValidJson<ResetConfirmRequest>,
) -> Result<impl IntoResponse, AppError> {
    let mut data = Row::new();
    data.insert(
        "senha".into(),
        Value::String(hash_password(&req.nova_senha, state.settings.bcrypt_cost)?),
    );
    data.insert("tokenResetSenha".into(), Value::Null);
    let filter = Filter::eq("idUsuario", id).and_eq("tokenResetSenha", req.token.as_str());
    let row = state
        .store
        .update(&USERS, data, &filter)
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| AppError::Validation("Token de redefinição de senha inválido.".into()))?;
    tracing::info!(id, "password reset");
    Ok(response::ok(PasswordChanged {
        message: "Senha atualizada com sucesso",
        usuario_sem_senha: decode(row)?,
    }))
}

pub async fn user_info(State(state): State<AppState>, AuthUser(claims): AuthUser) -> Result<impl IntoResponse, AppError> {
    let store = state.store.as_ref();
    let id = claims.subject_id()?;
    let principal = match claims.kind {
        AccountKind::Usuario => Principal::Usuario(fetch(store, &USERS, id, USER_NOT_FOUND).await?),
        AccountKind::Subconta => Principal::Subconta(fetch(store, &SUB_ACCOUNTS, id, USER_NOT_FOUND).await?),
    };
    Ok(response::ok(principal))
}
