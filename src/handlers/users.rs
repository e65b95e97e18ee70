//! Users, permissions and account-type queries.

use axum::{extract::State, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeSet;

use crate::auth::{hash_password, AccountKind, Claims};
use crate::error::AppError;
use crate::extractors::{ApiPath, ApiQuery, ValidJson};
use crate::handlers::{create, ensure_absent, fetch, update_by_id};
use crate::middleware::AuthUser;
use crate::models::{
    Account, AccountType, AccountTypeFilter, CreateUserRequest, PageQuery, PermissionsRequest, Plan,
    UpdateUserRequest, User, UserSearchQuery, TIPOS_FRANQUIA, TIPO_ASSOCIADO,
};
use crate::response::{self, PageMeta};
use crate::schema::{ACCOUNTS, ACCOUNT_TYPES, PLANS, USERS};
use crate::state::AppState;
use crate::store::{decode, decode_all, to_row, Filter, Row, SelectOptions, Store};

const USER_NOT_FOUND: &str = "Usuário não encontrado.";
const PERMISSION_RETRIES: usize = 5;

pub async fn create_user(
    State(state): State<AppState>,
    ValidJson(req): ValidJson<CreateUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    let store = state.store.as_ref();
    ensure_absent(store, &USERS, "email", &req.email, "Usuário já existe.").await?;
    if let Some(cpf) = &req.cpf {
        ensure_absent(store, &USERS, "cpf", cpf, "CPF já cadastrado.").await?;
    }
    if let Some(plano_id) = req.plano_id {
        fetch::<Plan>(store, &PLANS, plano_id, "Plano não encontrado.").await?;
    }
    let tipo_da_conta_id = match req.tipo_da_conta.as_deref() {
        Some(name) => Some(account_type_id(store, name).await?),
        None => None,
    };

    let mut data = to_row(&req)?;
    data.remove("tipoDaConta");
    data.remove("planoId");
    data.insert(
        "senha".into(),
        Value::String(hash_password(&req.senha, state.settings.bcrypt_cost)?),
    );
    let user: User = create(store, &USERS, data).await?;

    if tipo_da_conta_id.is_some() || req.plano_id.is_some() {
        let mut account = Row::new();
        account.insert("usuarioId".into(), user.id_usuario.into());
        account.insert("planoId".into(), req.plano_id.into());
        account.insert("tipoDaContaId".into(), tipo_da_conta_id.into());
        if let Err(e) = create::<Account>(store, &ACCOUNTS, account).await {
            // no cross-statement transactions: undo the user row by hand
            store.delete(&USERS, &Filter::eq("idUsuario", user.id_usuario)).await?;
            return Err(e);
        }
    }
    tracing::info!(id = user.id_usuario, "user created");
    Ok(response::created(user))
}

/// Id of the named account type, created on first use.
async fn account_type_id(store: &dyn Store, name: &str) -> Result<i64, AppError> {
    let filter = Filter::eq("tipoDaConta", name);
    if let Some(row) = store.find(&ACCOUNT_TYPES, &filter).await? {
        return Ok(decode::<AccountType>(row)?.id_tipo_conta);
    }
    let mut data = Row::new();
    data.insert("tipoDaConta".into(), name.into());
    match store.insert(&ACCOUNT_TYPES, data).await {
        Ok(Some(row)) => Ok(decode::<AccountType>(row)?.id_tipo_conta),
        // another request created it first
        Ok(None) | Err(AppError::Conflict(_)) => {
            let row = store
                .find(&ACCOUNT_TYPES, &filter)
                .await?
                .ok_or_else(|| AppError::DataAccess(format!("account type {} vanished", name)))?;
            Ok(decode::<AccountType>(row)?.id_tipo_conta)
        }
        Err(e) => Err(e),
    }
}

pub async fn list_users(
    State(state): State<AppState>,
    ApiQuery(q): ApiQuery<PageQuery>,
) -> Result<impl IntoResponse, AppError> {
    let page = q.request(60);
    let result = state.store.paginate(&USERS, &Filter::all(), page).await?;
    let users: Vec<User> = decode_all(result.rows)?;
    Ok(response::paged(users, PageMeta::new(page, result.total)))
}

pub async fn get_user(State(state): State<AppState>, ApiPath(id): ApiPath<i64>) -> Result<impl IntoResponse, AppError> {
    let user: User = fetch(state.store.as_ref(), &USERS, id, USER_NOT_FOUND).await?;
    Ok(response::ok(user))
}

pub async fn update_user(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    ApiPath(id): ApiPath<i64>,
    ValidJson(req): ValidJson<UpdateUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    if req.bloqueado.is_some() {
        ensure_may_change_block(state.store.as_ref(), &claims, id).await?;
    }
    let mut data = to_row(&req)?;
    if let Some(senha) = &req.senha {
        data.insert(
            "senha".into(),
            Value::String(hash_password(senha, state.settings.bcrypt_cost)?),
        );
    }
    let user: User = update_by_id(state.store.as_ref(), &USERS, id, data, USER_NOT_FOUND).await?;
    tracing::info!(id, "user updated");
    Ok(response::ok(user))
}

/// Only an unblocked user may block or unblock, and never its own account.
async fn ensure_may_change_block(store: &dyn Store, claims: &Claims, target: i64) -> Result<(), AppError> {
    let caller = claims.subject_id()?;
    if claims.kind != AccountKind::Usuario || caller == target {
        return Err(AppError::Forbidden("Sem permissão para alterar o bloqueio desta conta.".into()));
    }
    let row = store
        .find(&USERS, &Filter::eq("idUsuario", caller))
        .await?
        .ok_or_else(|| AppError::Unauthorized("Conta não encontrada.".into()))?;
    if decode::<User>(row)?.bloqueado {
        return Err(AppError::Forbidden("Conta bloqueada.".into()));
    }
    Ok(())
}

pub async fn delete_user(State(state): State<AppState>, ApiPath(id): ApiPath<i64>) -> Result<impl IntoResponse, AppError> {
    let deleted = state.store.delete(&USERS, &Filter::eq("idUsuario", id)).await?;
    if deleted.is_empty() {
        return Err(AppError::NotFound(USER_NOT_FOUND.into()));
    }
    tracing::info!(id, "user deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Rewrite a user's permission list with compare-and-swap on the stored text,
/// so concurrent edits never overwrite each other.
async fn change_permissions(
    store: &dyn Store,
    id: i64,
    change: impl Fn(Vec<String>) -> Vec<String>,
) -> Result<User, AppError> {
    for attempt in 1..=PERMISSION_RETRIES {
        let user: User = fetch(store, &USERS, id, USER_NOT_FOUND).await?;
        let next = change(user.permissions());
        let mut data = Row::new();
        data.insert("permissoesDoUsuario".into(), Value::String(serde_json::to_string(&next)?));
        let filter = Filter::eq("idUsuario", id).and_eq("permissoesDoUsuario", user.permissoes_do_usuario);
        if let Some(row) = store.update(&USERS, data, &filter).await?.into_iter().next() {
            return decode(row);
        }
        tracing::debug!(id, attempt, "permission list changed concurrently; retrying");
    }
    Err(AppError::Conflict(
        "As permissões foram alteradas por outra requisição; tente novamente.".into(),
    ))
}

pub async fn add_permissions(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ValidJson(req): ValidJson<PermissionsRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user = change_permissions(state.store.as_ref(), id, |mut current| {
        for p in &req.permissoes {
            if !current.contains(p) {
                current.push(p.clone());
            }
        }
        current
    })
    .await?;
    tracing::info!(id, "permissions added");
    Ok(response::ok(user))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PermissionsRemoved {
    message: &'static str,
    usuario_sem_senha: User,
}

pub async fn remove_permissions(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ValidJson(req): ValidJson<PermissionsRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user = change_permissions(state.store.as_ref(), id, |current| {
        current.into_iter().filter(|p| !req.permissoes.contains(p)).collect()
    })
    .await?;
    tracing::info!(id, "permissions removed");
    Ok(response::ok(PermissionsRemoved {
        message: "Permissões removidas com sucesso.",
        usuario_sem_senha: user,
    }))
}

#[derive(Serialize)]
struct Permissions {
    permissoes: Vec<String>,
}

pub async fn list_permissions(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<impl IntoResponse, AppError> {
    let user: User = fetch(state.store.as_ref(), &USERS, id, USER_NOT_FOUND).await?;
    Ok(response::ok(Permissions {
        permissoes: user.permissions(),
    }))
}

/// Ids of users holding an account of any of the named types.
async fn user_ids_with_types(store: &dyn Store, names: &[&str]) -> Result<Vec<i64>, AppError> {
    let types: Vec<AccountType> = decode_all(
        store
            .select(
                &ACCOUNT_TYPES,
                &Filter::all().and_in("tipoDaConta", names.iter().copied()),
                &SelectOptions::default(),
            )
            .await?,
    )?;
    if types.is_empty() {
        return Ok(Vec::new());
    }
    let accounts: Vec<Account> = decode_all(
        store
            .select(
                &ACCOUNTS,
                &Filter::all().and_in("tipoDaContaId", types.iter().map(|t| t.id_tipo_conta)),
                &SelectOptions::default(),
            )
            .await?,
    )?;
    let ids: BTreeSet<i64> = accounts.iter().map(|a| a.usuario_id).collect();
    Ok(ids.into_iter().collect())
}

pub async fn list_by_account_types(
    State(state): State<AppState>,
    ApiQuery(q): ApiQuery<PageQuery>,
    ValidJson(req): ValidJson<AccountTypeFilter>,
) -> Result<impl IntoResponse, AppError> {
    let store = state.store.as_ref();
    let page = q.request(100);
    let names: Vec<&str> = req.tipo_conta.iter().map(String::as_str).collect();
    let ids = user_ids_with_types(store, &names).await?;
    let result = store.paginate(&USERS, &Filter::all().and_in("idUsuario", ids), page).await?;
    let users: Vec<User> = decode_all(result.rows)?;
    Ok(response::paged(users, PageMeta::new(page, result.total)))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AccountTypeName {
    tipo_de_conta: String,
}

pub async fn account_type_of_user(
    State(state): State<AppState>,
    ApiPath(user_id): ApiPath<i64>,
) -> Result<impl IntoResponse, AppError> {
    const TYPE_NOT_FOUND: &str = "Tipo de conta não encontrado para este usuário.";
    let store = state.store.as_ref();
    fetch::<User>(store, &USERS, user_id, USER_NOT_FOUND).await?;
    let account: Option<Account> = store
        .find(&ACCOUNTS, &Filter::eq("usuarioId", user_id).and_not_null("tipoDaContaId"))
        .await?
        .map(decode::<Account>)
        .transpose()?;
    let type_id = account
        .and_then(|a| a.tipo_da_conta_id)
        .ok_or_else(|| AppError::NotFound(TYPE_NOT_FOUND.into()))?;
    let account_type: AccountType = fetch(store, &ACCOUNT_TYPES, type_id, TYPE_NOT_FOUND).await?;
    Ok(response::ok(AccountTypeName {
        tipo_de_conta: account_type.tipo_da_conta,
    }))
}

async fn created_by_with_types(store: &dyn Store, creator_id: i64, types: &[&str]) -> Result<Vec<User>, AppError> {
    let ids = user_ids_with_types(store, types).await?;
    let filter = Filter::eq("usuarioCriadorId", creator_id).and_in("idUsuario", ids);
    decode_all(store.select(&USERS, &filter, &SelectOptions::default()).await?)
}

pub async fn list_franchises(
    State(state): State<AppState>,
    ApiPath(matriz_id): ApiPath<i64>,
) -> Result<impl IntoResponse, AppError> {
    let users = created_by_with_types(state.store.as_ref(), matriz_id, &TIPOS_FRANQUIA).await?;
    Ok(response::ok(users))
}

pub async fn list_created_associates(
    State(state): State<AppState>,
    ApiPath(creator_id): ApiPath<i64>,
) -> Result<impl IntoResponse, AppError> {
    let users = created_by_with_types(state.store.as_ref(), creator_id, &[TIPO_ASSOCIADO]).await?;
    if users.is_empty() {
        return Err(AppError::NotFound("Não foi possível encontrar os associados.".into()));
    }
    Ok(response::ok(users))
}

/// Exact-match search. The account type defaults to `Associado`; that default only
/// applies once the type exists, while an explicit unknown type matches nobody.
pub async fn search_users(
    State(state): State<AppState>,
    ApiQuery(q): ApiQuery<UserSearchQuery>,
) -> Result<impl IntoResponse, AppError> {
    let store = state.store.as_ref();
    let mut filter = Filter::all();
    for (column, value) in q.text_filters() {
        filter = filter.and_eq(column, value);
    }
    if let Some(creator) = q.usuario_criador_id {
        filter = filter.and_eq("usuarioCriadorId", creator);
    }
    match q.tipo_da_conta.as_deref() {
        Some(name) => filter = filter.and_in("idUsuario", user_ids_with_types(store, &[name]).await?),
        None => {
            let associado = store.find(&ACCOUNT_TYPES, &Filter::eq("tipoDaConta", TIPO_ASSOCIADO)).await?;
            if associado.is_some() {
                filter = filter.and_in("idUsuario", user_ids_with_types(store, &[TIPO_ASSOCIADO]).await?);
            }
        }
    }

    let page = PageQuery {
        page: q.page,
        page_size: q.page_size,
    }
    .request(10);
    let result = store.paginate(&USERS, &filter, page).await?;
    let users: Vec<User> = decode_all(result.rows)?;
    Ok(response::paged(users, PageMeta::new(page, result.total).with_next_page()))
}
