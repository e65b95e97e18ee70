//! Plans and their assignment to accounts.

use axum::{extract::State, response::IntoResponse};
use serde::Serialize;
use serde_json::Value;

use crate::error::AppError;
use crate::extractors::{ApiPath, ApiQuery, ValidJson};
use crate::handlers::{create, ensure_absent, fetch, update_by_id};
use crate::models::{Account, CreatePlanRequest, PageQuery, Plan, UpdatePlanRequest, User};
use crate::response::{self, PageMeta};
use crate::schema::{ACCOUNTS, PLANS, USERS};
use crate::state::AppState;
use crate::store::{decode, decode_all, to_row, Filter, Row};

pub async fn create_plan(
    State(state): State<AppState>,
    ValidJson(req): ValidJson<CreatePlanRequest>,
) -> Result<impl IntoResponse, AppError> {
    let store = state.store.as_ref();
    ensure_absent(store, &PLANS, "nomePlano", &req.nome_plano, "Já existe um plano com o mesmo nome.").await?;
    let plan: Plan = create(store, &PLANS, to_row(&req)?).await?;
    tracing::info!(id = plan.id_plano, "plan created");
    Ok(response::created(plan))
}

pub async fn list_plans(
    State(state): State<AppState>,
    ApiQuery(q): ApiQuery<PageQuery>,
) -> Result<impl IntoResponse, AppError> {
    let page = q.request(10);
    let result = state.store.paginate(&PLANS, &Filter::all(), page).await?;
    let plans: Vec<Plan> = decode_all(result.rows)?;
    Ok(response::paged(plans, PageMeta::new(page, result.total)))
}

fn plan_link(plano_id: Option<i64>) -> Row {
    let mut data = Row::new();
    data.insert("planoId".into(), plano_id.map(Value::from).unwrap_or(Value::Null));
    data
}

pub async fn assign_plan(
    State(state): State<AppState>,
    ApiPath((account_id, plan_id)): ApiPath<(i64, i64)>,
) -> Result<impl IntoResponse, AppError> {
    const MISSING: &str = "Conta ou plano não encontrados.";
    let store = state.store.as_ref();
    fetch::<Account>(store, &ACCOUNTS, account_id, MISSING).await?;
    fetch::<Plan>(store, &PLANS, plan_id, MISSING).await?;
    let account: Account = update_by_id(store, &ACCOUNTS, account_id, plan_link(Some(plan_id)), MISSING).await?;
    tracing::info!(account_id, plan_id, "plan assigned");
    Ok(response::ok(account))
}

#[derive(Serialize)]
struct PlanRemoved {
    conta: Account,
    usuario: Option<User>,
}

pub async fn remove_plan(
    State(state): State<AppState>,
    ApiPath(account_id): ApiPath<i64>,
) -> Result<impl IntoResponse, AppError> {
    let store = state.store.as_ref();
    let conta: Account = update_by_id(store, &ACCOUNTS, account_id, plan_link(None), "Conta não encontrada.").await?;
    let usuario = store
        .find(&USERS, &Filter::eq("idUsuario", conta.usuario_id))
        .await?
        .map(decode::<User>)
        .transpose()?;
    tracing::info!(account_id, "plan removed");
    Ok(response::ok(PlanRemoved { conta, usuario }))
}

pub async fn update_plan(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ValidJson(req): ValidJson<UpdatePlanRequest>,
) -> Result<impl IntoResponse, AppError> {
    let plan: Plan = update_by_id(state.store.as_ref(), &PLANS, id, to_row(&req)?, "Plano não encontrado.").await?;
    tracing::info!(id, "plan updated");
    Ok(response::ok(plan))
}
