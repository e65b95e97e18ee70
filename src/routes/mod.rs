//! Route tables. Guarded routes carry `verify_token`, and some also `check_blocked`.

mod common;

pub use common::common_routes;

use axum::{
    middleware::from_fn_with_state,
    routing::{delete, get, post, put},
    Router,
};

use crate::handlers::{auth, billing, categories, plans, users};
use crate::middleware::{check_blocked, verify_token};
use crate::state::AppState;

pub fn user_routes(state: AppState) -> Router {
    let open = Router::new()
        .route("/criar-usuario", post(users::create_user))
        .route("/login", post(auth::login))
        .route("/listar-usuarios", get(users::list_users))
        .route("/buscar-usuario/:id", get(users::get_user))
        .route("/listar-permissoes/:idUsuario", get(users::list_permissions))
        .route("/solicitar-redefinicao-senha-usuario", post(auth::request_password_reset))
        .route("/redefinir-senha-usuario/:idUsuario", post(auth::confirm_password_reset))
        .route("/listar-tipo-usuarios", post(users::list_by_account_types))
        .route("/buscar-tipo-de-conta/:userId", get(users::account_type_of_user))
        .route("/buscar-franquias/:matrizId", get(users::list_franchises))
        .route("/usuarios-criados/:usuarioCriadorId", get(users::list_created_associates))
        .route("/buscar-usuario-params", get(users::search_users));

    let authenticated = Router::new()
        .route("/atualizar-usuario/:id", put(users::update_user))
        .route("/user-info", get(auth::user_info))
        .route_layer(from_fn_with_state(state.clone(), verify_token));

    // layers run bottom-up: the token is verified before the blocked check
    let unblocked = Router::new()
        .route("/deletar-usuario/:id", delete(users::delete_user))
        .route("/adicionar-permissao/:idUsuario", post(users::add_permissions))
        .route("/remover-permissao/:idUsuario", delete(users::remove_permissions))
        .route_layer(from_fn_with_state(state.clone(), check_blocked))
        .route_layer(from_fn_with_state(state.clone(), verify_token));

    open.merge(authenticated).merge(unblocked).with_state(state)
}

pub fn plan_routes(state: AppState) -> Router {
    Router::new()
        .route("/criar-plano", post(plans::create_plan))
        .route("/listar-planos", get(plans::list_plans))
        .route("/atribuir-plano/:idConta/:idPlano", post(plans::assign_plan))
        .route("/remover-plano/:idConta", post(plans::remove_plan))
        .route("/atualizar-plano/:id", put(plans::update_plan))
        .with_state(state)
}

pub fn category_routes(state: AppState) -> Router {
    Router::new()
        .route("/criar-categoria", post(categories::create_category))
        .route("/criar-subcategoria/:categoryId", post(categories::create_subcategory))
        .route("/listar-categorias", get(categories::list_categories))
        .route("/atualizar-categoria/:categoryId", put(categories::update_category))
        .route("/editar-subcategoria/:subcategoryId", put(categories::edit_subcategory))
        .route("/deletar-subcategoria/:subcategoryId", delete(categories::delete_subcategory))
        .route("/deletar-categoria/:categoryId", delete(categories::delete_category))
        .with_state(state)
}

pub fn billing_routes(state: AppState) -> Router {
    Router::new()
        .route("/criar-cobranca", post(billing::create_invoice))
        .route("/listar-proxima-fatura/:id", get(billing::next_invoice))
        .route("/listar-cobrancas/:id", get(billing::list_invoices))
        .route("/listar-todas-cobrancas", get(billing::list_all_invoices))
        .route("/atualizar-cobranca/:idCobranca", put(billing::update_invoice))
        .route("/deletar-cobranca/:idCobranca", delete(billing::delete_invoice))
        .with_state(state)
}

/// Every route of the service, without outer layers.
pub fn api_routes(state: AppState) -> Router {
    Router::new()
        .merge(common_routes(state.clone()))
        .merge(user_routes(state.clone()))
        .merge(plan_routes(state.clone()))
        .merge(category_routes(state.clone()))
        .merge(billing_routes(state))
}
