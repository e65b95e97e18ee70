//! Rede Trade API: users, plans, categories and billing over PostgreSQL.

pub mod auth;
pub mod config;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod mail;
pub mod middleware;
pub mod migration;
pub mod models;
pub mod response;
pub mod routes;
pub mod schema;
pub mod sql;
pub mod state;
pub mod store;

pub use config::{DbKind, Settings};
pub use error::{AppError, ConfigError};
pub use mail::{LogMailer, Mailer, OutboxMailer};
pub use migration::apply_migrations;
pub use routes::api_routes;
pub use state::AppState;
pub use store::{ensure_database_exists, MemoryStore, PgStore, Store};

use axum::Router;
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};

/// Largest accepted request body.
pub const MAX_BODY_BYTES: usize = 1024 * 1024;

/// The full service: every route plus request tracing and the body size limit.
pub fn app(state: AppState) -> Router {
    api_routes(state)
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
}
