//! Shared application state, built once in `main` and handed to the router.

use std::sync::Arc;

use crate::auth::{JwtConfig, JwtManager};
use crate::config::Settings;
use crate::mail::Mailer;
use crate::store::Store;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub jwt: Arc<JwtManager>,
    pub mailer: Arc<dyn Mailer>,
    pub settings: Arc<Settings>,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, mailer: Arc<dyn Mailer>, settings: Settings) -> Self {
        let jwt = JwtManager::new(JwtConfig::new(settings.jwt_secret.clone(), settings.jwt_ttl_secs));
        AppState {
            store,
            jwt: Arc::new(jwt),
            mailer,
            settings: Arc::new(settings),
        }
    }
}
