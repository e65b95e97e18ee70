#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use redetrade_api::schema::{TableDef, ACCOUNTS, USERS};
use redetrade_api::store::{Filter, Row};
use redetrade_api::{app, AppState, MemoryStore, OutboxMailer, Settings, Store};
use serde_json::{json, Value};
use tower::ServiceExt;

pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryStore>,
    pub outbox: Arc<OutboxMailer>,
    pub state: AppState,
}

impl TestApp {
    pub fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        let outbox = Arc::new(OutboxMailer::new());
        let state = AppState::new(store.clone(), outbox.clone(), Settings::for_tests());
        TestApp {
            router: app(state.clone()),
            store,
            outbox,
            state,
        }
    }

    pub async fn send(&self, method: &str, uri: &str, body: Option<Value>, token: Option<&str>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {}", token));
        }
        let request = match body {
            Some(b) => builder
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_string(&b).unwrap()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.send("GET", uri, None, None).await
    }

    pub async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send("POST", uri, Some(body), None).await
    }

    pub async fn put(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send("PUT", uri, Some(body), None).await
    }

    pub async fn delete(&self, uri: &str) -> (StatusCode, Value) {
        self.send("DELETE", uri, None, None).await
    }

    /// Create a user through the API; `extra` fields are merged into the body.
    pub async fn create_user(&self, email: &str, extra: Value) -> Value {
        let mut body = json!({ "nome": "Teste", "email": email, "senha": "segredo123" });
        if let (Some(b), Some(e)) = (body.as_object_mut(), extra.as_object()) {
            for (k, v) in e {
                b.insert(k.clone(), v.clone());
            }
        }
        let (status, user) = self.post("/criar-usuario", body).await;
        assert_eq!(status, StatusCode::CREATED, "create user failed: {}", user);
        user
    }

    pub async fn login(&self, login: &str, senha: &str) -> String {
        let (status, body) = self.post("/login", json!({ "login": login, "senha": senha })).await;
        assert_eq!(status, StatusCode::OK, "login failed: {}", body);
        body["token"].as_str().unwrap().to_string()
    }

    pub async fn row(&self, table: &'static TableDef, id: i64) -> Option<Row> {
        self.store.find(table, &Filter::eq(table.pk, id)).await.unwrap()
    }

    pub async fn user_row(&self, id: i64) -> Row {
        self.row(&USERS, id).await.expect("user row exists")
    }

    /// Id of the account opened for a user at sign-up.
    pub async fn account_of(&self, user_id: i64) -> i64 {
        let row = self
            .store
            .find(&ACCOUNTS, &Filter::eq("usuarioId", user_id))
            .await
            .unwrap()
            .expect("account exists");
        row["idConta"].as_i64().unwrap()
    }

    pub async fn count(&self, table: &'static TableDef) -> u64 {
        self.store.count(table, &Filter::all()).await.unwrap()
    }

    pub async fn insert(&self, table: &'static TableDef, data: Value) -> Row {
        let Value::Object(data) = data else { panic!("insert needs an object") };
        self.store.insert(table, data).await.unwrap().expect("row inserted")
    }
}

pub fn id_of(v: &Value, key: &str) -> i64 {
    v[key].as_i64().unwrap_or_else(|| panic!("{} missing in {}", key, v))
}
