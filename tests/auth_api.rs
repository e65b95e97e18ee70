mod common;

use axum::http::StatusCode;
use common::{id_of, TestApp};
use redetrade_api::auth::{hash_password, MIN_BCRYPT_COST, RESET_TOKEN_LEN};
use redetrade_api::schema::SUB_ACCOUNTS;
use serde_json::{json, Value};

#[tokio::test]
async fn login_by_email_or_cpf() {
    let app = TestApp::new();
    app.create_user("ana@x.com", json!({ "cpf": "12345678909" })).await;

    let (status, body) = app.post("/login", json!({ "login": "ana@x.com", "senha": "segredo123" })).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["token"].as_str().is_some_and(|t| !t.is_empty()));
    assert_eq!(body["user"]["email"], "ana@x.com");
    assert!(body["user"].get("senha").is_none());
    assert!(body["user"].get("tokenResetSenha").is_none());

    let claims = app.state.jwt.verify_token(body["token"].as_str().unwrap()).unwrap();
    assert_eq!(claims.sub, body["user"]["idUsuario"].to_string());
    assert_eq!(claims.exp - claims.iat, 3600);

    let (status, _) = app.post("/login", json!({ "login": "12345678909", "senha": "segredo123" })).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn login_failures() {
    let app = TestApp::new();
    app.create_user("ana@x.com", json!({})).await;

    let (status, body) = app.post("/login", json!({ "login": "ana@x.com", "senha": "errada" })).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Credenciais inválidas.");

    let (status, body) = app.post("/login", json!({ "login": "ninguem@x.com", "senha": "x" })).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Usuário não encontrado.");

    let (status, _) = app.post("/login", json!({ "login": "", "senha": "x" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn sub_accounts_log_in_after_users() {
    let app = TestApp::new();
    let hash = hash_password("senhaSub1", MIN_BCRYPT_COST).unwrap();
    app.insert(
        &SUB_ACCOUNTS,
        json!({ "nome": "Caixa", "email": "caixa@x.com", "senha": hash }),
    )
    .await;

    let (status, body) = app.post("/login", json!({ "login": "caixa@x.com", "senha": "senhaSub1" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["idSubContas"], 1);
    let token = body["token"].as_str().unwrap().to_string();

    let (status, body) = app.send("GET", "/user-info", None, Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], "caixa@x.com");
    assert!(body.get("senha").is_none());
}

#[tokio::test]
async fn user_info_requires_valid_token() {
    let app = TestApp::new();
    let user = app.create_user("ana@x.com", json!({ "nome": "Ana" })).await;
    let token = app.login("ana@x.com", "segredo123").await;

    let (status, body) = app.send("GET", "/user-info", None, Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["idUsuario"], user["idUsuario"]);

    let (status, body) = app.get("/user-info").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Token não fornecido.");

    let (status, _) = app.send("GET", "/user-info", None, Some("abc.def.ghi")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

fn token_from_link(body: &str) -> String {
    let start = body.find("token=").expect("reset link in mail") + "token=".len();
    body[start..start + RESET_TOKEN_LEN].to_string()
}

#[tokio::test]
async fn password_reset_round_trip() {
    let app = TestApp::new();
    let user = app.create_user("ana@x.com", json!({ "cpf": "12345678909" })).await;
    let id = id_of(&user, "idUsuario");

    let (status, body) = app
        .post("/solicitar-redefinicao-senha-usuario", json!({ "cpf": "12345678909" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Um link para redefinição de senha foi enviado para o seu email.");

    let sent = app.outbox.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, "ana@x.com");
    assert!(sent[0]
        .body
        .contains(&format!("https://app.redetrade.com.br/resetPassword?id={}&token=", id)));
    let token = token_from_link(&sent[0].body);
    assert_eq!(app.user_row(id).await["tokenResetSenha"], token.as_str());

    let uri = format!("/redefinir-senha-usuario/{}", id);
    let (status, body) = app.post(&uri, json!({ "novaSenha": "novaSenha1", "token": token })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Senha atualizada com sucesso");
    assert!(body["usuarioSemSenha"].get("senha").is_none());
    assert_eq!(app.user_row(id).await["tokenResetSenha"], Value::Null);

    app.login("ana@x.com", "novaSenha1").await;
    let (status, _) = app.post("/login", json!({ "login": "ana@x.com", "senha": "segredo123" })).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // single use
    let (status, _) = app.post(&uri, json!({ "novaSenha": "outraSenha1", "token": token })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn password_reset_rejects_wrong_token_without_writing() {
    let app = TestApp::new();
    let user = app.create_user("ana@x.com", json!({})).await;
    let id = id_of(&user, "idUsuario");
    let (status, _) = app
        .post("/solicitar-redefinicao-senha-usuario", json!({ "email": "ana@x.com" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    let before = app.user_row(id).await;

    let (status, body) = app
        .post(
            &format!("/redefinir-senha-usuario/{}", id),
            json!({ "novaSenha": "novaSenha1", "token": "x".repeat(RESET_TOKEN_LEN) }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Token de redefinição de senha inválido.");

    let after = app.user_row(id).await;
    assert_eq!(before["senha"], after["senha"]);
    assert_eq!(before["tokenResetSenha"], after["tokenResetSenha"]);

    // right token, wrong user
    let token = before["tokenResetSenha"].as_str().unwrap();
    let (status, _) = app
        .post("/redefinir-senha-usuario/999", json!({ "novaSenha": "novaSenha1", "token": token }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn password_reset_request_needs_a_known_identifier() {
    let app = TestApp::new();
    let (status, body) = app.post("/solicitar-redefinicao-senha-usuario", json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "É necessário fornecer um email ou CPF.");

    let (status, _) = app
        .post("/solicitar-redefinicao-senha-usuario", json!({ "email": "ninguem@x.com" }))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(app.outbox.sent().is_empty());
}
