mod common;

use axum::http::StatusCode;
use common::{id_of, TestApp};
use redetrade_api::schema::{INVOICES, SUB_ACCOUNTS};
use serde_json::{json, Value};

async fn invoice(app: &TestApp, body: Value) -> Value {
    let (status, created) = app.post("/criar-cobranca", body).await;
    assert_eq!(status, StatusCode::CREATED, "create invoice failed: {}", created);
    created
}

#[tokio::test]
async fn create_invoice_defaults_to_pending() {
    let app = TestApp::new();
    let user = app.create_user("ana@x.com", json!({})).await;
    let created = invoice(
        &app,
        json!({
            "valorFatura": 150.5,
            "usuarioId": user["idUsuario"],
            "vencimentoFatura": "2024-05-10",
            "referencia": "05/2024"
        }),
    )
    .await;
    assert_eq!(created["status"], "Pendente");
    assert_eq!(created["valorFatura"].as_f64(), Some(150.5));
    assert_eq!(created["vencimentoFatura"], "2024-05-10");

    let (status, _) = app
        .post("/criar-cobranca", json!({ "valorFatura": 10.0, "vencimentoFatura": "10/05/2024" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = app
        .post("/criar-cobranca", json!({ "valorFatura": 10.0, "status": "Pago" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = app
        .post("/criar-cobranca", json!({ "valorFatura": 10.0, "usuarioId": 999 }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(app.count(&INVOICES).await, 1);
}

#[tokio::test]
async fn next_invoice_is_the_latest_due_date() {
    let app = TestApp::new();
    let user = app.create_user("ana@x.com", json!({})).await;
    let uid = user["idUsuario"].clone();
    for (due, value) in [("2024-03-10", 10.0), ("2024-01-10", 20.0), ("2024-03-10", 30.0)] {
        invoice(&app, json!({ "valorFatura": value, "usuarioId": uid, "vencimentoFatura": due })).await;
    }

    let (status, body) = app.get(&format!("/listar-proxima-fatura/{}", uid)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["proximaFatura"], "2024-03-10");
    let values: Vec<f64> = body["cobrancas"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["valorFatura"].as_f64().unwrap())
        .collect();
    assert_eq!(values, vec![10.0, 30.0]);

    let (status, body) = app.get("/listar-proxima-fatura/999").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Nenhuma cobrança encontrada para o usuário.");
}

#[tokio::test]
async fn open_invoices_of_a_user() {
    let app = TestApp::new();
    let user = app.create_user("ana@x.com", json!({})).await;
    let uid = user["idUsuario"].clone();
    invoice(&app, json!({ "valorFatura": 10.0, "usuarioId": uid, "status": "Quitado" })).await;

    let (status, body) = app.get(&format!("/listar-cobrancas/{}", uid)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));

    invoice(&app, json!({ "valorFatura": 20.0, "usuarioId": uid, "status": "Atrasado" })).await;
    invoice(&app, json!({ "valorFatura": 30.0, "usuarioId": uid })).await;
    let (_, body) = app.get(&format!("/listar-cobrancas/{}", uid)).await;
    let statuses: Vec<&str> = body.as_array().unwrap().iter().map(|c| c["status"].as_str().unwrap()).collect();
    assert_eq!(statuses, vec!["Atrasado", "Pendente"]);

    let (status, body) = app.get("/listar-cobrancas/999").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Usuário ou subconta não encontrado.");
}

#[tokio::test]
async fn sub_account_invoices_are_the_fallback() {
    let app = TestApp::new();
    let sub = app
        .insert(&SUB_ACCOUNTS, json!({ "nome": "Caixa", "email": "caixa@x.com", "senha": "hash" }))
        .await;
    let sub_id = sub["idSubContas"].as_i64().unwrap();
    invoice(&app, json!({ "valorFatura": 12.0, "subContaId": sub_id, "status": "Quitado" })).await;

    let (status, body) = app.get(&format!("/listar-cobrancas/{}", sub_id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["subContaId"], sub_id);
}

#[tokio::test]
async fn update_and_delete_invoice() {
    let app = TestApp::new();
    let created = invoice(&app, json!({ "valorFatura": 10.0 })).await;
    let id = id_of(&created, "idCobranca");

    let (status, body) = app
        .put(&format!("/atualizar-cobranca/{}", id), json!({ "status": "Quitado" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "Quitado");
    assert_eq!(body["valorFatura"].as_f64(), Some(10.0));

    let (status, body) = app.put("/atualizar-cobranca/999", json!({ "valorFatura": 1.0 })).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Cobrança não encontrada.");
    assert_eq!(app.count(&INVOICES).await, 1);

    let (status, all) = app.get("/listar-todas-cobrancas").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(all.as_array().unwrap().len(), 1);

    let (status, _) = app.delete(&format!("/deletar-cobranca/{}", id)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = app.delete(&format!("/deletar-cobranca/{}", id)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(app.count(&INVOICES).await, 0);
}
