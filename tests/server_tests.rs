// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Method, Request, StatusCode, header};
use mizan::db;
use mizan::notary::{DisabledNotary, HashChainNotary, Notarizer};
use mizan::server::{self, AppState};
use mizan::workflow::StatusPolicy;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt;

fn state_with(notary: Arc<dyn Notarizer>) -> AppState {
    let conn = db::open_in_memory().unwrap();
    AppState::new(conn, notary, StatusPolicy::Strict, "$")
}

fn app_with(notary: Arc<dyn Notarizer>) -> Router {
    server::router(state_with(notary))
}

fn app() -> Router {
    app_with(Arc::new(HashChainNotary::new(db::open_in_memory().unwrap())))
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Vec<u8>) {
    let mut req = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(v) => {
            req = req.header(header::CONTENT_TYPE, "application/json");
            Body::from(v.to_string())
        }
        None => Body::empty(),
    };
    let resp = app.clone().oneshot(req.body(body).unwrap()).await.unwrap();
    let status = resp.status();
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    (status, bytes.to_vec())
}

async fn send_json(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let (status, bytes) = send(app, method, uri, body).await;
    (status, serde_json::from_slice(&bytes).unwrap())
}

fn money(v: &Value) -> Decimal {
    v.as_str().unwrap().parse().unwrap()
}

fn deal_body(client_id: i64) -> Value {
    json!({
        "client_id": client_id,
        "asset_name": "Toyota Camry",
        "asset_price": 100000,
        "annual_profit_rate": 5,
        "duration_months": 12,
        "down_payment_percentage": 0.2,
        "security_deposit": 0,
        // ignored: totals are always recomputed
        "total_cost": 1,
    })
}

async fn seed_client(app: &Router) -> i64 {
    let (status, body) = send_json(
        app,
        Method::POST,
        "/api/clients",
        Some(json!({"name": "Aisha Rahman", "email": "aisha@example.com", "credit_score": 700})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["id"].as_i64().unwrap()
}

#[tokio::test]
async fn health_reports_ok() {
    let (status, body) = send_json(&app(), Method::GET, "/", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert!(body["uptime_secs"].is_u64());
}

#[tokio::test]
async fn calculate_returns_summary_and_schedule() {
    let (status, body) = send_json(
        &app(),
        Method::POST,
        "/api/calculate",
        Some(json!({
            "asset_price": 100000,
            "annual_profit_rate": 0.05,
            "duration_months": 12,
            "down_payment_percentage": 0.2
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(money(&body["summary"]["total_cost"]), dec!(84000));
    assert_eq!(money(&body["summary"]["monthly_installment"]), dec!(7000));
    assert_eq!(body["schedule"].as_array().unwrap().len(), 12);
    assert_eq!(money(&body["schedule"][11]["remaining_balance"]), Decimal::ZERO);
}

#[tokio::test]
async fn calculate_validation_error_names_field() {
    let (status, body) = send_json(
        &app(),
        Method::POST,
        "/api/calculate",
        Some(json!({"asset_price": -5, "annual_profit_rate": 0.05, "duration_months": 12})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "ValidationError");
    assert_eq!(body["field"], "asset_price");
    assert_eq!(body["code"], 400);
}

#[tokio::test]
async fn malformed_json_is_a_bad_request() {
    let app = app();
    let req = Request::builder()
        .method(Method::POST)
        .uri("/api/calculate")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn contract_lifecycle_over_http() {
    let app = app();
    let client_id = seed_client(&app).await;

    let (status, body) =
        send_json(&app, Method::POST, "/api/contracts", Some(deal_body(client_id))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["contract"]["status"], "DRAFT");
    assert_eq!(money(&body["contract"]["summary"]["total_cost"]), dec!(84000));
    assert!(body["blockchain_hash"].is_string());
    assert!(body["message"].is_string());
    let id = body["contract"]["id"].as_i64().unwrap();

    let (status, body) =
        send_json(&app, Method::GET, &format!("/api/contracts/{}", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["asset_name"], "Toyota Camry");

    let (status, body) = send_json(
        &app,
        Method::POST,
        "/api/update_status",
        Some(json!({"contract_id": id, "status": "ASSET_OWNED"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "InvalidTransition");

    let (status, body) = send_json(
        &app,
        Method::POST,
        "/api/update_status",
        Some(json!({"contract_id": id, "status": "PROMISE"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "PROMISE");
    assert_eq!(body["contract"]["status"], "PROMISE");

    let (status, body) = send_json(
        &app,
        Method::POST,
        "/api/update_status",
        Some(json!({"contract_id": id, "status": "SIGNED"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "InvalidStatus");

    let (status, body) = send_json(&app, Method::GET, "/api/dashboard", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["contracts"], 1);
    assert_eq!(body["active_deals"], 1);
    assert_eq!(body["chart_data"].as_array().unwrap().len(), 6);

    let (status, body) = send_json(&app, Method::GET, "/api/contracts", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn disabled_notary_returns_warning_not_error() {
    let app = app_with(Arc::new(DisabledNotary));
    let client_id = seed_client(&app).await;
    let (status, body) =
        send_json(&app, Method::POST, "/api/contracts", Some(deal_body(client_id))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(body["blockchain_hash"].is_null());
    assert!(
        body["blockchain_warning"]
            .as_str()
            .unwrap()
            .starts_with("Contract saved locally.")
    );
}

#[tokio::test]
async fn missing_things_are_not_found() {
    let app = app();
    let (status, body) = send_json(&app, Method::GET, "/api/contracts/42", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "ContractNotFound");

    let (status, body) =
        send_json(&app, Method::POST, "/api/contracts", Some(deal_body(7))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "ClientNotFound");

    let (status, _) = send_json(&app, Method::GET, "/api/nope", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn contract_requires_client_id() {
    let app = app();
    let mut body = deal_body(1);
    body.as_object_mut().unwrap().remove("client_id");
    let (status, body) = send_json(&app, Method::POST, "/api/contracts", Some(body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["field"], "client_id");
}

#[tokio::test]
async fn generate_contract_returns_text_attachment() {
    let app = app();
    let client_id = seed_client(&app).await;
    let (_, created) =
        send_json(&app, Method::POST, "/api/contracts", Some(deal_body(client_id))).await;
    let id = created["contract"]["id"].as_i64().unwrap();

    let req = Request::builder()
        .method(Method::POST)
        .uri("/api/generate-contract")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(json!({"contract_id": id, "kind": "sale"}).to_string()))
        .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let disposition = resp.headers()[header::CONTENT_DISPOSITION].to_str().unwrap().to_string();
    assert!(disposition.contains(&format!("Murabaha_Contract_{}.txt", id)));
    let text = String::from_utf8(
        to_bytes(resp.into_body(), usize::MAX).await.unwrap().to_vec(),
    )
    .unwrap();
    assert!(text.contains("MURABAHA SALE AGREEMENT"));
    assert!(text.contains("Aisha Rahman"));
    assert!(text.contains("... and 7 more installments"));

    let (status, body) = send_json(
        &app,
        Method::POST,
        "/api/generate-contract",
        Some(json!({"contract_id": id, "kind": "invoice"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["field"], "kind");
}

#[tokio::test]
async fn asset_price_above_ceiling_is_a_validation_error() {
    let app = app();
    let client_id = seed_client(&app).await;
    let mut body = deal_body(client_id);
    body["asset_price"] = json!("50000000000000000000000000000");
    let (status, body) = send_json(&app, Method::POST, "/api/contracts", Some(body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["field"], "asset_price");
}

#[tokio::test]
async fn failed_dashboard_does_not_take_the_server_down() {
    let state = state_with(Arc::new(DisabledNotary));
    let db = state.db.clone();
    let app = server::router(state);
    let client_id = seed_client(&app).await;
    for _ in 0..2 {
        let (status, _) =
            send_json(&app, Method::POST, "/api/contracts", Some(deal_body(client_id))).await;
        assert_eq!(status, StatusCode::CREATED);
    }
    db.lock()
        .unwrap()
        .execute(
            "UPDATE contracts SET asset_price = ?1, total_cost = ?1",
            ["50000000000000000000000000000"],
        )
        .unwrap();

    let (status, body) = send_json(&app, Method::GET, "/api/dashboard", None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "InternalServerError");

    let (status, body) = send_json(&app, Method::GET, "/api/clients", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
}
