// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! JSON API over the store, for the browser front end.

use anyhow::Context;
use axum::{
    Json, Router,
    extract::{Path, State, rejection::JsonRejection},
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::documents::{self, DocumentKind};
use crate::models::{Client, Contract, Dashboard, NewClient, NewContract, NewContractRequest};
use crate::murabaha::{self, CalcError, Calculation, RawDeal};
use crate::notary::Notarizer;
use crate::store::{self, StoreError};
use crate::workflow::{ContractStatus, StatusPolicy, TransitionError};

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Mutex<Connection>>,
    pub notary: Arc<dyn Notarizer>,
    pub policy: StatusPolicy,
    pub currency: String,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(
        conn: Connection,
        notary: Arc<dyn Notarizer>,
        policy: StatusPolicy,
        currency: impl Into<String>,
    ) -> Self {
        Self {
            db: Arc::new(Mutex::new(conn)),
            notary,
            policy,
            currency: currency.into(),
            started_at: Instant::now(),
        }
    }
}

// ---- errors ----

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    error: String,
    message: String,
    field: Option<&'static str>,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
    code: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    field: Option<&'static str>,
}

impl ApiError {
    pub fn new(status: StatusCode, error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status,
            error: error.into(),
            message: message.into(),
            field: None,
        }
    }

    pub fn bad_request(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, error, message)
    }

    pub fn not_found(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, error, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "InternalServerError", message)
    }

    fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field: Some(field),
            ..Self::bad_request("ValidationError", message)
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(error = %self.error, message = %self.message, "request failed");
        }
        let payload = ErrorResponse {
            error: self.error,
            message: self.message,
            code: self.status.as_u16(),
            field: self.field,
        };
        (self.status, Json(payload)).into_response()
    }
}

impl From<CalcError> for ApiError {
    fn from(e: CalcError) -> Self {
        match e.field() {
            Some(field) => ApiError::validation(field, e.to_string()),
            None => ApiError::bad_request("ComputationError", e.to_string()),
        }
    }
}

impl From<TransitionError> for ApiError {
    fn from(e: TransitionError) -> Self {
        let kind = match e {
            TransitionError::UnknownStatus(_) => "InvalidStatus",
            _ => "InvalidTransition",
        };
        ApiError::bad_request(kind, e.to_string())
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        let message = e.to_string();
        match e {
            StoreError::Calc(e) => e.into(),
            StoreError::Transition(e) => e.into(),
            StoreError::InvalidField { field, .. } => ApiError::validation(field, message),
            StoreError::ClientNotFound(_) => ApiError::not_found("ClientNotFound", message),
            StoreError::ContractNotFound(_) => ApiError::not_found("ContractNotFound", message),
            _ => ApiError::internal(message),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(e: JsonRejection) -> Self {
        ApiError::bad_request("InvalidJson", e.body_text())
    }
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;

// ---- routing ----

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(health))
        .route("/api/calculate", post(calculate))
        .route("/api/clients", get(list_clients).post(create_client))
        .route("/api/contracts", get(list_contracts).post(create_contract))
        .route("/api/contracts/:id", get(get_contract))
        .route("/api/update_status", post(update_status))
        .route("/api/dashboard", get(dashboard))
        .route("/api/generate-contract", post(generate_contract))
        .fallback(route_not_found)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn run(state: AppState, addr: SocketAddr) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Bind {}", addr))?;
    tracing::info!(%addr, notary = state.notary.name(), "API server listening");
    println!("Listening on http://{}", addr);
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "could not listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}

/// Runs `f` against the shared connection on the blocking pool.
async fn with_db<T, F>(state: &AppState, f: F) -> ApiResult<T>
where
    F: FnOnce(&Connection) -> ApiResult<T> + Send + 'static,
    T: Send + 'static,
{
    let db = state.db.clone();
    tokio::task::spawn_blocking(move || {
        // a panicked request must not lock everyone else out
        let conn = db.lock().unwrap_or_else(|poisoned| {
            tracing::warn!("recovering poisoned database lock");
            poisoned.into_inner()
        });
        f(&conn)
    })
    .await
    .map_err(|e| ApiError::internal(format!("database task failed: {}", e)))?
}

fn today() -> chrono::NaiveDate {
    chrono::Local::now().date_naive()
}

// ---- handlers ----

async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "uptime_secs": state.started_at.elapsed().as_secs(),
    }))
}

async fn route_not_found() -> ApiError {
    ApiError::not_found("RouteNotFound", "No such endpoint")
}

async fn calculate(body: Result<Json<RawDeal>, JsonRejection>) -> ApiResult<Json<Calculation>> {
    let Json(raw) = body?;
    let params = raw.into_params()?;
    Ok(Json(murabaha::calculate_today(&params)?))
}

async fn list_clients(State(state): State<AppState>) -> ApiResult<Json<Vec<Client>>> {
    let clients = with_db(&state, |conn| Ok(store::list_clients(conn)?)).await?;
    Ok(Json(clients))
}

async fn create_client(
    State(state): State<AppState>,
    body: Result<Json<NewClient>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Client>)> {
    let Json(new) = body?;
    let client = with_db(&state, move |conn| Ok(store::create_client(conn, &new)?)).await?;
    Ok((StatusCode::CREATED, Json(client)))
}

async fn list_contracts(State(state): State<AppState>) -> ApiResult<Json<Vec<Contract>>> {
    let contracts = with_db(&state, |conn| Ok(store::list_contracts(conn)?)).await?;
    Ok(Json(contracts))
}

async fn get_contract(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Contract>> {
    let contract = with_db(&state, move |conn| {
        store::get_contract(conn, id)?.ok_or(ApiError::from(StoreError::ContractNotFound(id)))
    })
    .await?;
    Ok(Json(contract))
}

async fn create_contract(
    State(state): State<AppState>,
    body: Result<Json<NewContractRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let Json(req) = body?;
    let client_id = req
        .client_id
        .ok_or_else(|| ApiError::validation("client_id", "client_id is required"))?;
    let asset_name = req
        .asset_name
        .ok_or_else(|| ApiError::validation("asset_name", "asset_name is required"))?;
    let new = NewContract {
        client_id,
        asset_name,
        deal: req.deal.into_params()?,
    };

    let notary = state.notary.clone();
    let created = with_db(&state, move |conn| {
        Ok(store::create_contract(conn, notary.as_ref(), &new, today())?)
    })
    .await?;

    let mut body = json!({
        "contract": created.contract,
        "blockchain_hash": created.contract.blockchain_hash,
    });
    match &created.warning {
        Some(w) => body["blockchain_warning"] = json!(w),
        None => {
            body["message"] = json!(format!(
                "Contract created and recorded by the {} notary",
                state.notary.name()
            ))
        }
    }
    Ok((StatusCode::CREATED, Json(body)))
}

#[derive(Debug, Deserialize)]
struct UpdateStatusRequest {
    #[serde(default)]
    contract_id: Option<i64>,
    #[serde(default)]
    status: Option<String>,
}

async fn update_status(
    State(state): State<AppState>,
    body: Result<Json<UpdateStatusRequest>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    let Json(req) = body?;
    let id = req
        .contract_id
        .ok_or_else(|| ApiError::validation("contract_id", "contract_id is required"))?;
    let to: ContractStatus = req
        .status
        .ok_or_else(|| ApiError::validation("status", "status is required"))?
        .parse()?;
    let policy = state.policy;
    let contract = with_db(&state, move |conn| {
        Ok(store::update_status(conn, id, to, policy)?)
    })
    .await?;
    Ok(Json(json!({
        "message": format!("Contract {} moved to {}", id, to),
        "status": to,
        "contract": contract,
    })))
}

async fn dashboard(State(state): State<AppState>) -> ApiResult<Json<Dashboard>> {
    let d = with_db(&state, |conn| Ok(store::dashboard(conn, today())?)).await?;
    Ok(Json(d))
}

#[derive(Debug, Deserialize)]
struct GenerateRequest {
    #[serde(default)]
    contract_id: Option<i64>,
    #[serde(default)]
    kind: Option<String>,
}

async fn generate_contract(
    State(state): State<AppState>,
    body: Result<Json<GenerateRequest>, JsonRejection>,
) -> ApiResult<Response> {
    let Json(req) = body?;
    let id = req
        .contract_id
        .ok_or_else(|| ApiError::validation("contract_id", "contract_id is required"))?;
    let kind: DocumentKind = req
        .kind
        .as_deref()
        .unwrap_or("sale")
        .parse()
        .map_err(|e: anyhow::Error| ApiError::validation("kind", e.to_string()))?;

    let (contract, client) = with_db(&state, move |conn| {
        let contract = store::get_contract(conn, id)?.ok_or(StoreError::ContractNotFound(id))?;
        let client = store::get_client(conn, contract.client_id)?;
        Ok((contract, client))
    })
    .await?;

    let text = documents::render(kind, &contract, client.as_ref(), &state.currency);
    let disposition = HeaderValue::from_str(&format!(
        "attachment; filename=\"{}\"",
        kind.file_name(id)
    ))
    .map_err(|e| ApiError::internal(e.to_string()))?;
    Ok((
        [
            (
                header::CONTENT_TYPE,
                HeaderValue::from_static("text/plain; charset=utf-8"),
            ),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        text,
    )
        .into_response())
}
