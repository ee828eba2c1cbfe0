//! API endpoint handlers

use super::extractors::JsonExtractor;
use super::types::*;
use crate::error::ServerError;
use axum::{
    body::Bytes,
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use sentra_runtime::Metrics;
use sentra_sdk::{
    AuditActor, MetricsSnapshot, RuntimeConfig, RuntimeConfigPatch, SimulationReport,
    SystemHealth, Transaction, TransactionRequest, DEFAULT_RECENT_LIMIT,
    DEFAULT_SIMULATION_COUNT,
};
use tracing::info;

/// Health check endpoint
pub(super) async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Score and persist one transaction
pub(super) async fn create_transaction(
    State(state): State<AppState>,
    JsonExtractor(payload): JsonExtractor<TransactionRequest>,
) -> Result<(StatusCode, Json<Transaction>), ServerError> {
    let transaction = state.pipeline.create(payload).await?;
    Ok((StatusCode::CREATED, Json(transaction)))
}

/// Most recent transactions, newest first
pub(super) async fn list_transactions(
    State(state): State<AppState>,
    Query(query): Query<TransactionListQuery>,
) -> Result<Json<TransactionListResponse>, ServerError> {
    let limit = query.limit.unwrap_or(DEFAULT_RECENT_LIMIT);
    let transactions = state.pipeline.recent(limit).await?;

    Ok(Json(TransactionListResponse {
        count: transactions.len(),
        transactions,
    }))
}

pub(super) async fn get_settings(
    State(state): State<AppState>,
) -> Result<Json<RuntimeConfig>, ServerError> {
    Ok(Json(state.settings.get().await?))
}

/// Apply a partial settings update; the actor is taken from request headers
pub(super) async fn update_settings(
    State(state): State<AppState>,
    headers: HeaderMap,
    JsonExtractor(patch): JsonExtractor<RuntimeConfigPatch>,
) -> Result<Json<RuntimeConfig>, ServerError> {
    let actor = actor_from_headers(&headers);
    let updated = state.settings.update(patch, actor).await?;
    info!("Runtime settings updated");
    Ok(Json(updated))
}

pub(super) async fn start_simulation(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<SimulationReport>, ServerError> {
    let payload = if body.iter().all(u8::is_ascii_whitespace) {
        SimulationStartPayload::default()
    } else {
        serde_json::from_slice::<SimulationStartPayload>(&body)
            .map_err(|e| ServerError::InvalidRequest(format!("Invalid JSON data: {}", e)))?
    };

    let count = payload.count.unwrap_or(DEFAULT_SIMULATION_COUNT);
    let report = state.simulation.start(count).await?;
    Ok(Json(report))
}

pub(super) async fn system_health(State(state): State<AppState>) -> Json<SystemHealth> {
    Json(state.health.report().await)
}

/// Pipeline counters and latency histograms
pub(super) async fn metrics(State(state): State<AppState>) -> Json<MetricsSnapshot> {
    Json(state.pipeline.metrics().snapshot())
}

fn actor_from_headers(headers: &HeaderMap) -> Option<AuditActor> {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    let actor = AuditActor {
        actor_id: header("x-actor-id"),
        actor_email: header("x-actor-email"),
        ip_address: header("x-forwarded-for")
            .and_then(|v| v.split(',').next().map(|ip| ip.trim().to_string())),
    };

    if actor == AuditActor::default() {
        None
    } else {
        Some(actor)
    }
}
