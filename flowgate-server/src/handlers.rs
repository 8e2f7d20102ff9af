//! Request handlers.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use flowgate_core::{DisplaySnapshot, SubmitReport};
use serde::{Deserialize, Serialize};

use crate::error::{ServerError, ServerResult};
use crate::state::AppState;

/// Body of `POST /session`
#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub id_token: String,
}

/// Body of `POST /chat`
#[derive(Debug, Clone, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

/// Reply to `POST /chat`
#[derive(Debug, Clone, Serialize)]
pub struct ChatResponse {
    pub report: SubmitReport,
    pub snapshot: DisplaySnapshot,
}

fn required<'a>(value: &'a str, field: &str) -> ServerResult<&'a str> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ServerError::InvalidRequest(format!(
            "{} must not be empty",
            field
        )));
    }
    Ok(value)
}

pub(crate) async fn login(
    State(state): State<AppState>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> ServerResult<StatusCode> {
    let Json(request) = body?;
    let token = required(&request.id_token, "id_token")?;

    state.orchestrator.login(token)?;
    log::info!("session started over http");
    Ok(StatusCode::NO_CONTENT)
}

pub(crate) async fn logout(State(state): State<AppState>) -> StatusCode {
    state.orchestrator.logout();
    log::info!("session ended over http");
    StatusCode::NO_CONTENT
}

pub(crate) async fn chat(
    State(state): State<AppState>,
    body: Result<Json<ChatRequest>, JsonRejection>,
) -> ServerResult<Json<ChatResponse>> {
    let Json(request) = body?;
    let message = required(&request.message, "message")?;

    let report = state.orchestrator.submit(message).await;
    let snapshot = state.orchestrator.snapshot();
    Ok(Json(ChatResponse { report, snapshot }))
}

pub(crate) async fn snapshot(State(state): State<AppState>) -> Json<DisplaySnapshot> {
    Json(state.orchestrator.snapshot())
}

pub(crate) async fn reset_flow(State(state): State<AppState>) -> StatusCode {
    state.orchestrator.reset_flow();
    StatusCode::NO_CONTENT
}
