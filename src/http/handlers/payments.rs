use crate::domain::payment::{CreateSessionRequest, FulfillRequest, StatusQuery};
use crate::error::ApiError;
use crate::AppState;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::Value;

pub async fn create_session(
    State(state): State<AppState>,
    Json(req): Json<CreateSessionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let resp = state.payments.create_session(req).await?;
    Ok((StatusCode::OK, Json(resp)))
}

pub async fn webhook(
    State(state): State<AppState>,
    Json(notification): Json<Value>,
) -> Result<impl IntoResponse, ApiError> {
    state.payments.reconcile_webhook(notification).await?;
    Ok((StatusCode::OK, "OK"))
}

pub async fn status(
    State(state): State<AppState>,
    Query(query): Query<StatusQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let resp = state.payments.status(query).await?;
    Ok((StatusCode::OK, Json(resp)))
}

pub async fn fulfill(
    State(state): State<AppState>,
    Json(req): Json<FulfillRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let resp = state.payments.fulfill(req).await?;
    Ok((StatusCode::OK, Json(resp)))
}
