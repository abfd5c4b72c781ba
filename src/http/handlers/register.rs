use crate::domain::registration::RegistrationRequest;
use crate::AppState;
use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::Json;

pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegistrationRequest>,
) -> Response {
    match state.registrations.register(req).await {
        Ok(data) => (axum::http::StatusCode::OK, Json(data)).into_response(),
        // this path reports errors as plain text
        Err((status, message)) => (status, message).into_response(),
    }
}
