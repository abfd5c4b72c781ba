use crate::AppState;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;

pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    (
        axum::http::StatusCode::OK,
        Json(serde_json::json!({
            "ok": true,
            "appsScriptConfigured": state.registrations.automation.is_some(),
        })),
    )
}
