use crate::domain::registration::RegistrationRequest;
use crate::notify::AutomationClient;
use axum::http::StatusCode;
use serde_json::{json, Value};
use std::sync::Arc;

#[derive(Clone)]
pub struct RegistrationService {
    pub automation: Option<Arc<dyn AutomationClient>>,
}

impl RegistrationService {
    pub async fn register(&self, req: RegistrationRequest) -> Result<Value, (StatusCode, String)> {
        if req.name.trim().is_empty() || req.email.trim().is_empty() {
            return Err((StatusCode::BAD_REQUEST, "name and email are required".to_string()));
        }

        let automation = self.automation.as_ref().ok_or((
            StatusCode::INTERNAL_SERVER_ERROR,
            "registration automation endpoint is not configured".to_string(),
        ))?;

        let mut payload = serde_json::to_value(&req).unwrap_or_else(|_| json!({}));
        if let Some(obj) = payload.as_object_mut() {
            obj.insert("type".to_string(), Value::String("workshop_registration".to_string()));
        }

        match automation.dispatch(&payload).await {
            Ok(data) => Ok(json!({"success": true, "data": data})),
            Err(e) => {
                tracing::error!(email = %req.email, error = %e, "registration forwarding failed");
                Err((StatusCode::BAD_GATEWAY, format!("registration automation error: {e}")))
            }
        }
    }
}
