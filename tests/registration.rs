use axum::http::StatusCode;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use workshop_backend::domain::registration::RegistrationRequest;
use workshop_backend::notify::{AutomationClient, AutomationError};
use workshop_backend::service::registration_service::RegistrationService;

struct RecordingAutomation {
    calls: AtomicUsize,
    last_payload: Mutex<Option<Value>>,
    fail: bool,
}

impl RecordingAutomation {
    fn new(fail: bool) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            last_payload: Mutex::new(None),
            fail,
        }
    }
}

#[async_trait::async_trait]
impl AutomationClient for RecordingAutomation {
    async fn dispatch(&self, payload: &Value) -> Result<Value, AutomationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_payload.lock().unwrap_or_else(|e| e.into_inner()) = Some(payload.clone());
        if self.fail {
            return Err(AutomationError::Endpoint {
                status: 500,
                body: "script failure".to_string(),
            });
        }
        Ok(json!({"result": "registered"}))
    }
}

fn request(body: Value) -> RegistrationRequest {
    serde_json::from_value(body).expect("request json")
}

#[tokio::test]
async fn requires_name_and_email() {
    let svc = RegistrationService { automation: None };

    for body in [
        json!({"email": "a@b.c"}),
        json!({"name": "Omar"}),
        json!({"name": "  ", "email": "a@b.c"}),
    ] {
        let (status, _) = svc.register(request(body)).await.expect_err("invalid");
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}

#[tokio::test]
async fn unconfigured_automation_is_a_server_error() {
    let svc = RegistrationService { automation: None };

    let (status, message) = svc
        .register(request(json!({"name": "Omar", "email": "omar@example.org"})))
        .await
        .expect_err("unconfigured");

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(message.contains("not configured"));
}

#[tokio::test]
async fn forwards_submission_and_wraps_response() {
    let automation = Arc::new(RecordingAutomation::new(false));
    let svc = RegistrationService {
        automation: Some(automation.clone()),
    };

    let data = svc
        .register(request(json!({
            "workshopId": "ws-7",
            "name": "Omar",
            "email": "omar@example.org",
            "phone": "+201000000000",
            "governorate": "Cairo",
            "program_title": "Robotics Summer Camp"
        })))
        .await
        .expect("registered");

    assert_eq!(data["success"], json!(true));
    assert_eq!(data["data"]["result"], json!("registered"));
    assert_eq!(automation.calls.load(Ordering::SeqCst), 1);

    let payload = automation
        .last_payload
        .lock()
        .unwrap_or_else(|e| e.into_inner())
        .clone()
        .expect("payload forwarded");
    assert_eq!(payload["type"], json!("workshop_registration"));
    assert_eq!(payload["workshopId"], json!("ws-7"));
    assert_eq!(payload["email"], json!("omar@example.org"));
}

#[tokio::test]
async fn automation_error_maps_to_bad_gateway() {
    let automation = Arc::new(RecordingAutomation::new(true));
    let svc = RegistrationService {
        automation: Some(automation),
    };

    let (status, message) = svc
        .register(request(json!({"name": "Omar", "email": "omar@example.org"})))
        .await
        .expect_err("automation down");

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(message.contains("automation error"));
}
