use crate::gateway::{GatewayError, PaymentGateway, SessionCreated, SessionRequest, VerifiedPayment};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

pub struct MockGateway {
    pub session_id: String,
    pub session_url: String,
    pub fail_create: bool,
    pub fail_verify: bool,
    verify_result: Mutex<VerifiedPayment>,
    verify_calls: AtomicUsize,
}

impl MockGateway {
    pub fn new() -> Self {
        Self::returning("", "PENDING")
    }

    pub fn returning(session_id: &str, status: &str) -> Self {
        Self {
            session_id: session_id.to_string(),
            session_url: "https://checkout.invalid/session".to_string(),
            fail_create: false,
            fail_verify: false,
            verify_result: Mutex::new(VerifiedPayment {
                status: status.to_string(),
                merchant_order_id: None,
                order_reference: None,
                raw: serde_json::json!({"source": "mock", "status": status}),
            }),
            verify_calls: AtomicUsize::new(0),
        }
    }

    pub fn set_verified(&self, status: &str) {
        let mut result = self
            .verify_result
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        result.status = status.to_string();
        result.raw = serde_json::json!({"source": "mock", "status": status});
    }

    pub fn verify_calls(&self) -> usize {
        self.verify_calls.load(Ordering::SeqCst)
    }
}

impl Default for MockGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl PaymentGateway for MockGateway {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn create_session(&self, request: &SessionRequest) -> Result<SessionCreated, GatewayError> {
        if self.fail_create {
            return Err(GatewayError::Provider {
                status: 400,
                body: "mock decline".to_string(),
            });
        }

        let session_id = if self.session_id.is_empty() {
            format!("mock_{}", uuid::Uuid::new_v4())
        } else {
            self.session_id.clone()
        };

        Ok(SessionCreated {
            session_id: Some(session_id.clone()),
            session_url: self.session_url.clone(),
            raw: serde_json::json!({
                "source": "mock",
                "sessionId": session_id,
                "merchantOrderId": request.merchant_order_id,
            }),
        })
    }

    async fn verify_session(&self, _session_id: &str) -> Result<VerifiedPayment, GatewayError> {
        self.verify_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_verify {
            return Err(GatewayError::Provider {
                status: 503,
                body: "mock verification outage".to_string(),
            });
        }

        Ok(self
            .verify_result
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone())
    }
}
