use serde_json::Value;

pub mod kashier;
pub mod mock;

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("provider returned HTTP {status}: {body}")]
    Provider { status: u16, body: String },
    #[error("provider request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("provider response missing {0}")]
    MalformedResponse(&'static str),
}

#[derive(Debug, Clone)]
pub struct SessionRequest {
    pub amount: f64,
    pub currency: String,
    pub merchant_order_id: String,
    pub merchant_redirect: String,
    pub description: Option<String>,
    pub customer_email: Option<String>,
    pub customer_reference: Option<String>,
    pub webhook_url: String,
}

#[derive(Debug, Clone)]
pub struct SessionCreated {
    pub session_id: Option<String>,
    pub session_url: String,
    pub raw: Value,
}

#[derive(Debug, Clone)]
pub struct VerifiedPayment {
    pub status: String,
    pub merchant_order_id: Option<String>,
    pub order_reference: Option<String>,
    pub raw: Value,
}

#[async_trait::async_trait]
pub trait PaymentGateway: Send + Sync {
    fn name(&self) -> &'static str;

    async fn create_session(&self, request: &SessionRequest) -> Result<SessionCreated, GatewayError>;

    async fn verify_session(&self, session_id: &str) -> Result<VerifiedPayment, GatewayError>;
}
