use crate::gateway::{GatewayError, PaymentGateway, SessionCreated, SessionRequest, VerifiedPayment};
use serde_json::{json, Value};

const TEST_BASE_URL: &str = "https://test-api.kashier.io";
const LIVE_BASE_URL: &str = "https://api.kashier.io";

pub struct KashierGateway {
    pub live: bool,
    pub merchant_id: String,
    pub api_key: String,
    pub secret: String,
    pub timeout_ms: u64,
    pub client: reqwest::Client,
}

impl KashierGateway {
    fn base_url(&self) -> &'static str {
        if self.live {
            LIVE_BASE_URL
        } else {
            TEST_BASE_URL
        }
    }
}

#[async_trait::async_trait]
impl PaymentGateway for KashierGateway {
    fn name(&self) -> &'static str {
        "kashier"
    }

    async fn create_session(&self, request: &SessionRequest) -> Result<SessionCreated, GatewayError> {
        let url = format!("{}/v3/sessions", self.base_url());
        let expiry = (chrono::Utc::now() + chrono::Duration::hours(1)).timestamp_millis();
        let body = json!({
            "merchantId": self.merchant_id,
            "amount": request.amount,
            "currency": request.currency,
            "merchantOrderId": request.merchant_order_id,
            "merchantRedirect": request.merchant_redirect,
            "description": request.description,
            "customerEmail": request.customer_email,
            "customerReference": request.customer_reference,
            "expiryDate": expiry,
            "failureAttempts": 3,
            "type": "credit",
            "defaultMethod": "card",
            "allowedMethods": "card",
            // retrieving saved cards triggers an unauthenticated browser call on the
            // hosted page, so the feature stays off
            "saveCard": "none",
            "serverWebhook": request.webhook_url,
        });

        let resp = self
            .client
            .post(url)
            .header("Authorization", &self.api_key)
            .json(&body)
            .timeout(std::time::Duration::from_millis(self.timeout_ms))
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(GatewayError::Provider {
                status: status.as_u16(),
                body,
            });
        }

        let raw: Value = resp.json().await?;
        let session_id = pluck_string(&raw, &["/body/sessionId", "/sessionId"]);
        let session_url = pluck_string(&raw, &["/body/sessionUrl", "/sessionUrl", "/body/redirectUrl", "/redirectUrl"])
            .ok_or(GatewayError::MalformedResponse("session url"))?;

        Ok(SessionCreated {
            session_id,
            session_url,
            raw,
        })
    }

    async fn verify_session(&self, session_id: &str) -> Result<VerifiedPayment, GatewayError> {
        let url = format!("{}/v3/sessions/{}/payment", self.base_url(), session_id);
        let resp = self
            .client
            .get(url)
            .header("Authorization", &self.secret)
            .header("merchantId", &self.merchant_id)
            .timeout(std::time::Duration::from_millis(self.timeout_ms))
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(GatewayError::Provider {
                status: status.as_u16(),
                body,
            });
        }

        let raw: Value = resp.json().await?;
        let payment_status = pluck_string(&raw, &["/body/status", "/status"])
            .ok_or(GatewayError::MalformedResponse("payment status"))?
            .to_ascii_uppercase();

        Ok(VerifiedPayment {
            status: payment_status,
            merchant_order_id: pluck_string(&raw, &["/body/merchantOrderId", "/merchantOrderId"]),
            order_reference: pluck_string(&raw, &["/body/orderReference", "/orderReference"]),
            raw,
        })
    }
}

fn pluck_string(raw: &Value, pointers: &[&str]) -> Option<String> {
    pointers.iter().find_map(|p| {
        raw.pointer(p).and_then(|v| match v {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
    })
}
