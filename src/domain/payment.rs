use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::store::PaymentRecord;

pub const STATUS_CREATED: &str = "CREATED";

const SUCCESS_STATES: [&str; 3] = ["PAID", "CAPTURED", "AUTHORIZED"];

pub fn is_success_state(status: &str) -> bool {
    SUCCESS_STATES.iter().any(|s| status.eq_ignore_ascii_case(s))
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionRequest {
    pub amount: Option<Value>,
    #[serde(default = "default_currency")]
    pub currency: String,
    pub order: Option<String>,
    pub merchant_redirect: Option<String>,
    pub description: Option<String>,
    pub customer_email: Option<String>,
    pub customer_reference: Option<String>,
    pub meta_data: Option<Value>,
    pub age: Option<i32>,
    pub user: Option<Value>,
}

fn default_currency() -> String {
    "EGP".to_string()
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionResponse {
    pub success: bool,
    pub session_url: String,
    pub raw: Value,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusQuery {
    pub merchant_order_id: Option<String>,
    pub session_id: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub status: String,
    pub verified: bool,
    pub payment: PaymentRecord,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FulfillRequest {
    pub merchant_order_id: Option<String>,
    pub session_id: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FulfillResponse {
    pub ok: bool,
    pub status: String,
    pub receipt_sent: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub receipt_response: Option<Value>,
}
