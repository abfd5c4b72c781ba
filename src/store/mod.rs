use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

pub mod memory;
pub mod postgres;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRecord {
    pub id: Uuid,
    pub session_id: Option<String>,
    pub merchant_order_id: String,
    pub status: String,
    pub amount: f64,
    pub currency: String,
    pub order_reference: Option<String>,
    pub customer_email: Option<String>,
    pub user_context: Option<Value>,
    pub age: Option<i32>,
    pub meta_data: Option<Value>,
    pub response: Option<Value>,
    pub verification: Option<Value>,
    pub receipt_sent: bool,
    pub receipt_response: Option<Value>,
    pub created_at: DateTime<Utc>,
    pub verified_at: Option<DateTime<Utc>>,
    pub emailed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default)]
pub struct NewPaymentRecord {
    pub session_id: Option<String>,
    pub merchant_order_id: String,
    pub status: String,
    pub amount: f64,
    pub currency: String,
    pub order_reference: Option<String>,
    pub customer_email: Option<String>,
    pub user_context: Option<Value>,
    pub age: Option<i32>,
    pub meta_data: Option<Value>,
    pub response: Option<Value>,
    pub verification: Option<Value>,
}

#[async_trait::async_trait]
pub trait RecordStore: Send + Sync {
    async fn insert(&self, record: NewPaymentRecord) -> Result<PaymentRecord>;

    async fn find_by_session_id(&self, session_id: &str) -> Result<Option<PaymentRecord>>;

    async fn find_by_merchant_order_id(&self, merchant_order_id: &str) -> Result<Option<PaymentRecord>>;

    /// Matches a provider-assigned order reference against the raw payloads
    /// retained on the record, not a dedicated column.
    async fn find_by_order_reference(&self, order_reference: &str) -> Result<Option<PaymentRecord>>;

    async fn update_verification(&self, id: Uuid, status: &str, verification: &Value) -> Result<()>;

    async fn mark_receipt_sent(&self, id: Uuid, receipt_response: &Value) -> Result<()>;
}
