use crate::store::{NewPaymentRecord, PaymentRecord, RecordStore};
use anyhow::Result;
use chrono::Utc;
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use uuid::Uuid;

#[derive(Default)]
pub struct MemoryRecordStore {
    records: Mutex<Vec<PaymentRecord>>,
    verification_writes: AtomicUsize,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<PaymentRecord> {
        self.records.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn verification_writes(&self) -> usize {
        self.verification_writes.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl RecordStore for MemoryRecordStore {
    async fn insert(&self, record: NewPaymentRecord) -> Result<PaymentRecord> {
        let now = Utc::now();
        let stored = PaymentRecord {
            id: Uuid::new_v4(),
            session_id: record.session_id,
            merchant_order_id: record.merchant_order_id,
            status: record.status,
            amount: record.amount,
            currency: record.currency,
            order_reference: record.order_reference,
            customer_email: record.customer_email,
            user_context: record.user_context,
            age: record.age,
            meta_data: record.meta_data,
            verified_at: record.verification.as_ref().map(|_| now),
            response: record.response,
            verification: record.verification,
            receipt_sent: false,
            receipt_response: None,
            created_at: now,
            emailed_at: None,
        };

        self.records
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(stored.clone());

        Ok(stored)
    }

    async fn find_by_session_id(&self, session_id: &str) -> Result<Option<PaymentRecord>> {
        Ok(self
            .records
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .find(|r| r.session_id.as_deref() == Some(session_id))
            .cloned())
    }

    async fn find_by_merchant_order_id(&self, merchant_order_id: &str) -> Result<Option<PaymentRecord>> {
        Ok(self
            .records
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .find(|r| r.merchant_order_id == merchant_order_id)
            .cloned())
    }

    async fn find_by_order_reference(&self, order_reference: &str) -> Result<Option<PaymentRecord>> {
        Ok(self
            .records
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .find(|r| {
                payload_reference(r.response.as_ref()) == Some(order_reference)
                    || payload_reference(r.verification.as_ref()) == Some(order_reference)
            })
            .cloned())
    }

    async fn update_verification(&self, id: Uuid, status: &str, verification: &Value) -> Result<()> {
        let mut records = self.records.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(record) = records.iter_mut().find(|r| r.id == id) {
            record.status = status.to_string();
            record.verification = Some(verification.clone());
            record.verified_at = Some(Utc::now());
            self.verification_writes.fetch_add(1, Ordering::SeqCst);
        }

        Ok(())
    }

    async fn mark_receipt_sent(&self, id: Uuid, receipt_response: &Value) -> Result<()> {
        let mut records = self.records.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(record) = records.iter_mut().find(|r| r.id == id) {
            record.receipt_sent = true;
            record.receipt_response = Some(receipt_response.clone());
            record.emailed_at = Some(Utc::now());
        }

        Ok(())
    }
}

fn payload_reference(payload: Option<&Value>) -> Option<&str> {
    let payload = payload?;
    payload
        .pointer("/orderReference")
        .or_else(|| payload.pointer("/body/orderReference"))
        .and_then(Value::as_str)
}
