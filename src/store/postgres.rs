use crate::store::{NewPaymentRecord, PaymentRecord, RecordStore};
use anyhow::Result;
use serde_json::Value;
use sqlx::{PgPool, Row};
use uuid::Uuid;

#[derive(Clone)]
pub struct PgRecordStore {
    pub pool: PgPool,
}

const RECORD_COLUMNS: &str = r#"
    id, session_id, merchant_order_id, status, amount, currency, order_reference,
    customer_email, user_context, age, meta_data, response, verification,
    receipt_sent, receipt_response, created_at, verified_at, emailed_at
"#;

#[async_trait::async_trait]
impl RecordStore for PgRecordStore {
    async fn insert(&self, record: NewPaymentRecord) -> Result<PaymentRecord> {
        let id = Uuid::new_v4();
        let row = sqlx::query(
            r#"
            INSERT INTO payment_records (
                id, session_id, merchant_order_id, status, amount, currency,
                order_reference, customer_email, user_context, age, meta_data,
                response, verification, verified_at
            ) VALUES (
                $1, $2, $3, $4, $5, $6,
                $7, $8, $9, $10, $11,
                $12, $13, CASE WHEN $13::jsonb IS NULL THEN NULL ELSE now() END
            )
            RETURNING created_at, verified_at
            "#,
        )
        .bind(id)
        .bind(record.session_id.clone())
        .bind(record.merchant_order_id.clone())
        .bind(record.status.clone())
        .bind(record.amount)
        .bind(record.currency.clone())
        .bind(record.order_reference.clone())
        .bind(record.customer_email.clone())
        .bind(record.user_context.clone())
        .bind(record.age)
        .bind(record.meta_data.clone())
        .bind(record.response.clone())
        .bind(record.verification.clone())
        .fetch_one(&self.pool)
        .await?;

        Ok(PaymentRecord {
            id,
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
            response: record.response,
            verification: record.verification,
            receipt_sent: false,
            receipt_response: None,
            created_at: row.get("created_at"),
            verified_at: row.get("verified_at"),
            emailed_at: None,
        })
    }

    async fn find_by_session_id(&self, session_id: &str) -> Result<Option<PaymentRecord>> {
        let row = sqlx::query(&format!(
            "SELECT {RECORD_COLUMNS} FROM payment_records WHERE session_id = $1 ORDER BY created_at DESC LIMIT 1"
        ))
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(from_row))
    }

    async fn find_by_merchant_order_id(&self, merchant_order_id: &str) -> Result<Option<PaymentRecord>> {
        let row = sqlx::query(&format!(
            "SELECT {RECORD_COLUMNS} FROM payment_records WHERE merchant_order_id = $1 ORDER BY created_at DESC LIMIT 1"
        ))
        .bind(merchant_order_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(from_row))
    }

    async fn find_by_order_reference(&self, order_reference: &str) -> Result<Option<PaymentRecord>> {
        let row = sqlx::query(&format!(
            r#"
            SELECT {RECORD_COLUMNS} FROM payment_records
            WHERE response->>'orderReference' = $1
               OR response->'body'->>'orderReference' = $1
               OR verification->>'orderReference' = $1
               OR verification->'body'->>'orderReference' = $1
            ORDER BY created_at DESC LIMIT 1
            "#
        ))
        .bind(order_reference)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(from_row))
    }

    async fn update_verification(&self, id: Uuid, status: &str, verification: &Value) -> Result<()> {
        sqlx::query(
            "UPDATE payment_records SET status = $2, verification = $3, verified_at = now() WHERE id = $1",
        )
        .bind(id)
        .bind(status)
        .bind(verification)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn mark_receipt_sent(&self, id: Uuid, receipt_response: &Value) -> Result<()> {
        sqlx::query(
            "UPDATE payment_records SET receipt_sent = true, receipt_response = $2, emailed_at = now() WHERE id = $1",
        )
        .bind(id)
        .bind(receipt_response)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

fn from_row(row: sqlx::postgres::PgRow) -> PaymentRecord {
    PaymentRecord {
        id: row.get("id"),
        session_id: row.get("session_id"),
        merchant_order_id: row.get("merchant_order_id"),
        status: row.get("status"),
        amount: row.get("amount"),
        currency: row.get("currency"),
        order_reference: row.get("order_reference"),
        customer_email: row.get("customer_email"),
        user_context: row.get("user_context"),
        age: row.get("age"),
        meta_data: row.get("meta_data"),
        response: row.get("response"),
        verification: row.get("verification"),
        receipt_sent: row.get("receipt_sent"),
        receipt_response: row.get("receipt_response"),
        created_at: row.get("created_at"),
        verified_at: row.get("verified_at"),
        emailed_at: row.get("emailed_at"),
    }
}
