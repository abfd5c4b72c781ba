use crate::domain::payment::{
    is_success_state, CreateSessionRequest, CreateSessionResponse, FulfillRequest, FulfillResponse,
    StatusQuery, StatusResponse, STATUS_CREATED,
};
use crate::error::ApiError;
use crate::gateway::{PaymentGateway, SessionRequest, VerifiedPayment};
use crate::notify::AutomationClient;
use crate::service::reconcile;
use crate::store::{NewPaymentRecord, PaymentRecord, RecordStore};
use chrono::Utc;
use serde_json::{json, Value};
use std::sync::Arc;

#[derive(Clone)]
pub struct PaymentService {
    pub store: Arc<dyn RecordStore>,
    pub gateway: Arc<dyn PaymentGateway>,
    pub automation: Option<Arc<dyn AutomationClient>>,
    pub webhook_url: String,
}

impl PaymentService {
    pub async fn create_session(
        &self,
        req: CreateSessionRequest,
    ) -> Result<CreateSessionResponse, ApiError> {
        let amount = coerce_amount(req.amount.as_ref())
            .ok_or_else(|| ApiError::Validation("amount is required and must be numeric".to_string()))?;
        if amount <= 0.0 {
            return Err(ApiError::Validation("amount must be greater than zero".to_string()));
        }
        let merchant_redirect = req
            .merchant_redirect
            .clone()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| ApiError::Validation("merchantRedirect is required".to_string()))?;

        let merchant_order_id = req
            .order
            .clone()
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| format!("ws-{}", Utc::now().timestamp_millis()));

        let session_request = SessionRequest {
            amount,
            currency: req.currency.clone(),
            merchant_order_id: merchant_order_id.clone(),
            merchant_redirect,
            description: req.description.clone(),
            customer_email: req.customer_email.clone(),
            customer_reference: req.customer_reference.clone(),
            webhook_url: self.webhook_url.clone(),
        };

        let created = self
            .gateway
            .create_session(&session_request)
            .await
            .map_err(|e| ApiError::Gateway(e.to_string()))?;

        let record = NewPaymentRecord {
            session_id: created.session_id.clone(),
            merchant_order_id: merchant_order_id.clone(),
            status: STATUS_CREATED.to_string(),
            amount,
            currency: req.currency,
            order_reference: req.order,
            customer_email: req.customer_email,
            user_context: req.user,
            age: req.age,
            meta_data: req.meta_data,
            response: Some(created.raw.clone()),
            verification: None,
        };

        // Session creation is not rolled back when bookkeeping fails; the
        // caller still gets the checkout URL.
        if let Err(e) = self.store.insert(record).await {
            tracing::error!(%merchant_order_id, error = %e, "failed to persist payment record");
        }

        Ok(CreateSessionResponse {
            success: true,
            session_url: created.session_url,
            raw: created.raw,
        })
    }

    pub async fn reconcile_webhook(&self, notification: Value) -> Result<(), ApiError> {
        let session_id = reconcile::resolve_session_id(self.store.as_ref(), &notification)
            .await?
            .ok_or_else(|| {
                ApiError::Unreconcilable("no session identifier resolvable from notification".to_string())
            })?;

        // The notification body is untrusted; only the provider's answer counts.
        let verified = self
            .gateway
            .verify_session(&session_id)
            .await
            .map_err(|e| ApiError::Verification(e.to_string()))?;

        match self.store.find_by_session_id(&session_id).await? {
            Some(record) if record.status == verified.status => {
                tracing::info!(%session_id, status = %record.status, "notification already reconciled");
            }
            Some(record) => {
                self.store
                    .update_verification(record.id, &verified.status, &verified.raw)
                    .await?;
                tracing::info!(%session_id, from = %record.status, to = %verified.status, "payment status transition");
            }
            None => {
                self.store
                    .insert(record_from_verified(&session_id, &verified))
                    .await?;
                tracing::info!(%session_id, status = %verified.status, "record created from verified notification");
            }
        }

        Ok(())
    }

    pub async fn status(&self, query: StatusQuery) -> Result<StatusResponse, ApiError> {
        let merchant_order_id = query.merchant_order_id.filter(|s| !s.is_empty());
        let session_id = query.session_id.filter(|s| !s.is_empty());
        if merchant_order_id.is_none() && session_id.is_none() {
            return Err(ApiError::Validation(
                "merchantOrderId or sessionId is required".to_string(),
            ));
        }

        let record = self.locate(merchant_order_id.as_deref(), session_id.as_deref()).await?;

        match record {
            Some(record) if is_success_state(&record.status) => Ok(StatusResponse {
                status: record.status.clone(),
                verified: false,
                payment: record,
            }),
            Some(record) => {
                let verify_id = record.session_id.clone().or(session_id);
                match verify_id {
                    Some(verify_id) => {
                        let verified = self
                            .gateway
                            .verify_session(&verify_id)
                            .await
                            .map_err(|e| ApiError::Verification(e.to_string()))?;
                        if verified.status != record.status {
                            self.store
                                .update_verification(record.id, &verified.status, &verified.raw)
                                .await?;
                        }
                        let mut payment = record;
                        payment.status = verified.status.clone();
                        payment.verification = Some(verified.raw);
                        Ok(StatusResponse {
                            status: verified.status,
                            verified: true,
                            payment,
                        })
                    }
                    // Record was stored without a session id and the caller
                    // did not supply one; the stored state is all we have.
                    None => Ok(StatusResponse {
                        status: record.status.clone(),
                        verified: false,
                        payment: record,
                    }),
                }
            }
            None => {
                let session_id = session_id
                    .ok_or_else(|| ApiError::NotFound("no payment record found".to_string()))?;
                let verified = self
                    .gateway
                    .verify_session(&session_id)
                    .await
                    .map_err(|e| ApiError::Verification(e.to_string()))?;
                let record = self
                    .store
                    .insert(record_from_verified(&session_id, &verified))
                    .await?;
                Ok(StatusResponse {
                    status: record.status.clone(),
                    verified: true,
                    payment: record,
                })
            }
        }
    }

    pub async fn fulfill(&self, req: FulfillRequest) -> Result<FulfillResponse, ApiError> {
        let merchant_order_id = req.merchant_order_id.filter(|s| !s.is_empty());
        let session_id = req.session_id.filter(|s| !s.is_empty());
        if merchant_order_id.is_none() && session_id.is_none() {
            return Err(ApiError::Validation(
                "merchantOrderId or sessionId is required".to_string(),
            ));
        }

        let record = self
            .locate(merchant_order_id.as_deref(), session_id.as_deref())
            .await?
            .ok_or_else(|| ApiError::NotFound("no payment record found".to_string()))?;

        if record.receipt_sent {
            return Ok(FulfillResponse {
                ok: true,
                status: record.status,
                receipt_sent: true,
                receipt_response: record.receipt_response,
            });
        }

        let verify_id = record
            .session_id
            .clone()
            .or(session_id)
            .ok_or_else(|| {
                ApiError::Verification("record has no session identifier to verify".to_string())
            })?;
        let verified = self
            .gateway
            .verify_session(&verify_id)
            .await
            .map_err(|e| ApiError::Verification(e.to_string()))?;

        if !is_success_state(&verified.status) {
            if verified.status != record.status {
                if let Err(e) = self
                    .store
                    .update_verification(record.id, &verified.status, &verified.raw)
                    .await
                {
                    tracing::warn!(record_id = %record.id, error = %e, "failed to persist non-success status");
                }
            }
            return Err(ApiError::Validation(format!(
                "payment is not in a success state (status {})",
                verified.status
            )));
        }

        if verified.status != record.status {
            self.store
                .update_verification(record.id, &verified.status, &verified.raw)
                .await?;
        }

        let email = resolve_email(&record).ok_or_else(|| {
            ApiError::Validation("no email address on record for receipt dispatch".to_string())
        })?;
        let automation = self
            .automation
            .as_ref()
            .ok_or_else(|| ApiError::Configuration("APPS_SCRIPT_URL is not configured".to_string()))?;

        let payload = json!({
            "type": "payment_receipt",
            "email": email,
            "merchantOrderId": record.merchant_order_id,
            "sessionId": verify_id,
            "amount": record.amount,
            "currency": record.currency,
            "status": verified.status,
            "age": record.age,
            "user": record.user_context,
            "metaData": record.meta_data,
        });

        let receipt = automation
            .dispatch(&payload)
            .await
            .map_err(|e| ApiError::Internal(anyhow::anyhow!("receipt dispatch failed: {e}")))?;

        self.store.mark_receipt_sent(record.id, &receipt).await?;

        Ok(FulfillResponse {
            ok: true,
            status: verified.status,
            receipt_sent: true,
            receipt_response: Some(receipt),
        })
    }

    async fn locate(
        &self,
        merchant_order_id: Option<&str>,
        session_id: Option<&str>,
    ) -> Result<Option<PaymentRecord>, ApiError> {
        if let Some(merchant_order_id) = merchant_order_id {
            if let Some(record) = self.store.find_by_merchant_order_id(merchant_order_id).await? {
                return Ok(Some(record));
            }
        }
        if let Some(session_id) = session_id {
            if let Some(record) = self.store.find_by_session_id(session_id).await? {
                return Ok(Some(record));
            }
        }

        Ok(None)
    }
}

fn coerce_amount(amount: Option<&Value>) -> Option<f64> {
    match amount? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

fn resolve_email(record: &PaymentRecord) -> Option<String> {
    record.customer_email.clone().filter(|s| !s.is_empty()).or_else(|| {
        record
            .user_context
            .as_ref()
            .and_then(|u| u.pointer("/email"))
            .and_then(Value::as_str)
            .map(str::to_string)
    })
}

fn record_from_verified(session_id: &str, verified: &VerifiedPayment) -> NewPaymentRecord {
    NewPaymentRecord {
        session_id: Some(session_id.to_string()),
        merchant_order_id: verified
            .merchant_order_id
            .clone()
            .unwrap_or_else(|| session_id.to_string()),
        status: verified.status.clone(),
        amount: pluck_amount(&verified.raw).unwrap_or(0.0),
        currency: pluck_currency(&verified.raw).unwrap_or_else(|| "EGP".to_string()),
        order_reference: verified.order_reference.clone(),
        verification: Some(verified.raw.clone()),
        ..NewPaymentRecord::default()
    }
}

fn pluck_amount(raw: &Value) -> Option<f64> {
    ["/body/amount", "/amount"]
        .iter()
        .find_map(|p| raw.pointer(p))
        .and_then(|v| match v {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.parse::<f64>().ok(),
            _ => None,
        })
}

fn pluck_currency(raw: &Value) -> Option<String> {
    ["/body/currency", "/currency"]
        .iter()
        .find_map(|p| raw.pointer(p))
        .and_then(Value::as_str)
        .map(str::to_string)
}
