use serde_json::json;
use std::sync::Arc;
use workshop_backend::error::ApiError;
use workshop_backend::gateway::mock::MockGateway;
use workshop_backend::service::payment_service::PaymentService;
use workshop_backend::service::reconcile::{
    merchant_order_id_in_notification, session_id_in_notification,
};
use workshop_backend::store::memory::MemoryRecordStore;
use workshop_backend::store::{NewPaymentRecord, RecordStore};

fn service(store: Arc<MemoryRecordStore>, gateway: Arc<MockGateway>) -> PaymentService {
    PaymentService {
        store,
        gateway,
        automation: None,
        webhook_url: "http://localhost:8080/api/payment/webhook".to_string(),
    }
}

async fn seed(store: &MemoryRecordStore, session_id: &str, merchant_order_id: &str) {
    store
        .insert(NewPaymentRecord {
            session_id: Some(session_id.to_string()),
            merchant_order_id: merchant_order_id.to_string(),
            status: "CREATED".to_string(),
            amount: 100.0,
            currency: "EGP".to_string(),
            ..NewPaymentRecord::default()
        })
        .await
        .expect("seed record");
}

#[test]
fn session_id_is_read_from_known_notification_shapes() {
    assert_eq!(
        session_id_in_notification(&json!({"sessionId": "a"})).as_deref(),
        Some("a")
    );
    assert_eq!(
        session_id_in_notification(&json!({"data": {"sessionId": "b"}})).as_deref(),
        Some("b")
    );
    assert_eq!(
        session_id_in_notification(&json!({"body": {"sessionId": "c"}})).as_deref(),
        Some("c")
    );
    assert_eq!(session_id_in_notification(&json!({"event": "x"})), None);
}

#[test]
fn numeric_merchant_order_ids_are_accepted() {
    assert_eq!(
        merchant_order_id_in_notification(&json!({"merchantOrderId": 1723})).as_deref(),
        Some("1723")
    );
}

#[tokio::test]
async fn webhook_applies_verified_status() {
    let store = Arc::new(MemoryRecordStore::new());
    let gateway = Arc::new(MockGateway::returning("abc", "PAID"));
    seed(&store, "abc", "ord_1").await;
    let svc = service(store.clone(), gateway);

    svc.reconcile_webhook(json!({"sessionId": "abc"}))
        .await
        .expect("webhook reconciled");

    let record = &store.records()[0];
    assert_eq!(record.status, "PAID");
    assert!(record.verified_at.is_some());
    assert!(record.verification.is_some());
}

#[tokio::test]
async fn duplicate_notifications_produce_a_single_write() {
    let store = Arc::new(MemoryRecordStore::new());
    let gateway = Arc::new(MockGateway::returning("abc", "PAID"));
    seed(&store, "abc", "ord_1").await;
    let svc = service(store.clone(), gateway);

    svc.reconcile_webhook(json!({"sessionId": "abc"})).await.expect("first");
    svc.reconcile_webhook(json!({"sessionId": "abc"})).await.expect("second");

    assert_eq!(store.verification_writes(), 1);
    assert_eq!(store.records().len(), 1);
}

#[tokio::test]
async fn merchant_order_id_fallback_resolves_the_same_record() {
    let store = Arc::new(MemoryRecordStore::new());
    let gateway = Arc::new(MockGateway::returning("sess_1", "PAID"));
    seed(&store, "sess_1", "ord_1").await;
    let svc = service(store.clone(), gateway);

    svc.reconcile_webhook(json!({"data": {"merchantOrderId": "ord_1"}}))
        .await
        .expect("resolved via merchant order id");

    let records = store.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].status, "PAID");
}

#[tokio::test]
async fn order_reference_fallback_resolves_via_stored_response() {
    let store = Arc::new(MemoryRecordStore::new());
    let gateway = Arc::new(MockGateway::returning("sess_2", "PAID"));
    store
        .insert(NewPaymentRecord {
            session_id: Some("sess_2".to_string()),
            merchant_order_id: "ord_2".to_string(),
            status: "CREATED".to_string(),
            amount: 50.0,
            currency: "EGP".to_string(),
            response: Some(json!({"body": {"orderReference": "TEST-REF-9"}})),
            ..NewPaymentRecord::default()
        })
        .await
        .expect("seed record");
    let svc = service(store.clone(), gateway);

    svc.reconcile_webhook(json!({"data": {"orderReference": "TEST-REF-9"}}))
        .await
        .expect("resolved via order reference");

    let records = store.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].status, "PAID");
}

#[tokio::test]
async fn unresolvable_notification_is_a_client_error() {
    let store = Arc::new(MemoryRecordStore::new());
    let svc = service(store.clone(), Arc::new(MockGateway::new()));

    let err = svc
        .reconcile_webhook(json!({"event": "something-else"}))
        .await
        .expect_err("cannot be reconciled");

    assert!(matches!(err, ApiError::Unreconcilable(_)));
    assert_eq!(err.status(), axum::http::StatusCode::BAD_REQUEST);
    assert!(store.records().is_empty());
}

#[tokio::test]
async fn verification_failure_surfaces_as_server_error() {
    let store = Arc::new(MemoryRecordStore::new());
    let mut gateway = MockGateway::returning("abc", "PAID");
    gateway.fail_verify = true;
    seed(&store, "abc", "ord_1").await;
    let svc = service(store.clone(), Arc::new(gateway));

    let err = svc
        .reconcile_webhook(json!({"sessionId": "abc"}))
        .await
        .expect_err("verification down");

    assert!(matches!(err, ApiError::Verification(_)));
    assert_eq!(err.status(), axum::http::StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(store.records()[0].status, "CREATED");
}

#[tokio::test]
async fn notification_claims_are_never_written_directly() {
    let store = Arc::new(MemoryRecordStore::new());
    let gateway = Arc::new(MockGateway::returning("abc", "PENDING"));
    seed(&store, "abc", "ord_1").await;
    let svc = service(store.clone(), gateway);

    // the body claims PAID but the provider says PENDING
    svc.reconcile_webhook(json!({"sessionId": "abc", "status": "PAID"}))
        .await
        .expect("webhook reconciled");

    assert_eq!(store.records()[0].status, "PENDING");
}

#[tokio::test]
async fn unknown_session_is_materialized_from_verification() {
    let store = Arc::new(MemoryRecordStore::new());
    let gateway = Arc::new(MockGateway::returning("zzz", "PAID"));
    let svc = service(store.clone(), gateway);

    svc.reconcile_webhook(json!({"sessionId": "zzz"}))
        .await
        .expect("lazy create");

    let records = store.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].session_id.as_deref(), Some("zzz"));
    assert_eq!(records[0].status, "PAID");
}

#[tokio::test]
async fn payment_failure_is_still_a_successful_reconciliation() {
    let store = Arc::new(MemoryRecordStore::new());
    let gateway = Arc::new(MockGateway::returning("abc", "FAILED"));
    seed(&store, "abc", "ord_1").await;
    let svc = service(store.clone(), gateway);

    svc.reconcile_webhook(json!({"sessionId": "abc"}))
        .await
        .expect("failure is a valid terminal state");

    assert_eq!(store.records()[0].status, "FAILED");
}
