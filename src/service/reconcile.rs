use crate::store::RecordStore;
use serde_json::Value;

// Kashier delivers notifications in a handful of envelope shapes; the session
// identifier can sit at the top level or under "data"/"body".
const SESSION_ID_PATHS: [&str; 3] = ["/sessionId", "/data/sessionId", "/body/sessionId"];
const MERCHANT_ORDER_ID_PATHS: [&str; 3] = [
    "/merchantOrderId",
    "/data/merchantOrderId",
    "/body/merchantOrderId",
];
const ORDER_REFERENCE_PATHS: [&str; 3] = ["/orderReference", "/data/orderReference", "/body/orderReference"];

pub fn session_id_in_notification(notification: &Value) -> Option<String> {
    pluck(notification, &SESSION_ID_PATHS)
}

pub fn merchant_order_id_in_notification(notification: &Value) -> Option<String> {
    pluck(notification, &MERCHANT_ORDER_ID_PATHS)
}

pub fn order_reference_in_notification(notification: &Value) -> Option<String> {
    pluck(notification, &ORDER_REFERENCE_PATHS)
}

/// Ordered correlation strategies: the identifier carried in the notification
/// itself, then a record keyed by the merchant order id, then a record whose
/// stored provider payload carries the provider's own order reference. Stops
/// at the first strategy that yields a session id.
pub async fn resolve_session_id(
    store: &dyn RecordStore,
    notification: &Value,
) -> anyhow::Result<Option<String>> {
    if let Some(session_id) = session_id_in_notification(notification) {
        return Ok(Some(session_id));
    }

    if let Some(merchant_order_id) = merchant_order_id_in_notification(notification) {
        if let Some(record) = store.find_by_merchant_order_id(&merchant_order_id).await? {
            if let Some(session_id) = record.session_id {
                tracing::debug!(%merchant_order_id, "notification resolved via merchant order id");
                return Ok(Some(session_id));
            }
        }
    }

    if let Some(reference) = order_reference_in_notification(notification) {
        if let Some(record) = store.find_by_order_reference(&reference).await? {
            if let Some(session_id) = record.session_id {
                tracing::debug!(order_reference = %reference, "notification resolved via order reference");
                return Ok(Some(session_id));
            }
        }
    }

    Ok(None)
}

fn pluck(notification: &Value, paths: &[&str]) -> Option<String> {
    paths.iter().find_map(|p| {
        notification.pointer(p).and_then(|v| match v {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
    })
}
