/// Payment-provider webhook
///
/// The provider signs each delivery with a shared secret:
///
/// ```text
/// Payment-Signature: t=<unix>,v1=<hex hmac-sha256 over "{t}.{body}">
/// ```
///
/// The signature is verified in every environment before the body is even
/// parsed; a bad or stale signature is a 400 and the order is untouched.
/// The timestamp must be within a 5-minute tolerance window to limit
/// replay.
///
/// # Events
///
/// - `payment_intent.succeeded`: order moves to `paid`, a download token
///   is minted, and the customer is notified if they hold an account
/// - `payment_intent.payment_failed`: order moves to `failed`
///
/// Unrecognized event types are acknowledged and ignored so the provider
/// does not retry them.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    middleware::request_meta::RequestMeta,
};
use axum::{extract::State, http::HeaderMap, Extension, Json};
use chrono::{Duration, Utc};
use hmac::{Hmac, Mac};
use opsportal_shared::{
    audit::AuditRecorder,
    models::{
        audit_log::NewAuditLog,
        download_token::{DownloadToken, DEFAULT_MAX_DOWNLOADS, DEFAULT_TTL_HOURS},
        notification::{CreateNotification, Notification},
        order::{Order, OrderStatus},
        user::User,
    },
};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the provider signature
pub const SIGNATURE_HEADER: &str = "Payment-Signature";

/// Maximum accepted age of a signed timestamp (seconds)
const TIMESTAMP_TOLERANCE_SECONDS: i64 = 300;

/// Webhook event envelope
#[derive(Debug, Deserialize)]
pub struct WebhookEvent {
    /// Event type, e.g. "payment_intent.succeeded"
    #[serde(rename = "type")]
    pub event_type: String,

    /// Event payload
    pub data: WebhookEventData,
}

/// Webhook event payload
#[derive(Debug, Deserialize)]
pub struct WebhookEventData {
    /// Provider payment intent the order was created with
    pub payment_intent_id: String,
}

/// Webhook acknowledgement
#[derive(Debug, Serialize, Deserialize)]
pub struct WebhookResponse {
    /// Whether the event was accepted
    pub received: bool,
}

/// Parses a `t=<unix>,v1=<hex>` signature header
fn parse_signature_header(header: &str) -> Result<(i64, Vec<u8>), ApiError> {
    let mut timestamp = None;
    let mut signature = None;

    for part in header.split(',') {
        match part.trim().split_once('=') {
            Some(("t", value)) => {
                timestamp = value.parse::<i64>().ok();
            }
            Some(("v1", value)) => {
                signature = hex::decode(value).ok();
            }
            _ => {}
        }
    }

    match (timestamp, signature) {
        (Some(t), Some(sig)) => Ok((t, sig)),
        _ => Err(ApiError::BadRequest(
            "Malformed webhook signature header".to_string(),
        )),
    }
}

/// Verifies the webhook signature and timestamp tolerance
///
/// The comparison runs in constant time via the HMAC verify primitive.
pub fn verify_signature(secret: &str, header: &str, body: &str) -> Result<(), ApiError> {
    let (timestamp, signature) = parse_signature_header(header)?;

    let age = (Utc::now().timestamp() - timestamp).abs();
    if age > TIMESTAMP_TOLERANCE_SECONDS {
        return Err(ApiError::BadRequest(
            "Webhook timestamp outside tolerance".to_string(),
        ));
    }

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| ApiError::InternalError(format!("Invalid webhook secret: {}", e)))?;
    mac.update(format!("{}.{}", timestamp, body).as_bytes());

    mac.verify_slice(&signature)
        .map_err(|_| ApiError::BadRequest("Invalid webhook signature".to_string()))
}

/// Signs a webhook body the way the provider does
///
/// Used by tests and local tooling to produce valid deliveries.
pub fn sign_payload(secret: &str, timestamp: i64, body: &str) -> String {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .expect("HMAC accepts keys of any length");
    mac.update(format!("{}.{}", timestamp, body).as_bytes());
    let signature = hex::encode(mac.finalize().into_bytes());

    format!("t={},v1={}", timestamp, signature)
}

/// Payment webhook handler
///
/// # Errors
///
/// - `400 Bad Request`: Missing/invalid signature, stale timestamp, or
///   unparseable body
/// - `404 Not Found`: Event references an unknown payment intent
pub async fn payment_webhook(
    State(state): State<AppState>,
    Extension(meta): Extension<RequestMeta>,
    headers: HeaderMap,
    body: String,
) -> ApiResult<Json<WebhookResponse>> {
    let signature_header = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::BadRequest("Missing webhook signature".to_string()))?;

    verify_signature(state.webhook_secret(), signature_header, &body)?;

    let event: WebhookEvent = serde_json::from_str(&body)
        .map_err(|e| ApiError::BadRequest(format!("Invalid webhook payload: {}", e)))?;

    match event.event_type.as_str() {
        "payment_intent.succeeded" => {
            handle_payment_succeeded(&state, &event.data.payment_intent_id, &meta).await?;
        }
        "payment_intent.payment_failed" => {
            handle_payment_failed(&state, &event.data.payment_intent_id, &meta).await?;
        }
        other => {
            // Acknowledge unknown events so the provider stops retrying
            tracing::info!(event_type = %other, "Ignoring unhandled webhook event");
        }
    }

    Ok(Json(WebhookResponse { received: true }))
}

/// Marks the order paid, mints a download token, notifies the customer
///
/// Providers redeliver events; an already-paid order is acknowledged
/// without minting another token.
async fn handle_payment_succeeded(
    state: &AppState,
    payment_intent_id: &str,
    meta: &RequestMeta,
) -> ApiResult<()> {
    let order = Order::find_by_payment_intent(&state.db, payment_intent_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Unknown payment intent".to_string()))?;

    if order.status == OrderStatus::Paid {
        tracing::info!(order_id = %order.id, "Duplicate payment confirmation, already paid");
        return Ok(());
    }

    let order = Order::set_status(&state.db, order.id, OrderStatus::Paid)
        .await?
        .ok_or_else(|| ApiError::NotFound("Order not found".to_string()))?;

    let token = DownloadToken::mint(
        &state.db,
        order.id,
        Duration::hours(DEFAULT_TTL_HOURS),
        DEFAULT_MAX_DOWNLOADS,
    )
    .await?;

    tracing::info!(order_id = %order.id, "Payment confirmed, download token minted");

    // Customers with portal accounts get an in-app notification
    if let Ok(Some(user)) = User::find_by_email(&state.db, &order.customer_email).await {
        let notify = Notification::create(
            &state.db,
            CreateNotification {
                user_id: user.id,
                title: "Payment received".to_string(),
                message: format!(
                    "Your payment was confirmed. Download token: {}",
                    token.token
                ),
            },
        )
        .await;

        if let Err(e) = notify {
            tracing::warn!(order_id = %order.id, error = %e, "Failed to create payment notification");
        }
    }

    AuditRecorder::record(
        &state.db,
        NewAuditLog {
            actor_email: "payment-provider".to_string(),
            action: "payment.succeeded".to_string(),
            table_name: "orders".to_string(),
            record_id: Some(order.id),
            new_values: serde_json::to_value(&order).ok(),
            ip_address: meta.ip.clone(),
            user_agent: meta.user_agent.clone(),
            ..Default::default()
        },
    )
    .await;

    Ok(())
}

/// Marks the order failed and notifies the customer if possible
async fn handle_payment_failed(
    state: &AppState,
    payment_intent_id: &str,
    meta: &RequestMeta,
) -> ApiResult<()> {
    let order = Order::find_by_payment_intent(&state.db, payment_intent_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Unknown payment intent".to_string()))?;

    let order = Order::set_status(&state.db, order.id, OrderStatus::Failed)
        .await?
        .ok_or_else(|| ApiError::NotFound("Order not found".to_string()))?;

    tracing::warn!(order_id = %order.id, "Payment failed");

    if let Ok(Some(user)) = User::find_by_email(&state.db, &order.customer_email).await {
        let notify = Notification::create(
            &state.db,
            CreateNotification {
                user_id: user.id,
                title: "Payment failed".to_string(),
                message: "Your payment could not be processed. Please try again.".to_string(),
            },
        )
        .await;

        if let Err(e) = notify {
            tracing::warn!(order_id = %order.id, error = %e, "Failed to create payment notification");
        }
    }

    AuditRecorder::record(
        &state.db,
        NewAuditLog {
            actor_email: "payment-provider".to_string(),
            action: "payment.failed".to_string(),
            table_name: "orders".to_string(),
            record_id: Some(order.id),
            new_values: serde_json::to_value(&order).ok(),
            ip_address: meta.ip.clone(),
            user_agent: meta.user_agent.clone(),
            ..Default::default()
        },
    )
    .await;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "whsec_test_secret";

    #[test]
    fn test_valid_signature_roundtrip() {
        let body = r#"{"type":"payment_intent.succeeded","data":{"payment_intent_id":"pi_1"}}"#;
        let header = sign_payload(SECRET, Utc::now().timestamp(), body);

        assert!(verify_signature(SECRET, &header, body).is_ok());
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let body = r#"{"type":"payment_intent.succeeded","data":{"payment_intent_id":"pi_1"}}"#;
        let header = sign_payload("a-different-secret", Utc::now().timestamp(), body);

        assert!(verify_signature(SECRET, &header, body).is_err());
    }

    #[test]
    fn test_tampered_body_rejected() {
        let body = r#"{"type":"payment_intent.succeeded","data":{"payment_intent_id":"pi_1"}}"#;
        let header = sign_payload(SECRET, Utc::now().timestamp(), body);

        let tampered = body.replace("pi_1", "pi_2");
        assert!(verify_signature(SECRET, &header, &tampered).is_err());
    }

    #[test]
    fn test_stale_timestamp_rejected() {
        let body = "{}";
        let stale = Utc::now().timestamp() - TIMESTAMP_TOLERANCE_SECONDS - 60;
        let header = sign_payload(SECRET, stale, body);

        assert!(verify_signature(SECRET, &header, body).is_err());
    }

    #[test]
    fn test_malformed_header_rejected() {
        assert!(parse_signature_header("garbage").is_err());
        assert!(parse_signature_header("t=abc,v1=zz").is_err());
        assert!(parse_signature_header("t=123").is_err());
    }

    #[test]
    fn test_event_envelope_parses() {
        let body = r#"{"type":"payment_intent.succeeded","data":{"payment_intent_id":"pi_1"}}"#;
        let event: WebhookEvent = serde_json::from_str(body).unwrap();

        assert_eq!(event.event_type, "payment_intent.succeeded");
        assert_eq!(event.data.payment_intent_id, "pi_1");
    }
}
