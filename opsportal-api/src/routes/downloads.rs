/// Download grant redemption
///
/// A download token is an opaque, bounded-use grant minted when an order
/// is paid. Redemption is public: holding the token IS the authorization.
/// Consumption is a single conditional UPDATE, so concurrent hits on the
/// last remaining use cannot both succeed.
///
/// # Endpoint
///
/// ```text
/// GET /api/download/:token
/// ```
///
/// # Status Codes
///
/// - `200 OK`: Grant payload, one use consumed
/// - `404 Not Found`: Unknown token
/// - `403 Forbidden`: Token expired
/// - `429 Too Many Requests`: `max_downloads` already consumed

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{Path, State},
    Json,
};
use chrono::Utc;
use opsportal_shared::models::download_token::DownloadToken;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Successful redemption payload
#[derive(Debug, Serialize, Deserialize)]
pub struct DownloadGrant {
    /// Order the grant belongs to
    pub order_id: Uuid,

    /// Uses left after this one
    pub remaining_downloads: i32,

    /// When the grant stops working regardless of remaining uses
    pub expires_at: chrono::DateTime<chrono::Utc>,
}

/// Redeems one use of a download token
pub async fn redeem_download(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> ApiResult<Json<DownloadGrant>> {
    // The consume-or-nothing UPDATE handles the happy path atomically
    if let Some(consumed) = DownloadToken::try_consume(&state.db, &token).await? {
        return Ok(Json(DownloadGrant {
            order_id: consumed.order_id,
            remaining_downloads: consumed.remaining_downloads(),
            expires_at: consumed.expires_at,
        }));
    }

    // Consumption failed: look the row up to report the right status
    let existing = DownloadToken::find_by_token(&state.db, &token)
        .await?
        .ok_or_else(|| ApiError::NotFound("Unknown download token".to_string()))?;

    if existing.is_expired() {
        return Err(ApiError::Forbidden("Download token expired".to_string()));
    }

    // Exhausted: retry is pointless before expiry, after which it's gone
    let retry_after = (existing.expires_at - Utc::now()).num_seconds().max(0) as u64;
    Err(ApiError::RateLimitExceeded {
        retry_after,
        message: "Download limit reached".to_string(),
    })
}
