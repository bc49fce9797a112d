/// Download token model and database operations
///
/// A download token is a bounded-use, time-limited credential granting
/// access to a digital product after payment. It is minted by the
/// payment webhook when an order is paid and redeemed through the public
/// download endpoint.
///
/// Redemption uses a single conditional UPDATE so concurrent requests
/// cannot push `download_count` past `max_downloads`.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE download_tokens (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     order_id UUID NOT NULL REFERENCES orders(id) ON DELETE CASCADE,
///     token VARCHAR(64) NOT NULL UNIQUE,
///     expires_at TIMESTAMPTZ NOT NULL,
///     download_count INTEGER NOT NULL DEFAULT 0,
///     max_downloads INTEGER NOT NULL DEFAULT 3,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Default number of permitted downloads per token
pub const DEFAULT_MAX_DOWNLOADS: i32 = 3;

/// Default token lifetime in hours
pub const DEFAULT_TTL_HOURS: i64 = 72;

/// Download token model
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct DownloadToken {
    /// Unique row ID
    pub id: Uuid,

    /// Order this token grants access for
    pub order_id: Uuid,

    /// Opaque token string (32 random bytes, hex-encoded)
    pub token: String,

    /// Hard expiry; the token is unusable from this instant on
    pub expires_at: DateTime<Utc>,

    /// How many times the token has been used
    pub download_count: i32,

    /// Maximum permitted uses
    pub max_downloads: i32,

    /// When the token was minted
    pub created_at: DateTime<Utc>,
}

impl DownloadToken {
    /// Checks whether the token is past its expiry
    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }

    /// Checks whether the use limit has been reached
    pub fn is_exhausted(&self) -> bool {
        self.download_count >= self.max_downloads
    }

    /// Remaining uses, never negative
    pub fn remaining_downloads(&self) -> i32 {
        (self.max_downloads - self.download_count).max(0)
    }

    /// Mints a new token for a paid order
    ///
    /// The opaque token value is 32 random bytes, hex-encoded.
    pub async fn mint(
        pool: &PgPool,
        order_id: Uuid,
        ttl: Duration,
        max_downloads: i32,
    ) -> Result<Self, sqlx::Error> {
        let token = generate_token();
        let expires_at = Utc::now() + ttl;

        sqlx::query_as::<_, DownloadToken>(
            r#"
            INSERT INTO download_tokens (order_id, token, expires_at, max_downloads)
            VALUES ($1, $2, $3, $4)
            RETURNING id, order_id, token, expires_at, download_count, max_downloads, created_at
            "#,
        )
        .bind(order_id)
        .bind(token)
        .bind(expires_at)
        .bind(max_downloads)
        .fetch_one(pool)
        .await
    }

    /// Finds a token row by its opaque value
    pub async fn find_by_token(pool: &PgPool, token: &str) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, DownloadToken>(
            r#"
            SELECT id, order_id, token, expires_at, download_count, max_downloads, created_at
            FROM download_tokens
            WHERE token = $1
            "#,
        )
        .bind(token)
        .fetch_optional(pool)
        .await
    }

    /// Consumes one use of the token if it is still valid
    ///
    /// The guard conditions live in the UPDATE itself, so two concurrent
    /// redemptions of the last remaining use cannot both succeed.
    ///
    /// # Returns
    ///
    /// The token row after the increment, or None if the token was
    /// unknown, expired, or already at its limit
    pub async fn try_consume(pool: &PgPool, token: &str) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, DownloadToken>(
            r#"
            UPDATE download_tokens
            SET download_count = download_count + 1
            WHERE token = $1
              AND expires_at > NOW()
              AND download_count < max_downloads
            RETURNING id, order_id, token, expires_at, download_count, max_downloads, created_at
            "#,
        )
        .bind(token)
        .fetch_optional(pool)
        .await
    }
}

/// Generates an opaque download token (32 random bytes, hex-encoded)
pub fn generate_token() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(download_count: i32, max_downloads: i32, expires_in_secs: i64) -> DownloadToken {
        DownloadToken {
            id: Uuid::new_v4(),
            order_id: Uuid::new_v4(),
            token: generate_token(),
            expires_at: Utc::now() + Duration::seconds(expires_in_secs),
            download_count,
            max_downloads,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_generate_token_shape() {
        let t = generate_token();
        assert_eq!(t.len(), 64);
        assert!(t.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_generated_tokens_are_unique() {
        assert_ne!(generate_token(), generate_token());
    }

    #[test]
    fn test_expiry_check() {
        assert!(!token(0, 3, 3600).is_expired());
        assert!(token(0, 3, -1).is_expired());
    }

    #[test]
    fn test_exhaustion_check() {
        let t = token(2, 3, 3600);
        assert!(!t.is_exhausted());
        assert_eq!(t.remaining_downloads(), 1);

        let spent = token(3, 3, 3600);
        assert!(spent.is_exhausted());
        assert_eq!(spent.remaining_downloads(), 0);
    }
}
