use chrono::{DateTime, Utc};
use sqlx::PgPool;

// ============================================================================
// API Token Store
// ============================================================================
//
// One row per external provider. The version column makes the refresh a
// compare-and-swap: of two concurrent writers, exactly one lands and the
// other re-reads the winner's token.
//
// ============================================================================

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ApiTokenRecord {
    pub provider: String,
    pub token: String,
    pub version: i64,
    pub expires_at: DateTime<Utc>,
    pub refreshed_at: DateTime<Utc>,
}

impl ApiTokenRecord {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

#[derive(Clone)]
pub struct ApiTokenStore {
    pool: PgPool,
}

impl ApiTokenStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get(&self, provider: &str) -> anyhow::Result<Option<ApiTokenRecord>> {
        let row = sqlx::query_as::<_, ApiTokenRecord>(
            "SELECT provider, token, version, expires_at, refreshed_at
             FROM api_tokens WHERE provider = $1",
        )
        .bind(provider)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    /// Store a freshly fetched token guarded by the version we read.
    /// Returns false when another writer got there first.
    pub async fn store_refreshed(
        &self,
        provider: &str,
        token: &str,
        expires_at: DateTime<Utc>,
        expected_version: Option<i64>,
    ) -> anyhow::Result<bool> {
        let result = match expected_version {
            Some(version) => {
                sqlx::query(
                    "UPDATE api_tokens
                     SET token = $1, version = version + 1, expires_at = $2, refreshed_at = NOW()
                     WHERE provider = $3 AND version = $4",
                )
                .bind(token)
                .bind(expires_at)
                .bind(provider)
                .bind(version)
                .execute(&self.pool)
                .await?
            }
            // First ever token for this provider
            None => {
                sqlx::query(
                    "INSERT INTO api_tokens (provider, token, version, expires_at, refreshed_at)
                     VALUES ($1, $2, 1, $3, NOW())
                     ON CONFLICT (provider) DO NOTHING",
                )
                .bind(provider)
                .bind(token)
                .bind(expires_at)
                .execute(&self.pool)
                .await?
            }
        };

        Ok(result.rows_affected() > 0)
    }
}
