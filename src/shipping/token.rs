use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::store::tokens::{ApiTokenRecord, ApiTokenStore};

// ============================================================================
// Courier Token Provider
// ============================================================================
//
// The courier token lives in the api_tokens table and is shared by every
// process talking to the courier. Refresh is single-writer: callers that
// find the token expired all funnel through one mutex, the first one
// refreshes, the rest reuse its result. The store write is versioned, so a
// refresh racing an external writer loses cleanly and re-reads.
//
// ============================================================================

const PROVIDER: &str = "courier";

#[derive(Deserialize)]
struct TokenResponse {
    token: String,
    expires_in_secs: i64,
}

struct CachedToken {
    token: String,
    expires_at: DateTime<Utc>,
}

pub struct TokenProvider {
    http: reqwest::Client,
    auth_url: String,
    api_key: String,
    api_secret: String,
    store: ApiTokenStore,
    cache: Arc<Mutex<Option<CachedToken>>>,
}

impl TokenProvider {
    pub fn new(
        http: reqwest::Client,
        auth_url: String,
        api_key: String,
        api_secret: String,
        store: ApiTokenStore,
    ) -> Self {
        Self {
            http,
            auth_url,
            api_key,
            api_secret,
            store,
            cache: Arc::new(Mutex::new(None)),
        }
    }

    /// Current token, refreshing if the cached or stored one is stale.
    /// Holding the cache lock across the refresh is what collapses
    /// concurrent refreshes into one.
    pub async fn bearer_token(&self) -> anyhow::Result<String> {
        let mut cache = self.cache.lock().await;
        let now = Utc::now();

        if let Some(cached) = cache.as_ref() {
            if cached.expires_at > now + Duration::seconds(30) {
                return Ok(cached.token.clone());
            }
        }

        // Someone else (another process) may already have refreshed
        let stored = self.store.get(PROVIDER).await?;
        if let Some(record) = &stored {
            if !record.is_expired(now + Duration::seconds(30)) {
                *cache = Some(CachedToken {
                    token: record.token.clone(),
                    expires_at: record.expires_at,
                });
                return Ok(record.token.clone());
            }
        }

        let record = self.refresh(stored).await?;
        let token = record.token.clone();
        *cache = Some(CachedToken {
            token: record.token,
            expires_at: record.expires_at,
        });

        Ok(token)
    }

    /// Force-refresh, used by the scheduled refresh job and after a 401.
    pub async fn invalidate(&self) {
        let mut cache = self.cache.lock().await;
        *cache = None;
    }

    async fn refresh(&self, stored: Option<ApiTokenRecord>) -> anyhow::Result<ApiTokenRecord> {
        tracing::info!(provider = PROVIDER, "Refreshing courier API token");

        let response = self
            .http
            .post(&self.auth_url)
            .json(&serde_json::json!({
                "api_key": self.api_key,
                "api_secret": self.api_secret,
            }))
            .send()
            .await?
            .error_for_status()?;

        let body: TokenResponse = response.json().await?;
        let expires_at = Utc::now() + Duration::seconds(body.expires_in_secs.max(60));

        let stored_version = stored.as_ref().map(|r| r.version);
        let won = self
            .store
            .store_refreshed(PROVIDER, &body.token, expires_at, stored_version)
            .await?;

        if won {
            tracing::info!(provider = PROVIDER, "Courier token refreshed");
            return Ok(ApiTokenRecord {
                provider: PROVIDER.to_string(),
                token: body.token,
                version: stored_version.unwrap_or(0) + 1,
                expires_at,
                refreshed_at: Utc::now(),
            });
        }

        // Lost the versioned write: another writer refreshed first, use theirs
        tracing::warn!(provider = PROVIDER, "Lost token refresh race, re-reading");
        self.store
            .get(PROVIDER)
            .await?
            .ok_or_else(|| anyhow::anyhow!("courier token vanished after refresh race"))
    }
}
