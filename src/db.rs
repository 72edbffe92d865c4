use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::time::Duration;

use crate::config::AppConfig;
use crate::utils::{retry_with_backoff, RetryConfig, RetryResult};

// ============================================================================
// Database Bootstrap
// ============================================================================
//
// Pool construction plus idempotent schema creation at startup. Statements
// are CREATE ... IF NOT EXISTS throughout, so repeated boots are harmless.
//
// ============================================================================

/// Connect with backoff so a boot race against the database (fresh compose
/// environment, failover) resolves itself instead of crashing the process.
pub async fn connect(config: &AppConfig) -> anyhow::Result<PgPool> {
    let retry = RetryConfig {
        max_attempts: 5,
        initial_delay: Duration::from_millis(500),
        max_delay: Duration::from_secs(5),
        multiplier: 2.0,
    };

    let result = retry_with_backoff(retry, |_attempt| {
        PgPoolOptions::new()
            .max_connections(config.db_max_connections)
            .connect(&config.database_url)
    })
    .await;

    let pool = match result {
        RetryResult::Success(pool) => pool,
        RetryResult::Failed(e) | RetryResult::PermanentFailure(e) => {
            return Err(anyhow::anyhow!("could not connect to PostgreSQL: {e}"))
        }
    };

    tracing::info!(
        max_connections = config.db_max_connections,
        "Connected to PostgreSQL"
    );

    Ok(pool)
}

const SCHEMA: &[&str] = &[
    // Users and sessions are written by the external auth service; the
    // tables exist here so a fresh environment boots standalone.
    "CREATE TABLE IF NOT EXISTS users (
        id UUID PRIMARY KEY,
        email TEXT NOT NULL UNIQUE,
        display_name TEXT NOT NULL DEFAULT ''
    )",
    "CREATE TABLE IF NOT EXISTS sessions (
        token TEXT PRIMARY KEY,
        user_id UUID NOT NULL,
        role TEXT NOT NULL,
        expires_at TIMESTAMPTZ NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS vendors (
        id UUID PRIMARY KEY,
        owner_user_id UUID NOT NULL UNIQUE,
        display_name TEXT NOT NULL,
        contact_email TEXT NOT NULL,
        kyc_status TEXT NOT NULL,
        kyc_note TEXT,
        commission_override_bps INTEGER,
        created_at TIMESTAMPTZ NOT NULL,
        updated_at TIMESTAMPTZ NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS products (
        id UUID PRIMARY KEY,
        vendor_id UUID NOT NULL REFERENCES vendors(id),
        name TEXT NOT NULL,
        description TEXT,
        price_cents BIGINT NOT NULL,
        stock INTEGER NOT NULL,
        category TEXT NOT NULL,
        approved BOOLEAN NOT NULL DEFAULT FALSE,
        created_at TIMESTAMPTZ NOT NULL,
        updated_at TIMESTAMPTZ NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS orders (
        id UUID PRIMARY KEY,
        vendor_id UUID NOT NULL REFERENCES vendors(id),
        customer_id UUID NOT NULL,
        status TEXT NOT NULL,
        subtotal_cents BIGINT NOT NULL,
        shipping_cents BIGINT NOT NULL,
        total_cents BIGINT NOT NULL,
        tracking_partner TEXT,
        tracking_number TEXT,
        version BIGINT NOT NULL DEFAULT 1,
        created_at TIMESTAMPTZ NOT NULL,
        updated_at TIMESTAMPTZ NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS idx_orders_vendor ON orders (vendor_id, status)",
    "CREATE TABLE IF NOT EXISTS order_tracking (
        id UUID PRIMARY KEY,
        order_id UUID NOT NULL REFERENCES orders(id),
        status TEXT NOT NULL,
        message TEXT NOT NULL,
        latitude DOUBLE PRECISION,
        longitude DOUBLE PRECISION,
        created_at TIMESTAMPTZ NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS idx_order_tracking_order ON order_tracking (order_id, created_at)",
    "CREATE TABLE IF NOT EXISTS payments (
        order_id UUID PRIMARY KEY REFERENCES orders(id),
        status TEXT NOT NULL,
        amount_cents BIGINT NOT NULL,
        method TEXT NOT NULL,
        paid_at TIMESTAMPTZ
    )",
    "CREATE TABLE IF NOT EXISTS payouts (
        id UUID PRIMARY KEY,
        vendor_id UUID NOT NULL REFERENCES vendors(id),
        amount_cents BIGINT NOT NULL,
        status TEXT NOT NULL,
        note TEXT,
        created_at TIMESTAMPTZ NOT NULL,
        updated_at TIMESTAMPTZ NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS promotions (
        id UUID PRIMARY KEY,
        code TEXT NOT NULL UNIQUE,
        percent_off_bps INTEGER NOT NULL,
        starts_at TIMESTAMPTZ NOT NULL,
        ends_at TIMESTAMPTZ NOT NULL,
        active BOOLEAN NOT NULL DEFAULT TRUE
    )",
    "CREATE TABLE IF NOT EXISTS commission_rules (
        id UUID PRIMARY KEY,
        category TEXT NOT NULL UNIQUE,
        rate_bps INTEGER NOT NULL,
        active BOOLEAN NOT NULL DEFAULT TRUE
    )",
    "CREATE TABLE IF NOT EXISTS tax_rules (
        id UUID PRIMARY KEY,
        category TEXT NOT NULL,
        region TEXT NOT NULL,
        rate_bps INTEGER NOT NULL,
        active BOOLEAN NOT NULL DEFAULT TRUE,
        UNIQUE (category, region)
    )",
    "CREATE TABLE IF NOT EXISTS tickets (
        id UUID PRIMARY KEY,
        user_id UUID NOT NULL,
        subject TEXT NOT NULL,
        body TEXT NOT NULL,
        status TEXT NOT NULL,
        created_at TIMESTAMPTZ NOT NULL,
        updated_at TIMESTAMPTZ NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS ticket_replies (
        id UUID PRIMARY KEY,
        ticket_id UUID NOT NULL REFERENCES tickets(id),
        author_user_id UUID NOT NULL,
        body TEXT NOT NULL,
        created_at TIMESTAMPTZ NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS notifications (
        id UUID PRIMARY KEY,
        recipient_user_id UUID,
        title TEXT NOT NULL,
        body TEXT NOT NULL,
        read BOOLEAN NOT NULL DEFAULT FALSE,
        created_at TIMESTAMPTZ NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS idx_notifications_recipient ON notifications (recipient_user_id, created_at)",
    "CREATE TABLE IF NOT EXISTS outbox_messages (
        id UUID PRIMARY KEY,
        aggregate_id UUID NOT NULL,
        event_type TEXT NOT NULL,
        payload TEXT NOT NULL,
        attempts INTEGER NOT NULL DEFAULT 0,
        created_at TIMESTAMPTZ NOT NULL,
        dispatched_at TIMESTAMPTZ
    )",
    "CREATE INDEX IF NOT EXISTS idx_outbox_pending ON outbox_messages (created_at) WHERE dispatched_at IS NULL",
    "CREATE TABLE IF NOT EXISTS dead_letters (
        id UUID PRIMARY KEY,
        aggregate_id UUID NOT NULL,
        event_type TEXT NOT NULL,
        payload TEXT NOT NULL,
        error_message TEXT NOT NULL,
        failure_count INTEGER NOT NULL,
        first_failed_at TIMESTAMPTZ NOT NULL,
        last_failed_at TIMESTAMPTZ NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS api_tokens (
        provider TEXT PRIMARY KEY,
        token TEXT NOT NULL,
        version BIGINT NOT NULL,
        expires_at TIMESTAMPTZ NOT NULL,
        refreshed_at TIMESTAMPTZ NOT NULL
    )",
];

pub async fn ensure_schema(pool: &PgPool) -> anyhow::Result<()> {
    for statement in SCHEMA {
        sqlx::query(statement).execute(pool).await?;
    }

    tracing::info!(statements = SCHEMA.len(), "Database schema ensured");
    Ok(())
}
