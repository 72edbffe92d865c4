use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::promo::{CommissionRule, Promotion, TaxRule};

// ============================================================================
// Promotion & Rule Store
// ============================================================================

#[derive(sqlx::FromRow)]
struct PromotionRow {
    id: Uuid,
    code: String,
    percent_off_bps: i32,
    starts_at: DateTime<Utc>,
    ends_at: DateTime<Utc>,
    active: bool,
}

impl From<PromotionRow> for Promotion {
    fn from(row: PromotionRow) -> Self {
        Promotion {
            id: row.id,
            code: row.code,
            percent_off_bps: row.percent_off_bps,
            starts_at: row.starts_at,
            ends_at: row.ends_at,
            active: row.active,
        }
    }
}

#[derive(sqlx::FromRow)]
struct CommissionRuleRow {
    id: Uuid,
    category: String,
    rate_bps: i32,
    active: bool,
}

#[derive(sqlx::FromRow)]
struct TaxRuleRow {
    id: Uuid,
    category: String,
    region: String,
    rate_bps: i32,
    active: bool,
}

#[derive(Clone)]
pub struct PromoStore {
    pool: PgPool,
}

impl PromoStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // ------------------------------------------------------------------
    // Promotions
    // ------------------------------------------------------------------

    pub async fn create_promotion(
        &self,
        code: &str,
        percent_off_bps: i32,
        starts_at: DateTime<Utc>,
        ends_at: DateTime<Utc>,
    ) -> anyhow::Result<Promotion> {
        let row = sqlx::query_as::<_, PromotionRow>(
            "INSERT INTO promotions (id, code, percent_off_bps, starts_at, ends_at, active)
             VALUES ($1, $2, $3, $4, $5, TRUE)
             RETURNING id, code, percent_off_bps, starts_at, ends_at, active",
        )
        .bind(Uuid::new_v4())
        .bind(code)
        .bind(percent_off_bps)
        .bind(starts_at)
        .bind(ends_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    pub async fn get_promotion(&self, id: Uuid) -> anyhow::Result<Option<Promotion>> {
        let row = sqlx::query_as::<_, PromotionRow>(
            "SELECT id, code, percent_off_bps, starts_at, ends_at, active
             FROM promotions WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    pub async fn get_promotion_by_code(&self, code: &str) -> anyhow::Result<Option<Promotion>> {
        let row = sqlx::query_as::<_, PromotionRow>(
            "SELECT id, code, percent_off_bps, starts_at, ends_at, active
             FROM promotions WHERE code = $1",
        )
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    pub async fn list_promotions(&self, limit: i64) -> anyhow::Result<Vec<Promotion>> {
        let rows = sqlx::query_as::<_, PromotionRow>(
            "SELECT id, code, percent_off_bps, starts_at, ends_at, active
             FROM promotions ORDER BY starts_at DESC LIMIT $1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    pub async fn set_promotion_active(&self, id: Uuid, active: bool) -> anyhow::Result<bool> {
        let result = sqlx::query("UPDATE promotions SET active = $1 WHERE id = $2")
            .bind(active)
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn delete_promotion(&self, id: Uuid) -> anyhow::Result<bool> {
        let result = sqlx::query("DELETE FROM promotions WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    // ------------------------------------------------------------------
    // Commission rules
    // ------------------------------------------------------------------

    pub async fn upsert_commission_rule(
        &self,
        category: &str,
        rate_bps: i32,
    ) -> anyhow::Result<CommissionRule> {
        let row = sqlx::query_as::<_, CommissionRuleRow>(
            "INSERT INTO commission_rules (id, category, rate_bps, active)
             VALUES ($1, $2, $3, TRUE)
             ON CONFLICT (category)
             DO UPDATE SET rate_bps = EXCLUDED.rate_bps, active = TRUE
             RETURNING id, category, rate_bps, active",
        )
        .bind(Uuid::new_v4())
        .bind(category)
        .bind(rate_bps)
        .fetch_one(&self.pool)
        .await?;

        Ok(CommissionRule {
            id: row.id,
            category: row.category,
            rate_bps: row.rate_bps,
            active: row.active,
        })
    }

    pub async fn commission_rule_for(
        &self,
        category: &str,
    ) -> anyhow::Result<Option<CommissionRule>> {
        let row = sqlx::query_as::<_, CommissionRuleRow>(
            "SELECT id, category, rate_bps, active
             FROM commission_rules WHERE category = $1",
        )
        .bind(category)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| CommissionRule {
            id: r.id,
            category: r.category,
            rate_bps: r.rate_bps,
            active: r.active,
        }))
    }

    pub async fn list_commission_rules(&self) -> anyhow::Result<Vec<CommissionRule>> {
        let rows = sqlx::query_as::<_, CommissionRuleRow>(
            "SELECT id, category, rate_bps, active FROM commission_rules ORDER BY category",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| CommissionRule {
                id: r.id,
                category: r.category,
                rate_bps: r.rate_bps,
                active: r.active,
            })
            .collect())
    }

    // ------------------------------------------------------------------
    // Tax rules
    // ------------------------------------------------------------------

    pub async fn upsert_tax_rule(
        &self,
        category: &str,
        region: &str,
        rate_bps: i32,
    ) -> anyhow::Result<TaxRule> {
        let row = sqlx::query_as::<_, TaxRuleRow>(
            "INSERT INTO tax_rules (id, category, region, rate_bps, active)
             VALUES ($1, $2, $3, $4, TRUE)
             ON CONFLICT (category, region)
             DO UPDATE SET rate_bps = EXCLUDED.rate_bps, active = TRUE
             RETURNING id, category, region, rate_bps, active",
        )
        .bind(Uuid::new_v4())
        .bind(category)
        .bind(region)
        .bind(rate_bps)
        .fetch_one(&self.pool)
        .await?;

        Ok(TaxRule {
            id: row.id,
            category: row.category,
            region: row.region,
            rate_bps: row.rate_bps,
            active: row.active,
        })
    }

    pub async fn list_tax_rules(&self) -> anyhow::Result<Vec<TaxRule>> {
        let rows = sqlx::query_as::<_, TaxRuleRow>(
            "SELECT id, category, region, rate_bps, active
             FROM tax_rules ORDER BY category, region",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| TaxRule {
                id: r.id,
                category: r.category,
                region: r.region,
                rate_bps: r.rate_bps,
                active: r.active,
            })
            .collect())
    }
}
