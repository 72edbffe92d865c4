use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::vendor::{KycStatus, Vendor, VendorError, VendorKycDecided};
use crate::store::outbox;

// ============================================================================
// Vendor Store
// ============================================================================

#[derive(sqlx::FromRow)]
struct VendorRow {
    id: Uuid,
    owner_user_id: Uuid,
    display_name: String,
    contact_email: String,
    kyc_status: String,
    kyc_note: Option<String>,
    commission_override_bps: Option<i32>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<VendorRow> for Vendor {
    type Error = VendorError;

    fn try_from(row: VendorRow) -> Result<Self, Self::Error> {
        Ok(Vendor {
            id: row.id,
            owner_user_id: row.owner_user_id,
            display_name: row.display_name,
            contact_email: row.contact_email,
            kyc_status: KycStatus::parse(&row.kyc_status)?,
            kyc_note: row.kyc_note,
            commission_override_bps: row.commission_override_bps,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

const SELECT_COLS: &str =
    "id, owner_user_id, display_name, contact_email, kyc_status, kyc_note,
     commission_override_bps, created_at, updated_at";

#[derive(Clone)]
pub struct VendorStore {
    pool: PgPool,
}

impl VendorStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn onboard(
        &self,
        owner_user_id: Uuid,
        display_name: &str,
        contact_email: &str,
    ) -> anyhow::Result<Vendor> {
        let row = sqlx::query_as::<_, VendorRow>(&format!(
            "INSERT INTO vendors (id, owner_user_id, display_name, contact_email,
                                  kyc_status, created_at, updated_at)
             VALUES ($1, $2, $3, $4, 'APPLIED', NOW(), NOW())
             RETURNING {SELECT_COLS}"
        ))
        .bind(Uuid::new_v4())
        .bind(owner_user_id)
        .bind(display_name)
        .bind(contact_email)
        .fetch_one(&self.pool)
        .await?;

        Vendor::try_from(row).map_err(Into::into)
    }

    pub async fn get(&self, vendor_id: Uuid) -> anyhow::Result<Option<Vendor>> {
        let row = sqlx::query_as::<_, VendorRow>(&format!(
            "SELECT {SELECT_COLS} FROM vendors WHERE id = $1"
        ))
        .bind(vendor_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Vendor::try_from).transpose().map_err(Into::into)
    }

    /// The vendor owned by a given user session, if any.
    pub async fn get_by_owner(&self, owner_user_id: Uuid) -> anyhow::Result<Option<Vendor>> {
        let row = sqlx::query_as::<_, VendorRow>(&format!(
            "SELECT {SELECT_COLS} FROM vendors WHERE owner_user_id = $1"
        ))
        .bind(owner_user_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Vendor::try_from).transpose().map_err(Into::into)
    }

    pub async fn list(&self, kyc_status: Option<KycStatus>, limit: i64) -> anyhow::Result<Vec<Vendor>> {
        let rows = sqlx::query_as::<_, VendorRow>(&format!(
            "SELECT {SELECT_COLS} FROM vendors
             WHERE ($1::text IS NULL OR kyc_status = $1)
             ORDER BY created_at DESC
             LIMIT $2"
        ))
        .bind(kyc_status.map(|s| s.as_str()))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|r| Vendor::try_from(r).map_err(Into::into))
            .collect()
    }

    /// Persist a validated KYC decision and enqueue the owner notification
    /// in the same transaction. The previous status is the CAS guard.
    pub async fn apply_kyc_decision(
        &self,
        vendor: &Vendor,
        decision: KycStatus,
        note: Option<&str>,
    ) -> anyhow::Result<Vendor> {
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query_as::<_, VendorRow>(&format!(
            "UPDATE vendors
             SET kyc_status = $1, kyc_note = $2, updated_at = NOW()
             WHERE id = $3 AND kyc_status = $4
             RETURNING {SELECT_COLS}"
        ))
        .bind(decision.as_str())
        .bind(note)
        .bind(vendor.id)
        .bind(vendor.kyc_status.as_str())
        .fetch_optional(&mut *tx)
        .await?;

        let Some(updated) = updated else {
            tx.rollback().await?;
            anyhow::bail!("vendor {} was modified concurrently", vendor.id);
        };

        let event = VendorKycDecided {
            vendor_id: vendor.id,
            owner_user_id: vendor.owner_user_id,
            decision,
            note: note.map(str::to_string),
        };

        outbox::enqueue(
            &mut tx,
            vendor.id,
            VendorKycDecided::EVENT_TYPE,
            &serde_json::to_string(&event)?,
        )
        .await?;

        tx.commit().await?;

        tracing::info!(
            vendor_id = %vendor.id,
            decision = %decision,
            "Vendor KYC decision committed"
        );

        Vendor::try_from(updated).map_err(Into::into)
    }
}
