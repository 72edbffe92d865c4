use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::catalog::{Product, ProductDraft};

// ============================================================================
// Product Store
// ============================================================================

#[derive(sqlx::FromRow)]
struct ProductRow {
    id: Uuid,
    vendor_id: Uuid,
    name: String,
    description: Option<String>,
    price_cents: i64,
    stock: i32,
    category: String,
    approved: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Product {
            id: row.id,
            vendor_id: row.vendor_id,
            name: row.name,
            description: row.description,
            price_cents: row.price_cents,
            stock: row.stock,
            category: row.category,
            approved: row.approved,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const SELECT_COLS: &str =
    "id, vendor_id, name, description, price_cents, stock, category, approved,
     created_at, updated_at";

#[derive(Clone)]
pub struct ProductStore {
    pool: PgPool,
}

impl ProductStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, vendor_id: Uuid, draft: &ProductDraft) -> anyhow::Result<Product> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "INSERT INTO products (id, vendor_id, name, description, price_cents, stock,
                                   category, approved, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, FALSE, NOW(), NOW())
             RETURNING {SELECT_COLS}"
        ))
        .bind(Uuid::new_v4())
        .bind(vendor_id)
        .bind(&draft.name)
        .bind(&draft.description)
        .bind(draft.price_cents)
        .bind(draft.stock)
        .bind(&draft.category)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    pub async fn get(&self, product_id: Uuid) -> anyhow::Result<Option<Product>> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {SELECT_COLS} FROM products WHERE id = $1"
        ))
        .bind(product_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    pub async fn list(
        &self,
        vendor_id: Option<Uuid>,
        category: Option<&str>,
        approved_only: bool,
        limit: i64,
    ) -> anyhow::Result<Vec<Product>> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {SELECT_COLS} FROM products
             WHERE ($1::uuid IS NULL OR vendor_id = $1)
               AND ($2::text IS NULL OR category = $2)
               AND (NOT $3 OR approved)
             ORDER BY created_at DESC
             LIMIT $4"
        ))
        .bind(vendor_id)
        .bind(category)
        .bind(approved_only)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Updating a product puts it back through admin review.
    pub async fn update(
        &self,
        product_id: Uuid,
        draft: &ProductDraft,
    ) -> anyhow::Result<Option<Product>> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "UPDATE products
             SET name = $1, description = $2, price_cents = $3, stock = $4,
                 category = $5, approved = FALSE, updated_at = NOW()
             WHERE id = $6
             RETURNING {SELECT_COLS}"
        ))
        .bind(&draft.name)
        .bind(&draft.description)
        .bind(draft.price_cents)
        .bind(draft.stock)
        .bind(&draft.category)
        .bind(product_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    pub async fn set_approved(
        &self,
        product_id: Uuid,
        approved: bool,
    ) -> anyhow::Result<Option<Product>> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "UPDATE products SET approved = $1, updated_at = NOW()
             WHERE id = $2
             RETURNING {SELECT_COLS}"
        ))
        .bind(approved)
        .bind(product_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    pub async fn delete(&self, product_id: Uuid) -> anyhow::Result<bool> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(product_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
