use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// Catalog Domain - Products
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: Uuid,
    pub vendor_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub price_cents: i64,
    pub stock: i32,
    pub category: String,
    /// Products are hidden from buyers until an admin approves them
    pub approved: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProductDraft {
    pub name: String,
    pub description: Option<String>,
    pub price_cents: i64,
    pub stock: i32,
    pub category: String,
}

impl ProductDraft {
    pub fn validate(&self) -> Result<(), CatalogError> {
        if self.name.trim().is_empty() {
            return Err(CatalogError::EmptyName);
        }
        if self.price_cents <= 0 {
            return Err(CatalogError::InvalidPrice(self.price_cents));
        }
        if self.stock < 0 {
            return Err(CatalogError::InvalidStock(self.stock));
        }
        if self.category.trim().is_empty() {
            return Err(CatalogError::EmptyCategory);
        }
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Product not found: {0}")]
    NotFound(Uuid),

    #[error("Product name cannot be empty")]
    EmptyName,

    #[error("Product category cannot be empty")]
    EmptyCategory,

    #[error("Invalid price: {0}")]
    InvalidPrice(i64),

    #[error("Invalid stock: {0}")]
    InvalidStock(i32),

    #[error("Product {product_id} does not belong to vendor {vendor_id}")]
    VendorMismatch { product_id: Uuid, vendor_id: Uuid },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> ProductDraft {
        ProductDraft {
            name: "Ceylon Cinnamon 250g".to_string(),
            description: None,
            price_cents: 1_299,
            stock: 40,
            category: "spices".to_string(),
        }
    }

    #[test]
    fn test_valid_draft() {
        assert!(draft().validate().is_ok());
    }

    #[test]
    fn test_rejects_free_products() {
        let mut d = draft();
        d.price_cents = 0;
        assert!(matches!(d.validate(), Err(CatalogError::InvalidPrice(0))));
    }

    #[test]
    fn test_rejects_negative_stock() {
        let mut d = draft();
        d.stock = -1;
        assert!(matches!(d.validate(), Err(CatalogError::InvalidStock(-1))));
    }

    #[test]
    fn test_rejects_blank_name_and_category() {
        let mut d = draft();
        d.name = "   ".to_string();
        assert!(matches!(d.validate(), Err(CatalogError::EmptyName)));

        let mut d = draft();
        d.category = String::new();
        assert!(matches!(d.validate(), Err(CatalogError::EmptyCategory)));
    }
}
