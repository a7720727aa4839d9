use async_trait::async_trait;
use common::{CategoryId, Money, ProductId};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Smallest price the admin surface accepts for a product.
pub const MIN_PRODUCT_PRICE: Money = Money::from_minor(1_000);

/// Shortest name the admin surface accepts for products and categories.
pub const MIN_NAME_LEN: usize = 3;

/// A sellable product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub price: Money,
    pub category_id: CategoryId,
    pub image_url: Option<String>,
}

/// A product grouping shown on the dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
}

/// Fields for creating or replacing a product. The catalog assigns the id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductDraft {
    pub name: String,
    pub price: Money,
    pub category_id: CategoryId,
    pub image_url: Option<String>,
}

impl ProductDraft {
    /// Validates the draft against the admin-surface rules.
    ///
    /// Rejection happens before any mutation.
    pub fn validate(&self) -> Result<()> {
        if self.name.chars().count() < MIN_NAME_LEN {
            return Err(CatalogError::NameTooShort {
                name: self.name.clone(),
            });
        }
        if self.price < MIN_PRODUCT_PRICE {
            return Err(CatalogError::PriceBelowMinimum { price: self.price });
        }
        Ok(())
    }
}

/// Errors that can occur during catalog operations.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Product or category name is shorter than the minimum.
    #[error("Name too short: {name:?} (minimum of {} characters)", MIN_NAME_LEN)]
    NameTooShort { name: String },

    /// Price is below the accepted minimum.
    #[error("Price below minimum: {price} (minimum of {})", MIN_PRODUCT_PRICE)]
    PriceBelowMinimum { price: Money },

    /// Product does not exist.
    #[error("Product not found: {0}")]
    ProductNotFound(ProductId),

    /// Category does not exist.
    #[error("Category not found: {0}")]
    CategoryNotFound(CategoryId),

    /// Category still has products attached.
    #[error("Category {0} still has products and cannot be deleted")]
    CategoryInUse(CategoryId),
}

/// Result type for catalog operations.
pub type Result<T> = std::result::Result<T, CatalogError>;

/// Read and admin operations over the product catalog.
///
/// The order core uses only [`Catalog::products_by_ids`]; everything else
/// serves the dashboard. All implementations must be thread-safe.
#[async_trait]
pub trait Catalog: Send + Sync {
    /// Resolves a batch of product ids.
    ///
    /// Unknown ids are simply absent from the result; the caller decides
    /// whether that is an error.
    async fn products_by_ids(&self, ids: &[ProductId]) -> Result<Vec<Product>>;

    /// Lists products, optionally restricted to one category.
    async fn list_products(&self, category_id: Option<&CategoryId>) -> Result<Vec<Product>>;

    /// Creates a product from a validated draft.
    async fn create_product(&self, draft: ProductDraft) -> Result<Product>;

    /// Replaces the fields of an existing product.
    async fn update_product(&self, id: &ProductId, draft: ProductDraft) -> Result<Product>;

    /// Removes a product.
    async fn delete_product(&self, id: &ProductId) -> Result<()>;

    /// Lists all categories.
    async fn list_categories(&self) -> Result<Vec<Category>>;

    /// Creates a category with the given name.
    async fn create_category(&self, name: &str) -> Result<Category>;

    /// Renames an existing category.
    async fn update_category(&self, id: &CategoryId, name: &str) -> Result<Category>;

    /// Removes a category with no products attached.
    async fn delete_category(&self, id: &CategoryId) -> Result<()>;
}

/// Validates a category name against the admin-surface rules.
pub(crate) fn validate_category_name(name: &str) -> Result<()> {
    if name.chars().count() < MIN_NAME_LEN {
        return Err(CatalogError::NameTooShort {
            name: name.to_string(),
        });
    }
    Ok(())
}
