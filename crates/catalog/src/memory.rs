use std::collections::HashMap;
use std::sync::Arc;

use common::{CategoryId, ProductId};
use tokio::sync::RwLock;

use crate::store::{
    Catalog, CatalogError, Category, Product, ProductDraft, Result, validate_category_name,
};

use async_trait::async_trait;

#[derive(Debug, Default)]
struct CatalogState {
    products: HashMap<ProductId, Product>,
    categories: HashMap<CategoryId, Category>,
    next_product: u32,
    next_category: u32,
}

/// In-memory catalog implementation.
///
/// Ids are sequential (`prod-0001`, `cat-0001`) so tests stay deterministic.
#[derive(Clone, Default)]
pub struct InMemoryCatalog {
    state: Arc<RwLock<CatalogState>>,
}

impl InMemoryCatalog {
    /// Creates a new empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of products.
    pub async fn product_count(&self) -> usize {
        self.state.read().await.products.len()
    }

    /// Seeds a product with a fixed id, bypassing draft validation.
    ///
    /// Test/demo helper for wiring up known catalog contents.
    pub async fn seed_product(&self, product: Product) {
        let mut state = self.state.write().await;
        state
            .categories
            .entry(product.category_id.clone())
            .or_insert_with(|| Category {
                id: product.category_id.clone(),
                name: product.category_id.to_string(),
            });
        state.products.insert(product.id.clone(), product);
    }
}

#[async_trait]
impl Catalog for InMemoryCatalog {
    async fn products_by_ids(&self, ids: &[ProductId]) -> Result<Vec<Product>> {
        let state = self.state.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| state.products.get(id).cloned())
            .collect())
    }

    async fn list_products(&self, category_id: Option<&CategoryId>) -> Result<Vec<Product>> {
        let state = self.state.read().await;
        let mut products: Vec<Product> = state
            .products
            .values()
            .filter(|p| category_id.is_none_or(|c| &p.category_id == c))
            .cloned()
            .collect();
        products.sort_by(|a, b| a.id.as_str().cmp(b.id.as_str()));
        Ok(products)
    }

    async fn create_product(&self, draft: ProductDraft) -> Result<Product> {
        draft.validate()?;

        let mut state = self.state.write().await;
        if !state.categories.contains_key(&draft.category_id) {
            return Err(CatalogError::CategoryNotFound(draft.category_id));
        }

        state.next_product += 1;
        let product = Product {
            id: ProductId::new(format!("prod-{:04}", state.next_product)),
            name: draft.name,
            price: draft.price,
            category_id: draft.category_id,
            image_url: draft.image_url,
        };
        state.products.insert(product.id.clone(), product.clone());
        Ok(product)
    }

    async fn update_product(&self, id: &ProductId, draft: ProductDraft) -> Result<Product> {
        draft.validate()?;

        let mut state = self.state.write().await;
        if !state.categories.contains_key(&draft.category_id) {
            return Err(CatalogError::CategoryNotFound(draft.category_id));
        }

        let product = state
            .products
            .get_mut(id)
            .ok_or_else(|| CatalogError::ProductNotFound(id.clone()))?;
        product.name = draft.name;
        product.price = draft.price;
        product.category_id = draft.category_id;
        product.image_url = draft.image_url;
        Ok(product.clone())
    }

    async fn delete_product(&self, id: &ProductId) -> Result<()> {
        let mut state = self.state.write().await;
        state
            .products
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| CatalogError::ProductNotFound(id.clone()))
    }

    async fn list_categories(&self) -> Result<Vec<Category>> {
        let state = self.state.read().await;
        let mut categories: Vec<Category> = state.categories.values().cloned().collect();
        categories.sort_by(|a, b| a.id.as_str().cmp(b.id.as_str()));
        Ok(categories)
    }

    async fn create_category(&self, name: &str) -> Result<Category> {
        validate_category_name(name)?;

        let mut state = self.state.write().await;
        state.next_category += 1;
        let category = Category {
            id: CategoryId::new(format!("cat-{:04}", state.next_category)),
            name: name.to_string(),
        };
        state
            .categories
            .insert(category.id.clone(), category.clone());
        Ok(category)
    }

    async fn update_category(&self, id: &CategoryId, name: &str) -> Result<Category> {
        validate_category_name(name)?;

        let mut state = self.state.write().await;
        let category = state
            .categories
            .get_mut(id)
            .ok_or_else(|| CatalogError::CategoryNotFound(id.clone()))?;
        category.name = name.to_string();
        Ok(category.clone())
    }

    async fn delete_category(&self, id: &CategoryId) -> Result<()> {
        let mut state = self.state.write().await;
        if !state.categories.contains_key(id) {
            return Err(CatalogError::CategoryNotFound(id.clone()));
        }
        if state.products.values().any(|p| &p.category_id == id) {
            return Err(CatalogError::CategoryInUse(id.clone()));
        }
        state.categories.remove(id);
        Ok(())
    }
}
