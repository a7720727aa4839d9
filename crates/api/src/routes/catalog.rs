//! Catalog admin endpoints (data-entry glue for the dashboard).

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use catalog::{Catalog, Category, Product, ProductDraft};
use common::{CategoryId, Money, ProductId};
use ledger::OrderStore;
use payment::PaymentGateway;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::routes::orders::AppState;

#[derive(Deserialize)]
pub struct ProductBody {
    pub name: String,
    pub price: i64,
    pub category_id: String,
    pub image_url: Option<String>,
}

impl ProductBody {
    fn into_draft(self) -> ProductDraft {
        ProductDraft {
            name: self.name,
            price: Money::from_minor(self.price),
            category_id: CategoryId::new(self.category_id),
            image_url: self.image_url,
        }
    }
}

#[derive(Deserialize)]
pub struct CategoryBody {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct ListProductsQuery {
    pub category_id: Option<String>,
}

#[derive(Serialize)]
pub struct ProductResponse {
    pub id: String,
    pub name: String,
    pub price: i64,
    pub category_id: String,
    pub image_url: Option<String>,
}

impl From<Product> for ProductResponse {
    fn from(product: Product) -> Self {
        Self {
            id: product.id.to_string(),
            name: product.name,
            price: product.price.minor(),
            category_id: product.category_id.to_string(),
            image_url: product.image_url,
        }
    }
}

#[derive(Serialize)]
pub struct CategoryResponse {
    pub id: String,
    pub name: String,
}

impl From<Category> for CategoryResponse {
    fn from(category: Category) -> Self {
        Self {
            id: category.id.to_string(),
            name: category.name,
        }
    }
}

/// GET /products — list products, optionally by category.
#[tracing::instrument(skip(state))]
pub async fn list_products<S, C, G>(
    State(state): State<Arc<AppState<S, C, G>>>,
    Query(query): Query<ListProductsQuery>,
) -> Result<Json<Vec<ProductResponse>>, ApiError>
where
    S: OrderStore + 'static,
    C: Catalog + 'static,
    G: PaymentGateway + 'static,
{
    let category_id = query.category_id.map(CategoryId::new);
    let products = state.catalog.list_products(category_id.as_ref()).await?;
    Ok(Json(products.into_iter().map(ProductResponse::from).collect()))
}

/// POST /products — create a product.
#[tracing::instrument(skip(state, body))]
pub async fn create_product<S, C, G>(
    State(state): State<Arc<AppState<S, C, G>>>,
    Json(body): Json<ProductBody>,
) -> Result<(StatusCode, Json<ProductResponse>), ApiError>
where
    S: OrderStore + 'static,
    C: Catalog + 'static,
    G: PaymentGateway + 'static,
{
    let product = state.catalog.create_product(body.into_draft()).await?;
    Ok((StatusCode::CREATED, Json(product.into())))
}

/// PUT /products/{id} — replace a product's fields.
#[tracing::instrument(skip(state, body))]
pub async fn update_product<S, C, G>(
    State(state): State<Arc<AppState<S, C, G>>>,
    Path(id): Path<String>,
    Json(body): Json<ProductBody>,
) -> Result<Json<ProductResponse>, ApiError>
where
    S: OrderStore + 'static,
    C: Catalog + 'static,
    G: PaymentGateway + 'static,
{
    let product = state
        .catalog
        .update_product(&ProductId::new(id), body.into_draft())
        .await?;
    Ok(Json(product.into()))
}

/// DELETE /products/{id} — remove a product.
#[tracing::instrument(skip(state))]
pub async fn delete_product<S, C, G>(
    State(state): State<Arc<AppState<S, C, G>>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError>
where
    S: OrderStore + 'static,
    C: Catalog + 'static,
    G: PaymentGateway + 'static,
{
    state.catalog.delete_product(&ProductId::new(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /categories — list categories.
#[tracing::instrument(skip(state))]
pub async fn list_categories<S, C, G>(
    State(state): State<Arc<AppState<S, C, G>>>,
) -> Result<Json<Vec<CategoryResponse>>, ApiError>
where
    S: OrderStore + 'static,
    C: Catalog + 'static,
    G: PaymentGateway + 'static,
{
    let categories = state.catalog.list_categories().await?;
    Ok(Json(
        categories.into_iter().map(CategoryResponse::from).collect(),
    ))
}

/// POST /categories — create a category.
#[tracing::instrument(skip(state, body))]
pub async fn create_category<S, C, G>(
    State(state): State<Arc<AppState<S, C, G>>>,
    Json(body): Json<CategoryBody>,
) -> Result<(StatusCode, Json<CategoryResponse>), ApiError>
where
    S: OrderStore + 'static,
    C: Catalog + 'static,
    G: PaymentGateway + 'static,
{
    let category = state.catalog.create_category(&body.name).await?;
    Ok((StatusCode::CREATED, Json(category.into())))
}

/// PUT /categories/{id} — rename a category.
#[tracing::instrument(skip(state, body))]
pub async fn update_category<S, C, G>(
    State(state): State<Arc<AppState<S, C, G>>>,
    Path(id): Path<String>,
    Json(body): Json<CategoryBody>,
) -> Result<Json<CategoryResponse>, ApiError>
where
    S: OrderStore + 'static,
    C: Catalog + 'static,
    G: PaymentGateway + 'static,
{
    let category = state
        .catalog
        .update_category(&CategoryId::new(id), &body.name)
        .await?;
    Ok(Json(category.into()))
}

/// DELETE /categories/{id} — remove an empty category.
#[tracing::instrument(skip(state))]
pub async fn delete_category<S, C, G>(
    State(state): State<Arc<AppState<S, C, G>>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError>
where
    S: OrderStore + 'static,
    C: Catalog + 'static,
    G: PaymentGateway + 'static,
{
    state.catalog.delete_category(&CategoryId::new(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}
