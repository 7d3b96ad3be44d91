//! Product listing and management handlers.
//!
//! Reads are public; every mutation requires a token, and updates and deletes
//! additionally require ownership of the listing.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use bazaar_core::ProductId;

use crate::db::{PAGE_SIZE, ProductRepository};
use crate::error::AppError;
use crate::middleware::RequireAuth;
use crate::models::{MAX_TITLE_LENGTH, NewProduct, ProductPatch, ProductView};
use crate::state::AppState;

use super::coerce_price;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/products", get(list).post(create))
        .route("/api/products/my-products", get(my_products))
        .route(
            "/api/products/{id}",
            get(get_one).put(update).delete(delete),
        )
}

#[derive(Debug, Deserialize)]
struct ListQuery {
    #[serde(rename = "pageNumber")]
    page_number: Option<i64>,
    keyword: Option<String>,
}

#[derive(Debug, Serialize)]
struct ProductListResponse {
    products: Vec<ProductView>,
    page: i64,
    pages: i64,
    total: i64,
}

#[derive(Debug, Serialize)]
struct MyProductsResponse {
    products: Vec<ProductView>,
}

#[derive(Debug, Deserialize)]
struct CreateProductRequest {
    title: Option<String>,
    description: Option<String>,
    price: Option<Value>,
    image: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UpdateProductRequest {
    title: Option<String>,
    description: Option<String>,
    price: Option<Value>,
    image: Option<String>,
}

/// Number of pages needed to show `total` items, [`PAGE_SIZE`] at a time.
const fn total_pages(total: i64) -> i64 {
    (total + PAGE_SIZE - 1) / PAGE_SIZE
}

fn validate_title(title: &str) -> Result<(), AppError> {
    if title.trim().is_empty() {
        return Err(AppError::Validation("Title is required".to_owned()));
    }
    if title.len() > MAX_TITLE_LENGTH {
        return Err(AppError::Validation(format!(
            "Title cannot exceed {MAX_TITLE_LENGTH} characters"
        )));
    }
    Ok(())
}

async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ProductListResponse>, AppError> {
    let page = query.page_number.unwrap_or(1).max(1);
    let keyword = query.keyword.as_deref().filter(|k| !k.trim().is_empty());

    let page_data = ProductRepository::new(state.pool())
        .list(page, keyword)
        .await?;

    let products = page_data
        .products
        .into_iter()
        .map(|(product, owner)| ProductView::new(product, owner))
        .collect();

    Ok(Json(ProductListResponse {
        products,
        page,
        pages: total_pages(page_data.total),
        total: page_data.total,
    }))
}

async fn get_one(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<Json<ProductView>, AppError> {
    let (product, owner) = ProductRepository::new(state.pool())
        .get_with_owner(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Product".to_owned()))?;

    Ok(Json(ProductView::new(product, owner)))
}

async fn create(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
    Json(request): Json<CreateProductRequest>,
) -> Result<(StatusCode, Json<ProductView>), AppError> {
    let title = request
        .title
        .ok_or_else(|| AppError::Validation("Title is required".to_owned()))?;
    validate_title(&title)?;

    let description = request
        .description
        .filter(|d| !d.trim().is_empty())
        .ok_or_else(|| AppError::Validation("Description is required".to_owned()))?;

    let price = request
        .price
        .ok_or_else(|| AppError::Validation("Price is required".to_owned()))?;
    let price = coerce_price("price", &price)?;

    let image = request
        .image
        .ok_or_else(|| AppError::Validation("Image is required".to_owned()))?;

    let product = ProductRepository::new(state.pool())
        .create(NewProduct {
            title,
            description,
            price,
            image,
            created_by: current.id,
        })
        .await?;

    tracing::info!(product_id = %product.id, user_id = %current.id, "Product created");

    Ok((StatusCode::CREATED, Json(ProductView::new(product, None))))
}

async fn update(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
    Path(id): Path<ProductId>,
    Json(request): Json<UpdateProductRequest>,
) -> Result<Json<ProductView>, AppError> {
    let repo = ProductRepository::new(state.pool());

    let mut product = repo
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Product".to_owned()))?;

    if !product.is_owned_by(current.id) {
        return Err(AppError::Forbidden);
    }

    if let Some(title) = &request.title {
        validate_title(title)?;
    }

    let price = request
        .price
        .as_ref()
        .map(|v| coerce_price("price", v))
        .transpose()?;

    ProductPatch {
        title: request.title,
        description: request.description,
        price,
        image: request.image,
    }
    .apply(&mut product);

    let updated = repo.update(&product).await.map_err(|e| match e {
        crate::db::RepositoryError::NotFound => AppError::NotFound("Product".to_owned()),
        other => other.into(),
    })?;

    Ok(Json(ProductView::new(updated, None)))
}

async fn delete(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
    Path(id): Path<ProductId>,
) -> Result<Json<Value>, AppError> {
    let repo = ProductRepository::new(state.pool());

    let product = repo
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Product".to_owned()))?;

    if !product.is_owned_by(current.id) {
        return Err(AppError::Forbidden);
    }

    repo.delete(id).await.map_err(|e| match e {
        crate::db::RepositoryError::NotFound => AppError::NotFound("Product".to_owned()),
        other => other.into(),
    })?;

    tracing::info!(product_id = %id, user_id = %current.id, "Product deleted");

    Ok(Json(serde_json::json!({ "message": "Product removed" })))
}

async fn my_products(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
) -> Result<Json<MyProductsResponse>, AppError> {
    let products = ProductRepository::new(state.pool())
        .list_by_owner(current.id)
        .await?
        .into_iter()
        .map(|(product, owner)| ProductView::new(product, owner))
        .collect();

    Ok(Json(MyProductsResponse { products }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_count_rounds_up() {
        assert_eq!(total_pages(0), 0);
        assert_eq!(total_pages(1), 1);
        assert_eq!(total_pages(10), 1);
        assert_eq!(total_pages(11), 2);
        assert_eq!(total_pages(95), 10);
    }

    #[test]
    fn title_length_is_bounded() {
        assert!(validate_title("Running Shoes").is_ok());
        assert!(validate_title("").is_err());
        assert!(validate_title("  ").is_err());
        assert!(validate_title(&"x".repeat(MAX_TITLE_LENGTH)).is_ok());
        assert!(validate_title(&"x".repeat(MAX_TITLE_LENGTH + 1)).is_err());
    }
}
