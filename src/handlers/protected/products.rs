// handlers/protected/products.rs - POST /api/productos, PUT|DELETE /api/productos/:id

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};
use serde_json::Value;

use crate::database::models::ProductView;
use crate::handlers::json_body;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::{parse_object_id, ProductService};
use crate::state::AppState;

pub async fn post(
    _user: AuthUser,
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<ProductView> {
    let product = ProductService::new(&state).create(json_body(body)?).await?;
    Ok(ApiResponse::created(product).with_message("Product created successfully"))
}

pub async fn put(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<ProductView> {
    let id = parse_object_id(&id, "product")?;
    tracing::debug!(user = %user.username, id = %id, "Updating product");
    let product = ProductService::new(&state).update(&id, json_body(body)?).await?;
    Ok(ApiResponse::success(product).with_message("Product updated successfully"))
}

pub async fn delete(user: AuthUser, State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<()> {
    let id = parse_object_id(&id, "product")?;
    tracing::debug!(user = %user.username, id = %id, "Deleting product");
    ProductService::new(&state).delete(&id).await?;
    Ok(ApiResponse::success(()).with_message("Product deleted successfully"))
}
