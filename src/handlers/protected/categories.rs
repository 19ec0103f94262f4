// handlers/protected/categories.rs - POST /api/categorias, PUT|DELETE /api/categorias/:id

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};
use serde_json::Value;

use crate::database::models::Category;
use crate::handlers::json_body;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::{parse_object_id, CategoryService};
use crate::state::AppState;

pub async fn post(
    _user: AuthUser,
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Category> {
    let category = CategoryService::new(&state).create(json_body(body)?).await?;
    Ok(ApiResponse::created(category).with_message("Category created successfully"))
}

pub async fn put(
    _user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Category> {
    let id = parse_object_id(&id, "category")?;
    let category = CategoryService::new(&state).update(&id, json_body(body)?).await?;
    Ok(ApiResponse::success(category).with_message("Category updated successfully"))
}

/// 409 with the number of blocking products while any product uses it
pub async fn delete(_user: AuthUser, State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<()> {
    let id = parse_object_id(&id, "category")?;
    CategoryService::new(&state).delete(&id).await?;
    Ok(ApiResponse::success(()).with_message("Category deleted successfully"))
}
