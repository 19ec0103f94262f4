// handlers/public/categories.rs - GET /api/categorias, GET /api/categorias/:id

use axum::extract::{Path, State};
use serde::Deserialize;

use crate::database::models::{Category, CategoryWithCount};
use crate::middleware::{ApiResponse, ApiResult, ListQuery};
use crate::services::listing::flag;
use crate::services::{parse_object_id, CatalogList, CategoryService};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryListQuery {
    pub include_inactive: Option<String>,
    pub include_count: Option<String>,
}

/// GET /api/categorias - categories by name, active only unless `includeInactive`
pub async fn list(
    State(state): State<AppState>,
    ListQuery(query): ListQuery<CategoryListQuery>,
) -> ApiResult<CatalogList<Category, CategoryWithCount>> {
    let categories = CategoryService::new(&state)
        .list(flag(query.include_inactive.as_deref()), flag(query.include_count.as_deref()))
        .await?;
    Ok(ApiResponse::success(categories))
}

/// GET /api/categorias/:id
pub async fn get(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Category> {
    let id = parse_object_id(&id, "category")?;
    Ok(ApiResponse::success(CategoryService::new(&state).get(&id).await?))
}
