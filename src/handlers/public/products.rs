// handlers/public/products.rs - GET /api/productos, GET /api/productos/:id

use axum::extract::{Path, State};

use crate::database::models::ProductView;
use crate::middleware::{ApiResponse, ApiResult, ListQuery};
use crate::services::{parse_object_id, ListingParams, ProductPage, ProductService};
use crate::state::AppState;

/// GET /api/productos - filtered, sorted, paginated storefront listing
///
/// Query: `category, material, search, priceMin, priceMax, page, limit, sort, includeInactive`.
/// Malformed values are ignored rather than rejected; a repeated key keeps its first value.
pub async fn list(
    State(state): State<AppState>,
    ListQuery(params): ListQuery<ListingParams>,
) -> ApiResult<ProductPage> {
    Ok(ApiResponse::success(ProductService::new(&state).list(&params).await?))
}

/// GET /api/productos/:id - one product with category and material embedded
pub async fn get(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<ProductView> {
    let id = parse_object_id(&id, "product")?;
    Ok(ApiResponse::success(ProductService::new(&state).get(&id).await?))
}
