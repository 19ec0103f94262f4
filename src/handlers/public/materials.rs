// handlers/public/materials.rs - GET /api/materiales, GET /api/materiales/:id

use axum::extract::{Path, State};
use serde::Deserialize;

use crate::database::models::{Material, MaterialWithCount};
use crate::middleware::{ApiResponse, ApiResult, ListQuery};
use crate::services::listing::flag;
use crate::services::{parse_object_id, CatalogList, MaterialService};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaterialListQuery {
    pub include_count: Option<String>,
}

pub async fn list(
    State(state): State<AppState>,
    ListQuery(query): ListQuery<MaterialListQuery>,
) -> ApiResult<CatalogList<Material, MaterialWithCount>> {
    let materials = MaterialService::new(&state).list(flag(query.include_count.as_deref())).await?;
    Ok(ApiResponse::success(materials))
}

pub async fn get(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Material> {
    let id = parse_object_id(&id, "material")?;
    Ok(ApiResponse::success(MaterialService::new(&state).get(&id).await?))
}
