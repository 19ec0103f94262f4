// handlers/protected/materials.rs - POST /api/materiales, PUT|DELETE /api/materiales/:id

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};
use serde_json::Value;

use crate::database::models::Material;
use crate::handlers::json_body;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::{parse_object_id, MaterialService};
use crate::state::AppState;

pub async fn post(
    _user: AuthUser,
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Material> {
    let material = MaterialService::new(&state).create(json_body(body)?).await?;
    Ok(ApiResponse::created(material).with_message("Material created successfully"))
}

pub async fn put(
    _user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Material> {
    let id = parse_object_id(&id, "material")?;
    let material = MaterialService::new(&state).update(&id, json_body(body)?).await?;
    Ok(ApiResponse::success(material).with_message("Material updated successfully"))
}

pub async fn delete(_user: AuthUser, State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<()> {
    let id = parse_object_id(&id, "material")?;
    MaterialService::new(&state).delete(&id).await?;
    Ok(ApiResponse::success(()).with_message("Material deleted successfully"))
}
