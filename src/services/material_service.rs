use futures::future::try_join_all;
use serde_json::{json, Value};

use crate::database::models::{Material, MaterialPatch, MaterialWithCount, NewMaterial};
use crate::database::DatabaseError;
use crate::error::ApiError;
use crate::services::CatalogList;
use crate::state::AppState;

pub struct MaterialService<'a> {
    state: &'a AppState,
}

impl<'a> MaterialService<'a> {
    pub fn new(state: &'a AppState) -> Self {
        Self { state }
    }

    pub async fn list(&self, include_count: bool) -> Result<CatalogList<Material, MaterialWithCount>, ApiError> {
        let materials = self.state.materials.list().await?;
        if !include_count {
            return Ok(CatalogList::Plain(materials));
        }

        let counted = try_join_all(materials.into_iter().map(|material| async move {
            let product_count = self.state.products.count(&json!({ "material_id": material.id })).await?;
            Ok::<_, DatabaseError>(MaterialWithCount { material, product_count })
        }))
        .await?;
        Ok(CatalogList::Counted(counted))
    }

    pub async fn get(&self, id: &str) -> Result<Material, ApiError> {
        self.state
            .materials
            .get(id)
            .await?
            .ok_or_else(|| ApiError::not_found("Material not found"))
    }

    pub async fn create(&self, body: Value) -> Result<Material, ApiError> {
        let material = self.state.materials.insert(NewMaterial::from_body(body)?).await?;
        tracing::info!(id = %material.id, "Material created");
        Ok(material)
    }

    pub async fn update(&self, id: &str, body: Value) -> Result<Material, ApiError> {
        let patch = MaterialPatch::from_body(body)?;
        self.state
            .materials
            .update(id, patch)
            .await?
            .ok_or_else(|| ApiError::not_found("Material not found"))
    }

    /// Products keep working after a material is removed; their reference is cleared.
    pub async fn delete(&self, id: &str) -> Result<(), ApiError> {
        if !self.state.materials.delete(id).await? {
            return Err(ApiError::not_found("Material not found"));
        }
        tracing::info!(id = %id, "Material deleted");
        Ok(())
    }
}
