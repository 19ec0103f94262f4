use futures::future::try_join_all;
use serde_json::{json, Value};

use crate::database::models::{Category, CategoryPatch, CategoryWithCount, NewCategory};
use crate::database::DatabaseError;
use crate::error::ApiError;
use crate::services::CatalogList;
use crate::state::AppState;

pub struct CategoryService<'a> {
    state: &'a AppState,
}

impl<'a> CategoryService<'a> {
    pub fn new(state: &'a AppState) -> Self {
        Self { state }
    }

    pub async fn list(
        &self,
        include_inactive: bool,
        include_count: bool,
    ) -> Result<CatalogList<Category, CategoryWithCount>, ApiError> {
        let categories = self.state.categories.list(include_inactive).await?;
        if !include_count {
            return Ok(CatalogList::Plain(categories));
        }

        let counted = try_join_all(categories.into_iter().map(|category| async move {
            let product_count = self.product_count(&category.id).await?;
            Ok::<_, DatabaseError>(CategoryWithCount { category, product_count })
        }))
        .await?;
        Ok(CatalogList::Counted(counted))
    }

    pub async fn get(&self, id: &str) -> Result<Category, ApiError> {
        self.state
            .categories
            .get(id)
            .await?
            .ok_or_else(|| ApiError::not_found("Category not found"))
    }

    pub async fn create(&self, body: Value) -> Result<Category, ApiError> {
        let category = self.state.categories.insert(NewCategory::from_body(body)?).await?;
        tracing::info!(id = %category.id, slug = %category.slug, "Category created");
        Ok(category)
    }

    pub async fn update(&self, id: &str, body: Value) -> Result<Category, ApiError> {
        let patch = CategoryPatch::from_body(body)?;
        self.state
            .categories
            .update(id, patch)
            .await?
            .ok_or_else(|| ApiError::not_found("Category not found"))
    }

    /// Refused while any product references the category. The foreign key
    /// catches products attached between the count and the delete.
    pub async fn delete(&self, id: &str) -> Result<(), ApiError> {
        let blocking = self.product_count(id).await?;
        if blocking > 0 {
            return Err(ApiError::conflict(format!(
                "Cannot delete category: {} product(s) belong to it",
                blocking
            )));
        }

        match self.state.categories.delete(id).await {
            Ok(true) => {
                tracing::info!(id = %id, "Category deleted");
                Ok(())
            }
            Ok(false) => Err(ApiError::not_found("Category not found")),
            Err(DatabaseError::ForeignKey(_)) => Err(ApiError::conflict(
                "Cannot delete category: products were added to it concurrently",
            )),
            Err(e) => Err(e.into()),
        }
    }

    async fn product_count(&self, id: &str) -> Result<i64, DatabaseError> {
        self.state.products.count(&json!({ "category_id": id })).await
    }
}
