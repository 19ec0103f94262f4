use std::collections::{HashMap, HashSet};

use serde::Serialize;
use serde_json::Value;

use crate::cdn::delete_images_best_effort;
use crate::database::models::{
    product::removed_images, MaterialRef, NewProduct, Product, ProductPatch, ProductView,
};
use crate::error::ApiError;
use crate::services::listing::{ListingParams, ListingQuery, Pagination};
use crate::state::AppState;

#[derive(Debug, Clone, Serialize)]
pub struct ProductPage {
    pub products: Vec<ProductView>,
    pub pagination: Pagination,
}

pub struct ProductService<'a> {
    state: &'a AppState,
}

impl<'a> ProductService<'a> {
    pub fn new(state: &'a AppState) -> Self {
        Self { state }
    }

    /// Filtered page plus total count; both reads run concurrently.
    pub async fn list(&self, params: &ListingParams) -> Result<ProductPage, ApiError> {
        let query = ListingQuery::from_params(params, &self.state.config.catalog);

        let material_name = match query.material {
            Some(ref id) => self.state.materials.get(id).await?.map(|m| m.name),
            None => None,
        };
        let product_query = query.to_product_query(material_name.as_deref());
        tracing::debug!(
            filter = %product_query.filter,
            sort = query.sort.as_str(),
            page = query.page,
            limit = query.limit,
            "Listing products"
        );

        let (products, total) = tokio::try_join!(
            self.state.products.find(&product_query),
            self.state.products.count(&product_query.filter),
        )?;

        Ok(ProductPage {
            products: self.populate(products).await?,
            pagination: Pagination::new(query.page, query.limit, total),
        })
    }

    pub async fn get(&self, id: &str) -> Result<ProductView, ApiError> {
        let product = self.find(id).await?;
        self.populate_one(product).await
    }

    pub async fn create(&self, body: Value) -> Result<ProductView, ApiError> {
        let new_product = NewProduct::from_body(body)?;
        let product = self.state.products.insert(new_product).await?;
        tracing::info!(id = %product.id, "Product created");
        self.populate_one(product).await
    }

    /// Images dropped from the list are removed from the image host after the
    /// update is stored.
    pub async fn update(&self, id: &str, body: Value) -> Result<ProductView, ApiError> {
        let patch = ProductPatch::from_body(body)?;
        let current = self.find(id).await?;
        let dropped = match patch.images {
            Some(ref images) => removed_images(&current.images, images),
            None => vec![],
        };

        let product = self
            .state
            .products
            .update(id, patch)
            .await?
            .ok_or_else(|| ApiError::not_found("Product not found"))?;

        delete_images_best_effort(self.state.images.as_ref(), &dropped).await;
        self.populate_one(product).await
    }

    pub async fn delete(&self, id: &str) -> Result<(), ApiError> {
        let product = self.find(id).await?;
        delete_images_best_effort(self.state.images.as_ref(), &product.images).await;
        if !self.state.products.delete(id).await? {
            return Err(ApiError::not_found("Product not found"));
        }
        tracing::info!(id = %id, "Product deleted");
        Ok(())
    }

    async fn find(&self, id: &str) -> Result<Product, ApiError> {
        self.state
            .products
            .get(id)
            .await?
            .ok_or_else(|| ApiError::not_found("Product not found"))
    }

    async fn populate_one(&self, product: Product) -> Result<ProductView, ApiError> {
        let mut views = self.populate(vec![product]).await?;
        views.pop().ok_or_else(|| ApiError::internal_server_error("Failed to load product"))
    }

    /// Embed category and material summaries, fetched in one batch each.
    async fn populate(&self, products: Vec<Product>) -> Result<Vec<ProductView>, ApiError> {
        let category_ids: Vec<String> = products
            .iter()
            .map(|p| p.category_id.clone())
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        let material_ids: Vec<String> = products
            .iter()
            .filter_map(|p| match p.material {
                Some(MaterialRef::ById(ref id)) => Some(id.clone()),
                _ => None,
            })
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();

        let (categories, materials) = tokio::try_join!(
            self.state.categories.get_many(&category_ids),
            self.state.materials.get_many(&material_ids),
        )?;

        let categories: HashMap<_, _> = categories.into_iter().map(|c| (c.id.clone(), c)).collect();
        let materials: HashMap<_, _> = materials.into_iter().map(|m| (m.id.clone(), m)).collect();

        Ok(products
            .into_iter()
            .map(|p| ProductView::populate(p, &categories, &materials))
            .collect())
    }
}
