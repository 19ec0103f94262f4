pub mod auth_service;
pub mod category_service;
pub mod listing;
pub mod material_service;
pub mod product_service;
pub mod upload_service;

use serde::Serialize;

use crate::error::ApiError;
use crate::security::is_valid_object_id;

pub use auth_service::AuthService;
pub use category_service::CategoryService;
pub use listing::{ListingParams, ListingQuery, Pagination, SortOption};
pub use material_service::MaterialService;
pub use product_service::{ProductPage, ProductService};
pub use upload_service::UploadService;

/// List payload that carries per-item product counts only when asked for.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum CatalogList<T, C> {
    Plain(Vec<T>),
    Counted(Vec<C>),
}

/// Path ids must be 24-hex ObjectId strings; stored ids are lowercase.
pub fn parse_object_id(id: &str, entity: &str) -> Result<String, ApiError> {
    if is_valid_object_id(id) {
        Ok(id.to_ascii_lowercase())
    } else {
        Err(ApiError::bad_request(format!("Invalid {} id", entity)))
    }
}
