//! Storage seams. Handlers only ever see these traits; the Postgres
//! implementations live in [`crate::database::stores`].

use async_trait::async_trait;
use serde_json::Value;

use crate::database::manager::DatabaseError;
use crate::database::models::{
    Category, CategoryPatch, Material, MaterialPatch, NewCategory, NewMaterial, NewProduct,
    NewUser, Product, ProductPatch, User, UserCredentials,
};
use crate::filter::FilterOrderInfo;

/// One page of a filtered product read.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductQuery {
    /// Mongo-style filter document.
    pub filter: Value,
    pub order: Vec<FilterOrderInfo>,
    pub limit: i64,
    pub offset: i64,
}

#[async_trait]
pub trait ProductStore: Send + Sync {
    async fn find(&self, query: &ProductQuery) -> Result<Vec<Product>, DatabaseError>;
    async fn count(&self, filter: &Value) -> Result<i64, DatabaseError>;
    async fn get(&self, id: &str) -> Result<Option<Product>, DatabaseError>;
    async fn insert(&self, product: NewProduct) -> Result<Product, DatabaseError>;
    async fn update(&self, id: &str, patch: ProductPatch) -> Result<Option<Product>, DatabaseError>;
    async fn delete(&self, id: &str) -> Result<bool, DatabaseError>;
}

#[async_trait]
pub trait CategoryStore: Send + Sync {
    /// Sorted by name.
    async fn list(&self, include_inactive: bool) -> Result<Vec<Category>, DatabaseError>;
    async fn get(&self, id: &str) -> Result<Option<Category>, DatabaseError>;
    async fn get_many(&self, ids: &[String]) -> Result<Vec<Category>, DatabaseError>;
    async fn insert(&self, category: NewCategory) -> Result<Category, DatabaseError>;
    async fn update(&self, id: &str, patch: CategoryPatch) -> Result<Option<Category>, DatabaseError>;
    async fn delete(&self, id: &str) -> Result<bool, DatabaseError>;
}

#[async_trait]
pub trait MaterialStore: Send + Sync {
    /// Sorted by name.
    async fn list(&self) -> Result<Vec<Material>, DatabaseError>;
    async fn get(&self, id: &str) -> Result<Option<Material>, DatabaseError>;
    async fn get_many(&self, ids: &[String]) -> Result<Vec<Material>, DatabaseError>;
    async fn insert(&self, material: NewMaterial) -> Result<Material, DatabaseError>;
    async fn update(&self, id: &str, patch: MaterialPatch) -> Result<Option<Material>, DatabaseError>;
    async fn delete(&self, id: &str) -> Result<bool, DatabaseError>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Active user by normalised username, including the password hash.
    async fn find_credentials(&self, username: &str) -> Result<Option<UserCredentials>, DatabaseError>;
    async fn insert(&self, user: NewUser) -> Result<User, DatabaseError>;
}
