pub mod manager;
pub mod models;
pub mod object_id;
pub mod query_builder;
pub mod repository;
pub mod stores;

pub use manager::{DatabaseError, DatabaseManager};
pub use repository::{CategoryStore, MaterialStore, ProductQuery, ProductStore, UserStore};
pub use stores::{PgCategoryStore, PgMaterialStore, PgProductStore, PgUserStore};
