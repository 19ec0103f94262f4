use async_trait::async_trait;
use serde_json::Value;
use sqlx::{PgPool, Postgres};

use crate::database::manager::DatabaseError;
use crate::database::models::{
    Category, CategoryPatch, Material, MaterialPatch, NewCategory, NewMaterial, NewProduct,
    NewUser, Product, ProductPatch, ProductRow, User, UserCredentials,
};
use crate::database::object_id::new_object_id;
use crate::database::query_builder::QueryBuilder;
use crate::database::repository::{CategoryStore, MaterialStore, ProductQuery, ProductStore, UserStore};
use crate::filter::Filter;

type SqlBuilder<'a> = sqlx::QueryBuilder<'a, Postgres>;

/// Starts `UPDATE <table> SET updated_at = now()`; callers append `, col = $n`.
fn update_builder(table: &str) -> SqlBuilder<'static> {
    SqlBuilder::new(format!("UPDATE {} SET updated_at = now()", table))
}

pub struct PgProductStore {
    pool: PgPool,
    search_language: String,
}

impl PgProductStore {
    pub fn new(pool: PgPool, search_language: impl Into<String>) -> Self {
        Self { pool, search_language: search_language.into() }
    }

    fn filter(&self, where_data: &Value) -> Result<Filter, DatabaseError> {
        let mut filter = Filter::new("products")?;
        filter
            .text_search(&["name", "description"], &self.search_language)
            .where_clause(where_data.clone())?;
        Ok(filter)
    }
}

#[async_trait]
impl ProductStore for PgProductStore {
    async fn find(&self, query: &ProductQuery) -> Result<Vec<Product>, DatabaseError> {
        let mut filter = self.filter(&query.filter)?;
        filter.order(query.order.clone()).limit(query.limit, Some(query.offset))?;
        let rows = QueryBuilder::<ProductRow>::new(filter).select_all(&self.pool).await?;
        Ok(rows.into_iter().map(Product::from).collect())
    }

    async fn count(&self, filter: &Value) -> Result<i64, DatabaseError> {
        QueryBuilder::<ProductRow>::new(self.filter(filter)?).count(&self.pool).await
    }

    async fn get(&self, id: &str) -> Result<Option<Product>, DatabaseError> {
        let row = sqlx::query_as::<_, ProductRow>("SELECT * FROM products WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Product::from))
    }

    async fn insert(&self, product: NewProduct) -> Result<Product, DatabaseError> {
        let row = sqlx::query_as::<_, ProductRow>(
            "INSERT INTO products (id, name, description, price, material_id, category_id, images, active) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING *",
        )
        .bind(new_object_id())
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price)
        .bind(&product.material_id)
        .bind(&product.category_id)
        .bind(&product.images)
        .bind(product.active)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.into())
    }

    async fn update(&self, id: &str, patch: ProductPatch) -> Result<Option<Product>, DatabaseError> {
        let mut qb = update_builder("products");
        if let Some(name) = patch.name {
            qb.push(", name = ").push_bind(name);
        }
        if let Some(description) = patch.description {
            qb.push(", description = ").push_bind(description);
        }
        if let Some(price) = patch.price {
            qb.push(", price = ").push_bind(price);
        }
        if let Some(material_id) = patch.material_id {
            // Writing a reference retires the legacy free-text value.
            qb.push(", material_id = ").push_bind(material_id);
            qb.push(", material_name = NULL");
        }
        if let Some(category_id) = patch.category_id {
            qb.push(", category_id = ").push_bind(category_id);
        }
        if let Some(images) = patch.images {
            qb.push(", images = ").push_bind(images);
        }
        if let Some(active) = patch.active {
            qb.push(", active = ").push_bind(active);
        }
        qb.push(" WHERE id = ").push_bind(id.to_string()).push(" RETURNING *");

        let row = qb.build_query_as::<ProductRow>().fetch_optional(&self.pool).await?;
        Ok(row.map(Product::from))
    }

    async fn delete(&self, id: &str) -> Result<bool, DatabaseError> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1").bind(id).execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }
}

pub struct PgCategoryStore {
    pool: PgPool,
}

impl PgCategoryStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CategoryStore for PgCategoryStore {
    async fn list(&self, include_inactive: bool) -> Result<Vec<Category>, DatabaseError> {
        let sql = if include_inactive {
            "SELECT * FROM categories ORDER BY name ASC"
        } else {
            "SELECT * FROM categories WHERE active ORDER BY name ASC"
        };
        Ok(sqlx::query_as::<_, Category>(sql).fetch_all(&self.pool).await?)
    }

    async fn get(&self, id: &str) -> Result<Option<Category>, DatabaseError> {
        Ok(sqlx::query_as::<_, Category>("SELECT * FROM categories WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn get_many(&self, ids: &[String]) -> Result<Vec<Category>, DatabaseError> {
        if ids.is_empty() {
            return Ok(vec![]);
        }
        Ok(sqlx::query_as::<_, Category>("SELECT * FROM categories WHERE id = ANY($1)")
            .bind(ids)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn insert(&self, category: NewCategory) -> Result<Category, DatabaseError> {
        Ok(sqlx::query_as::<_, Category>(
            "INSERT INTO categories (id, name, description, slug, active) \
             VALUES ($1, $2, $3, $4, $5) RETURNING *",
        )
        .bind(new_object_id())
        .bind(&category.name)
        .bind(&category.description)
        .bind(&category.slug)
        .bind(category.active)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn update(&self, id: &str, patch: CategoryPatch) -> Result<Option<Category>, DatabaseError> {
        let slug = patch.slug();
        let mut qb = update_builder("categories");
        if let Some(name) = patch.name {
            qb.push(", name = ").push_bind(name);
        }
        if let Some(slug) = slug {
            qb.push(", slug = ").push_bind(slug);
        }
        if let Some(description) = patch.description {
            qb.push(", description = ").push_bind(description);
        }
        if let Some(active) = patch.active {
            qb.push(", active = ").push_bind(active);
        }
        qb.push(" WHERE id = ").push_bind(id.to_string()).push(" RETURNING *");

        Ok(qb.build_query_as::<Category>().fetch_optional(&self.pool).await?)
    }

    async fn delete(&self, id: &str) -> Result<bool, DatabaseError> {
        let result = sqlx::query("DELETE FROM categories WHERE id = $1").bind(id).execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }
}

pub struct PgMaterialStore {
    pool: PgPool,
}

impl PgMaterialStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MaterialStore for PgMaterialStore {
    async fn list(&self) -> Result<Vec<Material>, DatabaseError> {
        Ok(sqlx::query_as::<_, Material>("SELECT * FROM materials ORDER BY name ASC")
            .fetch_all(&self.pool)
            .await?)
    }

    async fn get(&self, id: &str) -> Result<Option<Material>, DatabaseError> {
        Ok(sqlx::query_as::<_, Material>("SELECT * FROM materials WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn get_many(&self, ids: &[String]) -> Result<Vec<Material>, DatabaseError> {
        if ids.is_empty() {
            return Ok(vec![]);
        }
        Ok(sqlx::query_as::<_, Material>("SELECT * FROM materials WHERE id = ANY($1)")
            .bind(ids)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn insert(&self, material: NewMaterial) -> Result<Material, DatabaseError> {
        Ok(sqlx::query_as::<_, Material>(
            "INSERT INTO materials (id, name, description) VALUES ($1, $2, $3) RETURNING *",
        )
        .bind(new_object_id())
        .bind(&material.name)
        .bind(&material.description)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn update(&self, id: &str, patch: MaterialPatch) -> Result<Option<Material>, DatabaseError> {
        let mut qb = update_builder("materials");
        if let Some(name) = patch.name {
            qb.push(", name = ").push_bind(name);
        }
        if let Some(description) = patch.description {
            qb.push(", description = ").push_bind(description);
        }
        qb.push(" WHERE id = ").push_bind(id.to_string()).push(" RETURNING *");

        Ok(qb.build_query_as::<Material>().fetch_optional(&self.pool).await?)
    }

    async fn delete(&self, id: &str) -> Result<bool, DatabaseError> {
        let result = sqlx::query("DELETE FROM materials WHERE id = $1").bind(id).execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }
}

pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct CredentialsRow {
    #[sqlx(flatten)]
    user: User,
    password_hash: String,
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_credentials(&self, username: &str) -> Result<Option<UserCredentials>, DatabaseError> {
        let row = sqlx::query_as::<_, CredentialsRow>(
            "SELECT * FROM users WHERE username = $1 AND active",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|r| UserCredentials { user: r.user, password_hash: r.password_hash }))
    }

    async fn insert(&self, user: NewUser) -> Result<User, DatabaseError> {
        Ok(sqlx::query_as::<_, User>(
            "INSERT INTO users (id, username, password_hash, name, role) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING id, username, name, role, active, created_at, updated_at",
        )
        .bind(new_object_id())
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(&user.name)
        .bind(user.role.as_str())
        .fetch_one(&self.pool)
        .await?)
    }
}
