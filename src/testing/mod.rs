//! In-memory stores and request helpers for router and service tests.
//!
//! `MemoryDb` implements every store trait over plain vectors and evaluates
//! the same filter documents the Postgres stores translate to SQL, including
//! foreign key and unique constraint behaviour.

use std::cmp::Ordering;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering as AtomicOrdering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use chrono::{DateTime, Duration, Utc};
use serde_json::{json, Map, Value};
use tower::ServiceExt;

use crate::app::app;
use crate::auth::TokenService;
use crate::cdn::{CdnError, ImageHost, ImageUpload};
use crate::config::AppConfig;
use crate::database::models::{
    Category, CategoryPatch, Material, MaterialPatch, MaterialRef, NewCategory, NewMaterial,
    NewProduct, NewUser, Product, ProductPatch, Role, User, UserCredentials,
};
use crate::database::object_id::new_object_id;
use crate::database::{
    CategoryStore, DatabaseError, MaterialStore, ProductQuery, ProductStore, UserStore,
};
use crate::filter::{FilterOrderInfo, SortDirection};
use crate::state::AppState;

#[derive(Default)]
pub struct MemoryDb {
    pub products: Mutex<Vec<Product>>,
    pub categories: Mutex<Vec<Category>>,
    pub materials: Mutex<Vec<Material>>,
    pub users: Mutex<Vec<UserCredentials>>,
    /// Incremented by every store call.
    pub calls: AtomicUsize,
}

impl MemoryDb {
    pub fn calls(&self) -> usize {
        self.calls.load(AtomicOrdering::SeqCst)
    }

    fn touch(&self) {
        self.calls.fetch_add(1, AtomicOrdering::SeqCst);
    }

    pub fn seed_category(&self, name: &str) -> Category {
        let now = Utc::now();
        let category = Category {
            id: new_object_id(),
            name: name.to_string(),
            description: None,
            slug: crate::database::models::category::slugify(name),
            active: true,
            created_at: now,
            updated_at: now,
        };
        lock(&self.categories).push(category.clone());
        category
    }

    pub fn seed_material(&self, name: &str) -> Material {
        let now = Utc::now();
        let material = Material {
            id: new_object_id(),
            name: name.to_string(),
            description: None,
            created_at: now,
            updated_at: now,
        };
        lock(&self.materials).push(material.clone());
        material
    }

    /// Product created `age_minutes` ago.
    pub fn seed_product(&self, name: &str, price: f64, category: &Category, age_minutes: i64) -> Product {
        let created_at = Utc::now() - Duration::minutes(age_minutes);
        let product = Product {
            id: new_object_id(),
            name: name.to_string(),
            description: format!("{} artesanal", name),
            price,
            material: None,
            category_id: category.id.clone(),
            images: vec![],
            active: true,
            created_at,
            updated_at: created_at,
        };
        self.put_product(product.clone());
        product
    }

    pub fn put_product(&self, product: Product) {
        let mut products = lock(&self.products);
        products.retain(|p| p.id != product.id);
        products.push(product);
    }

    pub fn product(&self, id: &str) -> Option<Product> {
        lock(&self.products).iter().find(|p| p.id == id).cloned()
    }

    pub fn seed_user(&self, username: &str, password: &str, active: bool) -> User {
        let now = Utc::now();
        let user = User {
            id: new_object_id(),
            username: username.to_string(),
            name: username.to_string(),
            role: Role::Admin,
            active,
            created_at: now,
            updated_at: now,
        };
        let password_hash = crate::auth::hash_password(password).expect("hash");
        lock(&self.users).push(UserCredentials { user: user.clone(), password_hash });
        user
    }

    fn check_references(&self, category_id: Option<&str>, material_id: Option<&str>) -> Result<(), DatabaseError> {
        if let Some(id) = category_id {
            if !lock(&self.categories).iter().any(|c| c.id == id) {
                return Err(DatabaseError::ForeignKey("products_category_id_fkey".into()));
            }
        }
        if let Some(id) = material_id {
            if !lock(&self.materials).iter().any(|m| m.id == id) {
                return Err(DatabaseError::ForeignKey("products_material_id_fkey".into()));
            }
        }
        Ok(())
    }
}

fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|e| e.into_inner())
}

fn conflict(field: &str) -> DatabaseError {
    DatabaseError::Conflict { field: field.to_string() }
}

/// Flat document the filter evaluator runs against; keys are column names.
fn product_doc(p: &Product) -> Map<String, Value> {
    let (material_id, material_name) = match p.material {
        Some(MaterialRef::ById(ref id)) => (json!(id), Value::Null),
        Some(MaterialRef::ByName(ref name)) => (Value::Null, json!(name)),
        None => (Value::Null, Value::Null),
    };
    let mut doc = Map::new();
    doc.insert("id".into(), json!(p.id));
    doc.insert("name".into(), json!(p.name));
    doc.insert("description".into(), json!(p.description));
    doc.insert("price".into(), json!(p.price));
    doc.insert("material_id".into(), material_id);
    doc.insert("material_name".into(), material_name);
    doc.insert("category_id".into(), json!(p.category_id));
    doc.insert("active".into(), json!(p.active));
    doc.insert("created_at".into(), json!(p.created_at.timestamp_micros()));
    doc
}

fn compare(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        (Value::Null, Value::Null) => Some(Ordering::Equal),
        _ => None,
    }
}

fn equal(a: &Value, b: &Value) -> bool {
    compare(a, b) == Some(Ordering::Equal)
}

fn field_matches(actual: &Value, condition: &Value) -> bool {
    let ops = match condition {
        Value::Object(ops) if ops.keys().all(|k| k.starts_with('$')) => ops,
        other => return equal(actual, other),
    };
    ops.iter().all(|(op, arg)| match op.as_str() {
        "$gte" => matches!(compare(actual, arg), Some(Ordering::Greater | Ordering::Equal)),
        "$lte" => matches!(compare(actual, arg), Some(Ordering::Less | Ordering::Equal)),
        "$in" => arg.as_array().is_some_and(|xs| xs.iter().any(|x| equal(actual, x))),
        other => panic!("operator {other} not supported by MemoryDb"),
    })
}

/// Evaluate a filter document the way the SQL translation would.
pub fn matches(doc: &Map<String, Value>, filter: &Value) -> bool {
    let Some(filter) = filter.as_object() else {
        return true;
    };
    filter.iter().all(|(key, value)| match key.as_str() {
        "$or" => value.as_array().is_some_and(|xs| xs.iter().any(|f| matches(doc, f))),
        "$text" => {
            let search = value["$search"].as_str().unwrap_or_default().to_lowercase();
            let haystack = format!(
                "{} {}",
                doc["name"].as_str().unwrap_or_default(),
                doc["description"].as_str().unwrap_or_default()
            )
            .to_lowercase();
            search.split_whitespace().all(|term| haystack.contains(term))
        }
        column => field_matches(doc.get(column).unwrap_or(&Value::Null), value),
    })
}

fn order_by(order: &[FilterOrderInfo], a: &Map<String, Value>, b: &Map<String, Value>) -> Ordering {
    for info in order {
        let left = a.get(&info.column).unwrap_or(&Value::Null);
        let right = b.get(&info.column).unwrap_or(&Value::Null);
        let ord = compare(left, right).unwrap_or(Ordering::Equal);
        let ord = match info.sort {
            SortDirection::Asc => ord,
            SortDirection::Desc => ord.reverse(),
        };
        if ord != Ordering::Equal {
            return ord;
        }
    }
    Ordering::Equal
}

#[async_trait]
impl ProductStore for MemoryDb {
    async fn find(&self, query: &ProductQuery) -> Result<Vec<Product>, DatabaseError> {
        self.touch();
        let mut rows: Vec<(Map<String, Value>, Product)> = lock(&self.products)
            .iter()
            .map(|p| (product_doc(p), p.clone()))
            .filter(|(doc, _)| matches(doc, &query.filter))
            .collect();
        rows.sort_by(|(a, _), (b, _)| order_by(&query.order, a, b));
        Ok(rows
            .into_iter()
            .skip(query.offset as usize)
            .take(query.limit as usize)
            .map(|(_, p)| p)
            .collect())
    }

    async fn count(&self, filter: &Value) -> Result<i64, DatabaseError> {
        self.touch();
        let n = lock(&self.products).iter().filter(|p| matches(&product_doc(p), filter)).count();
        Ok(n as i64)
    }

    async fn get(&self, id: &str) -> Result<Option<Product>, DatabaseError> {
        self.touch();
        Ok(self.product(id))
    }

    async fn insert(&self, product: NewProduct) -> Result<Product, DatabaseError> {
        self.touch();
        self.check_references(Some(&product.category_id), Some(&product.material_id))?;
        let now = Utc::now();
        let product = Product {
            id: new_object_id(),
            name: product.name,
            description: product.description,
            price: product.price,
            material: Some(MaterialRef::ById(product.material_id)),
            category_id: product.category_id,
            images: product.images,
            active: product.active,
            created_at: now,
            updated_at: now,
        };
        self.put_product(product.clone());
        Ok(product)
    }

    async fn update(&self, id: &str, patch: ProductPatch) -> Result<Option<Product>, DatabaseError> {
        self.touch();
        self.check_references(patch.category_id.as_deref(), patch.material_id.as_deref())?;
        let mut products = lock(&self.products);
        let Some(product) = products.iter_mut().find(|p| p.id == id) else {
            return Ok(None);
        };
        if let Some(v) = patch.name {
            product.name = v;
        }
        if let Some(v) = patch.description {
            product.description = v;
        }
        if let Some(v) = patch.price {
            product.price = v;
        }
        if let Some(v) = patch.material_id {
            product.material = Some(MaterialRef::ById(v));
        }
        if let Some(v) = patch.category_id {
            product.category_id = v;
        }
        if let Some(v) = patch.images {
            product.images = v;
        }
        if let Some(v) = patch.active {
            product.active = v;
        }
        product.updated_at = Utc::now();
        Ok(Some(product.clone()))
    }

    async fn delete(&self, id: &str) -> Result<bool, DatabaseError> {
        self.touch();
        let mut products = lock(&self.products);
        let before = products.len();
        products.retain(|p| p.id != id);
        Ok(products.len() != before)
    }
}

#[async_trait]
impl CategoryStore for MemoryDb {
    async fn list(&self, include_inactive: bool) -> Result<Vec<Category>, DatabaseError> {
        self.touch();
        let mut categories: Vec<Category> = lock(&self.categories)
            .iter()
            .filter(|c| include_inactive || c.active)
            .cloned()
            .collect();
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(categories)
    }

    async fn get(&self, id: &str) -> Result<Option<Category>, DatabaseError> {
        self.touch();
        Ok(lock(&self.categories).iter().find(|c| c.id == id).cloned())
    }

    async fn get_many(&self, ids: &[String]) -> Result<Vec<Category>, DatabaseError> {
        self.touch();
        Ok(lock(&self.categories).iter().filter(|c| ids.contains(&c.id)).cloned().collect())
    }

    async fn insert(&self, category: NewCategory) -> Result<Category, DatabaseError> {
        self.touch();
        let mut categories = lock(&self.categories);
        if categories.iter().any(|c| c.name == category.name) {
            return Err(conflict("name"));
        }
        if categories.iter().any(|c| c.slug == category.slug) {
            return Err(conflict("slug"));
        }
        let now = Utc::now();
        let category = Category {
            id: new_object_id(),
            name: category.name,
            description: category.description,
            slug: category.slug,
            active: category.active,
            created_at: now,
            updated_at: now,
        };
        categories.push(category.clone());
        Ok(category)
    }

    async fn update(&self, id: &str, patch: CategoryPatch) -> Result<Option<Category>, DatabaseError> {
        self.touch();
        let slug = patch.slug();
        let mut categories = lock(&self.categories);
        if let Some(ref name) = patch.name {
            if categories.iter().any(|c| c.id != id && &c.name == name) {
                return Err(conflict("name"));
            }
        }
        let Some(category) = categories.iter_mut().find(|c| c.id == id) else {
            return Ok(None);
        };
        if let Some(v) = patch.name {
            category.name = v;
        }
        if let Some(v) = slug {
            category.slug = v;
        }
        if let Some(v) = patch.description {
            category.description = v;
        }
        if let Some(v) = patch.active {
            category.active = v;
        }
        category.updated_at = Utc::now();
        Ok(Some(category.clone()))
    }

    async fn delete(&self, id: &str) -> Result<bool, DatabaseError> {
        self.touch();
        if lock(&self.products).iter().any(|p| p.category_id == id) {
            return Err(DatabaseError::ForeignKey("products_category_id_fkey".into()));
        }
        let mut categories = lock(&self.categories);
        let before = categories.len();
        categories.retain(|c| c.id != id);
        Ok(categories.len() != before)
    }
}

#[async_trait]
impl MaterialStore for MemoryDb {
    async fn list(&self) -> Result<Vec<Material>, DatabaseError> {
        self.touch();
        let mut materials = lock(&self.materials).clone();
        materials.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(materials)
    }

    async fn get(&self, id: &str) -> Result<Option<Material>, DatabaseError> {
        self.touch();
        Ok(lock(&self.materials).iter().find(|m| m.id == id).cloned())
    }

    async fn get_many(&self, ids: &[String]) -> Result<Vec<Material>, DatabaseError> {
        self.touch();
        Ok(lock(&self.materials).iter().filter(|m| ids.contains(&m.id)).cloned().collect())
    }

    async fn insert(&self, material: NewMaterial) -> Result<Material, DatabaseError> {
        self.touch();
        let mut materials = lock(&self.materials);
        if materials.iter().any(|m| m.name == material.name) {
            return Err(conflict("name"));
        }
        let now = Utc::now();
        let material = Material {
            id: new_object_id(),
            name: material.name,
            description: material.description,
            created_at: now,
            updated_at: now,
        };
        materials.push(material.clone());
        Ok(material)
    }

    async fn update(&self, id: &str, patch: MaterialPatch) -> Result<Option<Material>, DatabaseError> {
        self.touch();
        let mut materials = lock(&self.materials);
        if let Some(ref name) = patch.name {
            if materials.iter().any(|m| m.id != id && &m.name == name) {
                return Err(conflict("name"));
            }
        }
        let Some(material) = materials.iter_mut().find(|m| m.id == id) else {
            return Ok(None);
        };
        if let Some(v) = patch.name {
            material.name = v;
        }
        if let Some(v) = patch.description {
            material.description = v;
        }
        material.updated_at = Utc::now();
        Ok(Some(material.clone()))
    }

    async fn delete(&self, id: &str) -> Result<bool, DatabaseError> {
        self.touch();
        let mut materials = lock(&self.materials);
        let before = materials.len();
        materials.retain(|m| m.id != id);
        let deleted = materials.len() != before;
        if deleted {
            for product in lock(&self.products).iter_mut() {
                if product.material.as_ref().and_then(MaterialRef::id) == Some(id) {
                    product.material = None;
                }
            }
        }
        Ok(deleted)
    }
}

#[async_trait]
impl UserStore for MemoryDb {
    async fn find_credentials(&self, username: &str) -> Result<Option<UserCredentials>, DatabaseError> {
        self.touch();
        Ok(lock(&self.users)
            .iter()
            .find(|c| c.user.username == username && c.user.active)
            .cloned())
    }

    async fn insert(&self, user: NewUser) -> Result<User, DatabaseError> {
        self.touch();
        let mut users = lock(&self.users);
        if users.iter().any(|c| c.user.username == user.username) {
            return Err(conflict("username"));
        }
        let now = Utc::now();
        let created = User {
            id: new_object_id(),
            username: user.username,
            name: user.name,
            role: user.role,
            active: true,
            created_at: now,
            updated_at: now,
        };
        users.push(UserCredentials { user: created.clone(), password_hash: user.password_hash });
        Ok(created)
    }
}

/// Image host that records traffic instead of talking to a CDN.
#[derive(Default)]
pub struct RecordingImageHost {
    pub uploads: Mutex<Vec<ImageUpload>>,
    pub deletes: Mutex<Vec<String>>,
    pub fail: AtomicBool,
}

impl RecordingImageHost {
    pub fn uploads(&self) -> usize {
        lock(&self.uploads).len()
    }

    pub fn deleted(&self) -> Vec<String> {
        lock(&self.deletes).clone()
    }

    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, AtomicOrdering::SeqCst);
    }

    fn failing(&self) -> bool {
        self.fail.load(AtomicOrdering::SeqCst)
    }
}

#[async_trait]
impl ImageHost for RecordingImageHost {
    async fn upload(&self, image: ImageUpload) -> Result<String, CdnError> {
        if self.failing() {
            return Err(CdnError::Rejected { status: 500, message: "upload failed".into() });
        }
        let mut uploads = lock(&self.uploads);
        let url = format!(
            "https://res.cloudinary.com/test/image/upload/v1/{}/img{}.jpg",
            image.folder,
            uploads.len()
        );
        uploads.push(image);
        Ok(url)
    }

    async fn delete(&self, url: &str) -> Result<(), CdnError> {
        lock(&self.deletes).push(url.to_string());
        if self.failing() {
            return Err(CdnError::Rejected { status: 500, message: "destroy failed".into() });
        }
        Ok(())
    }
}

pub struct TestApp {
    pub state: AppState,
    pub db: Arc<MemoryDb>,
    pub images: Arc<RecordingImageHost>,
}

impl TestApp {
    pub fn new() -> Self {
        let config = AppConfig::development();
        let db = Arc::new(MemoryDb::default());
        let images = Arc::new(RecordingImageHost::default());
        let state = AppState {
            products: db.clone(),
            categories: db.clone(),
            materials: db.clone(),
            users: db.clone(),
            images: images.clone(),
            tokens: Arc::new(TokenService::new(&config.security)),
            config: Arc::new(config),
            pool: None,
        };
        Self { state, db, images }
    }

    pub fn router(&self) -> Router {
        app(self.state.clone())
    }

    /// Bearer token for a freshly seeded admin.
    pub fn admin_token(&self) -> String {
        let now = Utc::now();
        let user = User {
            id: new_object_id(),
            username: "admin".into(),
            name: "Admin".into(),
            role: Role::Admin,
            active: true,
            created_at: now,
            updated_at: now,
        };
        self.state.tokens.generate_token(&user).expect("token")
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router().oneshot(request).await.expect("response");
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.expect("body");
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("json body")
        };
        (status, body)
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.send(Request::get(uri).body(Body::empty()).expect("request")).await
    }

    pub async fn json(&self, method: Method, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        self.send(builder.body(Body::from(body.to_string())).expect("request")).await
    }
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}

const BOUNDARY: &str = "lui-test-boundary";

/// Multipart request with a single file part.
pub fn multipart_request(token: Option<&str>, field: &str, content_type: &str, bytes: &[u8]) -> Request<Body> {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"pieza.jpg\"\r\nContent-Type: {content_type}\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

    let mut builder = Request::builder()
        .method(Method::POST)
        .uri("/api/upload")
        .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={BOUNDARY}"));
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::from(body)).expect("request")
}

pub fn timestamp(value: &Value) -> DateTime<Utc> {
    value.as_str().and_then(|s| s.parse().ok()).expect("timestamp")
}
