use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use sqlx::FromRow;

use super::category::Category;
use super::material::Material;
use crate::security::{
    is_valid_object_id, limit_array_length, sanitize_number, sanitize_object, validate_text_input,
};
use crate::validation::{expect_object, optional_bool, optional_string, ValidationErrors};

pub const NAME_MIN: usize = 2;
pub const NAME_MAX: usize = 100;
pub const DESCRIPTION_MAX: usize = 500;
pub const MAX_IMAGES: usize = 5;
/// Image lists are truncated to this length before the [`MAX_IMAGES`] check.
pub const IMAGE_LIST_CAP: usize = 10;

/// How a product points at its material. Older records carry the material as
/// free text; new writes always reference a material document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MaterialRef {
    ById(String),
    ByName(String),
}

impl MaterialRef {
    pub fn id(&self) -> Option<&str> {
        match self {
            MaterialRef::ById(id) => Some(id),
            MaterialRef::ByName(_) => None,
        }
    }
}

/// Storage shape: the material reference is split over two nullable columns.
#[derive(Debug, Clone, FromRow)]
pub struct ProductRow {
    pub id: String,
    pub name: String,
    pub description: String,
    pub price: f64,
    pub material_id: Option<String>,
    pub material_name: Option<String>,
    pub category_id: String,
    pub images: Vec<String>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Product {
    pub id: String,
    pub name: String,
    pub description: String,
    pub price: f64,
    pub material: Option<MaterialRef>,
    pub category_id: String,
    pub images: Vec<String>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        let material = match (row.material_id, row.material_name) {
            (Some(id), _) => Some(MaterialRef::ById(id)),
            (None, Some(name)) => Some(MaterialRef::ByName(name)),
            (None, None) => None,
        };
        Self {
            id: row.id,
            name: row.name,
            description: row.description,
            price: row.price,
            material,
            category_id: row.category_id,
            images: row.images,
            active: row.active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CategoryLink {
    Populated { id: String, name: String, slug: String },
    Id(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MaterialLink {
    Populated { id: String, name: String },
    Raw(String),
}

/// Product as rendered by the API, with category and material populated.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductView {
    pub id: String,
    pub name: String,
    pub description: String,
    pub price: f64,
    pub material: Option<MaterialLink>,
    pub category: CategoryLink,
    pub images: Vec<String>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProductView {
    /// Dangling references fall back to the raw id.
    pub fn populate(
        product: Product,
        categories: &HashMap<String, Category>,
        materials: &HashMap<String, Material>,
    ) -> Self {
        let category = match categories.get(&product.category_id) {
            Some(c) => CategoryLink::Populated {
                id: c.id.clone(),
                name: c.name.clone(),
                slug: c.slug.clone(),
            },
            None => CategoryLink::Id(product.category_id.clone()),
        };

        let material = product.material.map(|m| match m {
            MaterialRef::ById(id) => match materials.get(&id) {
                Some(mat) => MaterialLink::Populated { id: mat.id.clone(), name: mat.name.clone() },
                None => MaterialLink::Raw(id),
            },
            MaterialRef::ByName(name) => MaterialLink::Raw(name),
        });

        Self {
            id: product.id,
            name: product.name,
            description: product.description,
            price: product.price,
            material,
            category,
            images: product.images,
            active: product.active,
            created_at: product.created_at,
            updated_at: product.updated_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewProduct {
    pub name: String,
    pub description: String,
    pub price: f64,
    pub material_id: String,
    pub category_id: String,
    pub images: Vec<String>,
    pub active: bool,
}

/// Partial update; `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub material_id: Option<String>,
    pub category_id: Option<String>,
    pub images: Option<Vec<String>>,
    pub active: Option<bool>,
}

impl ProductPatch {
    /// Sanitise and validate a write body. Only fields present in the body are
    /// checked; required-field checks live in [`NewProduct::from_body`].
    pub fn from_body(raw: Value) -> Result<Self, ValidationErrors> {
        let raw = expect_object(raw)?;
        let price_sent = raw.get("price").is_some_and(|v| !v.is_null());
        let body = expect_object(sanitize_object(Value::Object(raw)))?;
        let mut errors = ValidationErrors::new();

        let name = optional_string(&body, "name", "Name", &mut errors);
        if name.as_deref().is_some_and(|n| !validate_text_input(n, NAME_MIN, NAME_MAX)) {
            errors.add(
                "name",
                format!("Name must be between {} and {} characters", NAME_MIN, NAME_MAX),
            );
        }

        let description = optional_string(&body, "description", "Description", &mut errors);
        if description.as_deref().is_some_and(|d| d.chars().count() > DESCRIPTION_MAX) {
            errors.add(
                "description",
                format!("Description cannot exceed {} characters", DESCRIPTION_MAX),
            );
        }

        // Out-of-range numbers are dropped by sanitisation, so a price that was
        // sent but is gone now was invalid. Numeric strings coerce like numbers.
        let price = match body.get("price") {
            Some(v) if !v.is_null() => match sanitize_number(v) {
                Some(p) => Some(p),
                None => {
                    errors.add("price", "Invalid price");
                    None
                }
            },
            _ => {
                if price_sent {
                    errors.add("price", "Invalid price");
                }
                None
            }
        };

        let category_id = optional_string(&body, "category", "Category", &mut errors);
        if category_id.as_deref().is_some_and(|id| !is_valid_object_id(id)) {
            errors.add("category", "Invalid category id");
        }

        let material_id = optional_string(&body, "material", "Material", &mut errors);
        if material_id.as_deref().is_some_and(|id| !is_valid_object_id(id)) {
            errors.add("material", "Invalid material id");
        }

        let images = match body.get("images") {
            None | Some(Value::Null) => None,
            Some(v @ Value::Array(_)) => {
                let cleaned = clean_image_list(v);
                if cleaned.len() > MAX_IMAGES {
                    errors.add(
                        "images",
                        format!("A product cannot have more than {} images", MAX_IMAGES),
                    );
                }
                Some(cleaned)
            }
            Some(_) => {
                errors.add("images", "Images must be a list of URLs");
                None
            }
        };

        let active = optional_bool(&body, "active", "Active", &mut errors);

        errors.into_result(Self {
            name,
            description,
            price,
            material_id: material_id.map(|id| id.to_lowercase()),
            category_id: category_id.map(|id| id.to_lowercase()),
            images,
            active,
        })
    }
}

impl NewProduct {
    pub fn from_body(raw: Value) -> Result<Self, ValidationErrors> {
        let patch = ProductPatch::from_body(raw)?;
        let mut errors = ValidationErrors::new();

        if patch.name.is_none() {
            errors.add("name", "Name is required");
        }
        if patch.description.as_deref().map_or(true, str::is_empty) {
            errors.add("description", "Description is required");
        }
        if patch.price.is_none() {
            errors.add("price", "Price is required");
        }
        if patch.category_id.is_none() {
            errors.add("category", "Category is required");
        }
        if patch.material_id.is_none() {
            errors.add("material", "Material is required");
        }
        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(Self {
            name: patch.name.unwrap_or_default(),
            description: patch.description.unwrap_or_default(),
            price: patch.price.unwrap_or_default(),
            material_id: patch.material_id.unwrap_or_default(),
            category_id: patch.category_id.unwrap_or_default(),
            images: patch.images.unwrap_or_default(),
            active: patch.active.unwrap_or(true),
        })
    }
}

/// Keep only non-blank `http(s)` strings, capped at [`IMAGE_LIST_CAP`].
pub fn clean_image_list(images: &Value) -> Vec<String> {
    let kept: Vec<Value> = match images {
        Value::Array(items) => items
            .iter()
            .filter(|v| v.as_str().is_some_and(|s| !s.trim().is_empty() && s.starts_with("http")))
            .cloned()
            .collect(),
        _ => Vec::new(),
    };
    limit_array_length(&Value::Array(kept), IMAGE_LIST_CAP)
        .into_iter()
        .filter_map(|v| v.as_str().map(str::to_string))
        .collect()
}

/// URLs present in `before` but missing from `after`.
pub fn removed_images(before: &[String], after: &[String]) -> Vec<String> {
    before.iter().filter(|url| !after.contains(url)).cloned().collect()
}
