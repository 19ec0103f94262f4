use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use sqlx::FromRow;
use unicode_normalization::UnicodeNormalization;

use crate::security::sanitize_object;
use crate::validation::{expect_object, optional_bool, optional_string, ValidationErrors};

pub const NAME_MAX: usize = 50;
pub const DESCRIPTION_MAX: usize = 200;

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub slug: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Category plus the number of products that reference it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryWithCount {
    #[serde(flatten)]
    pub category: Category,
    pub product_count: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewCategory {
    pub name: String,
    pub description: Option<String>,
    pub slug: String,
    pub active: bool,
}

/// Partial update. `description: Some(None)` clears the description.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CategoryPatch {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    pub active: Option<bool>,
}

impl CategoryPatch {
    /// Sanitise and validate an update body. Only present fields are checked.
    pub fn from_body(body: Value) -> Result<Self, ValidationErrors> {
        let body = expect_object(sanitize_object(body))?;
        let mut errors = ValidationErrors::new();

        let name = optional_string(&body, "name", "Name", &mut errors);
        if let Some(ref n) = name {
            if n.is_empty() {
                errors.add("name", "Name is required");
            } else if n.chars().count() > NAME_MAX {
                errors.add("name", format!("Name cannot exceed {} characters", NAME_MAX));
            }
        }

        let description = match body.get("description") {
            None => None,
            Some(Value::Null) => Some(None),
            Some(_) => {
                let d = optional_string(&body, "description", "Description", &mut errors);
                if let Some(ref d) = d {
                    if d.chars().count() > DESCRIPTION_MAX {
                        errors.add(
                            "description",
                            format!("Description cannot exceed {} characters", DESCRIPTION_MAX),
                        );
                    }
                }
                Some(d.filter(|d| !d.is_empty()))
            }
        };

        let active = optional_bool(&body, "active", "Active", &mut errors);

        errors.into_result(Self { name, description, active })
    }

    /// Slug to store alongside this patch; present only when the name changes.
    pub fn slug(&self) -> Option<String> {
        self.name.as_deref().map(slugify)
    }
}

impl NewCategory {
    pub fn from_body(body: Value) -> Result<Self, ValidationErrors> {
        let patch = CategoryPatch::from_body(body)?;
        let name = match patch.name {
            Some(name) => name,
            None => return Err(ValidationErrors::single("name", "Name is required")),
        };
        Ok(Self {
            slug: slugify(&name),
            name,
            description: patch.description.flatten(),
            active: patch.active.unwrap_or(true),
        })
    }
}

/// URL slug for a category name: lowercase, diacritics removed, every run of
/// non `[a-z0-9]` characters collapsed into one hyphen, no hyphen at either end.
pub fn slugify(name: &str) -> String {
    let folded: String = name
        .to_lowercase()
        .nfd()
        .filter(|c| !('\u{0300}'..='\u{036f}').contains(c))
        .collect();

    let mut slug = String::with_capacity(folded.len());
    let mut pending_hyphen = false;
    for c in folded.chars() {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c);
        } else {
            pending_hyphen = true;
        }
    }
    slug
}
