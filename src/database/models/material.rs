use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use sqlx::FromRow;

use crate::security::sanitize_object;
use crate::validation::{expect_object, optional_string, ValidationErrors};

pub const NAME_MAX: usize = 50;
pub const DESCRIPTION_MAX: usize = 200;

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Material {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MaterialWithCount {
    #[serde(flatten)]
    pub material: Material,
    pub product_count: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewMaterial {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MaterialPatch {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
}

impl MaterialPatch {
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
                if d.as_ref().is_some_and(|d| d.chars().count() > DESCRIPTION_MAX) {
                    errors.add(
                        "description",
                        format!("Description cannot exceed {} characters", DESCRIPTION_MAX),
                    );
                }
                Some(d.filter(|d| !d.is_empty()))
            }
        };

        errors.into_result(Self { name, description })
    }
}

impl NewMaterial {
    pub fn from_body(body: Value) -> Result<Self, ValidationErrors> {
        let patch = MaterialPatch::from_body(body)?;
        match patch.name {
            Some(name) => Ok(Self { name, description: patch.description.flatten() }),
            None => Err(ValidationErrors::single("name", "Name is required")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn requires_name_on_create() {
        let err = NewMaterial::from_body(json!({ "description": "Metal" })).unwrap_err();
        assert_eq!(err.to_string(), "Name is required");
        let ok = NewMaterial::from_body(json!({ "name": "Plata 925" })).unwrap();
        assert_eq!(ok.name, "Plata 925");
        assert_eq!(ok.description, None);
    }

    #[test]
    fn operator_keys_never_reach_the_patch() {
        let patch = MaterialPatch::from_body(json!({ "$set": { "name": "x" }, "name": "Oro {laminado}" })).unwrap();
        assert_eq!(patch.name.as_deref(), Some("Oro laminado"));
    }
}
