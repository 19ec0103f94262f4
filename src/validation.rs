use std::collections::HashMap;

use serde_json::{Map, Value};

/// Field-level validation failures collected while reading a request body.
/// Renders as the joined messages, e.g. `"Name is required, Invalid price"`.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ValidationErrors {
    errors: Vec<(String, String)>,
}

impl std::fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.joined())
    }
}

impl std::error::Error for ValidationErrors {}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push((field.into(), message.into()));
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn joined(&self) -> String {
        self.errors.iter().map(|(_, m)| m.as_str()).collect::<Vec<_>>().join(", ")
    }

    /// First message per field.
    pub fn field_errors(&self) -> HashMap<String, String> {
        let mut out = HashMap::new();
        for (field, message) in &self.errors {
            out.entry(field.clone()).or_insert_with(|| message.clone());
        }
        out
    }

    /// `Ok(value)` when nothing was recorded, otherwise `Err(self)`.
    pub fn into_result<T>(self, value: T) -> Result<T, Self> {
        if self.is_empty() {
            Ok(value)
        } else {
            Err(self)
        }
    }
}

/// Read an optional string field. `Ok(None)` when absent or null.
pub fn optional_string(
    body: &Map<String, Value>,
    field: &str,
    label: &str,
    errors: &mut ValidationErrors,
) -> Option<String> {
    match body.get(field) {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s.trim().to_string()),
        Some(_) => {
            errors.add(field, format!("{} must be a string", label));
            None
        }
    }
}

/// Read an optional boolean field.
pub fn optional_bool(
    body: &Map<String, Value>,
    field: &str,
    label: &str,
    errors: &mut ValidationErrors,
) -> Option<bool> {
    match body.get(field) {
        None | Some(Value::Null) => None,
        Some(Value::Bool(b)) => Some(*b),
        Some(_) => {
            errors.add(field, format!("{} must be a boolean", label));
            None
        }
    }
}

/// Require the request body to be a JSON object.
pub fn expect_object(body: Value) -> Result<Map<String, Value>, ValidationErrors> {
    match body {
        Value::Object(map) => Ok(map),
        _ => Err(ValidationErrors::single("body", "Request body must be a JSON object")),
    }
}
