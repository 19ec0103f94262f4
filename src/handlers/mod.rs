// handlers/mod.rs - two-tier handler layout
//
// public:    no authentication (storefront reads, login, register, health)
// protected: bearer token required (catalog writes, image upload)
//
// Both tiers share paths; the router combines them per HTTP method.

pub mod protected;
pub mod public;

use axum::extract::rejection::JsonRejection;
use axum::Json;
use serde_json::Value;

use crate::error::ApiError;

/// Unwrap a JSON body, turning extractor rejections into the error envelope.
pub(crate) fn json_body(body: Result<Json<Value>, JsonRejection>) -> Result<Value, ApiError> {
    body.map(|Json(value)| value).map_err(ApiError::from)
}
