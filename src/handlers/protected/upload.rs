// handlers/protected/upload.rs - POST /api/upload (multipart field "file")

use axum::extract::{multipart::MultipartRejection, Multipart, State};
use serde::Serialize;

use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::upload_service::check_content_type;
use crate::services::UploadService;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct UploadedImage {
    pub url: String,
}

/// The declared content type is checked before the file body is read, so a
/// rejected upload never reaches the image host.
pub async fn post(
    user: AuthUser,
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<UploadedImage> {
    let mut multipart = multipart.map_err(|e| ApiError::bad_request(e.body_text()))?;

    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("file") {
            continue;
        }
        let content_type = check_content_type(field.content_type())?;
        let bytes = field.bytes().await?;
        tracing::debug!(user = %user.username, size = bytes.len(), "Uploading image");

        let url = UploadService::new(&state).upload(content_type, bytes.to_vec()).await?;
        return Ok(ApiResponse::success(UploadedImage { url }).with_message("Image uploaded successfully"));
    }

    Err(ApiError::bad_request("No image provided"))
}
