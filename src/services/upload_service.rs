use crate::cdn::ImageUpload;
use crate::config::UploadConfig;
use crate::error::ApiError;
use crate::state::AppState;

pub const ALLOWED_TYPES: [&str; 4] = ["image/jpeg", "image/jpg", "image/png", "image/webp"];

pub fn check_content_type(content_type: Option<&str>) -> Result<String, ApiError> {
    match content_type.map(|t| t.trim().to_ascii_lowercase()) {
        Some(t) if ALLOWED_TYPES.contains(&t.as_str()) => Ok(t),
        _ => Err(ApiError::bad_request(
            "File type not allowed. Only JPG, PNG and WebP images are accepted",
        )),
    }
}

pub fn check_size(len: usize, limits: &UploadConfig) -> Result<(), ApiError> {
    if len > limits.max_file_bytes {
        return Err(ApiError::bad_request(format!(
            "File is too large. Maximum {}MB",
            limits.max_file_bytes / (1024 * 1024)
        )));
    }
    if len < limits.min_file_bytes {
        return Err(ApiError::bad_request("File is too small. Possibly corrupt"));
    }
    Ok(())
}

pub struct UploadService<'a> {
    state: &'a AppState,
}

impl<'a> UploadService<'a> {
    pub fn new(state: &'a AppState) -> Self {
        Self { state }
    }

    /// Forward an already type-checked image; returns its hosted URL.
    pub async fn upload(&self, content_type: String, bytes: Vec<u8>) -> Result<String, ApiError> {
        let limits = &self.state.config.upload;
        check_size(bytes.len(), limits)?;

        let url = self
            .state
            .images
            .upload(ImageUpload { content_type, bytes, folder: limits.folder.clone() })
            .await?;
        Ok(url)
    }
}
