use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::Utc;
use serde::Deserialize;
use sha2::{Digest, Sha256};

use super::{public_id_from_url, CdnError, ImageHost, ImageUpload};
use crate::config::CdnConfig;

/// Resize to fit 1000x1000, automatic quality and format.
pub const UPLOAD_TRANSFORMATION: &str = "c_limit,h_1000,w_1000/q_auto:good/f_auto";

/// Cloudinary upload API client using signed form requests.
#[derive(Clone)]
pub struct CloudinaryClient {
    client: reqwest::Client,
    api_base: String,
    cloud_name: String,
    api_key: String,
    api_secret: String,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: String,
}

#[derive(Debug, Deserialize)]
struct DestroyResponse {
    result: String,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

impl CloudinaryClient {
    pub fn new(config: &CdnConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_base: config.api_base.trim_end_matches('/').to_string(),
            cloud_name: config.cloud_name.clone(),
            api_key: config.api_key.clone(),
            api_secret: config.api_secret.clone(),
        }
    }

    fn ensure_configured(&self) -> Result<(), CdnError> {
        if self.cloud_name.is_empty() {
            return Err(CdnError::NotConfigured("CLOUDINARY_CLOUD_NAME"));
        }
        if self.api_key.is_empty() {
            return Err(CdnError::NotConfigured("CLOUDINARY_API_KEY"));
        }
        if self.api_secret.is_empty() {
            return Err(CdnError::NotConfigured("CLOUDINARY_API_SECRET"));
        }
        Ok(())
    }

    fn endpoint(&self, action: &str) -> String {
        format!("{}/{}/image/{}", self.api_base, self.cloud_name, action)
    }

    /// Append `api_key`, `signature` and `signature_algorithm` to signed params.
    fn signed(&self, mut params: Vec<(&'static str, String)>) -> Vec<(&'static str, String)> {
        let signature = sign(&params, &self.api_secret);
        params.push(("api_key", self.api_key.clone()));
        params.push(("signature", signature));
        params.push(("signature_algorithm", "sha256".to_string()));
        params
    }

    async fn post<T: for<'de> Deserialize<'de>>(
        &self,
        action: &str,
        form: &[(&'static str, String)],
    ) -> Result<T, CdnError> {
        let response = self.client.post(self.endpoint(action)).form(form).send().await?;
        let status = response.status();
        if !status.is_success() {
            let message = match response.json::<ErrorResponse>().await {
                Ok(body) => body.error.message,
                Err(_) => status.canonical_reason().unwrap_or("unknown error").to_string(),
            };
            return Err(CdnError::Rejected { status: status.as_u16(), message });
        }
        Ok(response.json::<T>().await?)
    }
}

/// Hex SHA-256 over `k=v` pairs sorted by key, joined by `&`, then the secret.
fn sign(params: &[(&str, String)], secret: &str) -> String {
    let mut sorted: Vec<&(&str, String)> = params.iter().collect();
    sorted.sort_by(|a, b| a.0.cmp(&b.0));
    let to_sign = sorted
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&");
    format!("{:x}", Sha256::digest(format!("{}{}", to_sign, secret).as_bytes()))
}

#[async_trait]
impl ImageHost for CloudinaryClient {
    async fn upload(&self, image: ImageUpload) -> Result<String, CdnError> {
        self.ensure_configured()?;
        let data_uri = format!("data:{};base64,{}", image.content_type, STANDARD.encode(&image.bytes));

        let mut form = self.signed(vec![
            ("folder", image.folder),
            ("timestamp", Utc::now().timestamp().to_string()),
            ("transformation", UPLOAD_TRANSFORMATION.to_string()),
        ]);
        form.push(("file", data_uri));

        let uploaded: UploadResponse = self.post("upload", &form).await?;
        tracing::info!(url = %uploaded.secure_url, "Image uploaded");
        Ok(uploaded.secure_url)
    }

    async fn delete(&self, url: &str) -> Result<(), CdnError> {
        self.ensure_configured()?;
        let public_id = public_id_from_url(url).ok_or_else(|| CdnError::InvalidUrl(url.to_string()))?;

        let form = self.signed(vec![
            ("public_id", public_id.clone()),
            ("timestamp", Utc::now().timestamp().to_string()),
        ]);
        let destroyed: DestroyResponse = self.post("destroy", &form).await?;
        if destroyed.result != "ok" {
            return Err(CdnError::Rejected { status: 200, message: destroyed.result });
        }
        tracing::info!(public_id = %public_id, "Image deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signature_is_order_independent() {
        let a = sign(&[("timestamp", "1".into()), ("folder", "productos".into())], "secret");
        let b = sign(&[("folder", "productos".into()), ("timestamp", "1".into())], "secret");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert_eq!(
            a,
            format!("{:x}", Sha256::digest(b"folder=productos&timestamp=1secret"))
        );
    }

    #[tokio::test]
    async fn unconfigured_client_refuses_work() {
        let client = CloudinaryClient::new(&CdnConfig {
            api_base: "https://api.cloudinary.com/v1_1".into(),
            cloud_name: String::new(),
            api_key: String::new(),
            api_secret: String::new(),
        });
        let err = client.delete("https://res.cloudinary.com/x/image/upload/productos/a.jpg").await.unwrap_err();
        assert!(matches!(err, CdnError::NotConfigured("CLOUDINARY_CLOUD_NAME")));
    }
}
