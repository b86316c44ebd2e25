use reqwest::multipart;
use serde::Deserialize;
use std::time::Duration;

use crate::config::Config;
use crate::error::ApiError;

/// All uploads land in this folder on the image host.
const UPLOAD_FOLDER: &str = "gatitu-blog";

/// Content types accepted for upload (jpg/jpeg share one MIME type).
const ALLOWED_CONTENT_TYPES: [&str; 3] = ["image/jpeg", "image/png", "image/webp"];

#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: String,
}

pub fn is_allowed_content_type(content_type: &str) -> bool {
    ALLOWED_CONTENT_TYPES.contains(&content_type)
}

/// Thin relay to the Cloudinary unsigned-upload endpoint. The file passes
/// straight through; no resizing or scanning happens here.
#[derive(Clone)]
pub struct CloudinaryClient {
    http: reqwest::Client,
    upload_url: String,
    upload_preset: String,
}

impl CloudinaryClient {
    pub fn new(config: &Config) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .expect("Failed to create HTTP client");

        let upload_url = format!(
            "{}/v1_1/{}/image/upload",
            config.cloudinary_api_base.trim_end_matches('/'),
            config.cloudinary_cloud_name
        );

        CloudinaryClient {
            http,
            upload_url,
            upload_preset: config.cloudinary_upload_preset.clone(),
        }
    }

    /// Forwards the image bytes and returns the host's public URL.
    pub async fn upload_image(&self, bytes: Vec<u8>, filename: &str) -> Result<String, ApiError> {
        let part = multipart::Part::bytes(bytes).file_name(filename.to_string());
        let form = multipart::Form::new()
            .part("file", part)
            .text("upload_preset", self.upload_preset.clone())
            .text("folder", UPLOAD_FOLDER);

        let response = self
            .http
            .post(&self.upload_url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| ApiError::Upstream(format!("image host unreachable: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown".to_string());
            return Err(ApiError::Upstream(format!(
                "image host returned {}: {}",
                status, body
            )));
        }

        let parsed: UploadResponse = response
            .json()
            .await
            .map_err(|e| ApiError::Upstream(format!("unparseable image host response: {}", e)))?;

        Ok(parsed.secure_url)
    }
}
