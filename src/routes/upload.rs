use actix_multipart::Multipart;
use actix_web::{web, HttpResponse};
use futures_util::StreamExt;
use serde_json::json;

use crate::cloudinary::{self, CloudinaryClient};
use crate::error::ApiError;
use crate::middleware::AuthenticatedUser;

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.route("/upload", web::post().to(upload_image));
}

async fn upload_image(
    user: AuthenticatedUser,
    client: web::Data<CloudinaryClient>,
    mut payload: Multipart,
) -> Result<HttpResponse, ApiError> {
    while let Some(item) = payload.next().await {
        let mut field = item
            .map_err(|e| ApiError::Validation(format!("Malformed multipart payload: {}", e)))?;

        let field_name = field
            .content_disposition()
            .get_name()
            .unwrap_or_default()
            .to_string();
        if field_name != "image" {
            // Unrelated fields must still be drained before the next one.
            while let Some(chunk) = field.next().await {
                chunk.map_err(|e| {
                    ApiError::Validation(format!("Malformed multipart payload: {}", e))
                })?;
            }
            continue;
        }

        let content_type = field
            .content_type()
            .map(|m| m.to_string())
            .unwrap_or_default();
        if !cloudinary::is_allowed_content_type(&content_type) {
            return Err(ApiError::Validation(format!(
                "Unsupported file type: '{}'",
                content_type
            )));
        }

        let filename = field
            .content_disposition()
            .get_filename()
            .unwrap_or("image")
            .to_string();

        let mut bytes: Vec<u8> = Vec::new();
        while let Some(chunk) = field.next().await {
            let chunk = chunk
                .map_err(|e| ApiError::Validation(format!("Failed to read upload: {}", e)))?;
            bytes.extend_from_slice(&chunk);
        }

        if bytes.is_empty() {
            return Err(ApiError::Validation("No file uploaded".to_string()));
        }

        let url = client.upload_image(bytes, &filename).await?;
        log::info!("Image '{}' uploaded by {}", filename, user.username);
        return Ok(HttpResponse::Ok().json(json!({ "url": url })));
    }

    Err(ApiError::Validation("No file uploaded".to_string()))
}
