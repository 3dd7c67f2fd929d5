use std::path::Path;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as B64;
use tracing::{error, warn};
use uuid::Uuid;

use crate::error::ApiError;

/// 10 MB limit per decoded image
const MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;

/// Decode an inline base64 image (optionally a `data:image/...;base64,` URL),
/// persist it under `upload_dir`, and return the relative URL it will be
/// served from.
pub async fn save_image(upload_dir: &Path, payload: &str) -> Result<String, ApiError> {
    let (ext, data) = match payload.split_once(";base64,") {
        Some((head, rest)) => (head.strip_prefix("data:image/").unwrap_or("png"), rest),
        None => ("png", payload),
    };
    let ext: String = ext.chars().filter(|c| c.is_ascii_alphanumeric()).take(8).collect();
    let ext = if ext.is_empty() { "png".to_string() } else { ext };

    let bytes = B64
        .decode(data.trim())
        .map_err(|_| ApiError::Validation("invalid image encoding".into()))?;
    if bytes.is_empty() {
        return Err(ApiError::Validation("empty image payload".into()));
    }
    if bytes.len() > MAX_IMAGE_BYTES {
        return Err(ApiError::Validation("image too large".into()));
    }

    tokio::fs::create_dir_all(upload_dir).await.map_err(|e| {
        error!("failed to create upload directory: {e}");
        ApiError::Internal
    })?;

    let file_name = format!("{}.{}", Uuid::new_v4(), ext);
    tokio::fs::write(upload_dir.join(&file_name), &bytes)
        .await
        .map_err(|e| {
            error!("failed to write upload {file_name}: {e}");
            ApiError::Internal
        })?;

    Ok(format!("/uploads/{file_name}"))
}

/// Persist a batch of inline images, preserving transmission order.
pub async fn save_images(upload_dir: &Path, payloads: &[String]) -> Result<Vec<String>, ApiError> {
    let mut urls = Vec::with_capacity(payloads.len());
    for payload in payloads {
        urls.push(save_image(upload_dir, payload).await?);
    }
    Ok(urls)
}

/// Best-effort removal of a previously stored upload; failures are logged,
/// never surfaced.
pub async fn remove_image(upload_dir: &Path, url: &str) {
    let Some(name) = url.strip_prefix("/uploads/") else {
        return;
    };
    if name.contains('/') || name.contains("..") {
        return;
    }
    if let Err(e) = tokio::fs::remove_file(upload_dir.join(name)).await {
        warn!("failed to remove upload {url}: {e}");
    }
}
