//! Upload API endpoints (admin)
//!
//! - POST /api/admin/upload - One file in field `file` (or `image`)
//! - POST /api/admin/upload-multiple - Files in `files`, `images` or `file`
//!
//! Files land in `<upload.path>/<uuid>.<ext>` and are served from `/uploads`.

use axum::extract::{Multipart, State};
use serde::Serialize;
use std::path::Path;
use tokio::fs;
use uuid::Uuid;

use crate::api::extract::Json;
use crate::api::middleware::{ApiError, AppState};
use crate::config::UploadConfig;

const SINGLE_FIELDS: &[&str] = &["file", "image"];
const MULTIPLE_FIELDS: &[&str] = &["files", "images", "file"];

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedFile {
    pub url: String,
    pub filename: String,
    pub original_name: String,
    pub size: u64,
}

/// Response for a single upload
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub success: bool,
    #[serde(flatten)]
    pub file: UploadedFile,
}

/// Response for multiple uploads; rejected files are reported, not fatal
#[derive(Debug, Serialize)]
pub struct MultiUploadResponse {
    pub success: bool,
    pub files: Vec<UploadedFile>,
    pub failed: Vec<String>,
}

/// Why a file was refused
#[derive(Debug, PartialEq)]
enum Rejection {
    InvalidType(String),
    TooLarge(u64),
}

impl Rejection {
    fn message(&self) -> String {
        match self {
            Rejection::InvalidType(content_type) => format!("Invalid file type: {}", content_type),
            Rejection::TooLarge(limit) => {
                format!("File too large. Maximum size: {} MB", limit / 1024 / 1024)
            }
        }
    }
}

/// Check type and size against the configured limits
fn check_file(config: &UploadConfig, content_type: &str, size: u64) -> Result<(), Rejection> {
    if !config.is_type_allowed(content_type) {
        return Err(Rejection::InvalidType(content_type.to_string()));
    }
    let limit = config.max_size_for(content_type);
    if size > limit {
        return Err(Rejection::TooLarge(limit));
    }
    Ok(())
}

/// Write the bytes under a fresh name
async fn store(
    config: &UploadConfig,
    original_name: String,
    content_type: &str,
    data: &[u8],
) -> Result<UploadedFile, ApiError> {
    ensure_upload_dir(&config.path).await?;

    let filename = format!("{}.{}", Uuid::new_v4(), config.get_extension(content_type));
    fs::write(config.path.join(&filename), data)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to save {}: {}", filename, e)))?;
    tracing::info!(file = %filename, size = data.len(), "upload stored");

    Ok(UploadedFile {
        url: format!("/uploads/{}", filename),
        filename,
        original_name,
        size: data.len() as u64,
    })
}

async fn ensure_upload_dir(path: &Path) -> Result<(), ApiError> {
    if !path.exists() {
        fs::create_dir_all(path)
            .await
            .map_err(|e| {
                ApiError::internal(format!("Failed to create {}: {}", path.display(), e))
            })?;
    }
    Ok(())
}

fn multipart_error(e: impl std::fmt::Display) -> ApiError {
    ApiError::validation_error(format!("Failed to read multipart: {}", e))
}

/// POST /api/admin/upload
pub async fn upload_single(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let config = &state.upload_config;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if !SINGLE_FIELDS.contains(&field.name().unwrap_or("")) {
            continue;
        }

        let original_name = field.file_name().unwrap_or("unknown").to_string();
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let data = field.bytes().await.map_err(multipart_error)?;

        check_file(config, &content_type, data.len() as u64)
            .map_err(|r| ApiError::validation_error(r.message()))?;
        let file = store(config, original_name, &content_type, &data).await?;

        return Ok(Json(UploadResponse {
            success: true,
            file,
        }));
    }

    Err(ApiError::validation_error("No file uploaded"))
}

/// POST /api/admin/upload-multiple
pub async fn upload_multiple(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<MultiUploadResponse>, ApiError> {
    let config = &state.upload_config;
    let mut files = Vec::new();
    let mut failed = Vec::new();

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if !MULTIPLE_FIELDS.contains(&field.name().unwrap_or("")) {
            continue;
        }

        let original_name = field.file_name().unwrap_or("unknown").to_string();
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let data = match field.bytes().await {
            Ok(data) => data,
            Err(e) => {
                failed.push(format!("{}: {}", original_name, e));
                continue;
            }
        };

        if let Err(rejection) = check_file(config, &content_type, data.len() as u64) {
            failed.push(format!("{}: {}", original_name, rejection.message()));
            continue;
        }
        match store(config, original_name.clone(), &content_type, &data).await {
            Ok(file) => files.push(file),
            Err(e) => failed.push(format!("{}: {}", original_name, e.error.message)),
        }
    }

    if files.is_empty() && failed.is_empty() {
        return Err(ApiError::validation_error("No files uploaded"));
    }

    Ok(Json(MultiUploadResponse {
        success: !files.is_empty(),
        files,
        failed,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_file_type_and_size() {
        let config = UploadConfig::default();
        assert!(check_file(&config, "image/png", 1024).is_ok());
        assert!(check_file(&config, "video/mp4", 50 * 1024 * 1024).is_ok());
        assert_eq!(
            check_file(&config, "image/png", 6 * 1024 * 1024),
            Err(Rejection::TooLarge(config.max_file_size))
        );
        assert_eq!(
            check_file(&config, "application/pdf", 10),
            Err(Rejection::InvalidType("application/pdf".to_string()))
        );
    }

    #[tokio::test]
    async fn test_store_writes_uuid_named_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = UploadConfig {
            path: dir.path().join("media"),
            ..UploadConfig::default()
        };

        let file = store(&config, "house.jpeg".to_string(), "image/jpeg", b"jpeg-bytes")
            .await
            .unwrap();

        assert!(file.filename.ends_with(".jpg"));
        assert_eq!(file.url, format!("/uploads/{}", file.filename));
        assert_eq!(file.original_name, "house.jpeg");
        assert_eq!(file.size, 10);
        let written = std::fs::read(config.path.join(&file.filename)).unwrap();
        assert_eq!(written, b"jpeg-bytes");
    }

    #[tokio::test]
    async fn test_store_failure_hides_io_details() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, b"file").unwrap();
        let config = UploadConfig {
            path: blocker.join("media"),
            ..UploadConfig::default()
        };

        let err = store(&config, "a.png".to_string(), "image/png", b"png")
            .await
            .unwrap_err();
        assert_eq!(err.error.code, "INTERNAL_ERROR");
        assert_eq!(err.error.message, "Internal server error");
    }
}
