//! Upload storage
//!
//! Uploaded files land in a local directory under a generated name and are
//! served back from `/uploads`. Only images and PDFs are accepted.

use std::path::{Path, PathBuf};

use tracing::info;
use uuid::Uuid;

use crate::error::ApiError;

pub const UPLOADS_ROUTE: &str = "/uploads";

/// Accepted content types and the extension stored files get
const ALLOWED_TYPES: &[(&str, &str)] = &[
    ("image/png", "png"),
    ("image/jpeg", "jpg"),
    ("image/webp", "webp"),
    ("image/gif", "gif"),
    ("application/pdf", "pdf"),
];

#[derive(Debug, Clone)]
pub struct UploadStorage {
    dir: PathBuf,
    public_base_url: String,
    max_bytes: usize,
}

impl UploadStorage {
    pub fn new(dir: impl Into<PathBuf>, public_base_url: &str, max_bytes: usize) -> Self {
        Self {
            dir: dir.into(),
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
            max_bytes,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    /// Stores a file and returns its public URL
    pub async fn save(&self, content_type: &str, bytes: &[u8]) -> Result<String, ApiError> {
        let extension = extension_for(content_type).ok_or_else(|| {
            ApiError::Validation(format!(
                "Unsupported file type {}; upload an image or a PDF",
                content_type
            ))
        })?;
        if bytes.is_empty() {
            return Err(ApiError::Validation("Uploaded file is empty".to_string()));
        }
        if bytes.len() > self.max_bytes {
            return Err(ApiError::Validation(format!(
                "File is larger than {} bytes",
                self.max_bytes
            )));
        }

        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| ApiError::Internal(format!("Failed to create upload dir: {}", e)))?;

        let file_name = format!("{}.{}", Uuid::now_v7(), extension);
        tokio::fs::write(self.dir.join(&file_name), bytes)
            .await
            .map_err(|e| ApiError::Internal(format!("Failed to store upload: {}", e)))?;

        info!(file = %file_name, size = bytes.len(), "Stored upload");
        Ok(format!("{}{}/{}", self.public_base_url, UPLOADS_ROUTE, file_name))
    }
}

/// Extension for an accepted content type; parameters such as `; charset`
/// are ignored
fn extension_for(content_type: &str) -> Option<&'static str> {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    ALLOWED_TYPES
        .iter()
        .find(|(mime, _)| *mime == essence)
        .map(|(_, ext)| *ext)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_for() {
        assert_eq!(extension_for("image/png"), Some("png"));
        assert_eq!(extension_for("IMAGE/JPEG"), Some("jpg"));
        assert_eq!(extension_for("application/pdf; name=a.pdf"), Some("pdf"));
        assert_eq!(extension_for("text/html"), None);
        assert_eq!(extension_for(""), None);
    }

    #[tokio::test]
    async fn test_save_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let storage = UploadStorage::new(dir.path(), "https://api.feebook.in/", 16);

        let url = storage.save("image/png", b"\x89PNG").await.unwrap();
        assert!(url.starts_with("https://api.feebook.in/uploads/"));
        assert!(url.ends_with(".png"));

        let name = url.rsplit('/').next().unwrap();
        let stored = std::fs::read(dir.path().join(name)).unwrap();
        assert_eq!(stored, b"\x89PNG");
    }

    #[tokio::test]
    async fn test_save_rejects_large_and_unknown_files() {
        let dir = tempfile::tempdir().unwrap();
        let storage = UploadStorage::new(dir.path(), "http://localhost:8080", 4);

        assert!(matches!(
            storage.save("image/png", b"too large").await,
            Err(ApiError::Validation(_))
        ));
        assert!(matches!(
            storage.save("application/zip", b"PK").await,
            Err(ApiError::Validation(_))
        ));
        assert!(matches!(
            storage.save("image/gif", b"").await,
            Err(ApiError::Validation(_))
        ));
    }
}
