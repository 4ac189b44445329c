//! Local image retrieval for display.

use std::path::Path;

use async_trait::async_trait;

use super::{candidate_paths, ImageSource, ServiceError};

/// [`ImageSource`] that reads image bytes from the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalImageSource;

#[async_trait]
impl ImageSource for LocalImageSource {
    async fn fetch_image(&self, path: &Path) -> Result<Vec<u8>, ServiceError> {
        for candidate in candidate_paths(path) {
            match tokio::fs::read(&candidate).await {
                Ok(bytes) => {
                    log::trace!("Serving {} ({} bytes)", candidate.display(), bytes.len());
                    return Ok(bytes);
                }
                Err(e) => log::trace!("Cannot read {}: {}", candidate.display(), e),
            }
        }

        log::debug!("Image not found: {}", path.display());
        Err(ServiceError::Rejected("Image not found".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_fetch_existing_image() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.png");
        std::fs::write(&path, [0x89, b'P', b'N', b'G']).unwrap();

        let bytes = LocalImageSource.fetch_image(&path).await.unwrap();
        assert_eq!(bytes, vec![0x89, b'P', b'N', b'G']);
    }

    #[tokio::test]
    async fn test_fetch_missing_image() {
        let dir = TempDir::new().unwrap();
        let result = LocalImageSource
            .fetch_image(&dir.path().join("missing.png"))
            .await;
        assert_eq!(
            result,
            Err(ServiceError::Rejected("Image not found".to_string()))
        );
    }
}
