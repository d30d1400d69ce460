//! Filesystem store for generated images.
//!
//! Artifacts are written under a single images directory with
//! collision-resistant names: a UTC timestamp for human sortability plus a
//! random suffix so two generations in the same second cannot clash. The
//! public URL is always `/images/<filename>`, served separately by the API
//! layer.

use std::path::PathBuf;
use std::time::{Duration, SystemTime};

use chrono::{DateTime, Utc};
use uuid::Uuid;

use murmur_core::image::store::ImageStore;
use murmur_types::image::{ImageError, StoredImage};

pub struct FsImageStore {
    dir: PathBuf,
}

impl FsImageStore {
    /// Open (and create if missing) the images directory.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, ImageError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir).map_err(|e| ImageError::Storage(e.to_string()))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &std::path::Path {
        &self.dir
    }

    fn fresh_filename() -> String {
        let stamp = Utc::now().format("%Y%m%d%H%M%S");
        let suffix = Uuid::new_v4().simple().to_string();
        format!("{stamp}_{}.png", &suffix[..8])
    }
}

impl ImageStore for FsImageStore {
    async fn write(&self, bytes: &[u8]) -> Result<StoredImage, ImageError> {
        let filename = Self::fresh_filename();
        let path = self.dir.join(&filename);

        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| ImageError::Storage(e.to_string()))?;

        Ok(StoredImage {
            url: format!("/images/{filename}"),
            filename,
            size_bytes: bytes.len() as u64,
            modified_at: Utc::now(),
        })
    }

    async fn list(&self) -> Result<Vec<StoredImage>, ImageError> {
        let mut entries = tokio::fs::read_dir(&self.dir)
            .await
            .map_err(|e| ImageError::Storage(e.to_string()))?;

        let mut images = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| ImageError::Storage(e.to_string()))?
        {
            let metadata = entry
                .metadata()
                .await
                .map_err(|e| ImageError::Storage(e.to_string()))?;
            if !metadata.is_file() {
                continue;
            }
            let filename = entry.file_name().to_string_lossy().to_string();
            if !filename.ends_with(".png") {
                continue;
            }
            let modified: DateTime<Utc> = metadata
                .modified()
                .map_err(|e| ImageError::Storage(e.to_string()))?
                .into();
            images.push(StoredImage {
                url: format!("/images/{filename}"),
                filename,
                size_bytes: metadata.len(),
                modified_at: modified,
            });
        }

        images.sort_by(|a, b| b.modified_at.cmp(&a.modified_at));
        Ok(images)
    }

    async fn delete_older_than(&self, max_age: Duration) -> Result<usize, ImageError> {
        let cutoff = SystemTime::now() - max_age;
        let mut entries = tokio::fs::read_dir(&self.dir)
            .await
            .map_err(|e| ImageError::Storage(e.to_string()))?;

        let mut removed = 0;
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| ImageError::Storage(e.to_string()))?
        {
            let metadata = entry
                .metadata()
                .await
                .map_err(|e| ImageError::Storage(e.to_string()))?;
            if !metadata.is_file() {
                continue;
            }
            let modified = metadata
                .modified()
                .map_err(|e| ImageError::Storage(e.to_string()))?;
            if modified < cutoff {
                tokio::fs::remove_file(entry.path())
                    .await
                    .map_err(|e| ImageError::Storage(e.to_string()))?;
                removed += 1;
            }
        }

        Ok(removed)
    }
}
