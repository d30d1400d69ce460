//! ImageStore trait definition.
//!
//! Storage seam for generated artifacts: write decoded bytes, list what is
//! stored, delete by age. The filesystem implementation lives in
//! murmur-infra; an object-store backend can be substituted without
//! touching dispatcher logic.

use std::time::Duration;

use murmur_types::image::{ImageError, StoredImage};

/// Trait for generated-image persistence.
pub trait ImageStore: Send + Sync {
    /// Write decoded image bytes under a fresh collision-resistant
    /// filename and return the stored locator.
    fn write(
        &self,
        bytes: &[u8],
    ) -> impl std::future::Future<Output = Result<StoredImage, ImageError>> + Send;

    /// List stored images, most recently modified first.
    fn list(
        &self,
    ) -> impl std::future::Future<Output = Result<Vec<StoredImage>, ImageError>> + Send;

    /// Delete images older than the cutoff; returns the number removed.
    fn delete_older_than(
        &self,
        max_age: Duration,
    ) -> impl std::future::Future<Output = Result<usize, ImageError>> + Send;
}
