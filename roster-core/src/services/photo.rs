//! Photo Asset Manager
//!
//! One photo per member, stored in the blob store under
//! `{owner}_{millis}.{ext}` where `owner` is the member's phone number (or
//! the upload time when there is none). Cleanup is best-effort: failures
//! are logged and never fail the record mutation they accompany.

use std::sync::Arc;

use futures::future::join_all;
use shared::backend::{BlobStore, PutOptions};
use shared::error::{AppError, AppResult, ErrorCode};
use shared::models::PhotoUpload;

/// Supported photo extensions
pub const SUPPORTED_FORMATS: &[&str] = &["png", "jpg", "jpeg", "webp"];

/// Default size limit (5MB)
pub const DEFAULT_MAX_PHOTO_BYTES: usize = 5 * 1024 * 1024;

/// Cache directive forcing revalidation so a reused key is never served stale
const CACHE_CONTROL: &str = "no-cache";

#[derive(Clone)]
pub struct PhotoAssetManager {
    store: Arc<dyn BlobStore>,
    max_bytes: usize,
}

impl PhotoAssetManager {
    pub fn new(store: Arc<dyn BlobStore>) -> Self {
        Self {
            store,
            max_bytes: DEFAULT_MAX_PHOTO_BYTES,
        }
    }

    pub fn with_max_bytes(mut self, max_bytes: usize) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    /// Check extension, size and content; returns the normalized extension
    pub fn validate(&self, photo: &PhotoUpload) -> AppResult<String> {
        let ext = photo.extension().unwrap_or_default();
        if !SUPPORTED_FORMATS.contains(&ext.as_str()) {
            return Err(AppError::with_message(
                ErrorCode::UnsupportedPhotoFormat,
                format!(
                    "Unsupported file format '{}'. Supported: {}",
                    ext,
                    SUPPORTED_FORMATS.join(", ")
                ),
            )
            .with_detail("file_name", photo.file_name.clone()));
        }

        if photo.content.is_empty() {
            return Err(AppError::validation("Photo is empty").with_detail("file_name", photo.file_name.clone()));
        }

        if photo.content.len() > self.max_bytes {
            return Err(AppError::with_message(
                ErrorCode::PhotoTooLarge,
                format!(
                    "File too large. Maximum size is {} bytes ({}MB)",
                    self.max_bytes,
                    self.max_bytes / 1024 / 1024
                ),
            )
            .with_detail("size", photo.content.len()));
        }

        // Magic bytes must agree that this is an image we accept
        match image::guess_format(&photo.content) {
            Ok(image::ImageFormat::Png | image::ImageFormat::Jpeg | image::ImageFormat::WebP) => Ok(ext),
            Ok(other) => Err(AppError::with_message(
                ErrorCode::UnsupportedPhotoFormat,
                format!("Unsupported image content ({:?})", other),
            )),
            Err(e) => Err(AppError::with_message(
                ErrorCode::UnsupportedPhotoFormat,
                format!("Invalid image file ({}): {}", ext, e),
            )),
        }
    }

    /// `{owner-or-timestamp}_{timestamp}.{ext}`
    pub fn generate_key(owner_key: Option<&str>, ext: &str, now_millis: i64) -> String {
        match owner_key.filter(|k| !k.is_empty()) {
            Some(owner) => format!("{}_{}.{}", owner, now_millis, ext),
            None => format!("{}_{}.{}", now_millis, now_millis, ext),
        }
    }

    /// Storage key from a public URL: last path segment without query/fragment
    pub fn key_from_url(url: &str) -> Option<String> {
        let path = url.split(['?', '#']).next().unwrap_or_default();
        path.rsplit('/')
            .next()
            .filter(|segment| !segment.is_empty())
            .map(str::to_string)
    }

    /// Upload a validated photo and return its public URL
    pub async fn upload(&self, photo: &PhotoUpload, owner_key: Option<&str>) -> AppResult<String> {
        let ext = self.validate(photo)?;
        let key = Self::generate_key(owner_key, &ext, shared::util::now_millis());
        let content_type = mime_guess::from_ext(&ext).first_or_octet_stream().to_string();

        self.store
            .put(
                &key,
                photo.content.clone(),
                PutOptions {
                    upsert: true,
                    content_type: Some(content_type),
                    cache_control: Some(CACHE_CONTROL.to_string()),
                },
            )
            .await
            .map_err(|e| {
                AppError::with_message(ErrorCode::PhotoUploadFailed, format!("Photo upload failed: {}", e))
                    .with_detail("key", key.clone())
            })?;

        let url = self.store.public_url(&key);
        tracing::info!(key = %key, size = photo.content.len(), "Photo uploaded");
        Ok(url)
    }

    /// Best-effort delete of the object behind `url`
    ///
    /// Returns whether the delete was acknowledged.
    pub async fn delete_by_url(&self, url: &str) -> bool {
        let Some(key) = Self::key_from_url(url) else {
            tracing::warn!(url = %url, "Cannot derive photo key from url");
            return false;
        };

        match self.store.remove(std::slice::from_ref(&key)).await {
            Ok(()) => {
                tracing::debug!(key = %key, "Photo deleted");
                true
            }
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Failed to delete photo");
                false
            }
        }
    }

    /// Best-effort delete of every object owned by `owner_key`
    ///
    /// Matches the `{owner_key}_` prefix so a distinct phone number that
    /// merely starts with the same digits is never touched. Returns the
    /// number of objects removed.
    pub async fn delete_by_owner_key(&self, owner_key: &str) -> usize {
        if owner_key.is_empty() {
            return 0;
        }

        let keys = match self.store.list().await {
            Ok(keys) => keys,
            Err(e) => {
                tracing::warn!(owner_key = %owner_key, error = %e, "Failed to list photos");
                return 0;
            }
        };

        let prefix = format!("{}_", owner_key);
        let matches: Vec<String> = keys.into_iter().filter(|k| k.starts_with(&prefix)).collect();

        let results = join_all(matches.iter().map(|key| async move {
            let result = self.store.remove(std::slice::from_ref(key)).await;
            (key, result)
        }))
        .await;

        let mut removed = 0;
        for (key, result) in results {
            match result {
                Ok(()) => removed += 1,
                Err(e) => tracing::warn!(key = %key, error = %e, "Failed to delete photo"),
            }
        }

        if removed > 0 {
            tracing::info!(owner_key = %owner_key, count = removed, "Member photos cleaned up");
        }
        removed
    }

    /// Whether the object behind `url` falls under `owner_key`
    pub fn is_owned_by(url: &str, owner_key: &str) -> bool {
        Self::key_from_url(url).is_some_and(|key| key.starts_with(&format!("{}_", owner_key)))
    }
}
