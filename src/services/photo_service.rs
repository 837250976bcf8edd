//! src/services/photo_service.rs
//!
//! PhotoService — upload, gallery queries and deletion. Validation happens here;
//! bytes go to the `ObjectStore` and metadata to the `PhotoRepository`.
//!
//! Upload and delete never return errors to the caller: every failure is folded
//! into an `UploadResult` or a `false` and logged with detail server-side.

use crate::{
    models::{
        photo::{NewPhoto, Photo},
        presentable::PresentablePhoto,
        upload::{UploadFile, UploadResult},
    },
    services::{
        object_store::{ObjectStore, StorageError},
        photo_repository::{PhotoRepository, RepositoryError, RepositoryResult},
    },
};
use chrono::Utc;
use futures::future::join_all;
use std::{collections::HashMap, sync::Arc, time::Duration};
use thiserror::Error;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

/// Largest accepted upload, in bytes (10 MiB).
pub const MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// Lifetime of each presigned gallery URL.
pub const PRESIGNED_URL_TTL: Duration = Duration::from_secs(2 * 24 * 60 * 60);

pub const ALLOWED_CONTENT_TYPES: [&str; 5] = [
    "image/jpeg",
    "image/jpg",
    "image/png",
    "image/gif",
    "image/webp",
];

pub const KEY_PREFIX: &str = "photos/";
pub const DEFAULT_DESCRIPTION: &str = "No description";

pub const UPLOAD_SUCCESS_MESSAGE: &str = "Photo uploaded successfully";
pub const STORAGE_FAILURE_MESSAGE: &str = "Failed to upload photo. Please try again.";
pub const UNEXPECTED_FAILURE_MESSAGE: &str = "An unexpected error occurred. Please try again.";

/// Reasons an upload is rejected before any I/O, checked in declaration order.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Please select a file to upload")]
    MissingFile,
    #[error("File size must be less than 10MB")]
    TooLarge,
    #[error("Only image files (JPEG, PNG, GIF, WebP) are allowed")]
    UnsupportedContentType,
    #[error("Invalid filename")]
    InvalidFilename,
}

#[derive(Debug, Error)]
pub enum UploadError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// A file that passed validation, with its filename and content type resolved.
struct ValidatedUpload<'a> {
    file: &'a UploadFile,
    filename: &'a str,
    content_type: &'a str,
}

#[derive(Clone)]
pub struct PhotoService {
    repo: Arc<dyn PhotoRepository>,
    store: Arc<dyn ObjectStore>,
}

impl PhotoService {
    pub fn new(repo: Arc<dyn PhotoRepository>, store: Arc<dyn ObjectStore>) -> Self {
        Self { repo, store }
    }

    /// Validate, store and record an uploaded photo.
    #[instrument(skip_all)]
    pub async fn upload_photo(
        &self,
        file: Option<UploadFile>,
        description: Option<String>,
    ) -> UploadResult {
        match self.try_upload(file.as_ref(), description).await {
            Ok(photo) => {
                info!(
                    id = photo.id,
                    key = %photo.storage_key,
                    "Successfully uploaded photo"
                );
                UploadResult::success(photo.id, UPLOAD_SUCCESS_MESSAGE)
            }
            Err(UploadError::Validation(err)) => {
                warn!("File validation failed: {}", err);
                UploadResult::failure(err.to_string())
            }
            Err(UploadError::Storage(err)) => {
                error!("Failed to upload photo: {}", err);
                UploadResult::failure(STORAGE_FAILURE_MESSAGE)
            }
            Err(UploadError::Repository(err)) => {
                error!("Unexpected error during photo upload: {}", err);
                UploadResult::failure(UNEXPECTED_FAILURE_MESSAGE)
            }
        }
    }

    async fn try_upload(
        &self,
        file: Option<&UploadFile>,
        description: Option<String>,
    ) -> Result<Photo, UploadError> {
        let upload = validate_upload(file)?;
        let storage_key = generate_storage_key(upload.filename);

        let mut metadata = HashMap::new();
        metadata.insert(
            "original-filename".to_string(),
            metadata_value(upload.filename),
        );
        metadata.insert(
            "description".to_string(),
            metadata_value(description.as_deref().unwrap_or(DEFAULT_DESCRIPTION)),
        );

        self.store
            .put(
                &storage_key,
                upload.file.bytes.clone(),
                upload.content_type,
                upload.file.size,
                metadata,
            )
            .await?;

        let photo = self
            .repo
            .insert(NewPhoto {
                filename: upload.filename.to_string(),
                storage_key,
                description,
                content_type: upload.content_type.to_string(),
                file_size: upload.file.size as i64,
                uploaded_at: Utc::now(),
            })
            .await?;

        Ok(photo)
    }

    /// Every photo, newest first, each with a fresh presigned URL.
    ///
    /// Photos whose URL cannot be generated are left out of the result; they
    /// are still counted by `count`.
    #[instrument(skip(self))]
    pub async fn list_all(&self) -> RepositoryResult<Vec<PresentablePhoto>> {
        let photos = self.repo.find_all_ordered_by_uploaded_at_desc().await?;
        Ok(self.present_all(photos).await)
    }

    /// Photos whose content type contains `fragment`, newest first.
    #[instrument(skip(self))]
    pub async fn find_by_content_type(
        &self,
        fragment: &str,
    ) -> RepositoryResult<Vec<PresentablePhoto>> {
        let photos = self.repo.find_by_content_type_containing(fragment).await?;
        Ok(self.present_all(photos).await)
    }

    /// A single photo. A failed presign yields `presigned_url: None` rather than dropping it.
    #[instrument(skip(self))]
    pub async fn get_one(&self, id: i64) -> RepositoryResult<Option<PresentablePhoto>> {
        let Some(photo) = self.repo.find_by_id(id).await? else {
            return Ok(None);
        };
        let url = self.presign(&photo.storage_key).await;
        Ok(Some(PresentablePhoto::new(photo, url)))
    }

    pub async fn count(&self) -> RepositoryResult<i64> {
        self.repo.count().await
    }

    /// `None` when no such photo; otherwise whether its object is still in storage.
    #[instrument(skip(self))]
    pub async fn object_exists(&self, id: i64) -> RepositoryResult<Option<bool>> {
        let Some(photo) = self.repo.find_by_id(id).await? else {
            return Ok(None);
        };
        let exists = match self.store.head_exists(&photo.storage_key).await {
            Ok(exists) => exists,
            Err(err) => {
                error!("Error checking if object exists: {}", err);
                false
            }
        };
        Ok(Some(exists))
    }

    /// Delete the stored object, then the metadata row.
    ///
    /// A storage failure is logged and does not stop the row from being removed.
    /// Returns `true` when the row was removed.
    #[instrument(skip(self))]
    pub async fn delete_photo(&self, id: i64) -> bool {
        match self.try_delete(id).await {
            Ok(deleted) => deleted,
            Err(err) => {
                error!("Failed to delete photo with ID {}: {}", id, err);
                false
            }
        }
    }

    async fn try_delete(&self, id: i64) -> RepositoryResult<bool> {
        let Some(photo) = self.repo.find_by_id(id).await? else {
            warn!("Attempted to delete non-existent photo with ID: {}", id);
            return Ok(false);
        };

        if let Err(err) = self.store.delete(&photo.storage_key).await {
            warn!(
                "Failed to delete photo from storage, continuing with database deletion: {}",
                err
            );
        }

        let deleted = self.repo.delete_by_id(id).await?;
        if deleted {
            info!(
                "Successfully deleted photo with ID: {} and key: {}",
                id, photo.storage_key
            );
        }
        Ok(deleted)
    }

    async fn present_all(&self, photos: Vec<Photo>) -> Vec<PresentablePhoto> {
        let urls = join_all(photos.iter().map(|p| self.presign(&p.storage_key))).await;

        photos
            .into_iter()
            .zip(urls)
            .filter_map(|(photo, url)| url.map(|url| PresentablePhoto::new(photo, Some(url))))
            .collect()
    }

    async fn presign(&self, key: &str) -> Option<String> {
        match self.store.presign_get(key, PRESIGNED_URL_TTL).await {
            Ok(url) => Some(url),
            Err(err) => {
                error!("Failed to generate presigned URL: {}", err);
                None
            }
        }
    }
}

/// Apply the upload rules in order; the first failing rule wins.
fn validate_upload(file: Option<&UploadFile>) -> Result<ValidatedUpload<'_>, ValidationError> {
    let file = match file {
        Some(file) if !file.is_empty() => file,
        _ => return Err(ValidationError::MissingFile),
    };

    if file.size > MAX_FILE_SIZE {
        return Err(ValidationError::TooLarge);
    }

    let content_type = file
        .content_type
        .as_deref()
        .filter(|ct| is_allowed_content_type(ct))
        .ok_or(ValidationError::UnsupportedContentType)?;

    let filename = file
        .filename
        .as_deref()
        .filter(|name| !name.trim().is_empty())
        .ok_or(ValidationError::InvalidFilename)?;

    Ok(ValidatedUpload {
        file,
        filename,
        content_type,
    })
}

fn is_allowed_content_type(content_type: &str) -> bool {
    let lowered = content_type.to_lowercase();
    ALLOWED_CONTENT_TYPES.contains(&lowered.as_str())
}

/// `photos/<uuid-v4><ext>`, where `<ext>` runs from the last `.` of the filename.
fn generate_storage_key(filename: &str) -> String {
    format!("{}{}{}", KEY_PREFIX, Uuid::new_v4(), file_extension(filename))
}

fn file_extension(filename: &str) -> &str {
    filename.rfind('.').map(|idx| &filename[idx..]).unwrap_or("")
}

/// Object metadata is sent as HTTP headers: control characters become spaces
/// and non-ASCII characters are percent-encoded as UTF-8.
fn metadata_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        if c.is_control() {
            out.push(' ');
        } else if c.is_ascii() {
            out.push(c);
        } else {
            let mut buf = [0u8; 4];
            for byte in c.encode_utf8(&mut buf).bytes() {
                out.push_str(&format!("%{byte:02X}"));
            }
        }
    }
    out
}
