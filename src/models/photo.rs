//! Represents an uploaded photo's persisted metadata.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A single row of the `photos` table.
///
/// The image bytes live in object storage under `storage_key`; this struct only
/// carries metadata. Every field is written once at creation and never updated.
#[derive(Serialize, Deserialize, Clone, FromRow, Debug, PartialEq)]
pub struct Photo {
    /// Server-assigned identifier.
    pub id: i64,

    /// Filename as supplied by the uploader.
    pub filename: String,

    /// Object key inside the bucket (`photos/<uuid><ext>`).
    pub storage_key: String,

    /// Optional free-text description.
    pub description: Option<String>,

    /// Declared MIME type, stored verbatim.
    pub content_type: String,

    /// Declared size in bytes, stored verbatim.
    pub file_size: i64,

    /// When the upload was recorded.
    pub uploaded_at: DateTime<Utc>,
}

/// Fields needed to insert a new `Photo`; the id is assigned by the database.
#[derive(Clone, Debug)]
pub struct NewPhoto {
    pub filename: String,
    pub storage_key: String,
    pub description: Option<String>,
    pub content_type: String,
    pub file_size: i64,
    pub uploaded_at: DateTime<Utc>,
}
