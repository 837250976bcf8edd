//! Read-side projection of a photo with a freshly signed URL.

use super::photo::Photo;
use chrono::{DateTime, Utc};
use serde::Serialize;

const KIB: f64 = 1024.0;
const MIB: f64 = 1024.0 * 1024.0;

/// A `Photo` enriched at read time with a presigned GET URL.
///
/// Never persisted. The storage key is intentionally not part of the projection.
#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PresentablePhoto {
    pub id: i64,
    pub filename: String,
    pub description: Option<String>,
    pub content_type: String,
    pub file_size: i64,
    pub formatted_file_size: String,
    pub uploaded_at: DateTime<Utc>,
    pub presigned_url: Option<String>,
}

impl PresentablePhoto {
    pub fn new(photo: Photo, presigned_url: Option<String>) -> Self {
        Self {
            formatted_file_size: format_file_size(photo.file_size),
            id: photo.id,
            filename: photo.filename,
            description: photo.description,
            content_type: photo.content_type,
            file_size: photo.file_size,
            uploaded_at: photo.uploaded_at,
            presigned_url,
        }
    }
}

/// Human-readable size: bytes below 1 KiB, one decimal for KB and MB.
pub fn format_file_size(size: i64) -> String {
    let bytes = size as f64;
    if bytes < KIB {
        format!("{} B", size)
    } else if bytes < MIB {
        format!("{:.1} KB", bytes / KIB)
    } else {
        format!("{:.1} MB", bytes / MIB)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_sizes_by_magnitude() {
        assert_eq!(format_file_size(0), "0 B");
        assert_eq!(format_file_size(1023), "1023 B");
        assert_eq!(format_file_size(1536), "1.5 KB");
        assert_eq!(format_file_size(2 * 1024 * 1024), "2.0 MB");
    }

    #[test]
    fn projection_serializes_camel_case_without_storage_key() {
        let photo = Photo {
            id: 7,
            filename: "cat.png".into(),
            storage_key: "photos/abc.png".into(),
            description: None,
            content_type: "image/png".into(),
            file_size: 2048,
            uploaded_at: Utc::now(),
        };
        let json = serde_json::to_value(PresentablePhoto::new(photo, Some("https://x".into())))
            .unwrap();

        assert_eq!(json["id"], 7);
        assert_eq!(json["contentType"], "image/png");
        assert_eq!(json["formattedFileSize"], "2.0 KB");
        assert_eq!(json["presignedUrl"], "https://x");
        assert!(json.get("storageKey").is_none());
    }
}
