//! Upload payloads and the tagged outcome of an upload attempt.

use bytes::Bytes;
use serde::Serialize;

/// A file received from a multipart form, before validation.
#[derive(Clone, Debug)]
pub struct UploadFile {
    pub bytes: Bytes,
    pub filename: Option<String>,
    pub content_type: Option<String>,
    /// Size in bytes as read from the request.
    pub size: u64,
}

impl UploadFile {
    pub fn new(bytes: Bytes, filename: Option<String>, content_type: Option<String>) -> Self {
        let size = bytes.len() as u64;
        Self {
            bytes,
            filename,
            content_type,
            size,
        }
    }

    /// A file whose body was abandoned after `size` bytes, already past the
    /// upload limit. Only the size is kept.
    pub fn oversized(size: u64, filename: Option<String>, content_type: Option<String>) -> Self {
        Self {
            bytes: Bytes::new(),
            filename,
            content_type,
            size,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }
}

/// Outcome of `PhotoService::upload_photo`. Failures are values, not errors.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UploadResult {
    Success { photo_id: i64, message: String },
    Failure { message: String },
}

impl UploadResult {
    pub fn success(photo_id: i64, message: impl Into<String>) -> Self {
        Self::Success {
            photo_id,
            message: message.into(),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self::Failure {
            message: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Success { message, .. } | Self::Failure { message } => message,
        }
    }

    pub fn photo_id(&self) -> Option<i64> {
        match self {
            Self::Success { photo_id, .. } => Some(*photo_id),
            Self::Failure { .. } => None,
        }
    }
}

/// JSON body for `POST /api/upload`.
#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo_id: Option<i64>,
}

impl From<&UploadResult> for UploadResponse {
    fn from(result: &UploadResult) -> Self {
        Self {
            success: result.is_success(),
            message: result.message().to_string(),
            photo_id: result.photo_id(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn oversized_file_is_not_empty() {
        let file = UploadFile::oversized(11 * 1024 * 1024, Some("big.jpg".into()), None);
        assert!(!file.is_empty());
        assert!(file.bytes.is_empty());
        assert!(UploadFile::new(Bytes::new(), Some("a.png".into()), None).is_empty());
    }

    #[test]
    fn failure_response_omits_photo_id() {
        let json = serde_json::to_value(UploadResponse::from(&UploadResult::failure("nope")))
            .unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["message"], "nope");
        assert!(json.get("photoId").is_none());
    }

    #[test]
    fn success_response_carries_photo_id() {
        let json = serde_json::to_value(UploadResponse::from(&UploadResult::success(3, "ok")))
            .unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["photoId"], 3);
    }
}
