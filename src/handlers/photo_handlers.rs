//! JSON API handlers for photos. Upload bodies are `multipart/form-data`
//! with a `file` part and an optional `description` part.

use crate::{
    errors::AppError,
    models::{
        presentable::PresentablePhoto,
        upload::{UploadFile, UploadResponse, UploadResult},
    },
    services::photo_service::{
        MAX_FILE_SIZE, PhotoService, UNEXPECTED_FAILURE_MESSAGE, ValidationError,
    },
};
use axum::{
    Json,
    extract::{
        Multipart, Path, Query, State,
        multipart::{MultipartError, MultipartRejection},
    },
    http::StatusCode,
};
use bytes::BytesMut;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

pub const DELETE_SUCCESS_MESSAGE: &str = "Photo deleted successfully";
pub const DELETE_FAILURE_MESSAGE: &str = "Failed to delete photo";

/// Query params accepted by `GET /api/photos`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListPhotosQuery {
    /// Keep only photos whose content type contains this fragment.
    pub content_type: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ExistsResponse {
    pub id: i64,
    pub exists: bool,
}

/// Parsed upload form.
#[derive(Debug, Default)]
pub struct UploadForm {
    pub file: Option<UploadFile>,
    pub description: Option<String>,
}

/// GET `/api/photos` — presentable photos, newest first.
pub async fn list_photos(
    State(service): State<PhotoService>,
    Query(q): Query<ListPhotosQuery>,
) -> Result<Json<Vec<PresentablePhoto>>, AppError> {
    let photos = match q.content_type.as_deref().filter(|ct| !ct.is_empty()) {
        Some(fragment) => service.find_by_content_type(fragment).await?,
        None => service.list_all().await?,
    };
    Ok(Json(photos))
}

/// GET `/api/photos/{id}`
pub async fn get_photo(
    State(service): State<PhotoService>,
    Path(id): Path<i64>,
) -> Result<Json<PresentablePhoto>, AppError> {
    service
        .get_one(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::not_found("Photo not found"))
}

/// GET `/api/photos/{id}/exists` — whether the photo's object is still in storage.
pub async fn photo_exists(
    State(service): State<PhotoService>,
    Path(id): Path<i64>,
) -> Result<Json<ExistsResponse>, AppError> {
    let exists = service
        .object_exists(id)
        .await?
        .ok_or_else(|| AppError::not_found("Photo not found"))?;
    Ok(Json(ExistsResponse { id, exists }))
}

/// POST `/api/upload` — 200 with the new id, 400 with the rejection message.
pub async fn upload_photo_api(
    State(service): State<PhotoService>,
    multipart: Result<Multipart, MultipartRejection>,
) -> (StatusCode, Json<UploadResponse>) {
    let result = upload_from_request(&service, multipart).await;
    let status = if result.is_success() {
        StatusCode::OK
    } else {
        StatusCode::BAD_REQUEST
    };
    (status, Json(UploadResponse::from(&result)))
}

/// DELETE `/api/photos/{id}`
pub async fn delete_photo_api(
    State(service): State<PhotoService>,
    Path(id): Path<i64>,
) -> Json<DeleteResponse> {
    let deleted = service.delete_photo(id).await;
    Json(DeleteResponse {
        success: deleted,
        message: if deleted {
            DELETE_SUCCESS_MESSAGE
        } else {
            DELETE_FAILURE_MESSAGE
        }
        .to_string(),
    })
}

/// Shared by the API and the HTML form: parse the body and run the upload.
/// Bodies cut off by the request size limit get the size message; other
/// unreadable bodies become the generic failure result.
pub(crate) async fn upload_from_request(
    service: &PhotoService,
    multipart: Result<Multipart, MultipartRejection>,
) -> UploadResult {
    let form = match multipart {
        Ok(multipart) => read_upload_form(multipart).await,
        Err(rejection) => {
            error!("rejected upload body: {}", rejection);
            return UploadResult::failure(UNEXPECTED_FAILURE_MESSAGE);
        }
    };

    match form {
        Ok(form) => {
            if let Some(file) = form.file.as_ref() {
                info!(
                    "Received upload request for file: {}, size: {} bytes",
                    file.filename.as_deref().unwrap_or(""),
                    file.size
                );
            }
            service.upload_photo(form.file, form.description).await
        }
        Err(err) if err.status() == StatusCode::PAYLOAD_TOO_LARGE => {
            warn!("File validation failed: {}", err);
            UploadResult::failure(ValidationError::TooLarge.to_string())
        }
        Err(err) => {
            error!("failed to read multipart upload: {}", err);
            UploadResult::failure(UNEXPECTED_FAILURE_MESSAGE)
        }
    }
}

/// Collect the `file` and `description` parts; other parts are ignored.
///
/// The file is buffered only up to `MAX_FILE_SIZE`. Once it grows past that,
/// reading stops and the form carries an oversized file with the byte count
/// seen so far.
pub async fn read_upload_form(mut multipart: Multipart) -> Result<UploadForm, MultipartError> {
    let mut form = UploadForm::default();

    while let Some(mut field) = multipart.next_field().await? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("file") => {
                let filename = field.file_name().map(str::to_string);
                let content_type = field.content_type().map(str::to_string);
                let mut buf = BytesMut::new();
                while let Some(chunk) = field.chunk().await? {
                    buf.extend_from_slice(&chunk);
                    let read = buf.len() as u64;
                    if read > MAX_FILE_SIZE {
                        debug!("file part passed {} bytes, dropping the rest", MAX_FILE_SIZE);
                        form.file = Some(UploadFile::oversized(read, filename, content_type));
                        return Ok(form);
                    }
                }
                form.file = Some(UploadFile::new(buf.freeze(), filename, content_type));
            }
            Some("description") => {
                let text = field.text().await?;
                let trimmed = text.trim();
                form.description = (!trimmed.is_empty()).then(|| trimmed.to_string());
            }
            _ => {}
        }
    }

    Ok(form)
}
