//! Defines routes for the gallery pages, the JSON API and the health probe.
//!
//! ## Structure
//! - **Pages**
//!   - `GET  /`                    — summary with photo count
//!   - `GET  /gallery`             — gallery with presigned image URLs
//!   - `GET  /upload`              — upload form
//!   - `POST /upload`              — multipart upload, redirects to the gallery
//!   - `POST /photos/{id}/delete`  — delete, redirects to the gallery
//!
//! - **JSON API**
//!   - `GET    /api/photos`             — list (optional `?contentType=`)
//!   - `GET    /api/photos/{id}`        — single photo
//!   - `GET    /api/photos/{id}/exists` — storage presence check
//!   - `POST   /api/upload`             — multipart upload
//!   - `DELETE /api/photos/{id}`        — delete
//!
//! - `GET /health`

use crate::{
    handlers::{
        health_handlers::health,
        page_handlers::{delete_photo, gallery, index, upload_form, upload_submit},
        photo_handlers::{delete_photo_api, get_photo, list_photos, photo_exists, upload_photo_api},
    },
    services::photo_service::PhotoService,
};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

/// Build the router for every gallery route.
///
/// The router carries `PhotoService` as shared state; `max_body_bytes` caps
/// request bodies and must exceed the photo size limit.
pub fn routes(max_body_bytes: usize) -> Router<PhotoService> {
    Router::new()
        .route("/health", get(health))
        // Pages
        .route("/", get(index))
        .route("/gallery", get(gallery))
        .route("/upload", get(upload_form).post(upload_submit))
        .route("/photos/{id}/delete", post(delete_photo))
        // JSON API
        .route("/api/photos", get(list_photos))
        .route("/api/photos/{id}", get(get_photo).delete(delete_photo_api))
        .route("/api/photos/{id}/exists", get(photo_exists))
        .route("/api/upload", post(upload_photo_api))
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(TraceLayer::new_for_http())
}
