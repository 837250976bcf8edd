//! Health handler.
//!
//! - GET /health -> store reachability, measured by counting photo rows

use crate::services::photo_service::PhotoService;
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use chrono::Utc;
use serde::Serialize;

/// `GET /health`
///
/// HTTP 200 with the photo count and a millisecond timestamp when the
/// metadata store answers, HTTP 503 otherwise.
pub async fn health(State(service): State<PhotoService>) -> impl IntoResponse {
    match service.count().await {
        Ok(photo_count) => (
            StatusCode::OK,
            Json(HealthResponse::Healthy {
                status: "healthy",
                photo_count,
                timestamp: Utc::now().timestamp_millis(),
            }),
        ),
        Err(err) => {
            tracing::error!("health check failed: {}", err);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthResponse::Unhealthy {
                    status: "unhealthy",
                    error: err.to_string(),
                }),
            )
        }
    }
}

#[derive(Serialize)]
#[serde(untagged)]
enum HealthResponse {
    #[serde(rename_all = "camelCase")]
    Healthy {
        status: &'static str,
        photo_count: i64,
        timestamp: i64,
    },
    Unhealthy {
        status: &'static str,
        error: String,
    },
}
