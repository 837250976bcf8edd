//! Photo gallery: uploads go to S3, metadata to SQLite, and the gallery is
//! served through presigned URLs.

pub mod config;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;

pub use routes::routes::routes as router;
pub use services::photo_service::PhotoService;
