//! Core data models for the photo gallery.
//!
//! `Photo` maps to the `photos` table via `sqlx::FromRow`; the other types are
//! transient projections and request/response payloads.

pub mod photo;
pub mod presentable;
pub mod upload;
