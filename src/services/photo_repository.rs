//! src/services/photo_repository.rs
//!
//! Metadata persistence for photos. `PhotoRepository` is the storage-agnostic
//! contract; `SqlitePhotoRepository` implements it over a sqlx SQLite pool.

use crate::models::photo::{NewPhoto, Photo};
use async_trait::async_trait;
use sqlx::SqlitePool;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// Schema applied at startup and by `--migrate`.
pub const INIT_MIGRATION: &str = include_str!("../../migrations/0001_init.sql");

const PHOTO_COLUMNS: &str =
    "id, filename, storage_key, description, content_type, file_size, uploaded_at";

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;

#[async_trait]
pub trait PhotoRepository: Send + Sync {
    async fn insert(&self, photo: NewPhoto) -> RepositoryResult<Photo>;

    async fn find_by_id(&self, id: i64) -> RepositoryResult<Option<Photo>>;

    /// Newest first; equal timestamps fall back to the higher id first.
    async fn find_all_ordered_by_uploaded_at_desc(&self) -> RepositoryResult<Vec<Photo>>;

    /// Case-sensitive substring match on `content_type`, newest first.
    async fn find_by_content_type_containing(
        &self,
        fragment: &str,
    ) -> RepositoryResult<Vec<Photo>>;

    /// Returns `true` when a row was removed.
    async fn delete_by_id(&self, id: i64) -> RepositoryResult<bool>;

    async fn count(&self) -> RepositoryResult<i64>;
}

#[derive(Clone)]
pub struct SqlitePhotoRepository {
    db: Arc<SqlitePool>,
}

impl SqlitePhotoRepository {
    pub fn new(db: Arc<SqlitePool>) -> Self {
        Self { db }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.db
    }
}

#[async_trait]
impl PhotoRepository for SqlitePhotoRepository {
    async fn insert(&self, photo: NewPhoto) -> RepositoryResult<Photo> {
        let row = sqlx::query_as::<_, Photo>(&format!(
            "INSERT INTO photos (filename, storage_key, description, content_type, file_size, uploaded_at)
             VALUES (?, ?, ?, ?, ?, ?)
             RETURNING {PHOTO_COLUMNS}"
        ))
        .bind(&photo.filename)
        .bind(&photo.storage_key)
        .bind(&photo.description)
        .bind(&photo.content_type)
        .bind(photo.file_size)
        .bind(photo.uploaded_at)
        .fetch_one(&*self.db)
        .await?;

        debug!(id = row.id, key = %row.storage_key, "inserted photo row");
        Ok(row)
    }

    async fn find_by_id(&self, id: i64) -> RepositoryResult<Option<Photo>> {
        let row = sqlx::query_as::<_, Photo>(&format!(
            "SELECT {PHOTO_COLUMNS} FROM photos WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&*self.db)
        .await?;
        Ok(row)
    }

    async fn find_all_ordered_by_uploaded_at_desc(&self) -> RepositoryResult<Vec<Photo>> {
        let rows = sqlx::query_as::<_, Photo>(&format!(
            "SELECT {PHOTO_COLUMNS} FROM photos ORDER BY uploaded_at DESC, id DESC"
        ))
        .fetch_all(&*self.db)
        .await?;
        Ok(rows)
    }

    async fn find_by_content_type_containing(
        &self,
        fragment: &str,
    ) -> RepositoryResult<Vec<Photo>> {
        let rows = sqlx::query_as::<_, Photo>(&format!(
            "SELECT {PHOTO_COLUMNS} FROM photos
             WHERE instr(content_type, ?) > 0
             ORDER BY uploaded_at DESC, id DESC"
        ))
        .bind(fragment)
        .fetch_all(&*self.db)
        .await?;
        Ok(rows)
    }

    async fn delete_by_id(&self, id: i64) -> RepositoryResult<bool> {
        let result = sqlx::query("DELETE FROM photos WHERE id = ?")
            .bind(id)
            .execute(&*self.db)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn count(&self) -> RepositoryResult<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM photos")
            .fetch_one(&*self.db)
            .await?;
        Ok(count)
    }
}

/// Apply the embedded schema one statement at a time.
pub async fn run_migrations(db: &SqlitePool) -> RepositoryResult<()> {
    let statements = INIT_MIGRATION
        .split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>();

    tracing::info!("Running {} migration statements...", statements.len());

    for stmt in statements {
        debug!("Executing migration SQL: {}", stmt);
        sqlx::query(stmt).execute(db).await?;
    }

    Ok(())
}
