//! Reader storage operations

use async_trait::async_trait;
use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::reader::Reader,
};

/// Storage interface for readers
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReaderStore: Send + Sync {
    /// All readers in insertion order
    async fn list(&self) -> AppResult<Vec<Reader>>;

    async fn get_by_id(&self, id: i32) -> AppResult<Reader>;

    /// Exact, case-sensitive lookup by name
    async fn find_by_name(&self, name: &str) -> AppResult<Option<Reader>>;

    /// Persist a new reader. Fails with a validation error if the name is
    /// already taken, even under concurrent registration.
    async fn create(&self, name: &str) -> AppResult<Reader>;

    /// Remove a reader and return the deleted record
    async fn delete(&self, id: i32) -> AppResult<Reader>;
}

#[derive(Clone)]
pub struct PgReaderStore {
    pool: Pool<Postgres>,
}

impl PgReaderStore {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

/// Postgres unique_violation
fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.code().as_deref() == Some("23505"))
}

#[async_trait]
impl ReaderStore for PgReaderStore {
    async fn list(&self) -> AppResult<Vec<Reader>> {
        let readers = sqlx::query_as::<_, Reader>("SELECT * FROM readers ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        Ok(readers)
    }

    async fn get_by_id(&self, id: i32) -> AppResult<Reader> {
        sqlx::query_as::<_, Reader>("SELECT * FROM readers WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Reader with id {} not found", id)))
    }

    async fn find_by_name(&self, name: &str) -> AppResult<Option<Reader>> {
        let reader = sqlx::query_as::<_, Reader>("SELECT * FROM readers WHERE name = $1")
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;
        Ok(reader)
    }

    async fn create(&self, name: &str) -> AppResult<Reader> {
        // The UNIQUE constraint on readers.name is the authority; two
        // concurrent registrations cannot both succeed.
        sqlx::query_as::<_, Reader>("INSERT INTO readers (name) VALUES ($1) RETURNING *")
            .bind(name)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    AppError::Validation(format!("Reader \"{}\" already exists", name))
                } else {
                    AppError::Database(e)
                }
            })
    }

    async fn delete(&self, id: i32) -> AppResult<Reader> {
        sqlx::query_as::<_, Reader>("DELETE FROM readers WHERE id = $1 RETURNING *")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Reader with id {} not found", id)))
    }
}
