//! Issue storage operations
//!
//! Issuance is a check-then-write path: the business checks and the insert
//! run in one transaction holding row locks on the referenced book and
//! reader, so two concurrent requests cannot both observe "available".

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::issue::Issue,
};

/// Storage interface for issues
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IssueStore: Send + Sync {
    /// All issue records in insertion order
    async fn list(&self) -> AppResult<Vec<Issue>>;

    async fn get_by_id(&self, id: i32) -> AppResult<Issue>;

    /// All issues belonging to the given reader, whether returned or not
    async fn list_by_reader(&self, reader_id: i32) -> AppResult<Vec<Issue>>;

    /// Atomically check the issuance rules and persist a new issue.
    ///
    /// Fails with NotFound if the book or reader no longer exists, and with
    /// Conflict if the book is already out or the reader holds
    /// `max_active_per_reader` un-returned issues.
    async fn create(
        &self,
        book_id: i32,
        reader_id: i32,
        max_active_per_reader: i64,
    ) -> AppResult<Issue>;

    /// Set `returned_at` on an active issue. Returning an already-returned
    /// issue yields the stored record unchanged.
    async fn mark_returned(&self, id: i32) -> AppResult<Issue>;
}

#[derive(Clone)]
pub struct PgIssueStore {
    pool: Pool<Postgres>,
}

impl PgIssueStore {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl IssueStore for PgIssueStore {
    async fn list(&self) -> AppResult<Vec<Issue>> {
        let issues = sqlx::query_as::<_, Issue>("SELECT * FROM issues ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        Ok(issues)
    }

    async fn get_by_id(&self, id: i32) -> AppResult<Issue> {
        sqlx::query_as::<_, Issue>("SELECT * FROM issues WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Issue with id {} not found", id)))
    }

    async fn list_by_reader(&self, reader_id: i32) -> AppResult<Vec<Issue>> {
        let issues =
            sqlx::query_as::<_, Issue>("SELECT * FROM issues WHERE reader_id = $1 ORDER BY id")
                .bind(reader_id)
                .fetch_all(&self.pool)
                .await?;
        Ok(issues)
    }

    async fn create(
        &self,
        book_id: i32,
        reader_id: i32,
        max_active_per_reader: i64,
    ) -> AppResult<Issue> {
        let mut tx = self.pool.begin().await?;

        // Lock the book row, then the reader row, always in that order.
        // The locks double as existence checks inside the transaction.
        sqlx::query_scalar::<_, i32>("SELECT id FROM books WHERE id = $1 FOR UPDATE")
            .bind(book_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", book_id)))?;

        sqlx::query_scalar::<_, i32>("SELECT id FROM readers WHERE id = $1 FOR UPDATE")
            .bind(reader_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Reader with id {} not found", reader_id)))?;

        let book_out: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM issues WHERE book_id = $1 AND returned_at IS NULL)",
        )
        .bind(book_id)
        .fetch_one(&mut *tx)
        .await?;

        if book_out {
            return Err(AppError::Conflict(format!(
                "Book with id {} is already issued",
                book_id
            )));
        }

        let active: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM issues WHERE reader_id = $1 AND returned_at IS NULL",
        )
        .bind(reader_id)
        .fetch_one(&mut *tx)
        .await?;

        if active >= max_active_per_reader {
            return Err(AppError::Conflict(format!(
                "Reader with id {} has reached the issue limit ({}/{})",
                reader_id, active, max_active_per_reader
            )));
        }

        let issue = sqlx::query_as::<_, Issue>(
            "INSERT INTO issues (book_id, reader_id, issued_at) VALUES ($1, $2, $3) RETURNING *",
        )
        .bind(book_id)
        .bind(reader_id)
        .bind(Utc::now())
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(issue)
    }

    async fn mark_returned(&self, id: i32) -> AppResult<Issue> {
        // The returned_at IS NULL guard makes the update first-writer-wins;
        // losers fall through to the re-read below.
        let updated = sqlx::query_as::<_, Issue>(
            "UPDATE issues SET returned_at = $1 WHERE id = $2 AND returned_at IS NULL RETURNING *",
        )
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match updated {
            Some(issue) => Ok(issue),
            // Missing or already returned; re-reading distinguishes the two.
            None => self.get_by_id(id).await,
        }
    }
}
