//! Issue (loan) model and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A record of a book being loaned to a reader.
///
/// `book_id` and `reader_id` are soft references: deleting a book or a reader
/// leaves historical issues intact. `returned_at`, once set, is never cleared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Issue {
    pub id: i32,
    pub book_id: i32,
    pub reader_id: i32,
    pub issued_at: DateTime<Utc>,
    pub returned_at: Option<DateTime<Utc>>,
}

impl Issue {
    /// An issue is active until the book comes back.
    pub fn is_active(&self) -> bool {
        self.returned_at.is_none()
    }
}

/// Create issue request
#[derive(Debug, Deserialize)]
pub struct CreateIssue {
    pub book_id: i32,
    pub reader_id: i32,
}
