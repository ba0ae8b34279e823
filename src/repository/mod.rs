//! Repository layer for storage operations
//!
//! Each entity is accessed through a store trait so the services can run
//! against Postgres in production and the in-memory backend in tests.

pub mod books;
pub mod issues;
pub mod memory;
pub mod readers;

use std::sync::Arc;

use sqlx::{Pool, Postgres};

pub use books::BookStore;
pub use issues::IssueStore;
pub use readers::ReaderStore;

/// Main repository struct holding the per-entity stores
#[derive(Clone)]
pub struct Repository {
    pub books: Arc<dyn BookStore>,
    pub readers: Arc<dyn ReaderStore>,
    pub issues: Arc<dyn IssueStore>,
}

impl Repository {
    /// Create a Postgres-backed repository with the given connection pool
    pub fn postgres(pool: Pool<Postgres>) -> Self {
        Self {
            books: Arc::new(books::PgBookStore::new(pool.clone())),
            readers: Arc::new(readers::PgReaderStore::new(pool.clone())),
            issues: Arc::new(issues::PgIssueStore::new(pool)),
        }
    }

    /// Create an in-memory repository, used by unit tests
    pub fn in_memory() -> Self {
        let backend = memory::MemoryBackend::new();
        Self {
            books: Arc::new(backend.clone()),
            readers: Arc::new(backend.clone()),
            issues: Arc::new(backend),
        }
    }
}
