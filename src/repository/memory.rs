//! In-memory storage backend
//!
//! Backs the unit tests with the same store traits the Postgres backend
//! implements. All three entity stores share one mutex, so every
//! check-then-write path is atomic by construction.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;

use crate::{
    error::{AppError, AppResult},
    models::{book::Book, issue::Issue, reader::Reader},
};

use super::{BookStore, IssueStore, ReaderStore};

#[derive(Default)]
struct MemDb {
    books: BTreeMap<i32, Book>,
    readers: BTreeMap<i32, Reader>,
    issues: BTreeMap<i32, Issue>,
    next_book_id: i32,
    next_reader_id: i32,
    next_issue_id: i32,
}

/// Map-backed store implementing all three entity store traits
#[derive(Clone, Default)]
pub struct MemoryBackend {
    db: Arc<Mutex<MemDb>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemDb> {
        // A poisoned lock means a panic mid-write; tests should see it too.
        self.db.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl BookStore for MemoryBackend {
    async fn list(&self) -> AppResult<Vec<Book>> {
        Ok(self.lock().books.values().cloned().collect())
    }

    async fn get_by_id(&self, id: i32) -> AppResult<Book> {
        self.lock()
            .books
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))
    }

    async fn create(&self, name: &str) -> AppResult<Book> {
        let mut db = self.lock();
        db.next_book_id += 1;
        let book = Book {
            id: db.next_book_id,
            name: name.to_string(),
        };
        db.books.insert(book.id, book.clone());
        Ok(book)
    }

    async fn delete(&self, id: i32) -> AppResult<Book> {
        self.lock()
            .books
            .remove(&id)
            .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))
    }
}

#[async_trait]
impl ReaderStore for MemoryBackend {
    async fn list(&self) -> AppResult<Vec<Reader>> {
        Ok(self.lock().readers.values().cloned().collect())
    }

    async fn get_by_id(&self, id: i32) -> AppResult<Reader> {
        self.lock()
            .readers
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Reader with id {} not found", id)))
    }

    async fn find_by_name(&self, name: &str) -> AppResult<Option<Reader>> {
        Ok(self
            .lock()
            .readers
            .values()
            .find(|r| r.name == name)
            .cloned())
    }

    async fn create(&self, name: &str) -> AppResult<Reader> {
        let mut db = self.lock();
        if db.readers.values().any(|r| r.name == name) {
            return Err(AppError::Validation(format!(
                "Reader \"{}\" already exists",
                name
            )));
        }
        db.next_reader_id += 1;
        let reader = Reader {
            id: db.next_reader_id,
            name: name.to_string(),
        };
        db.readers.insert(reader.id, reader.clone());
        Ok(reader)
    }

    async fn delete(&self, id: i32) -> AppResult<Reader> {
        self.lock()
            .readers
            .remove(&id)
            .ok_or_else(|| AppError::NotFound(format!("Reader with id {} not found", id)))
    }
}

#[async_trait]
impl IssueStore for MemoryBackend {
    async fn list(&self) -> AppResult<Vec<Issue>> {
        Ok(self.lock().issues.values().cloned().collect())
    }

    async fn get_by_id(&self, id: i32) -> AppResult<Issue> {
        self.lock()
            .issues
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Issue with id {} not found", id)))
    }

    async fn list_by_reader(&self, reader_id: i32) -> AppResult<Vec<Issue>> {
        Ok(self
            .lock()
            .issues
            .values()
            .filter(|i| i.reader_id == reader_id)
            .cloned()
            .collect())
    }

    async fn create(
        &self,
        book_id: i32,
        reader_id: i32,
        max_active_per_reader: i64,
    ) -> AppResult<Issue> {
        let mut db = self.lock();

        if !db.books.contains_key(&book_id) {
            return Err(AppError::NotFound(format!(
                "Book with id {} not found",
                book_id
            )));
        }
        if !db.readers.contains_key(&reader_id) {
            return Err(AppError::NotFound(format!(
                "Reader with id {} not found",
                reader_id
            )));
        }

        if db
            .issues
            .values()
            .any(|i| i.book_id == book_id && i.is_active())
        {
            return Err(AppError::Conflict(format!(
                "Book with id {} is already issued",
                book_id
            )));
        }

        let active = db
            .issues
            .values()
            .filter(|i| i.reader_id == reader_id && i.is_active())
            .count() as i64;
        if active >= max_active_per_reader {
            return Err(AppError::Conflict(format!(
                "Reader with id {} has reached the issue limit ({}/{})",
                reader_id, active, max_active_per_reader
            )));
        }

        db.next_issue_id += 1;
        let issue = Issue {
            id: db.next_issue_id,
            book_id,
            reader_id,
            issued_at: Utc::now(),
            returned_at: None,
        };
        db.issues.insert(issue.id, issue.clone());
        Ok(issue)
    }

    async fn mark_returned(&self, id: i32) -> AppResult<Issue> {
        let mut db = self.lock();
        let issue = db
            .issues
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("Issue with id {} not found", id)))?;
        if issue.returned_at.is_none() {
            issue.returned_at = Some(Utc::now());
        }
        Ok(issue.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_ids_keep_ascending_after_delete() {
        let backend = MemoryBackend::new();
        let first = BookStore::create(&backend, "Dune").await.unwrap();
        BookStore::delete(&backend, first.id).await.unwrap();
        let second = BookStore::create(&backend, "Hyperion").await.unwrap();
        assert!(second.id > first.id);
    }

    #[tokio::test]
    async fn test_list_is_in_insertion_order() {
        let backend = MemoryBackend::new();
        for name in ["a", "b", "c"] {
            ReaderStore::create(&backend, name).await.unwrap();
        }
        let names: Vec<String> = ReaderStore::list(&backend)
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.name)
            .collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }
}
