//! Book management service

use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::book::{Book, CreateBook},
    repository::{BookStore, Repository},
};

#[derive(Clone)]
pub struct BooksService {
    repository: Repository,
}

impl BooksService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// All books in insertion order
    pub async fn list(&self) -> AppResult<Vec<Book>> {
        self.repository.books.list().await
    }

    pub async fn get_by_id(&self, id: i32) -> AppResult<Book> {
        self.repository.books.get_by_id(id).await
    }

    /// Register a new book
    pub async fn create(&self, request: CreateBook) -> AppResult<Book> {
        request
            .validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;
        if request.name.trim().is_empty() {
            return Err(AppError::Validation("name must not be blank".to_string()));
        }

        let book = self.repository.books.create(&request.name).await?;
        tracing::info!(book_id = book.id, "book added: {}", book.name);
        Ok(book)
    }

    /// Remove a book and return the deleted record. Historical issues
    /// referencing it are kept.
    pub async fn delete(&self, id: i32) -> AppResult<Book> {
        let book = self.repository.books.delete(id).await?;
        tracing::info!(book_id = id, "book deleted: {}", book.name);
        Ok(book)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> BooksService {
        BooksService::new(Repository::in_memory())
    }

    fn create_request(name: &str) -> CreateBook {
        CreateBook {
            name: name.to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_then_get_returns_book_with_fresh_id() {
        let service = service();

        let created = service.create(create_request("Dune")).await.unwrap();
        let fetched = service.get_by_id(created.id).await.unwrap();

        assert_eq!(fetched.name, "Dune");
        assert_eq!(fetched, created);
    }

    #[tokio::test]
    async fn test_create_rejects_empty_name() {
        let service = service();

        let err = service.create(create_request("")).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert!(service.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_rejects_blank_name() {
        let service = service();

        let err = service.create(create_request("   ")).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_delete_then_get_is_not_found() {
        let service = service();
        let book = service.create(create_request("Dune")).await.unwrap();

        let deleted = service.delete(book.id).await.unwrap();
        assert_eq!(deleted, book);

        let err = service.get_by_id(book.id).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_delete_missing_is_not_found() {
        let err = service().delete(7).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_list_preserves_insertion_order() {
        let service = service();
        for name in ["Dune", "Hyperion", "Solaris"] {
            service.create(create_request(name)).await.unwrap();
        }

        let names: Vec<String> = service
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|b| b.name)
            .collect();
        assert_eq!(names, vec!["Dune", "Hyperion", "Solaris"]);
    }
}
