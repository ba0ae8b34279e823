//! Reader management service

use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::reader::{CreateReader, Reader},
    repository::{ReaderStore, Repository},
};

#[derive(Clone)]
pub struct ReadersService {
    repository: Repository,
}

impl ReadersService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// All readers in insertion order
    pub async fn list(&self) -> AppResult<Vec<Reader>> {
        self.repository.readers.list().await
    }

    pub async fn get_by_id(&self, id: i32) -> AppResult<Reader> {
        self.repository.readers.get_by_id(id).await
    }

    /// Register a new reader. Names are matched exactly, case-sensitive.
    pub async fn create(&self, request: CreateReader) -> AppResult<Reader> {
        request
            .validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;
        if request.name.trim().is_empty() {
            return Err(AppError::Validation("name must not be blank".to_string()));
        }

        if self
            .repository
            .readers
            .find_by_name(&request.name)
            .await?
            .is_some()
        {
            return Err(AppError::Validation(format!(
                "Reader \"{}\" already exists",
                request.name
            )));
        }

        // The store enforces uniqueness again on write, so a concurrent
        // registration slipping past the lookup still fails cleanly.
        let reader = self.repository.readers.create(&request.name).await?;
        tracing::info!(reader_id = reader.id, "reader registered: {}", reader.name);
        Ok(reader)
    }

    /// Remove a reader and return the deleted record. Historical issues
    /// referencing them are kept.
    pub async fn delete(&self, id: i32) -> AppResult<Reader> {
        let reader = self.repository.readers.delete(id).await?;
        tracing::info!(reader_id = id, "reader deleted: {}", reader.name);
        Ok(reader)
    }
}
