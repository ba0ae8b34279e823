//! Business logic services

pub mod books;
pub mod issues;
pub mod readers;

use crate::{config::LoansConfig, repository::Repository};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub books: books::BooksService,
    pub readers: readers::ReadersService,
    pub issues: issues::IssuesService,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(repository: Repository, loans_config: LoansConfig) -> Self {
        Self {
            books: books::BooksService::new(repository.clone()),
            readers: readers::ReadersService::new(repository.clone()),
            issues: issues::IssuesService::new(repository, loans_config),
        }
    }
}
