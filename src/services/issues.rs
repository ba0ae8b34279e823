//! Issue (loan) management service

use crate::{
    config::LoansConfig,
    error::AppResult,
    models::issue::{CreateIssue, Issue},
    repository::{BookStore, IssueStore, ReaderStore, Repository},
};

#[derive(Clone)]
pub struct IssuesService {
    repository: Repository,
    max_active_per_reader: i64,
}

impl IssuesService {
    pub fn new(repository: Repository, loans_config: LoansConfig) -> Self {
        Self {
            repository,
            max_active_per_reader: i64::from(loans_config.max_active_per_reader),
        }
    }

    /// All issue records
    pub async fn list(&self) -> AppResult<Vec<Issue>> {
        self.repository.issues.list().await
    }

    pub async fn get_by_id(&self, id: i32) -> AppResult<Issue> {
        self.repository.issues.get_by_id(id).await
    }

    /// All issues belonging to a reader, returned ones included
    pub async fn list_by_reader(&self, reader_id: i32) -> AppResult<Vec<Issue>> {
        // Verify the reader exists
        self.repository.readers.get_by_id(reader_id).await?;
        self.repository.issues.list_by_reader(reader_id).await
    }

    /// Issue a book to a reader.
    ///
    /// The book and reader are resolved first (missing either is NotFound);
    /// the store then re-checks both together with the lending rules inside
    /// its atomic write path, refusing with Conflict when the book is already
    /// out or the reader is at the issue limit.
    pub async fn issue(&self, request: CreateIssue) -> AppResult<Issue> {
        self.repository.books.get_by_id(request.book_id).await?;
        self.repository.readers.get_by_id(request.reader_id).await?;

        let issue = self
            .repository
            .issues
            .create(
                request.book_id,
                request.reader_id,
                self.max_active_per_reader,
            )
            .await?;

        tracing::info!(
            issue_id = issue.id,
            book_id = issue.book_id,
            reader_id = issue.reader_id,
            "book issued"
        );
        Ok(issue)
    }

    /// Record the return of an issued book.
    ///
    /// Returning an already-returned issue succeeds and yields the stored
    /// record unchanged.
    pub async fn return_issue(&self, id: i32) -> AppResult<Issue> {
        let issue = self.repository.issues.mark_returned(id).await?;
        tracing::info!(issue_id = id, book_id = issue.book_id, "book returned");
        Ok(issue)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        error::AppError,
        models::{book::Book, reader::Reader},
        repository::{
            books::MockBookStore, issues::MockIssueStore, readers::MockReaderStore,
        },
    };

    struct Harness {
        repository: Repository,
        service: IssuesService,
    }

    fn harness_with_cap(cap: u32) -> Harness {
        let repository = Repository::in_memory();
        let service = IssuesService::new(
            repository.clone(),
            LoansConfig {
                max_active_per_reader: cap,
            },
        );
        Harness {
            repository,
            service,
        }
    }

    fn harness() -> Harness {
        harness_with_cap(3)
    }

    impl Harness {
        async fn book(&self, name: &str) -> i32 {
            self.repository.books.create(name).await.unwrap().id
        }

        async fn reader(&self, name: &str) -> i32 {
            self.repository.readers.create(name).await.unwrap().id
        }
    }

    #[tokio::test]
    async fn test_issue_creates_active_record() {
        let h = harness();
        let book_id = h.book("Dune").await;
        let reader_id = h.reader("Alice").await;

        let issue = h.service.issue(CreateIssue { book_id, reader_id }).await.unwrap();

        assert_eq!(issue.book_id, book_id);
        assert_eq!(issue.reader_id, reader_id);
        assert!(issue.returned_at.is_none());
        assert_eq!(h.service.get_by_id(issue.id).await.unwrap(), issue);
    }

    #[tokio::test]
    async fn test_issue_unknown_book_is_not_found_and_writes_nothing() {
        let h = harness();
        let reader_id = h.reader("Alice").await;

        let err = h
            .service
            .issue(CreateIssue {
                book_id: 999,
                reader_id,
            })
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::NotFound(_)));
        assert!(h.service.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_issue_unknown_reader_is_not_found_and_writes_nothing() {
        let h = harness();
        let book_id = h.book("Dune").await;

        let err = h
            .service
            .issue(CreateIssue {
                book_id,
                reader_id: 999,
            })
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::NotFound(_)));
        assert!(h.service.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_issuing_a_book_that_is_out_is_a_conflict() {
        let h = harness();
        let book_id = h.book("Dune").await;
        let alice = h.reader("Alice").await;
        let bob = h.reader("Bob").await;

        h.service
            .issue(CreateIssue {
                book_id,
                reader_id: alice,
            })
            .await
            .unwrap();

        let err = h
            .service
            .issue(CreateIssue {
                book_id,
                reader_id: bob,
            })
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Conflict(_)));
        assert_eq!(h.service.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_reader_at_issue_limit_is_refused() {
        let h = harness_with_cap(2);
        let reader_id = h.reader("Alice").await;
        let first = h.book("Dune").await;
        let second = h.book("Hyperion").await;
        let third = h.book("Solaris").await;

        for book_id in [first, second] {
            h.service.issue(CreateIssue { book_id, reader_id }).await.unwrap();
        }

        let err = h
            .service
            .issue(CreateIssue {
                book_id: third,
                reader_id,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_returned_issues_do_not_count_toward_the_limit() {
        let h = harness_with_cap(1);
        let reader_id = h.reader("Alice").await;
        let first = h.book("Dune").await;
        let second = h.book("Hyperion").await;

        let issue = h
            .service
            .issue(CreateIssue {
                book_id: first,
                reader_id,
            })
            .await
            .unwrap();
        h.service.return_issue(issue.id).await.unwrap();

        h.service
            .issue(CreateIssue {
                book_id: second,
                reader_id,
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_returned_book_can_be_issued_again() {
        let h = harness();
        let book_id = h.book("Dune").await;
        let alice = h.reader("Alice").await;
        let bob = h.reader("Bob").await;

        let issue = h
            .service
            .issue(CreateIssue {
                book_id,
                reader_id: alice,
            })
            .await
            .unwrap();
        h.service.return_issue(issue.id).await.unwrap();

        let again = h
            .service
            .issue(CreateIssue {
                book_id,
                reader_id: bob,
            })
            .await
            .unwrap();
        assert_eq!(again.book_id, book_id);
    }

    #[tokio::test]
    async fn test_return_sets_returned_at_and_keeps_issued_at() {
        let h = harness();
        let book_id = h.book("Dune").await;
        let reader_id = h.reader("Alice").await;

        let issue = h.service.issue(CreateIssue { book_id, reader_id }).await.unwrap();
        let returned = h.service.return_issue(issue.id).await.unwrap();

        assert!(returned.returned_at.is_some());
        assert_eq!(returned.issued_at, issue.issued_at);
    }

    #[tokio::test]
    async fn test_return_is_idempotent() {
        let h = harness();
        let book_id = h.book("Dune").await;
        let reader_id = h.reader("Alice").await;

        let issue = h.service.issue(CreateIssue { book_id, reader_id }).await.unwrap();
        let first = h.service.return_issue(issue.id).await.unwrap();
        let second = h.service.return_issue(issue.id).await.unwrap();

        assert_eq!(second, first);
    }

    #[tokio::test]
    async fn test_return_unknown_issue_is_not_found() {
        let err = harness().service.return_issue(42).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_list_by_reader_filters_exactly() {
        let h = harness();
        let alice = h.reader("Alice").await;
        let bob = h.reader("Bob").await;
        let mut alice_issues = Vec::new();
        for (name, reader_id) in [
            ("Dune", alice),
            ("Hyperion", bob),
            ("Solaris", alice),
            ("Ubik", bob),
        ] {
            let book_id = h.book(name).await;
            let issue = h.service.issue(CreateIssue { book_id, reader_id }).await.unwrap();
            if reader_id == alice {
                alice_issues.push(issue);
            }
        }

        let listed = h.service.list_by_reader(alice).await.unwrap();
        assert_eq!(listed, alice_issues);
    }

    #[tokio::test]
    async fn test_list_by_reader_unknown_reader_is_not_found() {
        let err = harness().service.list_by_reader(999).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_issue_resolves_book_before_reader() {
        // With the book missing, the reader store must not be consulted.
        let mut books = MockBookStore::new();
        books
            .expect_get_by_id()
            .returning(|id| Err(AppError::NotFound(format!("Book with id {} not found", id))));

        let mut readers = MockReaderStore::new();
        readers.expect_get_by_id().never();

        let mut issues = MockIssueStore::new();
        issues.expect_create().never();

        let repository = Repository {
            books: Arc::new(books),
            readers: Arc::new(readers),
            issues: Arc::new(issues),
        };
        let service = IssuesService::new(repository, LoansConfig::default());

        let err = service
            .issue(CreateIssue {
                book_id: 1,
                reader_id: 1,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_issue_passes_configured_limit_to_store() {
        let mut books = MockBookStore::new();
        books.expect_get_by_id().returning(|id| {
            Ok(Book {
                id,
                name: "Dune".to_string(),
            })
        });

        let mut readers = MockReaderStore::new();
        readers.expect_get_by_id().returning(|id| {
            Ok(Reader {
                id,
                name: "Alice".to_string(),
            })
        });

        let mut issues = MockIssueStore::new();
        issues
            .expect_create()
            .withf(|_, _, cap| *cap == 5)
            .returning(|book_id, reader_id, _| {
                Ok(Issue {
                    id: 1,
                    book_id,
                    reader_id,
                    issued_at: chrono::Utc::now(),
                    returned_at: None,
                })
            });

        let repository = Repository {
            books: Arc::new(books),
            readers: Arc::new(readers),
            issues: Arc::new(issues),
        };
        let service = IssuesService::new(
            repository,
            LoansConfig {
                max_active_per_reader: 5,
            },
        );

        service
            .issue(CreateIssue {
                book_id: 1,
                reader_id: 1,
            })
            .await
            .unwrap();
    }
}
