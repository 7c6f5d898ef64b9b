use std::sync::Arc;

use chrono::NaiveDate;

use library_catalog::api::{Availability, BookRecord, SearchField};
use library_catalog::catalog::Catalog;
use library_catalog::catalog_storage::{CatalogStorage, CatalogStorageError};

use crate::api::{BookId, BorrowerId, IssueReceipt, ReturnReceipt};

#[derive(Debug, thiserror::Error)]
pub enum CirculationError {
    #[error("Book {0} not found")]
    NotFound(BookId),

    #[error("Book {0} already issued")]
    AlreadyIssued(BookId),

    #[error("Book {0} is not issued to this borrower")]
    NotYourBook(BookId),

    #[error("Borrower {0} not found")]
    AuthFailure(BorrowerId),

    #[error("Catalog storage failure {0}")]
    Storage(#[from] CatalogStorageError),
}

/// Owns the catalog snapshot and flushes it to storage after every issue or return.
///
/// Mutations are applied to a copy of the catalog, persisted, and only then
/// swapped in, so a failed save leaves memory and storage at the previous state.
pub struct CirculationDesk {
    catalog: parking_lot::RwLock<Catalog>,
    storage: Arc<dyn CatalogStorage>,
}

impl CirculationDesk {
    /// Loads the whole catalog from storage
    pub async fn open(storage: Arc<dyn CatalogStorage>) -> Result<Self, CirculationError> {
        let records = storage.load().await?;
        Ok(Self {
            catalog: parking_lot::RwLock::new(Catalog::new(records)),
            storage,
        })
    }

    /// Copy of the current catalog
    pub fn snapshot(&self) -> Catalog {
        self.catalog.read().clone()
    }

    pub fn is_registered_borrower(&self, borrower_id: &str) -> bool {
        self.catalog.read().is_registered_borrower(borrower_id)
    }

    /// Login check, the borrower must appear in the catalog
    pub fn authenticate(&self, borrower_id: &str) -> Result<BorrowerId, CirculationError> {
        if self.is_registered_borrower(borrower_id) {
            tracing::info!("Borrower {} logged in", borrower_id);
            Ok(borrower_id.to_string())
        } else {
            tracing::warn!("Rejected login of unknown borrower {}", borrower_id);
            Err(CirculationError::AuthFailure(borrower_id.to_string()))
        }
    }

    pub fn search(&self, query: &str, field: SearchField) -> Vec<BookRecord> {
        let result = self.catalog.read().search(query, field);
        tracing::debug!("Search {} for {:?} found {}", field, query, result.len());
        result
    }

    pub fn search_by_label(&self, query: &str, label: &str) -> Vec<BookRecord> {
        self.catalog.read().search_by_label(query, label)
    }

    /// Issues the book to the borrower with today's local date
    pub async fn issue_book(
        &self,
        book_id: &str,
        borrower_id: &str,
    ) -> Result<IssueReceipt, CirculationError> {
        self.issue_book_on(book_id, borrower_id, chrono::Local::now().date_naive())
            .await
    }

    pub async fn issue_book_on(
        &self,
        book_id: &str,
        borrower_id: &str,
        issued_on: NaiveDate,
    ) -> Result<IssueReceipt, CirculationError> {
        // a blank borrower cell reads back as absent, the saved table would not load
        if borrower_id.trim().is_empty() {
            tracing::warn!("Refused to issue book {} without a borrower", book_id);
            return Err(CirculationError::AuthFailure(borrower_id.to_string()));
        }

        let mut updated = self.snapshot();
        let record = updated
            .find_book_mut(book_id)
            .ok_or_else(|| CirculationError::NotFound(book_id.to_string()))?;

        if record.availability == Availability::Issued {
            tracing::warn!("Book {} is already issued, cannot issue it again", book_id);
            return Err(CirculationError::AlreadyIssued(book_id.to_string()));
        }

        record.availability = Availability::Issued;
        record.borrower_id = Some(borrower_id.to_string());
        record.last_issued_date = Some(issued_on);
        record.issued_times = record.issued_times.saturating_add(1);

        let receipt = IssueReceipt {
            book_id: record.book_id.clone(),
            title: record.title.clone(),
            borrower_id: borrower_id.to_string(),
            issued_on,
        };

        self.commit(updated).await?;
        tracing::info!("Issued book {} to {}", book_id, borrower_id);
        Ok(receipt)
    }

    /// Returns the book, only the borrower it is issued to can do that
    pub async fn return_book(
        &self,
        book_id: &str,
        borrower_id: &str,
    ) -> Result<ReturnReceipt, CirculationError> {
        let mut updated = self.snapshot();
        let record = match updated.find_book_mut(book_id) {
            Some(record) if record.is_issued_to(borrower_id) => record,
            _ => {
                tracing::warn!("Book {} is not issued to {}", book_id, borrower_id);
                return Err(CirculationError::NotYourBook(book_id.to_string()));
            }
        };

        record.availability = Availability::Available;
        record.borrower_id = None;

        let receipt = ReturnReceipt {
            book_id: record.book_id.clone(),
            title: record.title.clone(),
            borrower_id: borrower_id.to_string(),
        };

        self.commit(updated).await?;
        tracing::info!("Book {} returned by {}", book_id, borrower_id);
        Ok(receipt)
    }

    async fn commit(&self, updated: Catalog) -> Result<(), CirculationError> {
        if let Err(err) = self.storage.save(updated.records()).await {
            tracing::error!("Catalog was not saved, change dropped: {}", err);
            return Err(err.into());
        }
        *self.catalog.write() = updated;
        Ok(())
    }
}
