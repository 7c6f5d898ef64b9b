use std::collections::HashSet;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use tokio::io::AsyncWriteExt;

pub use csv_catalog_storage::CsvCatalogStorage;
pub use in_memory_catalog_storage::InMemoryCatalogStorage;
pub use xlsx_catalog_storage::{XlsxCatalogStorage, DEFAULT_SHEET_NAME};

use crate::api::{BookId, BookRecord};

mod csv_catalog_storage;
mod in_memory_catalog_storage;
mod xlsx_catalog_storage;

#[derive(thiserror::Error, Debug)]
pub enum CatalogStorageError {
    #[error("Catalog file failure {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to process catalog table: {0}")]
    Csv(#[from] csv::Error),

    #[error("Failed to read catalog workbook: {0}")]
    WorkbookRead(#[from] calamine::XlsxError),

    #[error("Failed to write catalog workbook: {0}")]
    WorkbookWrite(#[from] rust_xlsxwriter::XlsxError),

    #[error("Catalog workbook has no sheet {0}")]
    MissingSheet(String),

    #[error("Catalog table has no column {0}")]
    MissingColumn(String),

    #[error("Row {row} has invalid {column} value {value:?}")]
    InvalidCell {
        row: usize,
        column: &'static str,
        value: String,
    },

    #[error("Book {0} appears more than once in the catalog")]
    DuplicateBookId(BookId),

    #[error("Book {0} has availability and borrower out of sync")]
    InconsistentRecord(BookId),
}

#[async_trait::async_trait]
pub trait CatalogStorage: Send + Sync {
    /// Reads the whole catalog table, in storage order
    async fn load(&self) -> Result<Vec<BookRecord>, CatalogStorageError>;
    /// Replaces the whole persisted table with given records
    async fn save(&self, records: &[BookRecord]) -> Result<(), CatalogStorageError>;
}

/// Rejects snapshots breaking the record invariants (unique ids, borrower iff issued)
pub fn validate_records(records: &[BookRecord]) -> Result<(), CatalogStorageError> {
    let mut seen: HashSet<&str> = HashSet::with_capacity(records.len());
    for record in records {
        if !seen.insert(record.book_id.as_str()) {
            return Err(CatalogStorageError::DuplicateBookId(record.book_id.clone()));
        }
        if !record.is_consistent() {
            return Err(CatalogStorageError::InconsistentRecord(
                record.book_id.clone(),
            ));
        }
    }
    Ok(())
}

/// Sibling `<file>.tmp` used while a save is in flight
pub(crate) fn temporary_path(path: &Path) -> PathBuf {
    let mut name: OsString = path.to_path_buf().into_os_string();
    name.push(".tmp");
    PathBuf::from(name)
}

async fn write_and_swap(path: &Path, temporary: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = tokio::fs::File::create(temporary).await?;
    file.write_all(bytes).await?;
    file.sync_all().await?;
    drop(file);
    tokio::fs::rename(temporary, path).await
}

/// Writes the rendered table next to `path` and renames it over the catalog file,
/// an interrupted save leaves the previous file intact
pub(crate) async fn replace_file(path: &Path, bytes: &[u8]) -> Result<(), CatalogStorageError> {
    let temporary = temporary_path(path);
    if let Err(err) = write_and_swap(path, &temporary, bytes).await {
        tracing::error!("Failed to save catalog to {}: {}", path.display(), err);
        if let Err(cleanup_err) = tokio::fs::remove_file(&temporary).await {
            tracing::debug!(
                "Could not remove {}: {}",
                temporary.display(),
                cleanup_err
            );
        }
        return Err(err.into());
    }
    Ok(())
}

#[cfg(test)]
mod validation_tests {
    use super::*;
    use crate::api::Availability;

    #[test]
    fn duplicates_and_inconsistent_records_are_rejected() {
        let b1 = BookRecord::available("B1", "t", "a", "g");
        assert!(validate_records(&[b1.clone()]).is_ok());

        assert!(matches!(
            validate_records(&[b1.clone(), b1.clone()]),
            Err(CatalogStorageError::DuplicateBookId(id)) if id == "B1"
        ));

        let issued_without_borrower = BookRecord {
            availability: Availability::Issued,
            ..BookRecord::available("B2", "t", "a", "g")
        };
        assert!(matches!(
            validate_records(&[b1, issued_without_borrower]),
            Err(CatalogStorageError::InconsistentRecord(id)) if id == "B2"
        ));
    }

    #[tokio::test]
    async fn failed_save_leaves_no_temporary_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing_dir").join("catalog.csv");

        let result = replace_file(&path, b"Book ID").await;
        assert!(matches!(result, Err(CatalogStorageError::Io(..))));
        assert!(!temporary_path(&path).exists());
    }
}
