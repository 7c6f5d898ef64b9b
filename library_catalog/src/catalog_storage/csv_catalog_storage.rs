use std::path::{Path, PathBuf};

use crate::api::{BookRecord, CATALOG_COLUMNS};
use crate::catalog_storage::{replace_file, validate_records, CatalogStorage, CatalogStorageError};

/// Catalog table kept in a plain CSV file, the header row names the columns
pub struct CsvCatalogStorage {
    path: PathBuf,
}

impl CsvCatalogStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn parse(bytes: &[u8]) -> Result<Vec<BookRecord>, CatalogStorageError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_reader(bytes);

        let headers = reader.headers()?.clone();
        if let Some(missing) = CATALOG_COLUMNS
            .iter()
            .find(|column| !headers.iter().any(|header| header == **column))
        {
            return Err(CatalogStorageError::MissingColumn(missing.to_string()));
        }

        let records = reader
            .deserialize::<BookRecord>()
            .collect::<Result<Vec<_>, _>>()?;
        validate_records(&records)?;
        Ok(records)
    }

    fn render(records: &[BookRecord]) -> Result<Vec<u8>, CatalogStorageError> {
        // Header is written by hand so that an empty catalog still has one
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(vec![]);
        writer.write_record(CATALOG_COLUMNS)?;
        for record in records {
            writer.serialize(record)?;
        }
        writer
            .into_inner()
            .map_err(|err| CatalogStorageError::Io(err.into_error()))
    }
}

#[async_trait::async_trait]
impl CatalogStorage for CsvCatalogStorage {
    async fn load(&self) -> Result<Vec<BookRecord>, CatalogStorageError> {
        let bytes = tokio::fs::read(&self.path).await?;
        let records = Self::parse(&bytes)?;
        tracing::info!(
            "Loaded {} catalog records from {}",
            records.len(),
            self.path.display()
        );
        Ok(records)
    }

    async fn save(&self, records: &[BookRecord]) -> Result<(), CatalogStorageError> {
        let bytes = Self::render(records)?;
        replace_file(&self.path, &bytes).await?;
        tracing::debug!(
            "Saved {} catalog records to {}",
            records.len(),
            self.path.display()
        );
        Ok(())
    }
}
