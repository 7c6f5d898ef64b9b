use std::sync::atomic::{AtomicUsize, Ordering};

use crate::api::BookRecord;
use crate::catalog_storage::{CatalogStorage, CatalogStorageError};

/// Catalog storage kept in process memory, counts saves so callers can check
/// that every mutation was flushed
#[derive(Default)]
pub struct InMemoryCatalogStorage {
    records: parking_lot::RwLock<Vec<BookRecord>>,
    save_counter: AtomicUsize,
}

impl InMemoryCatalogStorage {
    pub fn new(records: Vec<BookRecord>) -> Self {
        Self {
            records: parking_lot::RwLock::new(records),
            save_counter: Default::default(),
        }
    }

    pub fn saved_records(&self) -> Vec<BookRecord> {
        self.records.read().clone()
    }

    pub fn number_of_saves(&self) -> usize {
        self.save_counter.load(Ordering::Relaxed)
    }
}

#[async_trait::async_trait]
impl CatalogStorage for InMemoryCatalogStorage {
    async fn load(&self) -> Result<Vec<BookRecord>, CatalogStorageError> {
        Ok(self.records.read().clone())
    }

    async fn save(&self, records: &[BookRecord]) -> Result<(), CatalogStorageError> {
        *self.records.write() = records.to_vec();
        self.save_counter.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}
