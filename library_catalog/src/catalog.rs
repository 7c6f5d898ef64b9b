use crate::api::{BookRecord, SearchField};

/// In-memory snapshot of the whole catalog table, kept in storage order
#[derive(Debug, Default, Clone, Eq, PartialEq)]
pub struct Catalog {
    records: Vec<BookRecord>,
}

impl Catalog {
    pub fn new(records: Vec<BookRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[BookRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<BookRecord> {
        self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn find_book(&self, book_id: &str) -> Option<&BookRecord> {
        self.records.iter().find(|record| record.book_id == book_id)
    }

    pub fn find_book_mut(&mut self, book_id: &str) -> Option<&mut BookRecord> {
        self.records
            .iter_mut()
            .find(|record| record.book_id == book_id)
    }

    /// Returns true if the id appears as a borrower of any record in the snapshot
    pub fn is_registered_borrower(&self, borrower_id: &str) -> bool {
        !borrower_id.is_empty()
            && self
                .records
                .iter()
                .any(|record| record.borrower_id.as_deref() == Some(borrower_id))
    }

    /// Positions of the records currently issued to the borrower
    pub fn positions_issued_to<'a>(
        &'a self,
        borrower_id: &'a str,
    ) -> impl Iterator<Item = usize> + 'a {
        self.records
            .iter()
            .enumerate()
            .filter(move |(_, record)| record.is_issued_to(borrower_id))
            .map(|(position, _)| position)
    }

    /// Case-insensitive substring search restricted to one field
    pub fn search(&self, query: &str, field: SearchField) -> Vec<BookRecord> {
        let query = query.to_lowercase();
        self.records
            .iter()
            .filter(|record| field.value_of(record).to_lowercase().contains(&query))
            .cloned()
            .collect()
    }

    /// Same as [`Catalog::search`] but takes the field label shown to users,
    /// unknown labels match nothing
    pub fn search_by_label(&self, query: &str, label: &str) -> Vec<BookRecord> {
        match label.parse::<SearchField>() {
            Ok(field) => self.search(query, field),
            Err(err) => {
                tracing::debug!("{}", err);
                vec![]
            }
        }
    }
}
