use itertools::Itertools;

use library_catalog::api::BookRecord;
use library_catalog::catalog::Catalog;

use crate::genre_index::GenreIndex;

pub const NO_OF_RECOMMENDATIONS: usize = 5;
const SIMILAR_BOOKS_PER_ISSUED_BOOK: usize = 5;
const DEFAULT_LARGE_CATALOG_WARNING: usize = 5000;

/// Recommends available books whose genre is close to the genres of the books
/// the borrower has currently issued
pub struct RecommendationsEngine {
    large_catalog_warning: usize,
}

impl Default for RecommendationsEngine {
    fn default() -> Self {
        Self {
            large_catalog_warning: DEFAULT_LARGE_CATALOG_WARNING,
        }
    }
}

impl RecommendationsEngine {
    /// Catalog size above which every recommendation logs a warning, the
    /// similarity matrix is rebuilt per call and grows quadratically
    pub fn with_large_catalog_warning(mut self, number_of_books: usize) -> Self {
        self.large_catalog_warning = number_of_books;
        self
    }

    pub fn recommend(&self, catalog: &Catalog, borrower_id: &str) -> Vec<BookRecord> {
        let borrower_positions = catalog.positions_issued_to(borrower_id).collect_vec();
        if borrower_positions.is_empty() {
            tracing::debug!("Borrower {} has no issued books", borrower_id);
            return vec![];
        }

        let records = catalog.records();
        if records.len() > self.large_catalog_warning {
            tracing::warn!(
                "Building a {0}x{0} genre similarity matrix for one recommendation",
                records.len()
            );
        }

        let index = GenreIndex::build(records.iter().map(|record| record.genre.as_str()));
        let similarities = index.similarity_matrix();

        let recommendations = borrower_positions
            .iter()
            .flat_map(|&position| {
                similarities.most_similar(position, SIMILAR_BOOKS_PER_ISSUED_BOOK)
            })
            .map(|(position, _)| &records[position])
            .filter(|record| record.is_available())
            .unique_by(|record| record.book_id.as_str())
            .take(NO_OF_RECOMMENDATIONS)
            .cloned()
            .collect_vec();

        tracing::info!(
            "Recommending {} books to {} based on {} issued",
            recommendations.len(),
            borrower_id,
            borrower_positions.len()
        );
        recommendations
    }
}
