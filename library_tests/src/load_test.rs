use std::collections::HashSet;
use std::sync::Arc;

use rand::prelude::SliceRandom;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use library_catalog::api::BookRecord;
use library_catalog::catalog_storage::{CatalogStorage, CsvCatalogStorage};
use library_circulation::circulation_desk::{CirculationDesk, CirculationError};
use library_recommendations::recommendations::{RecommendationsEngine, NO_OF_RECOMMENDATIONS};

const GENRE_WORDS: [&str; 12] = [
    "Fantasy", "Science", "Fiction", "Horror", "Romance", "History", "Poetry", "Mystery",
    "Thriller", "Biography", "Cooking", "Travel",
];

fn generate_books(rng: &mut StdRng, no_of_books: usize) -> Vec<BookRecord> {
    (0..no_of_books)
        .map(|i| {
            let no_of_words = rng.gen_range(0..=3);
            let genre = GENRE_WORDS
                .choose_multiple(rng, no_of_words)
                .cloned()
                .collect::<Vec<_>>()
                .join(" ");
            BookRecord::available(
                &format!("BK{i:04}"),
                &format!("Title {i}"),
                &format!("Author {}", i % 37),
                &genre,
            )
        })
        .collect()
}

#[tokio::test]
/// Generates a catalog with random genres, issues random books to random
/// borrowers through a file backed desk, then checks every borrower's
/// recommendations
async fn random_catalog_keeps_recommendation_guarantees() {
    const NO_OF_BOOKS_TO_GENERATE: usize = 300;
    const NO_OF_BORROWERS: usize = 25;
    const NO_OF_ISSUES: usize = 200;

    let mut rng = StdRng::seed_from_u64(15);
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("catalog.csv");
    let storage = Arc::new(CsvCatalogStorage::new(&path));
    storage
        .save(&generate_books(&mut rng, NO_OF_BOOKS_TO_GENERATE))
        .await
        .expect("Failed to write catalog");

    let desk = CirculationDesk::open(storage.clone()).await.unwrap();
    let borrowers: Vec<String> = (0..NO_OF_BORROWERS).map(|i| format!("U{i}")).collect();

    let mut issued = 0;
    for _ in 0..NO_OF_ISSUES {
        let book_id = format!("BK{:04}", rng.gen_range(0..NO_OF_BOOKS_TO_GENERATE));
        let borrower_id = borrowers.choose(&mut rng).unwrap();
        match desk.issue_book(&book_id, borrower_id).await {
            Ok(_) => issued += 1,
            Err(CirculationError::AlreadyIssued(_)) => {}
            Err(err) => panic!("Unexpected issue failure {err}"),
        }
    }
    assert!(issued > 0);

    let catalog = desk.snapshot();
    assert_eq!(storage.load().await.unwrap(), catalog.records().to_vec());

    let mut all_borrowers = borrowers.clone();
    all_borrowers.push("nobody".to_string());

    let engine = RecommendationsEngine::default();
    for borrower_id in all_borrowers.iter() {
        let recommendations = engine.recommend(&catalog, borrower_id);

        if catalog.positions_issued_to(borrower_id).count() == 0 {
            assert!(recommendations.is_empty());
        }
        assert!(recommendations.len() <= NO_OF_RECOMMENDATIONS);
        assert!(recommendations.iter().all(|record| record.is_available()));

        let unique: HashSet<&str> = recommendations
            .iter()
            .map(|record| record.book_id.as_str())
            .collect();
        assert_eq!(unique.len(), recommendations.len());
    }
}
