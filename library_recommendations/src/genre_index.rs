//! TF-IDF vector space over genre labels.
//!
//! Every genre string is a short document. Tokens are lowercase runs of word
//! characters at least two characters long, English stop words removed.
//! Weights are raw term counts times the smoothed inverse document frequency
//! `ln((1 + n) / (1 + df)) + 1`, and each document vector is L2-normalised, so
//! the cosine similarity of two documents is the dot product of their vectors.

use std::collections::{BTreeMap, HashMap, HashSet};

use itertools::Itertools;

use crate::stop_words::english_stop_words;

/// Sparse document vector, entries sorted by term column
type SparseVector = Vec<(usize, f64)>;

pub struct GenreIndex {
    vocabulary: BTreeMap<String, usize>,
    idf: Vec<f64>,
    vectors: Vec<SparseVector>,
}

fn tokenize<'a>(
    text: &'a str,
    stop_words: &'a HashSet<&'static str>,
) -> impl Iterator<Item = String> + 'a {
    text.split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|token| token.chars().count() >= 2)
        .map(|token| token.to_lowercase())
        .filter(move |token| !stop_words.contains(token.as_str()))
}

impl GenreIndex {
    /// Builds the vector space, one document per genre in the given order
    pub fn build<'a>(genres: impl IntoIterator<Item = &'a str>) -> Self {
        let stop_words = english_stop_words();
        let documents: Vec<Vec<String>> = genres
            .into_iter()
            .map(|genre| tokenize(genre, &stop_words).collect())
            .collect();

        let vocabulary: BTreeMap<String, usize> = documents
            .iter()
            .flatten()
            .cloned()
            .sorted()
            .dedup()
            .enumerate()
            .map(|(column, term)| (term, column))
            .collect();

        let mut document_frequency = vec![0usize; vocabulary.len()];
        for document in documents.iter() {
            for term in document.iter().unique() {
                document_frequency[vocabulary[term]] += 1;
            }
        }

        let n = documents.len() as f64;
        let idf: Vec<f64> = document_frequency
            .iter()
            .map(|&df| ((1.0 + n) / (1.0 + df as f64)).ln() + 1.0)
            .collect();

        let vectors = documents
            .iter()
            .map(|document| {
                let mut counts: HashMap<usize, f64> = HashMap::new();
                for term in document {
                    *counts.entry(vocabulary[term]).or_default() += 1.0;
                }
                let weighted = counts
                    .into_iter()
                    .map(|(column, count)| (column, count * idf[column]))
                    .sorted_by_key(|(column, _)| *column)
                    .collect_vec();
                normalize(weighted)
            })
            .collect();

        Self {
            vocabulary,
            idf,
            vectors,
        }
    }

    pub fn number_of_documents(&self) -> usize {
        self.vectors.len()
    }

    pub fn vocabulary_size(&self) -> usize {
        self.vocabulary.len()
    }

    pub fn idf(&self, term: &str) -> Option<f64> {
        self.vocabulary.get(term).map(|&column| self.idf[column])
    }

    /// Cosine similarity of two documents, 0 when either has no terms
    pub fn similarity(&self, first: usize, second: usize) -> f64 {
        match (self.vectors.get(first), self.vectors.get(second)) {
            (Some(a), Some(b)) => dot(a, b),
            _ => 0.0,
        }
    }

    /// Dense matrix of pairwise similarities, indexed by document position.
    /// Quadratic in the number of documents.
    pub fn similarity_matrix(&self) -> SimilarityMatrix {
        let size = self.vectors.len();
        let mut scores = vec![0.0; size * size];
        for row in 0..size {
            for column in row..size {
                let score = dot(&self.vectors[row], &self.vectors[column]);
                scores[row * size + column] = score;
                scores[column * size + row] = score;
            }
        }
        SimilarityMatrix { size, scores }
    }
}

fn normalize(vector: SparseVector) -> SparseVector {
    let norm = vector.iter().map(|(_, w)| w * w).sum::<f64>().sqrt();
    if norm == 0.0 {
        return vector;
    }
    vector.into_iter().map(|(c, w)| (c, w / norm)).collect()
}

fn dot(a: &[(usize, f64)], b: &[(usize, f64)]) -> f64 {
    let (mut i, mut j, mut sum) = (0, 0, 0.0);
    while i < a.len() && j < b.len() {
        match a[i].0.cmp(&b[j].0) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                sum += a[i].1 * b[j].1;
                i += 1;
                j += 1;
            }
        }
    }
    sum
}

pub struct SimilarityMatrix {
    size: usize,
    scores: Vec<f64>,
}

impl SimilarityMatrix {
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn score(&self, row: usize, column: usize) -> f64 {
        self.scores[row * self.size + column]
    }

    /// Up to `limit` other positions most similar to `row`, best first.
    /// Ties keep catalog order, positions with zero similarity are skipped.
    pub fn most_similar(&self, row: usize, limit: usize) -> Vec<(usize, f64)> {
        if row >= self.size {
            return vec![];
        }
        (0..self.size)
            .filter(|&column| column != row)
            .map(|column| (column, self.score(row, column)))
            .filter(|(_, score)| *score > 0.0)
            .sorted_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)))
            .take(limit)
            .collect()
    }
}

#[cfg(test)]
mod genre_index_tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn tokens_are_lowercased_and_filtered() {
        let stop_words = english_stop_words();
        let tokens: Vec<String> =
            tokenize("Science-Fiction & the Art of War, a Y/A novel", &stop_words).collect();
        assert_eq!(tokens, vec!["science", "fiction", "art", "war", "novel"]);
    }

    #[test]
    fn idf_is_smoothed() {
        let index = GenreIndex::build(["Fiction", "Fiction", "Science"]);
        assert_eq!(index.vocabulary_size(), 2);
        // ln(4/3) + 1 and ln(4/2) + 1
        assert!(close(index.idf("fiction").unwrap(), (4.0f64 / 3.0).ln() + 1.0));
        assert!(close(index.idf("science").unwrap(), 2.0f64.ln() + 1.0));
        assert_eq!(index.idf("the"), None);
    }

    #[test]
    fn similarity_follows_shared_terms() {
        let index = GenreIndex::build([
            "Fiction",
            "Science Fiction",
            "Science",
            "History",
            "",
        ]);
        let matrix = index.similarity_matrix();
        assert_eq!(matrix.size(), 5);

        assert!(close(matrix.score(0, 0), 1.0));
        assert!(matrix.score(0, 1) > 0.0 && matrix.score(0, 1) < 1.0);
        assert!(close(matrix.score(0, 2), 0.0));
        assert!(close(matrix.score(1, 2), matrix.score(2, 1)));
        assert!(close(matrix.score(0, 3), 0.0));
        // empty genre is similar to nothing, not even itself
        assert!(close(matrix.score(4, 4), 0.0));
        assert!(close(index.similarity(4, 1), 0.0));
    }

    #[test]
    fn most_similar_excludes_self_and_unrelated() {
        let index = GenreIndex::build([
            "Fantasy",
            "Epic Fantasy",
            "Fantasy",
            "Cooking",
            "Fantasy",
        ]);
        let matrix = index.similarity_matrix();

        let similar = matrix.most_similar(0, 5);
        let positions: Vec<usize> = similar.iter().map(|(p, _)| *p).collect();
        // exact matches first in catalog order, then the partial match
        assert_eq!(positions, vec![2, 4, 1]);

        assert_eq!(matrix.most_similar(0, 1).len(), 1);
        assert!(matrix.most_similar(3, 5).is_empty());
        assert!(matrix.most_similar(17, 5).is_empty());
    }

    #[test]
    fn stop_word_only_catalog_does_not_fail() {
        let index = GenreIndex::build(["the", "", "of and"]);
        assert_eq!(index.vocabulary_size(), 0);
        assert_eq!(index.number_of_documents(), 3);
        assert!(index.similarity_matrix().most_similar(0, 5).is_empty());

        let empty = GenreIndex::build(std::iter::empty::<&str>());
        assert_eq!(empty.similarity_matrix().size(), 0);
    }
}
