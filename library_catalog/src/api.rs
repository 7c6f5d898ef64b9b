use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub type BookId = String;
pub type BorrowerId = String;

/// Column headers of the persisted catalog table, in storage order
pub const CATALOG_COLUMNS: [&str; 8] = [
    "Book ID",
    "Title",
    "Author",
    "Genre",
    "Availability",
    "Borrower ID",
    "Last Issued Date",
    "Issued Times",
];

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Eq, PartialEq, Hash)]
pub enum Availability {
    Available,
    Issued,
}

impl fmt::Display for Availability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Availability::Available => write!(f, "Available"),
            Availability::Issued => write!(f, "Issued"),
        }
    }
}

impl FromStr for Availability {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "Available" => Ok(Availability::Available),
            "Issued" => Ok(Availability::Issued),
            other => Err(format!("unknown availability {other:?}")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
/// One circulating copy of a book, exactly one row of the catalog table
pub struct BookRecord {
    #[serde(rename = "Book ID")]
    pub book_id: BookId,
    #[serde(rename = "Title")]
    pub title: String,
    #[serde(rename = "Author")]
    pub author: String,
    #[serde(rename = "Genre", default)]
    pub genre: String,
    #[serde(rename = "Availability")]
    pub availability: Availability,
    /// Set only while the book is issued
    #[serde(rename = "Borrower ID")]
    pub borrower_id: Option<BorrowerId>,
    #[serde(rename = "Last Issued Date")]
    pub last_issued_date: Option<NaiveDate>,
    #[serde(rename = "Issued Times")]
    pub issued_times: u32,
}

impl BookRecord {
    /// Creates a record of a book that was never issued
    pub fn available(book_id: &str, title: &str, author: &str, genre: &str) -> Self {
        Self {
            book_id: book_id.to_string(),
            title: title.to_string(),
            author: author.to_string(),
            genre: genre.to_string(),
            availability: Availability::Available,
            borrower_id: None,
            last_issued_date: None,
            issued_times: 0,
        }
    }

    pub fn is_available(&self) -> bool {
        self.availability == Availability::Available
    }

    pub fn is_issued_to(&self, borrower_id: &str) -> bool {
        self.availability == Availability::Issued && self.borrower_id.as_deref() == Some(borrower_id)
    }

    /// Checks that borrower is present if and only if the book is issued
    pub fn is_consistent(&self) -> bool {
        self.borrower_id.is_some() == (self.availability == Availability::Issued)
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
/// Field a catalog search is restricted to
pub enum SearchField {
    Title,
    Author,
    BookId,
}

impl SearchField {
    pub fn label(&self) -> &'static str {
        match self {
            SearchField::Title => "Title",
            SearchField::Author => "Author",
            SearchField::BookId => "Book ID",
        }
    }

    pub fn value_of<'a>(&self, record: &'a BookRecord) -> &'a str {
        match self {
            SearchField::Title => &record.title,
            SearchField::Author => &record.author,
            SearchField::BookId => &record.book_id,
        }
    }
}

impl fmt::Display for SearchField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(thiserror::Error, Debug, Eq, PartialEq)]
#[error("Unknown search field {0}")]
pub struct UnknownSearchField(pub String);

impl FromStr for SearchField {
    type Err = UnknownSearchField;

    fn from_str(label: &str) -> Result<Self, Self::Err> {
        match label {
            "Title" => Ok(SearchField::Title),
            "Author" => Ok(SearchField::Author),
            "Book ID" => Ok(SearchField::BookId),
            other => Err(UnknownSearchField(other.to_string())),
        }
    }
}
