use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub use library_catalog::api::{BookId, BorrowerId};

#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
/// Confirmation of a successfully issued book
pub struct IssueReceipt {
    pub book_id: BookId,
    pub title: String,
    pub borrower_id: BorrowerId,
    pub issued_on: NaiveDate,
}

#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
/// Confirmation of a successfully returned book
pub struct ReturnReceipt {
    pub book_id: BookId,
    pub title: String,
    pub borrower_id: BorrowerId,
}
