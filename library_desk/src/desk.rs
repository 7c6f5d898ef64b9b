use std::str::FromStr;
use std::sync::Arc;

use library_catalog::api::{BookId, BookRecord, BorrowerId, SearchField};
use library_catalog::catalog_storage::CatalogStorage;
use library_circulation::api::{IssueReceipt, ReturnReceipt};
use library_circulation::circulation_desk::{CirculationDesk, CirculationError};
use library_recommendations::recommendations::RecommendationsEngine;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Field label as accepted by the catalog search, unknown labels find nothing
    Search { field: String, query: String },
    Recommend,
    Issue(BookId),
    Return(BookId),
    Help,
    Quit,
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
#[error("{0}, type 'help' for a list of commands")]
pub struct CommandError(String);

fn field_label(word: &str) -> String {
    match word.to_lowercase().as_str() {
        "title" => SearchField::Title.label().to_string(),
        "author" => SearchField::Author.label().to_string(),
        "id" | "bookid" | "book_id" => SearchField::BookId.label().to_string(),
        _ => word.to_string(),
    }
}

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (name, rest) = line
            .split_once(char::is_whitespace)
            .map(|(name, rest)| (name, rest.trim()))
            .unwrap_or((line, ""));

        match name.to_lowercase().as_str() {
            "search" => {
                let (field, query) = rest
                    .split_once(char::is_whitespace)
                    .map(|(field, query)| (field, query.trim()))
                    .unwrap_or((rest, ""));
                if field.is_empty() {
                    return Err(CommandError(
                        "Usage: search <title|author|id> <query>".to_string(),
                    ));
                }
                Ok(Command::Search {
                    field: field_label(field),
                    query: query.to_string(),
                })
            }
            "recommend" => Ok(Command::Recommend),
            "issue" | "return" if rest.is_empty() => {
                Err(CommandError(format!("Usage: {} <book id>", name)))
            }
            "issue" => Ok(Command::Issue(rest.to_string())),
            "return" => Ok(Command::Return(rest.to_string())),
            "help" => Ok(Command::Help),
            "quit" | "exit" => Ok(Command::Quit),
            "" => Err(CommandError("Empty command".to_string())),
            other => Err(CommandError(format!("Unknown command {}", other))),
        }
    }
}

/// What the presentation layer has to show after a command
#[derive(Debug)]
pub enum DeskEvent {
    Books(Vec<BookRecord>),
    Issued(IssueReceipt),
    Returned(ReturnReceipt),
    Failed(CirculationError),
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum View {
    Search { field: String, query: String },
    Recommendations,
}

/// Catalog commands plus recommendations, independent of any front end
pub struct LibraryDesk {
    circulation: CirculationDesk,
    recommendations: RecommendationsEngine,
}

impl LibraryDesk {
    pub async fn open(
        storage: Arc<dyn CatalogStorage>,
        recommendations: RecommendationsEngine,
    ) -> Result<Self, CirculationError> {
        Ok(Self {
            circulation: CirculationDesk::open(storage).await?,
            recommendations,
        })
    }

    pub fn login(&self, borrower_id: &str) -> Result<BorrowerSession, CirculationError> {
        let borrower_id = self.circulation.authenticate(borrower_id)?;
        Ok(BorrowerSession {
            borrower_id,
            last_view: None,
        })
    }

    pub fn search(&self, query: &str, field_label: &str) -> Vec<BookRecord> {
        self.circulation.search_by_label(query, field_label)
    }

    pub fn recommend(&self, borrower_id: &str) -> Vec<BookRecord> {
        self.recommendations
            .recommend(&self.circulation.snapshot(), borrower_id)
    }

    pub fn circulation(&self) -> &CirculationDesk {
        &self.circulation
    }
}

/// A logged in borrower, remembers the last list shown so it can be refreshed
/// after issuing or returning
pub struct BorrowerSession {
    borrower_id: BorrowerId,
    last_view: Option<View>,
}

impl BorrowerSession {
    pub fn borrower_id(&self) -> &str {
        &self.borrower_id
    }

    pub async fn execute(&mut self, desk: &LibraryDesk, command: Command) -> Vec<DeskEvent> {
        match command {
            Command::Search { field, query } => {
                let view = View::Search { field, query };
                let books = self.show(desk, &view);
                self.last_view = Some(view);
                vec![DeskEvent::Books(books)]
            }
            Command::Recommend => {
                let books = self.show(desk, &View::Recommendations);
                self.last_view = Some(View::Recommendations);
                vec![DeskEvent::Books(books)]
            }
            Command::Issue(book_id) => {
                let outcome = match desk.circulation.issue_book(&book_id, &self.borrower_id).await
                {
                    Ok(receipt) => DeskEvent::Issued(receipt),
                    Err(err) => DeskEvent::Failed(err),
                };
                self.with_refresh(desk, outcome)
            }
            Command::Return(book_id) => {
                let outcome = match desk
                    .circulation
                    .return_book(&book_id, &self.borrower_id)
                    .await
                {
                    Ok(receipt) => DeskEvent::Returned(receipt),
                    Err(err) => DeskEvent::Failed(err),
                };
                self.with_refresh(desk, outcome)
            }
            Command::Help => vec![DeskEvent::Help],
            Command::Quit => vec![DeskEvent::Quit],
        }
    }

    fn show(&self, desk: &LibraryDesk, view: &View) -> Vec<BookRecord> {
        match view {
            View::Search { field, query } => desk.search(query, field),
            View::Recommendations => desk.recommend(&self.borrower_id),
        }
    }

    fn with_refresh(&self, desk: &LibraryDesk, outcome: DeskEvent) -> Vec<DeskEvent> {
        let mut events = vec![outcome];
        if let Some(view) = &self.last_view {
            events.push(DeskEvent::Books(self.show(desk, view)));
        }
        events
    }
}

#[cfg(test)]
mod desk_tests {
    use library_catalog::api::Availability;
    use library_catalog::catalog_storage::InMemoryCatalogStorage;

    use super::*;

    #[test]
    fn parse_commands() {
        assert_eq!(
            "search title lord of the rings".parse(),
            Ok(Command::Search {
                field: "Title".to_string(),
                query: "lord of the rings".to_string()
            })
        );
        assert_eq!(
            "search ID".parse(),
            Ok(Command::Search {
                field: "Book ID".to_string(),
                query: "".to_string()
            })
        );
        assert_eq!(
            "search genre horror".parse(),
            Ok(Command::Search {
                field: "genre".to_string(),
                query: "horror".to_string()
            })
        );
        assert_eq!("  recommend ".parse(), Ok(Command::Recommend));
        assert_eq!("issue B-12".parse(), Ok(Command::Issue("B-12".to_string())));
        assert_eq!("RETURN B1".parse(), Ok(Command::Return("B1".to_string())));
        assert_eq!("quit".parse(), Ok(Command::Quit));
        assert!("issue".parse::<Command>().is_err());
        assert!("search".parse::<Command>().is_err());
        assert!("borrow B1".parse::<Command>().is_err());
        assert!("".parse::<Command>().is_err());
    }

    fn test_records() -> Vec<BookRecord> {
        vec![
            BookRecord::available("B1", "Good Omens", "Pratchett", "Fantasy Comedy"),
            BookRecord {
                availability: Availability::Issued,
                borrower_id: Some("U1".to_string()),
                issued_times: 1,
                ..BookRecord::available("B2", "Mort", "Pratchett", "Fantasy")
            },
            BookRecord::available("B3", "Neverwhere", "Gaiman", "Urban Fantasy"),
        ]
    }

    async fn open_desk() -> LibraryDesk {
        LibraryDesk::open(
            Arc::new(InMemoryCatalogStorage::new(test_records())),
            RecommendationsEngine::default(),
        )
        .await
        .expect("Failed to open desk")
    }

    fn book_ids(event: &DeskEvent) -> Vec<String> {
        match event {
            DeskEvent::Books(books) => books.iter().map(|b| b.book_id.clone()).collect(),
            other => panic!("Expected books, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_login() {
        let desk = open_desk().await;
        assert_eq!(desk.login("U1").unwrap().borrower_id(), "U1");
        assert!(matches!(
            desk.login("U9"),
            Err(CirculationError::AuthFailure(..))
        ));
    }

    #[tokio::test]
    /// 1. Searches by author
    /// 2. Issues a book from the result, list is refreshed with new availability
    /// 3. Issues it again, failure is reported and list refreshed
    /// 4. Returns a book, then asks for recommendations
    async fn test_session_flow() {
        let desk = open_desk().await;
        let mut session = desk.login("U1").unwrap();

        let events = session
            .execute(&desk, "search author pratchett".parse().unwrap())
            .await;
        assert_eq!(events.len(), 1);
        assert_eq!(book_ids(&events[0]), vec!["B1", "B2"]);

        let events = session.execute(&desk, Command::Issue("B1".to_string())).await;
        assert!(matches!(&events[0], DeskEvent::Issued(receipt) if receipt.title == "Good Omens"));
        match &events[1] {
            DeskEvent::Books(books) => assert!(books.iter().all(|b| !b.is_available())),
            other => panic!("Expected refreshed books, got {:?}", other),
        }

        let events = session.execute(&desk, Command::Issue("B1".to_string())).await;
        assert!(matches!(
            &events[0],
            DeskEvent::Failed(CirculationError::AlreadyIssued(..))
        ));
        assert_eq!(events.len(), 2);

        let events = session.execute(&desk, Command::Return("B2".to_string())).await;
        assert!(matches!(&events[0], DeskEvent::Returned(receipt) if receipt.book_id == "B2"));

        let events = session.execute(&desk, Command::Recommend).await;
        // B1 is issued to U1, B2 shares "fantasy" and is back on the shelf
        let recommended = book_ids(&events[0]);
        assert!(recommended.contains(&"B2".to_string()));
        assert!(!recommended.contains(&"B1".to_string()));
    }

    #[tokio::test]
    async fn test_return_not_issued_to_borrower() {
        let desk = open_desk().await;
        desk.circulation().issue_book("B3", "U2").await.unwrap();

        let mut session = desk.login("U1").unwrap();
        let events = session.execute(&desk, Command::Return("B3".to_string())).await;
        // nothing shown yet, so no refresh
        assert_eq!(events.len(), 1);
        assert!(matches!(
            &events[0],
            DeskEvent::Failed(CirculationError::NotYourBook(..))
        ));
    }
}
