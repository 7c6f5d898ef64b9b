use serde::Serialize;

use library_catalog::api::BookRecord;
use library_circulation::circulation_desk::CirculationError;

use crate::desk::DeskEvent;

const HEADERS: [&str; 5] = ["Book ID", "Title", "Author", "Genre", "Availability"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    JsonLines,
}

#[derive(Serialize)]
struct BookRow<'a> {
    book_id: &'a str,
    title: &'a str,
    author: &'a str,
    genre: &'a str,
    availability: String,
}

impl<'a> From<&'a BookRecord> for BookRow<'a> {
    fn from(record: &'a BookRecord) -> Self {
        Self {
            book_id: &record.book_id,
            title: &record.title,
            author: &record.author,
            genre: &record.genre,
            availability: record.availability.to_string(),
        }
    }
}

impl BookRow<'_> {
    fn cells(&self) -> [&str; 5] {
        [
            self.book_id,
            self.title,
            self.author,
            self.genre,
            self.availability.as_str(),
        ]
    }
}

pub const HELP: &str = "\
Available commands:
  search <title|author|id> <query>  - Search the catalog
  recommend                         - Books similar to the ones you have issued
  issue <book id>                   - Issue a book
  return <book id>                  - Return a book
  help                              - Show this message
  quit                              - Leave the library";

pub fn render_books(books: &[BookRecord], format: OutputFormat) -> String {
    let rows: Vec<BookRow> = books.iter().map(BookRow::from).collect();
    match format {
        OutputFormat::JsonLines => match render_json_lines(&rows) {
            Ok(lines) => lines,
            Err(err) => {
                tracing::error!("Failed to render books as JSON, falling back to table: {}", err);
                render_table(&rows)
            }
        },
        OutputFormat::Table => render_table(&rows),
    }
}

fn render_json_lines(rows: &[BookRow]) -> serde_json::Result<String> {
    let mut output = String::new();
    for row in rows {
        output.push_str(&serde_json::to_string(row)?);
        output.push('\n');
    }
    Ok(output)
}

fn render_table(rows: &[BookRow]) -> String {
    let mut widths = HEADERS.map(|header| header.chars().count());
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row.cells()) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let line = |cells: [&str; 5]| -> String {
        let padded: Vec<String> = cells
            .iter()
            .zip(widths.iter())
            .map(|(cell, width)| format!("{:<width$}", cell, width = *width))
            .collect();
        padded.join(" | ").trim_end().to_string() + "\n"
    };

    let mut table = line(HEADERS);
    table.push_str(
        &(widths
            .iter()
            .map(|width| "-".repeat(*width))
            .collect::<Vec<_>>()
            .join("-+-")
            + "\n"),
    );
    for row in rows {
        table.push_str(&line(row.cells()));
    }
    if rows.is_empty() {
        table.push_str("(no books)\n");
    }
    table
}

fn describe_failure(err: &CirculationError) -> String {
    match err {
        CirculationError::NotFound(_) => "Book ID not found.".to_string(),
        CirculationError::AlreadyIssued(_) => "This book is already issued.".to_string(),
        CirculationError::NotYourBook(_) => "You cannot return this book.".to_string(),
        CirculationError::AuthFailure(_) => "Invalid User ID. Please try again.".to_string(),
        CirculationError::Storage(err) => format!("Catalog could not be saved: {}", err),
    }
}

/// Text shown to the user for a desk event, `None` for events without output
pub fn render_event(event: &DeskEvent, format: OutputFormat) -> Option<String> {
    match event {
        DeskEvent::Books(books) => Some(render_books(books, format)),
        DeskEvent::Issued(receipt) => {
            Some(format!("Book '{}' issued successfully!\n", receipt.title))
        }
        DeskEvent::Returned(receipt) => {
            Some(format!("Book '{}' returned successfully!\n", receipt.title))
        }
        DeskEvent::Failed(err) => Some(format!("Error: {}\n", describe_failure(err))),
        DeskEvent::Help => Some(format!("{}\n", HELP)),
        DeskEvent::Quit => None,
    }
}

pub fn render_login_failure(err: &CirculationError) -> String {
    describe_failure(err)
}
