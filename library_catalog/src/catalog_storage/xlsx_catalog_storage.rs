use std::io::Cursor;
use std::path::{Path, PathBuf};

use calamine::{Data, DataType, Reader, Xlsx};
use chrono::{Datelike, NaiveDate};
use rust_xlsxwriter::{ExcelDateTime, Format, Workbook};

use crate::api::{Availability, BookRecord, CATALOG_COLUMNS};
use crate::catalog_storage::{replace_file, validate_records, CatalogStorage, CatalogStorageError};

/// Sheet holding the catalog table when none is configured
pub const DEFAULT_SHEET_NAME: &str = "in";

const DATE_FORMAT: &str = "yyyy-mm-dd";

static EMPTY_CELL: Data = Data::Empty;

/// Catalog table kept on one named sheet of an xlsx workbook.
///
/// The first row of the sheet names the columns, every save rewrites the whole
/// workbook with that single sheet.
pub struct XlsxCatalogStorage {
    path: PathBuf,
    sheet_name: String,
}

/// Positions of the catalog columns within the sheet, in `CATALOG_COLUMNS` order
struct ColumnLayout([usize; CATALOG_COLUMNS.len()]);

impl ColumnLayout {
    fn from_header(header: &[Data]) -> Result<Self, CatalogStorageError> {
        let names: Vec<String> = header
            .iter()
            .map(|cell| cell.to_string().trim().to_string())
            .collect();

        let mut positions = [0; CATALOG_COLUMNS.len()];
        for (position, column) in positions.iter_mut().zip(CATALOG_COLUMNS) {
            *position = names
                .iter()
                .position(|name| name == column)
                .ok_or_else(|| CatalogStorageError::MissingColumn(column.to_string()))?;
        }
        Ok(Self(positions))
    }

    fn cell<'a>(&self, row: &'a [Data], column: usize) -> &'a Data {
        row.get(self.0[column]).unwrap_or(&EMPTY_CELL)
    }
}

fn invalid_cell(row: usize, column: usize, cell: &Data) -> CatalogStorageError {
    CatalogStorageError::InvalidCell {
        row,
        column: CATALOG_COLUMNS[column],
        value: cell.to_string(),
    }
}

fn text(cell: &Data) -> String {
    match cell {
        Data::String(value) => value.clone(),
        other => other.to_string(),
    }
}

fn optional_text(cell: &Data) -> Option<String> {
    Some(text(cell)).filter(|value| !value.trim().is_empty())
}

fn date(cell: &Data) -> Option<Option<NaiveDate>> {
    match cell {
        Data::Empty => Some(None),
        Data::String(value) if value.trim().is_empty() => Some(None),
        Data::String(value) => NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
            .ok()
            .map(Some),
        other => other.as_date().map(Some),
    }
}

fn count(cell: &Data) -> Option<u32> {
    match cell {
        Data::Empty => Some(0),
        other => other
            .as_i64()
            .and_then(|value| u32::try_from(value).ok()),
    }
}

impl XlsxCatalogStorage {
    pub fn new(path: impl Into<PathBuf>, sheet_name: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            sheet_name: sheet_name.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn sheet_name(&self) -> &str {
        &self.sheet_name
    }

    fn parse(&self, bytes: Vec<u8>) -> Result<Vec<BookRecord>, CatalogStorageError> {
        let mut workbook: Xlsx<_> = calamine::open_workbook_from_rs(Cursor::new(bytes))?;
        if !workbook
            .sheet_names()
            .iter()
            .any(|name| name == &self.sheet_name)
        {
            return Err(CatalogStorageError::MissingSheet(self.sheet_name.clone()));
        }
        let range = workbook.worksheet_range(&self.sheet_name)?;

        let mut rows = range.rows();
        let layout = match rows.next() {
            Some(header) => ColumnLayout::from_header(header)?,
            None => {
                return Err(CatalogStorageError::MissingColumn(
                    CATALOG_COLUMNS[0].to_string(),
                ))
            }
        };

        let mut records = Vec::with_capacity(range.height().saturating_sub(1));
        // sheet rows are counted from 1 and the header takes the first one
        for (row_number, row) in rows.enumerate().map(|(index, row)| (index + 2, row)) {
            let availability_cell = layout.cell(row, 4);
            let availability = text(availability_cell)
                .trim()
                .parse::<Availability>()
                .map_err(|_| invalid_cell(row_number, 4, availability_cell))?;

            let date_cell = layout.cell(row, 6);
            let last_issued_date =
                date(date_cell).ok_or_else(|| invalid_cell(row_number, 6, date_cell))?;

            let count_cell = layout.cell(row, 7);
            let issued_times =
                count(count_cell).ok_or_else(|| invalid_cell(row_number, 7, count_cell))?;

            records.push(BookRecord {
                book_id: text(layout.cell(row, 0)),
                title: text(layout.cell(row, 1)),
                author: text(layout.cell(row, 2)),
                genre: text(layout.cell(row, 3)),
                availability,
                borrower_id: optional_text(layout.cell(row, 5)),
                last_issued_date,
                issued_times,
            });
        }

        validate_records(&records)?;
        Ok(records)
    }

    fn render(&self, records: &[BookRecord]) -> Result<Vec<u8>, CatalogStorageError> {
        let mut workbook = Workbook::new();
        let date_format = Format::new().set_num_format(DATE_FORMAT);

        let worksheet = workbook.add_worksheet();
        worksheet.set_name(&self.sheet_name)?;
        for (column, header) in (0u16..).zip(CATALOG_COLUMNS) {
            worksheet.write_string(0, column, header)?;
        }

        for (row, record) in (1u32..).zip(records) {
            for (column, value) in (0u16..).zip([
                &record.book_id,
                &record.title,
                &record.author,
                &record.genre,
            ]) {
                if !value.is_empty() {
                    worksheet.write_string(row, column, value.as_str())?;
                }
            }
            worksheet.write_string(row, 4, record.availability.to_string())?;
            if let Some(borrower_id) = &record.borrower_id {
                worksheet.write_string(row, 5, borrower_id.as_str())?;
            }
            if let Some(issued_on) = record.last_issued_date {
                let year = u16::try_from(issued_on.year()).map_err(|_| {
                    CatalogStorageError::InvalidCell {
                        row: row as usize + 1,
                        column: CATALOG_COLUMNS[6],
                        value: issued_on.to_string(),
                    }
                })?;
                let cell =
                    ExcelDateTime::from_ymd(year, issued_on.month() as u8, issued_on.day() as u8)?;
                worksheet.write_datetime_with_format(row, 6, &cell, &date_format)?;
            }
            worksheet.write_number(row, 7, f64::from(record.issued_times))?;
        }

        Ok(workbook.save_to_buffer()?)
    }
}

#[async_trait::async_trait]
impl CatalogStorage for XlsxCatalogStorage {
    async fn load(&self) -> Result<Vec<BookRecord>, CatalogStorageError> {
        let bytes = tokio::fs::read(&self.path).await?;
        let records = self.parse(bytes)?;
        tracing::info!(
            "Loaded {} catalog records from sheet {} of {}",
            records.len(),
            self.sheet_name,
            self.path.display()
        );
        Ok(records)
    }

    async fn save(&self, records: &[BookRecord]) -> Result<(), CatalogStorageError> {
        let bytes = self.render(records)?;
        replace_file(&self.path, &bytes).await?;
        tracing::debug!(
            "Saved {} catalog records to sheet {} of {}",
            records.len(),
            self.sheet_name,
            self.path.display()
        );
        Ok(())
    }
}
