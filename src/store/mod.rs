//! Tabular store primitives shared by the Google Sheets backend and the
//! local SQLite workbook.

mod a1;
mod auth;
mod google;
mod local;
mod schema;

use thiserror::Error;

pub(crate) use a1::A1Range;
pub(crate) use auth::ServiceAccountAuth;
pub(crate) use google::GoogleSheets;
pub(crate) use local::LocalWorkbook;

pub(crate) type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error)]
pub(crate) enum StoreError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Sheets API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Invalid credentials file {path}: {reason}")]
    Credentials { path: String, reason: String },

    #[error("Worksheet not found: {0}")]
    MissingSheet(String),

    #[error("Worksheet already exists: {0}")]
    DuplicateSheet(String),

    #[error("Invalid range: {0}")]
    InvalidRange(String),

    #[error("Invalid request URL: {0}")]
    InvalidUrl(String),

    #[error("Local workbook error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("Token signing failed: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),
}

/// A spreadsheet made of named worksheets holding string cells.
///
/// Reads return rows the way the Sheets values API does: header row first,
/// trailing empty cells and rows trimmed, so rows may be ragged.
pub(crate) trait SheetStore {
    /// Human-readable location, shown in the status bar.
    fn describe(&self) -> String;

    fn worksheet_titles(&mut self) -> StoreResult<Vec<String>>;

    fn add_worksheet(&mut self, title: &str, cols: usize) -> StoreResult<()>;

    fn get_all_values(&mut self, title: &str) -> StoreResult<Vec<Vec<String>>>;

    /// Overwrite the cells of `range` starting at its top-left corner.
    /// Empty strings clear cells.
    fn update(&mut self, range: &A1Range, rows: &[Vec<String>]) -> StoreResult<()>;

    /// Write several ranges. Backends that can do this in one round trip
    /// override it.
    fn batch_update(&mut self, updates: &[(A1Range, Vec<Vec<String>>)]) -> StoreResult<()> {
        for (range, rows) in updates {
            self.update(range, rows)?;
        }
        Ok(())
    }

    /// Append a row below the last non-empty row of `title`.
    fn append_row(&mut self, title: &str, row: &[String]) -> StoreResult<()>;
}

#[cfg(test)]
mod tests;
