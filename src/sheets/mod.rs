mod client;
mod hub;
#[cfg(test)]
pub(crate) mod mocks;
mod range;
mod table;

pub use client::SheetClient;
pub use range::{CellRef, SheetRange, column_letter, quote_title};
pub use table::{TabularData, rows_from_csv, write_csv};

use crate::error::{AppError, Result};
use async_trait::async_trait;
use google_sheets4::api::{Request, Response as Reply};
use std::fmt;
use std::str::FromStr;
use url::Url;

const SPREADSHEET_URL_PREFIX: &str = "https://docs.google.com/spreadsheets/d/";

/// How the API interprets written strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ValueInputOption {
    /// Stored exactly as given.
    Raw,
    /// Parsed as if typed into the UI: formulas, numbers and dates are interpreted.
    #[default]
    UserEntered,
}

impl ValueInputOption {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueInputOption::Raw => "RAW",
            ValueInputOption::UserEntered => "USER_ENTERED",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dimension {
    Rows,
    Columns,
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dimension::Rows => f.write_str("ROWS"),
            Dimension::Columns => f.write_str("COLUMNS"),
        }
    }
}

impl FromStr for Dimension {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "ROWS" => Ok(Dimension::Rows),
            "COLUMNS" => Ok(Dimension::Columns),
            _ => Err(AppError::Config(format!(
                "Unknown dimension '{}', expected ROWS or COLUMNS",
                s
            ))),
        }
    }
}

/// What a values update or append touched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateSummary {
    pub updated_range: Option<String>,
    pub updated_rows: i32,
    pub updated_columns: i32,
    pub updated_cells: i32,
}

/// The spreadsheet a [`SheetClient`] reads and writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpreadsheetTarget {
    pub sheet_id: String,
    pub sheet_url: String,
}

impl SpreadsheetTarget {
    pub fn from_id(sheet_id: &str) -> Self {
        Self {
            sheet_id: sheet_id.to_string(),
            sheet_url: format!("{}{}", SPREADSHEET_URL_PREFIX, sheet_id),
        }
    }

    /// Accept a `https://docs.google.com/...` URL or a bare spreadsheet id.
    pub fn parse(url_or_id: &str) -> Result<Self> {
        let url_or_id = url_or_id.trim();
        if !url_or_id.starts_with("https://docs.google.com") {
            if url_or_id.is_empty() {
                return Err(AppError::Config("Empty spreadsheet id".to_string()));
            }
            return Ok(Self::from_id(url_or_id));
        }

        let url = Url::parse(url_or_id)
            .map_err(|e| AppError::Config(format!("Invalid spreadsheet URL: {}", e)))?;

        // .../spreadsheets/d/<id>[/edit[#gid=0]]
        let segments: Vec<&str> = url
            .path_segments()
            .map(|segments| segments.filter(|s| !s.is_empty()).collect())
            .unwrap_or_default();
        let sheet_id = match segments.iter().position(|s| *s == "d") {
            Some(index) => segments.get(index + 1).copied(),
            None => segments.last().copied(),
        }
        .ok_or_else(|| AppError::Config(format!("No spreadsheet id in URL: {}", url_or_id)))?;

        Ok(Self {
            sheet_id: sheet_id.to_string(),
            sheet_url: url_or_id.to_string(),
        })
    }
}

/// The Sheets v4 calls the client is built from. Errors are `AppError::Sheets`.
#[async_trait]
pub trait SheetsService: Send + Sync {
    async fn get_values(&self, spreadsheet_id: &str, range: &str) -> Result<Vec<Vec<String>>>;

    async fn sheet_titles(&self, spreadsheet_id: &str) -> Result<Vec<String>>;

    async fn update_values(
        &self,
        spreadsheet_id: &str,
        range: &str,
        values: Vec<Vec<String>>,
        input: ValueInputOption,
    ) -> Result<UpdateSummary>;

    async fn append_values(
        &self,
        spreadsheet_id: &str,
        range: &str,
        values: Vec<Vec<String>>,
        input: ValueInputOption,
    ) -> Result<UpdateSummary>;

    async fn batch_update(
        &self,
        spreadsheet_id: &str,
        requests: Vec<Request>,
    ) -> Result<Vec<Reply>>;
}
