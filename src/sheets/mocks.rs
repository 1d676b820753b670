//! In-memory Sheets backend for tests.

use super::{SheetsService, UpdateSummary, ValueInputOption, column_letter};
use crate::error::{AppError, Result};
use async_trait::async_trait;
use google_sheets4::api::{AddSheetResponse, Request, Response as Reply};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, Default)]
pub(crate) struct MockTab {
    pub title: String,
    pub sheet_id: i32,
    pub grid: Vec<Vec<String>>,
}

#[derive(Debug, Default)]
pub(crate) struct MockSheetsState {
    pub spreadsheets: HashMap<String, Vec<MockTab>>,
    pub requests: Vec<Request>,
    pub writes: Vec<(String, String, ValueInputOption)>,
    pub fail: bool,
    next_sheet_id: i32,
}

impl MockSheetsState {
    /// Every spreadsheet starts out with a single empty `Sheet1`, as a fresh one does remotely.
    fn tabs(&mut self, spreadsheet_id: &str) -> &mut Vec<MockTab> {
        self.spreadsheets
            .entry(spreadsheet_id.to_string())
            .or_insert_with(|| {
                vec![MockTab {
                    title: "Sheet1".to_string(),
                    ..Default::default()
                }]
            })
    }

    fn tab(&mut self, spreadsheet_id: &str, range: &str) -> Result<&mut MockTab> {
        let (title, _) = split_range(range);
        self.tabs(spreadsheet_id)
            .iter_mut()
            .find(|tab| tab.title == title)
            .ok_or_else(|| {
                AppError::Sheets(format!("400 Bad Request: Unable to parse range: {}", range))
            })
    }
}

#[derive(Clone, Default)]
pub(crate) struct MockSheets {
    pub state: Arc<Mutex<MockSheetsState>>,
}

impl MockSheets {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn failing() -> Self {
        let sheets = Self::new();
        sheets.state.lock().unwrap().fail = true;
        sheets
    }

    pub(crate) fn grid(&self, spreadsheet_id: &str, title: &str) -> Option<Vec<Vec<String>>> {
        let state = self.state.lock().unwrap();
        state
            .spreadsheets
            .get(spreadsheet_id)?
            .iter()
            .find(|tab| tab.title == title)
            .map(|tab| tab.grid.clone())
    }

    fn check(&self) -> Result<()> {
        match self.state.lock().unwrap().fail {
            true => Err(AppError::Sheets("503 Service Unavailable".to_string())),
            false => Ok(()),
        }
    }
}

/// `'My Sheet'!B2:C3` -> (`My Sheet`, (column 1, row 1)). A bare title anchors at A1.
fn split_range(range: &str) -> (String, (usize, usize)) {
    let (title, cells) = range.rsplit_once('!').unwrap_or((range, "A1"));
    let title = match title.strip_prefix('\'').and_then(|t| t.strip_suffix('\'')) {
        Some(quoted) => quoted.replace("''", "'"),
        None => title.to_string(),
    };

    let start = cells.split(':').next().unwrap_or("A1");
    let split = start
        .find(|c: char| !c.is_ascii_alphabetic())
        .unwrap_or(start.len());
    let (letters, digits) = start.split_at(split);
    let column = letters
        .to_ascii_uppercase()
        .bytes()
        .fold(0usize, |acc, b| acc * 26 + (b - b'A' + 1) as usize)
        .saturating_sub(1);
    let row = digits.parse::<usize>().unwrap_or(1).saturating_sub(1);

    (title, (column, row))
}

/// Drop trailing empty cells and rows, as the API does on read.
fn trimmed(grid: &[Vec<String>]) -> Vec<Vec<String>> {
    let mut rows: Vec<Vec<String>> = grid
        .iter()
        .map(|row| {
            let len = row.iter().rposition(|c| !c.is_empty()).map_or(0, |i| i + 1);
            row[..len].to_vec()
        })
        .collect();
    while rows.last().is_some_and(Vec::is_empty) {
        rows.pop();
    }
    rows
}

fn write_at(grid: &mut Vec<Vec<String>>, (column, row): (usize, usize), values: &[Vec<String>]) {
    for (offset, values_row) in values.iter().enumerate() {
        let target = row + offset;
        if grid.len() <= target {
            grid.resize(target + 1, Vec::new());
        }
        let cells = &mut grid[target];
        if cells.len() < column + values_row.len() {
            cells.resize(column + values_row.len(), String::new());
        }
        cells[column..column + values_row.len()].clone_from_slice(values_row);
    }
}

fn summary(title: &str, (column, row): (usize, usize), values: &[Vec<String>]) -> UpdateSummary {
    let rows = values.len();
    let columns = values.iter().map(Vec::len).max().unwrap_or(0);
    UpdateSummary {
        updated_range: Some(format!(
            "{}!{}{}:{}{}",
            title,
            column_letter(column),
            row + 1,
            column_letter(column + columns.saturating_sub(1)),
            row + rows.max(1)
        )),
        updated_rows: rows as i32,
        updated_columns: columns as i32,
        updated_cells: values.iter().map(Vec::len).sum::<usize>() as i32,
    }
}

#[async_trait]
impl SheetsService for MockSheets {
    async fn get_values(&self, spreadsheet_id: &str, range: &str) -> Result<Vec<Vec<String>>> {
        self.check()?;
        let mut state = self.state.lock().unwrap();
        Ok(trimmed(&state.tab(spreadsheet_id, range)?.grid))
    }

    async fn sheet_titles(&self, spreadsheet_id: &str) -> Result<Vec<String>> {
        self.check()?;
        let mut state = self.state.lock().unwrap();
        Ok(state
            .tabs(spreadsheet_id)
            .iter()
            .map(|tab| tab.title.clone())
            .collect())
    }

    async fn update_values(
        &self,
        spreadsheet_id: &str,
        range: &str,
        values: Vec<Vec<String>>,
        input: ValueInputOption,
    ) -> Result<UpdateSummary> {
        self.check()?;
        let mut state = self.state.lock().unwrap();
        state
            .writes
            .push((spreadsheet_id.to_string(), range.to_string(), input));

        let (title, origin) = split_range(range);
        write_at(&mut state.tab(spreadsheet_id, range)?.grid, origin, &values);
        Ok(summary(&title, origin, &values))
    }

    async fn append_values(
        &self,
        spreadsheet_id: &str,
        range: &str,
        values: Vec<Vec<String>>,
        input: ValueInputOption,
    ) -> Result<UpdateSummary> {
        self.check()?;
        let mut state = self.state.lock().unwrap();
        state
            .writes
            .push((spreadsheet_id.to_string(), range.to_string(), input));

        let (title, (column, _)) = split_range(range);
        let tab = state.tab(spreadsheet_id, range)?;
        let origin = (column, trimmed(&tab.grid).len());
        write_at(&mut tab.grid, origin, &values);
        Ok(summary(&title, origin, &values))
    }

    async fn batch_update(
        &self,
        spreadsheet_id: &str,
        requests: Vec<Request>,
    ) -> Result<Vec<Reply>> {
        self.check()?;
        let mut state = self.state.lock().unwrap();

        let mut replies = Vec::new();
        for request in requests {
            let mut reply = Reply::default();
            let added = request.add_sheet.clone().and_then(|add| add.properties);
            if let Some(mut properties) = added {
                state.next_sheet_id += 1;
                let sheet_id = state.next_sheet_id;
                let title = properties.title.clone().unwrap_or_default();
                state.tabs(spreadsheet_id).push(MockTab {
                    title,
                    sheet_id,
                    grid: Vec::new(),
                });
                properties.sheet_id = Some(sheet_id);
                reply.add_sheet = Some(AddSheetResponse {
                    properties: Some(properties),
                });
            }
            state.requests.push(request);
            replies.push(reply);
        }

        Ok(replies)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_range() {
        assert_eq!(split_range("Sheet1!A1:C3"), ("Sheet1".to_string(), (0, 0)));
        assert_eq!(split_range("'Bob''s'!AB10"), ("Bob's".to_string(), (27, 9)));
        assert_eq!(split_range("Data"), ("Data".to_string(), (0, 0)));
    }

    #[test]
    fn test_trimmed_drops_trailing_blanks() {
        let grid = vec![vec!["a".to_string(), "".to_string()], vec!["".to_string()]];
        assert_eq!(trimmed(&grid), vec![vec!["a".to_string()]]);
    }
}
