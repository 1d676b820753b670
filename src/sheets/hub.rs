use super::{SheetsService, UpdateSummary, ValueInputOption};
use crate::error::{AppError, Result};
use crate::facade::HttpsConnector;
use async_trait::async_trait;
use google_sheets4::Sheets;
use google_sheets4::api::{
    BatchUpdateSpreadsheetRequest, Request, Response as Reply, Scope, UpdateValuesResponse,
    ValueRange,
};
use serde_json::Value;

const AUTH_SCOPE: Scope = Scope::Spreadsheet;

fn to_value_range(range: &str, values: Vec<Vec<String>>) -> ValueRange {
    ValueRange {
        major_dimension: Some("ROWS".to_string()),
        range: Some(range.to_string()),
        values: Some(
            values
                .into_iter()
                .map(|row| row.into_iter().map(Value::String).collect())
                .collect(),
        ),
    }
}

fn cell_text(value: Value) -> String {
    match value {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

impl From<UpdateValuesResponse> for UpdateSummary {
    fn from(response: UpdateValuesResponse) -> Self {
        Self {
            updated_range: response.updated_range,
            updated_rows: response.updated_rows.unwrap_or_default(),
            updated_columns: response.updated_columns.unwrap_or_default(),
            updated_cells: response.updated_cells.unwrap_or_default(),
        }
    }
}

#[async_trait]
impl SheetsService for Sheets<HttpsConnector> {
    async fn get_values(&self, spreadsheet_id: &str, range: &str) -> Result<Vec<Vec<String>>> {
        let (_, response) = self
            .spreadsheets()
            .values_get(spreadsheet_id, range)
            .major_dimension("ROWS")
            .add_scope(AUTH_SCOPE)
            .doit()
            .await
            .map_err(|e| AppError::Sheets(format!("Failed to read range '{}': {}", range, e)))?;

        Ok(response
            .values
            .unwrap_or_default()
            .into_iter()
            .map(|row| row.into_iter().map(cell_text).collect())
            .collect())
    }

    async fn sheet_titles(&self, spreadsheet_id: &str) -> Result<Vec<String>> {
        let (_, spreadsheet) = self
            .spreadsheets()
            .get(spreadsheet_id)
            .include_grid_data(false)
            .param("fields", "sheets(properties(title))")
            .add_scope(AUTH_SCOPE)
            .doit()
            .await
            .map_err(|e| AppError::Sheets(format!("Failed to get spreadsheet: {}", e)))?;

        Ok(spreadsheet
            .sheets
            .unwrap_or_default()
            .into_iter()
            .filter_map(|sheet| sheet.properties.and_then(|p| p.title))
            .collect())
    }

    async fn update_values(
        &self,
        spreadsheet_id: &str,
        range: &str,
        values: Vec<Vec<String>>,
        input: ValueInputOption,
    ) -> Result<UpdateSummary> {
        let (_, response) = self
            .spreadsheets()
            .values_update(to_value_range(range, values), spreadsheet_id, range)
            .value_input_option(input.as_str())
            .add_scope(AUTH_SCOPE)
            .doit()
            .await
            .map_err(|e| AppError::Sheets(format!("Failed to update range '{}': {}", range, e)))?;

        Ok(response.into())
    }

    async fn append_values(
        &self,
        spreadsheet_id: &str,
        range: &str,
        values: Vec<Vec<String>>,
        input: ValueInputOption,
    ) -> Result<UpdateSummary> {
        let (_, response) = self
            .spreadsheets()
            .values_append(to_value_range(range, values), spreadsheet_id, range)
            .value_input_option(input.as_str())
            .add_scope(AUTH_SCOPE)
            .doit()
            .await
            .map_err(|e| AppError::Sheets(format!("Failed to append to '{}': {}", range, e)))?;

        Ok(response.updates.map(Into::into).unwrap_or_default())
    }

    async fn batch_update(
        &self,
        spreadsheet_id: &str,
        requests: Vec<Request>,
    ) -> Result<Vec<Reply>> {
        let batch_update = BatchUpdateSpreadsheetRequest {
            requests: Some(requests),
            ..Default::default()
        };

        let (_, response) = self
            .spreadsheets()
            .batch_update(batch_update, spreadsheet_id)
            .add_scope(AUTH_SCOPE)
            .doit()
            .await
            .map_err(|e| AppError::Sheets(format!("Batch update failed: {}", e)))?;

        Ok(response.replies.unwrap_or_default())
    }
}
