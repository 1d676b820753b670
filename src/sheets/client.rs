use super::{
    Dimension, SheetRange, SheetsService, SpreadsheetTarget, TabularData, UpdateSummary,
    ValueInputOption, quote_title,
};
use crate::auth::{AuthorizationFlow, InstalledFlow};
use crate::drive::{DriveClient, DriveService, WorkspaceType};
use crate::error::{AppError, Result};
use crate::facade::{HttpsConnector, SheetsApi, connect};
use google_sheets4::FieldMask;
use google_sheets4::Sheets;
use google_sheets4::api::{
    AddSheetRequest, Color, DimensionProperties, DimensionRange, Request, SheetProperties,
    UpdateDimensionPropertiesRequest,
};
use std::path::Path;
use tracing::{debug, error, info, instrument};

/// Google Sheets wrapper bound to one credential and one spreadsheet.
pub struct SheetClient<S = Sheets<HttpsConnector>> {
    service: S,
    target: SpreadsheetTarget,
}

impl SheetClient {
    /// Create a new SheetClient for `url_or_id` with authenticated access
    #[instrument(name = "Authenticating to Google Sheets", skip_all)]
    pub async fn new(
        token_path: &Path,
        client_secret_path: &Path,
        url_or_id: &str,
    ) -> Result<Self> {
        Self::with_flow(
            token_path,
            client_secret_path,
            url_or_id,
            InstalledFlow::default(),
        )
        .await
    }

    pub async fn with_flow<F: AuthorizationFlow>(
        token_path: &Path,
        client_secret_path: &Path,
        url_or_id: &str,
        flow: F,
    ) -> Result<Self> {
        let target = SpreadsheetTarget::parse(url_or_id)?;
        let service = connect::<SheetsApi, F>(token_path, client_secret_path, flow).await?;
        Ok(Self { service, target })
    }
}

impl<S: SheetsService> SheetClient<S> {
    pub fn from_service(service: S, url_or_id: &str) -> Result<Self> {
        Ok(Self {
            service,
            target: SpreadsheetTarget::parse(url_or_id)?,
        })
    }

    pub fn sheet_id(&self) -> &str {
        &self.target.sheet_id
    }

    pub fn sheet_url(&self) -> &str {
        &self.target.sheet_url
    }

    /// Every populated row of the named sheet, exactly as returned.
    #[instrument(name = "Reading sheet", skip(self))]
    pub async fn read_sheet(&self, title: &str) -> Result<Vec<Vec<String>>> {
        let rows = self
            .service
            .get_values(self.sheet_id(), &quote_title(title))
            .await
            .inspect_err(|e| error!(error = %e, "Failed to read sheet"))?;
        debug!(rows = rows.len(), "Read sheet");
        Ok(rows)
    }

    #[instrument(name = "Listing sheet titles", skip(self))]
    pub async fn sheet_titles(&self) -> Result<Vec<String>> {
        self.service
            .sheet_titles(self.sheet_id())
            .await
            .inspect_err(|e| error!(error = %e, "Failed to list sheet titles"))
    }

    /// Create a spreadsheet named `name` in `folder_id`, fill `title` with `data`
    /// and return a client bound to it.
    ///
    /// The file is created through `drive`, which may hold different
    /// credentials from `service`.
    #[instrument(name = "Creating spreadsheet", skip(service, drive, data))]
    pub async fn create_sheet_file<D: DriveService>(
        service: S,
        drive: &DriveClient<D>,
        name: &str,
        data: &TabularData,
        folder_id: &str,
        title: &str,
    ) -> Result<(Self, UpdateSummary)> {
        let sheet_id = drive
            .create_file(folder_id, name, WorkspaceType::Spreadsheet)
            .await?;

        let client = Self {
            service,
            target: SpreadsheetTarget::from_id(&sheet_id),
        };
        info!(url = %client.sheet_url(), "Created spreadsheet");

        let summary = client.write_sheet(title, data).await?;
        Ok((client, summary))
    }

    /// Overwrite `title` from A1 with the header and rows of `data`.
    #[instrument(name = "Writing sheet", skip(self, data))]
    pub async fn write_sheet(&self, title: &str, data: &TabularData) -> Result<UpdateSummary> {
        let range = SheetRange::from_origin(title, data.column_count(), data.row_count() + 1);
        debug!(%range, "Writing table");

        let summary = self
            .service
            .update_values(
                self.sheet_id(),
                &range.to_string(),
                data.to_values(),
                ValueInputOption::UserEntered,
            )
            .await
            .inspect_err(|e| error!(error = %e, "Failed to write sheet"))?;
        info!(cells = summary.updated_cells, "Wrote sheet");
        Ok(summary)
    }

    /// Set the pixel size of rows or columns `[start, end)` on the sheet with id `sheet_index`.
    #[instrument(name = "Resizing cells", skip(self))]
    pub async fn resize_cells(
        &self,
        sheet_index: i32,
        dimension: Dimension,
        start: i32,
        end: i32,
        pixel_size: i32,
    ) -> Result<()> {
        if start > end {
            return Err(AppError::Config(format!(
                "Invalid {} span: start {} is after end {}",
                dimension, start, end
            )));
        }

        let request = Request {
            update_dimension_properties: Some(UpdateDimensionPropertiesRequest {
                range: Some(DimensionRange {
                    sheet_id: Some(sheet_index),
                    dimension: Some(dimension.to_string()),
                    start_index: Some(start),
                    end_index: Some(end),
                }),
                properties: Some(DimensionProperties {
                    pixel_size: Some(pixel_size),
                    ..Default::default()
                }),
                fields: Some(FieldMask::new(&["pixelSize"])),
                ..Default::default()
            }),
            ..Default::default()
        };

        self.service
            .batch_update(self.sheet_id(), vec![request])
            .await
            .inspect_err(|e| error!(error = %e, "Failed to resize cells"))?;
        Ok(())
    }

    /// Add a tab named `title` and return its numeric sheet id.
    #[instrument(name = "Adding sheet", skip(self))]
    pub async fn add_sheet(&self, title: &str) -> Result<i32> {
        let request = Request {
            add_sheet: Some(AddSheetRequest {
                properties: Some(SheetProperties {
                    title: Some(title.to_string()),
                    tab_color: Some(Color {
                        blue: Some(0.5),
                        ..Default::default()
                    }),
                    ..Default::default()
                }),
            }),
            ..Default::default()
        };

        let replies = self
            .service
            .batch_update(self.sheet_id(), vec![request])
            .await
            .inspect_err(|e| error!(error = %e, "Failed to add sheet"))?;

        let sheet_id = replies
            .into_iter()
            .next()
            .and_then(|reply| reply.add_sheet)
            .and_then(|add_sheet| add_sheet.properties)
            .and_then(|properties| properties.sheet_id)
            .ok_or_else(|| AppError::Sheets("Add sheet reply has no sheet id".to_string()))?;
        info!(sheet_id, "Added sheet");
        Ok(sheet_id)
    }

    /// Write `values` into `range` as given.
    #[instrument(name = "Updating values", skip(self, values))]
    pub async fn update_values(
        &self,
        range: &str,
        values: Vec<Vec<String>>,
        input: ValueInputOption,
    ) -> Result<UpdateSummary> {
        self.service
            .update_values(self.sheet_id(), range, values, input)
            .await
            .inspect_err(|e| error!(error = %e, "Failed to update values"))
    }

    /// Write `values` after the last populated row of the table at `range`.
    #[instrument(name = "Appending values", skip(self, values))]
    pub async fn append_values(
        &self,
        range: &str,
        values: Vec<Vec<String>>,
        input: ValueInputOption,
    ) -> Result<UpdateSummary> {
        self.service
            .append_values(self.sheet_id(), range, values, input)
            .await
            .inspect_err(|e| error!(error = %e, "Failed to append values"))
    }
}
