use super::Context;
use clap::Subcommand;
use gworkspace_client::sheets::{Dimension, TabularData, ValueInputOption, rows_from_csv, write_csv};
use gworkspace_client::{Result, SheetClient};
use std::fs::File;
use std::path::PathBuf;
use tracing::info;

#[derive(Subcommand, Debug)]
pub enum SheetsCommand {
    /// Print a sheet as CSV
    Read { sheet: String, title: String },
    /// List the tab titles of a spreadsheet
    Titles { sheet: String },
    /// Overwrite a tab with a CSV file (first record is the header)
    Write {
        sheet: String,
        title: String,
        csv: PathBuf,
    },
    /// Create a spreadsheet in a Drive folder from a CSV file
    Create {
        folder: String,
        name: String,
        csv: PathBuf,
        #[arg(long, default_value = "Sheet1")]
        title: String,
    },
    /// Write CSV rows into a range
    Update {
        sheet: String,
        range: String,
        csv: PathBuf,
        /// Store values verbatim instead of parsing formulas and numbers
        #[arg(long)]
        raw: bool,
    },
    /// Append CSV rows after the last row of a range
    Append {
        sheet: String,
        range: String,
        csv: PathBuf,
        #[arg(long)]
        raw: bool,
    },
    /// Set the pixel size of rows or columns [start, end)
    Resize {
        sheet: String,
        sheet_index: i32,
        dimension: Dimension,
        start: i32,
        end: i32,
        pixel_size: i32,
    },
    /// Add a tab
    AddTab { sheet: String, title: String },
}

fn input_option(raw: bool) -> ValueInputOption {
    match raw {
        true => ValueInputOption::Raw,
        false => ValueInputOption::UserEntered,
    }
}

impl SheetsCommand {
    pub async fn execute(&self, context: &Context) -> Result<()> {
        match self {
            SheetsCommand::Read { sheet, title } => {
                let rows = context.sheets(sheet).await?.read_sheet(title).await?;
                write_csv(&rows, std::io::stdout().lock())?;
            }
            SheetsCommand::Titles { sheet } => {
                for title in context.sheets(sheet).await?.sheet_titles().await? {
                    println!("{}", title);
                }
            }
            SheetsCommand::Write { sheet, title, csv } => {
                let data = TabularData::from_csv(File::open(csv)?)?;
                context.sheets(sheet).await?.write_sheet(title, &data).await?;
            }
            SheetsCommand::Create {
                folder,
                name,
                csv,
                title,
            } => {
                let data = TabularData::from_csv(File::open(csv)?)?;
                let drive = context.drive().await?;
                let service = context.sheets_service().await?;
                let (created, summary) =
                    SheetClient::create_sheet_file(service, &drive, name, &data, folder, title)
                        .await?;
                info!(cells = summary.updated_cells, "Spreadsheet ready");
                println!("{}", created.sheet_url());
            }
            SheetsCommand::Update {
                sheet,
                range,
                csv,
                raw,
            } => {
                let rows = rows_from_csv(File::open(csv)?)?;
                let summary = context
                    .sheets(sheet)
                    .await?
                    .update_values(range, rows, input_option(*raw))
                    .await?;
                info!(range = ?summary.updated_range, cells = summary.updated_cells, "Updated");
            }
            SheetsCommand::Append {
                sheet,
                range,
                csv,
                raw,
            } => {
                let rows = rows_from_csv(File::open(csv)?)?;
                let summary = context
                    .sheets(sheet)
                    .await?
                    .append_values(range, rows, input_option(*raw))
                    .await?;
                info!(range = ?summary.updated_range, cells = summary.updated_cells, "Appended");
            }
            SheetsCommand::Resize {
                sheet,
                sheet_index,
                dimension,
                start,
                end,
                pixel_size,
            } => {
                context
                    .sheets(sheet)
                    .await?
                    .resize_cells(*sheet_index, *dimension, *start, *end, *pixel_size)
                    .await?;
            }
            SheetsCommand::AddTab { sheet, title } => {
                let sheet_id = context.sheets(sheet).await?.add_sheet(title).await?;
                println!("{}", sheet_id);
            }
        }

        Ok(())
    }
}
