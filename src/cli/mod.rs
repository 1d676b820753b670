mod auth;
mod drive;
mod sheets;
mod show;

use clap::{Args, Parser, Subcommand};
use google_sheets4::Sheets;
use gworkspace_client::auth::{AuthorizationFlow, InstalledFlow, ServiceAccountFlow};
use gworkspace_client::config::Config;
use gworkspace_client::facade::{HttpsConnector, SheetsApi, connect};
use gworkspace_client::{DriveClient, Result, SheetClient};
use std::path::PathBuf;

pub use auth::AuthCommand;
pub use drive::DriveCommand;
pub use sheets::SheetsCommand;
pub use show::ShowResource;

#[derive(Parser, Debug)]
#[command(name = "gworkspace")]
#[command(about = "Manage Google Drive files and Google Sheets data", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(flatten)]
    pub options: GlobalOptions,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Args, Debug, Clone, Default)]
pub struct GlobalOptions {
    /// Token file for Drive access
    #[arg(long, global = true)]
    pub drive_token: Option<PathBuf>,

    /// Token file for Sheets access
    #[arg(long, global = true)]
    pub sheets_token: Option<PathBuf>,

    /// OAuth client secret, or service account key with --service-account
    #[arg(long, global = true)]
    pub client_secret: Option<PathBuf>,

    /// Authenticate as a service account instead of through the browser
    #[arg(long, global = true)]
    pub service_account: bool,
}

impl Cli {
    pub async fn run(&self) -> Result<()> {
        let context = Context::new(Config::load()?, self.options.clone());

        match &self.command {
            Commands::Drive { command } => command.execute(&context).await,
            Commands::Sheets { command } => command.execute(&context).await,
            Commands::Auth { command } => command.execute(&context).await,
            Commands::Show { resource } => resource.execute(&context).await,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Google Drive files and folders
    Drive {
        #[command(subcommand)]
        command: DriveCommand,
    },
    /// Google Sheets values and tabs
    Sheets {
        #[command(subcommand)]
        command: SheetsCommand,
    },
    /// Stored credentials
    Auth {
        #[command(subcommand)]
        command: AuthCommand,
    },
    Show {
        #[command(subcommand)]
        resource: ShowResource,
    },
}

/// Config file merged with command-line overrides.
pub struct Context {
    config: Config,
    options: GlobalOptions,
}

impl Context {
    pub fn new(config: Config, options: GlobalOptions) -> Self {
        Self { config, options }
    }

    pub fn flow(&self) -> Box<dyn AuthorizationFlow> {
        match self.options.service_account {
            true => Box::new(ServiceAccountFlow),
            false => Box::new(InstalledFlow::default()),
        }
    }

    pub fn drive_token_path(&self) -> Result<PathBuf> {
        self.config
            .resolve_drive_token_path(self.options.drive_token.clone())
    }

    pub fn sheets_token_path(&self) -> Result<PathBuf> {
        self.config
            .resolve_sheets_token_path(self.options.sheets_token.clone())
    }

    pub fn client_secret_path(&self) -> Result<PathBuf> {
        self.config
            .resolve_client_secret_path(self.options.client_secret.clone())
    }

    pub async fn drive(&self) -> Result<DriveClient> {
        DriveClient::with_flow(
            &self.drive_token_path()?,
            &self.client_secret_path()?,
            self.flow(),
        )
        .await
    }

    pub async fn sheets(&self, url_or_id: &str) -> Result<SheetClient> {
        SheetClient::with_flow(
            &self.sheets_token_path()?,
            &self.client_secret_path()?,
            url_or_id,
            self.flow(),
        )
        .await
    }

    /// A Sheets hub not yet bound to any spreadsheet.
    pub async fn sheets_service(&self) -> Result<Sheets<HttpsConnector>> {
        connect::<SheetsApi, _>(
            &self.sheets_token_path()?,
            &self.client_secret_path()?,
            self.flow(),
        )
        .await
    }
}
