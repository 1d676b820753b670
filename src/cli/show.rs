use super::Context;
use clap::Subcommand;
use gworkspace_client::Result;
use gworkspace_client::config::Config;
use tracing::info;

#[derive(Subcommand, Debug)]
pub enum ShowResource {
    /// Show configuration, token and cache paths
    Paths,
}

impl ShowResource {
    pub async fn execute(&self, context: &Context) -> Result<()> {
        match self {
            ShowResource::Paths => show_paths(context),
        }
    }
}

fn show_paths(context: &Context) -> Result<()> {
    let config_path = Config::config_file()?;
    let cache_dir = Config::cache_dir()?;

    info!(path = ?config_path, "Config path");
    info!(path = ?cache_dir, "Cache path");
    info!(path = ?context.client_secret_path()?, "Client secret path");
    info!(path = ?context.drive_token_path()?, "Drive token path");
    info!(path = ?context.sheets_token_path()?, "Sheets token path");

    Ok(())
}
