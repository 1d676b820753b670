use super::Context;
use clap::{Subcommand, ValueEnum};
use gworkspace_client::Result;
use gworkspace_client::auth::clear_tokens;
use gworkspace_client::facade::{ApiFacade, DriveApi, SheetsApi, connect};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum Api {
    Drive,
    Sheets,
}

#[derive(Subcommand, Debug)]
pub enum AuthCommand {
    /// Obtain (or verify) a stored credential
    Login {
        api: Api,

        /// Delete the stored credential first
        #[arg(long)]
        reset: bool,
    },
    /// Delete a stored credential
    Clear { api: Api },
}

impl AuthCommand {
    pub async fn execute(&self, context: &Context) -> Result<()> {
        match self {
            AuthCommand::Login { api, reset } => login(context, *api, *reset).await,
            AuthCommand::Clear { api } => clear_tokens(&token_path(context, *api)?),
        }
    }
}

fn token_path(context: &Context, api: Api) -> Result<PathBuf> {
    match api {
        Api::Drive => context.drive_token_path(),
        Api::Sheets => context.sheets_token_path(),
    }
}

async fn login(context: &Context, api: Api, reset: bool) -> Result<()> {
    let token_path = token_path(context, api)?;
    if reset {
        clear_tokens(&token_path)?;
    }

    match api {
        Api::Drive => verify::<DriveApi>(context, &token_path).await?,
        Api::Sheets => verify::<SheetsApi>(context, &token_path).await?,
    }

    info!(?api, "Authentication verified");
    Ok(())
}

async fn verify<A: ApiFacade>(context: &Context, token_path: &Path) -> Result<()> {
    connect::<A, _>(token_path, &context.client_secret_path()?, context.flow()).await?;
    Ok(())
}
