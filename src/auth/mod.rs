mod credential;
mod installed;
mod provider;
mod service_account;

pub use credential::Credential;
pub use installed::InstalledFlow;
pub use provider::CredentialProvider;
pub use service_account::ServiceAccountFlow;

use crate::error::{AppError, Result};
use async_trait::async_trait;
use std::fs;
use std::path::Path;
use tracing::{debug, info, instrument};

/// The step that obtains a brand new credential, or renews one, from the authorization server.
#[async_trait]
pub trait AuthorizationFlow: Send + Sync {
    async fn authorize(&self, client_secret_path: &Path, scopes: &[String]) -> Result<Credential>;

    async fn refresh(&self, credential: &Credential) -> Result<Credential>;
}

#[async_trait]
impl<F: AuthorizationFlow + ?Sized> AuthorizationFlow for Box<F> {
    async fn authorize(&self, client_secret_path: &Path, scopes: &[String]) -> Result<Credential> {
        (**self).authorize(client_secret_path, scopes).await
    }

    async fn refresh(&self, credential: &Credential) -> Result<Credential> {
        (**self).refresh(credential).await
    }
}

/// Clear cached tokens by deleting the token file
#[instrument(name = "Clearing auth tokens", skip_all, fields(token = %token_path.display()))]
pub fn clear_tokens(token_path: &Path) -> Result<()> {
    if !token_path.exists() {
        debug!("No tokens to clear");
        return Ok(());
    }

    fs::remove_file(token_path)
        .map_err(|e| AppError::Auth(format!("Failed to delete tokens file: {}", e)))?;
    info!("Cleared cached tokens");

    Ok(())
}
