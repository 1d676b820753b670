use super::{AuthorizationFlow, Credential};
use crate::error::Result;
use std::path::Path;
use tracing::{debug, info, instrument};

/// Loads, refreshes or re-acquires a credential and keeps the token file in sync.
pub struct CredentialProvider<F> {
    flow: F,
}

impl<F: AuthorizationFlow> CredentialProvider<F> {
    pub fn new(flow: F) -> Self {
        Self { flow }
    }

    /// Get a valid credential for `scopes`, refreshing or re-authorizing as needed.
    ///
    /// The token file is rewritten after every refresh or authorization. Any
    /// failure is returned to the caller: there is no partial credential.
    #[instrument(name = "Acquiring credentials", skip_all, fields(token = %token_path.display()))]
    pub async fn acquire(
        &self,
        token_path: &Path,
        client_secret_path: &Path,
        scopes: &[String],
    ) -> Result<Credential> {
        let cached = Credential::load(token_path)?.filter(|credential| {
            let covered = credential.covers(scopes);
            if !covered {
                debug!(granted = ?credential.scopes, "Cached credentials lack requested scopes");
            }
            covered
        });

        let credential = match cached {
            Some(credential) if credential.is_valid() => {
                debug!("Using cached credentials");
                return Ok(credential);
            }
            Some(credential) if credential.is_expired() && credential.can_refresh() => {
                debug!("Access token expired, refreshing...");
                self.flow.refresh(&credential).await?
            }
            _ => {
                debug!("No usable cached credentials, authorizing...");
                self.flow.authorize(client_secret_path, scopes).await?
            }
        };

        credential.save(token_path)?;
        info!("Saved credentials");

        Ok(credential)
    }
}
