use super::{AuthorizationFlow, Credential};
use crate::error::{AppError, Result};
use async_trait::async_trait;
use chrono::DateTime;
use std::path::Path;
use tracing::instrument;

/// Headless flow for service accounts.
///
/// The "client secret" path points at the service account key file. Minted
/// tokens carry no refresh token, so an expired one is simply minted again.
#[derive(Debug, Clone, Default)]
pub struct ServiceAccountFlow;

#[async_trait]
impl AuthorizationFlow for ServiceAccountFlow {
    #[instrument(name = "Authorizing service account", skip_all)]
    async fn authorize(&self, client_secret_path: &Path, scopes: &[String]) -> Result<Credential> {
        let key = yup_oauth2::read_service_account_key(client_secret_path)
            .await
            .map_err(|e| {
                AppError::Auth(format!(
                    "Failed to read service account key {}: {}",
                    client_secret_path.display(),
                    e
                ))
            })?;
        let client_email = key.client_email.clone();
        let token_uri = key.token_uri.clone();

        let auth = yup_oauth2::ServiceAccountAuthenticator::builder(key)
            .build()
            .await
            .map_err(|e| AppError::Auth(format!("Failed to build authenticator: {}", e)))?;

        let token = auth
            .token(scopes)
            .await
            .map_err(|e| AppError::Auth(format!("Failed to get token: {}", e)))?;

        let access_token = token
            .token()
            .ok_or_else(|| AppError::Auth("Service account token is empty".to_string()))?
            .to_string();
        let expiry = token
            .expiration_time()
            .and_then(|at| DateTime::from_timestamp(at.unix_timestamp(), 0));

        Ok(Credential {
            access_token,
            refresh_token: None,
            token_uri: Some(token_uri),
            client_id: Some(client_email),
            client_secret: None,
            scopes: scopes.to_vec(),
            expiry,
        })
    }

    async fn refresh(&self, _credential: &Credential) -> Result<Credential> {
        Err(AppError::Auth(
            "Service account credentials are re-minted, not refreshed".to_string(),
        ))
    }
}
