use super::{AuthorizationFlow, Credential};
use crate::error::{AppError, Result};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use oauth2::basic::{BasicClient, BasicTokenResponse};
use oauth2::{
    AuthUrl, AuthorizationCode, ClientId, ClientSecret, CsrfToken, PkceCodeChallenge, RedirectUrl,
    RefreshToken, Scope, TokenResponse, TokenUrl,
};
use reqwest::redirect::Policy;
use std::path::Path;
use tiny_http::{Response, Server};
use tracing::{debug, instrument};
use url::Url;

const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

/// OAuth client identity recorded alongside the tokens so a refresh needs no secret file.
struct ClientInfo {
    client_id: String,
    client_secret: Option<String>,
    token_uri: String,
}

/// Browser consent flow for installed applications.
///
/// A loopback listener receives the redirect, so the user never copies a code
/// by hand. Port 0 lets the OS pick a free port.
#[derive(Debug, Clone, Default)]
pub struct InstalledFlow {
    port: u16,
}

impl InstalledFlow {
    pub fn with_port(port: u16) -> Self {
        Self { port }
    }

    fn http_client() -> Result<reqwest::Client> {
        reqwest::ClientBuilder::new()
            .redirect(Policy::none())
            .build()
            .map_err(|e| AppError::Auth(format!("Failed to build reqwest client: {}", e)))
    }

    /// Block until the browser hits the callback with a code, answering anything else with 404.
    fn wait_for_callback(server: &Server, port: u16) -> Result<Url> {
        loop {
            let request = server
                .recv()
                .map_err(|e| AppError::Auth(format!("Failed to receive request: {}", e)))?;

            let callback_url = format!("http://localhost:{}{}", port, request.url());
            let url = Url::parse(&callback_url)
                .map_err(|e| AppError::Auth(format!("Failed to parse callback URL: {}", e)))?;

            let is_callback = url
                .query_pairs()
                .any(|(key, _)| key == "code" || key == "error");
            if !is_callback {
                debug!(path = request.url(), "Ignoring request without a code");
                let _ = request.respond(Response::from_string("Not found").with_status_code(404));
                continue;
            }

            let response =
                Response::from_string("Authentication successful! You can close this window.");
            request
                .respond(response)
                .map_err(|e| AppError::Auth(format!("Failed to send response: {}", e)))?;

            return Ok(url);
        }
    }
}

#[async_trait]
impl AuthorizationFlow for InstalledFlow {
    #[instrument(name = "Authorizing in browser", skip_all)]
    async fn authorize(&self, client_secret_path: &Path, scopes: &[String]) -> Result<Credential> {
        let secret = yup_oauth2::read_application_secret(client_secret_path)
            .await
            .map_err(|e| {
                AppError::Auth(format!(
                    "Failed to read client secret {}: {}",
                    client_secret_path.display(),
                    e
                ))
            })?;

        // Bind first so the redirect URI carries the real port
        let bind_addr = format!("127.0.0.1:{}", self.port);
        let server = Server::http(&bind_addr)
            .map_err(|e| AppError::Auth(format!("Failed to bind to {}: {}", bind_addr, e)))?;
        let port = server
            .server_addr()
            .to_ip()
            .map(|addr| addr.port())
            .ok_or_else(|| AppError::Auth("Callback listener has no IP address".to_string()))?;

        let auth_url = AuthUrl::new(secret.auth_uri.clone())
            .map_err(|e| AppError::Auth(format!("Invalid auth URL: {}", e)))?;
        let token_url = TokenUrl::new(secret.token_uri.clone())
            .map_err(|e| AppError::Auth(format!("Invalid token URL: {}", e)))?;
        let redirect_url = RedirectUrl::new(format!("http://localhost:{}/", port))
            .map_err(|e| AppError::Auth(format!("Invalid redirect URL: {}", e)))?;

        let client = BasicClient::new(ClientId::new(secret.client_id.clone()))
            .set_client_secret(ClientSecret::new(secret.client_secret.clone()))
            .set_auth_uri(auth_url)
            .set_token_uri(token_url)
            .set_redirect_uri(redirect_url);

        let (pkce_challenge, pkce_verifier) = PkceCodeChallenge::new_random_sha256();
        let (auth_url, csrf_token) = client
            .authorize_url(CsrfToken::new_random)
            .add_scopes(scopes.iter().map(|s| Scope::new(s.clone())))
            .add_extra_param("access_type", "offline")
            .add_extra_param("prompt", "consent")
            .set_pkce_challenge(pkce_challenge)
            .url();

        println!("Open this URL in your browser:\n{}", auth_url);
        println!();
        println!("Waiting for authorization...");

        let url = Self::wait_for_callback(&server, port)?;

        if let Some((_, error)) = url.query_pairs().find(|(key, _)| key == "error") {
            return Err(AppError::Auth(format!("Authorization denied: {}", error)));
        }

        let code_pair = url
            .query_pairs()
            .find(|(key, _)| key == "code")
            .ok_or_else(|| AppError::Auth("No code in callback".to_string()))?;
        let code = AuthorizationCode::new(code_pair.1.into_owned());

        let state_pair = url
            .query_pairs()
            .find(|(key, _)| key == "state")
            .ok_or_else(|| AppError::Auth("No state in callback".to_string()))?;

        if state_pair.1.as_ref() != csrf_token.secret() {
            return Err(AppError::Auth("CSRF token mismatch".to_string()));
        }

        let token_result = client
            .exchange_code(code)
            .set_pkce_verifier(pkce_verifier)
            .request_async(&Self::http_client()?)
            .await
            .map_err(|e| AppError::Auth(format!("Failed to exchange code: {:?}", e)))?;

        let client_info = ClientInfo {
            client_id: secret.client_id,
            client_secret: Some(secret.client_secret).filter(|s| !s.is_empty()),
            token_uri: secret.token_uri,
        };

        Ok(credential_from_response(client_info, token_result, scopes, None))
    }

    #[instrument(name = "Refreshing access token", skip_all)]
    async fn refresh(&self, credential: &Credential) -> Result<Credential> {
        let refresh_token = credential
            .refresh_token
            .as_deref()
            .ok_or_else(|| AppError::Auth("No refresh token in credential".to_string()))?;
        let client_id = credential
            .client_id
            .clone()
            .ok_or_else(|| AppError::Auth("No client id in credential".to_string()))?;

        let token_uri = credential
            .token_uri
            .clone()
            .unwrap_or_else(|| GOOGLE_TOKEN_URL.to_string());
        let token_url = TokenUrl::new(token_uri.clone())
            .map_err(|e| AppError::Auth(format!("Invalid token URL: {}", e)))?;

        let mut client = BasicClient::new(ClientId::new(client_id.clone()))
            .set_token_uri(token_url);
        if let Some(client_secret) = &credential.client_secret {
            client = client.set_client_secret(ClientSecret::new(client_secret.clone()));
        }

        let token_result = client
            .exchange_refresh_token(&RefreshToken::new(refresh_token.to_string()))
            .request_async(&Self::http_client()?)
            .await
            .map_err(|e| AppError::Auth(format!("Failed to refresh token: {:?}", e)))?;

        let client_info = ClientInfo {
            client_id,
            client_secret: credential.client_secret.clone(),
            token_uri,
        };

        Ok(credential_from_response(
            client_info,
            token_result,
            &credential.scopes,
            Some(refresh_token),
        ))
    }
}

/// Build a credential from a token response.
///
/// Refresh responses usually omit the refresh token, so `fallback_refresh_token`
/// keeps the one we already had.
fn credential_from_response(
    client_info: ClientInfo,
    token_result: BasicTokenResponse,
    requested_scopes: &[String],
    fallback_refresh_token: Option<&str>,
) -> Credential {
    let refresh_token = token_result
        .refresh_token()
        .map(|token| token.secret().clone())
        .or_else(|| fallback_refresh_token.map(str::to_string));

    let scopes = match token_result.scopes() {
        Some(granted) => granted.iter().map(|s| s.as_str().to_string()).collect(),
        None => requested_scopes.to_vec(),
    };

    // Default to 1 hour if not provided
    let expires_in = token_result
        .expires_in()
        .map(|d| d.as_secs() as i64)
        .unwrap_or(3600);

    Credential {
        access_token: token_result.access_token().secret().clone(),
        refresh_token,
        token_uri: Some(client_info.token_uri),
        client_id: Some(client_info.client_id),
        client_secret: client_info.client_secret,
        scopes,
        expiry: Some(Utc::now() + Duration::seconds(expires_in)),
    }
}
