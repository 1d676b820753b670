use crate::auth::{AuthorizationFlow, Credential, CredentialProvider};
use crate::error::Result;
use google_drive3::DriveHub;
use google_sheets4::Sheets;
use hyper_util::client::legacy::Client;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::rt::TokioExecutor;
use std::path::Path;

pub type HttpsConnector = hyper_rustls::HttpsConnector<HttpConnector>;

/// A Google API reachable with a single credential scope set.
pub trait ApiFacade {
    type Service;

    const SCOPES: &'static [&'static str];

    fn build_service(credential: &Credential) -> Result<Self::Service>;
}

pub struct DriveApi;

impl ApiFacade for DriveApi {
    type Service = DriveHub<HttpsConnector>;

    const SCOPES: &'static [&'static str] = &["https://www.googleapis.com/auth/drive"];

    fn build_service(credential: &Credential) -> Result<Self::Service> {
        let client = Client::builder(TokioExecutor::new()).build(https_connector()?);
        Ok(DriveHub::new(client, credential.access_token.clone()))
    }
}

pub struct SheetsApi;

impl ApiFacade for SheetsApi {
    type Service = Sheets<HttpsConnector>;

    const SCOPES: &'static [&'static str] = &["https://www.googleapis.com/auth/spreadsheets"];

    fn build_service(credential: &Credential) -> Result<Self::Service> {
        let client = Client::builder(TokioExecutor::new()).build(https_connector()?);
        Ok(Sheets::new(client, credential.access_token.clone()))
    }
}

/// Acquire a credential for `A`'s scopes and build its service.
pub async fn connect<A, F>(
    token_path: &Path,
    client_secret_path: &Path,
    flow: F,
) -> Result<A::Service>
where
    A: ApiFacade,
    F: AuthorizationFlow,
{
    let scopes: Vec<String> = A::SCOPES.iter().map(|s| s.to_string()).collect();
    let credential = CredentialProvider::new(flow)
        .acquire(token_path, client_secret_path, &scopes)
        .await?;

    A::build_service(&credential)
}

fn https_connector() -> Result<HttpsConnector> {
    Ok(hyper_rustls::HttpsConnectorBuilder::new()
        .with_native_roots()?
        .https_or_http()
        .enable_http1()
        .build())
}
