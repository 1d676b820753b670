//! Google Drive and Google Sheets clients bound to a cached OAuth2 credential.

pub mod auth;
pub mod config;
pub mod drive;
pub mod error;
pub mod facade;
pub mod sheets;

pub use auth::{
    AuthorizationFlow, Credential, CredentialProvider, InstalledFlow, ServiceAccountFlow,
};
pub use drive::DriveClient;
pub use error::{AppError, Result};
pub use sheets::SheetClient;
