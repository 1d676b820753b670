mod client;
mod hub;
#[cfg(test)]
pub(crate) mod mocks;

pub use client::DriveClient;

use crate::error::{AppError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const FOLDER_MIME_TYPE: &str = "application/vnd.google-apps.folder";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FileEntry {
    pub name: String,
    pub id: String,
}

/// One page of a `files.list` response.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilePage {
    pub entries: Vec<FileEntry>,
    pub next_page_token: Option<String>,
}

/// Metadata for a file about to be created or copied.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewFile {
    pub name: String,
    pub parents: Vec<String>,
    pub mime_type: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionRole {
    Reader,
    Commenter,
    Editor,
}

impl PermissionRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            PermissionRole::Reader => "reader",
            PermissionRole::Commenter => "commenter",
            PermissionRole::Editor => "editor",
        }
    }
}

impl fmt::Display for PermissionRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PermissionRole {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "reader" => Ok(PermissionRole::Reader),
            "commenter" => Ok(PermissionRole::Commenter),
            "editor" => Ok(PermissionRole::Editor),
            other => Err(AppError::Config(format!(
                "Unknown permission role '{}', expected reader, commenter or editor",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionGrant {
    pub user_email: String,
    pub file_id: String,
    pub role: PermissionRole,
}

/// Google Workspace document kinds that can be created empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkspaceType {
    Spreadsheet,
    Document,
    Presentation,
    Form,
    Drawing,
}

impl WorkspaceType {
    pub fn mime_type(&self) -> String {
        let kind = match self {
            WorkspaceType::Spreadsheet => "spreadsheet",
            WorkspaceType::Document => "document",
            WorkspaceType::Presentation => "presentation",
            WorkspaceType::Form => "form",
            WorkspaceType::Drawing => "drawing",
        };
        format!("application/vnd.google-apps.{}", kind)
    }
}

impl FromStr for WorkspaceType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "spreadsheet" => Ok(WorkspaceType::Spreadsheet),
            "document" => Ok(WorkspaceType::Document),
            "presentation" => Ok(WorkspaceType::Presentation),
            "form" => Ok(WorkspaceType::Form),
            "drawing" => Ok(WorkspaceType::Drawing),
            other => Err(AppError::Config(format!("Unknown file type '{}'", other))),
        }
    }
}

/// The Drive v3 calls the client is built from. Errors are `AppError::Drive`.
#[async_trait]
pub trait DriveService: Send + Sync {
    async fn list_page(&self, query: &str, page_token: Option<&str>) -> Result<FilePage>;

    async fn create(&self, metadata: NewFile) -> Result<String>;

    async fn upload(
        &self,
        metadata: NewFile,
        content: std::fs::File,
        mime_type: mime::Mime,
    ) -> Result<String>;

    async fn copy(&self, source_id: &str, metadata: NewFile) -> Result<String>;

    async fn parents(&self, file_id: &str) -> Result<Vec<String>>;

    /// Add `add_parent` and drop `remove_parents` in one update; returns the new parent list.
    async fn update_parents(
        &self,
        file_id: &str,
        add_parent: &str,
        remove_parents: &[String],
    ) -> Result<Vec<String>>;

    async fn create_permission(&self, grant: &PermissionGrant) -> Result<String>;

    async fn download(&self, file_id: &str) -> Result<Vec<u8>>;

    async fn export(&self, file_id: &str, mime_type: &str) -> Result<Vec<u8>>;
}
