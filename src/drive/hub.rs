use super::{DriveService, FileEntry, FilePage, NewFile, PermissionGrant};
use crate::error::{AppError, Result};
use crate::facade::HttpsConnector;
use async_trait::async_trait;
use google_drive3::DriveHub;
use google_drive3::api::{File, Permission, Scope};
use google_drive3::common::Response;
use google_drive3::hyper::header::CONTENT_LENGTH;
use http_body_util::BodyExt;
use indicatif::ProgressStyle;
use mime::APPLICATION_OCTET_STREAM;
use std::io::Cursor;
use tracing::{Span, debug, instrument};
use tracing_indicatif::span_ext::IndicatifSpanExt;

// Full access: listing, sharing and moving files the app did not create
const AUTH_SCOPE: Scope = Scope::Full;

const PAGE_SIZE: i32 = 100;
const LIST_FIELDS: &str = "nextPageToken, files(id, name)";

impl From<NewFile> for File {
    fn from(metadata: NewFile) -> Self {
        File {
            name: Some(metadata.name),
            parents: Some(metadata.parents).filter(|parents| !parents.is_empty()),
            mime_type: metadata.mime_type,
            ..Default::default()
        }
    }
}

fn created_id(file: File, action: &str) -> Result<String> {
    file.id
        .ok_or_else(|| AppError::Drive(format!("{} returned no file id", action)))
}

#[async_trait]
impl DriveService for DriveHub<HttpsConnector> {
    async fn list_page(&self, query: &str, page_token: Option<&str>) -> Result<FilePage> {
        let mut call = self
            .files()
            .list()
            .q(query)
            .page_size(PAGE_SIZE)
            .param("fields", LIST_FIELDS)
            .add_scope(AUTH_SCOPE);
        if let Some(token) = page_token {
            call = call.page_token(token);
        }

        let (_, file_list) = call
            .doit()
            .await
            .map_err(|e| AppError::Drive(format!("Failed to list files: {}", e)))?;

        let entries = file_list
            .files
            .unwrap_or_default()
            .into_iter()
            .map(|file| FileEntry {
                name: file.name.unwrap_or_default(),
                id: file.id.unwrap_or_default(),
            })
            .collect();

        Ok(FilePage {
            entries,
            next_page_token: file_list.next_page_token,
        })
    }

    async fn create(&self, metadata: NewFile) -> Result<String> {
        // Folders and Workspace documents are metadata only, sent with an empty media part
        let (_, file) = self
            .files()
            .create(metadata.into())
            .param("fields", "id")
            .add_scope(AUTH_SCOPE)
            .upload(Cursor::new(Vec::<u8>::new()), APPLICATION_OCTET_STREAM)
            .await
            .map_err(|e| AppError::Drive(format!("Failed to create file: {}", e)))?;

        created_id(file, "Create")
    }

    async fn upload(
        &self,
        metadata: NewFile,
        content: std::fs::File,
        mime_type: mime::Mime,
    ) -> Result<String> {
        let (_, file) = self
            .files()
            .create(metadata.into())
            .param("fields", "id")
            .add_scope(AUTH_SCOPE)
            .upload(content, mime_type)
            .await
            .map_err(|e| AppError::Drive(format!("Failed to upload file: {}", e)))?;

        created_id(file, "Upload")
    }

    async fn copy(&self, source_id: &str, metadata: NewFile) -> Result<String> {
        let (_, file) = self
            .files()
            .copy(metadata.into(), source_id)
            .param("fields", "id")
            .add_scope(AUTH_SCOPE)
            .doit()
            .await
            .map_err(|e| AppError::Drive(format!("Failed to copy file: {}", e)))?;

        created_id(file, "Copy")
    }

    async fn parents(&self, file_id: &str) -> Result<Vec<String>> {
        let (_, file) = self
            .files()
            .get(file_id)
            .param("fields", "parents")
            .add_scope(AUTH_SCOPE)
            .doit()
            .await
            .map_err(|e| AppError::Drive(format!("Failed to get file parents: {}", e)))?;

        Ok(file.parents.unwrap_or_default())
    }

    async fn update_parents(
        &self,
        file_id: &str,
        add_parent: &str,
        remove_parents: &[String],
    ) -> Result<Vec<String>> {
        let mut call = self
            .files()
            .update(File::default(), file_id)
            .add_parents(add_parent)
            .param("fields", "id, parents")
            .add_scope(AUTH_SCOPE);
        if !remove_parents.is_empty() {
            call = call.remove_parents(&remove_parents.join(","));
        }

        let (_, file) = call
            .doit_without_upload()
            .await
            .map_err(|e| AppError::Drive(format!("Failed to move file: {}", e)))?;

        Ok(file.parents.unwrap_or_default())
    }

    async fn create_permission(&self, grant: &PermissionGrant) -> Result<String> {
        let permission = Permission {
            type_: Some("user".to_string()),
            role: Some(grant.role.to_string()),
            email_address: Some(grant.user_email.clone()),
            ..Default::default()
        };

        let (_, created) = self
            .permissions()
            .create(permission, &grant.file_id)
            .param("fields", "id")
            .add_scope(AUTH_SCOPE)
            .doit()
            .await
            .map_err(|e| AppError::Drive(format!("Failed to create permission: {}", e)))?;

        created
            .id
            .ok_or_else(|| AppError::Drive("Permission create returned no id".to_string()))
    }

    #[instrument(name = "Downloading", skip(self))]
    async fn download(&self, file_id: &str) -> Result<Vec<u8>> {
        let (response, _) = self
            .files()
            .get(file_id)
            .param("alt", "media")
            .add_scope(AUTH_SCOPE)
            .doit()
            .await
            .map_err(|e| AppError::Drive(format!("Failed to download file: {}", e)))?;

        read_body(response).await
    }

    #[instrument(name = "Exporting", skip(self))]
    async fn export(&self, file_id: &str, mime_type: &str) -> Result<Vec<u8>> {
        let response = self
            .files()
            .export(file_id, mime_type)
            .add_scope(AUTH_SCOPE)
            .doit()
            .await
            .map_err(|e| AppError::Drive(format!("Failed to export file: {}", e)))?;

        read_body(response).await
    }
}

/// Drain a media response chunk by chunk, advancing the span's progress bar.
async fn read_body(response: Response) -> Result<Vec<u8>> {
    let span = Span::current();
    span.pb_set_style(
        &ProgressStyle::with_template("[{elapsed_precise}] {bytes}/{total_bytes} {msg}")
            .map_err(|e| AppError::Other(e.into()))?,
    );

    let total = response
        .headers()
        .get(CONTENT_LENGTH)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse::<u64>().ok());
    if let Some(total) = total {
        span.pb_set_length(total);
    }

    let mut body = response.into_body();
    let mut content = Vec::with_capacity(total.unwrap_or_default() as usize);
    while let Some(frame) = body.frame().await {
        let frame =
            frame.map_err(|e| AppError::Drive(format!("Failed to read response body: {}", e)))?;
        if let Ok(chunk) = frame.into_data() {
            span.pb_inc(chunk.len() as u64);
            content.extend_from_slice(&chunk);
        }
    }
    debug!(bytes = content.len(), "Received content");

    Ok(content)
}
