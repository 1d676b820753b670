use super::{
    DriveService, FOLDER_MIME_TYPE, FileEntry, NewFile, PermissionGrant, PermissionRole,
    WorkspaceType,
};
use crate::auth::{AuthorizationFlow, InstalledFlow};
use crate::error::{AppError, Result};
use crate::facade::{DriveApi, HttpsConnector, connect};
use google_drive3::DriveHub;
use std::fs;
use std::path::Path;
use tracing::{debug, error, info, instrument, warn};

/// Google Drive wrapper bound to one credential.
pub struct DriveClient<S = DriveHub<HttpsConnector>> {
    service: S,
}

impl DriveClient {
    /// Create a new DriveClient with authenticated access
    ///
    /// Runs the browser consent flow when the token file is missing or cannot
    /// be refreshed.
    #[instrument(name = "Authenticating to Google Drive", skip_all)]
    pub async fn new(token_path: &Path, client_secret_path: &Path) -> Result<Self> {
        Self::with_flow(token_path, client_secret_path, InstalledFlow::default()).await
    }

    pub async fn with_flow<F: AuthorizationFlow>(
        token_path: &Path,
        client_secret_path: &Path,
        flow: F,
    ) -> Result<Self> {
        let service = connect::<DriveApi, F>(token_path, client_secret_path, flow).await?;
        Ok(Self { service })
    }
}

impl<S: DriveService> DriveClient<S> {
    pub fn from_service(service: S) -> Self {
        Self { service }
    }

    /// List files (not folders) directly under `folder_id`.
    ///
    /// `name_query` is an extra Drive query clause such as `name contains 'report'`;
    /// pass an empty string for none. Every page is fetched before returning.
    #[instrument(name = "Listing files", skip(self))]
    pub async fn list_files(&self, folder_id: &str, name_query: &str) -> Result<Vec<FileEntry>> {
        let query = list_query(folder_id, false, name_query);
        self.collect_pages(&query)
            .await
            .inspect_err(|e| error!(error = %e, "Failed to list files"))
    }

    /// List sub-folders directly under `parent_id`.
    #[instrument(name = "Listing folders", skip(self))]
    pub async fn list_folders(&self, parent_id: &str, name_query: &str) -> Result<Vec<FileEntry>> {
        let query = list_query(parent_id, true, name_query);
        self.collect_pages(&query)
            .await
            .inspect_err(|e| error!(error = %e, "Failed to list folders"))
    }

    async fn collect_pages(&self, query: &str) -> Result<Vec<FileEntry>> {
        let mut entries = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let page = self.service.list_page(query, page_token.as_deref()).await?;
            entries.extend(page.entries);

            match page.next_page_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        debug!(count = entries.len(), "Listed entries");
        Ok(entries)
    }

    async fn list_children(&self, parent_id: &str) -> Result<Vec<FileEntry>> {
        let mut entries = self.list_files(parent_id, "").await?;
        entries.extend(self.list_folders(parent_id, "").await?);
        Ok(entries)
    }

    /// Whether a file or folder with this id or name sits directly under `parent_id`.
    ///
    /// Lists the whole folder on every call.
    #[instrument(name = "Checking existence", skip(self))]
    pub async fn file_exists(&self, parent_id: &str, id_or_name: &str) -> Result<bool> {
        let exists = self
            .list_children(parent_id)
            .await?
            .iter()
            .any(|entry| entry.id == id_or_name || entry.name == id_or_name);

        if exists {
            info!("File exists");
        }
        Ok(exists)
    }

    /// Ids of every file or folder named exactly `name` under `folder_id`, as `(id, name)`.
    /// Drive does not enforce unique names, so there may be several.
    #[instrument(name = "Finding files by name", skip(self))]
    pub async fn get_file_ids(&self, folder_id: &str, name: &str) -> Result<Vec<(String, String)>> {
        let ids: Vec<(String, String)> = self
            .list_children(folder_id)
            .await?
            .into_iter()
            .filter(|entry| entry.name == name)
            .map(|entry| (entry.id, entry.name))
            .collect();

        debug!(count = ids.len(), "Found matching files");
        Ok(ids)
    }

    pub async fn grant_permission(
        &self,
        user_email: &str,
        file_id: &str,
        role: PermissionRole,
    ) -> Result<Vec<String>> {
        let grant = PermissionGrant {
            user_email: user_email.to_string(),
            file_id: file_id.to_string(),
            role,
        };
        self.grant_permissions(&[grant]).await
    }

    /// Grant each permission in turn and return the created permission ids.
    ///
    /// A failed grant is logged and skipped; an error is returned only when
    /// every grant failed.
    #[instrument(name = "Granting permissions", skip_all, fields(count = grants.len()))]
    pub async fn grant_permissions(&self, grants: &[PermissionGrant]) -> Result<Vec<String>> {
        let mut ids = Vec::new();
        let mut last_error = None;

        for grant in grants {
            match self.service.create_permission(grant).await {
                Ok(id) => {
                    info!(
                        permission_id = %id,
                        email = %grant.user_email,
                        role = %grant.role,
                        "Granted permission"
                    );
                    ids.push(id);
                }
                Err(e) => {
                    warn!(error = %e, email = %grant.user_email, "Failed to grant permission");
                    last_error = Some(e);
                }
            }
        }

        match last_error {
            Some(e) if ids.is_empty() => {
                error!(error = %e, "No permission could be granted");
                Err(e)
            }
            _ => Ok(ids),
        }
    }

    /// Create a folder under `parent_id` and return its id.
    ///
    /// With `exists_ok`, an existing folder with exactly this name is returned
    /// instead of creating a second one.
    #[instrument(name = "Creating folder", skip(self))]
    pub async fn create_folder(
        &self,
        parent_id: &str,
        name: &str,
        exists_ok: bool,
    ) -> Result<String> {
        if exists_ok {
            let query = format!("name = '{}'", escape_query_value(name));
            let existing = self.list_folders(parent_id, &query).await?;
            if let Some(folder) = existing.into_iter().find(|entry| entry.name == name) {
                debug!(folder_id = %folder.id, "Folder already exists");
                return Ok(folder.id);
            }
        }

        let metadata = NewFile {
            name: name.to_string(),
            parents: vec![parent_id.to_string()],
            mime_type: Some(FOLDER_MIME_TYPE.to_string()),
        };

        let id = self
            .service
            .create(metadata)
            .await
            .inspect_err(|e| error!(error = %e, "Failed to create folder"))?;
        info!(folder_id = %id, "Created folder");
        Ok(id)
    }

    /// Create an empty Workspace document (e.g. a spreadsheet) in `folder_id`.
    #[instrument(name = "Creating file", skip(self))]
    pub async fn create_file(
        &self,
        folder_id: &str,
        name: &str,
        file_type: WorkspaceType,
    ) -> Result<String> {
        let metadata = NewFile {
            name: name.to_string(),
            parents: vec![folder_id.to_string()],
            mime_type: Some(file_type.mime_type()),
        };

        let id = self
            .service
            .create(metadata)
            .await
            .inspect_err(|e| error!(error = %e, "Failed to create file"))?;
        info!(file_id = %id, "Created file");
        Ok(id)
    }

    #[instrument(name = "Copying file", skip(self))]
    pub async fn copy_file(
        &self,
        source_id: &str,
        target_folder_id: &str,
        name: &str,
    ) -> Result<String> {
        let metadata = NewFile {
            name: name.to_string(),
            parents: vec![target_folder_id.to_string()],
            mime_type: None,
        };

        let id = self
            .service
            .copy(source_id, metadata)
            .await
            .inspect_err(|e| error!(error = %e, "Failed to copy file"))?;
        info!(file_id = %id, "Copied file");
        Ok(id)
    }

    /// Make `folder_id` the only parent of `file_id`; returns the resulting parents.
    #[instrument(name = "Moving file", skip(self))]
    pub async fn move_file(&self, file_id: &str, folder_id: &str) -> Result<Vec<String>> {
        self.reparent(file_id, folder_id)
            .await
            .inspect_err(|e| error!(error = %e, "Failed to move file"))
    }

    async fn reparent(&self, file_id: &str, folder_id: &str) -> Result<Vec<String>> {
        // Keeping the target out of the removal list makes a repeated move a no-op
        let remove: Vec<String> = self
            .service
            .parents(file_id)
            .await?
            .into_iter()
            .filter(|parent| parent != folder_id)
            .collect();

        let parents = self
            .service
            .update_parents(file_id, folder_id, &remove)
            .await?;
        debug!(?parents, "Moved file");
        Ok(parents)
    }

    /// Upload a local file into `folder_id` under its own file name.
    ///
    /// The mime type is guessed from the extension when not given.
    #[instrument(name = "Uploading file", skip(self))]
    pub async fn upload_file(
        &self,
        folder_id: &str,
        local_path: &Path,
        mime_type: Option<&str>,
    ) -> Result<String> {
        let name = local_path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| {
                AppError::Config(format!("Not a file path: {}", local_path.display()))
            })?;

        let mime_type = match mime_type {
            Some(m) => m
                .parse::<mime::Mime>()
                .map_err(|e| AppError::Config(format!("Invalid mime type '{}': {}", m, e)))?,
            None => mime_guess::from_path(local_path).first_or_octet_stream(),
        };

        let content = fs::File::open(local_path)
            .inspect_err(|e| error!(error = %e, "Failed to open local file"))?;

        let metadata = NewFile {
            name: name.to_string(),
            parents: vec![folder_id.to_string()],
            mime_type: None,
        };

        let id = self
            .service
            .upload(metadata, content, mime_type)
            .await
            .inspect_err(|e| error!(error = %e, "Failed to upload file"))?;
        info!(file_id = %id, "Uploaded file");
        Ok(id)
    }

    /// Download a binary file to `dest_path` and return its content.
    ///
    /// Workspace documents have no binary form; use [`Self::export_file`] for those.
    #[instrument(name = "Downloading file", skip(self))]
    pub async fn download_file(&self, file_id: &str, dest_path: &Path) -> Result<Vec<u8>> {
        let content = self
            .service
            .download(file_id)
            .await
            .inspect_err(|e| error!(error = %e, "Failed to download file"))?;

        store(dest_path, content)
    }

    /// Export a Workspace document as `mime_type` (e.g. `text/csv`, `application/pdf`).
    #[instrument(name = "Exporting file", skip(self))]
    pub async fn export_file(
        &self,
        file_id: &str,
        dest_path: &Path,
        mime_type: &str,
    ) -> Result<Vec<u8>> {
        let content = self
            .service
            .export(file_id, mime_type)
            .await
            .inspect_err(|e| error!(error = %e, "Failed to export file"))?;

        store(dest_path, content)
    }
}

fn store(dest_path: &Path, content: Vec<u8>) -> Result<Vec<u8>> {
    fs::write(dest_path, &content).inspect_err(|e| error!(error = %e, "Failed to store file"))?;
    info!(path = %dest_path.display(), bytes = content.len(), "Stored file");
    Ok(content)
}

fn list_query(parent_id: &str, folders: bool, name_query: &str) -> String {
    let operator = match folders {
        true => "=",
        false => "!=",
    };
    let mut query = format!(
        "'{}' in parents and mimeType{}'{}'",
        parent_id, operator, FOLDER_MIME_TYPE
    );
    if !name_query.is_empty() {
        query.push_str(" and ");
        query.push_str(name_query);
    }
    query
}

fn escape_query_value(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}
