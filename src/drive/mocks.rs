//! In-memory Drive backend for tests.

use super::{DriveService, FOLDER_MIME_TYPE, FileEntry, FilePage, NewFile, PermissionGrant};
use crate::error::{AppError, Result};
use async_trait::async_trait;
use std::io::Read;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, Default)]
pub(crate) struct MockFile {
    pub id: String,
    pub name: String,
    pub parents: Vec<String>,
    pub mime_type: Option<String>,
    pub content: Vec<u8>,
}

#[derive(Debug, Default)]
pub(crate) struct MockDriveState {
    pub files: Vec<MockFile>,
    pub page_size: usize,
    pub list_calls: usize,
    pub create_calls: usize,
    pub fail: bool,
    pub rejected_emails: Vec<String>,
    pub permissions: Vec<PermissionGrant>,
    next_id: usize,
}

impl MockDriveState {
    fn fresh_id(&mut self) -> String {
        self.next_id += 1;
        format!("file-{}", self.next_id)
    }

    fn insert(&mut self, metadata: NewFile, content: Vec<u8>) -> String {
        let id = self.fresh_id();
        self.files.push(MockFile {
            id: id.clone(),
            name: metadata.name,
            parents: metadata.parents,
            mime_type: metadata.mime_type,
            content,
        });
        id
    }

    fn file_mut(&mut self, file_id: &str) -> Result<&mut MockFile> {
        self.files
            .iter_mut()
            .find(|f| f.id == file_id)
            .ok_or_else(|| AppError::Drive(format!("File not found: {}", file_id)))
    }
}

#[derive(Clone)]
pub(crate) struct MockDrive {
    pub state: Arc<Mutex<MockDriveState>>,
}

impl MockDrive {
    pub(crate) fn new(page_size: usize) -> Self {
        Self {
            state: Arc::new(Mutex::new(MockDriveState {
                page_size,
                ..Default::default()
            })),
        }
    }

    pub(crate) fn failing() -> Self {
        let drive = Self::new(100);
        drive.state.lock().unwrap().fail = true;
        drive
    }

    pub(crate) fn add_file(&self, parent: &str, name: &str) -> String {
        self.add(parent, name, None)
    }

    pub(crate) fn add_folder(&self, parent: &str, name: &str) -> String {
        self.add(parent, name, Some(FOLDER_MIME_TYPE.to_string()))
    }

    fn add(&self, parent: &str, name: &str, mime_type: Option<String>) -> String {
        let metadata = NewFile {
            name: name.to_string(),
            parents: vec![parent.to_string()],
            mime_type,
        };
        self.state.lock().unwrap().insert(metadata, Vec::new())
    }

    pub(crate) fn file(&self, file_id: &str) -> Option<MockFile> {
        let state = self.state.lock().unwrap();
        state.files.iter().find(|f| f.id == file_id).cloned()
    }

    fn check(&self) -> Result<()> {
        match self.state.lock().unwrap().fail {
            true => Err(AppError::Drive("500 Internal Server Error".to_string())),
            false => Ok(()),
        }
    }
}

/// Evaluates the small subset of the Drive query language the client emits.
fn matches_query(file: &MockFile, query: &str) -> bool {
    query.split(" and ").all(|clause| {
        let clause = clause.trim();
        if let Some(parent) = clause
            .strip_prefix('\'')
            .and_then(|c| c.strip_suffix("' in parents"))
        {
            file.parents.iter().any(|p| p == parent)
        } else if let Some(mime) = clause.strip_prefix("mimeType!=") {
            file.mime_type.as_deref() != Some(mime.trim_matches('\''))
        } else if let Some(mime) = clause.strip_prefix("mimeType=") {
            file.mime_type.as_deref() == Some(mime.trim_matches('\''))
        } else if let Some(name) = clause.strip_prefix("name = ") {
            file.name == name.trim_matches('\'').replace("\\'", "'")
        } else {
            true
        }
    })
}

#[async_trait]
impl DriveService for MockDrive {
    async fn list_page(&self, query: &str, page_token: Option<&str>) -> Result<FilePage> {
        self.check()?;
        let mut state = self.state.lock().unwrap();
        state.list_calls += 1;

        let start = page_token
            .map(|t| t.parse::<usize>().expect("mock page token"))
            .unwrap_or(0);
        let matching: Vec<FileEntry> = state
            .files
            .iter()
            .filter(|f| matches_query(f, query))
            .map(|f| FileEntry {
                name: f.name.clone(),
                id: f.id.clone(),
            })
            .collect();

        let end = (start + state.page_size).min(matching.len());
        let next_page_token = (end < matching.len()).then(|| end.to_string());

        Ok(FilePage {
            entries: matching[start..end].to_vec(),
            next_page_token,
        })
    }

    async fn create(&self, metadata: NewFile) -> Result<String> {
        self.check()?;
        let mut state = self.state.lock().unwrap();
        state.create_calls += 1;
        Ok(state.insert(metadata, Vec::new()))
    }

    async fn upload(
        &self,
        metadata: NewFile,
        mut content: std::fs::File,
        mime_type: mime::Mime,
    ) -> Result<String> {
        self.check()?;
        let mut bytes = Vec::new();
        content.read_to_end(&mut bytes)?;
        let metadata = NewFile {
            mime_type: Some(mime_type.to_string()),
            ..metadata
        };
        Ok(self.state.lock().unwrap().insert(metadata, bytes))
    }

    async fn copy(&self, source_id: &str, metadata: NewFile) -> Result<String> {
        self.check()?;
        let mut state = self.state.lock().unwrap();
        let source = state.file_mut(source_id)?.clone();
        let metadata = NewFile {
            mime_type: source.mime_type,
            ..metadata
        };
        Ok(state.insert(metadata, source.content))
    }

    async fn parents(&self, file_id: &str) -> Result<Vec<String>> {
        self.check()?;
        let mut state = self.state.lock().unwrap();
        Ok(state.file_mut(file_id)?.parents.clone())
    }

    async fn update_parents(
        &self,
        file_id: &str,
        add_parent: &str,
        remove_parents: &[String],
    ) -> Result<Vec<String>> {
        self.check()?;
        let mut state = self.state.lock().unwrap();
        let file = state.file_mut(file_id)?;
        file.parents.retain(|p| !remove_parents.contains(p));
        if !file.parents.iter().any(|p| p == add_parent) {
            file.parents.push(add_parent.to_string());
        }
        Ok(file.parents.clone())
    }

    async fn create_permission(&self, grant: &PermissionGrant) -> Result<String> {
        self.check()?;
        let mut state = self.state.lock().unwrap();
        if state.rejected_emails.contains(&grant.user_email) {
            return Err(AppError::Drive(format!(
                "400 Bad Request: invalid sharing request for {}",
                grant.user_email
            )));
        }
        state.permissions.push(grant.clone());
        Ok(format!("perm-{}", state.permissions.len()))
    }

    async fn download(&self, file_id: &str) -> Result<Vec<u8>> {
        self.check()?;
        let mut state = self.state.lock().unwrap();
        Ok(state.file_mut(file_id)?.content.clone())
    }

    async fn export(&self, file_id: &str, mime_type: &str) -> Result<Vec<u8>> {
        self.check()?;
        let mut state = self.state.lock().unwrap();
        let file = state.file_mut(file_id)?;
        Ok(format!("{} as {}", file.name, mime_type).into_bytes())
    }
}
