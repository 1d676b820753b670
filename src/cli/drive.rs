use super::Context;
use clap::Subcommand;
use gworkspace_client::Result;
use gworkspace_client::drive::{FileEntry, PermissionRole, WorkspaceType};
use std::path::PathBuf;
use tracing::info;

#[derive(Subcommand, Debug)]
pub enum DriveCommand {
    /// List files (not folders) in a folder
    ListFiles {
        folder: String,
        /// Extra Drive query clause, e.g. "name contains 'report'"
        #[arg(long, default_value = "")]
        query: String,
    },
    /// List sub-folders of a folder
    ListFolders {
        folder: String,
        #[arg(long, default_value = "")]
        query: String,
    },
    /// Check whether an id or name exists directly under a folder
    Exists { parent: String, id_or_name: String },
    /// Print the ids of every entry with this exact name
    Find { folder: String, name: String },
    /// Share a file with a user (reader, commenter or editor)
    Grant {
        file: String,
        email: String,
        role: PermissionRole,
    },
    /// Create a folder, reusing an existing one of the same name
    Mkdir {
        parent: String,
        name: String,
        /// Always create a new folder
        #[arg(long)]
        no_exists_ok: bool,
    },
    /// Create an empty spreadsheet, document, presentation, form or drawing
    Create {
        folder: String,
        name: String,
        file_type: WorkspaceType,
    },
    Copy {
        source: String,
        folder: String,
        name: String,
    },
    /// Make a folder the only parent of a file
    Move { file: String, folder: String },
    Upload {
        folder: String,
        path: PathBuf,
        /// Guessed from the file extension when omitted
        #[arg(long)]
        mime_type: Option<String>,
    },
    Download { file: String, dest: PathBuf },
    /// Export a Workspace document, e.g. as text/csv or application/pdf
    Export {
        file: String,
        dest: PathBuf,
        mime_type: String,
    },
}

impl DriveCommand {
    pub async fn execute(&self, context: &Context) -> Result<()> {
        let drive = context.drive().await?;

        match self {
            DriveCommand::ListFiles { folder, query } => {
                print_entries(&drive.list_files(folder, query).await?)
            }
            DriveCommand::ListFolders { folder, query } => {
                print_entries(&drive.list_folders(folder, query).await?)
            }
            DriveCommand::Exists { parent, id_or_name } => {
                println!("{}", drive.file_exists(parent, id_or_name).await?);
            }
            DriveCommand::Find { folder, name } => {
                for (id, name) in drive.get_file_ids(folder, name).await? {
                    println!("{}\t{}", id, name);
                }
            }
            DriveCommand::Grant { file, email, role } => {
                drive.grant_permission(email, file, *role).await?;
            }
            DriveCommand::Mkdir {
                parent,
                name,
                no_exists_ok,
            } => {
                let id = drive.create_folder(parent, name, !no_exists_ok).await?;
                println!("{}", id);
            }
            DriveCommand::Create {
                folder,
                name,
                file_type,
            } => {
                println!("{}", drive.create_file(folder, name, *file_type).await?);
            }
            DriveCommand::Copy {
                source,
                folder,
                name,
            } => {
                println!("{}", drive.copy_file(source, folder, name).await?);
            }
            DriveCommand::Move { file, folder } => {
                let parents = drive.move_file(file, folder).await?;
                info!(?parents, "Moved file");
            }
            DriveCommand::Upload {
                folder,
                path,
                mime_type,
            } => {
                println!(
                    "{}",
                    drive.upload_file(folder, path, mime_type.as_deref()).await?
                );
            }
            DriveCommand::Download { file, dest } => {
                drive.download_file(file, dest).await?;
            }
            DriveCommand::Export {
                file,
                dest,
                mime_type,
            } => {
                drive.export_file(file, dest, mime_type).await?;
            }
        }

        Ok(())
    }
}

fn print_entries(entries: &[FileEntry]) {
    for entry in entries {
        println!("{}\t{}", entry.id, entry.name);
    }
}
