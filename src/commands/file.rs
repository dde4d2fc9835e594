//! File management CLI commands.

use std::collections::HashSet;
use std::path::PathBuf;

use clap::{Args, Subcommand};
use serde::Serialize;
use tabled::Tabled;
use tokio::io::AsyncWriteExt;

use assetdesk_core::error::AppError;
use assetdesk_core::types::{DirectoryId, FileId, SortDirection, SortField, UploadId};
use assetdesk_entity::file::FileRecord;
use assetdesk_entity::upload::{UploadItem, UploadStatus};
use assetdesk_service::query::{self, FilterCriteria, SizeRange};
use assetdesk_service::{FileManager, UploadSource};

use crate::output::{self, OutputFormat};

/// Arguments for file commands
#[derive(Debug, Args)]
pub struct FileArgs {
    /// File subcommand
    #[command(subcommand)]
    pub command: FileCommand,
}

/// File subcommands
#[derive(Debug, Subcommand)]
pub enum FileCommand {
    /// Upload local files into a directory
    Upload {
        /// Files to upload
        #[arg(required = true)]
        paths: Vec<PathBuf>,
        /// Target directory ID
        #[arg(short, long)]
        dir: DirectoryId,
    },
    /// List files in a directory
    List {
        /// Directory ID
        dir: DirectoryId,
        /// Sort field (name, size, type, created_at, modified_at)
        #[arg(short, long, default_value = "name")]
        sort: SortField,
        /// Sort descending
        #[arg(long)]
        desc: bool,
        /// Only show these types (e.g. image/*, pdf)
        #[arg(short = 't', long = "type")]
        types: Vec<String>,
        /// Minimum size in bytes
        #[arg(long)]
        min_size: Option<u64>,
        /// Maximum size in bytes
        #[arg(long)]
        max_size: Option<u64>,
        /// Name substring
        #[arg(short, long)]
        name: Option<String>,
    },
    /// Search files by name
    Search {
        /// Search text
        query: String,
        /// Restrict to one directory
        #[arg(short, long)]
        dir: Option<DirectoryId>,
    },
    /// Show file details
    Info {
        /// File ID
        id: FileId,
    },
    /// Write file content to stdout
    Cat {
        /// File ID
        id: FileId,
    },
    /// Delete a file
    Delete {
        /// File ID
        id: FileId,
    },
}

/// File display row
#[derive(Debug, Serialize, Tabled)]
struct FileRow {
    /// File ID
    id: String,
    /// Name
    name: String,
    /// Size
    size: String,
    /// MIME type
    mime_type: String,
    /// Created at
    created_at: String,
}

impl From<&FileRecord> for FileRow {
    fn from(f: &FileRecord) -> Self {
        Self {
            id: f.id.to_string(),
            name: f.name.clone(),
            size: output::human_size(f.size_bytes()),
            mime_type: f.mime_type.clone(),
            created_at: super::short_time(f.created_at),
        }
    }
}

/// Upload result row
#[derive(Debug, Serialize, Tabled)]
struct UploadRow {
    /// Name
    name: String,
    /// Status
    status: String,
    /// Size
    size: String,
    /// File ID or error
    detail: String,
}

impl From<&UploadItem> for UploadRow {
    fn from(item: &UploadItem) -> Self {
        let detail = match (&item.result, &item.error) {
            (Some(file), _) => file.id.to_string(),
            (None, Some(err)) => err.clone(),
            (None, None) => String::new(),
        };
        Self {
            name: item.name.clone(),
            status: item.status.as_str().to_string(),
            size: output::human_size(item.size),
            detail,
        }
    }
}

/// Execute file commands
pub async fn execute(
    args: &FileArgs,
    manager: &FileManager,
    format: OutputFormat,
) -> Result<(), AppError> {
    match &args.command {
        FileCommand::Upload { paths, dir } => upload(manager, paths, *dir, format).await?,
        FileCommand::List {
            dir,
            sort,
            desc,
            types,
            min_size,
            max_size,
            name,
        } => {
            let files = manager.list_files(*dir).await?;
            let criteria = FilterCriteria {
                types: types.clone(),
                size_range: (min_size.is_some() || max_size.is_some()).then_some(SizeRange {
                    min: *min_size,
                    max: *max_size,
                }),
                date_range: None,
                search_text: name.clone(),
            };
            let direction = if *desc {
                SortDirection::Desc
            } else {
                SortDirection::Asc
            };
            let files = query::sort(&query::filter(&files, &criteria), *sort, direction);
            print_files(&files, format);
        }
        FileCommand::Search { query, dir } => {
            let files = manager.search_files(query, *dir).await?;
            print_files(&files, format);
        }
        FileCommand::Info { id } => {
            let file = manager.get_file(*id).await?;
            match format {
                OutputFormat::Json => output::print_json(&file),
                OutputFormat::Table => {
                    let dir = manager.get_directory(file.directory_id).await?;
                    println!("File Details");
                    println!("{}", "─".repeat(40));
                    output::print_kv("ID", &file.id.to_string());
                    output::print_kv("Name", &file.name);
                    output::print_kv("Directory", &dir.full_path);
                    output::print_kv("Size", &output::human_size(file.size_bytes()));
                    output::print_kv("MIME Type", &file.mime_type);
                    output::print_kv("Content Path", &file.content_path);
                    output::print_kv("Created", &super::short_time(file.created_at));
                    output::print_kv("Modified", &super::short_time(file.modified_at));
                }
            }
        }
        FileCommand::Cat { id } => {
            let data = manager.read_file_content(*id).await?;
            let mut stdout = tokio::io::stdout();
            stdout
                .write_all(&data)
                .await
                .map_err(|e| AppError::internal(format!("write to stdout failed: {e}")))?;
            stdout
                .flush()
                .await
                .map_err(|e| AppError::internal(format!("flush stdout failed: {e}")))?;
        }
        FileCommand::Delete { id } => {
            let file = manager.get_file(*id).await?;
            manager.delete_file(*id).await?;
            output::print_done(
                &format!("File '{}' deleted", file.name),
                &serde_json::json!({ "id": id }),
                format,
            );
        }
    }

    Ok(())
}

fn print_files(files: &[FileRecord], format: OutputFormat) {
    match format {
        OutputFormat::Json => output::print_json(files),
        OutputFormat::Table => {
            let rows: Vec<FileRow> = files.iter().map(FileRow::from).collect();
            output::print_list(&rows, format);
        }
    }
}

async fn upload(
    manager: &FileManager,
    paths: &[PathBuf],
    dir: DirectoryId,
    format: OutputFormat,
) -> Result<(), AppError> {
    let mut sources = Vec::with_capacity(paths.len());
    for path in paths {
        sources.push(UploadSource::from_path(path).await?);
    }

    let uploads = manager.uploads();
    let ids: HashSet<UploadId> = manager.enqueue_uploads(sources, dir).await?.into_iter().collect();

    if format == OutputFormat::Table {
        let mut updates = uploads.subscribe();
        let done = uploads.wait_idle();
        tokio::pin!(done);
        let mut reported = HashSet::new();
        loop {
            tokio::select! {
                _ = &mut done => break,
                changed = updates.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    for item in updates.borrow_and_update().iter() {
                        if ids.contains(&item.id)
                            && !item.status.is_active()
                            && reported.insert(item.id)
                        {
                            eprintln!("  {} {}", item.status.as_str(), item.name);
                        }
                    }
                }
            }
        }
    } else {
        uploads.wait_idle().await;
    }

    let items: Vec<UploadItem> = uploads
        .snapshot()
        .into_iter()
        .filter(|item| ids.contains(&item.id))
        .collect();
    let failed = items
        .iter()
        .filter(|item| item.status != UploadStatus::Completed)
        .count();

    match format {
        OutputFormat::Json => output::print_json(&items),
        OutputFormat::Table => {
            let rows: Vec<UploadRow> = items.iter().map(UploadRow::from).collect();
            output::print_list(&rows, format);
        }
    }

    if failed > 0 {
        return Err(AppError::validation(format!(
            "{failed} of {} upload(s) did not complete",
            items.len()
        )));
    }
    Ok(())
}
