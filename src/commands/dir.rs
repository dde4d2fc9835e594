//! Directory management CLI commands.

use clap::{Args, Subcommand};
use serde::Serialize;
use tabled::Tabled;

use assetdesk_core::error::AppError;
use assetdesk_core::types::DirectoryId;
use assetdesk_entity::directory::DirectoryTreeNode;
use assetdesk_service::FileManager;
use assetdesk_service::query::{ListEntry, Listable};

use crate::output::{self, OutputFormat};

/// Arguments for directory commands
#[derive(Debug, Args)]
pub struct DirArgs {
    /// Directory subcommand
    #[command(subcommand)]
    pub command: DirCommand,
}

/// Directory subcommands
#[derive(Debug, Subcommand)]
pub enum DirCommand {
    /// Create a directory
    Create {
        /// Directory name
        name: String,
        /// Parent directory ID (omit for a root directory)
        #[arg(short, long)]
        parent: Option<DirectoryId>,
    },
    /// Rename a directory
    Rename {
        /// Directory ID
        id: DirectoryId,
        /// New name
        name: String,
    },
    /// Move a directory under another one
    Move {
        /// Directory ID
        id: DirectoryId,
        /// New parent directory ID (omit to move to the root level)
        #[arg(short, long)]
        to: Option<DirectoryId>,
    },
    /// Delete a directory
    Delete {
        /// Directory ID
        id: DirectoryId,
        /// Also delete every subdirectory and file inside it
        #[arg(short, long)]
        recursive: bool,
    },
    /// Show directory details
    Info {
        /// Directory ID
        id: DirectoryId,
    },
    /// Show the directory tree
    Tree,
    /// List the contents of a directory (roots when omitted)
    Ls {
        /// Directory ID
        id: Option<DirectoryId>,
    },
}

/// Mixed listing row
#[derive(Debug, Serialize, Tabled)]
struct EntryRow {
    /// Kind
    kind: &'static str,
    /// ID
    id: String,
    /// Name
    name: String,
    /// Type
    #[tabled(rename = "type")]
    type_key: String,
    /// Size
    size: String,
}

impl From<&ListEntry> for EntryRow {
    fn from(entry: &ListEntry) -> Self {
        let id = match entry {
            ListEntry::Directory(d) => d.id.to_string(),
            ListEntry::File(f) => f.id.to_string(),
        };
        Self {
            kind: if entry.is_directory() { "dir" } else { "file" },
            id,
            name: entry.name().to_string(),
            type_key: entry.type_key().to_string(),
            size: if entry.is_directory() {
                "-".to_string()
            } else {
                output::human_size(entry.size())
            },
        }
    }
}

/// Execute directory commands
pub async fn execute(
    args: &DirArgs,
    manager: &FileManager,
    format: OutputFormat,
) -> Result<(), AppError> {
    match &args.command {
        DirCommand::Create { name, parent } => {
            let dir = manager.create_directory(name, *parent).await?;
            output::print_done(
                &format!("Directory '{}' created (id: {})", dir.full_path, dir.id),
                &dir,
                format,
            );
        }
        DirCommand::Rename { id, name } => {
            let dir = manager.rename_directory(*id, name).await?;
            output::print_done(&format!("Directory renamed to '{}'", dir.full_path), &dir, format);
        }
        DirCommand::Move { id, to } => {
            let dir = manager.move_directory(*id, *to).await?;
            output::print_done(&format!("Directory moved to '{}'", dir.full_path), &dir, format);
        }
        DirCommand::Delete { id, recursive } => {
            let path = manager.get_directory(*id).await?.full_path;
            if *recursive {
                let files = manager.delete_directory_recursive(*id).await?;
                output::print_done(
                    &format!("Directory '{path}' deleted with {files} file(s)"),
                    &serde_json::json!({ "id": id, "files_deleted": files }),
                    format,
                );
            } else {
                manager.delete_directory(*id).await?;
                output::print_done(
                    &format!("Directory '{path}' deleted"),
                    &serde_json::json!({ "id": id }),
                    format,
                );
            }
        }
        DirCommand::Info { id } => {
            let dir = manager.get_directory(*id).await?;
            match format {
                OutputFormat::Json => output::print_json(&dir),
                OutputFormat::Table => {
                    println!("Directory Details");
                    println!("{}", "─".repeat(40));
                    output::print_kv("ID", &dir.id.to_string());
                    output::print_kv("Name", &dir.name);
                    output::print_kv("Path", &dir.full_path);
                    output::print_kv(
                        "Parent",
                        &dir.parent_id.map_or_else(|| "-".to_string(), |p| p.to_string()),
                    );
                    output::print_kv("Created", &super::short_time(dir.created_at));
                    output::print_kv("Updated", &super::short_time(dir.updated_at));
                }
            }
        }
        DirCommand::Tree => {
            let tree = manager.get_directory_tree().await?;
            match format {
                OutputFormat::Json => output::print_json(&tree),
                OutputFormat::Table => {
                    if tree.is_empty() {
                        println!("No directories.");
                    }
                    for node in &tree {
                        print_node(node, "", true);
                    }
                }
            }
        }
        DirCommand::Ls { id } => {
            let entries = manager.list_entries(*id).await?;
            match format {
                OutputFormat::Json => output::print_json(&entries),
                OutputFormat::Table => {
                    let rows: Vec<EntryRow> = entries.iter().map(EntryRow::from).collect();
                    output::print_list(&rows, format);
                }
            }
        }
    }

    Ok(())
}

fn print_node(node: &DirectoryTreeNode, prefix: &str, last: bool) {
    let branch = if node.depth == 0 {
        ""
    } else if last {
        "└── "
    } else {
        "├── "
    };
    let files = match node.file_count {
        0 => String::new(),
        1 => " (1 file)".to_string(),
        n => format!(" ({n} files)"),
    };
    println!("{prefix}{branch}{}/{files}  [{}]", node.name, node.id);

    let child_prefix = if node.depth == 0 {
        prefix.to_string()
    } else if last {
        format!("{prefix}    ")
    } else {
        format!("{prefix}│   ")
    };
    for (i, child) in node.children.iter().enumerate() {
        print_node(child, &child_prefix, i + 1 == node.children.len());
    }
}
