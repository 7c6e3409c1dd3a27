//! Notes CLI
//!
//! Scriptable access to the note and folder operations. Results are printed
//! to stdout as JSON; logs go to stderr.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use notes_orchestrator::meeting::{format_markdown, parse_meeting_notes};
use notes_orchestrator::notes::{CreateFolderRequest, CreateNoteRequest, UpdateNoteRequest};
use notes_orchestrator::{logging, AppState, Config};
use serde::Serialize;
use serde_json::{json, Map};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "notes")]
#[command(about = "Manage Slite notes and folders")]
#[command(version)]
struct Cli {
    /// YAML config file (defaults to ./config.yaml when present)
    #[arg(short, long, env = "NOTES_CONFIG")]
    config: Option<PathBuf>,

    /// Slite API key (overrides config.yaml)
    #[arg(long, env = "SLITE_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Registry file (overrides config.yaml)
    #[arg(long, env = "NOTES_REGISTRY_PATH")]
    registry: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search registered notes by title, project or department
    Search {
        #[arg(default_value = "")]
        query: String,
    },

    /// Full-text search in Slite
    SearchRemote {
        query: String,
        #[arg(short, long, default_value = "10")]
        limit: usize,
    },

    /// Print a note
    Get {
        /// Note id or title
        note: String,
    },

    /// Create a note
    Create {
        title: String,
        #[arg(short, long, default_value = "")]
        content: String,
        /// Read the content from a file instead
        #[arg(long, conflicts_with = "content")]
        content_file: Option<PathBuf>,
        /// Folder id
        #[arg(short, long)]
        parent: Option<String>,
        #[arg(long)]
        project: Option<String>,
        #[arg(long)]
        department: Option<String>,
    },

    /// Update a note's title and/or content
    Update {
        /// Note id or title
        note: String,
        #[arg(short, long)]
        title: Option<String>,
        #[arg(short, long)]
        content: Option<String>,
        /// Append the content instead of replacing it
        #[arg(long)]
        append: bool,
    },

    /// Rename a note, keeping its content
    Rename { note: String, new_title: String },

    /// Delete a note
    Delete {
        /// Note id or exact title
        note: String,
    },

    /// Create a formatted meeting note from a plain-text file
    CreateMeeting {
        file: PathBuf,
        #[arg(short, long)]
        parent: Option<String>,
    },

    /// List registered folders
    Folders,

    /// Find a folder by name
    FindFolder { name: String },

    /// Create a folder
    CreateFolder {
        name: String,
        #[arg(short, long)]
        description: Option<String>,
        #[arg(short, long)]
        parent: Option<String>,
    },

    /// Rename a folder
    RenameFolder { folder_id: String, new_name: String },

    /// Move a folder under another folder
    MoveFolder {
        folder_id: String,
        new_parent_id: String,
    },

    /// Delete a folder and everything in it
    DeleteFolder { folder_id: String },

    /// Convert plain-text meeting notes to JSON (or markdown) without calling Slite
    Convert {
        file: PathBuf,
        #[arg(long)]
        markdown: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let mut config = Config::from_yaml_and_env(cli.config.as_deref())?;
    if let Some(key) = cli.api_key {
        config.slite_api_key = Some(key);
    }
    if let Some(path) = cli.registry {
        config.registry_path = path;
    }
    logging::init(&config.logging)?;

    // Offline command, no credentials needed
    if let Commands::Convert { file, markdown } = &cli.command {
        let text = read_file(file)?;
        let notes = parse_meeting_notes(&text);
        if *markdown {
            println!("{}", format_markdown(&notes));
        } else {
            print_json(&notes)?;
        }
        return Ok(());
    }

    let state = AppState::new(config)?;
    let manager = &state.manager;

    match cli.command {
        Commands::Search { query } => print_json(&manager.search_notes(&query).await)?,
        Commands::SearchRemote { query, limit } => {
            print_json(&manager.search_remote_notes(&query, limit).await?)?
        }
        Commands::Get { note } => {
            let note = manager.get_note(&note).await?;
            print_json(&json!({"id": note.id, "title": note.title, "content": note.body()}))?
        }
        Commands::Create {
            title,
            content,
            content_file,
            parent,
            project,
            department,
        } => {
            let content = match content_file {
                Some(path) => read_file(&path)?,
                None => content,
            };
            let mut metadata = Map::new();
            if let Some(project) = project {
                metadata.insert("project".into(), json!(project));
            }
            if let Some(department) = department {
                metadata.insert("department".into(), json!(department));
            }
            let request = CreateNoteRequest {
                title,
                content,
                parent_id: parent,
                metadata: Some(metadata),
            };
            print_json(&manager.create_note(request).await?)?
        }
        Commands::Update {
            note,
            title,
            content,
            append,
        } => {
            let request = UpdateNoteRequest {
                title,
                content,
                append,
            };
            print_json(&manager.update_note(&note, request).await?)?
        }
        Commands::Rename { note, new_title } => {
            print_json(&manager.rename_note(&note, &new_title).await?)?
        }
        Commands::Delete { note } => {
            let id = manager.delete_note(&note).await?;
            print_json(&json!({"deleted": id}))?
        }
        Commands::CreateMeeting { file, parent } => {
            let notes = parse_meeting_notes(&read_file(&file)?);
            print_json(&manager.create_meeting_note(notes, parent).await?)?
        }
        Commands::Folders => print_json(&manager.list_folders().await)?,
        Commands::FindFolder { name } => print_json(&manager.find_folder(&name).await?)?,
        Commands::CreateFolder {
            name,
            description,
            parent,
        } => {
            let request = CreateFolderRequest {
                name,
                description,
                parent_id: parent,
            };
            print_json(&manager.create_folder(request).await?)?
        }
        Commands::RenameFolder {
            folder_id,
            new_name,
        } => print_json(&manager.rename_folder(&folder_id, &new_name).await?)?,
        Commands::MoveFolder {
            folder_id,
            new_parent_id,
        } => print_json(&manager.move_folder(&folder_id, &new_parent_id).await?)?,
        Commands::DeleteFolder { folder_id } => {
            print_json(&manager.delete_folder(&folder_id).await?)?
        }
        Commands::Convert { .. } => {}
    }

    Ok(())
}

fn read_file(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("cannot read {}", path.display()))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
