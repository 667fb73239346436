//! Command-line access to journal storage.
//!
//! # Responsibility
//! - Open one storage session per invocation and run a single command on it.
//! - Print machine-readable JSON on stdout; failures go to stderr with a
//!   non-zero exit code.
//!
//! # See also
//! - `journal_core::StorageSession` for the operations each command maps to.

use clap::{Parser, Subcommand, ValueEnum};
use journal_core::model::entry::parse_tag_list;
use journal_core::{
    open_backend, EntryCategory, EntryDraft, FixedPaths, HostIo, StorageConfig, StorageSession,
};
use serde_json::json;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "journal")]
#[command(about = "Inspect and move local journal data")]
struct Cli {
    /// Store collections as files in this directory (desktop backend).
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
    /// Prefer a SQLite key-value store at this path (browser backend).
    #[arg(long, global = true)]
    database: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print collection counts and storage size.
    Stats,
    /// Write a backup snapshot to `path`.
    Export { path: PathBuf },
    /// Replace journal data with the snapshot stored at `path`.
    Import { path: PathBuf },
    /// Remove every journal collection from storage.
    Clear,
    /// Create one journal entry.
    AddEntry {
        #[arg(long)]
        title: String,
        #[arg(long)]
        content: String,
        #[arg(long, default_value_t = 5)]
        mood: u8,
        #[arg(long, default_value_t = 5)]
        energy: u8,
        #[arg(long, value_enum, default_value_t = CategoryArg::General)]
        category: CategoryArg,
        /// Comma-separated tags.
        #[arg(long, default_value = "")]
        tags: String,
    },
    /// Print all journal entries as JSON.
    ListEntries,
}

#[derive(Clone, Copy, ValueEnum)]
enum CategoryArg {
    General,
    Business,
    Personal,
    Goals,
    Ideas,
}

impl From<CategoryArg> for EntryCategory {
    fn from(value: CategoryArg) -> Self {
        match value {
            CategoryArg::General => Self::General,
            CategoryArg::Business => Self::Business,
            CategoryArg::Personal => Self::Personal,
            CategoryArg::Goals => Self::Goals,
            CategoryArg::Ideas => Self::Ideas,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(output) => {
            println!("{output}");
            ExitCode::SUCCESS
        }
        Err(message) => {
            eprintln!("journal: {message}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<String, String> {
    let mut config = StorageConfig::from_env();
    if let Some(dir) = cli.data_dir {
        config.desktop_data_dir = Some(dir);
    }
    if let Some(path) = cli.database {
        config.database_path = Some(path);
    }

    let host = match &cli.command {
        Command::Export { path } => HostIo::fixed(FixedPaths {
            save: Some(path.clone()),
            open: None,
        }),
        Command::Import { path } => HostIo::fixed(FixedPaths {
            save: None,
            open: Some(path.clone()),
        }),
        _ => HostIo::none(),
    };
    let mut session = StorageSession::open(open_backend(&config, host));

    let output = match cli.command {
        Command::Stats => to_json(&session.stats())?,
        Command::Export { path } => {
            if !session.export() {
                return Err(format!("export to {} failed", path.display()));
            }
            json!({ "exported": path }).to_string()
        }
        Command::Import { path } => {
            let summary = session
                .import()
                .ok_or_else(|| format!("{} is not a valid backup", path.display()))?;
            json!({
                "entries": summary.entries,
                "goals": summary.goals,
                "persisted": summary.persisted,
            })
            .to_string()
        }
        Command::Clear => {
            if !session.clear_all() {
                return Err("clear failed; some collections remain".to_string());
            }
            json!({ "cleared": true }).to_string()
        }
        Command::AddEntry {
            title,
            content,
            mood,
            energy,
            category,
            tags,
        } => {
            let receipt = session
                .add_entry(EntryDraft {
                    title,
                    content,
                    mood,
                    energy,
                    category: category.into(),
                    tags: parse_tag_list(&tags),
                })
                .map_err(|err| err.to_string())?;
            json!({ "id": receipt.id, "persisted": receipt.persisted }).to_string()
        }
        Command::ListEntries => to_json(session.entries())?,
    };
    session.close();
    Ok(output)
}

fn to_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<String, String> {
    serde_json::to_string_pretty(value).map_err(|err| err.to_string())
}
