//! `devjournal` command-line front end.
//!
//! # Responsibility
//! - Resolve configuration, start logging, and open the journal.
//! - Translate one subcommand into one facade call and print the outcome.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use devjournal_core::{
    init_logging, EntryDraft, EntryId, ExportFile, FileKeyValueStore, JournalConfig, JournalEntry,
    JournalService, JournalStore, Notification, SaveMode, ServiceMode,
};
use log::info;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

type Service<'s> = JournalService<'s, FileKeyValueStore>;

#[derive(Parser)]
#[command(name = "devjournal")]
#[command(about = "Daily developer journal with local SQLite storage")]
#[command(version)]
struct Cli {
    /// Directory holding the database, legacy snapshot and logs.
    #[arg(long, env = "DEVJOURNAL_HOME", default_value = ".devjournal")]
    data_dir: PathBuf,
    /// JSON config file; overrides `--data-dir` when it sets `data_dir`.
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    log_level: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List entries, newest date first.
    List {
        #[arg(long)]
        limit: Option<usize>,
    },
    Show {
        id: String,
    },
    /// Entries between two dates (inclusive), oldest first.
    Range {
        start: String,
        end: String,
    },
    Add {
        #[arg(long)]
        date: String,
        body: String,
    },
    Edit {
        id: String,
        #[arg(long)]
        date: Option<String>,
        #[arg(long)]
        body: Option<String>,
    },
    Delete {
        id: String,
        /// Confirm the deletion.
        #[arg(long)]
        yes: bool,
    },
    ImportJson {
        file: PathBuf,
    },
    /// Imports `<dir>/<year>.md` for each `--year`.
    ImportMarkdown {
        dir: Option<PathBuf>,
        #[arg(long = "year")]
        years: Vec<u16>,
    },
    ExportJson {
        out_dir: PathBuf,
    },
    ExportMarkdown {
        out_dir: PathBuf,
    },
    /// Removes every entry.
    Reset {
        #[arg(long)]
        yes: bool,
    },
    Status,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let config = resolve_config(&cli)?;

    fs::create_dir_all(&config.data_dir).with_context(|| {
        format!(
            "Failed to create data directory '{}'",
            config.data_dir.display()
        )
    })?;
    init_logging(&config.log_level, absolute(&config.log_dir())?)
        .context("Failed to start logging")?;

    let store = JournalStore::open(config.db_path());
    let legacy = FileKeyValueStore::new(config.legacy_snapshot_path());
    let mut service = JournalService::new(&store, legacy);

    let startup = service.start().await;
    if startup.mode == ServiceMode::Degraded {
        eprintln!("warning: journal store unavailable; changes will not be persisted");
    }
    if startup.migrated > 0 {
        println!(
            "Migrated {} entries from the legacy snapshot.",
            startup.migrated
        );
    }

    run(cli.command, &mut service, &config).await
}

fn resolve_config(cli: &Cli) -> Result<JournalConfig> {
    let mut config = match &cli.config {
        Some(path) => JournalConfig::load(path)?,
        None => JournalConfig::for_data_dir(&cli.data_dir),
    };
    if let Some(level) = &cli.log_level {
        config.log_level = level.clone();
    }
    config.data_dir = absolute(&config.data_dir)?;
    Ok(config)
}

async fn run(
    command: Command,
    service: &mut Service<'_>,
    config: &JournalConfig,
) -> Result<ExitCode> {
    match command {
        Command::List { limit } => {
            let limit = limit.unwrap_or(usize::MAX);
            for entry in service.entries().iter().take(limit) {
                print_summary(entry);
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Show { id } => match service.find(&EntryId::from(id.as_str())) {
            Some(entry) => {
                print_full(entry);
                Ok(ExitCode::SUCCESS)
            }
            None => bail!("No entry with id '{id}'"),
        },
        Command::Range { start, end } => match service.entries_between(&start, &end).await {
            Ok(entries) => {
                for entry in &entries {
                    print_summary(entry);
                }
                Ok(ExitCode::SUCCESS)
            }
            Err(notification) => Ok(report(&notification)),
        },
        Command::Add { date, body } => {
            let notification = service
                .save(EntryDraft::new(date, body), SaveMode::Create)
                .await;
            Ok(report(&notification))
        }
        Command::Edit { id, date, body } => {
            let id = EntryId::from(id.as_str());
            let Some(current) = service.find(&id) else {
                bail!("No entry with id '{id}'");
            };
            let draft = EntryDraft::new(
                date.unwrap_or_else(|| current.date.clone()),
                body.unwrap_or_else(|| current.main_entry.clone()),
            );
            let notification = service.save(draft, SaveMode::Update(id)).await;
            Ok(report(&notification))
        }
        Command::Delete { id, yes } => {
            let Some(target) = service.request_delete(&EntryId::from(id.as_str())) else {
                bail!("No entry with id '{id}'");
            };
            if !yes {
                println!(
                    "Would delete the entry for {}. Re-run with --yes to confirm.",
                    target.date
                );
                service.cancel_delete();
                return Ok(ExitCode::FAILURE);
            }
            match service.confirm_delete().await {
                Some(notification) => Ok(report(&notification)),
                None => Ok(ExitCode::FAILURE),
            }
        }
        Command::ImportJson { file } => {
            let outcome = service.import_json_file(&file).await;
            Ok(report(&outcome.notification))
        }
        Command::ImportMarkdown { dir, years } => {
            let dir = dir.unwrap_or_else(|| config.markdown_dir());
            let years = if years.is_empty() {
                config.markdown_years.clone()
            } else {
                years
            };
            if years.is_empty() {
                bail!("No years given; pass --year or set markdown_years in the config");
            }
            let outcome = service.import_markdown_years(&dir, &years).await;
            Ok(report(&outcome.notification))
        }
        Command::ExportJson { out_dir } => {
            let outcome = service.export_json();
            write_files(&out_dir, &outcome.files)?;
            Ok(report(&outcome.notification))
        }
        Command::ExportMarkdown { out_dir } => {
            let outcome = service.export_markdown();
            write_files(&out_dir, &outcome.files)?;
            Ok(report(&outcome.notification))
        }
        Command::Reset { yes } => {
            if !yes {
                println!(
                    "Would remove all {} entries. Re-run with --yes to confirm.",
                    service.entries().len()
                );
                return Ok(ExitCode::FAILURE);
            }
            let notification = service.reset().await;
            Ok(report(&notification))
        }
        Command::Status => {
            let mode = match service.mode() {
                ServiceMode::Stopped => "stopped",
                ServiceMode::Persistent => "persistent",
                ServiceMode::Degraded => "degraded",
            };
            println!("mode: {mode}");
            println!("entries: {}", service.entries().len());
            println!("database: {}", config.db_path().display());
            println!("legacy snapshot: {}", service.legacy().path().display());
            println!("core version: {}", devjournal_core::core_version());
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn report(notification: &Notification) -> ExitCode {
    info!(
        "event=cli_outcome module=cli level={} title={}",
        notification.level.as_str(),
        notification.title
    );
    if notification.is_success() {
        println!("{notification}");
        ExitCode::SUCCESS
    } else {
        eprintln!("{notification}");
        ExitCode::FAILURE
    }
}

fn write_files(out_dir: &Path, files: &[ExportFile]) -> Result<()> {
    if files.is_empty() {
        return Ok(());
    }
    fs::create_dir_all(out_dir)
        .with_context(|| format!("Failed to create output directory '{}'", out_dir.display()))?;
    for file in files {
        let path = out_dir.join(&file.file_name);
        fs::write(&path, &file.contents)
            .with_context(|| format!("Failed to write '{}'", path.display()))?;
        println!("wrote {}", path.display());
    }
    Ok(())
}

fn print_summary(entry: &JournalEntry) {
    let first_line = entry.main_entry.lines().next().unwrap_or_default();
    println!("{}  {}  {}", entry.date, entry.id, first_line);
}

fn print_full(entry: &JournalEntry) {
    println!("id: {}", entry.id);
    println!("date: {}", entry.date);
    println!("saved: {}", entry.timestamp);
    if entry.imported {
        println!("imported: yes");
    }
    println!();
    println!("{}", entry.main_entry);
    if let Some(sub_entries) = entry.sub_entries.as_ref().filter(|subs| !subs.is_empty()) {
        println!();
        for sub_entry in sub_entries {
            println!("  - {sub_entry}");
        }
    }
}

fn absolute(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let cwd = std::env::current_dir().context("Failed to resolve the working directory")?;
    Ok(cwd.join(path))
}
