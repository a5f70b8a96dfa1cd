//! # kb-ingest CLI
//!
//! With no arguments, reads `./kb.txt` and stores it as document `kb` in
//! the `docs` collection of the store under `./db`, then prints
//! `Embedding stored in Chroma`.
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `kb-ingest` / `kb-ingest ingest` | Store the input file |
//! | `kb-ingest get [id]` | Print a stored document |
//! | `kb-ingest collections` | List collections with document counts |
//!
//! Diagnostics go to stderr; set `RUST_LOG=debug` for more detail.

use clap::{Parser, Subcommand};
use std::io::IsTerminal;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use kb_ingest::config::{self, Config, WriteMode};
use kb_ingest::{get, ingest};

#[derive(Parser)]
#[command(
    name = "kb-ingest",
    about = "Store a knowledge-base text file as a document in a persistent local collection",
    version
)]
struct Cli {
    /// Optional TOML configuration file. Built-in defaults apply without one.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Store directory (default `./db`).
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Input text file (default `kb.txt`).
    #[arg(long, global = true)]
    input: Option<PathBuf>,

    /// Collection name (default `docs`).
    #[arg(long, global = true)]
    collection: Option<String>,

    /// Document id (default `kb`).
    #[arg(long, global = true)]
    id: Option<String>,

    /// Replace the document if its id already exists.
    #[arg(long, global = true)]
    upsert: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Read the input file and store it as one document (the default).
    Ingest,

    /// Print a stored document.
    Get {
        /// Document id. Defaults to the configured document id.
        #[arg(value_name = "ID")]
        document: Option<String>,
    },

    /// List collections and their document counts.
    Collections,
}

impl Cli {
    fn resolve_config(&self) -> anyhow::Result<Config> {
        let mut cfg = match &self.config {
            Some(path) => config::load_config(path)?,
            None => Config::default(),
        };

        if let Some(db) = &self.db {
            cfg.store.path = db.clone();
        }
        if let Some(input) = &self.input {
            cfg.ingest.input = input.clone();
        }
        if let Some(collection) = &self.collection {
            cfg.ingest.collection = collection.clone();
        }
        if let Some(id) = &self.id {
            cfg.ingest.document_id = id.clone();
        }
        if self.upsert {
            cfg.ingest.mode = WriteMode::Upsert;
        }

        cfg.validate()?;
        Ok(cfg)
    }
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let cfg = cli.resolve_config()?;

    match cli.command {
        None | Some(Commands::Ingest) => {
            ingest::run_ingest(&cfg).await?;
        }
        Some(Commands::Get { document }) => {
            let id = document.unwrap_or_else(|| cfg.ingest.document_id.clone());
            get::run_get(&cfg, &id).await?;
        }
        Some(Commands::Collections) => {
            get::run_collections(&cfg).await?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_arguments_uses_defaults() {
        let cli = Cli::try_parse_from(["kb-ingest"]).unwrap();
        assert!(cli.command.is_none());
        let cfg = cli.resolve_config().unwrap();
        assert_eq!(cfg.store.path, PathBuf::from("./db"));
        assert_eq!(cfg.ingest.input, PathBuf::from("kb.txt"));
        assert_eq!(cfg.ingest.collection, "docs");
        assert_eq!(cfg.ingest.document_id, "kb");
        assert_eq!(cfg.ingest.mode, WriteMode::Add);
    }

    #[test]
    fn test_flags_override_after_subcommand() {
        let cli = Cli::try_parse_from(["kb-ingest", "get", "other", "--db", "/tmp/store"]).unwrap();
        let cfg = cli.resolve_config().unwrap();
        assert_eq!(cfg.store.path, PathBuf::from("/tmp/store"));
        match cli.command {
            Some(Commands::Get { document }) => assert_eq!(document.as_deref(), Some("other")),
            _ => panic!("expected get"),
        }
    }

    #[test]
    fn test_upsert_flag() {
        let cli = Cli::try_parse_from(["kb-ingest", "--upsert"]).unwrap();
        assert_eq!(cli.resolve_config().unwrap().ingest.mode, WriteMode::Upsert);
    }
}
