//! # docqa CLI
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `docqa init-index` | Create the vector index if it does not exist |
//! | `docqa ingest <files...>` | Ingest `.txt`/`.pdf` files and print per-file results |
//! | `docqa ask "<question>"` | Answer a question with cited sources |
//! | `docqa serve` | Start the HTTP API |
//!
//! ## Examples
//!
//! ```bash
//! export PINECONE_API_KEY=... GROQ_API_KEY=...
//! docqa init-index
//! docqa ingest ./contracts/lease.pdf ./contracts/notes.txt
//! docqa ask "When does the lease terminate?"
//! docqa serve --config ./config/docqa.toml
//! ```

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use docqa::config::{self, INDEX_NAME};
use docqa::models::Document;
use docqa::server;
use docqa::store::create_store;
use docqa::{logging, QaService};

/// docqa: retrieval-augmented question answering over your documents.
///
/// Tunables come from a TOML file; credentials (`PINECONE_API_KEY`,
/// `GROQ_API_KEY`, `OPENAI_API_KEY`) come from the environment.
#[derive(Parser)]
#[command(name = "docqa", version, about)]
struct Cli {
    /// Path to configuration file (TOML). Built-in defaults are used when
    /// the file does not exist.
    #[arg(long, global = true, default_value = "./config/docqa.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the vector index if it does not exist yet.
    ///
    /// Idempotent: an existing index is left untouched.
    InitIndex,

    /// Ingest documents into the vector index.
    ///
    /// Each file is processed independently; a failing file is reported
    /// and the others still go through.
    Ingest {
        /// Paths of `.txt` or `.pdf` files.
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Ask a question against the ingested documents.
    Ask {
        /// The question.
        question: String,

        /// Number of chunks to retrieve (defaults to `[retrieval].top_k`).
        #[arg(long)]
        top_k: Option<usize>,
    },

    /// Start the HTTP server on `[server].bind`.
    Serve,
}

fn read_document(path: &Path) -> anyhow::Result<Document> {
    let content =
        std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    Ok(Document::new(filename, content))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init();
    let cli = Cli::parse();
    let cfg = config::load_or_default(&cli.config)?;

    match cli.command {
        Commands::InitIndex => {
            let store = create_store(&cfg.store, INDEX_NAME)?;
            store.ensure_index().await?;
            println!("Index '{}' is ready.", store.index_name());
        }
        Commands::Ingest { files } => {
            let documents = files
                .iter()
                .map(|p| read_document(p))
                .collect::<anyhow::Result<Vec<_>>>()?;
            let service = QaService::from_config(&cfg).await?;
            let results = service.ingest(documents).await;
            println!("{}", serde_json::to_string_pretty(&results)?);
            if results.iter().all(|r| !r.is_success()) {
                anyhow::bail!("no document was ingested");
            }
        }
        Commands::Ask { question, top_k } => {
            let service = QaService::from_config(&cfg).await?;
            let response = service.ask(&question, top_k).await?;
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        Commands::Serve => {
            let service = Arc::new(QaService::from_config(&cfg).await?);
            server::run_server(&cfg, service).await?;
        }
    }

    Ok(())
}
