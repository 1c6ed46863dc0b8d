//! noa-ingest — run the ingestion pipeline over one file.
//!
//! Extracts text, builds the document structure, chunks it (with the
//! configured language model unless `--no-llm`) and writes the indexing
//! batch as JSON to stdout or `--output`. Logs go to stderr.

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;
use tracing::{info, warn, Instrument};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use noa_core::config::{load_dotenv, Config};
use noa_core::ChunkOptions;
use noa_ingest::{ChunkingPipeline, FileKind, IndexingBatch, StructureExtractor, TextExtractor};

// ── CLI ─────────────────────────────────────────────────────────────

/// Document ingestion and semantic chunking.
#[derive(Parser, Debug)]
#[command(name = "noa-ingest", version, about)]
struct Cli {
    /// File to ingest.
    file: PathBuf,

    /// Declared type (pdf, docx, doc, txt, md or a MIME type). Inferred from
    /// the extension when omitted.
    #[arg(long = "type")]
    kind: Option<String>,

    /// Preferred words per chunk [default: CHUNK_SIZE].
    #[arg(long)]
    target_size: Option<usize>,

    /// Words repeated across block boundaries [default: CHUNK_OVERLAP].
    #[arg(long)]
    overlap: Option<usize>,

    /// Skip the language model and chunk deterministically.
    #[arg(long)]
    no_llm: bool,

    /// Vector store the batch is meant for.
    #[arg(long, env = "NOA_VECTOR_STORE_ID")]
    vector_store_id: Option<String>,

    /// Write JSON here instead of stdout. A directory gets a generated name.
    #[arg(long, short)]
    output: Option<PathBuf>,

    /// Print the document structure and stop.
    #[arg(long)]
    structure_only: bool,
}

// ── Main ────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    load_dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::from_env();
    config.log_summary();

    let span = tracing::info_span!("ingest", run_id = %Uuid::new_v4(), file = %cli.file.display());
    run(cli, config).instrument(span).await
}

async fn run(cli: Cli, config: Config) -> anyhow::Result<()> {
    let kind = match cli.kind.as_deref() {
        Some(label) => FileKind::from_label(label)?,
        None => FileKind::from_path(&cli.file)?,
    };
    let file_name = display_name(&cli.file);

    let text = TextExtractor::default().extract_kind(&cli.file, kind);
    let structure = StructureExtractor::from_config(&config.chunking).analyze_text(&text, &file_name);

    if cli.structure_only {
        let json = serde_json::to_string_pretty(&structure)?;
        return emit(&json, cli.output.as_deref(), &format!("{file_name}.structure.json"));
    }

    let options = ChunkOptions::new(
        cli.target_size.unwrap_or(config.chunking.chunk_size),
        cli.overlap.unwrap_or(config.chunking.overlap),
    )?;

    let provider = if cli.no_llm {
        None
    } else {
        noa_llm::create_provider(&config.llm, &config.ollama).unwrap_or_else(|e| {
            warn!(error = %e, "language model unavailable, chunking without it");
            None
        })
    };

    let pipeline = ChunkingPipeline::from_config(&config, provider);
    let chunks = pipeline
        .chunk_document(&text, Some(&structure), &options)
        .await;

    let vector_store_id = cli.vector_store_id.or(config.indexing.vector_store_id);
    let batch = IndexingBatch::new(vector_store_id, &file_name, chunks);
    info!(
        chunks = batch.len(),
        sections = structure.sections.len(),
        pages = structure.total_pages,
        vector_store = batch.vector_store_id.as_deref().unwrap_or("(none)"),
        "ingestion complete"
    );

    emit(&batch.to_json()?, cli.output.as_deref(), &batch.upload_file_name())
}

/// Print to stdout, or write to `output` (joined with `default_name` when it
/// is a directory).
fn emit(json: &str, output: Option<&Path>, default_name: &str) -> anyhow::Result<()> {
    match output {
        None => {
            println!("{json}");
            Ok(())
        }
        Some(path) => {
            let target = if path.is_dir() {
                path.join(default_name)
            } else {
                path.to_path_buf()
            };
            std::fs::write(&target, json)
                .with_context(|| format!("failed to write {}", target.display()))?;
            info!(path = %target.display(), "output written");
            Ok(())
        }
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
