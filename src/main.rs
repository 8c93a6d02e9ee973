use std::{collections::HashMap, path::PathBuf, process, time::Duration};

use anyhow::{Context, Result, anyhow, bail};
use clap::{Parser, Subcommand};
use ragdex::{
    config, logging,
    models::{Filter, Query},
    pipeline::{IngestOutcome, IngestionPipeline, collect_files},
};
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

const HTTP_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Parser)]
#[command(
    name = "ragdex",
    version,
    about = "Ingest files into a Pinecone index and query them"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Extract, chunk, embed, and index files or directories.
    Ingest {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
    /// Search the index for chunks similar to the text.
    Query {
        text: String,
        /// Number of results; 0 uses SEARCH_DEFAULT_TOP_K.
        #[arg(long, default_value_t = 0)]
        top_k: usize,
        #[arg(long)]
        file_type: Option<String>,
        #[arg(long)]
        namespace: Option<String>,
        /// Earliest document creation time (RFC 3339).
        #[arg(long)]
        from: Option<String>,
        /// Latest document creation time (RFC 3339).
        #[arg(long)]
        to: Option<String>,
        /// Exact metadata match, as KEY=VALUE; repeatable.
        #[arg(long = "meta")]
        metadata: Vec<String>,
    },
    /// Print index statistics.
    Stats,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    logging::init_tracing();

    let result = tokio::select! {
        result = run(cli) => result,
        _ = tokio::signal::ctrl_c() => {
            tracing::warn!("Interrupted; batches already sent remain in the index");
            Err(anyhow!("interrupted"))
        }
    };

    match result {
        Ok(true) => {}
        Ok(false) => process::exit(1),
        Err(err) => {
            eprintln!("error: {err:#}");
            process::exit(1);
        }
    }
}

/// Returns `Ok(false)` when at least one document failed.
async fn run(cli: Cli) -> Result<bool> {
    let config = config::init_config().context("failed to load configuration")?;
    let http = reqwest::Client::builder()
        .timeout(HTTP_TIMEOUT)
        .build()
        .context("failed to build HTTP client")?;
    let pipeline =
        IngestionPipeline::from_config(config, http).context("failed to initialize pipeline")?;

    match cli.command {
        Command::Ingest { paths } => ingest(&pipeline, &paths).await,
        Command::Query {
            text,
            top_k,
            file_type,
            namespace,
            from,
            to,
            metadata,
        } => {
            let filter = Filter {
                file_type,
                date_from: from.as_deref().map(parse_time).transpose()?,
                date_to: to.as_deref().map(parse_time).transpose()?,
                metadata: parse_metadata(&metadata)?,
            };
            let mut query = Query::new(text, top_k).with_filter(filter);
            if let Some(namespace) = namespace {
                query = query.with_namespace(namespace);
            }
            let result = pipeline.search(&query).await.context("query failed")?;
            println!("{}", serde_json::to_string_pretty(&result)?);
            Ok(true)
        }
        Command::Stats => {
            let stats = pipeline.stats().await.context("failed to fetch stats")?;
            println!("{}", serde_json::to_string_pretty(&stats)?);
            Ok(true)
        }
    }
}

async fn ingest(pipeline: &IngestionPipeline, paths: &[PathBuf]) -> Result<bool> {
    let files = collect_files(paths).context("failed to collect input files")?;
    if files.is_empty() {
        bail!("no files found under the given paths");
    }

    let mut all_ok = true;
    for file in &files {
        match pipeline.ingest_path(file).await {
            Ok((document, IngestOutcome::Indexed { chunks, vectors })) => {
                println!(
                    "indexed  {} ({chunks} chunks, {vectors} vectors) {}",
                    file.display(),
                    document.id
                );
            }
            Ok((document, IngestOutcome::AlreadyIndexed)) => {
                println!("skipped  {} (already indexed) {}", file.display(), document.id);
            }
            Err(error) => {
                all_ok = false;
                println!("failed   {}: {error}", file.display());
            }
        }
    }

    let snapshot = pipeline.metrics_snapshot();
    println!("{}", serde_json::to_string_pretty(&snapshot)?);
    Ok(all_ok)
}

fn parse_time(value: &str) -> Result<OffsetDateTime> {
    OffsetDateTime::parse(value, &Rfc3339).with_context(|| format!("invalid timestamp '{value}'"))
}

fn parse_metadata(pairs: &[String]) -> Result<HashMap<String, String>> {
    pairs
        .iter()
        .map(|pair| {
            let (key, value) = pair
                .split_once('=')
                .ok_or_else(|| anyhow!("metadata filter '{pair}' must be KEY=VALUE"))?;
            Ok((key.trim().to_string(), value.to_string()))
        })
        .collect()
}
