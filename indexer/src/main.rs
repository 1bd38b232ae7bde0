use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use plume_core::persist::{load_query_engine, save_artifacts, IndexPaths, MetaFile};
use plume_core::pipeline::build_artifacts;
use plume_core::query::DEFAULT_TOP_K;
use plume_core::store::DocStore;
use tracing_subscriber::{fmt, EnvFilter};
use walkdir::WalkDir;

use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "plume-indexer")]
#[command(about = "Build and query the field-weighted TF-IDF index", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the index artifacts from input JSONL files or a directory
    Build {
        /// Input path (file or directory)
        #[arg(long)]
        input: String,
        /// Output index directory
        #[arg(long)]
        output: String,
        /// Keep only the first N parseable records
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Interactive query loop over a built index
    Search {
        /// Index directory path
        #[arg(long)]
        index: String,
        /// How many results to show per query
        #[arg(long, default_value_t = DEFAULT_TOP_K)]
        top_k: usize,
    },
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Build { input, output, limit } => build(&input, &output, limit),
        Commands::Search { index, top_k } => search_loop(&index, top_k),
    }
}

fn build(input: &str, output: &str, limit: Option<usize>) -> Result<()> {
    let files = collect_inputs(Path::new(input));
    if files.is_empty() {
        bail!("no .json/.jsonl inputs under {input}");
    }

    let mut store = DocStore::new();
    for file in files {
        if limit.is_some_and(|n| store.len() >= n) {
            break;
        }
        let reader = BufReader::new(
            File::open(&file).with_context(|| format!("opening {}", file.display()))?,
        );
        let added = store.ingest(reader, limit)?;
        tracing::info!(file = %file.display(), added, "ingested corpus file");
    }
    if store.is_empty() {
        bail!("corpus is empty after ingestion");
    }

    let artifacts = build_artifacts(&store);

    let paths = IndexPaths::new(output);
    let meta = MetaFile {
        num_docs: store.len() as u32,
        created_at: time::OffsetDateTime::now_utc()
            .format(&time::format_description::well_known::Rfc3339)
            .unwrap_or_else(|_| "".into()),
        version: 1,
    };
    save_artifacts(&paths, &artifacts, &store, &meta)?;
    tracing::info!(output, "index build complete");
    Ok(())
}

fn collect_inputs(input: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    if input.is_dir() {
        for entry in WalkDir::new(input).into_iter().filter_map(|e| e.ok()) {
            let p = entry.path();
            if p.is_file() {
                if let Some(ext) = p.extension().and_then(|s| s.to_str()) {
                    if matches!(ext, "json" | "jsonl") {
                        files.push(p.to_path_buf());
                    }
                }
            }
        }
        files.sort();
    } else if input.is_file() {
        files.push(input.to_path_buf());
    }
    files
}

fn search_loop(index: &str, top_k: usize) -> Result<()> {
    let paths = IndexPaths::new(index);
    let (engine, meta) = load_query_engine(&paths)?;
    tracing::info!(num_docs = meta.num_docs, "index loaded");

    let stdin = io::stdin();
    let mut line = String::new();
    loop {
        print!("query> ");
        io::stdout().flush()?;
        line.clear();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let query = line.trim();
        if query.is_empty() {
            continue;
        }
        if query.eq_ignore_ascii_case("exit") {
            break;
        }

        let results = engine.search(query, top_k, None)?;
        if results.hits.is_empty() {
            println!("no results");
        }
        for hit in &results.hits {
            match &hit.url {
                Some(url) => println!("{:.4}  {url}", hit.score),
                None => println!("{:.4}  [doc {}] {}", hit.score, hit.doc_id, hit.title),
            }
        }
        for doc_id in &results.inconsistencies {
            println!("warning: document {doc_id} is indexed but missing from the store");
        }
    }
    Ok(())
}
