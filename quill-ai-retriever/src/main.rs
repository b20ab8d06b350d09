use clap::{Parser, Subcommand};
use quill_ai_embed::{EmbedConfig, EmbeddingProvider, FastEmbedProvider};
use quill_ai_retriever::config::RetrieverConfig;
use quill_ai_retriever::retrieval::{
    DocumentIndex, IndexPersistence, IngestPipeline, RetrievalEngine,
};
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// A CLI tool to index PDF documents and query them by similarity.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Directory holding the vector index and metadata files
    #[arg(short, long, default_value = "data")]
    data_dir: PathBuf,

    /// Embedding model to load
    #[arg(short, long, default_value = "all-minilm-l6-v2")]
    model: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Index a single PDF file
    Ingest {
        /// Path to the PDF
        file: PathBuf,
    },
    /// Index every PDF directly inside a directory
    Batch {
        /// Directory to scan (not recursive)
        dir: PathBuf,
    },
    /// List indexed documents
    List {
        /// Output format
        #[arg(short, long, default_value = "summary")]
        format: OutputFormat,
    },
    /// Delete a document by id (vectors are reclaimed by `rebuild`)
    Delete {
        /// Document id, e.g. doc_3_1714070000
        id: String,
    },
    /// Retrieve the chunks most similar to a query
    Query {
        /// Query text
        text: String,
        /// Number of chunks to retrieve
        #[arg(short = 'k', long)]
        top_k: Option<usize>,
        /// Output format
        #[arg(short, long, default_value = "summary")]
        format: OutputFormat,
    },
    /// Compact the index, dropping vectors of deleted documents
    Rebuild,
    /// Show index statistics
    Stats {
        /// Output format
        #[arg(short, long, default_value = "summary")]
        format: OutputFormat,
    },
}

#[derive(Debug, Clone, PartialEq)]
enum OutputFormat {
    Summary,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "summary" => Ok(OutputFormat::Summary),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Invalid format: {s}")),
        }
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .init();

    if let Err(e) = run().await {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let args = Args::parse();

    let embedder = Arc::new(FastEmbedProvider::create(EmbedConfig::new(&args.model)).await?);
    let config = RetrieverConfig::new(&args.data_dir)
        .with_dimension(embedder.dimension())
        .from_env();
    let index = Arc::new(DocumentIndex::open(IndexPersistence::new(
        &config.data_dir,
        config.dimension,
    ))?);

    match args.command {
        Commands::Ingest { file } => {
            let ingest = IngestPipeline::new(index, embedder, &config);
            let report = ingest.ingest_file(&file).await?;
            println!(
                "Indexed {} as {} ({} chunks)",
                report.filename, report.document_id, report.chunk_count
            );
            Ok(())
        }
        Commands::Batch { dir } => {
            let ingest = IngestPipeline::new(index, embedder, &config);
            let reports = ingest.ingest_dir(&dir).await?;
            println!("Indexed {} documents:", reports.len());
            for report in reports {
                println!(
                    "  {} | {} | {} chunks",
                    report.document_id, report.filename, report.chunk_count
                );
            }
            Ok(())
        }
        Commands::List { format } => {
            let documents = index.list_documents().await;
            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&documents)?),
                OutputFormat::Summary => {
                    println!("Found {} documents:", documents.len());
                    for doc in documents {
                        println!(
                            "  {} | {} | {} chunks | uploaded {}",
                            doc.document_id,
                            doc.filename,
                            doc.chunk_count,
                            doc.uploaded_at.format("%Y-%m-%d %H:%M:%S")
                        );
                    }
                }
            }
            Ok(())
        }
        Commands::Delete { id } => {
            if index.delete_document(&id).await? {
                println!("Deleted {id}");
            } else {
                println!("No document with id {id}");
            }
            Ok(())
        }
        Commands::Query {
            text,
            top_k,
            format,
        } => {
            let engine =
                RetrievalEngine::new(index, embedder, config.default_top_k, config.max_top_k);
            let results = engine.retrieve(&text, top_k).await?;
            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&results)?),
                OutputFormat::Summary => {
                    println!("Found {} chunks:", results.len());
                    for result in results {
                        println!(
                            "  {} | page {} | distance {:.4}",
                            result.chunk.document_name, result.chunk.page, result.score
                        );
                        for line in result.chunk.text.lines().take(3) {
                            println!("    {line}");
                        }
                    }
                }
            }
            Ok(())
        }
        Commands::Rebuild => {
            let reclaimed = index.rebuild().await?;
            println!("Rebuild complete, reclaimed {reclaimed} vector rows");
            Ok(())
        }
        Commands::Stats { format } => {
            let stats = index.stats().await;
            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&stats)?),
                OutputFormat::Summary => {
                    println!("Documents:   {}", stats.documents);
                    println!("Live chunks: {}", stats.live_chunks);
                    println!("Index rows:  {}", stats.index_rows);
                    println!("Dimension:   {}", stats.dimension);
                }
            }
            Ok(())
        }
    }
}
