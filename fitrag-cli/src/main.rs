//! FitRAG CLI - build and query the retrieval index
//!
//! # Commands
//!
//! ```bash
//! # Build the index from the knowledge base and food table
//! fitrag build --knowledge data/knowledge.json --foods data/taco.csv --prefix data/fitness
//!
//! # Semantic search
//! fitrag search --prefix data/fitness "protein after training" -k 5
//!
//! # Criteria filter over foods
//! fitrag filter --prefix data/fitness --min-protein 15 --category "Carnes e derivados"
//!
//! # Per-type context sections for a prompt
//! fitrag context --prefix data/fitness "cutting diet for a 80kg male"
//!
//! # Embed text and show vector stats
//! fitrag embed "creatine loading"
//! ```
//!
//! Pass `--hash-dim N` to use the offline feature-hashing embedder instead of
//! the configured model. An index must be queried with the embedder that
//! built it.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use fitrag_lib::{
    chunk::{Chunk, TemplateExtractor},
    config::Config,
    embed::{Embedder, FastEmbedder, HashEmbedder},
    engine::{RankedChunk, RetrievalEngine},
    source, Error,
};
use tracing_subscriber::EnvFilter;

const PREVIEW_CHARS: usize = 200;

#[derive(Parser)]
#[command(name = "fitrag")]
#[command(about = "Semantic retrieval over a nutrition and fitness knowledge base")]
#[command(version)]
struct Cli {
    /// Config file (missing file means defaults)
    #[arg(long, global = true, default_value = "fitrag.toml")]
    config: PathBuf,

    /// Use the feature-hashing embedder with this dimension
    #[arg(long, global = true)]
    hash_dim: Option<usize>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the index from the sources and save it
    Build {
        /// Knowledge base JSON document
        #[arg(long)]
        knowledge: PathBuf,

        /// Delimited food table
        #[arg(long)]
        foods: PathBuf,

        /// Path prefix of the index artifacts
        #[arg(long)]
        prefix: PathBuf,
    },

    /// Search the index
    Search {
        /// Path prefix of the index artifacts
        #[arg(long)]
        prefix: PathBuf,

        /// Query text
        query: String,

        /// Number of results (defaults to the configured default_k)
        #[arg(short, long)]
        k: Option<usize>,

        /// Print results as JSON
        #[arg(long)]
        json: bool,
    },

    /// Filter food chunks by nutrient values and category
    Filter {
        /// Path prefix of the index artifacts
        #[arg(long)]
        prefix: PathBuf,

        /// Minimum protein (g)
        #[arg(long)]
        min_protein: Option<f64>,

        /// Maximum carbohydrate (g)
        #[arg(long)]
        max_carbs: Option<f64>,

        /// Maximum fat (g)
        #[arg(long)]
        max_fat: Option<f64>,

        /// Minimum fiber (g)
        #[arg(long)]
        min_fiber: Option<f64>,

        /// Maximum energy (kcal)
        #[arg(long)]
        max_energy: Option<f64>,

        /// Exact food category
        #[arg(long)]
        category: Option<String>,

        /// Maximum number of results (defaults to the configured filter_limit)
        #[arg(long)]
        limit: Option<usize>,

        /// Print results as JSON
        #[arg(long)]
        json: bool,
    },

    /// Search and group results into per-type context sections
    Context {
        /// Path prefix of the index artifacts
        #[arg(long)]
        prefix: PathBuf,

        /// Query text
        query: String,

        /// Print sections as JSON
        #[arg(long)]
        json: bool,
    },

    /// Embed text and show vector info
    Embed {
        /// Text to embed
        text: String,

        /// Treat as query (uses query prompt prefix)
        #[arg(short, long)]
        query: bool,
    },
}

fn main() -> Result<()> {
    // Initialize logging, stdout is reserved for command output
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::load(&cli.config)?;

    match cli.hash_dim {
        Some(dimension) => run(HashEmbedder::new(dimension)?, cli.command, &config),
        None => run(load_model(&config)?, cli.command, &config),
    }
}

fn load_model(config: &Config) -> Result<FastEmbedder> {
    let model = config.embedding.model;
    eprintln!("Loading {model} (first run downloads the model)...");
    let embedder = match &config.embedding.cache_dir {
        Some(dir) => FastEmbedder::with_cache_dir(model, dir.clone())?,
        None => FastEmbedder::new(model)?,
    };
    Ok(embedder)
}

fn new_engine<E: Embedder>(embedder: E, config: &Config) -> Result<RetrievalEngine<E>> {
    let extractor = TemplateExtractor::new(&config.sources.columns);
    Ok(RetrievalEngine::with_extractor(embedder, Box::new(extractor))?)
}

fn load_engine<E: Embedder>(embedder: E, config: &Config, prefix: &Path) -> Result<RetrievalEngine<E>> {
    let mut engine = new_engine(embedder, config)?;
    match engine.load(prefix) {
        Ok(()) => Ok(engine),
        Err(e @ Error::NotFound(_)) => Err(e).with_context(|| {
            format!(
                "no index at '{}', run `fitrag build --prefix {}` first",
                prefix.display(),
                prefix.display()
            )
        }),
        Err(e) => Err(e.into()),
    }
}

fn run<E: Embedder>(embedder: E, command: Commands, config: &Config) -> Result<()> {
    match command {
        Commands::Build {
            knowledge,
            foods,
            prefix,
        } => {
            let records = source::read_all(&knowledge, &foods, &config.table_options())?;
            println!("Read {} records", records.len());

            let mut engine = new_engine(embedder, config)?;
            println!("Embedding with {}...", engine.embedder().model_name());
            engine.build(records)?;
            engine.save(&prefix)?;
            println!(
                "Done! Index at '{}' contains {} chunks",
                prefix.display(),
                engine.len()
            );
        }

        Commands::Search {
            prefix,
            query,
            k,
            json,
        } => {
            let mut engine = load_engine(embedder, config, &prefix)?;
            let k = k.unwrap_or(config.retrieval.default_k);
            let results = engine.search(&query, k)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&results)?);
            } else {
                println!("Searching: '{query}' (k={k})\n");
                print_ranked(&results);
            }
        }

        Commands::Filter {
            prefix,
            min_protein,
            max_carbs,
            max_fat,
            min_fiber,
            max_energy,
            category,
            limit,
            json,
        } => {
            let engine = load_engine(embedder, config, &prefix)?;

            let mut criteria = config.food_filter();
            if let Some(grams) = min_protein {
                criteria = criteria.min_protein(grams);
            }
            if let Some(grams) = max_carbs {
                criteria = criteria.max_carbs(grams);
            }
            if let Some(grams) = max_fat {
                criteria = criteria.max_fat(grams);
            }
            if let Some(grams) = min_fiber {
                criteria = criteria.min_fiber(grams);
            }
            if let Some(kcal) = max_energy {
                criteria = criteria.max_energy(kcal);
            }
            if let Some(category) = category {
                criteria = criteria.category(category);
            }
            if let Some(limit) = limit {
                criteria = criteria.limit(limit);
            }

            let chunks = engine.filter(&criteria);
            if json {
                println!("{}", serde_json::to_string_pretty(&chunks)?);
            } else {
                println!("{} matching foods\n", chunks.len());
                for chunk in &chunks {
                    print_chunk(chunk);
                }
            }
        }

        Commands::Context {
            prefix,
            query,
            json,
        } => {
            let mut engine = load_engine(embedder, config, &prefix)?;
            let sections = engine.context(
                &query,
                config.retrieval.context_depth,
                &config.retrieval.section_limits,
            )?;

            if json {
                println!("{}", serde_json::to_string_pretty(&sections)?);
            } else {
                for section in sections.iter().filter(|s| !s.is_empty()) {
                    println!("=== {} ===\n", section.kind);
                    print_ranked(&section.results);
                }
            }
        }

        Commands::Embed { text, query } => {
            let mut embedder = embedder;
            let embedding = if query {
                println!("Embedding as query: {text}");
                embedder.embed_query(&text)?
            } else {
                println!("Embedding as document: {text}");
                embedder
                    .embed_documents(&[text.as_str()])?
                    .into_iter()
                    .next()
                    .context("provider returned no embedding")?
            };

            println!("\nEmbedding stats:");
            println!("  Model: {}", embedder.model_name());
            println!("  Dimensions: {}", embedding.len());
            println!("  First 5 values: {:?}", &embedding[..embedding.len().min(5)]);
            println!("  Min: {:.4}", embedding.iter().copied().fold(f32::INFINITY, f32::min));
            println!("  Max: {:.4}", embedding.iter().copied().fold(f32::NEG_INFINITY, f32::max));
        }
    }

    Ok(())
}

fn print_ranked(results: &[RankedChunk]) {
    for result in results {
        println!(
            "#{} (score: {:.4}) [{}] {}",
            result.rank, result.score, result.chunk.kind, result.chunk.name
        );
        println!("{}\n", preview(&result.chunk.content));
    }
}

fn print_chunk(chunk: &Chunk) {
    println!("[{}] {}", chunk.category, chunk.name);
    println!("{}\n", preview(&chunk.content));
}

fn preview(content: &str) -> String {
    let preview: String = content.chars().take(PREVIEW_CHARS).collect();
    let ellipsis = if content.chars().count() > PREVIEW_CHARS { "..." } else { "" };
    format!("{preview}{ellipsis}")
}
