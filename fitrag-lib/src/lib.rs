//! FitRAG - semantic retrieval over a nutrition and fitness knowledge base
//!
//! # Architecture
//!
//! ```text
//! knowledge.json ─┐
//!                 ├─> Sources -> Extractor -> Embedder (one batch) -> Generation
//! foods.csv ──────┘                                                    |
//!                                                 chunks + matrix + index
//!                                                                      |
//! Query -> Embedder -> Index search <----------------------------------+
//!                          |
//!                   ranked chunks -> context sections
//! ```
//!
//! A [`engine::Generation`] is immutable. Rebuilding or loading produces a new
//! one which [`engine::RetrievalEngine`] swaps in whole.
//!
//! # Example
//!
//! ```ignore
//! use fitrag_lib::{config::Config, embed::HashEmbedder, engine::RetrievalEngine, source};
//!
//! let config = Config::load("fitrag.toml")?;
//! let records = source::read_all("knowledge.json".as_ref(), "foods.csv".as_ref(), &config.table_options())?;
//!
//! let mut engine = RetrievalEngine::new(HashEmbedder::new(256)?)?;
//! engine.build(records)?;
//! engine.save("data/fitness")?;
//!
//! let results = engine.search("protein after training", 5)?;
//! let meats = engine.filter(&config.food_filter().min_protein(15.0));
//! ```

pub mod chunk;
pub mod config;
pub mod context;
pub mod embed;
pub mod engine;
pub mod error;
pub mod filter;
pub mod index;
pub mod persist;
pub mod source;

pub use error::{Error, Result};
