//! VidGenie - Semantic Search over Video Transcripts
//!
//! Ask a question in plain language and get back the transcript segments that
//! answer it, each with a link to the source video and the time it starts at.
//!
//! # Overview
//!
//! Transcripts are chunked, embedded and stored by a separate ingestion step.
//! VidGenie reads that collection:
//! - Embeds the question with the same sentence model used at ingestion
//! - Finds the nearest transcript chunks in the vector store
//! - Parses each chunk into title, description and transcript excerpt
//!
//! # Architecture
//!
//! - `config` - Configuration management
//! - `embedding` - Query embedding (local MiniLM via fastembed)
//! - `vector_store` - Read-only vector collection access
//! - `retrieval` - Result formatting and the retrieval pipeline
//! - `cli` - Command-line and HTTP front ends
//!
//! # Example
//!
//! ```rust,no_run
//! use vidgenie::config::Settings;
//! use vidgenie::retrieval::Retriever;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let retriever = Retriever::from_settings(&settings)?;
//!
//!     for result in retriever.retrieve("How do I monitor model drift?", None).await? {
//!         println!("{} @ {} {}", result.title, result.timestamp(), result.watch_url());
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod config;
pub mod embedding;
pub mod error;
pub mod retrieval;
pub mod vector_store;

pub use error::{Result, VidGenieError};
