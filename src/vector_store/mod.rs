//! Vector store abstraction for VidGenie.
//!
//! Provides a read-only, trait-based interface over a collection of transcript
//! chunks that an external ingestion process has already embedded and stored.

mod memory;
mod sqlite;

pub use memory::{MemoryVectorStore, Snapshot, SnapshotChunk};
pub use sqlite::{SqliteVectorStore, SCHEMA};

use crate::config::{Settings, VectorStoreProvider};
use crate::error::{Result, VidGenieError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::warn;

/// Metadata attached to every transcript chunk.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkMetadata {
    /// Source video URL.
    pub video_uri: String,
    /// Offset of the chunk into the video, in seconds.
    pub start_time: f64,
}

impl ChunkMetadata {
    pub fn new(video_uri: impl Into<String>, start_time: f64) -> Self {
        Self {
            video_uri: video_uri.into(),
            start_time,
        }
    }

    /// Parse stored JSON metadata, tolerating missing or mistyped fields.
    pub fn from_json(raw: &str) -> Self {
        let value: serde_json::Value = match serde_json::from_str(raw) {
            Ok(v) => v,
            Err(e) => {
                warn!("Unparseable chunk metadata, using defaults: {}", e);
                return Self::default();
            }
        };
        Self::from_value(&value)
    }

    /// Pull `video_uri` and `start_time` out of an arbitrary JSON object.
    pub fn from_value(value: &serde_json::Value) -> Self {
        let video_uri = match value.get("video_uri") {
            Some(serde_json::Value::String(s)) => s.clone(),
            other => {
                warn!("Chunk metadata has no string video_uri: {:?}", other);
                String::new()
            }
        };

        let start_time = match value.get("start_time") {
            Some(serde_json::Value::Number(n)) => n.as_f64().unwrap_or_default(),
            // Some ingestion runs stored numbers as strings.
            Some(serde_json::Value::String(s)) => s.trim().parse().unwrap_or_else(|_| {
                warn!("Chunk metadata start_time is not numeric: {}", s);
                0.0
            }),
            other => {
                warn!("Chunk metadata has no numeric start_time: {:?}", other);
                0.0
            }
        };

        Self {
            video_uri,
            start_time,
        }
    }
}

/// A chunk as it lives in the collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkRecord {
    /// Chunk identifier.
    pub id: String,
    /// Raw document text (`Title: …\nDescription: …\nTranscript: …`).
    pub document: String,
    /// Attached metadata.
    pub metadata: ChunkMetadata,
    /// Embedding vector.
    pub embedding: Vec<f32>,
}

/// A nearest-neighbor hit.
#[derive(Debug, Clone)]
pub struct Neighbor {
    /// Chunk identifier.
    pub id: String,
    /// Raw document text.
    pub document: String,
    /// Attached metadata.
    pub metadata: ChunkMetadata,
    /// Similarity score (higher is closer).
    pub score: f32,
}

/// Trait for read-only vector store clients.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Return up to `top_k` nearest chunks, closest first.
    ///
    /// `top_k` must be positive and is clamped to the collection size.
    async fn query(&self, embedding: &[f32], top_k: usize) -> Result<Vec<Neighbor>>;

    /// Number of chunks in the collection.
    async fn count(&self) -> Result<usize>;

    /// Dimensionality of the vectors in the collection.
    fn dimension(&self) -> usize;

    /// Name of the collection.
    fn collection(&self) -> &str;
}

/// Open the store configured in `settings`.
pub fn open_store(settings: &Settings) -> Result<Arc<dyn VectorStore>> {
    let collection = &settings.vector_store.collection;
    match settings.vector_store.provider {
        VectorStoreProvider::Sqlite => {
            let store = SqliteVectorStore::open(&settings.sqlite_path(), collection)?;
            Ok(Arc::new(store))
        }
        VectorStoreProvider::Memory => {
            let store = match settings.snapshot_path() {
                Some(path) => MemoryVectorStore::from_snapshot(&path, collection)?,
                None => MemoryVectorStore::new(collection, settings.embedding.dimensions as usize),
            };
            Ok(Arc::new(store))
        }
    }
}

/// Check the arguments every `query` implementation shares.
pub(crate) fn validate_query(embedding: &[f32], top_k: usize, dimension: usize) -> Result<()> {
    if top_k == 0 {
        return Err(VidGenieError::InvalidInput(
            "top_k must be greater than zero".to_string(),
        ));
    }
    if embedding.len() != dimension {
        return Err(VidGenieError::DimensionMismatch {
            expected: dimension,
            actual: embedding.len(),
        });
    }
    Ok(())
}

/// Whether a stored vector can be scored. NaN or infinite components poison the score.
pub(crate) fn is_finite_vector(embedding: &[f32]) -> bool {
    embedding.iter().all(|v| v.is_finite())
}

/// Order hits by descending score, keeping store order among ties, and keep `top_k`.
///
/// Hits with a non-finite score are dropped.
pub(crate) fn rank(hits: Vec<Neighbor>, top_k: usize) -> Vec<Neighbor> {
    let mut hits: Vec<Neighbor> = hits
        .into_iter()
        .filter(|hit| {
            if hit.score.is_finite() {
                true
            } else {
                warn!("Skipping chunk {} with non-finite score", hit.id);
                false
            }
        })
        .collect();
    hits.sort_by(|a, b| b.score.total_cmp(&a.score));
    hits.truncate(top_k);
    hits
}

/// Compute cosine similarity between two vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}
