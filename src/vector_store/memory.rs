//! In-memory vector store implementation.
//!
//! Useful for testing and for small collections exported as JSON snapshots.

use super::{cosine_similarity, is_finite_vector, rank, validate_query, ChunkMetadata, ChunkRecord, Neighbor, VectorStore};
use crate::error::{Result, VidGenieError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info, instrument, warn};

/// On-disk JSON snapshot of a collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub collection: String,
    pub dimension: usize,
    #[serde(default)]
    pub chunks: Vec<SnapshotChunk>,
}

/// One chunk inside a snapshot; metadata is kept loose and parsed leniently.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotChunk {
    pub id: String,
    #[serde(default)]
    pub document: String,
    #[serde(default)]
    pub metadata: serde_json::Value,
    pub embedding: Vec<f32>,
}

/// In-memory vector store. Immutable once shared, so concurrent queries need no locking.
pub struct MemoryVectorStore {
    collection: String,
    dimension: usize,
    records: Vec<ChunkRecord>,
}

impl MemoryVectorStore {
    /// Create an empty in-memory collection.
    pub fn new(collection: &str, dimension: usize) -> Self {
        Self {
            collection: collection.to_string(),
            dimension,
            records: Vec::new(),
        }
    }

    /// Add a chunk. Insertion order is the store's native order.
    pub fn insert(&mut self, record: ChunkRecord) -> Result<()> {
        if record.embedding.len() != self.dimension {
            return Err(VidGenieError::DimensionMismatch {
                expected: self.dimension,
                actual: record.embedding.len(),
            });
        }
        if !is_finite_vector(&record.embedding) {
            return Err(VidGenieError::InvalidInput(format!(
                "Chunk {} has non-finite embedding values",
                record.id
            )));
        }
        self.records.push(record);
        Ok(())
    }

    /// Builder-style variant of [`insert`](Self::insert).
    pub fn with_records(mut self, records: impl IntoIterator<Item = ChunkRecord>) -> Result<Self> {
        for record in records {
            self.insert(record)?;
        }
        Ok(self)
    }

    /// Load the named collection from a JSON snapshot file.
    #[instrument(skip_all, fields(path = %path.display()))]
    pub fn from_snapshot(path: &Path, collection: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            VidGenieError::StoreUnavailable(format!("Cannot read snapshot {}: {}", path.display(), e))
        })?;
        let snapshot: Snapshot = serde_json::from_str(&content).map_err(|e| {
            VidGenieError::StoreUnavailable(format!("Invalid snapshot {}: {}", path.display(), e))
        })?;

        if snapshot.collection != collection {
            return Err(VidGenieError::CollectionNotFound(format!(
                "{} (snapshot holds '{}')",
                collection, snapshot.collection
            )));
        }

        let mut store = Self::new(collection, snapshot.dimension);
        for chunk in snapshot.chunks {
            if chunk.embedding.len() != snapshot.dimension {
                warn!(
                    "Skipping chunk {} with {} dimensions (expected {})",
                    chunk.id,
                    chunk.embedding.len(),
                    snapshot.dimension
                );
                continue;
            }
            if !is_finite_vector(&chunk.embedding) {
                warn!("Skipping chunk {} with non-finite embedding values", chunk.id);
                continue;
            }
            store.records.push(ChunkRecord {
                id: chunk.id,
                document: chunk.document,
                metadata: ChunkMetadata::from_value(&chunk.metadata),
                embedding: chunk.embedding,
            });
        }

        info!("Loaded {} chunks into collection {}", store.records.len(), collection);
        Ok(store)
    }
}

#[async_trait]
impl VectorStore for MemoryVectorStore {
    async fn query(&self, embedding: &[f32], top_k: usize) -> Result<Vec<Neighbor>> {
        validate_query(embedding, top_k, self.dimension)?;

        let hits = self
            .records
            .iter()
            .map(|record| Neighbor {
                id: record.id.clone(),
                document: record.document.clone(),
                metadata: record.metadata.clone(),
                score: cosine_similarity(embedding, &record.embedding),
            })
            .collect();

        let results = rank(hits, top_k);
        debug!("Found {} matching chunks", results.len());
        Ok(results)
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.records.len())
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn collection(&self) -> &str {
        &self.collection
    }
}
