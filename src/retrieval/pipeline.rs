//! The retrieval pipeline: encode, search, format.

use super::{format_result, RetrievalResult, DEFAULT_TOP_K};
use crate::config::Settings;
use crate::embedding::{Embedder, FastEmbedder};
use crate::error::{Result, VidGenieError};
use crate::vector_store::{open_store, VectorStore};
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Turns free-text questions into ranked transcript matches.
///
/// Holds the embedding model and the store handle for the life of the
/// process. Build it once and share it; both resources are expensive to
/// acquire and cheap to reuse.
pub struct Retriever {
    embedder: Arc<dyn Embedder>,
    vector_store: Arc<dyn VectorStore>,
    default_top_k: usize,
}

impl Retriever {
    /// Create a retriever from an embedder and a store built with the same model.
    pub fn new(embedder: Arc<dyn Embedder>, vector_store: Arc<dyn VectorStore>) -> Result<Self> {
        if embedder.dimensions() != vector_store.dimension() {
            return Err(VidGenieError::DimensionMismatch {
                expected: vector_store.dimension(),
                actual: embedder.dimensions(),
            });
        }

        Ok(Self {
            embedder,
            vector_store,
            default_top_k: DEFAULT_TOP_K,
        })
    }

    /// Build the configured embedder and store.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let embedder: Arc<dyn Embedder> = Arc::new(FastEmbedder::from_settings(settings)?);
        let vector_store = open_store(settings)?;

        info!(
            "Retriever ready: model {}, collection {}",
            embedder.model_name(),
            vector_store.collection()
        );

        Ok(Self::new(embedder, vector_store)?.with_default_top_k(settings.retrieval.top_k))
    }

    /// Set the number of results used when `retrieve` is called without one.
    /// Zero is ignored.
    pub fn with_default_top_k(mut self, top_k: usize) -> Self {
        if top_k > 0 {
            self.default_top_k = top_k;
        }
        self
    }

    /// Number of results used when the caller does not specify one.
    pub fn default_top_k(&self) -> usize {
        self.default_top_k
    }

    /// Get the embedder.
    pub fn embedder(&self) -> Arc<dyn Embedder> {
        self.embedder.clone()
    }

    /// Get the vector store.
    pub fn vector_store(&self) -> Arc<dyn VectorStore> {
        self.vector_store.clone()
    }

    /// Load the embedding model now rather than on the first query.
    pub async fn warm_up(&self) -> Result<()> {
        self.embedder.warm_up().await
    }

    /// Return up to `top_k` (default 3) matches for `query`, most similar first.
    ///
    /// Empty or whitespace-only queries are rejected. An empty collection
    /// yields an empty list.
    #[instrument(skip(self), fields(collection = %self.vector_store.collection()))]
    pub async fn retrieve(&self, query: &str, top_k: Option<usize>) -> Result<Vec<RetrievalResult>> {
        if query.trim().is_empty() {
            return Err(VidGenieError::InvalidQuery("query is empty".to_string()));
        }

        let top_k = top_k.unwrap_or(self.default_top_k);
        if top_k == 0 {
            return Err(VidGenieError::InvalidInput(
                "top_k must be greater than zero".to_string(),
            ));
        }

        let query_embedding = self.embedder.embed(query).await?;
        let neighbors = self.vector_store.query(&query_embedding, top_k).await?;
        debug!("Store returned {} neighbors", neighbors.len());

        Ok(neighbors
            .into_iter()
            .map(|neighbor| {
                let mut result = format_result(&neighbor.document, &neighbor.metadata);
                result.score = Some(neighbor.score);
                result
            })
            .collect())
    }
}
