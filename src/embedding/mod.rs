//! Query embedding for semantic search.

mod local;

pub use local::{resolve_model, FastEmbedder};

use crate::error::Result;
use async_trait::async_trait;

/// Trait for embedding generation.
///
/// Implementations must be deterministic: the same text always maps to the
/// same vector. Vectors are only comparable with vectors from the same model.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Generate an embedding for a single text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Get the embedding dimensions.
    fn dimensions(&self) -> usize;

    /// Name of the underlying model.
    fn model_name(&self) -> &str;

    /// Load any expensive resources up front so the first query does not pay for it.
    async fn warm_up(&self) -> Result<()> {
        Ok(())
    }
}
