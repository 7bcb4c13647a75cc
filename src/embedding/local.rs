//! Local sentence-transformer embeddings via fastembed (ONNX runtime).
//!
//! The default model is `all-MiniLM-L6-v2`, producing 384-dimensional vectors.
//! The model is loaded once, on first use, and shared by every later query.

use super::Embedder;
use crate::config::Settings;
use crate::error::{Result, VidGenieError};
use async_trait::async_trait;
use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tokio::sync::OnceCell;
use tracing::{debug, info, instrument};

/// Resolve a configured model name to a fastembed model and its dimensionality.
pub fn resolve_model(name: &str) -> Result<(EmbeddingModel, usize)> {
    let short = name
        .trim()
        .trim_start_matches("sentence-transformers/")
        .trim_start_matches("BAAI/")
        .to_lowercase();

    match short.as_str() {
        "all-minilm-l6-v2" => Ok((EmbeddingModel::AllMiniLML6V2, 384)),
        "all-minilm-l12-v2" => Ok((EmbeddingModel::AllMiniLML12V2, 384)),
        "bge-small-en-v1.5" => Ok((EmbeddingModel::BGESmallENV15, 384)),
        "bge-base-en-v1.5" => Ok((EmbeddingModel::BGEBaseENV15, 768)),
        _ => Err(VidGenieError::ModelUnavailable(format!(
            "Unsupported embedding model: {}",
            name
        ))),
    }
}

/// Embedder backed by a local fastembed model.
pub struct FastEmbedder {
    model_name: String,
    model: EmbeddingModel,
    dimensions: usize,
    cache_dir: PathBuf,
    show_download_progress: bool,
    handle: OnceCell<Arc<Mutex<TextEmbedding>>>,
}

impl FastEmbedder {
    /// Create an embedder for the default `all-MiniLM-L6-v2` model.
    pub fn new(cache_dir: PathBuf) -> Result<Self> {
        Self::with_model("all-MiniLM-L6-v2", cache_dir)
    }

    /// Create an embedder for a named model. Nothing is loaded until first use.
    pub fn with_model(model_name: &str, cache_dir: PathBuf) -> Result<Self> {
        let (model, dimensions) = resolve_model(model_name)?;
        Ok(Self {
            model_name: model_name.to_string(),
            model,
            dimensions,
            cache_dir,
            show_download_progress: false,
            handle: OnceCell::new(),
        })
    }

    /// Create an embedder from settings, checking the configured dimensions.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let mut embedder =
            Self::with_model(&settings.embedding.model, settings.model_cache_dir())?;

        let configured = settings.embedding.dimensions as usize;
        if configured != embedder.dimensions {
            return Err(VidGenieError::DimensionMismatch {
                expected: embedder.dimensions,
                actual: configured,
            });
        }

        embedder.show_download_progress = settings.embedding.show_download_progress;
        Ok(embedder)
    }

    /// Whether the model has been loaded.
    pub fn is_loaded(&self) -> bool {
        self.handle.initialized()
    }

    async fn handle(&self) -> Result<Arc<Mutex<TextEmbedding>>> {
        self.handle
            .get_or_try_init(|| async {
                info!("Loading embedding model {}", self.model_name);

                let options = InitOptions::new(self.model.clone())
                    .with_cache_dir(self.cache_dir.clone())
                    .with_show_download_progress(self.show_download_progress);

                let model = tokio::task::spawn_blocking(move || TextEmbedding::try_new(options))
                    .await
                    .map_err(|e| VidGenieError::ModelUnavailable(format!("Model loader panicked: {}", e)))?
                    .map_err(|e| {
                        VidGenieError::ModelUnavailable(format!(
                            "Failed to initialize embedding model: {}. The first run needs network access to download it",
                            e
                        ))
                    })?;

                Ok::<_, VidGenieError>(Arc::new(Mutex::new(model)))
            })
            .await
            .cloned()
    }
}

#[async_trait]
impl Embedder for FastEmbedder {
    #[instrument(skip(self, text), fields(len = text.len()))]
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let handle = self.handle().await?;
        let input = vec![text.to_string()];

        let embeddings = tokio::task::spawn_blocking(move || {
            let mut model = handle.lock().map_err(|_| {
                VidGenieError::Embedding(
                    "Failed to acquire embedding model lock - model may be poisoned".to_string(),
                )
            })?;
            model
                .embed(input, None)
                .map_err(|e| VidGenieError::Embedding(format!("Failed to generate embedding: {}", e)))
        })
        .await
        .map_err(|e| VidGenieError::Embedding(format!("Embedding task panicked: {}", e)))??;

        let embedding = embeddings
            .into_iter()
            .next()
            .ok_or_else(|| VidGenieError::Embedding("Empty embedding response".to_string()))?;

        if embedding.len() != self.dimensions {
            return Err(VidGenieError::DimensionMismatch {
                expected: self.dimensions,
                actual: embedding.len(),
            });
        }

        debug!("Generated {}-dimensional embedding", embedding.len());
        Ok(embedding)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }

    async fn warm_up(&self) -> Result<()> {
        self.handle().await.map(|_| ())
    }
}
