//! Configuration module for VidGenie.
//!
//! Handles loading and managing application settings.

mod settings;

pub use settings::{
    EmbeddingSettings, GeneralSettings, RetrievalSettings, ServerSettings, Settings,
    VectorStoreProvider, VectorStoreSettings,
};
