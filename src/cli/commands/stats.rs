//! Stats command implementation.

use crate::cli::Output;
use crate::config::Settings;
use crate::vector_store::open_store;
use anyhow::Result;

/// Run the stats command.
pub async fn run_stats(settings: &Settings) -> Result<()> {
    let store = match open_store(settings) {
        Ok(store) => store,
        Err(e) => {
            Output::error(&format!("Failed to open vector store: {}", e));
            return Err(e.into());
        }
    };

    let count = store.count().await?;

    Output::header(&format!("Collection '{}'", store.collection()));
    println!();
    Output::kv("Provider", &settings.vector_store.provider.to_string());
    Output::kv("Chunks", &count.to_string());
    Output::kv("Dimensions", &store.dimension().to_string());
    Output::kv("Embedding model", &settings.embedding.model);

    if count == 0 {
        println!();
        Output::info("The collection is empty. Searches will return no results until it is ingested.");
    }

    Ok(())
}
