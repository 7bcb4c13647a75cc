//! Search command implementation.

use crate::cli::Output;
use crate::config::Settings;
use crate::retrieval::{RetrievalResult, Retriever};
use anyhow::Result;
use serde::Serialize;

#[derive(Serialize)]
struct SearchOutput<'a> {
    query: &'a str,
    results: &'a [RetrievalResult],
}

/// Run the search command.
pub async fn run_search(
    query: &str,
    top_k: Option<usize>,
    json: bool,
    settings: &Settings,
) -> Result<()> {
    let retriever = Retriever::from_settings(settings)?;

    // Load the model before the spinner starts so a first-run download bar is not overdrawn.
    if let Err(e) = retriever.warm_up().await {
        Output::error(&format!("Could not load embedding model: {}", e));
        return Err(e.into());
    }

    let spinner = (!json).then(|| Output::spinner("VidGenie is thinking..."));
    let results = retriever.retrieve(query, top_k).await;
    if let Some(spinner) = spinner {
        spinner.finish_and_clear();
    }

    let results = match results {
        Ok(results) => results,
        Err(e) => {
            Output::error(&format!("Search failed: {}", e));
            return Err(e.into());
        }
    };

    if json {
        let output = SearchOutput {
            query,
            results: &results,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    if results.is_empty() {
        Output::warning("No results found.");
        return Ok(());
    }

    Output::header("Results");
    for (idx, result) in results.iter().enumerate() {
        Output::result_card(idx + 1, result);
    }
    println!();

    Ok(())
}
