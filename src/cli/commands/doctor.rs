//! Doctor command - verify configuration, vector store and embedding model.

use crate::cli::Output;
use crate::config::{Settings, VectorStoreProvider};
use crate::embedding::resolve_model;
use crate::error::VidGenieError;
use crate::vector_store::{open_store, VectorStore};
use console::style;
use std::path::Path;
use std::sync::Arc;

/// Check result for a single item.
#[derive(Debug)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
    pub hint: Option<String>,
}

#[derive(Debug, PartialEq)]
pub enum CheckStatus {
    Ok,
    Warning,
    Error,
}

impl CheckResult {
    fn ok(name: &str, message: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Ok,
            message: message.to_string(),
            hint: None,
        }
    }

    fn warning(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Warning,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn error(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Error,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn print(&self) {
        let icon = match self.status {
            CheckStatus::Ok => style("✓").green(),
            CheckStatus::Warning => style("!").yellow(),
            CheckStatus::Error => style("✗").red(),
        };

        println!("  {} {} - {}", icon, style(&self.name).bold(), self.message);

        if let Some(hint) = &self.hint {
            println!("    {} {}", style("→").dim(), style(hint).dim());
        }
    }
}

/// Run all diagnostic checks.
///
/// `config_path` is the `--config` override, if one was given.
pub async fn run_doctor(settings: &Settings, config_path: Option<&str>) -> anyhow::Result<()> {
    Output::header("VidGenie Doctor");
    println!();
    println!("Checking configuration, vector store and embedding model...\n");

    let mut checks = Vec::new();

    println!("{}", style("Configuration").bold());
    let config_check = check_config_file(&Settings::config_path(config_path));
    config_check.print();
    checks.push(config_check);

    println!();

    println!("{}", style("Vector Store").bold());
    let (store_checks, store) = check_store(settings).await;
    for check in &store_checks {
        check.print();
    }
    checks.extend(store_checks);

    println!();

    println!("{}", style("Embedding Model").bold());
    let model_checks = check_model(settings, store.as_deref());
    for check in &model_checks {
        check.print();
    }
    checks.extend(model_checks);

    println!();

    // Summary
    let errors = checks.iter().filter(|c| c.status == CheckStatus::Error).count();
    let warnings = checks.iter().filter(|c| c.status == CheckStatus::Warning).count();

    if errors > 0 {
        Output::error(&format!(
            "{} error(s) found. Please fix them before searching.",
            errors
        ));
        anyhow::bail!("doctor found {} error(s)", errors);
    } else if warnings > 0 {
        Output::warning(&format!("All checks passed with {} warning(s).", warnings));
    } else {
        Output::success("All checks passed! VidGenie is ready to use.");
    }

    Ok(())
}

/// Check if config file exists.
fn check_config_file(config_path: &Path) -> CheckResult {
    if config_path.exists() {
        CheckResult::ok("Config file", &format!("{}", config_path.display()))
    } else {
        CheckResult::warning(
            "Config file",
            "using defaults",
            "Create with: vidgenie config edit",
        )
    }
}

/// Open the configured store and report on the collection.
async fn check_store(settings: &Settings) -> (Vec<CheckResult>, Option<Arc<dyn VectorStore>>) {
    let mut results = Vec::new();

    match settings.vector_store.provider {
        VectorStoreProvider::Sqlite => {
            let db_path = settings.sqlite_path();
            if db_path.exists() {
                let size = std::fs::metadata(&db_path)
                    .map(|m| format_size(m.len()))
                    .unwrap_or_else(|_| "unknown size".to_string());
                results.push(CheckResult::ok(
                    "Database",
                    &format!("{} ({})", db_path.display(), size),
                ));
            }
        }
        VectorStoreProvider::Memory => {
            if settings.snapshot_path().is_none() {
                results.push(CheckResult::warning(
                    "Snapshot",
                    "no snapshot_path set, collection is empty",
                    "Set with: vidgenie config set vector_store.snapshot_path <file>",
                ));
            }
        }
    }

    let store = match open_store(settings) {
        Ok(store) => store,
        Err(e) => {
            results.push(store_error_check(settings, &e));
            return (results, None);
        }
    };

    match store.count().await {
        Ok(0) => results.push(CheckResult::warning(
            "Collection",
            &format!("'{}' is empty", store.collection()),
            "Run the ingestion process to populate it",
        )),
        Ok(count) => results.push(CheckResult::ok(
            "Collection",
            &format!("'{}' ({} chunks, {} dimensions)", store.collection(), count, store.dimension()),
        )),
        Err(e) => results.push(CheckResult::error(
            "Collection",
            &e.to_string(),
            "The database may be corrupt or locked",
        )),
    }

    (results, Some(store))
}

fn store_error_check(settings: &Settings, error: &VidGenieError) -> CheckResult {
    match error {
        VidGenieError::CollectionNotFound(name) => CheckResult::error(
            "Collection",
            &format!("'{}' not found", name),
            "Check vector_store.collection matches the ingested collection name",
        ),
        VidGenieError::StoreUnavailable(msg) => CheckResult::error(
            "Vector store",
            msg,
            &format!(
                "Point vector_store.sqlite_path at the ingested database (currently {})",
                settings.sqlite_path().display()
            ),
        ),
        other => CheckResult::error("Vector store", &other.to_string(), "See logs with -vv"),
    }
}

/// Check the model name, its dimensions against the collection, and the cache.
fn check_model(settings: &Settings, store: Option<&dyn VectorStore>) -> Vec<CheckResult> {
    let mut results = Vec::new();

    let dimensions = match resolve_model(&settings.embedding.model) {
        Ok((_, dimensions)) => {
            results.push(CheckResult::ok(
                "Model",
                &format!("{} ({} dimensions)", settings.embedding.model, dimensions),
            ));
            dimensions
        }
        Err(e) => {
            results.push(CheckResult::error(
                "Model",
                &e.to_string(),
                "Use the sentence-embedding model the collection was ingested with",
            ));
            return results;
        }
    };

    if let Some(store) = store {
        if store.dimension() == dimensions {
            results.push(CheckResult::ok("Compatibility", "model matches collection"));
        } else {
            results.push(CheckResult::error(
                "Compatibility",
                &format!(
                    "model produces {} dimensions, collection holds {}",
                    dimensions,
                    store.dimension()
                ),
                "Similarity scores are meaningless across models; set embedding.model to the ingestion model",
            ));
        }
    }

    let cache_dir = settings.model_cache_dir();
    let cached = cache_dir
        .read_dir()
        .is_ok_and(|mut entries| entries.next().is_some());
    if cached {
        results.push(CheckResult::ok("Model cache", &format!("{}", cache_dir.display())));
    } else {
        results.push(CheckResult::warning(
            "Model cache",
            &format!("{} (empty)", cache_dir.display()),
            "The model is downloaded on the first search; this needs network access",
        ));
    }

    results
}

/// Format bytes as human-readable size.
fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} bytes", bytes)
    }
}
