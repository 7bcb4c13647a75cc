//! CLI output formatting utilities.

use crate::retrieval::RetrievalResult;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

/// Output helper for CLI formatting.
pub struct Output;

impl Output {
    /// Print an info message.
    pub fn info(msg: &str) {
        println!("{} {}", style(">>").cyan().bold(), msg);
    }

    /// Print a success message.
    pub fn success(msg: &str) {
        println!("{} {}", style(">>").green().bold(), msg);
    }

    /// Print a warning message.
    pub fn warning(msg: &str) {
        eprintln!("{} {}", style(">>").yellow().bold(), msg);
    }

    /// Print an error message.
    pub fn error(msg: &str) {
        eprintln!("{} {}", style(">>").red().bold(), msg);
    }

    /// Print a header.
    pub fn header(msg: &str) {
        println!("\n{}", style(msg).bold().underlined());
    }

    /// Print a key-value pair.
    pub fn kv(key: &str, value: &str) {
        println!("  {}: {}", style(key).dim(), value);
    }

    /// Print one numbered result card.
    pub fn result_card(rank: usize, result: &RetrievalResult) {
        let score = result
            .score
            .map(|s| format!(" (score: {:.2})", s))
            .unwrap_or_default();

        println!("\n{} {}{}", style(format!("[{}]", rank)).green().bold(), style(&result.title).bold(), score);
        if !result.description.is_empty() {
            println!("   {}", content_preview(&result.description, 200));
        }
        println!("   {} {}", style("Start Time:").dim(), style(result.timestamp()).cyan());
        if !result.transcript_excerpt.is_empty() {
            println!("   {}", style(content_preview(&result.transcript_excerpt, 300)).italic());
        }
        println!("   {} {}", style("Watch Video:").dim(), style(result.watch_url()).underlined());
    }

    /// Create a spinner.
    pub fn spinner(msg: &str) -> ProgressBar {
        let pb = ProgressBar::new_spinner();
        if let Ok(template) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
            pb.set_style(template);
        }
        pb.set_message(msg.to_string());
        pb.enable_steady_tick(std::time::Duration::from_millis(100));
        pb
    }
}

/// Truncate content with ellipsis, on a character boundary.
fn content_preview(content: &str, max_chars: usize) -> String {
    let content = content.replace('\n', " ");
    match content.char_indices().nth(max_chars) {
        None => content,
        Some((cut, _)) => format!("{}...", &content[..cut]),
    }
}
