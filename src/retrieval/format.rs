//! Parsing of stored chunk documents into display fields.
//!
//! Documents are stored as three lines, `Title: …`, `Description: …` and
//! `Transcript: …`. Ingested data does not always follow that layout, so a
//! missing line or prefix yields an empty field instead of an error.

use super::RetrievalResult;
use crate::vector_store::ChunkMetadata;

pub const TITLE_PREFIX: &str = "Title: ";
pub const DESCRIPTION_PREFIX: &str = "Description: ";
pub const TRANSCRIPT_PREFIX: &str = "Transcript: ";

/// Build a result from a raw document and its metadata. Never fails.
pub fn format_result(document: &str, metadata: &ChunkMetadata) -> RetrievalResult {
    let mut lines = document.split('\n');

    RetrievalResult {
        video_uri: metadata.video_uri.clone(),
        start_time: metadata.start_time,
        title: field(lines.next(), TITLE_PREFIX),
        description: field(lines.next(), DESCRIPTION_PREFIX),
        transcript_excerpt: field(lines.next(), TRANSCRIPT_PREFIX),
        score: None,
    }
}

fn field(line: Option<&str>, prefix: &str) -> String {
    line.and_then(|l| l.strip_prefix(prefix))
        .unwrap_or_default()
        .to_string()
}

/// Render seconds as `m:ss`. Minutes are not wrapped into hours.
pub fn format_time(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds.floor() as u64
    } else {
        0
    };
    format!("{}:{:02}", total / 60, total % 60)
}
