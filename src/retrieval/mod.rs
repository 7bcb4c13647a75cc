//! Retrieval of timestamped transcript matches for a free-text query.
//!
//! The [`Retriever`] embeds the query, asks the vector store for the nearest
//! chunks and turns each hit into a [`RetrievalResult`], keeping the store's
//! similarity order.

pub mod format;
mod pipeline;

pub use format::{format_result, format_time};
pub use pipeline::Retriever;

use serde::{Deserialize, Serialize};
use url::Url;

/// Number of results returned when the caller does not ask for a count.
pub const DEFAULT_TOP_K: usize = 3;

/// A transcript match ready for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalResult {
    /// Source video URL.
    pub video_uri: String,
    /// Offset into the video, in seconds.
    pub start_time: f64,
    /// Video title.
    pub title: String,
    /// Video description.
    pub description: String,
    /// Transcript text of the chunk.
    pub transcript_excerpt: String,
    /// Similarity score, when produced by a query.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f32>,
}

impl RetrievalResult {
    /// Start time as `m:ss`.
    pub fn timestamp(&self) -> String {
        format_time(self.start_time)
    }

    /// Link that opens the video at this chunk's start time.
    ///
    /// Any existing `t` parameter is replaced. URIs that do not parse as
    /// URLs are returned unchanged.
    pub fn watch_url(&self) -> String {
        let mut url = match Url::parse(&self.video_uri) {
            Ok(url) if url.has_host() => url,
            _ => return self.video_uri.clone(),
        };

        let kept: Vec<(String, String)> = url
            .query_pairs()
            .filter(|(k, _)| k != "t")
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();

        let seconds = if self.start_time.is_finite() && self.start_time > 0.0 {
            self.start_time.floor() as u64
        } else {
            0
        };

        url.query_pairs_mut()
            .clear()
            .extend_pairs(kept)
            .append_pair("t", &format!("{}s", seconds));

        url.to_string()
    }
}
