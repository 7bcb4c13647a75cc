//! CLI module for VidGenie.

pub mod commands;
mod output;

pub use output::Output;

use crate::config::Settings;
use crate::error::Result;
use clap::{Parser, Subcommand};

/// VidGenie - Your Smart Video Assistant
///
/// Semantic search over indexed video transcripts. Ask a question and jump
/// straight to the moment in the video that answers it.
#[derive(Parser, Debug)]
#[command(name = "vidgenie")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true, env = "VIDGENIE_CONFIG")]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Search the transcript library with a natural-language question
    Search {
        /// The question to ask
        query: String,

        /// Maximum number of results (defaults to retrieval.top_k)
        #[arg(short = 'k', long)]
        top_k: Option<usize>,

        /// Print results as JSON
        #[arg(long)]
        json: bool,
    },

    /// Start HTTP API server for integration with other front ends
    Serve {
        /// Host to bind to (defaults to server.host)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to (defaults to server.port)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Show collection statistics
    Stats,

    /// Check configuration, vector store and model cache
    Doctor,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Set a configuration value
    Set {
        /// Configuration key (e.g., "retrieval.top_k")
        key: String,
        /// Configuration value
        value: String,
    },

    /// Open configuration file in editor
    Edit,

    /// Show configuration file path
    Path,
}

impl Cli {
    /// Load the settings this invocation runs with.
    ///
    /// `config edit` and `config path` still work when the file does not
    /// parse, so the user can repair it; they fall back to defaults.
    pub fn load_settings(&self) -> Result<Settings> {
        let path = Settings::config_path(self.config.as_deref());
        match Settings::load_from(Some(&path)) {
            Ok(settings) => Ok(settings),
            Err(e) if self.tolerates_broken_config() => {
                Output::warning(&format!("Ignoring unreadable config {}: {}", path.display(), e));
                Ok(Settings::default())
            }
            Err(e) => Err(e),
        }
    }

    fn tolerates_broken_config(&self) -> bool {
        matches!(
            self.command,
            Commands::Config {
                action: ConfigAction::Edit | ConfigAction::Path
            }
        )
    }
}
