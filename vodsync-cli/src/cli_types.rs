//! CLI type definitions: command enums and argument structs.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "vodsync")]
#[command(about = "Synchronize provider movie and series catalogs", long_about = None)]
pub(crate) struct Cli {
    /// Catalog database path (overrides settings and $VODSYNC_DB)
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// Only show warnings and errors (suppress normal output)
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Enable verbose/debug logging (timestamps + debug-level messages)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Manage registered providers
    Provider {
        #[command(subcommand)]
        action: ProviderAction,
    },

    /// Synchronize one provider, or all of them concurrently
    Sync {
        /// Provider id to synchronize
        #[arg(required_unless_present = "all", conflicts_with = "all")]
        provider: Option<String>,

        /// Synchronize every registered provider
        #[arg(long)]
        all: bool,
    },

    /// Ingest an M3U playlist for a provider
    Playlist {
        /// Provider id the playlist belongs to
        provider: String,

        /// Read the playlist from a local file instead of the provider URL
        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// Refresh the episode list of one series
    Episodes {
        /// Provider id
        provider: String,

        /// Provider-native series id
        series: String,
    },

    /// Show catalog statistics
    Stats,

    /// List movies or series
    List {
        #[arg(value_enum)]
        kind: KindArg,

        /// Only show entries in this category
        #[arg(long)]
        category: Option<String>,

        /// Maximum number of entries to show
        #[arg(short, long, default_value_t = 50)]
        limit: u32,
    },

    /// Search movies and series by name
    Search {
        /// Text to look for in entity names
        query: String,

        /// Restrict the search to one kind
        #[arg(long, value_enum)]
        kind: Option<KindArg>,
    },

    /// Show recent sync runs
    History {
        /// Only show runs for this provider
        #[arg(long)]
        provider: Option<String>,

        /// Maximum number of runs to show
        #[arg(short, long, default_value_t = 20)]
        limit: u32,
    },

    /// Inspect settings
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
pub(crate) enum ProviderAction {
    /// Register or update a provider
    Add {
        /// Short id used in commands and identity keys (letters, digits, '-', '_')
        id: String,

        /// Base URL (xtream) or playlist URL (m3u)
        #[arg(long)]
        url: String,

        #[arg(long, value_enum, default_value = "xtream")]
        kind: ProviderKindArg,

        /// Display name (defaults to the id)
        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        username: Option<String>,

        #[arg(long)]
        password: Option<String>,
    },

    /// List registered providers
    List,

    /// Remove a provider and everything only it referenced
    Remove {
        id: String,
    },
}

#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Show effective settings and where they came from
    Show,

    /// Print the settings file path
    Path,
}

#[derive(Clone, Copy, ValueEnum)]
pub(crate) enum KindArg {
    Movies,
    Series,
}

#[derive(Clone, Copy, ValueEnum)]
pub(crate) enum ProviderKindArg {
    Xtream,
    M3u,
}
