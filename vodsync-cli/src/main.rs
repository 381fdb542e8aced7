//! vodsync CLI
//!
//! Command-line interface for synchronizing provider VOD catalogs into a
//! local SQLite database.

mod cli_types;
mod commands;
mod error;
mod spinner;

use std::io::Write;

use clap::Parser;
use env_logger::{Builder, Target};
use log::LevelFilter;

use cli_types::{Cli, Commands, ConfigAction, ProviderAction};
pub(crate) use error::CliError;
use vodsync_provider::Settings;

fn init_logger(verbose: bool, quiet: bool) {
    let mut builder = Builder::new();
    builder.target(Target::Stdout);

    if verbose {
        builder
            .filter_level(LevelFilter::Info)
            .filter_module("vodsync", LevelFilter::Debug)
            .format_timestamp_millis();
    } else {
        let level = if quiet {
            LevelFilter::Warn
        } else {
            LevelFilter::Info
        };
        builder.filter_level(level).format(|buf, record| {
            if record.level() <= log::Level::Warn {
                writeln!(buf, "{}: {}", record.level(), record.args())
            } else {
                writeln!(buf, "{}", record.args())
            }
        });
    }

    // RUST_LOG still wins when set.
    if let Ok(filters) = std::env::var("RUST_LOG") {
        builder.parse_filters(&filters);
    }
    builder.init();
}

/// Print an empty line through the logger so quiet mode suppresses it too.
pub(crate) fn log_blank() {
    log::info!("");
}

fn main() {
    let cli = Cli::parse();
    init_logger(cli.verbose, cli.quiet);

    let mut settings = Settings::load();
    if let Some(db) = cli.db {
        settings.db_path = db;
    }

    let result = match cli.command {
        Commands::Provider { action } => match action {
            ProviderAction::Add {
                id,
                url,
                kind,
                name,
                username,
                password,
            } => commands::provider::run_provider_add(
                &settings, id, url, kind, name, username, password,
            ),
            ProviderAction::List => commands::provider::run_provider_list(&settings),
            ProviderAction::Remove { id } => commands::provider::run_provider_remove(&settings, &id),
        },
        Commands::Sync { provider, all } => {
            commands::sync::run_sync(&settings, provider, all, cli.quiet)
        }
        Commands::Playlist { provider, file } => {
            commands::playlist::run_playlist(&settings, &provider, file)
        }
        Commands::Episodes { provider, series } => {
            commands::episodes::run_episodes(&settings, &provider, &series)
        }
        Commands::Stats => commands::catalog::run_stats(&settings),
        Commands::List {
            kind,
            category,
            limit,
        } => commands::catalog::run_list(&settings, kind, category.as_deref(), limit),
        Commands::Search { query, kind } => commands::catalog::run_search(&settings, &query, kind),
        Commands::History { provider, limit } => {
            commands::catalog::run_history(&settings, provider.as_deref(), limit)
        }
        Commands::Config { action } => match action {
            ConfigAction::Show => commands::config::run_config_show(&settings),
            ConfigAction::Path => commands::config::run_config_path(),
        },
    };

    if let Err(e) = result {
        log::error!("{}", e);
        std::process::exit(1);
    }
}
