use owo_colors::OwoColorize;
use owo_colors::Stream::Stdout;
use vodsync_provider::{Settings, settings_path};

use crate::CliError;

/// Show effective settings and their sources.
pub(crate) fn run_config_show(settings: &Settings) -> Result<(), CliError> {
    let path = settings_path();

    log::info!(
        "{}",
        "vodsync Configuration".if_supports_color(Stdout, |t| t.bold()),
    );
    crate::log_blank();

    let status = if path.exists() {
        "(exists)".if_supports_color(Stdout, |t| t.green()).to_string()
    } else {
        "(not found)"
            .if_supports_color(Stdout, |t| t.dimmed())
            .to_string()
    };
    log::info!(
        "  Settings file: {} {}",
        path.display().if_supports_color(Stdout, |t| t.cyan()),
        status,
    );
    crate::log_blank();

    let rows = [
        (
            "database",
            settings.db_path.display().to_string(),
            settings.db_path_source.to_string(),
        ),
        (
            "timeout",
            format!("{}s", settings.http.timeout_secs),
            settings.timeout_source.to_string(),
        ),
        (
            "user_agent",
            settings.http.user_agent.clone(),
            String::new(),
        ),
    ];
    for (name, value, source) in rows {
        let source = if source.is_empty() {
            String::new()
        } else {
            format!("({})", source)
        };
        log::info!(
            "  {:<12} {} {}",
            name,
            value,
            source.if_supports_color(Stdout, |t| t.dimmed()),
        );
    }

    if settings.http.timeout_secs == 0 {
        return Err(CliError::config("http.timeout_secs must be greater than zero"));
    }
    Ok(())
}

/// Print the settings file path.
pub(crate) fn run_config_path() -> Result<(), CliError> {
    println!("{}", settings_path().display());
    Ok(())
}
