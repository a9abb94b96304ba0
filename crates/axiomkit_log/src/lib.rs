//! `axiomkit_log` v1:
//! Logger bootstrap and console styling shared by axiomkit crates.
//!
//! - `init_logger` / `try_init_logger` : install an `env_logger` backend
//! - `paint_*`                         : cosmetic coloring for report lines

use std::io::Write;

use colored::Colorize;
use log::LevelFilter;

/// Environment variable consulted for level overrides.
pub const C_ENV_LOG_FILTER: &str = "RUST_LOG";

////////////////////////////////////////////////////////////////////////////////
// #region LoggerInit

/// Derive the default level filter for a run.
pub fn derive_level_filter(if_verbose: bool) -> LevelFilter {
    if if_verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    }
}

fn build_logger(if_verbose: bool) -> env_logger::Builder {
    let mut builder = env_logger::Builder::new();
    builder
        .filter_level(derive_level_filter(if_verbose))
        .format(|buf, record| match record.level() {
            log::Level::Info => writeln!(buf, "{}", record.args()),
            level => writeln!(buf, "[{level}] {}", record.args()),
        });
    if let Ok(c_filter) = std::env::var(C_ENV_LOG_FILTER) {
        builder.parse_filters(&c_filter);
    }
    builder
}

/// Install the global logger.
///
/// Returns an error when another logger has already been installed.
pub fn try_init_logger(if_verbose: bool) -> Result<(), log::SetLoggerError> {
    build_logger(if_verbose).try_init()
}

/// Install the global logger, ignoring an already-installed one.
pub fn init_logger(if_verbose: bool) {
    let _ = try_init_logger(if_verbose);
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Styling

/// Force coloring on or off for every `paint_*` helper.
pub fn set_color_enabled(if_enabled: bool) {
    colored::control::set_override(if_enabled);
}

/// Drop a previous [`set_color_enabled`] override.
pub fn reset_color_enabled() {
    colored::control::unset_override();
}

/// Success text.
pub fn paint_success(txt: &str) -> String {
    txt.green().to_string()
}

/// Emphasised text (paths).
pub fn paint_strong(txt: &str) -> String {
    txt.bold().to_string()
}

/// Notice/warning text.
pub fn paint_notice(txt: &str) -> String {
    txt.yellow().to_string()
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
