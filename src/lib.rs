//! # Suite Runner Library
//!
//! This library provides the core functionality for Suite Runner, a
//! configuration-driven orchestrator for behavior-driven test modules.
//! It runs each configured module through an external BDD engine, turns
//! the engine's raw step records into normalized scenario results and
//! renders per-module and consolidated reports.
//!
//! ## Modules
//!
//! - `core` - Configuration, registry, aggregation, consolidation and execution
//! - `infra` - Infrastructure services like process capture and report file layout
//! - `reporting` - HTML, analysis JSON and console rendering
//! - `cli` / `commands` - Command-line interface and its subcommands

pub mod cli;
pub mod commands;
pub mod core;
pub mod infra;
pub mod reporting;

// Re-export commonly used items
pub use core::aggregator;
pub use core::config;
pub use core::consolidator;
pub use core::models;

/// The bundled translation closest to the system locale.
///
/// It attempts to match the full locale (e.g., "es-ES"), then just the
/// language code (e.g., "es"), and finally falls back to "en".
pub fn system_locale() -> &'static str {
    let locale = sys_locale::get_locale().unwrap_or_else(|| "en".to_string());
    resolve_locale(&locale)
}

/// Maps a requested locale onto one of the bundled translations.
pub fn resolve_locale(requested: &str) -> &'static str {
    let available = rust_i18n::available_locales!();
    let matches = |candidate: &str| available.iter().copied().find(|l| *l == candidate);

    matches(requested)
        .or_else(|| requested.split(['-', '_']).next().and_then(matches))
        .unwrap_or("en")
}

// Initialize i18n
rust_i18n::i18n!("locales", fallback = "en");
