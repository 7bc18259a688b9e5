//! CLI subcommands.

pub mod init;
pub mod play;
pub mod score;
pub mod slider;
pub mod stats;
pub mod theme;

use std::path::PathBuf;

use anyhow::Result;
use comfy_table::{presets, Table};

use paperguess_client::{PaperguessConfig, ThemeStore};
use paperguess_core::model::Theme;

/// Table styled for the active theme.
pub(crate) fn themed_table(theme: Theme) -> Table {
    let mut table = Table::new();
    match theme {
        Theme::Light => table.load_preset(presets::UTF8_FULL),
        Theme::Dark => table.load_preset(presets::UTF8_HORIZONTAL_ONLY),
    };
    table
}

/// Preference store at `path`, or at the default location.
pub(crate) fn theme_store(path: Option<PathBuf>, config: &PaperguessConfig) -> Result<ThemeStore> {
    let path = match path.or_else(ThemeStore::default_path) {
        Some(p) => p,
        None => anyhow::bail!("cannot locate preferences: HOME is not set, pass --prefs"),
    };
    Ok(ThemeStore::new(path, config.default_theme))
}
