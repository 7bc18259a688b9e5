//! The `paperguess theme` command.

use std::path::PathBuf;

use anyhow::Result;

use paperguess_client::config::load_config_from;
use paperguess_core::model::Theme;

use super::theme_store;

pub fn execute(action: String, prefs: Option<PathBuf>, config_path: Option<PathBuf>) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let store = theme_store(prefs, &config)?;

    match action.as_str() {
        "show" => println!("{}", store.get()?),
        "toggle" => {
            let theme = store.toggle()?;
            println!("Theme set to {theme}");
        }
        other => {
            let theme: Theme = other.parse().map_err(anyhow::Error::msg)?;
            store.set(theme)?;
            println!("Theme set to {theme}");
        }
    }
    Ok(())
}
