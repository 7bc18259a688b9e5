//! paperguess-client — HTTP round source, configuration, and preferences.
//!
//! Implements `RoundSource` against the paperguess server API and loads
//! the settings the CLI needs to build a `GameSession`.

pub mod config;
pub mod error;
pub mod http;
pub mod prefs;

pub use config::{create_source, load_config, load_config_from, PaperguessConfig};
pub use error::PrefsError;
pub use http::HttpRoundSource;
pub use prefs::ThemeStore;
