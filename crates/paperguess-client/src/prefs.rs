//! Persisted player preferences.
//!
//! Preferences live in a small TOML file edited in place with `toml_edit`,
//! so comments and unknown keys written by hand survive a theme toggle.

use std::path::{Path, PathBuf};

use toml_edit::{value, DocumentMut};

use paperguess_core::model::Theme;

use crate::config::config_dir;
use crate::error::PrefsError;

const THEME_KEY: &str = "theme";

/// Theme preference file.
#[derive(Debug, Clone)]
pub struct ThemeStore {
    path: PathBuf,
    fallback: Theme,
}

impl ThemeStore {
    /// Store at `path`. `fallback` applies while nothing valid is saved.
    pub fn new(path: impl Into<PathBuf>, fallback: Theme) -> Self {
        Self {
            path: path.into(),
            fallback,
        }
    }

    /// `~/.config/paperguess/prefs.toml`, if `HOME` is set.
    pub fn default_path() -> Option<PathBuf> {
        config_dir().map(|dir| dir.join("prefs.toml"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<DocumentMut, PrefsError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(DocumentMut::new()),
            Err(source) => {
                return Err(PrefsError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };
        content.parse::<DocumentMut>().map_err(|source| PrefsError::Parse {
            path: self.path.clone(),
            source,
        })
    }

    /// The saved theme, or the fallback if none is saved.
    ///
    /// An unrecognised saved value is logged and ignored.
    pub fn get(&self) -> Result<Theme, PrefsError> {
        let doc = self.read()?;
        let Some(raw) = doc.get(THEME_KEY).and_then(|item| item.as_str()) else {
            return Ok(self.fallback);
        };
        match raw.parse::<Theme>() {
            Ok(theme) => Ok(theme),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), "ignoring saved theme: {e}");
                Ok(self.fallback)
            }
        }
    }

    pub fn set(&self, theme: Theme) -> Result<(), PrefsError> {
        let mut doc = self.read()?;
        doc[THEME_KEY] = value(theme.to_string());

        let io_err = |source| PrefsError::Io {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        std::fs::write(&self.path, doc.to_string()).map_err(io_err)?;
        tracing::debug!(path = %self.path.display(), %theme, "saved theme");
        Ok(())
    }

    /// Flip the saved theme and return the new one.
    pub fn toggle(&self) -> Result<Theme, PrefsError> {
        let next = self.get()?.toggled();
        self.set(next)?;
        Ok(next)
    }
}
