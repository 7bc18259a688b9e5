//! Client error types.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use paperguess_core::error::FetchError;

/// Errors reading or writing the preferences file.
#[derive(Debug, Error)]
pub enum PrefsError {
    #[error("failed to access preferences at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse preferences at {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml_edit::TomlError,
    },
}

/// Map a reqwest failure onto the loader's error taxonomy.
pub(crate) fn classify(err: reqwest::Error, timeout: Duration) -> FetchError {
    if err.is_timeout() {
        FetchError::Timeout(timeout.as_millis() as u64)
    } else if err.is_decode() {
        FetchError::Malformed(err.to_string())
    } else if err.is_connect() {
        FetchError::Transport(format!("server not reachable: {err}"))
    } else {
        FetchError::Transport(err.to_string())
    }
}
