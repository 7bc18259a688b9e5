//! Client configuration and source factory.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use paperguess_core::loader::LoaderConfig;
use paperguess_core::model::{GuessRules, InputMode, ScoreMode, Theme};
use paperguess_core::scoring::SLIDER_MAX;
use paperguess_core::session::SessionConfig;
use paperguess_core::traits::RoundSource;

use crate::http::{HttpRoundSource, DEFAULT_BASE_URL, DEFAULT_TIMEOUT_SECS};

/// Top-level paperguess configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaperguessConfig {
    /// Base URL of the paper server. `${VAR}` references are expanded.
    #[serde(default = "default_server_url")]
    pub server_url: String,
    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub request_timeout_secs: u64,
    /// Attempts per round load, including the first.
    #[serde(default = "default_attempts")]
    pub max_attempts: u32,
    /// Delay between load attempts in milliseconds.
    #[serde(default = "default_retry_delay")]
    pub retry_delay_ms: u64,
    /// How often the cache badge is refreshed, in seconds.
    #[serde(default = "default_cache_poll")]
    pub cache_poll_secs: u64,
    #[serde(default)]
    pub score_mode: ScoreMode,
    #[serde(default)]
    pub citation_input: InputMode,
    /// Send the round's actual values with remote submissions.
    ///
    /// Needed by servers that keep no per-round state, but lets a client
    /// choose its own answers.
    #[serde(default = "default_true")]
    pub send_actuals: bool,
    /// Theme used when no preference has been saved.
    #[serde(default)]
    pub default_theme: Theme,
    #[serde(default = "default_year_min")]
    pub year_min: i32,
    #[serde(default = "default_year_max")]
    pub year_max: i32,
    /// Zero-pad numeric paper ids in archive links.
    #[serde(default = "default_true")]
    pub zero_pad_links: bool,
}

fn default_server_url() -> String {
    DEFAULT_BASE_URL.to_string()
}
fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECS
}
fn default_attempts() -> u32 {
    3
}
fn default_retry_delay() -> u64 {
    1000
}
fn default_cache_poll() -> u64 {
    30
}
fn default_true() -> bool {
    true
}
fn default_year_min() -> i32 {
    2000
}
fn default_year_max() -> i32 {
    2025
}

impl Default for PaperguessConfig {
    fn default() -> Self {
        Self {
            server_url: default_server_url(),
            request_timeout_secs: default_timeout(),
            max_attempts: default_attempts(),
            retry_delay_ms: default_retry_delay(),
            cache_poll_secs: default_cache_poll(),
            score_mode: ScoreMode::default(),
            citation_input: InputMode::default(),
            send_actuals: true,
            default_theme: Theme::default(),
            year_min: default_year_min(),
            year_max: default_year_max(),
            zero_pad_links: true,
        }
    }
}

impl PaperguessConfig {
    /// Reject settings the loader or the guess rules cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.max_attempts == 0 {
            anyhow::bail!("max_attempts must be at least 1");
        }
        if self.request_timeout_secs == 0 {
            anyhow::bail!("request_timeout_secs must be at least 1");
        }
        if self.year_min > self.year_max {
            anyhow::bail!(
                "year_min ({}) is greater than year_max ({})",
                self.year_min,
                self.year_max
            );
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn loader_config(&self) -> LoaderConfig {
        LoaderConfig {
            max_attempts: self.max_attempts,
            timeout: self.request_timeout(),
            retry_delay: Duration::from_millis(self.retry_delay_ms),
        }
    }

    pub fn guess_rules(&self) -> GuessRules {
        GuessRules {
            year_min: self.year_min,
            year_max: self.year_max,
            slider_max: SLIDER_MAX,
        }
    }

    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            loader: self.loader_config(),
            rules: self.guess_rules(),
            score_mode: self.score_mode,
            send_actuals: self.send_actuals,
        }
    }
}

/// Expand `${VAR_NAME}` references from the environment. Unset variables
/// expand to the empty string.
fn resolve_env_vars(s: &str) -> String {
    let mut result = s.to_string();
    let mut pos = 0;
    while let Some(offset) = result[pos..].find("${") {
        let start = pos + offset;
        let Some(end) = result[start..].find('}') else {
            break;
        };
        let value = std::env::var(&result[start + 2..start + end]).unwrap_or_default();
        result.replace_range(start..start + end + 1, &value);
        // Substituted text is not expanded again.
        pos = start + value.len();
    }
    result
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `paperguess.toml` in the current directory
/// 2. `~/.config/paperguess/config.toml`
///
/// `PAPERGUESS_SERVER_URL` overrides `server_url` from either file.
pub fn load_config() -> Result<PaperguessConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<PaperguessConfig> {
    let config_path = match path {
        Some(p) if p.exists() => Some(p.to_path_buf()),
        Some(p) => anyhow::bail!("config file not found: {}", p.display()),
        None => {
            let local = PathBuf::from("paperguess.toml");
            if local.exists() {
                Some(local)
            } else {
                config_dir()
                    .map(|dir| dir.join("config.toml"))
                    .filter(|global| global.exists())
            }
        }
    };

    let mut config = match config_path {
        Some(path) => {
            tracing::debug!(path = %path.display(), "loading config");
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            toml::from_str::<PaperguessConfig>(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => PaperguessConfig::default(),
    };

    if let Ok(url) = std::env::var("PAPERGUESS_SERVER_URL") {
        if !url.is_empty() {
            config.server_url = url;
        }
    }
    config.server_url = resolve_env_vars(&config.server_url);

    config.validate()?;
    Ok(config)
}

/// `~/.config/paperguess`, if `HOME` is set.
pub fn config_dir() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("paperguess"))
}

/// Build the HTTP round source described by `config`.
pub fn create_source(config: &PaperguessConfig) -> Result<Arc<dyn RoundSource>> {
    let source = HttpRoundSource::new(&config.server_url, config.request_timeout())
        .context("failed to build HTTP client")?;
    Ok(Arc::new(source))
}

/// Commented sample written by `paperguess init`.
pub const SAMPLE_CONFIG: &str = r#"# paperguess configuration

# Paper server. ${VAR} references are expanded from the environment.
server_url = "http://localhost:5000"

# Round loading
request_timeout_secs = 30
max_attempts = 3
retry_delay_ms = 1000

# Cache badge refresh interval
cache_poll_secs = 30

# "local" scores in the client, "remote" asks the server
score_mode = "local"

# "exact" for typed counts, "slider" for slider positions
citation_input = "exact"

# Send actual values with remote submissions
send_actuals = true

default_theme = "light"
year_min = 2000
year_max = 2025
zero_pad_links = true
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_env_vars_basic() {
        std::env::set_var("_PAPERGUESS_TEST_HOST", "papers.local");
        assert_eq!(
            resolve_env_vars("http://${_PAPERGUESS_TEST_HOST}:5000"),
            "http://papers.local:5000"
        );
        assert_eq!(resolve_env_vars("${_PAPERGUESS_UNSET_VAR}"), "");
        assert_eq!(resolve_env_vars("no vars ${here"), "no vars ${here");
        std::env::remove_var("_PAPERGUESS_TEST_HOST");
    }

    #[test]
    fn resolve_env_vars_does_not_recurse() {
        std::env::set_var("_PAPERGUESS_TEST_SELF", "${_PAPERGUESS_TEST_SELF}");
        assert_eq!(
            resolve_env_vars("${_PAPERGUESS_TEST_SELF}/api"),
            "${_PAPERGUESS_TEST_SELF}/api"
        );
        std::env::set_var("_PAPERGUESS_TEST_PORT", "8080");
        assert_eq!(
            resolve_env_vars("http://${_PAPERGUESS_TEST_SELF}:${_PAPERGUESS_TEST_PORT}"),
            "http://${_PAPERGUESS_TEST_SELF}:8080"
        );
        std::env::remove_var("_PAPERGUESS_TEST_SELF");
        std::env::remove_var("_PAPERGUESS_TEST_PORT");
    }

    #[test]
    fn default_config() {
        let config = PaperguessConfig::default();
        assert_eq!(config.server_url, "http://localhost:5000");
        assert_eq!(config.max_attempts, 3);
        assert_eq!(config.score_mode, ScoreMode::Local);
        assert!(config.send_actuals);
        config.validate().unwrap();
    }

    #[test]
    fn sample_config_parses_to_defaults() {
        let config: PaperguessConfig = toml::from_str(SAMPLE_CONFIG).unwrap();
        assert_eq!(config, PaperguessConfig::default());
    }

    #[test]
    fn partial_config_keeps_defaults() {
        let config: PaperguessConfig = toml::from_str(
            r#"
score_mode = "remote"
citation_input = "slider"
default_theme = "dark"
max_attempts = 5
"#,
        )
        .unwrap();
        assert_eq!(config.score_mode, ScoreMode::Remote);
        assert_eq!(config.citation_input, InputMode::Slider);
        assert_eq!(config.default_theme, Theme::Dark);
        assert_eq!(config.request_timeout_secs, 30);

        let session = config.session_config();
        assert_eq!(session.loader.max_attempts, 5);
        assert_eq!(session.loader.retry_delay, Duration::from_secs(1));
        assert_eq!(session.rules.year_max, 2025);
    }

    #[test]
    fn invalid_settings_are_rejected() {
        let config = PaperguessConfig {
            max_attempts: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = PaperguessConfig {
            year_min: 2030,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn load_from_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("paperguess.toml");
        std::fs::write(&path, "year_min = 1995\nretry_delay_ms = 250\n").unwrap();

        let config = load_config_from(Some(&path)).unwrap();
        assert_eq!(config.year_min, 1995);
        assert_eq!(config.loader_config().retry_delay, Duration::from_millis(250));
    }

    #[test]
    fn missing_explicit_path_is_an_error() {
        let err = load_config_from(Some(Path::new("/nonexistent/paperguess.toml"))).unwrap_err();
        assert!(err.to_string().contains("config file not found"));
    }

    #[test]
    fn unknown_score_mode_fails_to_parse() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "score_mode = \"server\"\n").unwrap();
        let err = load_config_from(Some(&path)).unwrap_err();
        assert!(format!("{err:#}").contains("failed to parse config"));
    }
}
