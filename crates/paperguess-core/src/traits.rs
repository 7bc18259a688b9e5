//! Trait definitions for the remote round source.
//!
//! `paperguess-client` implements this over HTTP; tests use scripted
//! implementations.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::model::{ActualValues, CacheStats, Guess, Round, ScoreResult};

/// Backend that hands out rounds and, optionally, scores guesses.
#[async_trait]
pub trait RoundSource: Send + Sync {
    /// Human-readable source name (e.g. "http").
    fn name(&self) -> &str;

    /// Fetch a fresh round. Errors should downcast to `FetchError` where
    /// possible so the loader can log why an attempt failed.
    async fn fetch_round(&self) -> anyhow::Result<Round>;

    /// Ask the server to score a guess.
    async fn submit_guess(&self, submission: &GuessSubmission) -> anyhow::Result<RemoteScore>;

    /// Fetch the server's cache statistics.
    async fn cache_stats(&self) -> anyhow::Result<CacheStats>;

    /// Load the round's title-page image.
    ///
    /// Infallible by signature: a broken image still completes the load.
    async fn load_image(&self, locator: &str) -> ImageStatus;
}

/// Body of a score submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuessSubmission {
    pub guess: Guess,
    /// Round identifier issued at load time.
    #[serde(default)]
    pub round_id: Option<String>,
    /// Actual values, for servers that score statelessly.
    ///
    /// The server cannot verify these, so a client sending them can forge
    /// any result. Leave unset when the server keys rounds by `round_id`.
    #[serde(default)]
    pub actual: Option<ActualValues>,
}

/// Server-computed score, plus any round details the server revealed.
///
/// `actual` is required when the round was served without its actual
/// values; feedback is computed from it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteScore {
    pub score: ScoreResult,
    #[serde(default)]
    pub actual: Option<ActualValues>,
    #[serde(default)]
    pub title: Option<String>,
}

/// Outcome of loading a round's image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "status")]
pub enum ImageStatus {
    Loaded { bytes: usize },
    Broken { reason: String },
    /// The source does not load images.
    Skipped,
}

impl ImageStatus {
    pub fn is_loaded(&self) -> bool {
        matches!(self, ImageStatus::Loaded { .. })
    }
}
