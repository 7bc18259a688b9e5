//! Error types for round loading, guess validation, and submission.
//!
//! `FetchError` is defined here rather than in the client crate so the
//! loader can report why an attempt failed without string matching.

use thiserror::Error;

/// Why a single attempt to fetch round data failed.
///
/// Every variant is retried the same way by the loader.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// The request did not complete within the loader's timeout.
    #[error("request timed out after {0}ms")]
    Timeout(u64),

    /// The server could not be reached or the connection dropped.
    #[error("network error: {0}")]
    Transport(String),

    /// The server answered with `success: false` or an error status.
    #[error("server rejected request: {0}")]
    Rejected(String),

    /// The payload was missing required fields or did not parse.
    #[error("malformed payload: {0}")]
    Malformed(String),
}

/// A guess that fails validation before any network call is made.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GuessError {
    #[error("year {year} is outside the accepted range {min}-{max}")]
    YearOutOfRange { year: i32, min: i32, max: i32 },

    #[error("citation count cannot be negative (got {0})")]
    NegativeCitations(i64),

    #[error("citation count {0} is too large")]
    CitationsTooLarge(i64),

    #[error("slider position {position} is outside 0-{max}")]
    SliderOutOfRange { position: i64, max: u32 },
}

/// Errors returned by `GameSession::submit`.
#[derive(Debug, Error)]
pub enum SubmitError {
    /// There is no round in the `Ready` state to guess against.
    #[error("no round is loaded")]
    NoRound,

    /// The current round has already been scored.
    #[error("round {0} has already been scored")]
    AlreadyScored(u32),

    /// A score computation for this round is still pending.
    #[error("a guess for this round is already being scored")]
    ScoringInProgress,

    #[error(transparent)]
    Invalid(#[from] GuessError),

    /// A new round was loaded before the score for this one arrived.
    #[error("the round was replaced before its score arrived")]
    Superseded,

    /// The round was served without actual values, so only the server can
    /// score it.
    #[error("this round can only be scored remotely")]
    HiddenActuals,

    /// Remote scoring failed; the round remains open for another try.
    #[error("score submission failed: {0:#}")]
    Remote(anyhow::Error),
}

impl SubmitError {
    /// Returns `true` if the round can still be guessed after this error.
    pub fn round_still_open(&self) -> bool {
        matches!(self, SubmitError::Invalid(_) | SubmitError::Remote(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_and_remote_errors_keep_round_open() {
        assert!(SubmitError::Invalid(GuessError::NegativeCitations(-3)).round_still_open());
        assert!(SubmitError::Remote(anyhow::anyhow!("boom")).round_still_open());
        assert!(!SubmitError::AlreadyScored(1).round_still_open());
        assert!(!SubmitError::NoRound.round_still_open());
        assert!(!SubmitError::HiddenActuals.round_still_open());
    }

    #[test]
    fn messages_name_the_offending_value() {
        let err = GuessError::YearOutOfRange {
            year: 1999,
            min: 2000,
            max: 2025,
        };
        assert_eq!(
            err.to_string(),
            "year 1999 is outside the accepted range 2000-2025"
        );
        assert_eq!(
            FetchError::Timeout(30_000).to_string(),
            "request timed out after 30000ms"
        );
    }
}
