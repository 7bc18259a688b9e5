//! Game session: the single controller that owns the round loader, the
//! per-round phase, and the running tally.
//!
//! A round moves `AwaitingGuess -> Scoring -> Scored`, and a new round
//! starts back at `AwaitingGuess`. Each round is scored at most once.
//! A second submission while the first is still being scored is rejected.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::SubmitError;
use crate::feedback::{citation_feedback, year_feedback, CitationBand, Feedback, YearBand};
use crate::loader::{LoadObserver, LoadOutcome, LoaderConfig, RoundLoader};
use crate::model::{
    ActualValues, Guess, GuessInput, GuessRules, Round, ScoreMode, ScoreResult, SessionTally,
};
use crate::scoring::score_round;
use crate::traits::{GuessSubmission, RoundSource};

/// Session-wide settings.
#[derive(Debug, Clone, Default)]
pub struct SessionConfig {
    pub loader: LoaderConfig,
    pub rules: GuessRules,
    pub score_mode: ScoreMode,
    /// Include actual values in remote submissions, when the round has them.
    pub send_actuals: bool,
}

/// Where the current round is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundPhase {
    /// No round is loaded yet, or a new one is loading.
    Idle,
    AwaitingGuess,
    Scoring,
    Scored,
}

/// Everything the player sees after submitting a guess.
#[derive(Debug, Clone, Serialize)]
pub struct RoundOutcome {
    pub round_number: u32,
    pub round: Round,
    pub guess: Guess,
    pub score: ScoreResult,
    pub year_feedback: Feedback<YearBand>,
    pub citation_feedback: Feedback<CitationBand>,
    /// Tally after this round was counted.
    pub tally: SessionTally,
}

/// One scored round, as kept in the session history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoundRecord {
    pub round_number: u32,
    pub paper_id: Option<String>,
    pub title: String,
    pub year_guess: i32,
    pub year_actual: i32,
    pub citation_guess: u32,
    pub citation_actual: u32,
    pub score: ScoreResult,
    pub played_at: DateTime<Utc>,
}

/// Snapshot of the session for display or export.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionHistory {
    pub session_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub tally: SessionTally,
    pub rounds: Vec<RoundRecord>,
}

struct SessionState {
    tally: SessionTally,
    phase: RoundPhase,
    /// Bumped whenever the current round is discarded.
    round_seq: u64,
    started_at: DateTime<Utc>,
    records: Vec<RoundRecord>,
}

/// The game controller. All mutation goes through its methods, one at a time.
pub struct GameSession {
    id: Uuid,
    source: Arc<dyn RoundSource>,
    loader: RoundLoader,
    config: SessionConfig,
    state: Mutex<SessionState>,
}

/// Reopens the round if a submission ends without a score.
struct PendingScore<'a> {
    session: &'a GameSession,
    seq: u64,
    settled: bool,
}

impl Drop for PendingScore<'_> {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        let mut state = self.session.lock();
        if state.round_seq == self.seq && state.phase == RoundPhase::Scoring {
            state.phase = RoundPhase::AwaitingGuess;
        }
    }
}

impl GameSession {
    pub fn new(source: Arc<dyn RoundSource>, config: SessionConfig) -> Self {
        let loader = RoundLoader::new(Arc::clone(&source), config.loader.clone());
        Self {
            id: Uuid::new_v4(),
            source,
            loader,
            config,
            state: Mutex::new(SessionState {
                tally: SessionTally::default(),
                phase: RoundPhase::Idle,
                round_seq: 0,
                started_at: Utc::now(),
                records: Vec::new(),
            }),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn loader(&self) -> &RoundLoader {
        &self.loader
    }

    pub fn tally(&self) -> SessionTally {
        self.lock().tally
    }

    pub fn phase(&self) -> RoundPhase {
        self.lock().phase
    }

    pub fn current_round(&self) -> Option<Round> {
        self.loader.current_round()
    }

    pub fn history(&self) -> SessionHistory {
        let state = self.lock();
        SessionHistory {
            session_id: self.id,
            started_at: state.started_at,
            tally: state.tally,
            rounds: state.records.clone(),
        }
    }

    /// Discard the current round and load the next one.
    #[tracing::instrument(skip_all, fields(session = %self.id))]
    pub async fn next_round(&self, observer: &dyn LoadObserver) -> LoadOutcome {
        {
            let mut state = self.lock();
            state.phase = RoundPhase::Idle;
            state.round_seq += 1;
        }

        let outcome = self.loader.load(observer).await;
        if let LoadOutcome::Ready(_) = &outcome {
            let mut state = self.lock();
            state.phase = RoundPhase::AwaitingGuess;
            state.tally.round_number = state.tally.rounds_played + 1;
        }
        outcome
    }

    /// Zero the tally and immediately start loading a fresh round.
    pub async fn reset(&self, observer: &dyn LoadObserver) -> LoadOutcome {
        {
            let mut state = self.lock();
            state.tally = SessionTally::default();
            state.records.clear();
            state.started_at = Utc::now();
        }
        tracing::info!(session = %self.id, "session reset");
        self.next_round(observer).await
    }

    /// Score a guess against the current round.
    ///
    /// Validation happens before anything else, and a guess that fails
    /// validation leaves the round open. A round served without actual
    /// values needs remote scoring, and the server's response supplies them.
    #[tracing::instrument(skip_all, fields(session = %self.id))]
    pub async fn submit(&self, input: GuessInput) -> Result<RoundOutcome, SubmitError> {
        let guess = self.config.rules.resolve(input)?;
        let round = self.loader.current_round().ok_or(SubmitError::NoRound)?;
        if round.actual.is_none() && self.config.score_mode == ScoreMode::Local {
            return Err(SubmitError::HiddenActuals);
        }

        let seq = {
            let mut state = self.lock();
            match state.phase {
                RoundPhase::Idle => return Err(SubmitError::NoRound),
                RoundPhase::Scoring => return Err(SubmitError::ScoringInProgress),
                RoundPhase::Scored => {
                    return Err(SubmitError::AlreadyScored(state.tally.round_number))
                }
                RoundPhase::AwaitingGuess => {}
            }
            state.phase = RoundPhase::Scoring;
            state.round_seq
        };
        let mut pending = PendingScore {
            session: self,
            seq,
            settled: false,
        };

        let (round, actual, score) = match (self.config.score_mode, round.actual) {
            (ScoreMode::Local, Some(actual)) => {
                let score = score_round(&guess, &actual);
                (round, actual, score)
            }
            (ScoreMode::Local, None) => return Err(SubmitError::HiddenActuals),
            (ScoreMode::Remote, _) => {
                let submission = GuessSubmission {
                    guess,
                    round_id: round.id.clone(),
                    actual: round.actual.filter(|_| self.config.send_actuals),
                };
                let remote = match self.source.submit_guess(&submission).await {
                    Ok(remote) => remote,
                    Err(e) => {
                        tracing::warn!(error = %format!("{e:#}"), "remote scoring failed");
                        return Err(SubmitError::Remote(e));
                    }
                };
                let Some(actual) = remote.actual.or(round.actual) else {
                    tracing::warn!("score response did not include the actual values");
                    return Err(SubmitError::Remote(anyhow::anyhow!(
                        "server did not reveal the actual values"
                    )));
                };
                (round.revealed(actual, remote.title), actual, remote.score)
            }
        };

        let year_fb = year_feedback(guess.year, actual.year);
        let citation_fb = citation_feedback(guess.citations, actual.citations);

        let mut state = self.lock();
        pending.settled = true;
        if state.round_seq != seq {
            return Err(SubmitError::Superseded);
        }

        state.phase = RoundPhase::Scored;
        state.tally.rounds_played += 1;
        state.tally.cumulative_score += u64::from(score.total_score);
        let round_number = state.tally.round_number;
        state.records.push(RoundRecord {
            round_number,
            paper_id: round.id.clone(),
            title: round.title.clone(),
            year_guess: guess.year,
            year_actual: actual.year,
            citation_guess: guess.citations,
            citation_actual: actual.citations,
            score,
            played_at: Utc::now(),
        });
        tracing::info!(
            round = round_number,
            total = score.total_score,
            cumulative = state.tally.cumulative_score,
            "round scored"
        );

        Ok(RoundOutcome {
            round_number,
            round,
            guess,
            score,
            year_feedback: year_fb,
            citation_feedback: citation_fb,
            tally: state.tally,
        })
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
