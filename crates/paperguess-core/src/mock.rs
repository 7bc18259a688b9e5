//! Scripted round source for testing the loader and session without a server.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::FetchError;
use crate::model::{ActualValues, CacheStats, Round};
use crate::scoring::score_round;
use crate::traits::{GuessSubmission, ImageStatus, RemoteScore, RoundSource};

/// One scripted response to `fetch_round`.
#[derive(Debug, Clone)]
pub enum MockStep {
    Round(Round),
    /// Serve the round without title or actual values; they are only
    /// revealed by `submit_guess`.
    Hidden(Round),
    Fail(FetchError),
    /// Never completes; only a timeout ends the request.
    Hang,
}

/// A round source that replays a script of responses.
///
/// Once the script runs out, `fetch_round` serves the fallback round if one
/// is set and fails otherwise.
pub struct MockRoundSource {
    steps: Mutex<VecDeque<MockStep>>,
    fallback: Option<Round>,
    image: ImageStatus,
    stats: Option<CacheStats>,
    submit_failure: Option<FetchError>,
    submit_delay: Duration,
    reveal: bool,
    last_round: Mutex<Option<Round>>,
    last_submission: Mutex<Option<GuessSubmission>>,
    fetch_calls: AtomicU32,
    submit_calls: AtomicU32,
    stats_calls: AtomicU32,
}

impl MockRoundSource {
    /// Create a mock that replays `steps` in order.
    pub fn new(steps: Vec<MockStep>) -> Self {
        Self {
            steps: Mutex::new(steps.into()),
            fallback: None,
            image: ImageStatus::Loaded { bytes: 1024 },
            stats: Some(CacheStats::default()),
            submit_failure: None,
            submit_delay: Duration::ZERO,
            reveal: true,
            last_round: Mutex::new(None),
            last_submission: Mutex::new(None),
            fetch_calls: AtomicU32::new(0),
            submit_calls: AtomicU32::new(0),
            stats_calls: AtomicU32::new(0),
        }
    }

    /// Create a mock that always serves the same round.
    pub fn with_fixed_round(round: Round) -> Self {
        let mut mock = Self::new(Vec::new());
        mock.fallback = Some(round);
        mock
    }

    pub fn with_image(mut self, image: ImageStatus) -> Self {
        self.image = image;
        self
    }

    /// Serve these stats; `None` makes `cache_stats` fail.
    pub fn with_cache_stats(mut self, stats: Option<CacheStats>) -> Self {
        self.stats = stats;
        self
    }

    pub fn with_submit_failure(mut self, error: FetchError) -> Self {
        self.submit_failure = Some(error);
        self
    }

    pub fn with_submit_delay(mut self, delay: Duration) -> Self {
        self.submit_delay = delay;
        self
    }

    /// Leave actual values and title out of score responses.
    pub fn without_reveal(mut self) -> Self {
        self.reveal = false;
        self
    }

    pub fn fetch_calls(&self) -> u32 {
        self.fetch_calls.load(Ordering::Relaxed)
    }

    pub fn submit_calls(&self) -> u32 {
        self.submit_calls.load(Ordering::Relaxed)
    }

    pub fn stats_calls(&self) -> u32 {
        self.stats_calls.load(Ordering::Relaxed)
    }

    pub fn last_submission(&self) -> Option<GuessSubmission> {
        self.last_submission.lock().unwrap().clone()
    }
}

/// A round with the given actual values and placeholder metadata.
pub fn sample_round(year: i32, citations: u32) -> Round {
    Round {
        id: Some("123".into()),
        title: format!("A Paper From {year}"),
        actual: Some(ActualValues { year, citations }),
        image: "data:image/png;base64,iVBORw0KGgo=".into(),
    }
}

#[async_trait]
impl RoundSource for MockRoundSource {
    fn name(&self) -> &str {
        "mock"
    }

    async fn fetch_round(&self) -> anyhow::Result<Round> {
        self.fetch_calls.fetch_add(1, Ordering::Relaxed);
        let step = self.steps.lock().unwrap().pop_front();
        let step = match (step, &self.fallback) {
            (Some(step), _) => step,
            (None, Some(round)) => MockStep::Round(round.clone()),
            (None, None) => MockStep::Fail(FetchError::Rejected("script exhausted".into())),
        };

        match step {
            MockStep::Round(round) => {
                *self.last_round.lock().unwrap() = Some(round.clone());
                Ok(round)
            }
            MockStep::Hidden(round) => {
                *self.last_round.lock().unwrap() = Some(round.clone());
                Ok(Round {
                    title: String::new(),
                    actual: None,
                    ..round
                })
            }
            MockStep::Fail(e) => Err(e.into()),
            MockStep::Hang => std::future::pending().await,
        }
    }

    async fn submit_guess(&self, submission: &GuessSubmission) -> anyhow::Result<RemoteScore> {
        self.submit_calls.fetch_add(1, Ordering::Relaxed);
        *self.last_submission.lock().unwrap() = Some(submission.clone());
        if !self.submit_delay.is_zero() {
            tokio::time::sleep(self.submit_delay).await;
        }
        if let Some(e) = &self.submit_failure {
            return Err(e.clone().into());
        }

        let round = self
            .last_round
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| FetchError::Rejected("no round served".into()))?;
        let actual = submission
            .actual
            .or(round.actual)
            .ok_or_else(|| FetchError::Rejected("unknown round".into()))?;
        Ok(RemoteScore {
            score: score_round(&submission.guess, &actual),
            actual: self.reveal.then_some(actual),
            title: self.reveal.then_some(round.title),
        })
    }

    async fn cache_stats(&self) -> anyhow::Result<CacheStats> {
        self.stats_calls.fetch_add(1, Ordering::Relaxed);
        self.stats
            .ok_or_else(|| FetchError::Transport("stats unavailable".into()).into())
    }

    async fn load_image(&self, _locator: &str) -> ImageStatus {
        self.image.clone()
    }
}
