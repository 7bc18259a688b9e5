//! Round loader: fetches the next round with a bounded retry policy.
//!
//! States run `Idle -> Loading -> (Ready | Failed)`. `Loading` is re-entered
//! once per attempt, each attempt being a fresh request bounded by the
//! configured timeout. At most one load is in flight at a time: calling
//! `load` while another load is running returns `AlreadyLoading` without
//! touching the source.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tracing::instrument;

use crate::error::FetchError;
use crate::model::Round;
use crate::traits::{ImageStatus, RoundSource};

/// Retry and timeout policy for the loader.
#[derive(Debug, Clone)]
pub struct LoaderConfig {
    /// Total attempts before giving up, including the first.
    pub max_attempts: u32,
    /// Timeout for each request.
    pub timeout: Duration,
    /// Pause between a failed attempt and the next one.
    pub retry_delay: Duration,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            timeout: Duration::from_secs(30),
            retry_delay: Duration::from_secs(1),
        }
    }
}

/// Observable loader state.
#[derive(Debug, Clone, PartialEq)]
pub enum LoaderState {
    Idle,
    Loading { attempt: u32 },
    Ready(Round),
    Failed { attempts: u32, error: String },
}

/// What a call to [`RoundLoader::load`] did.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome {
    Ready(Round),
    Failed { attempts: u32, error: String },
    /// Another load was already running; nothing was done.
    AlreadyLoading,
}

/// Receives loader transitions, e.g. to swap the round view for a spinner.
pub trait LoadObserver: Send + Sync {
    fn on_loading(&self, attempt: u32);
    fn on_retry(&self, attempt: u32, error: &str, delay: Duration);
    fn on_ready(&self, round: &Round, image: &ImageStatus);
    fn on_failed(&self, attempts: u32, error: &str);
}

/// No-op observer.
pub struct NoopObserver;

impl LoadObserver for NoopObserver {
    fn on_loading(&self, _: u32) {}
    fn on_retry(&self, _: u32, _: &str, _: Duration) {}
    fn on_ready(&self, _: &Round, _: &ImageStatus) {}
    fn on_failed(&self, _: u32, _: &str) {}
}

/// Fetches rounds from a [`RoundSource`] and tracks the current one.
pub struct RoundLoader {
    source: Arc<dyn RoundSource>,
    config: LoaderConfig,
    state: Mutex<LoaderState>,
}

/// Puts the loader back to `Idle` if a load is dropped before it finishes.
struct InFlight<'a> {
    state: &'a Mutex<LoaderState>,
    finished: bool,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if !self.finished {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            if matches!(*state, LoaderState::Loading { .. }) {
                tracing::debug!("round load cancelled");
                *state = LoaderState::Idle;
            }
        }
    }
}

impl RoundLoader {
    pub fn new(source: Arc<dyn RoundSource>, config: LoaderConfig) -> Self {
        Self {
            source,
            config,
            state: Mutex::new(LoaderState::Idle),
        }
    }

    pub fn state(&self) -> LoaderState {
        self.lock().clone()
    }

    pub fn is_loading(&self) -> bool {
        matches!(*self.lock(), LoaderState::Loading { .. })
    }

    /// The round currently on display, if the loader is `Ready`.
    pub fn current_round(&self) -> Option<Round> {
        match &*self.lock() {
            LoaderState::Ready(round) => Some(round.clone()),
            _ => None,
        }
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// Load a new round, replacing the current one.
    #[instrument(skip_all, fields(source = self.source.name()))]
    pub async fn load(&self, observer: &dyn LoadObserver) -> LoadOutcome {
        {
            let mut state = self.lock();
            if matches!(*state, LoaderState::Loading { .. }) {
                tracing::debug!("load requested while already loading, ignoring");
                return LoadOutcome::AlreadyLoading;
            }
            *state = LoaderState::Loading { attempt: 1 };
        }
        let mut in_flight = InFlight {
            state: &self.state,
            finished: false,
        };

        let max_attempts = self.config.max_attempts.max(1);
        let mut last_error = String::new();

        for attempt in 1..=max_attempts {
            *self.lock() = LoaderState::Loading { attempt };
            observer.on_loading(attempt);

            match self.fetch_once().await {
                Ok(round) => {
                    let image = self.load_image(&round).await;
                    tracing::info!(
                        attempt,
                        hidden = round.actual.is_none(),
                        image_loaded = image.is_loaded(),
                        "round ready"
                    );
                    *self.lock() = LoaderState::Ready(round.clone());
                    in_flight.finished = true;
                    observer.on_ready(&round, &image);
                    return LoadOutcome::Ready(round);
                }
                Err(e) => {
                    last_error = format!("{e:#}");
                    tracing::warn!(attempt, max_attempts, error = %last_error, "round fetch failed");
                    if attempt < max_attempts {
                        observer.on_retry(attempt, &last_error, self.config.retry_delay);
                        tokio::time::sleep(self.config.retry_delay).await;
                    }
                }
            }
        }

        *self.lock() = LoaderState::Failed {
            attempts: max_attempts,
            error: last_error.clone(),
        };
        in_flight.finished = true;
        tracing::error!(attempts = max_attempts, error = %last_error, "giving up on round load");
        observer.on_failed(max_attempts, &last_error);
        LoadOutcome::Failed {
            attempts: max_attempts,
            error: last_error,
        }
    }

    async fn fetch_once(&self) -> anyhow::Result<Round> {
        match tokio::time::timeout(self.config.timeout, self.source.fetch_round()).await {
            Ok(result) => result,
            Err(_) => Err(FetchError::Timeout(self.config.timeout.as_millis() as u64).into()),
        }
    }

    /// Completes whether or not the image loads, so the round never hangs
    /// on a broken image.
    async fn load_image(&self, round: &Round) -> ImageStatus {
        match tokio::time::timeout(self.config.timeout, self.source.load_image(&round.image)).await
        {
            Ok(status) => {
                if let ImageStatus::Broken { reason } = &status {
                    tracing::warn!(%reason, "round image failed to load");
                }
                status
            }
            Err(_) => ImageStatus::Broken {
                reason: format!(
                    "image load timed out after {}ms",
                    self.config.timeout.as_millis()
                ),
            },
        }
    }

    fn lock(&self) -> MutexGuard<'_, LoaderState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
