//! Background poller for the server's cache badge.
//!
//! The badge is cosmetic, so poll failures are logged at debug level and
//! otherwise ignored; the last good value stays on display.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::model::CacheStats;
use crate::traits::RoundSource;

#[derive(Default)]
struct BadgeValue {
    cached_papers: AtomicU64,
    is_warming: AtomicBool,
    seen: AtomicBool,
}

/// Handle to a running cache poller. Dropping it stops the poller.
pub struct CacheBadge {
    value: Arc<BadgeValue>,
    handle: JoinHandle<()>,
}

impl CacheBadge {
    /// Start polling `source` every `interval`, beginning immediately.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(source: Arc<dyn RoundSource>, interval: Duration) -> Self {
        let value = Arc::new(BadgeValue::default());
        let shared = Arc::clone(&value);

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                match source.cache_stats().await {
                    Ok(stats) => {
                        shared
                            .cached_papers
                            .store(stats.cached_papers, Ordering::Relaxed);
                        shared.is_warming.store(stats.is_warming, Ordering::Relaxed);
                        shared.seen.store(true, Ordering::Relaxed);
                        tracing::debug!(cached = stats.cached_papers, "cache badge updated");
                    }
                    Err(e) => tracing::debug!(error = %format!("{e:#}"), "cache stats poll failed"),
                }
            }
        });

        Self { value, handle }
    }

    /// Latest stats, or `None` until the first successful poll.
    pub fn latest(&self) -> Option<CacheStats> {
        if !self.value.seen.load(Ordering::Relaxed) {
            return None;
        }
        Some(CacheStats {
            cached_papers: self.value.cached_papers.load(Ordering::Relaxed),
            is_warming: self.value.is_warming.load(Ordering::Relaxed),
        })
    }

    /// Badge text, e.g. "1200 papers cached".
    pub fn label(&self) -> Option<String> {
        self.latest().map(|s| {
            if s.is_warming {
                format!("{} papers cached (warming)", s.cached_papers)
            } else {
                format!("{} papers cached", s.cached_papers)
            }
        })
    }
}

impl Drop for CacheBadge {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{sample_round, MockRoundSource};

    #[tokio::test(start_paused = true)]
    async fn polls_on_interval() {
        let mock = Arc::new(
            MockRoundSource::with_fixed_round(sample_round(2015, 1)).with_cache_stats(Some(
                CacheStats {
                    cached_papers: 812,
                    is_warming: true,
                },
            )),
        );
        let badge = CacheBadge::spawn(mock.clone(), Duration::from_secs(30));

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(mock.stats_calls(), 1);
        assert_eq!(badge.latest().unwrap().cached_papers, 812);
        assert_eq!(badge.label().unwrap(), "812 papers cached (warming)");

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(mock.stats_calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn failures_are_silent() {
        let mock = Arc::new(
            MockRoundSource::with_fixed_round(sample_round(2015, 1)).with_cache_stats(None),
        );
        let badge = CacheBadge::spawn(mock.clone(), Duration::from_secs(10));
        tokio::time::sleep(Duration::from_secs(25)).await;
        assert_eq!(mock.stats_calls(), 3);
        assert!(badge.latest().is_none());
        assert!(badge.label().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn drop_stops_polling() {
        let mock = Arc::new(MockRoundSource::with_fixed_round(sample_round(2015, 1)));
        let badge = CacheBadge::spawn(mock.clone(), Duration::from_secs(10));
        tokio::time::sleep(Duration::from_secs(1)).await;
        drop(badge);
        tokio::time::sleep(Duration::from_secs(100)).await;
        assert_eq!(mock.stats_calls(), 1);
    }
}
