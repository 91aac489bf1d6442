//! Cancellable periodic task driving the status feed.

use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::info;

/// A repeating task: one tick right away, then one per `period`, until
/// cancelled. Ticks never overlap; a slow tick pushes the next one back
/// to the following period boundary.
///
/// Dropping a poller stops it as well, so an admin surface that goes away
/// cannot leave it running.
pub struct StatusPoller {
    handle: Option<JoinHandle<()>>,
    period: Duration,
}

impl StatusPoller {
    pub fn spawn<F, Fut>(period: Duration, mut tick: F) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                tick().await;
            }
        });

        info!(period_secs = period.as_secs(), "Status poller started");
        Self {
            handle: Some(handle),
            period,
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Stop the task. No tick starts after this returns, and a tick in
    /// progress is abandoned at its next await point.
    pub fn cancel(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
            info!("Status poller cancelled");
        }
    }
}

impl Drop for StatusPoller {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    const PERIOD: Duration = Duration::from_secs(30);

    /// Give spawned tasks a chance to run on the paused test runtime
    async fn settle() {
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
    }

    fn counting_poller(period: Duration) -> (StatusPoller, Arc<AtomicUsize>) {
        let count = Arc::new(AtomicUsize::new(0));
        let counter = count.clone();
        let poller = StatusPoller::spawn(period, move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
            }
        });
        (poller, count)
    }

    #[tokio::test(start_paused = true)]
    async fn test_fires_immediately_then_every_period() {
        let (poller, count) = counting_poller(PERIOD);
        settle().await;
        assert_eq!(count.load(Ordering::SeqCst), 1);

        tokio::time::advance(Duration::from_secs(29)).await;
        settle().await;
        assert_eq!(count.load(Ordering::SeqCst), 1);

        tokio::time::advance(Duration::from_secs(1)).await;
        settle().await;
        assert_eq!(count.load(Ordering::SeqCst), 2);

        for expected in 3..=5 {
            tokio::time::advance(PERIOD).await;
            settle().await;
            assert_eq!(count.load(Ordering::SeqCst), expected);
        }

        assert!(poller.is_running());
        poller.cancel();
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_ticks_after_cancel() {
        let (poller, count) = counting_poller(PERIOD);
        settle().await;
        assert_eq!(count.load(Ordering::SeqCst), 1);

        poller.cancel();
        for _ in 0..4 {
            tokio::time::advance(PERIOD).await;
            settle().await;
        }
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_stops_poller() {
        let (poller, count) = counting_poller(PERIOD);
        settle().await;
        drop(poller);

        tokio::time::advance(PERIOD * 3).await;
        settle().await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_tick_does_not_overlap() {
        let running = Arc::new(AtomicUsize::new(0));
        let max_seen = Arc::new(AtomicUsize::new(0));
        let (r, m) = (running.clone(), max_seen.clone());
        let poller = StatusPoller::spawn(PERIOD, move || {
            let (r, m) = (r.clone(), m.clone());
            async move {
                let now = r.fetch_add(1, Ordering::SeqCst) + 1;
                m.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_secs(45)).await;
                r.fetch_sub(1, Ordering::SeqCst);
            }
        });

        for _ in 0..6 {
            tokio::time::advance(PERIOD).await;
            settle().await;
        }
        assert_eq!(max_seen.load(Ordering::SeqCst), 1);
        poller.cancel();
    }
}
