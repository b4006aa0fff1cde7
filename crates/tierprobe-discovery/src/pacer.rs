//! Fixed minimum spacing between probes.
//!
//! Not a rate limiter: the exchange's own limits are far above one request
//! per interval. This only keeps probing from bursting.

use std::time::Duration;
use tokio::time::Instant;

/// Enforces a minimum interval between successive [`ProbePacer::wait`] returns.
#[derive(Debug)]
pub struct ProbePacer {
    interval: Duration,
    last: Option<Instant>,
}

impl ProbePacer {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Return immediately on first call, afterwards no sooner than
    /// `interval` after the previous return.
    pub async fn wait(&mut self) {
        if let Some(last) = self.last {
            tokio::time::sleep_until(last + self.interval).await;
        }
        self.last = Some(Instant::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_first_wait_is_immediate() {
        let mut pacer = ProbePacer::new(Duration::from_millis(100));
        let start = Instant::now();
        pacer.wait().await;
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_waits_enforce_interval() {
        let mut pacer = ProbePacer::new(Duration::from_millis(100));
        let start = Instant::now();
        for _ in 0..4 {
            pacer.wait().await;
        }
        assert_eq!(start.elapsed(), Duration::from_millis(300));
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_caller_not_delayed_further() {
        let mut pacer = ProbePacer::new(Duration::from_millis(100));
        pacer.wait().await;
        tokio::time::sleep(Duration::from_millis(250)).await;

        let before = Instant::now();
        pacer.wait().await;
        assert_eq!(before.elapsed(), Duration::ZERO);
    }
}
