use omnifeed_source::ObservationSource;
use rand::Rng;
use std::time::Duration;

/// Fixed retry delay plus optional random jitter
///
/// There is no exponential growth and no retry limit: every failure waits
/// the same base delay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffPolicy {
    pub delay: Duration,
    pub jitter: Duration,
}

impl BackoffPolicy {
    pub fn new(delay: Duration, jitter: Duration) -> Self {
        Self { delay, jitter }
    }

    pub fn fixed(delay: Duration) -> Self {
        Self::new(delay, Duration::ZERO)
    }

    /// Policy advertised by a source
    pub fn for_source(source: &dyn ObservationSource) -> Self {
        Self::new(source.retry_delay(), source.jitter())
    }

    /// Delay for the next backoff, in `[delay, delay + jitter]`
    pub fn next_delay(&self) -> Duration {
        let jitter_ms = self.jitter.as_millis() as u64;
        if jitter_ms == 0 {
            return self.delay;
        }
        let extra = rand::thread_rng().gen_range(0..=jitter_ms);
        self.delay + Duration::from_millis(extra)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_delay_without_jitter() {
        let policy = BackoffPolicy::fixed(Duration::from_secs(5));
        for _ in 0..10 {
            assert_eq!(policy.next_delay(), Duration::from_secs(5));
        }
    }

    #[test]
    fn test_jitter_stays_in_bounds() {
        let policy = BackoffPolicy::new(Duration::from_secs(5), Duration::from_millis(250));
        for _ in 0..200 {
            let delay = policy.next_delay();
            assert!(delay >= Duration::from_secs(5));
            assert!(delay <= Duration::from_millis(5250));
        }
    }
}
