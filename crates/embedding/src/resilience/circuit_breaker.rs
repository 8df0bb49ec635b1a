//! Circuit breaker for the embedding upstream.
//!
//! After `failure_threshold` consecutive failures the breaker opens and calls
//! are rejected without touching the network. Once `reset_timeout` has passed
//! a single trial call is let through (half-open); its outcome closes or re-opens
//! the circuit.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

/// Configuration for circuit breaker behavior.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CircuitBreakerConfig {
    /// Number of consecutive failures before opening the circuit.
    pub failure_threshold: u32,
    /// Duration to wait before letting a trial call through (half-open).
    #[serde(with = "crate::serde_millis")]
    pub reset_timeout: Duration,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            reset_timeout: Duration::from_secs(30),
        }
    }
}

impl CircuitBreakerConfig {
    pub fn with_failure_threshold(mut self, threshold: u32) -> Self {
        self.failure_threshold = threshold;
        self
    }

    pub fn with_reset_timeout(mut self, timeout: Duration) -> Self {
        self.reset_timeout = timeout;
        self
    }
}

/// Current state of the circuit breaker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    /// Requests are allowed.
    Closed,
    /// Requests are rejected.
    Open,
    /// A trial request is allowed.
    HalfOpen,
}

struct Transition {
    state: CircuitState,
    since: Instant,
    trial_in_flight: bool,
}

pub struct CircuitBreaker {
    config: CircuitBreakerConfig,
    transition: Mutex<Transition>,
    failure_count: AtomicU64,
    success_count: AtomicU64,
}

impl CircuitBreaker {
    pub fn new(config: CircuitBreakerConfig) -> Self {
        Self {
            config,
            transition: Mutex::new(Transition {
                state: CircuitState::Closed,
                since: Instant::now(),
                trial_in_flight: false,
            }),
            failure_count: AtomicU64::new(0),
            success_count: AtomicU64::new(0),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Transition> {
        self.transition
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Check if a request should be allowed through.
    ///
    /// While half-open only one caller gets `true` until that call reports
    /// back through `record_success`, `record_failure` or `release`.
    pub fn allow_request(&self) -> bool {
        let mut guard = self.lock();
        match guard.state {
            CircuitState::Closed => true,
            CircuitState::HalfOpen => {
                if guard.trial_in_flight {
                    false
                } else {
                    guard.trial_in_flight = true;
                    true
                }
            }
            CircuitState::Open => {
                if guard.since.elapsed() >= self.config.reset_timeout {
                    guard.state = CircuitState::HalfOpen;
                    guard.since = Instant::now();
                    guard.trial_in_flight = true;
                    true
                } else {
                    false
                }
            }
        }
    }

    pub fn record_success(&self) {
        self.success_count.fetch_add(1, Ordering::Relaxed);
        self.failure_count.store(0, Ordering::Relaxed);

        let mut guard = self.lock();
        guard.trial_in_flight = false;
        if guard.state == CircuitState::HalfOpen {
            guard.state = CircuitState::Closed;
            guard.since = Instant::now();
        }
    }

    /// The admitted call ended without saying anything about upstream
    /// health (rejected input, local error). Counters are left untouched.
    pub fn release(&self) {
        self.lock().trial_in_flight = false;
    }

    pub fn record_failure(&self) {
        let failures = self.failure_count.fetch_add(1, Ordering::Relaxed) + 1;

        let mut guard = self.lock();
        guard.trial_in_flight = false;
        match guard.state {
            CircuitState::Closed if failures >= u64::from(self.config.failure_threshold) => {
                tracing::warn!(failures, "embedding circuit breaker opened");
                guard.state = CircuitState::Open;
                guard.since = Instant::now();
            }
            CircuitState::HalfOpen => {
                guard.state = CircuitState::Open;
                guard.since = Instant::now();
            }
            _ => {}
        }
    }

    pub fn current_state(&self) -> CircuitState {
        self.lock().state
    }

    pub fn failure_count(&self) -> u64 {
        self.failure_count.load(Ordering::Relaxed)
    }

    pub fn success_count(&self) -> u64 {
        self.success_count.load(Ordering::Relaxed)
    }
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        Self::new(CircuitBreakerConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn circuit_breaker_starts_closed() {
        let cb = CircuitBreaker::default();
        assert_eq!(cb.current_state(), CircuitState::Closed);
        assert!(cb.allow_request());
    }

    #[test]
    fn circuit_breaker_opens_after_failures() {
        let cb = CircuitBreaker::new(CircuitBreakerConfig::default().with_failure_threshold(3));

        for _ in 0..3 {
            cb.record_failure();
        }

        assert_eq!(cb.current_state(), CircuitState::Open);
        assert!(!cb.allow_request());
    }

    #[test]
    fn circuit_breaker_resets_on_success() {
        let cb = CircuitBreaker::new(CircuitBreakerConfig::default().with_failure_threshold(3));

        cb.record_failure();
        cb.record_failure();
        assert_eq!(cb.current_state(), CircuitState::Closed);

        // Success resets the consecutive-failure counter
        cb.record_success();

        cb.record_failure();
        cb.record_failure();
        assert_eq!(cb.current_state(), CircuitState::Closed);
        cb.record_failure();
        assert_eq!(cb.current_state(), CircuitState::Open);
    }

    #[test]
    fn half_open_trial_closes_or_reopens() {
        let cb = CircuitBreaker::new(
            CircuitBreakerConfig::default()
                .with_failure_threshold(1)
                .with_reset_timeout(Duration::ZERO),
        );

        cb.record_failure();
        assert_eq!(cb.current_state(), CircuitState::Open);

        assert!(cb.allow_request());
        assert_eq!(cb.current_state(), CircuitState::HalfOpen);
        cb.record_failure();
        assert_eq!(cb.current_state(), CircuitState::Open);

        assert!(cb.allow_request());
        cb.record_success();
        assert_eq!(cb.current_state(), CircuitState::Closed);
        assert_eq!(cb.success_count(), 1);
    }

    #[test]
    fn half_open_admits_one_call_at_a_time() {
        let cb = CircuitBreaker::new(
            CircuitBreakerConfig::default()
                .with_failure_threshold(1)
                .with_reset_timeout(Duration::ZERO),
        );
        cb.record_failure();

        assert!(cb.allow_request());
        assert!(!cb.allow_request());
        assert_eq!(cb.current_state(), CircuitState::HalfOpen);

        cb.release();
        assert_eq!(cb.current_state(), CircuitState::HalfOpen);
        assert_eq!(cb.failure_count(), 1);
        assert!(cb.allow_request());
        assert!(!cb.allow_request());

        cb.record_success();
        assert!(cb.allow_request());
        assert!(cb.allow_request());
    }
}
