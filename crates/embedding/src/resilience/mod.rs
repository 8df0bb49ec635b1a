//! Resilience for upstream embedding calls: retry with backoff and a circuit breaker.
//!
//! Both are owned by the client instance that uses them, so separate clients
//! (and separate tests) never share failure state.

mod circuit_breaker;
mod retry;

pub use circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitState};
pub use retry::{execute_with_retry_async, RetryConfig, RetryResult};
