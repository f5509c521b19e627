use crate::conf::{CircuitBreakerConfig, RateLimitConfig};
use crate::index::IndexError;
use crate::search::{
    CircuitBreaker, CircuitBreakerParams, CircuitState, RateLimiter, SearchError, SearchGuard,
};
use pretty_assertions::assert_eq;
use std::time::Duration;

fn params(open_duration: Duration) -> CircuitBreakerParams {
    CircuitBreakerParams {
        failure_threshold: 3,
        open_duration,
        half_open_max_requests: 1,
        success_threshold: 2,
    }
}

#[test]
fn limiter_allows_burst_then_refuses() {
    // Arrange
    let limiter = RateLimiter::new(0.0, 3);

    // Act
    let granted: Vec<bool> = (0..4).map(|_| limiter.try_acquire()).collect();

    // Assert
    assert_eq!(granted, vec![true, true, true, false]);
}

#[test]
fn breaker_opens_after_consecutive_failures() {
    let p = params(Duration::from_secs(60));
    let mut breaker = CircuitBreaker::new();

    for _ in 0..2 {
        assert!(breaker.allow_request(&p));
        breaker.on_request_end(&p, false);
    }
    assert_eq!(breaker.state(), CircuitState::Closed);

    breaker.on_request_end(&p, false);

    assert_eq!(breaker.state(), CircuitState::Open);
    assert!(!breaker.allow_request(&p));
}

#[test]
fn success_resets_failure_streak() {
    let p = params(Duration::from_secs(60));
    let mut breaker = CircuitBreaker::new();

    breaker.on_request_end(&p, false);
    breaker.on_request_end(&p, false);
    breaker.on_request_end(&p, true);
    breaker.on_request_end(&p, false);

    assert_eq!(breaker.state(), CircuitState::Closed);
}

#[test]
fn breaker_recovers_through_half_open() {
    // Arrange
    let p = params(Duration::ZERO);
    let mut breaker = CircuitBreaker::new();
    for _ in 0..3 {
        breaker.on_request_end(&p, false);
    }
    assert_eq!(breaker.state(), CircuitState::Open);

    // Act: cooldown already expired, one probe at a time.
    assert!(breaker.allow_request(&p));
    assert_eq!(breaker.state(), CircuitState::HalfOpen);
    assert!(!breaker.allow_request(&p));
    breaker.on_request_end(&p, true);
    assert!(breaker.allow_request(&p));
    breaker.on_request_end(&p, true);

    // Assert
    assert_eq!(breaker.state(), CircuitState::Closed);
}

#[test]
fn half_open_failure_reopens() {
    let p = params(Duration::ZERO);
    let mut breaker = CircuitBreaker::new();
    for _ in 0..3 {
        breaker.on_request_end(&p, false);
    }

    assert!(breaker.allow_request(&p));
    breaker.on_request_end(&p, false);

    assert_eq!(breaker.state(), CircuitState::Open);
}

#[test]
fn guard_reports_rate_limited() {
    let guard = SearchGuard::new(
        &RateLimitConfig {
            enabled: true,
            requests_per_second: 0.0,
            burst: 1,
        },
        &CircuitBreakerConfig {
            enabled: false,
            ..CircuitBreakerConfig::default()
        },
    );

    assert!(guard.admit().is_ok());
    assert!(matches!(guard.admit(), Err(SearchError::RateLimited)));
    assert_eq!(guard.circuit_state(), None);
}

#[test]
fn guard_opens_circuit_on_index_failures_only() {
    // Arrange
    let guard = SearchGuard::new(
        &RateLimitConfig {
            enabled: false,
            ..RateLimitConfig::default()
        },
        &CircuitBreakerConfig {
            enabled: true,
            failure_threshold: 2,
            open_duration_ms: 60_000,
            half_open_max_requests: 1,
            success_threshold: 1,
        },
    );
    let rejected: Result<(), SearchError> = Err(SearchError::Cancelled);
    let failed: Result<(), SearchError> = Err(SearchError::Index(IndexError::Closed));

    // Act
    guard.record(&rejected);
    guard.record(&rejected);
    assert_eq!(guard.circuit_state(), Some(CircuitState::Closed));
    guard.record(&failed);
    guard.record(&failed);

    // Assert
    assert_eq!(guard.circuit_state(), Some(CircuitState::Open));
    assert!(matches!(guard.admit(), Err(SearchError::CircuitOpen)));
}
