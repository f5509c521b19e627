use crate::conf::{CircuitBreakerConfig, RateLimitConfig};
use crate::search::error::SearchError;
use parking_lot::Mutex;
use serde::Serialize;
use std::time::{Duration, Instant};
use tracing::info;

/// Token bucket refilled continuously at `rate` tokens per second.
pub struct RateLimiter {
    state: Mutex<Bucket>,
    rate: f64,
    burst: f64,
}

struct Bucket {
    tokens: f64,
    refilled_at: Instant,
}

impl RateLimiter {
    pub fn new(requests_per_second: f64, burst: u32) -> Self {
        let burst = f64::from(burst.max(1));
        Self {
            state: Mutex::new(Bucket {
                tokens: burst,
                refilled_at: Instant::now(),
            }),
            rate: requests_per_second.max(0.0),
            burst,
        }
    }

    pub fn try_acquire(&self) -> bool {
        let mut bucket = self.state.lock();
        let elapsed = bucket.refilled_at.elapsed().as_secs_f64();
        bucket.tokens = (bucket.tokens + elapsed * self.rate).min(self.burst);
        bucket.refilled_at = Instant::now();

        if bucket.tokens >= 1.0 {
            bucket.tokens -= 1.0;
            true
        } else {
            false
        }
    }
}

#[derive(Debug, Clone)]
pub struct CircuitBreakerParams {
    pub failure_threshold: u32,
    pub open_duration: Duration,
    pub half_open_max_requests: u32,
    pub success_threshold: u32,
}

impl From<&CircuitBreakerConfig> for CircuitBreakerParams {
    fn from(cfg: &CircuitBreakerConfig) -> Self {
        Self {
            failure_threshold: cfg.failure_threshold.max(1),
            open_duration: Duration::from_millis(cfg.open_duration_ms),
            half_open_max_requests: cfg.half_open_max_requests.max(1),
            success_threshold: cfg.success_threshold.max(1),
        }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

#[derive(Debug, Clone)]
pub struct CircuitBreaker {
    state: CircuitState,

    // Closed
    consecutive_failures: u32,

    // Open
    opened_at: Option<Instant>,

    // HalfOpen
    half_open_in_flight: u32,
    half_open_successes: u32,
}

impl CircuitBreaker {
    pub fn new() -> Self {
        Self {
            state: CircuitState::Closed,
            consecutive_failures: 0,
            opened_at: None,
            half_open_in_flight: 0,
            half_open_successes: 0,
        }
    }

    pub fn state(&self) -> CircuitState {
        self.state
    }

    /// Whether a search may start right now.
    pub fn allow_request(&mut self, p: &CircuitBreakerParams) -> bool {
        match self.state {
            CircuitState::Closed => true,

            CircuitState::Open => {
                let Some(opened_at) = self.opened_at else {
                    return false;
                };
                if opened_at.elapsed() < p.open_duration {
                    return false;
                }

                self.transition(CircuitState::HalfOpen, "cooldown_expired");
                self.allow_request(p)
            }

            CircuitState::HalfOpen => {
                if self.half_open_in_flight < p.half_open_max_requests {
                    self.half_open_in_flight += 1;
                    true
                } else {
                    false
                }
            }
        }
    }

    /// Record the end of a search admitted by `allow_request`.
    pub fn on_request_end(&mut self, p: &CircuitBreakerParams, success: bool) {
        match self.state {
            CircuitState::Closed => {
                if success {
                    self.consecutive_failures = 0;
                } else {
                    self.consecutive_failures = self.consecutive_failures.saturating_add(1);
                    if self.consecutive_failures >= p.failure_threshold {
                        self.transition(CircuitState::Open, "failure_threshold_exceeded");
                    }
                }
            }

            CircuitState::Open => {}

            CircuitState::HalfOpen => {
                self.half_open_in_flight = self.half_open_in_flight.saturating_sub(1);
                if !success {
                    self.transition(CircuitState::Open, "half_open_failure");
                    return;
                }
                self.half_open_successes = self.half_open_successes.saturating_add(1);
                if self.half_open_successes >= p.success_threshold {
                    self.transition(CircuitState::Closed, "success_threshold_reached");
                }
            }
        }
    }

    fn transition(&mut self, to: CircuitState, reason: &'static str) {
        let from = self.state;
        let failures = self.consecutive_failures;

        self.state = to;
        self.consecutive_failures = 0;
        self.half_open_in_flight = 0;
        self.half_open_successes = 0;
        self.opened_at = (to == CircuitState::Open).then(Instant::now);

        info!(
            event = "circuit_transition",
            from = ?from,
            to = ?to,
            reason,
            failures
        );
    }
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        Self::new()
    }
}

/// Admission control in front of searches: rate limit first, then breaker.
pub struct SearchGuard {
    limiter: Option<RateLimiter>,
    breaker: Option<(Mutex<CircuitBreaker>, CircuitBreakerParams)>,
}

impl SearchGuard {
    pub fn new(rate: &RateLimitConfig, breaker: &CircuitBreakerConfig) -> Self {
        Self {
            limiter: rate
                .enabled
                .then(|| RateLimiter::new(rate.requests_per_second, rate.burst)),
            breaker: breaker
                .enabled
                .then(|| (Mutex::new(CircuitBreaker::new()), CircuitBreakerParams::from(breaker))),
        }
    }

    pub fn disabled() -> Self {
        Self {
            limiter: None,
            breaker: None,
        }
    }

    pub fn admit(&self) -> Result<(), SearchError> {
        if let Some(limiter) = &self.limiter {
            if !limiter.try_acquire() {
                return Err(SearchError::RateLimited);
            }
        }
        if let Some((breaker, params)) = &self.breaker {
            if !breaker.lock().allow_request(params) {
                return Err(SearchError::CircuitOpen);
            }
        }
        Ok(())
    }

    /// Report the outcome of an admitted search.
    pub fn record<T>(&self, result: &Result<T, SearchError>) {
        if let Some((breaker, params)) = &self.breaker {
            let success = match result {
                Ok(_) => true,
                Err(e) => !e.counts_against_breaker(),
            };
            breaker.lock().on_request_end(params, success);
        }
    }

    pub fn circuit_state(&self) -> Option<CircuitState> {
        self.breaker.as_ref().map(|(b, _)| b.lock().state())
    }
}
