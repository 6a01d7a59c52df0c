//! # Circuit Breaker
//!
//! Classic three-state circuit breaker guarding one command: Closed (normal
//! operation), Open (failing fast), and Half-Open (testing recovery).
//! Consecutive failures open the circuit; after the open timeout a limited
//! number of probe calls is allowed, and enough successes close it again.
//!
//! State is an atomic; counters sit behind a short-lived mutex.

use std::sync::atomic::{AtomicU8, Ordering};
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tracing::{debug, error, info, warn};

use crate::config::EngineSettings;

/// Circuit breaker states representing the current operational mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CircuitState {
    /// Normal operation - all calls are allowed through
    Closed = 0,
    /// Failure mode - all calls fail fast without executing
    Open = 1,
    /// Testing recovery - limited calls allowed to test system health
    HalfOpen = 2,
}

impl From<u8> for CircuitState {
    fn from(value: u8) -> Self {
        match value {
            0 => CircuitState::Closed,
            1 => CircuitState::Open,
            2 => CircuitState::HalfOpen,
            _ => CircuitState::Open, // Default to safest state
        }
    }
}

#[derive(Debug, Default)]
struct BreakerCounters {
    total_calls: u64,
    consecutive_failures: u64,
    half_open_calls: u64,
}

/// Per-command circuit breaker with atomic state management.
#[derive(Debug)]
pub struct CircuitBreaker {
    /// Command name for logging
    name: String,

    /// Current circuit state (atomic for thread safety)
    state: AtomicU8,

    failure_threshold: u32,
    open_timeout: Duration,
    success_threshold: u32,

    counters: Mutex<BreakerCounters>,

    /// Time when circuit was opened (for timeout calculations)
    opened_at: Mutex<Option<Instant>>,
}

impl CircuitBreaker {
    pub fn new(name: impl Into<String>, settings: &EngineSettings) -> Self {
        let name = name.into();
        info!(
            command = %name,
            failure_threshold = settings.failure_threshold,
            open_timeout_ms = settings.open_timeout.as_millis() as u64,
            success_threshold = settings.success_threshold,
            "🛡️ Circuit breaker initialized"
        );

        Self {
            name,
            state: AtomicU8::new(CircuitState::Closed as u8),
            failure_threshold: settings.failure_threshold,
            open_timeout: settings.open_timeout,
            success_threshold: settings.success_threshold,
            counters: Mutex::new(BreakerCounters::default()),
            opened_at: Mutex::new(None),
        }
    }

    /// Get current circuit state
    pub fn state(&self) -> CircuitState {
        CircuitState::from(self.state.load(Ordering::Acquire))
    }

    /// Whether a call should be allowed right now. An Open circuit whose
    /// timeout has elapsed transitions to Half-Open and admits the call.
    pub fn try_acquire(&self) -> bool {
        match self.state() {
            CircuitState::Closed => true,
            CircuitState::Open => {
                let opened_at = *self.opened_at.lock();
                match opened_at {
                    Some(opened_time) if opened_time.elapsed() >= self.open_timeout => {
                        self.transition_to_half_open();
                        true
                    }
                    Some(_) => false,
                    None => {
                        // Circuit is open but no timestamp - shouldn't happen, but allow call
                        warn!(command = %self.name, "Circuit open but no timestamp recorded");
                        true
                    }
                }
            }
            CircuitState::HalfOpen => {
                let counters = self.counters.lock();
                counters.half_open_calls < u64::from(self.success_threshold)
            }
        }
    }

    /// Record a successful execution
    pub fn record_success(&self, duration: Duration) {
        let mut counters = self.counters.lock();
        counters.total_calls += 1;

        debug!(
            command = %self.name,
            duration_ms = duration.as_millis() as u64,
            "🟢 Command succeeded"
        );

        match self.state() {
            CircuitState::HalfOpen => {
                counters.half_open_calls += 1;
                if counters.half_open_calls >= u64::from(self.success_threshold) {
                    drop(counters);
                    self.transition_to_closed();
                }
            }
            CircuitState::Closed => {
                counters.consecutive_failures = 0;
            }
            CircuitState::Open => {
                warn!(command = %self.name, "Success recorded while circuit is open");
            }
        }
    }

    /// Record a failed execution
    pub fn record_failure(&self, duration: Duration) {
        let mut counters = self.counters.lock();
        counters.total_calls += 1;

        error!(
            command = %self.name,
            duration_ms = duration.as_millis() as u64,
            "🔴 Command failed"
        );

        match self.state() {
            CircuitState::Closed => {
                counters.consecutive_failures += 1;
                if counters.consecutive_failures >= u64::from(self.failure_threshold) {
                    drop(counters);
                    self.transition_to_open();
                }
            }
            CircuitState::HalfOpen => {
                // Any failure in half-open state immediately re-opens the circuit
                drop(counters);
                self.transition_to_open();
            }
            CircuitState::Open => {
                // Already open, just record the failure
            }
        }
    }

    fn transition_to_closed(&self) {
        self.state.store(CircuitState::Closed as u8, Ordering::Release);

        let mut counters = self.counters.lock();
        counters.consecutive_failures = 0;
        counters.half_open_calls = 0;

        *self.opened_at.lock() = None;

        info!(
            command = %self.name,
            total_calls = counters.total_calls,
            "🟢 Circuit breaker closed (recovered)"
        );
    }

    fn transition_to_open(&self) {
        self.state.store(CircuitState::Open as u8, Ordering::Release);

        *self.opened_at.lock() = Some(Instant::now());

        let mut counters = self.counters.lock();
        counters.half_open_calls = 0;

        error!(
            command = %self.name,
            consecutive_failures = counters.consecutive_failures,
            failure_threshold = self.failure_threshold,
            open_timeout_ms = self.open_timeout.as_millis() as u64,
            "🔴 Circuit breaker opened (failing fast)"
        );
    }

    fn transition_to_half_open(&self) {
        self.state.store(CircuitState::HalfOpen as u8, Ordering::Release);

        let mut counters = self.counters.lock();
        counters.half_open_calls = 0;

        info!(
            command = %self.name,
            success_threshold = self.success_threshold,
            "🟡 Circuit breaker half-open (testing recovery)"
        );
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}
