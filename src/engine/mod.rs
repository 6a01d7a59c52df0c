//! # Command Engine
//!
//! The execution primitive behind the command core: worker-pool scheduling,
//! the snapshot cache store, the per-execution deadline, and the circuit
//! breaker. The core supplies the hooks (the primary action, the cache key,
//! the fallback); the engine supplies everything operational.
//!
//! One engine exists per command configuration, so its cache is scoped to
//! one logical command. Cache entries are additionally partitioned by
//! request-context id: submissions only share results when they share a
//! propagated [`RequestContext`].
//!
//! Whether a dispatch was served from cache is reported explicitly on the
//! outcome; callers never infer it.

pub mod breaker;

use std::sync::Arc;
use std::time::Instant;

use dashmap::DashMap;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::action::Action;
use crate::config::CommandConfig;
use crate::context::{ContextScope, RequestContext};
use crate::policy::suppression::ClassifiedFailure;
use crate::state::{Failure, RequestState};

pub use breaker::{CircuitBreaker, CircuitState};

/// Failure kind for executions rejected by an open circuit.
pub const CIRCUIT_OPEN_KIND: &str = "breakwater.circuit-open";
/// Failure kind for executions that exceeded the configured deadline.
pub const EXECUTION_TIMEOUT_KIND: &str = "breakwater.timeout";
/// Failure kind for worker tasks that panicked.
pub const WORKER_PANIC_KIND: &str = "breakwater.worker-panic";

/// Cache partition key: one logical command configuration owns the engine,
/// so the slot only needs the context id and the derived key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheSlot {
    context_id: Uuid,
    key: String,
}

/// Outcome of one dispatch through the engine.
pub enum Dispatch {
    /// Served from cache; the unit of work was not invoked. The snapshot is
    /// a copy of the stored entry for the core to merge into the live state.
    CacheHit {
        state: RequestState,
        snapshot: RequestState,
    },
    /// The unit of work ran (or was rejected by the circuit). A failure, if
    /// any, arrives already classified against the suppression policy and
    /// cleared from the state's failure slot.
    Ran {
        state: RequestState,
        failure: Option<ClassifiedFailure>,
    },
}

/// Per-configuration execution engine.
pub struct CommandEngine {
    config: Arc<CommandConfig>,
    breaker: CircuitBreaker,
    cache: DashMap<CacheSlot, RequestState>,
}

impl CommandEngine {
    pub fn new(config: Arc<CommandConfig>) -> Self {
        let breaker = CircuitBreaker::new(config.command_name(), config.engine());
        Self {
            config,
            breaker,
            cache: DashMap::new(),
        }
    }

    pub fn circuit_state(&self) -> CircuitState {
        self.breaker.state()
    }

    /// Runs one submission: cache probe, circuit admission, then the primary
    /// action on a pool thread with the context attached.
    ///
    /// Suppressed failures are not counted against the circuit: they are
    /// request errors, not system errors. Circuit-open rejections surface as
    /// ordinary recoverable failures so a configured fallback can serve a
    /// degraded response.
    pub async fn dispatch(
        &self,
        ctx: &RequestContext,
        cache_key: Option<&str>,
        action: Arc<dyn Action>,
        state: RequestState,
    ) -> Dispatch {
        if let Some(key) = cache_key {
            if let Some(snapshot) = self.lookup(ctx, key) {
                debug!(
                    command = self.config.command_name(),
                    context_id = %ctx.id(),
                    key,
                    "Cache hit, skipping execution"
                );
                return Dispatch::CacheHit { state, snapshot };
            }
        }

        if !self.breaker.try_acquire() {
            let failure = Failure::new(
                CIRCUIT_OPEN_KIND,
                format!("circuit breaker is open for '{}'", self.breaker.name()),
            );
            return Dispatch::Ran {
                state,
                failure: Some(ClassifiedFailure::Passthrough(failure)),
            };
        }

        let started = Instant::now();
        let (state, failure) = self.invoke(ctx, action, state).await;
        let elapsed = started.elapsed();

        match failure {
            None => {
                self.breaker.record_success(elapsed);
                let state = self.maybe_store(ctx, cache_key, state);
                Dispatch::Ran { state, failure: None }
            }
            Some(failure) => {
                let classified = self.config.suppression().classify(failure);
                if classified.is_suppressed() {
                    debug!(
                        command = self.config.command_name(),
                        "Failure kind is registered for suppression, bypassing fallback"
                    );
                } else {
                    self.breaker.record_failure(elapsed);
                }
                Dispatch::Ran {
                    state,
                    failure: Some(classified),
                }
            }
        }
    }

    /// Runs the fallback action on a pool thread. No circuit accounting and
    /// no caching: the fallback's outcome is final either way.
    pub async fn run_fallback(
        &self,
        ctx: &RequestContext,
        action: Arc<dyn Action>,
        state: RequestState,
    ) -> (RequestState, Option<Failure>) {
        self.invoke(ctx, action, state).await
    }

    fn lookup(&self, ctx: &RequestContext, key: &str) -> Option<RequestState> {
        let slot = CacheSlot {
            context_id: ctx.id(),
            key: key.to_string(),
        };
        self.cache.get(&slot).map(|entry| entry.deep_copy())
    }

    fn maybe_store(
        &self,
        ctx: &RequestContext,
        cache_key: Option<&str>,
        state: RequestState,
    ) -> RequestState {
        if let Some(key) = cache_key {
            let slot = CacheSlot {
                context_id: ctx.id(),
                key: key.to_string(),
            };
            // the stored snapshot must not observe later mutations of the live state
            self.cache.insert(slot, state.deep_copy());
            debug!(
                command = self.config.command_name(),
                context_id = %ctx.id(),
                key,
                "Result snapshot cached"
            );
        }
        state
    }

    /// Runs an action on the blocking pool with the request context attached
    /// for the duration of the task, under the configured deadline.
    ///
    /// The action owns the state while it runs. If the deadline elapses or
    /// the worker panics, the moved state is unrecoverable; execution
    /// resumes from the pre-dispatch snapshot taken here.
    async fn invoke(
        &self,
        ctx: &RequestContext,
        action: Arc<dyn Action>,
        state: RequestState,
    ) -> (RequestState, Option<Failure>) {
        let restore = state.deep_copy();
        let scope_ctx = ctx.clone();

        let handle = tokio::task::spawn_blocking(move || {
            let _scope = ContextScope::attach(scope_ctx);
            let mut state = state;
            let failure = match action.run(&mut state) {
                // a failure set on the state counts the same as a returned one
                Ok(()) => state.take_failure(),
                Err(failure) => {
                    state.take_failure();
                    Some(failure)
                }
            };
            (state, failure)
        });

        let deadline = self.config.engine().execution_timeout;
        match tokio::time::timeout(deadline, handle).await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(join_error)) => {
                warn!(
                    command = self.config.command_name(),
                    error = %join_error,
                    "Worker task panicked"
                );
                (
                    restore,
                    Some(Failure::new(
                        WORKER_PANIC_KIND,
                        format!("worker task panicked: {join_error}"),
                    )),
                )
            }
            Err(_elapsed) => {
                warn!(
                    command = self.config.command_name(),
                    timeout_ms = deadline.as_millis() as u64,
                    "Execution exceeded deadline"
                );
                (
                    restore,
                    Some(Failure::new(
                        EXECUTION_TIMEOUT_KIND,
                        format!("execution exceeded {}ms", deadline.as_millis()),
                    )),
                )
            }
        }
    }
}
