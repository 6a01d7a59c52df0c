//! # Command Executor
//!
//! The core state machine. A submission moves
//! `Created → Executing → {Succeeded, FailedNoFallback, FailedWithFallbackSucceeded, FailedWithFallbackFailed}`,
//! and every terminal state fires the completion callback exactly once.
//!
//! [`CommandExecutor::submit`] never blocks the caller: the cache probe, the
//! unit of work, and any fallback all run behind the engine on pool threads,
//! and the callback fires from there. The only synchronous outcomes are the
//! pre-scheduling faults (configuration errors and completion misuse).

use std::sync::Arc;

use tracing::{debug, warn};

use crate::action::Action;
use crate::cache;
use crate::command::completion::{Completion, CompletionFn};
use crate::config::CommandConfig;
use crate::context::ensure_context_present;
use crate::engine::{CommandEngine, Dispatch};
use crate::error::Result;
use crate::policy::suppression::ClassifiedFailure;
use crate::state::RequestState;

/// Terminal states of one submission, for observability.
#[derive(Debug, Clone, Copy)]
enum Disposition {
    Succeeded,
    FailedNoFallback,
    FailedWithFallbackSucceeded,
    FailedWithFallbackFailed,
}

/// Wraps one unit of work plus its policy bundle into a schedulable command.
pub struct CommandExecutor {
    target: Arc<dyn Action>,
    config: Arc<CommandConfig>,
    engine: Arc<CommandEngine>,
}

impl CommandExecutor {
    pub fn new(target: Arc<dyn Action>, config: Arc<CommandConfig>) -> Self {
        let engine = Arc::new(CommandEngine::new(config.clone()));
        Self {
            target,
            config,
            engine,
        }
    }

    pub fn config(&self) -> &Arc<CommandConfig> {
        &self.config
    }

    /// Submits one unit of work. Returns as soon as execution is scheduled;
    /// `on_complete` fires later from a pool thread with the final state.
    ///
    /// Synchronous errors are configuration faults only: an invalid
    /// configuration fails here without scheduling anything. All other
    /// failures travel on the state's failure slot.
    pub fn submit(&self, mut state: RequestState, on_complete: CompletionFn) -> Result<()> {
        self.config.validate_and_init()?;

        let ctx = ensure_context_present(&mut state, &self.config);

        let completion = Completion::new();
        completion.install(on_complete);

        let target = self.target.clone();
        let config = self.config.clone();
        let engine = self.engine.clone();
        let fallback = self.config.actual_fallback();

        tokio::spawn(async move {
            let key = cache::compute_key(&state, &config);

            match engine.dispatch(&ctx, key.as_deref(), target, state).await {
                Dispatch::CacheHit { mut state, snapshot } => {
                    cache::apply_cache_hit(&mut state, &snapshot, &config);
                    finish(&config, Disposition::Succeeded, true, &completion, state);
                }
                Dispatch::Ran { state, failure: None } => {
                    finish(&config, Disposition::Succeeded, false, &completion, state);
                }
                Dispatch::Ran {
                    mut state,
                    failure: Some(classified),
                } => match classified {
                    ClassifiedFailure::Suppressed(original) => {
                        // propagates verbatim, fallback must not run
                        state.set_failure(original);
                        finish(&config, Disposition::FailedNoFallback, false, &completion, state);
                    }
                    ClassifiedFailure::Passthrough(original) => match fallback {
                        None => {
                            state.set_failure(original);
                            finish(&config, Disposition::FailedNoFallback, false, &completion, state);
                        }
                        Some(fallback_action) => {
                            debug!(
                                command = config.command_name(),
                                failure = %original,
                                "Primary action failed, running fallback"
                            );
                            let (mut state, fallback_failure) =
                                engine.run_fallback(&ctx, fallback_action, state).await;
                            match fallback_failure {
                                None => finish(
                                    &config,
                                    Disposition::FailedWithFallbackSucceeded,
                                    false,
                                    &completion,
                                    state,
                                ),
                                Some(fallback_failure) => {
                                    warn!(
                                        command = config.command_name(),
                                        original = %original,
                                        fallback = %fallback_failure,
                                        "Fallback failed after primary failure"
                                    );
                                    // the fallback failure is the most specific outcome
                                    state.set_failure(fallback_failure);
                                    finish(
                                        &config,
                                        Disposition::FailedWithFallbackFailed,
                                        false,
                                        &completion,
                                        state,
                                    );
                                }
                            }
                        }
                    },
                },
            }
        });

        Ok(())
    }
}

fn finish(
    config: &CommandConfig,
    disposition: Disposition,
    from_cache: bool,
    completion: &Completion,
    state: RequestState,
) {
    debug!(
        command = config.command_name(),
        disposition = ?disposition,
        from_cache,
        "Command completed"
    );
    completion.fire(state);
}
