//! # Delegate Adapters
//!
//! Two thin consumer-facing shapes around [`CommandExecutor`]: a
//! processor-like filter wrapping a unit of work directly
//! ([`GuardedProcessor`]), and an endpoint-like producer forwarding to a
//! fixed target resolved once at creation ([`GuardedProducer`]). Neither
//! introduces policy of its own — pure call-through.
//!
//! Both support the consumer contract twice over: a blocking convenience
//! (`process`, which awaits completion and surfaces the final failure as an
//! error) and the asynchronous form (`process_async`, which always returns
//! `Ok(false)` because completion is deferred to the callback; failures are
//! then observed on the state's failure slot).

pub mod processor;
pub mod producer;

use async_trait::async_trait;

use crate::command::executor::CommandExecutor;
use crate::command::CompletionFn;
use crate::error::{BreakwaterError, Result};
use crate::state::RequestState;

pub use processor::GuardedProcessor;
pub use producer::GuardedProducer;

/// The consumer-facing processing contract.
#[async_trait]
pub trait AsyncProcessor: Send + Sync {
    /// Blocking convenience over the asynchronous form: awaits completion,
    /// writes the final state back, and surfaces the final failure (if any)
    /// as an error. The failure also remains on the state's failure slot.
    async fn process(&self, state: &mut RequestState) -> Result<()>;

    /// Asynchronous form: schedules the work and returns immediately.
    /// Always `Ok(false)` — completion is deferred to `on_complete`.
    /// Synchronous errors are pre-scheduling configuration faults only.
    fn process_async(&self, state: RequestState, on_complete: CompletionFn) -> Result<bool>;
}

/// Shared blocking-wrapper implementation for both delegates.
pub(crate) async fn process_and_wait(
    executor: &CommandExecutor,
    state: &mut RequestState,
) -> Result<()> {
    // configuration faults must surface before the state is taken; a failed
    // submit would otherwise leave the caller holding a defaulted state
    executor.config().validate_and_init()?;

    let (tx, rx) = tokio::sync::oneshot::channel();

    let submitted = std::mem::take(state);
    executor.submit(
        submitted,
        Box::new(move |done| {
            let _ = tx.send(done);
        }),
    )?;

    let done = rx
        .await
        .map_err(|_| BreakwaterError::Execution("completion callback dropped without firing".into()))?;
    *state = done;

    match state.failure() {
        Some(failure) => Err(BreakwaterError::Command(failure.clone())),
        None => Ok(()),
    }
}
