//! Processor-shaped delegate: wraps a unit-of-work value directly.

use std::sync::Arc;

use async_trait::async_trait;

use crate::action::Action;
use crate::command::executor::CommandExecutor;
use crate::command::CompletionFn;
use crate::config::CommandConfig;
use crate::delegate::{process_and_wait, AsyncProcessor};
use crate::error::Result;
use crate::state::RequestState;

/// Guards an arbitrary unit of work behind the command core.
pub struct GuardedProcessor {
    executor: CommandExecutor,
}

impl GuardedProcessor {
    pub fn new(target: Arc<dyn Action>, config: Arc<CommandConfig>) -> Self {
        Self {
            executor: CommandExecutor::new(target, config),
        }
    }

    /// Forces configuration validation. Call before first use.
    pub fn start(&self) -> Result<()> {
        self.executor.config().validate_and_init()
    }

    /// No teardown required.
    pub fn stop(&self) {}
}

#[async_trait]
impl AsyncProcessor for GuardedProcessor {
    async fn process(&self, state: &mut RequestState) -> Result<()> {
        process_and_wait(&self.executor, state).await
    }

    fn process_async(&self, state: RequestState, on_complete: CompletionFn) -> Result<bool> {
        self.executor.submit(state, on_complete)?;
        Ok(false)
    }
}
