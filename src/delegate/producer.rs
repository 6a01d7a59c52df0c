//! Producer-shaped delegate: forwards to a fixed named target.
//!
//! The target is resolved once at creation through the injected resolver and
//! the forwarding action is reused for every submission. One direction only;
//! there is no consumer side.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::command::executor::CommandExecutor;
use crate::command::CompletionFn;
use crate::config::CommandConfig;
use crate::delegate::{process_and_wait, AsyncProcessor};
use crate::error::Result;
use crate::registry::TargetResolver;
use crate::state::RequestState;

/// Guards submissions to a fixed downstream target.
pub struct GuardedProducer {
    target_name: String,
    executor: CommandExecutor,
}

impl GuardedProducer {
    /// Resolves `target` through the resolver and builds the producer.
    /// Resolution happens here, once; an unknown target fails creation.
    pub fn new(
        target: &str,
        resolver: &Arc<dyn TargetResolver>,
        config: Arc<CommandConfig>,
    ) -> Result<Self> {
        let action = resolver.resolve(target)?;
        debug!(target, command = config.command_name(), "Producer target resolved");
        Ok(Self {
            target_name: target.to_string(),
            executor: CommandExecutor::new(action, config),
        })
    }

    pub fn target_name(&self) -> &str {
        &self.target_name
    }

    /// Forces configuration validation. Call before first use.
    pub fn start(&self) -> Result<()> {
        self.executor.config().validate_and_init()
    }

    /// No teardown required.
    pub fn stop(&self) {}
}

#[async_trait]
impl AsyncProcessor for GuardedProducer {
    async fn process(&self, state: &mut RequestState) -> Result<()> {
        process_and_wait(&self.executor, state).await
    }

    fn process_async(&self, state: RequestState, on_complete: CompletionFn) -> Result<bool> {
        self.executor.submit(state, on_complete)?;
        Ok(false)
    }
}
