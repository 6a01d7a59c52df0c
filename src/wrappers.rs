//! # Wrapper Builders
//!
//! Fluent DSL for wrapping units of work and named targets in guarded
//! delegates. [`Wrappers::for_action`] yields a [`GuardedProcessor`],
//! [`Wrappers::for_target`] a [`GuardedProducer`]; `build()` starts the
//! delegate, so configuration faults surface at build time.

use std::sync::Arc;

use crate::action::Action;
use crate::cache::{CacheKeyFn, MergeStrategy};
use crate::config::{CommandConfig, CommandConfigBuilder, EngineSettings};
use crate::delegate::{GuardedProcessor, GuardedProducer};
use crate::error::{BreakwaterError, Result};
use crate::registry::TargetResolver;

/// Entry point for building guarded wrappers.
#[derive(Default)]
pub struct Wrappers {
    resolver: Option<Arc<dyn TargetResolver>>,
}

impl Wrappers {
    pub fn new() -> Self {
        Self::default()
    }

    /// A wrappers factory whose builders can resolve named targets.
    pub fn with_resolver(resolver: Arc<dyn TargetResolver>) -> Self {
        Self {
            resolver: Some(resolver),
        }
    }

    /// Starts a builder around a unit of work.
    pub fn for_action(&self, command_name: &str, target: Arc<dyn Action>) -> ActionWrapperBuilder {
        let mut config = CommandConfig::builder(command_name);
        if let Some(resolver) = &self.resolver {
            config = config.resolver(resolver.clone());
        }
        ActionWrapperBuilder { target, config }
    }

    /// Starts a builder around a fixed named target.
    pub fn for_target(&self, command_name: &str, target: &str) -> TargetWrapperBuilder {
        let mut config = CommandConfig::builder(command_name);
        if let Some(resolver) = &self.resolver {
            config = config.resolver(resolver.clone());
        }
        TargetWrapperBuilder {
            target: target.to_string(),
            resolver: self.resolver.clone(),
            config,
        }
    }
}

macro_rules! builder_policy_methods {
    () => {
        pub fn with_cache_key(mut self, key_fn: CacheKeyFn) -> Self {
            self.config = self.config.cache_key(key_fn);
            self
        }

        pub fn with_cache_merge_strategy(mut self, strategy: MergeStrategy) -> Self {
            self.config = self.config.cache_merge_strategy(strategy);
            self
        }

        pub fn with_propagate_request_context(mut self, propagate: bool) -> Self {
            self.config = self.config.propagate_request_context(propagate);
            self
        }

        pub fn with_fallback_action(mut self, fallback: Arc<dyn Action>) -> Self {
            self.config = self.config.fallback_action(fallback);
            self
        }

        pub fn with_fallback_target(mut self, fallback: &str) -> Self {
            self.config = self.config.fallback_target(fallback);
            self
        }

        pub fn suppress_fallback_for(mut self, kind: &str) -> Self {
            self.config = self.config.suppress_fallback_for(kind);
            self
        }

        pub fn with_engine_settings(mut self, settings: EngineSettings) -> Self {
            self.config = self.config.engine_settings(settings);
            self
        }
    };
}

/// Builds a [`GuardedProcessor`] around a unit of work.
pub struct ActionWrapperBuilder {
    target: Arc<dyn Action>,
    config: CommandConfigBuilder,
}

impl ActionWrapperBuilder {
    builder_policy_methods!();

    /// Builds and starts the processor; configuration faults surface here.
    pub fn build(self) -> Result<GuardedProcessor> {
        let config = Arc::new(self.config.build());
        let processor = GuardedProcessor::new(self.target, config);
        processor.start()?;
        Ok(processor)
    }
}

/// Builds a [`GuardedProducer`] around a fixed named target.
pub struct TargetWrapperBuilder {
    target: String,
    resolver: Option<Arc<dyn TargetResolver>>,
    config: CommandConfigBuilder,
}

impl TargetWrapperBuilder {
    builder_policy_methods!();

    /// Builds and starts the producer; target resolution and configuration
    /// faults surface here.
    pub fn build(self) -> Result<GuardedProducer> {
        let resolver = self.resolver.ok_or_else(|| {
            BreakwaterError::Configuration(
                "a resolver is required to wrap a named target".to_string(),
            )
        })?;
        let config = Arc::new(self.config.build());
        let producer = GuardedProducer::new(&self.target, &resolver, config)?;
        producer.start()?;
        Ok(producer)
    }
}
