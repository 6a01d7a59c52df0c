//! # Command Configuration
//!
//! [`CommandConfig`] fixes the policy bundle for one logical command class:
//! fallback mode and its action/target reference, the optional cache-key
//! function and merge strategy, the context-propagation flag, the fallback
//! suppression set, and the engine settings for the execution primitive.
//!
//! A configuration is immutable once execution starts. Validation is fail
//! fast and runs exactly once per instance ([`CommandConfig::validate_and_init`]);
//! it also resolves the actual fallback callable once, caching it for the
//! configuration's lifetime.

use std::collections::HashSet;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use tracing::debug;

use crate::action::Action;
use crate::cache::{CacheKeyFn, MergeStrategy};
use crate::error::{BreakwaterError, Result};
use crate::policy::fallback::{resolve_fallback, FallbackMode};
use crate::policy::suppression::SuppressionPolicy;
use crate::registry::TargetResolver;

/// Settings handed to the execution engine for one command.
///
/// Follows the circuit-breaker shape: consecutive-failure threshold to open,
/// open timeout before probing recovery, successes required to close again,
/// plus the per-execution deadline.
#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub failure_threshold: u32,
    pub open_timeout: Duration,
    pub success_threshold: u32,
    pub execution_timeout: Duration,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            open_timeout: Duration::from_secs(30),
            success_threshold: 2,
            execution_timeout: Duration::from_secs(10),
        }
    }
}

type ResolvedFallback = std::result::Result<Option<Arc<dyn Action>>, String>;

/// Immutable policy bundle for one logical command class.
pub struct CommandConfig {
    command_name: String,
    fallback_mode: FallbackMode,
    fallback_action: Option<Arc<dyn Action>>,
    fallback_target: Option<String>,
    resolver: Option<Arc<dyn TargetResolver>>,
    cache_key_fn: Option<CacheKeyFn>,
    cache_merge_strategy: Option<MergeStrategy>,
    propagate_request_context: bool,
    suppression: SuppressionPolicy,
    engine: EngineSettings,
    resolved: OnceLock<ResolvedFallback>,
}

impl CommandConfig {
    pub fn builder(command_name: impl Into<String>) -> CommandConfigBuilder {
        CommandConfigBuilder::new(command_name)
    }

    pub fn command_name(&self) -> &str {
        &self.command_name
    }

    pub fn fallback_mode(&self) -> FallbackMode {
        self.fallback_mode
    }

    pub fn cache_key_fn(&self) -> Option<&CacheKeyFn> {
        self.cache_key_fn.as_ref()
    }

    pub fn cache_merge_strategy(&self) -> Option<&MergeStrategy> {
        self.cache_merge_strategy.as_ref()
    }

    pub fn propagate_request_context(&self) -> bool {
        self.propagate_request_context
    }

    pub fn suppression(&self) -> &SuppressionPolicy {
        &self.suppression
    }

    pub fn engine(&self) -> &EngineSettings {
        &self.engine
    }

    /// Validates the fallback declaration and resolves the actual fallback
    /// callable. Runs the work once; later calls return the recorded outcome.
    ///
    /// Rules:
    /// - mode `Action` requires a bound fallback action;
    /// - mode `Target` requires a bound target name and a resolver;
    /// - mode `None` forbids both (ambiguous intent).
    pub fn validate_and_init(&self) -> Result<()> {
        let outcome = self.resolved.get_or_init(|| {
            let resolved = resolve_fallback(
                self.fallback_mode,
                self.fallback_action.as_ref(),
                self.fallback_target.as_deref(),
                self.resolver.as_deref(),
            );
            if resolved.is_ok() {
                debug!(
                    command = %self.command_name,
                    fallback_mode = ?self.fallback_mode,
                    "Command configuration validated"
                );
            }
            resolved
        });
        match outcome {
            Ok(_) => Ok(()),
            Err(msg) => Err(BreakwaterError::Configuration(msg.clone())),
        }
    }

    /// The resolved fallback callable, if validation succeeded and a
    /// fallback is configured. `None` before validation or for mode `None`.
    pub fn actual_fallback(&self) -> Option<Arc<dyn Action>> {
        self.resolved
            .get()
            .and_then(|outcome| outcome.as_ref().ok())
            .and_then(Clone::clone)
    }
}

/// Fluent builder for [`CommandConfig`].
pub struct CommandConfigBuilder {
    command_name: String,
    fallback_mode: FallbackMode,
    fallback_action: Option<Arc<dyn Action>>,
    fallback_target: Option<String>,
    resolver: Option<Arc<dyn TargetResolver>>,
    cache_key_fn: Option<CacheKeyFn>,
    cache_merge_strategy: Option<MergeStrategy>,
    propagate_request_context: bool,
    suppressed_kinds: HashSet<String>,
    engine: EngineSettings,
}

impl CommandConfigBuilder {
    fn new(command_name: impl Into<String>) -> Self {
        Self {
            command_name: command_name.into(),
            fallback_mode: FallbackMode::None,
            fallback_action: None,
            fallback_target: None,
            resolver: None,
            cache_key_fn: None,
            cache_merge_strategy: None,
            propagate_request_context: true,
            suppressed_kinds: HashSet::new(),
            engine: EngineSettings::default(),
        }
    }

    /// Binds a fixed fallback action and selects mode `Action`.
    pub fn fallback_action(mut self, action: Arc<dyn Action>) -> Self {
        self.fallback_mode = FallbackMode::Action;
        self.fallback_action = Some(action);
        self
    }

    /// Binds a fallback target name and selects mode `Target`. The name is
    /// resolved through the injected resolver at validation time.
    pub fn fallback_target(mut self, target: impl Into<String>) -> Self {
        self.fallback_mode = FallbackMode::Target;
        self.fallback_target = Some(target.into());
        self
    }

    /// Overrides the fallback mode without touching the bound references.
    /// Validation rejects contradictory combinations.
    pub fn fallback_mode(mut self, mode: FallbackMode) -> Self {
        self.fallback_mode = mode;
        self
    }

    pub fn resolver(mut self, resolver: Arc<dyn TargetResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    pub fn cache_key(mut self, key_fn: CacheKeyFn) -> Self {
        self.cache_key_fn = Some(key_fn);
        self
    }

    pub fn cache_merge_strategy(mut self, strategy: MergeStrategy) -> Self {
        self.cache_merge_strategy = Some(strategy);
        self
    }

    pub fn propagate_request_context(mut self, propagate: bool) -> Self {
        self.propagate_request_context = propagate;
        self
    }

    /// Registers a failure kind that bypasses fallback entirely.
    pub fn suppress_fallback_for(mut self, kind: impl Into<String>) -> Self {
        self.suppressed_kinds.insert(kind.into());
        self
    }

    pub fn engine_settings(mut self, settings: EngineSettings) -> Self {
        self.engine = settings;
        self
    }

    pub fn build(self) -> CommandConfig {
        CommandConfig {
            command_name: self.command_name,
            fallback_mode: self.fallback_mode,
            fallback_action: self.fallback_action,
            fallback_target: self.fallback_target,
            resolver: self.resolver,
            cache_key_fn: self.cache_key_fn,
            cache_merge_strategy: self.cache_merge_strategy,
            propagate_request_context: self.propagate_request_context,
            suppression: SuppressionPolicy::new(self.suppressed_kinds),
            engine: self.engine,
            resolved: OnceLock::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::ActionRegistry;
    use crate::state::RequestState;

    fn noop_action() -> Arc<dyn Action> {
        Arc::new(|_: &mut RequestState| -> std::result::Result<(), crate::state::Failure> { Ok(()) })
            as Arc<dyn Action>
    }

    #[test]
    fn none_mode_without_bindings_is_valid() {
        let config = CommandConfig::builder("cfg").build();
        assert!(config.validate_and_init().is_ok());
        assert!(config.actual_fallback().is_none());
    }

    #[test]
    fn action_mode_resolves_bound_action() {
        let config = CommandConfig::builder("cfg")
            .fallback_action(noop_action())
            .build();
        assert!(config.validate_and_init().is_ok());
        assert!(config.actual_fallback().is_some());
    }

    #[test]
    fn action_mode_without_action_fails() {
        let config = CommandConfig::builder("cfg")
            .fallback_mode(FallbackMode::Action)
            .build();
        assert!(matches!(
            config.validate_and_init(),
            Err(BreakwaterError::Configuration(_))
        ));
    }

    #[test]
    fn none_mode_with_action_bound_fails() {
        let config = CommandConfig::builder("cfg")
            .fallback_action(noop_action())
            .fallback_mode(FallbackMode::None)
            .build();
        assert!(matches!(
            config.validate_and_init(),
            Err(BreakwaterError::Configuration(_))
        ));
    }

    #[test]
    fn target_mode_without_resolver_fails() {
        let config = CommandConfig::builder("cfg")
            .fallback_target("degraded")
            .build();
        assert!(matches!(
            config.validate_and_init(),
            Err(BreakwaterError::Configuration(_))
        ));
    }

    #[test]
    fn target_mode_resolves_through_registry() {
        let registry = ActionRegistry::new();
        registry.register("degraded", noop_action());

        let config = CommandConfig::builder("cfg")
            .fallback_target("degraded")
            .resolver(Arc::new(registry))
            .build();
        assert!(config.validate_and_init().is_ok());
        assert!(config.actual_fallback().is_some());
    }

    #[test]
    fn target_mode_with_unknown_target_fails() {
        let config = CommandConfig::builder("cfg")
            .fallback_target("missing")
            .resolver(Arc::new(ActionRegistry::new()))
            .build();
        assert!(matches!(
            config.validate_and_init(),
            Err(BreakwaterError::Configuration(_))
        ));
    }

    #[test]
    fn validation_outcome_is_sticky() {
        let config = CommandConfig::builder("cfg")
            .fallback_mode(FallbackMode::Action)
            .build();
        assert!(config.validate_and_init().is_err());
        // the recorded outcome does not change on re-validation
        assert!(config.validate_and_init().is_err());
    }
}
