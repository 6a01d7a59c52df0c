//! # Fallback Policy
//!
//! Resolves which substitute action runs when a primary action fails: none,
//! a fixed secondary action, or a fixed secondary target looked up through
//! the injected [`TargetResolver`](crate::registry::TargetResolver).
//!
//! The mode is a tagged variant rather than a runtime type check, resolved
//! once at validation into a nullable callable.

use std::sync::Arc;

use crate::action::Action;
use crate::registry::TargetResolver;

/// Declared fallback mode for a command configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FallbackMode {
    /// No fallback: primary failures propagate to the caller.
    #[default]
    None,
    /// A fixed secondary action bound directly on the configuration.
    Action,
    /// A fixed secondary target, resolved by name at validation time.
    Target,
}

/// Validates the mode/binding combination and resolves the actual fallback.
///
/// Returns `Ok(None)` for mode [`FallbackMode::None`], `Ok(Some(action))`
/// for a valid binding, and an error message for contradictory declarations.
pub fn resolve_fallback(
    mode: FallbackMode,
    action: Option<&Arc<dyn Action>>,
    target: Option<&str>,
    resolver: Option<&dyn TargetResolver>,
) -> Result<Option<Arc<dyn Action>>, String> {
    match mode {
        FallbackMode::None => {
            if action.is_some() || target.is_some() {
                Err("Fallback mode is 'none' but a fallback action or target was provided".into())
            } else {
                Ok(None)
            }
        }
        FallbackMode::Action => match action {
            Some(action) => Ok(Some(Arc::clone(action))),
            None => Err("Fallback mode is 'action' but no fallback action was provided".into()),
        },
        FallbackMode::Target => {
            let target = target
                .ok_or_else(|| String::from("Fallback mode is 'target' but no fallback target was provided"))?;
            let resolver = resolver.ok_or_else(|| {
                format!("Fallback target '{target}' declared but no resolver was injected")
            })?;
            resolver
                .resolve(target)
                .map(Some)
                .map_err(|e| format!("Fallback target '{target}' could not be resolved: {e}"))
        }
    }
}
