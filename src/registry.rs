//! # Target Resolution
//!
//! Named downstream targets are looked up through an explicit, injected
//! [`TargetResolver`] — never a hidden global scan — which keeps the command
//! core testable in isolation. [`ActionRegistry`] is the in-memory
//! implementation used by producers and fallback-target resolution.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use crate::action::Action;
use crate::error::{BreakwaterError, Result};

/// Resolves a target name to the action that forwards to it.
pub trait TargetResolver: Send + Sync {
    fn resolve(&self, name: &str) -> Result<Arc<dyn Action>>;
}

/// In-memory name → action registry.
#[derive(Default)]
pub struct ActionRegistry {
    actions: RwLock<HashMap<String, Arc<dyn Action>>>,
}

impl ActionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an action under a name, replacing any previous binding.
    pub fn register(&self, name: impl Into<String>, action: Arc<dyn Action>) {
        let name = name.into();
        debug!(target = %name, "Action registered");
        self.actions.write().insert(name, action);
    }

    pub fn len(&self) -> usize {
        self.actions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.read().is_empty()
    }
}

impl TargetResolver for ActionRegistry {
    fn resolve(&self, name: &str) -> Result<Arc<dyn Action>> {
        self.actions
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| BreakwaterError::UnknownTarget(name.to_string()))
    }
}
