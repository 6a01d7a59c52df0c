//! # Exception Suppression Policy
//!
//! Classifies whether a failure must bypass fallback entirely and propagate
//! verbatim. Classification happens strictly before fallback substitution is
//! considered, and the engine does not count suppressed failures against the
//! circuit: they are request errors, not system errors.

use std::collections::HashSet;

use crate::state::Failure;

/// The set of failure kinds that bypass fallback.
///
/// Matching is by exact kind.
#[derive(Debug, Clone, Default)]
pub struct SuppressionPolicy {
    kinds: HashSet<String>,
}

impl SuppressionPolicy {
    pub fn new(kinds: HashSet<String>) -> Self {
        Self { kinds }
    }

    pub fn suppresses(&self, failure: &Failure) -> bool {
        self.kinds.contains(&failure.kind)
    }

    /// Wraps the failure in its classification.
    pub fn classify(&self, failure: Failure) -> ClassifiedFailure {
        if self.suppresses(&failure) {
            ClassifiedFailure::Suppressed(failure)
        } else {
            ClassifiedFailure::Passthrough(failure)
        }
    }
}

/// A failure tagged with its suppression classification.
#[derive(Debug, Clone)]
pub enum ClassifiedFailure {
    /// Must bypass fallback; propagated to the caller as the original.
    Suppressed(Failure),
    /// Ordinary failure, eligible for one fallback attempt.
    Passthrough(Failure),
}

impl ClassifiedFailure {
    pub fn is_suppressed(&self) -> bool {
        matches!(self, ClassifiedFailure::Suppressed(_))
    }

    /// Unwraps back to the original failure. Idempotent by construction:
    /// the original is carried unchanged in either variant.
    pub fn into_original(self) -> Failure {
        match self {
            ClassifiedFailure::Suppressed(f) | ClassifiedFailure::Passthrough(f) => f,
        }
    }
}
