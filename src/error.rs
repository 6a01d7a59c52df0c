//! Structured error handling for the command core.
//!
//! Failures that cross the asynchronous boundary are never represented here;
//! they travel on the [`RequestState`](crate::state::RequestState) failure
//! slot as [`Failure`] values and are observed through the completion
//! callback. `BreakwaterError` covers the synchronous surface only:
//! configuration faults, resolver misses, and misuse detected before any
//! work is scheduled.

use crate::state::Failure;

#[derive(Debug, thiserror::Error)]
pub enum BreakwaterError {
    /// Invalid command configuration, detected once at validation and fatal.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A target name could not be resolved through the injected resolver.
    #[error("Unknown target '{0}'")]
    UnknownTarget(String),

    /// The execution machinery misbehaved (e.g. a completion channel was
    /// dropped without firing).
    #[error("Execution error: {0}")]
    Execution(String),

    /// Final command failure, surfaced by the blocking convenience wrapper.
    /// The same failure remains observable on the state's failure slot.
    #[error("Command failed: {0}")]
    Command(#[from] Failure),
}

pub type Result<T> = std::result::Result<T, BreakwaterError>;
