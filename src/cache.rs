//! # Result Cache Policy
//!
//! Keyed, command-scoped memoization of prior results. This layer supplies
//! two things only: the cache key derived from request content, and the
//! post-hit reconciliation that merges a cached snapshot into the live
//! state. Storage and eviction live in the execution engine, keyed by
//! `(command, context id, key)`.
//!
//! On a cache hit the unit of work is never invoked, and cached snapshots
//! are never exposed directly: they are always merged or copied into the
//! live state.

use std::sync::Arc;

use tracing::debug;

use crate::config::CommandConfig;
use crate::state::RequestState;

/// Derives a cache key from request content. Returning `None` skips caching
/// for that submission.
pub type CacheKeyFn = Arc<dyn Fn(&RequestState) -> Option<String> + Send + Sync>;

/// Reconciles a cached snapshot (second argument) into the live state
/// (first argument).
pub type MergeStrategy = Arc<dyn Fn(&mut RequestState, &RequestState) + Send + Sync>;

/// The cache key for this submission, or `None` when the configuration has
/// no cache-key function (every invocation is then distinct).
pub fn compute_key(state: &RequestState, config: &CommandConfig) -> Option<String> {
    config.cache_key_fn().and_then(|key_fn| key_fn(state))
}

/// Applies the post-hit merge: the configured strategy if one is set,
/// otherwise the default copy-results merge (payload, headers, failure
/// overwritten from the snapshot).
pub fn apply_cache_hit(live: &mut RequestState, snapshot: &RequestState, config: &CommandConfig) {
    match config.cache_merge_strategy() {
        Some(strategy) => strategy(live, snapshot),
        None => live.copy_results_from(snapshot),
    }
    debug!(command = config.command_name(), "Cached result merged into live state");
}
