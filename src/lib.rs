#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Breakwater
//!
//! Circuit-breaker guarded command execution core: wraps an arbitrary unit
//! of work in a supervised, asynchronously-executed command with fallback
//! substitution, per-key response caching, request-scoped context
//! propagation across threads, and exception-based fallback suppression.
//!
//! ## Architecture
//!
//! A caller submits a unit of work plus a [`RequestState`]. The submitting
//! thread is guaranteed a [`RequestContext`] (new or propagated through the
//! state's reserved metadata slot), then the command is scheduled on the
//! engine: a cache hit merges the cached snapshot into the live state and
//! completes immediately; a miss runs the work on a pool thread behind a
//! circuit breaker and a deadline. On failure, the suppression policy is
//! consulted before any fallback — suppressed failures propagate verbatim,
//! everything else gets exactly one fallback attempt. Completion fires
//! exactly once per submission, always via the state's failure slot rather
//! than across the asynchronous boundary.
//!
//! ## Module Organization
//!
//! - [`state`] - the mutable request state commands operate on
//! - [`context`] - request-context handles and explicit thread attachment
//! - [`config`] - per-command policy bundle and fail-fast validation
//! - [`policy`] - fallback resolution and failure suppression
//! - [`cache`] - cache-key derivation and post-hit reconciliation
//! - [`engine`] - the execution primitive: pooling, cache store, deadline, circuit breaker
//! - [`command`] - the executor state machine and the single-use completion guard
//! - [`delegate`] - processor- and producer-shaped consumer adapters
//! - [`registry`] - injected target resolution
//! - [`wrappers`] - fluent builder DSL
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use breakwater::{Action, AsyncProcessor, Failure, RequestState, Wrappers};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let target = Arc::new(|state: &mut RequestState| {
//!         state.set_payload("pong");
//!         Ok::<(), Failure>(())
//!     }) as Arc<dyn Action>;
//!
//!     let processor = Wrappers::new().for_action("ping", target).build()?;
//!
//!     let mut state = RequestState::with_payload("ping");
//!     processor.process(&mut state).await?;
//!     assert_eq!(state.payload_str(), Some("pong"));
//!     Ok(())
//! }
//! ```

pub mod action;
pub mod cache;
pub mod command;
pub mod config;
pub mod context;
pub mod delegate;
pub mod engine;
pub mod error;
pub mod logging;
pub mod policy;
pub mod registry;
pub mod state;
pub mod wrappers;

pub use action::Action;
pub use cache::{CacheKeyFn, MergeStrategy};
pub use command::{CommandExecutor, Completion, CompletionFn};
pub use config::{CommandConfig, CommandConfigBuilder, EngineSettings};
pub use context::{ensure_context_present, ContextScope, RequestContext};
pub use delegate::{AsyncProcessor, GuardedProcessor, GuardedProducer};
pub use engine::{
    CircuitState, CommandEngine, CIRCUIT_OPEN_KIND, EXECUTION_TIMEOUT_KIND, WORKER_PANIC_KIND,
};
pub use error::{BreakwaterError, Result};
pub use policy::{ClassifiedFailure, FallbackMode, SuppressionPolicy};
pub use registry::{ActionRegistry, TargetResolver};
pub use state::{Failure, MetadataValue, RequestState, REQUEST_CONTEXT_SLOT};
pub use wrappers::Wrappers;
