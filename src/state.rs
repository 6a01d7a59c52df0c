//! # Request State
//!
//! [`RequestState`] is the mutable message that a command operates on: a
//! payload, a header map, a failure slot, and a metadata map used for
//! machinery concerns such as request-context propagation.
//!
//! Two operations matter to the command core:
//!
//! - [`RequestState::deep_copy`] produces an independent snapshot. Cached
//!   snapshots must never be mutated by later requests, so everything the
//!   engine stores goes through this.
//! - [`RequestState::copy_results_from`] overwrites payload, headers, and
//!   failure from a source state. This is the default cache merge.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::context::RequestContext;

/// Reserved metadata slot carrying the [`RequestContext`] handle across
/// thread boundaries within one logical request. The handle written by the
/// creator must be read back verbatim by any receiver.
pub const REQUEST_CONTEXT_SLOT: &str = "breakwater.request_context";

/// A failure recorded on a [`RequestState`].
///
/// Classification (fallback suppression) is by `kind`, mirroring how the
/// suppression set is declared on the command configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct Failure {
    pub kind: String,
    pub message: String,
}

impl Failure {
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            message: message.into(),
        }
    }
}

/// Values held in the metadata map.
///
/// Metadata is machinery-facing and is deliberately not part of
/// [`RequestState::copy_results_from`]: merging a cached snapshot must not
/// clobber the live request's propagation handle.
#[derive(Debug, Clone)]
pub enum MetadataValue {
    Text(String),
    Context(RequestContext),
}

/// The in-flight message a unit of work reads and mutates in place.
#[derive(Debug, Clone, Default)]
pub struct RequestState {
    payload: Option<Value>,
    headers: HashMap<String, Value>,
    failure: Option<Failure>,
    metadata: HashMap<String, MetadataValue>,
}

impl RequestState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_payload(payload: impl Into<Value>) -> Self {
        Self {
            payload: Some(payload.into()),
            ..Self::default()
        }
    }

    pub fn payload(&self) -> Option<&Value> {
        self.payload.as_ref()
    }

    /// Payload as a string slice, when it is a JSON string.
    pub fn payload_str(&self) -> Option<&str> {
        self.payload.as_ref().and_then(Value::as_str)
    }

    pub fn set_payload(&mut self, payload: impl Into<Value>) {
        self.payload = Some(payload.into());
    }

    pub fn clear_payload(&mut self) {
        self.payload = None;
    }

    pub fn header(&self, name: &str) -> Option<&Value> {
        self.headers.get(name)
    }

    pub fn set_header(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.headers.insert(name.into(), value.into());
    }

    pub fn failure(&self) -> Option<&Failure> {
        self.failure.as_ref()
    }

    pub fn set_failure(&mut self, failure: Failure) {
        self.failure = Some(failure);
    }

    /// Removes and returns the failure, leaving the slot empty.
    pub fn take_failure(&mut self) -> Option<Failure> {
        self.failure.take()
    }

    pub fn metadata(&self, name: &str) -> Option<&MetadataValue> {
        self.metadata.get(name)
    }

    pub fn set_metadata(&mut self, name: impl Into<String>, value: MetadataValue) {
        self.metadata.insert(name.into(), value);
    }

    /// The propagation handle in the reserved metadata slot, if present.
    pub fn context_handle(&self) -> Option<RequestContext> {
        match self.metadata.get(REQUEST_CONTEXT_SLOT) {
            Some(MetadataValue::Context(ctx)) => Some(ctx.clone()),
            _ => None,
        }
    }

    pub fn set_context_handle(&mut self, ctx: RequestContext) {
        self.metadata
            .insert(REQUEST_CONTEXT_SLOT.to_string(), MetadataValue::Context(ctx));
    }

    /// An independent snapshot of this state.
    ///
    /// The snapshot shares nothing mutable with the original; the engine
    /// stores these in its result cache.
    pub fn deep_copy(&self) -> Self {
        self.clone()
    }

    /// Overwrites payload, headers, and failure from `source`.
    ///
    /// Metadata is left untouched.
    pub fn copy_results_from(&mut self, source: &RequestState) {
        self.payload = source.payload.clone();
        self.headers = source.headers.clone();
        self.failure = source.failure.clone();
    }
}
