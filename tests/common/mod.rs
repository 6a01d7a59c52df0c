//! Shared fixtures for integration tests.
#![allow(dead_code)] // not every test binary uses every fixture

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use breakwater::{Action, CacheKeyFn, Failure, RequestState};

/// Target that writes "Hello World {n}" with an incrementing counter, so
/// tests can tell a fresh execution from a cached one.
pub fn counting_target() -> Arc<dyn Action> {
    let calls = AtomicUsize::new(0);
    Arc::new(move |state: &mut RequestState| -> Result<(), Failure> {
        let n = calls.fetch_add(1, Ordering::SeqCst);
        state.set_payload(format!("Hello World {n}"));
        Ok(())
    }) as Arc<dyn Action>
}

/// Fallback that writes "Hello Fallback".
pub fn fallback_target() -> Arc<dyn Action> {
    Arc::new(|state: &mut RequestState| -> Result<(), Failure> {
        state.set_payload("Hello Fallback");
        Ok(())
    }) as Arc<dyn Action>
}

/// Target that always fails by returning the failure.
pub fn failing_target(kind: &str) -> Arc<dyn Action> {
    let kind = kind.to_string();
    Arc::new(move |_: &mut RequestState| -> Result<(), Failure> { Err(Failure::new(kind.clone(), "Bang!")) })
        as Arc<dyn Action>
}

/// Target that always fails by setting the failure on the state.
pub fn failure_setting_target(kind: &str) -> Arc<dyn Action> {
    let kind = kind.to_string();
    Arc::new(move |state: &mut RequestState| -> Result<(), Failure> {
        state.set_failure(Failure::new(kind.clone(), "Bang!"));
        Ok(())
    }) as Arc<dyn Action>
}

/// Cache key derived from the payload string.
pub fn payload_key() -> CacheKeyFn {
    Arc::new(|state: &RequestState| state.payload_str().map(String::from))
}

pub fn init_logging() {
    breakwater::logging::init_structured_logging();
}
