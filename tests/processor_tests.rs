//! End-to-end tests for the processor-shaped delegate: fallback behavior,
//! suppression, caching, merge strategies, and context propagation.

mod common;

use std::sync::Arc;
use std::time::Duration;

use breakwater::{
    AsyncProcessor, BreakwaterError, EngineSettings, Failure, RequestState, Wrappers,
    EXECUTION_TIMEOUT_KIND,
};

use common::{
    counting_target, failing_target, failure_setting_target, fallback_target, init_logging,
    payload_key,
};

#[tokio::test]
async fn processor_ok() {
    init_logging();
    let processor = Wrappers::new()
        .for_action("test", counting_target())
        .build()
        .unwrap();

    let mut state = RequestState::new();
    processor.process(&mut state).await.unwrap();
    assert_eq!(state.payload_str(), Some("Hello World 0"));
}

#[tokio::test]
async fn fallback_runs_when_failure_is_returned() {
    init_logging();
    let processor = Wrappers::new()
        .for_action("test", failing_target("bang"))
        .with_fallback_action(fallback_target())
        .build()
        .unwrap();

    let mut state = RequestState::new();
    processor.process(&mut state).await.unwrap();
    assert_eq!(state.payload_str(), Some("Hello Fallback"));
    assert!(state.failure().is_none());
}

#[tokio::test]
async fn fallback_runs_when_failure_is_set_on_state() {
    init_logging();
    let processor = Wrappers::new()
        .for_action("test", failure_setting_target("bang"))
        .with_fallback_action(fallback_target())
        .build()
        .unwrap();

    let mut state = RequestState::new();
    processor.process(&mut state).await.unwrap();
    assert_eq!(state.payload_str(), Some("Hello Fallback"));
}

#[tokio::test]
async fn suppressed_kind_bypasses_fallback_when_returned() {
    init_logging();
    let processor = Wrappers::new()
        .for_action("test", failing_target("dummy"))
        .with_fallback_action(fallback_target())
        .suppress_fallback_for("dummy")
        .build()
        .unwrap();

    let mut state = RequestState::new();
    let err = processor.process(&mut state).await.unwrap_err();

    // fallback did not run, and the failure is the original kind, unwrapped
    assert_ne!(state.payload_str(), Some("Hello Fallback"));
    assert_eq!(state.failure().map(|f| f.kind.as_str()), Some("dummy"));
    assert!(matches!(err, BreakwaterError::Command(_)));
}

#[tokio::test]
async fn suppressed_kind_bypasses_fallback_when_set_on_state() {
    init_logging();
    let processor = Wrappers::new()
        .for_action("test", failure_setting_target("dummy"))
        .with_fallback_action(fallback_target())
        .suppress_fallback_for("dummy")
        .build()
        .unwrap();

    let mut state = RequestState::new();
    let result = processor.process(&mut state).await;

    assert!(result.is_err());
    assert_ne!(state.payload_str(), Some("Hello Fallback"));
    assert_eq!(state.failure().map(|f| f.kind.as_str()), Some("dummy"));
}

#[tokio::test]
async fn removing_suppression_lets_fallback_run() {
    init_logging();
    let processor = Wrappers::new()
        .for_action("test", failing_target("dummy"))
        .with_fallback_action(fallback_target())
        .build()
        .unwrap();

    let mut state = RequestState::new();
    processor.process(&mut state).await.unwrap();
    assert_eq!(state.payload_str(), Some("Hello Fallback"));
}

#[tokio::test]
async fn no_fallback_surfaces_original_failure() {
    init_logging();
    let processor = Wrappers::new()
        .for_action("test", failing_target("bang"))
        .build()
        .unwrap();

    let mut state = RequestState::new();
    let result = processor.process(&mut state).await;

    assert!(result.is_err());
    assert_eq!(state.failure().map(|f| f.kind.as_str()), Some("bang"));
}

#[tokio::test]
async fn failing_fallback_surfaces_fallback_failure() {
    init_logging();
    let processor = Wrappers::new()
        .for_action("test", failing_target("bang"))
        .with_fallback_action(failing_target("fallback-bang"))
        .build()
        .unwrap();

    let mut state = RequestState::new();
    let result = processor.process(&mut state).await;

    assert!(result.is_err());
    assert_eq!(
        state.failure().map(|f| f.kind.as_str()),
        Some("fallback-bang")
    );
}

#[tokio::test]
async fn cached_result_is_replayed_for_same_key() {
    init_logging();
    let processor = Wrappers::new()
        .for_action("test", counting_target())
        .with_cache_key(payload_key())
        .build()
        .unwrap();

    let mut state = RequestState::with_payload("Hello");
    processor.process(&mut state).await.unwrap();
    assert_eq!(state.payload_str(), Some("Hello World 0"));

    state.set_payload("Hello");
    processor.process(&mut state).await.unwrap();
    // second call hits the cache; the counter never advanced
    assert_eq!(state.payload_str(), Some("Hello World 0"));
}

#[tokio::test]
async fn without_cache_key_every_call_executes() {
    init_logging();
    let processor = Wrappers::new()
        .for_action("test", counting_target())
        .build()
        .unwrap();

    let mut state = RequestState::with_payload("Hello");
    processor.process(&mut state).await.unwrap();
    assert_eq!(state.payload_str(), Some("Hello World 0"));

    state.set_payload("Hello");
    processor.process(&mut state).await.unwrap();
    assert_eq!(state.payload_str(), Some("Hello World 1"));
}

#[tokio::test]
async fn custom_merge_strategy_shapes_the_hit() {
    init_logging();
    let processor = Wrappers::new()
        .for_action("test", counting_target())
        .with_cache_key(payload_key())
        .with_cache_merge_strategy(Arc::new(
            |live: &mut RequestState, snapshot: &RequestState| {
                let merged = format!("MERGED: {}", snapshot.payload_str().unwrap_or_default());
                live.set_payload(merged);
            },
        ))
        .build()
        .unwrap();

    let mut state = RequestState::with_payload("Hello");
    processor.process(&mut state).await.unwrap();
    assert_eq!(state.payload_str(), Some("Hello World 0"));

    state.set_payload("Hello");
    processor.process(&mut state).await.unwrap();
    assert_eq!(state.payload_str(), Some("MERGED: Hello World 0"));

    // the cached value itself is unchanged: a third hit merges the same snapshot
    state.set_payload("Hello");
    processor.process(&mut state).await.unwrap();
    assert_eq!(state.payload_str(), Some("MERGED: Hello World 0"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn propagated_context_shares_cache_across_threads() {
    init_logging();
    let processor = Arc::new(
        Wrappers::new()
            .for_action("test", counting_target())
            .with_cache_key(payload_key())
            .with_propagate_request_context(true)
            .build()
            .unwrap(),
    );

    let mut state = RequestState::with_payload("Hello");
    processor.process(&mut state).await.unwrap();
    assert_eq!(state.payload_str(), Some("Hello World 0"));

    // run the second request on a different thread; the context handle
    // travels in the state's metadata slot
    let processor2 = processor.clone();
    let state = tokio::task::spawn_blocking(move || {
        tokio::runtime::Handle::current().block_on(async move {
            let mut state = state;
            state.set_payload("Hello");
            processor2.process(&mut state).await.unwrap();
            state
        })
    })
    .await
    .unwrap();

    assert_eq!(state.payload_str(), Some("Hello World 0"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn disabled_propagation_re_executes_on_other_threads() {
    init_logging();
    let processor = Arc::new(
        Wrappers::new()
            .for_action("test", counting_target())
            .with_cache_key(payload_key())
            .with_propagate_request_context(false)
            .build()
            .unwrap(),
    );

    let mut state = RequestState::with_payload("Hello");
    processor.process(&mut state).await.unwrap();
    assert_eq!(state.payload_str(), Some("Hello World 0"));

    let processor2 = processor.clone();
    let state = tokio::task::spawn_blocking(move || {
        tokio::runtime::Handle::current().block_on(async move {
            let mut state = state;
            state.set_payload("Hello");
            processor2.process(&mut state).await.unwrap();
            state
        })
    })
    .await
    .unwrap();

    // fresh context on the second thread, so the cache was not shared
    assert_eq!(state.payload_str(), Some("Hello World 1"));
}

#[tokio::test]
async fn fallback_serves_while_circuit_is_open() {
    init_logging();
    let primary_calls = Arc::new(std::sync::atomic::AtomicUsize::new(0));
    let counted = primary_calls.clone();
    let target = Arc::new(move |_: &mut RequestState| -> Result<(), Failure> {
        counted.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        Err(Failure::new("bang", "Bang!"))
    }) as Arc<dyn breakwater::Action>;

    let processor = Wrappers::new()
        .for_action("test", target)
        .with_fallback_action(fallback_target())
        .with_engine_settings(EngineSettings {
            failure_threshold: 1,
            open_timeout: Duration::from_secs(60),
            success_threshold: 1,
            execution_timeout: Duration::from_secs(5),
        })
        .build()
        .unwrap();

    // first call fails and opens the circuit; fallback serves
    let mut state = RequestState::new();
    processor.process(&mut state).await.unwrap();
    assert_eq!(state.payload_str(), Some("Hello Fallback"));

    // second call is rejected without reaching the primary; fallback serves again
    let mut state = RequestState::new();
    processor.process(&mut state).await.unwrap();
    assert_eq!(state.payload_str(), Some("Hello Fallback"));
    assert_eq!(primary_calls.load(std::sync::atomic::Ordering::SeqCst), 1);
}

#[tokio::test]
async fn deadline_overrun_becomes_a_timeout_failure() {
    init_logging();
    let target = Arc::new(|_: &mut RequestState| -> Result<(), Failure> {
        std::thread::sleep(Duration::from_millis(200));
        Ok(())
    }) as Arc<dyn breakwater::Action>;

    let processor = Wrappers::new()
        .for_action("test", target)
        .with_engine_settings(EngineSettings {
            execution_timeout: Duration::from_millis(50),
            ..EngineSettings::default()
        })
        .build()
        .unwrap();

    let mut state = RequestState::with_payload("Hello");
    let result = processor.process(&mut state).await;

    assert!(result.is_err());
    assert_eq!(
        state.failure().map(|f| f.kind.as_str()),
        Some(EXECUTION_TIMEOUT_KIND)
    );
    // the state is the pre-dispatch snapshot, not the worker's half-finished one
    assert_eq!(state.payload_str(), Some("Hello"));
}

#[tokio::test]
async fn invalid_configuration_fails_at_build() {
    init_logging();
    let result = Wrappers::new()
        .for_action("test", counting_target())
        .with_fallback_action(fallback_target())
        .suppress_fallback_for("dummy")
        .with_fallback_target("also-a-target") // contradictory: no resolver injected
        .build();

    assert!(matches!(result, Err(BreakwaterError::Configuration(_))));
}

#[tokio::test]
async fn configuration_fault_leaves_caller_state_intact() {
    init_logging();
    // construct the delegate directly, skipping start(), so the fault
    // surfaces on first use instead of at build
    let config = Arc::new(
        breakwater::CommandConfig::builder("test")
            .fallback_mode(breakwater::FallbackMode::Action)
            .build(),
    );
    let processor = breakwater::GuardedProcessor::new(counting_target(), config);

    let mut state = RequestState::with_payload("precious");
    state.set_header("k", "v");
    let result = processor.process(&mut state).await;

    assert!(matches!(result, Err(BreakwaterError::Configuration(_))));
    assert_eq!(state.payload_str(), Some("precious"));
    assert_eq!(state.header("k"), Some(&serde_json::Value::from("v")));
}

#[tokio::test]
async fn process_async_returns_not_yet_complete() {
    init_logging();
    let processor = Wrappers::new()
        .for_action("test", counting_target())
        .build()
        .unwrap();

    let (tx, rx) = tokio::sync::oneshot::channel();
    let pending = processor
        .process_async(
            RequestState::new(),
            Box::new(move |state| {
                let _ = tx.send(state);
            }),
        )
        .unwrap();
    assert!(!pending);

    let state = rx.await.unwrap();
    assert_eq!(state.payload_str(), Some("Hello World 0"));
}
