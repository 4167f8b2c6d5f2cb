use std::sync::Arc;

use serde_json::json;
use serde_json::Value;
use tracing_test::traced_test;

use super::*;
use crate::test_utils::mount;
use crate::test_utils::runtime_with_config;
use crate::test_utils::runtime_with_transport;
use crate::test_utils::test_runtime;
use crate::test_utils::Recorder;
use crate::MockTransport;
use crate::WireConfig;

#[test]
fn first_evaluation_does_not_fire() {
    let runtime = test_runtime();
    let component = mount(&runtime, "c", 1, json!({ "count": 0 }));
    let recorder = Recorder::new();

    runtime.wire(&component).watch("count", recorder.callback()).unwrap();
    runtime.flush();

    assert_eq!(recorder.len(), 0);
    assert_eq!(component.watcher_count(), 1);
}

#[test]
fn changes_within_one_pass_are_coalesced() {
    let runtime = test_runtime();
    let component = mount(&runtime, "c", 1, json!({ "count": "A" }));
    let recorder = Recorder::new();
    runtime.wire(&component).watch("count", recorder.callback()).unwrap();

    component.reactive().set("count", json!("B"));
    component.reactive().set("count", json!("C"));
    assert_eq!(recorder.len(), 0);

    runtime.flush();

    assert_eq!(recorder.calls(), vec![(json!("C"), json!("A"))]);
}

#[test]
fn consecutive_passes_report_previous_values() {
    let runtime = test_runtime();
    let component = mount(&runtime, "c", 1, json!({ "count": 1 }));
    let recorder = Recorder::new();
    runtime.wire(&component).watch("count", recorder.callback()).unwrap();

    component.reactive().set("count", json!(2));
    runtime.flush();
    component.reactive().set("count", json!(3));
    runtime.flush();

    assert_eq!(recorder.calls(), vec![(json!(2), json!(1)), (json!(3), json!(2))]);
}

#[test]
fn writing_the_same_value_does_not_fire() {
    let runtime = test_runtime();
    let component = mount(&runtime, "c", 1, json!({ "count": 5, "form": { "title": "a" } }));
    let count = Recorder::new();
    let form = Recorder::new();
    let wire = runtime.wire(&component);
    wire.watch("count", count.callback()).unwrap();
    wire.watch("form", form.callback()).unwrap();

    component.reactive().set("count", json!(5));
    component.reactive().set("form.title", json!("a"));
    runtime.flush();

    assert_eq!(count.len(), 0);
    assert_eq!(form.len(), 0);
    assert!(runtime.scheduler().is_idle());
}

#[test]
fn nested_mutations_fire_deep_watchers() {
    let runtime = test_runtime();
    let component = mount(&runtime, "c", 1, json!({ "form": { "title": "a", "tags": [] } }));
    let recorder = Recorder::new();
    runtime.wire(&component).watch("form", recorder.callback()).unwrap();

    component.reactive().set("form.title", json!("b"));
    runtime.flush();
    component.reactive().set("form.tags.0", json!("x"));
    runtime.flush();

    let calls = recorder.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].0, json!({ "title": "b", "tags": [] }));
    assert_eq!(calls[0].1, json!({ "title": "a", "tags": [] }));
    assert_eq!(calls[1].0, json!({ "title": "b", "tags": ["x"] }));
}

#[test]
fn shallow_watchers_ignore_nested_mutations() {
    let mut config = WireConfig::default();
    config.watch.deep = false;
    let runtime = runtime_with_config(config);
    let component = mount(&runtime, "c", 1, json!({ "form": { "title": "a" } }));
    let recorder = Recorder::new();
    runtime.wire(&component).watch("form", recorder.callback()).unwrap();

    component.reactive().set("form.title", json!("b"));
    runtime.flush();
    assert_eq!(recorder.len(), 0);

    component.reactive().set("form", json!({ "title": "c" }));
    runtime.flush();
    assert_eq!(recorder.calls(), vec![(json!({ "title": "c" }), json!({ "title": "a" }))]);
}

#[test]
fn watching_a_missing_path_fires_once_it_appears() {
    let runtime = test_runtime();
    let component = mount(&runtime, "c", 1, json!({}));
    let recorder = Recorder::new();
    runtime.wire(&component).watch("profile.name", recorder.callback()).unwrap();

    component.reactive().set("profile.name", json!("Ada"));
    runtime.flush();

    assert_eq!(recorder.calls(), vec![(json!("Ada"), Value::Null)]);
}

#[test]
fn independent_watchers_keep_separate_state() {
    let runtime = test_runtime();
    let component = mount(&runtime, "c", 1, json!({ "count": 0 }));
    let wire = runtime.wire(&component);
    let early = Recorder::new();
    let late = Recorder::new();

    wire.watch("count", early.callback()).unwrap();
    component.reactive().set("count", json!(1));
    runtime.flush();
    wire.watch("count", late.callback()).unwrap();
    component.reactive().set("count", json!(2));
    runtime.flush();

    assert_eq!(early.calls(), vec![(json!(1), json!(0)), (json!(2), json!(1))]);
    assert_eq!(late.calls(), vec![(json!(2), json!(1))]);
}

#[test]
fn callback_writes_to_its_own_path_settle() {
    let runtime = test_runtime();
    let component = mount(&runtime, "c", 1, json!({ "count": 0 }));
    let recorder = Recorder::new();
    let record = recorder.callback();
    let state = component.reactive().clone();
    runtime
        .wire(&component)
        .watch("count", move |new, old| {
            record(new.clone(), old);
            if let Some(n) = new.as_i64().filter(|n| *n < 3) {
                state.set("count", json!(n + 1));
            }
        })
        .unwrap();

    component.reactive().set("count", json!(1));
    runtime.flush();

    assert_eq!(
        recorder.calls(),
        vec![(json!(1), json!(0)), (json!(2), json!(1)), (json!(3), json!(2))]
    );
    assert!(runtime.scheduler().is_idle());
}

#[test]
#[traced_test]
fn runaway_watchers_are_capped_per_drain() {
    let mut config = WireConfig::default();
    config.watch.max_flush_tasks = 4;
    let runtime = runtime_with_config(config);
    let component = mount(&runtime, "c", 1, json!({ "count": 0 }));
    let state = component.reactive().clone();
    runtime
        .wire(&component)
        .watch("count", move |new, _old| {
            state.set("count", json!(new.as_i64().unwrap_or(0) + 1));
        })
        .unwrap();

    component.reactive().set("count", json!(1));
    let ran = runtime.flush();

    assert!(ran <= 4);
    assert!(!runtime.scheduler().is_idle());
    assert!(logs_contain("task limit"));

    runtime.teardown_component(&component);
    runtime.flush();
}

#[test]
fn panicking_callback_does_not_stall_other_watchers() {
    let runtime = test_runtime();
    let component = mount(&runtime, "c", 1, json!({ "a": 0, "b": 0 }));
    let recorder = Recorder::new();
    let wire = runtime.wire(&component);
    wire.watch("a", |_new, _old| panic!("callback failed")).unwrap();
    wire.watch("b", recorder.callback()).unwrap();

    component.reactive().set("a", json!(1));
    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| runtime.flush()));
    assert!(result.is_err());

    component.reactive().set("b", json!(1));
    runtime.flush();

    assert_eq!(recorder.calls(), vec![(json!(1), json!(0))]);
}

#[test]
fn teardown_stops_watchers() {
    let runtime = test_runtime();
    let component = mount(&runtime, "c", 1, json!({ "count": 0 }));
    let recorder = Recorder::new();
    runtime.wire(&component).watch("count", recorder.callback()).unwrap();

    component.teardown();
    component.reactive().set("count", json!(1));
    runtime.flush();

    assert_eq!(recorder.len(), 0);
    assert_eq!(runtime.reactivity().effect_count(), 0);
}

#[test]
fn watch_returns_a_stoppable_handle() {
    let runtime = test_runtime();
    let component = mount(&runtime, "c", 1, json!({ "count": 0 }));
    let recorder = Recorder::new();
    let callback = recorder.callback();
    let handle = runtime.wire(&component);

    let effect = watch(
        &handle,
        "count",
        Arc::new(move |mut values: Vec<Value>| {
            let old = values.pop().unwrap_or_default();
            let new = values.pop().unwrap_or_default();
            callback(new, old)
        }),
    );
    effect.stop();
    component.reactive().set("count", json!(1));
    runtime.flush();

    assert!(effect.is_stopped());
    assert_eq!(recorder.len(), 0);
}

#[tokio::test]
async fn pending_callbacks_run_before_the_transport_is_contacted() {
    let recorder = Recorder::new();
    let observed = recorder.clone();
    let mut transport = MockTransport::new();
    transport.expect_request_commit().times(1).returning(move |_| {
        assert_eq!(observed.len(), 1);
        Ok(())
    });
    let runtime = runtime_with_transport(transport);
    let component = mount(&runtime, "c", 1, json!({ "count": 0 }));
    let wire = runtime.wire(&component);
    wire.watch("count", recorder.callback()).unwrap();

    wire.set("count", json!(1), true).await.unwrap();

    assert_eq!(recorder.calls(), vec![(json!(1), json!(0))]);
}
