use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::json;
use serde_json::Value;

use super::*;

fn setup(initial: Value) -> (Reactivity, ReactiveState) {
    let reactivity = Reactivity::default();
    let state = ReactiveState::new(&reactivity, initial);
    (reactivity, state)
}

fn counting_effect(
    reactivity: &Reactivity,
    read: impl Fn() + Send + 'static,
) -> (EffectHandle, Arc<AtomicUsize>) {
    let runs = Arc::new(AtomicUsize::new(0));
    let counter = runs.clone();
    let handle = reactivity.effect(move || {
        read();
        counter.fetch_add(1, Ordering::SeqCst);
    });
    (handle, runs)
}

#[test]
fn effect_runs_immediately_once() {
    let (reactivity, state) = setup(json!({ "count": 0 }));

    let s = state.clone();
    let (_handle, runs) = counting_effect(&reactivity, move || {
        s.get("count");
    });

    assert_eq!(runs.load(Ordering::SeqCst), 1);
    assert!(reactivity.scheduler().is_idle());
}

#[test]
fn write_to_dependency_reruns_effect_after_flush() {
    let (reactivity, state) = setup(json!({ "count": 0 }));

    let s = state.clone();
    let (_handle, runs) = counting_effect(&reactivity, move || {
        s.get("count");
    });

    state.set("count", json!(1));
    assert_eq!(runs.load(Ordering::SeqCst), 1);

    reactivity.scheduler().flush();
    assert_eq!(runs.load(Ordering::SeqCst), 2);
}

#[test]
fn repeated_writes_before_flush_rerun_once() {
    let (reactivity, state) = setup(json!({ "count": 0 }));

    let s = state.clone();
    let (_handle, runs) = counting_effect(&reactivity, move || {
        s.get("count");
    });

    state.set("count", json!(1));
    state.set("count", json!(2));
    state.set("count", json!(3));
    reactivity.scheduler().flush();

    assert_eq!(runs.load(Ordering::SeqCst), 2);
}

#[test]
fn unrelated_writes_do_not_rerun_effect() {
    let (reactivity, state) = setup(json!({ "count": 0, "other": 0 }));

    let s = state.clone();
    let (_handle, runs) = counting_effect(&reactivity, move || {
        s.get("count");
    });

    state.set("other", json!(1));
    reactivity.scheduler().flush();

    assert_eq!(runs.load(Ordering::SeqCst), 1);
}

#[test]
fn shallow_read_misses_nested_mutation_but_deep_read_catches_it() {
    let (reactivity, state) = setup(json!({ "form": { "address": { "city": "Paris" } } }));

    let shallow = state.clone();
    let (_s, shallow_runs) = counting_effect(&reactivity, move || {
        shallow.get("form");
    });
    let deep = state.clone();
    let (_d, deep_runs) = counting_effect(&reactivity, move || {
        deep.get_deep("form");
    });

    state.set("form.address.city", json!("Rome"));
    reactivity.scheduler().flush();

    assert_eq!(shallow_runs.load(Ordering::SeqCst), 1);
    assert_eq!(deep_runs.load(Ordering::SeqCst), 2);
}

#[test]
fn deep_read_catches_added_keys() {
    let (reactivity, state) = setup(json!({ "tags": [] }));

    let deep = state.clone();
    let (_d, runs) = counting_effect(&reactivity, move || {
        deep.get_deep("tags");
    });

    state.set("tags.0", json!("new"));
    reactivity.scheduler().flush();

    assert_eq!(runs.load(Ordering::SeqCst), 2);
}

#[test]
fn replacing_an_ancestor_reruns_nested_readers() {
    let (reactivity, state) = setup(json!({ "user": { "name": "Alice" } }));

    let s = state.clone();
    let (_handle, runs) = counting_effect(&reactivity, move || {
        s.get("user.name");
    });

    state.set("user", json!({ "name": "Bob" }));
    reactivity.scheduler().flush();

    assert_eq!(runs.load(Ordering::SeqCst), 2);
}

#[test]
fn untracked_reads_do_not_subscribe() {
    let (reactivity, state) = setup(json!({ "count": 0 }));

    let s = state.clone();
    let r = reactivity.clone();
    let (_handle, runs) = counting_effect(&reactivity, move || {
        r.untracked(|| s.get("count"));
    });

    state.set("count", json!(1));
    reactivity.scheduler().flush();

    assert_eq!(runs.load(Ordering::SeqCst), 1);
}

#[test]
fn effect_does_not_retrigger_itself() {
    let (reactivity, state) = setup(json!({ "count": 0 }));

    let s = state.clone();
    let (_handle, runs) = counting_effect(&reactivity, move || {
        let current = s.get("count").as_i64().unwrap_or(0);
        s.set("count", json!(current + 1));
    });

    assert_eq!(reactivity.scheduler().flush(), 0);
    assert_eq!(runs.load(Ordering::SeqCst), 1);
    assert_eq!(state.peek("count"), json!(1));
}

#[test]
fn stopped_effect_never_runs_again() {
    let (reactivity, state) = setup(json!({ "count": 0 }));

    let s = state.clone();
    let (handle, runs) = counting_effect(&reactivity, move || {
        s.get("count");
    });

    state.set("count", json!(1));
    handle.stop();
    reactivity.scheduler().flush();

    assert!(handle.is_stopped());
    assert_eq!(runs.load(Ordering::SeqCst), 1);
    assert_eq!(reactivity.effect_count(), 0);
}

#[test]
fn dependencies_are_recaptured_on_each_run() {
    let (reactivity, state) = setup(json!({ "use_a": true, "a": 1, "b": 1 }));

    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let s = state.clone();
    let _handle = reactivity.effect(move || {
        let key = if s.get("use_a") == json!(true) { "a" } else { "b" };
        sink.lock().push(s.get(key));
    });

    state.set("use_a", json!(false));
    reactivity.scheduler().flush();
    state.set("a", json!(2));
    reactivity.scheduler().flush();

    assert_eq!(*seen.lock(), vec![json!(1), json!(1)]);
}

#[test]
fn panicking_effect_does_not_leak_tracking() {
    let (reactivity, state) = setup(json!({ "a": 0, "b": 0 }));

    let s = state.clone();
    let _failing = reactivity.effect(move || {
        if s.get("a") == json!(1) {
            panic!("effect failed");
        }
    });
    state.set("a", json!(1));
    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| reactivity.scheduler().flush()));
    assert!(result.is_err());

    // a read outside any effect must not subscribe the failed one
    state.get("b");
    let s = state.clone();
    let (_handle, runs) = counting_effect(&reactivity, move || {
        s.get("b");
    });
    state.set("b", json!(1));
    reactivity.scheduler().flush();

    assert_eq!(runs.load(Ordering::SeqCst), 2);
}
