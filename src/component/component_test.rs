use serde_json::json;

use super::*;
use crate::reactive::Reactivity;
use crate::Arg;
use crate::WireValue;

fn counter(reactivity: &Reactivity) -> ComponentRef {
    Component::builder("counter")
        .id("c1")
        .el(NodeId(4))
        .reactive(json!({ "count": 1 }))
        .ephemeral(json!({ "draft": { "title": "hi" } }))
        .build(reactivity)
}

#[test]
fn builder_assigns_fields() {
    let reactivity = Reactivity::default();
    let component = counter(&reactivity);

    assert_eq!(component.id().as_str(), "c1");
    assert_eq!(component.name(), "counter");
    assert_eq!(component.el(), NodeId(4));
    assert_eq!(component.reactive().peek("count"), json!(1));
    assert_eq!(component.ephemeral_get("draft.title"), json!("hi"));
}

#[test]
fn generated_ids_are_unique() {
    let reactivity = Reactivity::default();
    let a = Component::builder("a").build(&reactivity);
    let b = Component::builder("b").build(&reactivity);

    assert_ne!(a.id(), b.id());
    assert!(!a.id().as_str().is_empty());
}

#[test]
fn ephemeral_writes_are_untracked_and_path_aware() {
    let reactivity = Reactivity::default();
    let component = counter(&reactivity);

    assert!(component.ephemeral_set("draft.body", json!("text")));
    assert_eq!(component.ephemeral(), json!({ "draft": { "title": "hi", "body": "text" } }));

    component.replace_ephemeral(json!({}));
    assert_eq!(component.ephemeral_get("draft"), serde_json::Value::Null);
}

#[test]
fn overrides_are_scoped_to_one_component() {
    let reactivity = Reactivity::default();
    let a = counter(&reactivity);
    let b = Component::builder("other").build(&reactivity);

    override_method(&a, "increment", |_args: Vec<Arg>| Ok(WireValue::Value(json!(42))));

    assert!(a.overrides().contains("increment"));
    assert!(!b.overrides().contains("increment"));
}

#[test]
fn installing_twice_replaces_the_override() {
    let reactivity = Reactivity::default();
    let component = counter(&reactivity);

    override_method(&component, "save", |_args: Vec<Arg>| Ok(WireValue::Value(json!(1))));
    override_method(&component, "save", |_args: Vec<Arg>| Ok(WireValue::Value(json!(2))));

    assert_eq!(component.overrides().len(), 1);
    let callback = component.overrides().get("save").unwrap();
    assert_eq!(callback(vec![]).unwrap().into_value(), Some(json!(2)));
}

#[test]
fn teardown_releases_watchers_overrides_and_parent() {
    let reactivity = Reactivity::default();
    let component = counter(&reactivity);
    let parent = Component::builder("parent").build(&reactivity);

    let state = component.reactive().clone();
    let watcher = reactivity.effect(move || {
        state.get("count");
    });
    component.adopt_watcher(watcher.clone());
    component.memoize_parent(parent);
    override_method(&component, "save", |_args: Vec<Arg>| Ok(WireValue::Undefined));

    assert_eq!(component.watcher_count(), 1);
    component.teardown();

    assert!(component.is_torn_down());
    assert!(watcher.is_stopped());
    assert_eq!(component.watcher_count(), 0);
    assert!(component.overrides().is_empty());
    assert!(component.memoized_parent().is_none());
}

#[test]
fn watchers_adopted_after_teardown_are_stopped() {
    let reactivity = Reactivity::default();
    let component = counter(&reactivity);
    component.teardown();

    let watcher = reactivity.effect(|| {});
    component.adopt_watcher(watcher.clone());

    assert!(watcher.is_stopped());
    assert_eq!(component.watcher_count(), 0);
}

#[test]
fn stopped_watchers_are_pruned_on_adopt() {
    let reactivity = Reactivity::default();
    let component = counter(&reactivity);

    let first = reactivity.effect(|| {});
    component.adopt_watcher(first.clone());
    first.stop();
    component.adopt_watcher(reactivity.effect(|| {}));

    assert_eq!(component.watcher_count(), 1);
}
