use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value;
use tracing::trace;

use crate::reactive::EffectHandle;
use crate::Callback;
use crate::WireHandle;

struct Tracked {
    first_time: bool,
    old_value: Value,
}

/// Observe `path` on the handle's component and call `callback(new, old)`
/// after each change.
///
/// The first evaluation only records the baseline. Later changes are
/// delivered through a scheduler microtask, so several writes within one
/// synchronous turn reach the callback once, with the latest value. The
/// watcher lives until its handle is stopped or the component is torn down.
pub fn watch(
    handle: &WireHandle,
    path: &str,
    callback: Callback,
) -> EffectHandle {
    let component = handle.component().clone();
    let state = component.reactive().clone();
    let reactivity = state.reactivity().clone();
    let scheduler = reactivity.scheduler().clone();
    let deep = handle.runtime().config().watch.deep;
    let path = path.to_string();
    let tracked = Arc::new(Mutex::new(Tracked {
        first_time: true,
        old_value: Value::Null,
    }));

    let effect = reactivity.effect(move || {
        let value = if deep { state.get_deep(&path) } else { state.get(&path) };

        {
            let mut t = tracked.lock();
            if t.first_time {
                t.first_time = false;
                t.old_value = value;
                return;
            }
        }

        trace!(path = %path, "watched value changed");
        let tracked = tracked.clone();
        let callback = callback.clone();
        scheduler.queue_microtask(move || {
            let old = tracked.lock().old_value.clone();
            callback(vec![value.clone(), old]);
            tracked.lock().old_value = value;
        });
    });

    component.adopt_watcher(effect.clone());
    effect
}
