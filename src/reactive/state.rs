use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::Map;
use serde_json::Value;

use super::effect::Dep;
use super::effect::StateId;
use super::Reactivity;
use crate::utils::data::get_segments;
use crate::utils::data::join_path;
use crate::utils::data::path_segments;
use crate::utils::data::set_segments;
use crate::utils::data::SetOutcome;

struct StateInner {
    id: StateId,
    data: RwLock<Value>,
    reactivity: Reactivity,
}

/// JSON object container whose reads are tracked and whose writes wake
/// dependent effects.
///
/// Cloning yields another view over the same data.
#[derive(Clone)]
pub struct ReactiveState {
    inner: Arc<StateInner>,
}

impl std::fmt::Debug for ReactiveState {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("ReactiveState")
            .field("id", &self.inner.id)
            .field("data", &*self.inner.data.read())
            .finish()
    }
}

impl ReactiveState {
    /// Non-object initial values are replaced by an empty object.
    pub fn new(
        reactivity: &Reactivity,
        initial: Value,
    ) -> Self {
        let data = match initial {
            Value::Object(_) => initial,
            _ => Value::Object(Map::new()),
        };
        Self {
            inner: Arc::new(StateInner {
                id: reactivity.next_state_id(),
                data: RwLock::new(data),
                reactivity: reactivity.clone(),
            }),
        }
    }

    pub fn id(&self) -> StateId {
        self.inner.id
    }

    pub fn reactivity(&self) -> &Reactivity {
        &self.inner.reactivity
    }

    /// Whether `key` is a top-level field. Tracked like a read of that key.
    pub fn contains_key(
        &self,
        key: &str,
    ) -> bool {
        self.track(Dep::Path(key.to_string()));
        self.inner
            .data
            .read()
            .as_object()
            .is_some_and(|map| map.contains_key(key))
    }

    /// Top-level field read, without path splitting.
    pub fn get_key(
        &self,
        key: &str,
    ) -> Value {
        self.track(Dep::Path(key.to_string()));
        self.inner
            .data
            .read()
            .get(key)
            .cloned()
            .unwrap_or(Value::Null)
    }

    /// Read the value at a dotted `path`, tracking every prefix.
    pub fn get(
        &self,
        path: &str,
    ) -> Value {
        let segments = path_segments(path);
        self.track_prefixes(&segments);
        get_segments(&self.inner.data.read(), &segments)
            .cloned()
            .unwrap_or(Value::Null)
    }

    /// Read the value at `path` and subscribe to everything nested below it.
    pub fn get_deep(
        &self,
        path: &str,
    ) -> Value {
        let segments = path_segments(path);
        self.track_prefixes(&segments);
        let value = get_segments(&self.inner.data.read(), &segments)
            .cloned()
            .unwrap_or(Value::Null);
        self.track_nested(&segments.join("."), &value);
        value
    }

    /// Untracked read.
    pub fn peek(
        &self,
        path: &str,
    ) -> Value {
        get_segments(&self.inner.data.read(), &path_segments(path))
            .cloned()
            .unwrap_or(Value::Null)
    }

    /// Untracked copy of the whole container.
    pub fn snapshot(&self) -> Value {
        self.inner.data.read().clone()
    }

    /// Write `value` at a dotted `path`.
    pub fn set(
        &self,
        path: &str,
        value: Value,
    ) -> bool {
        let segments = path_segments(path);
        self.write(&segments, value)
    }

    /// Top-level field write, without path splitting.
    pub fn set_key(
        &self,
        key: &str,
        value: Value,
    ) -> bool {
        self.write(&[key.to_string()], value)
    }

    fn write(
        &self,
        segments: &[String],
        value: Value,
    ) -> bool {
        let outcome = {
            let mut data = self.inner.data.write();
            set_segments(&mut data, segments, value)
        };
        self.notify(segments, &outcome);
        outcome.written
    }

    fn notify(
        &self,
        segments: &[String],
        outcome: &SetOutcome,
    ) {
        if !outcome.changed {
            return;
        }

        for created in &outcome.created {
            self.trigger(Dep::Path(created.clone()));
            self.trigger(Dep::Keys(parent_of(created)));
        }

        let path = segments.join(".");
        if outcome.added {
            self.trigger(Dep::Keys(segments[..segments.len().saturating_sub(1)].join(".")));
        }
        self.trigger(Dep::Path(path));
    }

    fn track_prefixes(
        &self,
        segments: &[String],
    ) {
        let mut path = String::new();
        for segment in segments {
            path = join_path(&path, segment);
            self.track(Dep::Path(path.clone()));
        }
    }

    fn track_nested(
        &self,
        path: &str,
        value: &Value,
    ) {
        match value {
            Value::Object(map) => {
                self.track(Dep::Keys(path.to_string()));
                for (key, child) in map {
                    let child_path = join_path(path, key);
                    self.track(Dep::Path(child_path.clone()));
                    self.track_nested(&child_path, child);
                }
            }
            Value::Array(items) => {
                self.track(Dep::Keys(path.to_string()));
                for (index, child) in items.iter().enumerate() {
                    let child_path = join_path(path, &index.to_string());
                    self.track(Dep::Path(child_path.clone()));
                    self.track_nested(&child_path, child);
                }
            }
            _ => {}
        }
    }

    fn track(
        &self,
        dep: Dep,
    ) {
        self.inner.reactivity.track((self.inner.id, dep));
    }

    fn trigger(
        &self,
        dep: Dep,
    ) {
        self.inner.reactivity.trigger(&(self.inner.id, dep));
    }
}

fn parent_of(path: &str) -> String {
    crate::utils::data::parent_path(path).to_string()
}
