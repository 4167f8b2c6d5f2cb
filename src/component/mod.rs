//! Server-backed component model
//!
//! A [`Component`] owns its two state containers, its DOM anchor and
//! everything whose lifetime is bound to it: method overrides, watchers
//! registered through its wire handle and its memoized parent.
mod overrides;

pub use overrides::*;

#[cfg(test)]
mod component_test;

use std::fmt;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use parking_lot::Mutex;
use parking_lot::RwLock;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;
use tracing::debug;

use crate::reactive::EffectHandle;
use crate::reactive::ReactiveState;
use crate::reactive::Reactivity;
use crate::utils::data::data_get;
use crate::utils::data::data_set;

pub type ComponentRef = Arc<Component>;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ComponentId(String);

impl ComponentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn generate() -> Self {
        Self(nanoid::nanoid!())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ComponentId {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of a node in the host's UI tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId(pub u64);

/// UI event object. A lone event argument is discarded before remote
/// dispatch, see [`crate::DispatchConfig::strip_event_argument`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UiEvent {
    pub kind: String,
    pub target: Option<NodeId>,
}

impl UiEvent {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            target: None,
        }
    }
}

pub struct Component {
    id: ComponentId,
    name: String,
    el: NodeId,
    reactive: ReactiveState,
    ephemeral: RwLock<Value>,
    overrides: OverrideTable,
    watchers: Mutex<Vec<EffectHandle>>,
    parent_memo: Mutex<Option<ComponentRef>>,
    torn_down: AtomicBool,
}

impl fmt::Debug for Component {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct("Component")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("el", &self.el)
            .field("overrides", &self.overrides)
            .finish_non_exhaustive()
    }
}

impl Component {
    pub fn builder(name: impl Into<String>) -> ComponentBuilder {
        ComponentBuilder::new(name)
    }

    pub fn id(&self) -> &ComponentId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// DOM anchor, only used to find the parent component
    pub fn el(&self) -> NodeId {
        self.el
    }

    /// Fields under live tracking: source of truth for `$get`/`$set`/`$watch`
    pub fn reactive(&self) -> &ReactiveState {
        &self.reactive
    }

    /// Untracked copy of the ephemeral container
    pub fn ephemeral(&self) -> Value {
        self.ephemeral.read().clone()
    }

    pub fn ephemeral_get(
        &self,
        path: &str,
    ) -> Value {
        data_get(&self.ephemeral.read(), path)
    }

    pub fn ephemeral_set(
        &self,
        path: &str,
        value: Value,
    ) -> bool {
        data_set(&mut self.ephemeral.write(), path, value).written
    }

    /// Swap in a fresh ephemeral snapshot, e.g. after a server round trip
    pub fn replace_ephemeral(
        &self,
        value: Value,
    ) {
        *self.ephemeral.write() = value;
    }

    pub fn overrides(&self) -> &OverrideTable {
        &self.overrides
    }

    pub(crate) fn adopt_watcher(
        &self,
        watcher: EffectHandle,
    ) {
        if self.is_torn_down() {
            watcher.stop();
            return;
        }
        let mut watchers = self.watchers.lock();
        watchers.retain(|w| !w.is_stopped());
        watchers.push(watcher);
    }

    pub fn watcher_count(&self) -> usize {
        self.watchers.lock().len()
    }

    pub(crate) fn memoized_parent(&self) -> Option<ComponentRef> {
        self.parent_memo.lock().clone()
    }

    pub(crate) fn memoize_parent(
        &self,
        parent: ComponentRef,
    ) {
        *self.parent_memo.lock() = Some(parent);
    }

    /// Release everything bound to this component's lifetime: watchers are
    /// stopped, overrides and the memoized parent are dropped.
    pub fn teardown(&self) {
        if self.torn_down.swap(true, Ordering::AcqRel) {
            return;
        }
        let watchers: Vec<EffectHandle> = self.watchers.lock().drain(..).collect();
        for watcher in &watchers {
            watcher.stop();
        }
        self.overrides.clear();
        self.parent_memo.lock().take();
        debug!(component = %self.id, watchers = watchers.len(), "component torn down");
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down.load(Ordering::Acquire)
    }
}

/// Builder for [`Component`]
///
/// ```ignore
/// let counter = Component::builder("counter")
///     .el(NodeId(3))
///     .reactive(json!({ "count": 0 }))
///     .build(runtime.reactivity());
/// ```
pub struct ComponentBuilder {
    id: Option<ComponentId>,
    name: String,
    el: NodeId,
    reactive: Value,
    ephemeral: Value,
}

impl ComponentBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            el: NodeId(0),
            reactive: Value::Object(Map::new()),
            ephemeral: Value::Object(Map::new()),
        }
    }

    pub fn id(
        mut self,
        id: impl Into<String>,
    ) -> Self {
        self.id = Some(ComponentId::new(id));
        self
    }

    pub fn el(
        mut self,
        el: NodeId,
    ) -> Self {
        self.el = el;
        self
    }

    pub fn reactive(
        mut self,
        state: Value,
    ) -> Self {
        self.reactive = state;
        self
    }

    pub fn ephemeral(
        mut self,
        state: Value,
    ) -> Self {
        self.ephemeral = state;
        self
    }

    pub fn build(
        self,
        reactivity: &Reactivity,
    ) -> ComponentRef {
        Arc::new(Component {
            id: self.id.unwrap_or_else(ComponentId::generate),
            name: self.name,
            el: self.el,
            reactive: ReactiveState::new(reactivity, self.reactive),
            ephemeral: RwLock::new(self.ephemeral),
            overrides: OverrideTable::default(),
            watchers: Mutex::new(Vec::new()),
            parent_memo: Mutex::new(None),
            torn_down: AtomicBool::new(false),
        })
    }
}
