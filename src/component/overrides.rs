use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use crate::Arg;
use crate::ComponentRef;
use crate::Result;
use crate::WireValue;

/// Local replacement for a remote method. Receives the (possibly event
/// stripped) argument list and runs synchronously.
pub type OverrideFn = Arc<dyn Fn(Vec<Arg>) -> Result<WireValue> + Send + Sync>;

/// Per-component method overrides, owned by the component and cleared on
/// teardown.
#[derive(Default)]
pub struct OverrideTable {
    methods: Mutex<HashMap<String, OverrideFn>>,
}

impl std::fmt::Debug for OverrideTable {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        let methods = self.methods.lock();
        f.debug_struct("OverrideTable")
            .field("methods", &methods.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl OverrideTable {
    /// Install `callback` for `method`, returning the override it replaced.
    pub fn insert(
        &self,
        method: impl Into<String>,
        callback: OverrideFn,
    ) -> Option<OverrideFn> {
        self.methods.lock().insert(method.into(), callback)
    }

    pub fn get(
        &self,
        method: &str,
    ) -> Option<OverrideFn> {
        self.methods.lock().get(method).cloned()
    }

    pub fn contains(
        &self,
        method: &str,
    ) -> bool {
        self.methods.lock().contains_key(method)
    }

    pub fn remove(
        &self,
        method: &str,
    ) -> Option<OverrideFn> {
        self.methods.lock().remove(method)
    }

    pub fn clear(&self) {
        self.methods.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.methods.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Intercept calls to `method` on `component` with a local `callback`,
/// bypassing remote dispatch. Installing again for the same method replaces
/// the previous override; other components are never affected.
pub fn override_method<F>(
    component: &ComponentRef,
    method: impl Into<String>,
    callback: F,
) where
    F: Fn(Vec<Arg>) -> Result<WireValue> + Send + Sync + 'static,
{
    let method = method.into();
    let replaced = component
        .overrides()
        .insert(method.clone(), Arc::new(callback))
        .is_some();
    debug!(component = %component.id(), method = %method, replaced, "method overridden");
}
