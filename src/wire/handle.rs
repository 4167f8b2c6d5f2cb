use serde_json::Value;
use tracing::debug;

use super::registry::Lookup;
use super::registry::PropertyFactory;
use crate::constants::*;
use crate::reactive::ReactiveState;
use crate::Arg;
use crate::ComponentRef;
use crate::DispatchError;
use crate::Invocation;
use crate::Result;
use crate::WireRuntime;
use crate::WireValue;

/// Which layer answers a property read, in priority order
#[derive(Clone)]
pub enum Resolution {
    /// Reserved introspection property, answered with the component itself
    Instance,
    /// Bare alias redirected to a canonical capability
    Alias {
        canonical: String,
        factory: PropertyFactory,
    },
    /// Registered capability
    Capability(PropertyFactory),
    /// Key present in the handle's state view
    StateField,
    /// The thenable guard: resolves to nothing
    Thenable,
    /// Anything else: remote dispatch through the fallback resolver
    Fallback,
}

impl std::fmt::Debug for Resolution {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        match self {
            Resolution::Instance => f.write_str("Instance"),
            Resolution::Alias { canonical, .. } => f.debug_struct("Alias").field("canonical", canonical).finish(),
            Resolution::Capability(_) => f.write_str("Capability"),
            Resolution::StateField => f.write_str("StateField"),
            Resolution::Thenable => f.write_str("Thenable"),
            Resolution::Fallback => f.write_str("Fallback"),
        }
    }
}

/// Client-side stand-in for a server-backed component
///
/// A handle stores no data of its own: reads and writes go to the state view
/// it was built over, to registry capabilities or to the fallback resolver.
/// Cloning is cheap and clones are interchangeable.
#[derive(Clone)]
pub struct WireHandle {
    component: ComponentRef,
    state: ReactiveState,
    runtime: WireRuntime,
}

impl std::fmt::Debug for WireHandle {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("WireHandle")
            .field("component", self.component.id())
            .finish_non_exhaustive()
    }
}

impl WireHandle {
    pub(crate) fn new(
        component: ComponentRef,
        state: ReactiveState,
        runtime: WireRuntime,
    ) -> Self {
        Self {
            component,
            state,
            runtime,
        }
    }

    pub fn component(&self) -> &ComponentRef {
        &self.component
    }

    pub fn state(&self) -> &ReactiveState {
        &self.state
    }

    pub fn runtime(&self) -> &WireRuntime {
        &self.runtime
    }

    /// Decide which layer answers `property`, first match wins.
    pub fn resolution(
        &self,
        property: &str,
    ) -> Resolution {
        if property == INSTANCE_PROPERTY {
            return Resolution::Instance;
        }

        match self.runtime.registry().lookup(property) {
            Some(Lookup::Alias { canonical, factory }) => return Resolution::Alias { canonical, factory },
            Some(Lookup::Capability(factory)) => return Resolution::Capability(factory),
            None => {}
        }

        if self.state.contains_key(property) {
            return Resolution::StateField;
        }

        if property == THENABLE_PROPERTY {
            return Resolution::Thenable;
        }

        Resolution::Fallback
    }

    /// Read `property`.
    ///
    /// Never touches the network by itself: only invoking a returned
    /// [`WireValue::Method`] can.
    pub fn read(
        &self,
        property: &str,
    ) -> WireValue {
        let resolution = self.resolution(property);
        debug!(component = %self.component.id(), property, ?resolution, "wire read");

        match resolution {
            Resolution::Instance => WireValue::Component(self.component.clone()),
            Resolution::Alias { factory, .. } | Resolution::Capability(factory) => factory(self),
            Resolution::StateField => WireValue::Value(self.state.get_key(property)),
            Resolution::Thenable => WireValue::Undefined,
            Resolution::Fallback => WireValue::Method(self.runtime.fallback().resolve(self, property)),
        }
    }

    /// Assign `value` to `property` if it is a key of the state view.
    ///
    /// Unknown keys are dropped silently; the write always reports success.
    pub fn write(
        &self,
        property: &str,
        value: Value,
    ) -> bool {
        if self.state.contains_key(property) {
            self.state.set_key(property, value);
        } else {
            debug!(component = %self.component.id(), property, "write to unknown state key dropped");
        }
        true
    }

    /// Read `property` and invoke the result with `args`.
    pub fn invoke(
        &self,
        property: &str,
        args: Vec<Arg>,
    ) -> Invocation {
        match self.read(property) {
            WireValue::Method(method) => method.invoke(args),
            _ => Invocation::error(DispatchError::NotCallable {
                property: property.to_string(),
            }),
        }
    }

    /// The owning component, via the introspection property.
    pub fn instance(&self) -> ComponentRef {
        self.component.clone()
    }

    /// `$get(path)` against reactive state.
    pub fn get(
        &self,
        path: &str,
    ) -> Result<Value> {
        let value = self.invoke(GET, vec![path.into()]).now(GET)?;
        Ok(value.into_value().unwrap_or(Value::Null))
    }

    /// `$get(path, false)` against ephemeral state.
    pub fn get_ephemeral(
        &self,
        path: &str,
    ) -> Result<Value> {
        let value = self.invoke(GET, vec![path.into(), false.into()]).now(GET)?;
        Ok(value.into_value().unwrap_or(Value::Null))
    }

    /// `$set(path, value, live)`. Resolves to `live` once the commit (if any)
    /// completed.
    pub async fn set(
        &self,
        path: &str,
        value: Value,
        live: bool,
    ) -> Result<bool> {
        let result = self
            .invoke(SET, vec![path.into(), Arg::Value(value), live.into()])
            .await?;
        Ok(result.as_value().and_then(Value::as_bool).unwrap_or(live))
    }

    /// `$call(method, ...params)`: full resolution again on `method`.
    pub async fn call(
        &self,
        method: &str,
        params: Vec<Arg>,
    ) -> Result<WireValue> {
        let mut args = Vec::with_capacity(params.len() + 1);
        args.push(Arg::from(method));
        args.extend(params);
        self.invoke(CALL, args).await
    }

    pub async fn commit(&self) -> Result<()> {
        self.invoke(COMMIT, Vec::new()).await.map(|_| ())
    }

    pub async fn refresh(&self) -> Result<()> {
        self.invoke(REFRESH, Vec::new()).await.map(|_| ())
    }

    /// Flip a boolean-ish field and commit it.
    pub async fn toggle(
        &self,
        name: &str,
    ) -> Result<WireValue> {
        self.invoke(TOGGLE, vec![name.into()]).await
    }

    /// `$watch(path, callback)` with `callback(new, old)`.
    pub fn watch<F>(
        &self,
        path: &str,
        callback: F,
    ) -> Result<()>
    where
        F: Fn(Value, Value) + Send + Sync + 'static,
    {
        let callback = Arg::callback(move |mut values: Vec<Value>| {
            let old = values.pop().unwrap_or(Value::Null);
            let new = values.pop().unwrap_or(Value::Null);
            callback(new, old)
        });
        self.invoke(WATCH, vec![path.into(), callback]).now(WATCH).map(|_| ())
    }

    /// `$parent`, if a parent component could be found.
    pub fn parent(&self) -> Option<WireHandle> {
        self.read(PARENT).into_handle()
    }

    /// `$entangle(name, live)`.
    pub fn entangle(
        &self,
        name: &str,
        live: bool,
    ) -> Result<WireValue> {
        self.invoke(ENTANGLE, vec![name.into(), live.into()]).now(ENTANGLE)
    }
}
