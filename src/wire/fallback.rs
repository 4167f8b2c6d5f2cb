//! Remote-call fallback for names nothing else claims.

use std::sync::Arc;

use arc_swap::ArcSwap;
use serde_json::Value;
use tracing::debug;

use crate::Arg;
use crate::DispatchError;
use crate::Invocation;
use crate::Result;
use crate::WireHandle;
use crate::WireMethod;
use crate::WireValue;

/// `(handle, property) -> invoker` for names that resolved nowhere else
pub type FallbackFactory = Arc<dyn Fn(&WireHandle, &str) -> WireMethod + Send + Sync>;

struct Slot(FallbackFactory);

/// Single replaceable fallback factory, last write wins
pub struct Fallback {
    slot: ArcSwap<Slot>,
}

impl std::fmt::Debug for Fallback {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("Fallback").finish_non_exhaustive()
    }
}

impl Default for Fallback {
    fn default() -> Self {
        Self::new(remote_call())
    }
}

impl Fallback {
    pub fn new(factory: FallbackFactory) -> Self {
        Self {
            slot: ArcSwap::from_pointee(Slot(factory)),
        }
    }

    pub fn replace(
        &self,
        factory: FallbackFactory,
    ) {
        self.slot.store(Arc::new(Slot(factory)));
    }

    pub fn resolve(
        &self,
        handle: &WireHandle,
        property: &str,
    ) -> WireMethod {
        let slot = self.slot.load();
        (slot.0)(handle, property)
    }
}

/// Default fallback: local override if one is installed, remote call otherwise.
pub fn remote_call() -> FallbackFactory {
    Arc::new(|handle: &WireHandle, property: &str| {
        let handle = handle.clone();
        let method = property.to_string();
        WireMethod::new(property, move |args| invoke_remote(&handle, &method, args))
    })
}

fn invoke_remote(
    handle: &WireHandle,
    method: &str,
    mut args: Vec<Arg>,
) -> Invocation {
    // Handlers bound without parentheses receive the UI event as sole argument
    if handle.runtime().config().dispatch.strip_event_argument
        && args.len() == 1
        && matches!(args[0], Arg::Event(_))
    {
        args.clear();
    }

    let component = handle.component().clone();
    if let Some(callback) = component.overrides().get(method) {
        debug!(component = %component.id(), method, "dispatching to local override");
        return Invocation::Ready(callback(args));
    }

    let params = match remote_params(method, args) {
        Ok(params) => params,
        Err(e) => return Invocation::error(e),
    };

    let runtime = handle.runtime().clone();
    let method = method.to_string();
    Invocation::pending(async move {
        runtime.flush();
        debug!(component = %component.id(), method = %method, "dispatching remote call");
        let transport = runtime.services().transport.clone();
        let value = transport.request_call(component, method, params).await?;
        Ok(WireValue::Value(value))
    })
}

fn remote_params(
    method: &str,
    args: Vec<Arg>,
) -> Result<Vec<Value>> {
    let unserializable = |index: usize| -> crate::Error {
        DispatchError::UnserializableArgument {
            method: method.to_string(),
            index,
        }
        .into()
    };

    args.into_iter()
        .enumerate()
        .map(|(index, arg)| match arg {
            Arg::Value(value) => Ok(value),
            Arg::Event(event) => serde_json::to_value(event).map_err(|_| unserializable(index)),
            Arg::Callback(_) => Err(unserializable(index)),
        })
        .collect()
}
