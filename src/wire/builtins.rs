//! Builtin capabilities registered on every default registry.

use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use super::watch::watch;
use super::PropertyRegistry;
use crate::constants::*;
use crate::utils::data::is_truthy;
use crate::wire::value::Args;
use crate::Invocation;
use crate::Result;
use crate::WireHandle;
use crate::WireMethod;
use crate::WireValue;

/// Install every builtin capability into `registry`.
pub fn install(registry: &PropertyRegistry) {
    registry.register_fn(INSTANCE_PROPERTY, |handle: &WireHandle| {
        WireValue::Component(handle.component().clone())
    });

    method(registry, GET, get);
    method(registry, SET, set);
    method(registry, CALL, call);
    method(registry, COMMIT, commit);
    method(registry, TOGGLE, toggle);
    method(registry, WATCH, watch_path);
    method(registry, ENTANGLE, entangle);

    // `$refresh` is `$commit` under another name
    registry.register_fn(REFRESH, |handle: &WireHandle| handle.read(COMMIT));
    registry.register_fn(PARENT, parent);

    method(registry, ON, |h, a| {
        let events = h.runtime().services().events.clone();
        Ok(Invocation::Ready(events.listen(h.component().clone(), a.rest(0))))
    });
    method(registry, DISPATCH, |h, a| {
        let events = h.runtime().services().events.clone();
        Ok(Invocation::Ready(events.dispatch(h.component().clone(), a.rest(0))))
    });
    method(registry, DISPATCH_SELF, |h, a| {
        let events = h.runtime().services().events.clone();
        Ok(Invocation::Ready(events.dispatch_self(h.component().clone(), a.rest(0))))
    });
    method(registry, DISPATCH_TO, |h, a| {
        let events = h.runtime().services().events.clone();
        Ok(Invocation::Ready(events.dispatch_to(h.component().clone(), a.rest(0))))
    });

    method(registry, UPLOAD, |h, a| {
        let uploads = h.runtime().services().uploads.clone();
        let component = h.component().clone();
        let params = a.rest(0);
        Ok(Invocation::pending(async move { uploads.upload(component, params).await }))
    });
    method(registry, UPLOAD_MULTIPLE, |h, a| {
        let uploads = h.runtime().services().uploads.clone();
        let component = h.component().clone();
        let params = a.rest(0);
        Ok(Invocation::pending(
            async move { uploads.upload_multiple(component, params).await },
        ))
    });
    method(registry, REMOVE_UPLOAD, |h, a| {
        let uploads = h.runtime().services().uploads.clone();
        let component = h.component().clone();
        let params = a.rest(0);
        Ok(Invocation::pending(
            async move { uploads.remove_upload(component, params).await },
        ))
    });
}

/// Register `name` as a method capability backed by `f`. Argument errors are
/// reported through the invocation.
fn method<F>(
    registry: &PropertyRegistry,
    name: &'static str,
    f: F,
) where
    F: Fn(&WireHandle, &Args<'_>) -> Result<Invocation> + Send + Sync + 'static,
{
    let f = Arc::new(f);
    registry.register_fn(name, move |handle: &WireHandle| {
        let handle = handle.clone();
        let f = f.clone();
        WireValue::Method(WireMethod::new(name, move |args| {
            f(&handle, &Args::new(name, &args)).unwrap_or_else(Invocation::error)
        }))
    });
}

fn get(
    handle: &WireHandle,
    args: &Args<'_>,
) -> Result<Invocation> {
    let path = args.string(0)?;
    let component = handle.component();
    let value = if args.flag(1, true)? {
        component.reactive().get(&path)
    } else {
        component.ephemeral_get(&path)
    };
    Ok(Invocation::ready(value))
}

/// Write through to reactive state now; commit only when `live`.
fn set(
    handle: &WireHandle,
    args: &Args<'_>,
) -> Result<Invocation> {
    let path = args.string(0)?;
    let value = args.value(1)?;
    let live = args.flag(2, true)?;

    let component = handle.component().clone();
    component.reactive().set(&path, value);

    if !live {
        return Ok(Invocation::ready(Value::Bool(false)));
    }

    let runtime = handle.runtime().clone();
    Ok(Invocation::pending(async move {
        runtime.flush();
        let transport = runtime.services().transport.clone();
        transport.request_commit(component).await?;
        Ok(WireValue::Value(Value::Bool(true)))
    }))
}

/// Re-enter resolution on the component's own handle, so registered
/// capabilities and state fields win over remote calls.
fn call(
    handle: &WireHandle,
    args: &Args<'_>,
) -> Result<Invocation> {
    let method = args.string(0)?;
    let wire = handle.runtime().wire(handle.component());
    Ok(wire.invoke(&method, args.rest(1)))
}

fn commit(
    handle: &WireHandle,
    _args: &Args<'_>,
) -> Result<Invocation> {
    let runtime = handle.runtime().clone();
    let component = handle.component().clone();
    Ok(Invocation::pending(async move {
        runtime.flush();
        debug!(component = %component.id(), "commit");
        let transport = runtime.services().transport.clone();
        transport.request_commit(component).await?;
        Ok(WireValue::Undefined)
    }))
}

fn toggle(
    handle: &WireHandle,
    args: &Args<'_>,
) -> Result<Invocation> {
    let name = args.string(0)?;
    let current = handle
        .invoke(GET, vec![name.as_str().into()])
        .now(GET)?
        .into_value()
        .unwrap_or(Value::Null);
    Ok(handle.invoke(SET, vec![name.into(), (!is_truthy(&current)).into()]))
}

fn watch_path(
    handle: &WireHandle,
    args: &Args<'_>,
) -> Result<Invocation> {
    let path = args.string(0)?;
    let callback = args.callback(1)?;
    watch(handle, &path, callback);
    Ok(Invocation::undefined())
}

fn entangle(
    handle: &WireHandle,
    args: &Args<'_>,
) -> Result<Invocation> {
    let name = args.string(0)?;
    let live = args.flag(1, false)?;
    let entangler = handle.runtime().services().entangler.clone();
    Ok(Invocation::Ready(entangler.entangle(handle.component().clone(), name, live)))
}

fn parent(handle: &WireHandle) -> WireValue {
    match handle.runtime().parent_of(handle.component()) {
        Some(parent) => WireValue::Handle(handle.runtime().wire(&parent)),
        None => WireValue::Undefined,
    }
}
