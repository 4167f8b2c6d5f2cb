use std::any::Any;
use std::fmt;
use std::future::Future;
use std::future::IntoFuture;
use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;
use serde_json::Value;

use crate::ComponentRef;
use crate::DispatchError;
use crate::Result;
use crate::UiEvent;
use crate::WireHandle;

/// Callable passed through a wire invocation (watch callbacks, event
/// listeners). Receives positional values.
pub type Callback = Arc<dyn Fn(Vec<Value>) + Send + Sync>;

/// Result of reading a wire property
#[derive(Clone, Default)]
pub enum WireValue {
    /// Nothing resolved (the `then` guard, missing parent, void results)
    #[default]
    Undefined,
    /// Plain data, never causes network activity
    Value(Value),
    /// The owning component, returned by the introspection property
    Component(ComponentRef),
    /// Another component's wire handle (`$parent`)
    Handle(WireHandle),
    /// Something to invoke
    Method(WireMethod),
    /// Collaborator defined object (entangle accessors, listener disposers)
    Opaque(Arc<dyn Any + Send + Sync>),
}

impl fmt::Debug for WireValue {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            WireValue::Undefined => f.write_str("Undefined"),
            WireValue::Value(v) => f.debug_tuple("Value").field(v).finish(),
            WireValue::Component(c) => f.debug_tuple("Component").field(c.id()).finish(),
            WireValue::Handle(h) => f.debug_tuple("Handle").field(h.component().id()).finish(),
            WireValue::Method(m) => f.debug_tuple("Method").field(&m.name()).finish(),
            WireValue::Opaque(_) => f.write_str("Opaque(..)"),
        }
    }
}

impl From<Value> for WireValue {
    fn from(value: Value) -> Self {
        WireValue::Value(value)
    }
}

impl From<WireMethod> for WireValue {
    fn from(method: WireMethod) -> Self {
        WireValue::Method(method)
    }
}

impl WireValue {
    pub fn is_undefined(&self) -> bool {
        matches!(self, WireValue::Undefined)
    }

    pub fn is_callable(&self) -> bool {
        matches!(self, WireValue::Method(_))
    }

    pub fn as_value(&self) -> Option<&Value> {
        match self {
            WireValue::Value(v) => Some(v),
            _ => None,
        }
    }

    /// Plain data view: `Undefined` reads as `Null`, non-data as `None`.
    pub fn into_value(self) -> Option<Value> {
        match self {
            WireValue::Value(v) => Some(v),
            WireValue::Undefined => Some(Value::Null),
            _ => None,
        }
    }

    pub fn as_method(&self) -> Option<&WireMethod> {
        match self {
            WireValue::Method(m) => Some(m),
            _ => None,
        }
    }

    pub fn into_handle(self) -> Option<WireHandle> {
        match self {
            WireValue::Handle(h) => Some(h),
            _ => None,
        }
    }

    pub fn into_component(self) -> Option<ComponentRef> {
        match self {
            WireValue::Component(c) => Some(c),
            _ => None,
        }
    }

    pub fn downcast_opaque<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        match self {
            WireValue::Opaque(o) => o.clone().downcast::<T>().ok(),
            _ => None,
        }
    }
}

/// Positional argument of a wire invocation
#[derive(Clone)]
pub enum Arg {
    Value(Value),
    Event(UiEvent),
    Callback(Callback),
}

impl fmt::Debug for Arg {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            Arg::Value(v) => f.debug_tuple("Value").field(v).finish(),
            Arg::Event(e) => f.debug_tuple("Event").field(e).finish(),
            Arg::Callback(_) => f.write_str("Callback(..)"),
        }
    }
}

impl PartialEq for Arg {
    fn eq(
        &self,
        other: &Self,
    ) -> bool {
        match (self, other) {
            (Arg::Value(a), Arg::Value(b)) => a == b,
            (Arg::Event(a), Arg::Event(b)) => a == b,
            (Arg::Callback(a), Arg::Callback(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl From<Value> for Arg {
    fn from(value: Value) -> Self {
        Arg::Value(value)
    }
}

impl From<&str> for Arg {
    fn from(value: &str) -> Self {
        Arg::Value(Value::String(value.to_string()))
    }
}

impl From<String> for Arg {
    fn from(value: String) -> Self {
        Arg::Value(Value::String(value))
    }
}

impl From<bool> for Arg {
    fn from(value: bool) -> Self {
        Arg::Value(Value::Bool(value))
    }
}

impl From<i64> for Arg {
    fn from(value: i64) -> Self {
        Arg::Value(Value::from(value))
    }
}

impl From<UiEvent> for Arg {
    fn from(event: UiEvent) -> Self {
        Arg::Event(event)
    }
}

impl Arg {
    pub fn callback(f: impl Fn(Vec<Value>) + Send + Sync + 'static) -> Self {
        Arg::Callback(Arc::new(f))
    }
}

/// Positional accessors used by capabilities to read their arguments
pub(crate) struct Args<'a> {
    capability: &'static str,
    args: &'a [Arg],
}

impl<'a> Args<'a> {
    pub(crate) fn new(
        capability: &'static str,
        args: &'a [Arg],
    ) -> Self {
        Self { capability, args }
    }

    pub(crate) fn string(
        &self,
        index: usize,
    ) -> Result<String> {
        match self.args.get(index) {
            Some(Arg::Value(Value::String(s))) => Ok(s.clone()),
            Some(_) => Err(self.invalid(index, "a string")),
            None => Err(DispatchError::MissingArgument {
                capability: self.capability,
                index,
            }
            .into()),
        }
    }

    /// Missing arguments read as `Null`.
    pub(crate) fn value(
        &self,
        index: usize,
    ) -> Result<Value> {
        match self.args.get(index) {
            Some(Arg::Value(v)) => Ok(v.clone()),
            None => Ok(Value::Null),
            Some(_) => Err(self.invalid(index, "a value")),
        }
    }

    /// Missing arguments take `default`. Anything passed, `Null` included, is
    /// coerced by truthiness.
    pub(crate) fn flag(
        &self,
        index: usize,
        default: bool,
    ) -> Result<bool> {
        match self.args.get(index) {
            None => Ok(default),
            Some(Arg::Value(v)) => Ok(crate::utils::data::is_truthy(v)),
            Some(_) => Err(self.invalid(index, "a flag")),
        }
    }

    pub(crate) fn callback(
        &self,
        index: usize,
    ) -> Result<Callback> {
        match self.args.get(index) {
            Some(Arg::Callback(cb)) => Ok(cb.clone()),
            Some(_) => Err(self.invalid(index, "a callback")),
            None => Err(DispatchError::MissingArgument {
                capability: self.capability,
                index,
            }
            .into()),
        }
    }

    pub(crate) fn rest(
        &self,
        from: usize,
    ) -> Vec<Arg> {
        self.args.get(from..).map(<[Arg]>::to_vec).unwrap_or_default()
    }

    fn invalid(
        &self,
        index: usize,
        expected: &'static str,
    ) -> crate::Error {
        DispatchError::InvalidArgument {
            capability: self.capability,
            index,
            expected,
        }
        .into()
    }
}

type MethodFn = dyn Fn(Vec<Arg>) -> Invocation + Send + Sync;

/// Invocable produced by a capability factory or the fallback resolver
#[derive(Clone)]
pub struct WireMethod {
    name: Arc<str>,
    f: Arc<MethodFn>,
}

impl fmt::Debug for WireMethod {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct("WireMethod").field("name", &self.name).finish()
    }
}

impl WireMethod {
    pub fn new(
        name: impl Into<Arc<str>>,
        f: impl Fn(Vec<Arg>) -> Invocation + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            f: Arc::new(f),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn invoke(
        &self,
        args: Vec<Arg>,
    ) -> Invocation {
        (self.f)(args)
    }
}

/// Outcome of invoking a [`WireMethod`]
///
/// Synchronous capabilities answer with `Ready`; anything touching the
/// transport answers with a `Pending` future that does nothing until polled.
/// Both can be awaited.
pub enum Invocation {
    Ready(Result<WireValue>),
    Pending(BoxFuture<'static, Result<WireValue>>),
}

impl fmt::Debug for Invocation {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            Invocation::Ready(r) => f.debug_tuple("Ready").field(r).finish(),
            Invocation::Pending(_) => f.write_str("Pending(..)"),
        }
    }
}

impl Invocation {
    pub fn ready(value: impl Into<WireValue>) -> Self {
        Invocation::Ready(Ok(value.into()))
    }

    pub fn undefined() -> Self {
        Invocation::Ready(Ok(WireValue::Undefined))
    }

    pub fn error(err: impl Into<crate::Error>) -> Self {
        Invocation::Ready(Err(err.into()))
    }

    pub fn pending<F>(fut: F) -> Self
    where
        F: Future<Output = Result<WireValue>> + Send + 'static,
    {
        Invocation::Pending(fut.boxed())
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, Invocation::Ready(_))
    }

    /// Take a synchronous result; fails with [`DispatchError::Pending`] when
    /// the invocation needs to be awaited.
    pub fn now(
        self,
        property: &str,
    ) -> Result<WireValue> {
        match self {
            Invocation::Ready(result) => result,
            Invocation::Pending(_) => Err(DispatchError::Pending {
                property: property.to_string(),
            }
            .into()),
        }
    }
}

impl IntoFuture for Invocation {
    type Output = Result<WireValue>;
    type IntoFuture = BoxFuture<'static, Result<WireValue>>;

    fn into_future(self) -> Self::IntoFuture {
        match self {
            Invocation::Ready(result) => futures::future::ready(result).boxed(),
            Invocation::Pending(fut) => fut,
        }
    }
}
