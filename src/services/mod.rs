//! Collaborator contracts consumed by wire handles
//!
//! Everything that leaves this crate goes through one of these traits:
//! - [`Transport`] - commit pending state / call server methods
//! - [`EventBus`] - `$on`, `$dispatch`, `$dispatchSelf`, `$dispatchTo`
//! - [`UploadManager`] - `$upload`, `$uploadMultiple`, `$removeUpload`
//! - [`Entangler`] - two-way bound accessors for `$entangle`
//! - [`ComponentTree`] - DOM anchor to component lookups for `$parent`
//!
//! Arguments of the event and upload primitives are forwarded verbatim.
mod channel;

pub use channel::*;

#[cfg(test)]
mod channel_test;

use std::sync::Arc;

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use serde_json::Value;

use crate::Arg;
use crate::ComponentRef;
use crate::DispatchError;
use crate::NodeId;
use crate::Result;
use crate::WireValue;

#[cfg_attr(test, automock)]
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    /// Flushes pending local mutations of `component` to the server.
    ///
    /// # Errors
    /// Transport failures are returned as-is to whoever awaited the
    /// `$set`/`$commit` that issued the request.
    async fn request_commit(
        &self,
        component: ComponentRef,
    ) -> Result<()>;

    /// Invokes `method` on the server-side counterpart of `component`.
    async fn request_call(
        &self,
        component: ComponentRef,
        method: String,
        params: Vec<Value>,
    ) -> Result<Value>;
}

#[cfg_attr(test, automock)]
pub trait EventBus: Send + Sync + 'static {
    fn listen(
        &self,
        component: ComponentRef,
        params: Vec<Arg>,
    ) -> Result<WireValue>;

    fn dispatch(
        &self,
        component: ComponentRef,
        params: Vec<Arg>,
    ) -> Result<WireValue>;

    fn dispatch_self(
        &self,
        component: ComponentRef,
        params: Vec<Arg>,
    ) -> Result<WireValue>;

    fn dispatch_to(
        &self,
        component: ComponentRef,
        params: Vec<Arg>,
    ) -> Result<WireValue>;
}

#[cfg_attr(test, automock)]
#[async_trait]
pub trait UploadManager: Send + Sync + 'static {
    async fn upload(
        &self,
        component: ComponentRef,
        params: Vec<Arg>,
    ) -> Result<WireValue>;

    async fn upload_multiple(
        &self,
        component: ComponentRef,
        params: Vec<Arg>,
    ) -> Result<WireValue>;

    async fn remove_upload(
        &self,
        component: ComponentRef,
        params: Vec<Arg>,
    ) -> Result<WireValue>;
}

#[cfg_attr(test, automock)]
pub trait Entangler: Send + Sync + 'static {
    /// Produces an accessor kept in sync with `name` on `component`.
    fn entangle(
        &self,
        component: ComponentRef,
        name: String,
        live: bool,
    ) -> Result<WireValue>;
}

#[cfg_attr(test, automock)]
pub trait ComponentTree: Send + Sync + 'static {
    fn parent_element(
        &self,
        node: NodeId,
    ) -> Option<NodeId>;

    /// Nearest component owning `node`, `node` itself included.
    fn closest_component(
        &self,
        node: NodeId,
    ) -> Option<ComponentRef>;
}

/// Stand-in for collaborators that were not wired into the runtime.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unavailable;

impl Unavailable {
    fn fail<T>(service: &'static str) -> Result<T> {
        Err(DispatchError::ServiceUnavailable { service }.into())
    }
}

#[async_trait]
impl Transport for Unavailable {
    async fn request_commit(
        &self,
        _component: ComponentRef,
    ) -> Result<()> {
        Self::fail("transport")
    }

    async fn request_call(
        &self,
        _component: ComponentRef,
        _method: String,
        _params: Vec<Value>,
    ) -> Result<Value> {
        Self::fail("transport")
    }
}

impl EventBus for Unavailable {
    fn listen(
        &self,
        _component: ComponentRef,
        _params: Vec<Arg>,
    ) -> Result<WireValue> {
        Self::fail("events")
    }

    fn dispatch(
        &self,
        _component: ComponentRef,
        _params: Vec<Arg>,
    ) -> Result<WireValue> {
        Self::fail("events")
    }

    fn dispatch_self(
        &self,
        _component: ComponentRef,
        _params: Vec<Arg>,
    ) -> Result<WireValue> {
        Self::fail("events")
    }

    fn dispatch_to(
        &self,
        _component: ComponentRef,
        _params: Vec<Arg>,
    ) -> Result<WireValue> {
        Self::fail("events")
    }
}

#[async_trait]
impl UploadManager for Unavailable {
    async fn upload(
        &self,
        _component: ComponentRef,
        _params: Vec<Arg>,
    ) -> Result<WireValue> {
        Self::fail("uploads")
    }

    async fn upload_multiple(
        &self,
        _component: ComponentRef,
        _params: Vec<Arg>,
    ) -> Result<WireValue> {
        Self::fail("uploads")
    }

    async fn remove_upload(
        &self,
        _component: ComponentRef,
        _params: Vec<Arg>,
    ) -> Result<WireValue> {
        Self::fail("uploads")
    }
}

impl Entangler for Unavailable {
    fn entangle(
        &self,
        _component: ComponentRef,
        _name: String,
        _live: bool,
    ) -> Result<WireValue> {
        Self::fail("entangle")
    }
}

impl ComponentTree for Unavailable {
    fn parent_element(
        &self,
        _node: NodeId,
    ) -> Option<NodeId> {
        None
    }

    fn closest_component(
        &self,
        _node: NodeId,
    ) -> Option<ComponentRef> {
        None
    }
}

/// The collaborators a runtime dispatches to
#[derive(Clone)]
pub struct WireServices {
    pub transport: Arc<dyn Transport>,
    pub events: Arc<dyn EventBus>,
    pub uploads: Arc<dyn UploadManager>,
    pub entangler: Arc<dyn Entangler>,
    pub tree: Arc<dyn ComponentTree>,
}

impl Default for WireServices {
    fn default() -> Self {
        Self {
            transport: Arc::new(Unavailable),
            events: Arc::new(Unavailable),
            uploads: Arc::new(Unavailable),
            entangler: Arc::new(Unavailable),
            tree: Arc::new(Unavailable),
        }
    }
}

impl std::fmt::Debug for WireServices {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("WireServices").finish_non_exhaustive()
    }
}
