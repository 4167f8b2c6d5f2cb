//! Wire runtime: the process-wide context every handle dispatches through.
//!
//! [`WireRuntime`] owns the property registry, the fallback resolver, the
//! reactivity system and the collaborator services. Handles hold a clone of
//! it, so everything registered on the runtime is visible from every handle,
//! including handles created before the registration.
//!
//! ## Example
//! ```ignore
//! let (transport, mut requests) = ChannelTransport::new(64);
//! let runtime = WireRuntime::builder()
//!     .transport(Arc::new(transport))
//!     .build()?;
//!
//! let counter = runtime.component(Component::builder("counter").reactive(json!({ "count": 0 })));
//! let wire = runtime.wire(&counter);
//! wire.set("count", json!(1), true).await?;
//! ```
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;
use tracing::info;

use super::fallback::Fallback;
use super::fallback::FallbackFactory;
use super::registry::PropertyFactory;
use super::registry::PropertyRegistry;
use crate::component::override_method;
use crate::reactive::ReactiveState;
use crate::reactive::Reactivity;
use crate::reactive::Scheduler;
use crate::Arg;
use crate::ComponentBuilder;
use crate::ComponentRef;
use crate::ComponentTree;
use crate::Entangler;
use crate::EventBus;
use crate::NodeId;
use crate::ParentMemoScope;
use crate::Result;
use crate::Transport;
use crate::UploadManager;
use crate::WireConfig;
use crate::WireHandle;
use crate::WireMethod;
use crate::WireServices;
use crate::WireValue;

struct RuntimeInner {
    config: WireConfig,
    registry: PropertyRegistry,
    fallback: Fallback,
    reactivity: Reactivity,
    services: WireServices,
    /// Shared `$parent` slot, used with [`ParentMemoScope::Global`]
    parent_memo: Mutex<Option<ComponentRef>>,
}

#[derive(Clone)]
pub struct WireRuntime {
    inner: Arc<RuntimeInner>,
}

impl std::fmt::Debug for WireRuntime {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("WireRuntime")
            .field("config", &self.inner.config)
            .field("registry", &self.inner.registry)
            .finish_non_exhaustive()
    }
}

impl WireRuntime {
    pub fn builder() -> WireRuntimeBuilder {
        WireRuntimeBuilder::new()
    }

    pub fn config(&self) -> &WireConfig {
        &self.inner.config
    }

    pub fn registry(&self) -> &PropertyRegistry {
        &self.inner.registry
    }

    pub fn fallback(&self) -> &Fallback {
        &self.inner.fallback
    }

    pub fn reactivity(&self) -> &Reactivity {
        &self.inner.reactivity
    }

    pub fn scheduler(&self) -> &Scheduler {
        self.inner.reactivity.scheduler()
    }

    pub fn services(&self) -> &WireServices {
        &self.inner.services
    }

    /// Build a component whose reactive state belongs to this runtime.
    pub fn component(
        &self,
        builder: ComponentBuilder,
    ) -> ComponentRef {
        builder.build(&self.inner.reactivity)
    }

    /// Handle over the component's own reactive state.
    pub fn wire(
        &self,
        component: &ComponentRef,
    ) -> WireHandle {
        self.make_wire_handle(component, component.reactive().clone())
    }

    /// Handle over an arbitrary state view.
    ///
    /// State-field reads and writes go to `state`; capabilities such as
    /// `$get`/`$set`/`$watch` keep targeting the component's reactive state.
    pub fn make_wire_handle(
        &self,
        component: &ComponentRef,
        state: ReactiveState,
    ) -> WireHandle {
        WireHandle::new(component.clone(), state, self.clone())
    }

    /// Handle of the nearest component owning `node`.
    pub fn wire_for_node(
        &self,
        node: NodeId,
    ) -> Option<WireHandle> {
        self.inner
            .services
            .tree
            .closest_component(node)
            .map(|component| self.wire(&component))
    }

    /// Add or replace a capability, visible from every handle at once.
    pub fn register_property<F>(
        &self,
        name: impl Into<String>,
        factory: F,
    ) where
        F: Fn(&WireHandle) -> WireValue + Send + Sync + 'static,
    {
        self.inner.registry.register_fn(name, factory);
    }

    pub fn register_property_factory(
        &self,
        name: impl Into<String>,
        factory: PropertyFactory,
    ) {
        self.inner.registry.register(name, factory);
    }

    /// Replace the resolver used for names nothing else claims.
    pub fn register_fallback<F>(
        &self,
        factory: F,
    ) where
        F: Fn(&WireHandle, &str) -> WireMethod + Send + Sync + 'static,
    {
        let factory: FallbackFactory = Arc::new(factory);
        self.inner.fallback.replace(factory);
        debug!("wire fallback replaced");
    }

    /// See [`override_method`].
    pub fn override_method<F>(
        &self,
        component: &ComponentRef,
        method: impl Into<String>,
        callback: F,
    ) where
        F: Fn(Vec<Arg>) -> Result<WireValue> + Send + Sync + 'static,
    {
        override_method(component, method, callback);
    }

    /// Run everything queued on the scheduler: pending effects and watch
    /// callbacks. Returns the number of tasks that ran.
    pub fn flush(&self) -> usize {
        self.inner.reactivity.scheduler().flush()
    }

    /// Nearest ancestor component of `component`, memoized per
    /// [`ParentMemoScope`]. A failed lookup is not remembered.
    pub(crate) fn parent_of(
        &self,
        component: &ComponentRef,
    ) -> Option<ComponentRef> {
        let scope = self.inner.config.parent.memo;
        let memoized = match scope {
            ParentMemoScope::Global => self.inner.parent_memo.lock().clone(),
            ParentMemoScope::Component => component.memoized_parent(),
        };
        if memoized.is_some() {
            return memoized;
        }

        let tree = &self.inner.services.tree;
        let parent = tree
            .parent_element(component.el())
            .and_then(|node| tree.closest_component(node))?;

        debug!(component = %component.id(), parent = %parent.id(), ?scope, "parent resolved");
        match scope {
            ParentMemoScope::Global => *self.inner.parent_memo.lock() = Some(parent.clone()),
            ParentMemoScope::Component => component.memoize_parent(parent.clone()),
        }
        Some(parent)
    }

    /// Tear down one component and forget it as the shared parent.
    pub fn teardown_component(
        &self,
        component: &ComponentRef,
    ) {
        component.teardown();
        let mut memo = self.inner.parent_memo.lock();
        if memo.as_ref().is_some_and(|parent| Arc::ptr_eq(parent, component)) {
            memo.take();
        }
    }

    /// Drop every registered property and the shared parent slot.
    pub fn teardown(&self) {
        self.inner.registry.clear();
        self.inner.parent_memo.lock().take();
        info!("wire runtime torn down");
    }
}

/// Builder for [`WireRuntime`]
///
/// Collaborators left unset answer with
/// [`DispatchError::ServiceUnavailable`](crate::DispatchError::ServiceUnavailable).
pub struct WireRuntimeBuilder {
    config: WireConfig,
    registry: Option<PropertyRegistry>,
    fallback: Option<FallbackFactory>,
    services: WireServices,
}

impl Default for WireRuntimeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl WireRuntimeBuilder {
    pub fn new() -> Self {
        Self {
            config: WireConfig::default(),
            registry: None,
            fallback: None,
            services: WireServices::default(),
        }
    }

    /// Replaces the runtime configuration
    pub fn config(
        mut self,
        config: WireConfig,
    ) -> Self {
        self.config = config;
        self
    }

    /// Uses `registry` as is instead of a registry with the builtins
    pub fn registry(
        mut self,
        registry: PropertyRegistry,
    ) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn fallback(
        mut self,
        fallback: FallbackFactory,
    ) -> Self {
        self.fallback = Some(fallback);
        self
    }

    pub fn services(
        mut self,
        services: WireServices,
    ) -> Self {
        self.services = services;
        self
    }

    pub fn transport(
        mut self,
        transport: Arc<dyn Transport>,
    ) -> Self {
        self.services.transport = transport;
        self
    }

    pub fn events(
        mut self,
        events: Arc<dyn EventBus>,
    ) -> Self {
        self.services.events = events;
        self
    }

    pub fn uploads(
        mut self,
        uploads: Arc<dyn UploadManager>,
    ) -> Self {
        self.services.uploads = uploads;
        self
    }

    pub fn entangler(
        mut self,
        entangler: Arc<dyn Entangler>,
    ) -> Self {
        self.services.entangler = entangler;
        self
    }

    pub fn tree(
        mut self,
        tree: Arc<dyn ComponentTree>,
    ) -> Self {
        self.services.tree = tree;
        self
    }

    /// Validates the configuration and assembles the runtime.
    ///
    /// # Errors
    /// Returns [`Error::Config`](crate::Error::Config) when validation fails.
    pub fn build(self) -> Result<WireRuntime> {
        let config = self.config.validate()?;

        let registry = self.registry.unwrap_or_else(|| {
            if config.dispatch.enable_aliases {
                PropertyRegistry::with_builtins()
            } else {
                let registry = PropertyRegistry::without_aliases();
                super::builtins::install(&registry);
                registry
            }
        });

        let fallback = self.fallback.map(Fallback::new).unwrap_or_default();
        let reactivity = Reactivity::new(Scheduler::new(config.watch.max_flush_tasks));

        debug!(?config, "wire runtime built");
        Ok(WireRuntime {
            inner: Arc::new(RuntimeInner {
                config,
                registry,
                fallback,
                reactivity,
                services: self.services,
                parent_memo: Mutex::new(None),
            }),
        })
    }
}
