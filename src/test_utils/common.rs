use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value;

use crate::Component;
use crate::ComponentRef;
use crate::MockTransport;
use crate::NodeId;
use crate::WireConfig;
use crate::WireRuntime;
use crate::WireRuntimeBuilder;

/// Runtime with default configuration and no collaborators.
pub fn test_runtime() -> WireRuntime {
    WireRuntime::builder().build().expect("default config is valid")
}

/// Runtime builder pre-wired with `transport`.
pub fn runtime_builder(transport: MockTransport) -> WireRuntimeBuilder {
    WireRuntime::builder().transport(Arc::new(transport))
}

pub fn runtime_with_transport(transport: MockTransport) -> WireRuntime {
    runtime_builder(transport).build().expect("default config is valid")
}

pub fn runtime_with_config(config: WireConfig) -> WireRuntime {
    WireRuntime::builder().config(config).build().expect("config is valid")
}

/// Component named `name` anchored at `el` with the given reactive state.
pub fn mount(
    runtime: &WireRuntime,
    name: &str,
    el: u64,
    reactive: Value,
) -> ComponentRef {
    runtime.component(Component::builder(name).el(NodeId(el)).reactive(reactive))
}

/// Collects watch callback invocations.
#[derive(Clone, Default)]
pub struct Recorder {
    calls: Arc<Mutex<Vec<(Value, Value)>>>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn callback(&self) -> impl Fn(Value, Value) + Send + Sync + 'static {
        let calls = self.calls.clone();
        move |new, old| calls.lock().push((new, old))
    }

    pub fn calls(&self) -> Vec<(Value, Value)> {
        self.calls.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.calls.lock().len()
    }
}
