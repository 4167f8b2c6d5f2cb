use dashmap::DashMap;

use crate::ComponentRef;
use crate::ComponentTree;
use crate::NodeId;

/// Minimal UI tree: parent links between nodes plus the component mounted
/// on each anchor node.
#[derive(Default)]
pub struct TestTree {
    parents: DashMap<NodeId, NodeId>,
    mounted: DashMap<NodeId, ComponentRef>,
}

impl TestTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attach(
        &self,
        child: NodeId,
        parent: NodeId,
    ) {
        self.parents.insert(child, parent);
    }

    pub fn mount(
        &self,
        component: &ComponentRef,
    ) {
        self.mounted.insert(component.el(), component.clone());
    }
}

impl ComponentTree for TestTree {
    fn parent_element(
        &self,
        node: NodeId,
    ) -> Option<NodeId> {
        self.parents.get(&node).map(|parent| *parent.value())
    }

    fn closest_component(
        &self,
        node: NodeId,
    ) -> Option<ComponentRef> {
        let mut current = Some(node);
        while let Some(node) = current {
            if let Some(component) = self.mounted.get(&node) {
                return Some(component.value().clone());
            }
            current = self.parent_element(node);
        }
        None
    }
}
