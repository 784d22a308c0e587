//! Execution planner - builds ordered resource execution plans

use crate::resource::BoxedResource;

/// An execution plan: resources applied strictly in insertion order
pub struct ExecutionPlan<E> {
    pub resources: Vec<BoxedResource<E>>,
}

impl<E> ExecutionPlan<E> {
    /// Create a new empty plan
    pub fn new() -> Self {
        Self {
            resources: Vec::new(),
        }
    }

    /// Append a resource to the plan
    pub fn add_resource(&mut self, resource: BoxedResource<E>) {
        self.resources.push(resource);
    }

    /// Total number of resources in the plan
    pub fn len(&self) -> usize {
        self.resources.len()
    }

    /// Check if plan is empty
    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}

impl<E> Default for ExecutionPlan<E> {
    fn default() -> Self {
        Self::new()
    }
}
