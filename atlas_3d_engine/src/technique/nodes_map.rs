/// Distance-sorted collection of render nodes.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::Arc;
use crate::scene::RenderNode;

/// Totally ordered `f32` key. `+inf` sorts after every finite distance.
#[derive(Debug, Clone, Copy)]
pub struct DistanceKey(pub f32);

impl DistanceKey {
    pub fn value(&self) -> f32 {
        self.0
    }
}

impl PartialEq for DistanceKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for DistanceKey {}

impl PartialOrd for DistanceKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for DistanceKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl From<f32> for DistanceKey {
    fn from(value: f32) -> Self {
        DistanceKey(value)
    }
}

/// Nodes grouped by key; nodes sharing a key keep their insertion order
#[derive(Debug, Default)]
pub struct NodesMap {
    nodes: BTreeMap<DistanceKey, Vec<Arc<RenderNode>>>,
}

impl NodesMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<DistanceKey>, node: Arc<RenderNode>) {
        self.nodes.entry(key.into()).or_default().push(node);
    }

    /// Number of nodes, all keys included
    pub fn len(&self) -> usize {
        self.nodes.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Keys in ascending order, one per node
    pub fn keys(&self) -> Vec<f32> {
        self.nodes
            .iter()
            .flat_map(|(key, nodes)| std::iter::repeat(key.0).take(nodes.len()))
            .collect()
    }

    /// Nodes in ascending key order
    pub fn iter(&self) -> impl Iterator<Item = &Arc<RenderNode>> {
        self.nodes.values().flatten()
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
    }
}

#[cfg(test)]
#[path = "nodes_map_tests.rs"]
mod tests;
