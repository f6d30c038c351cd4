mod builder;

pub use builder::IndexBuilder;

use crate::project::AssetId;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::{Dfs, EdgeRef};
use petgraph::Direction;
use std::collections::{HashMap, HashSet};

/// Project-wide asset dependency graph
///
/// Nodes are assets, an edge `A -> B` means A's serialized data references B.
/// The graph is a general directed graph; prefab variants and mutually
/// referencing scriptable objects produce cycles.
#[derive(Debug, Default)]
pub struct DependencyIndex {
    /// Nodes are AssetIds, edges carry no data
    inner: DiGraph<AssetId, ()>,

    /// Map from AssetId to node index
    node_map: HashMap<AssetId, NodeIndex>,

    /// Assets whose dependencies could not be read
    unreadable: HashSet<AssetId>,
}

impl DependencyIndex {
    pub fn new() -> Self {
        Self::default()
    }

    fn ensure_node(&mut self, id: &AssetId) -> NodeIndex {
        if let Some(&idx) = self.node_map.get(id) {
            return idx;
        }
        let idx = self.inner.add_node(id.clone());
        self.node_map.insert(id.clone(), idx);
        idx
    }

    /// Register an asset without edges
    pub fn add_asset(&mut self, id: &AssetId) {
        self.ensure_node(id);
    }

    /// Record that `from` references `to`. Self references and duplicates are ignored.
    pub fn add_dependency(&mut self, from: &AssetId, to: &AssetId) {
        if from == to {
            return;
        }
        let from_idx = self.ensure_node(from);
        let to_idx = self.ensure_node(to);
        if self.inner.find_edge(from_idx, to_idx).is_none() {
            self.inner.add_edge(from_idx, to_idx, ());
        }
    }

    pub fn mark_unreadable(&mut self, id: &AssetId) {
        self.ensure_node(id);
        self.unreadable.insert(id.clone());
    }

    pub fn is_unreadable(&self, id: &AssetId) -> bool {
        self.unreadable.contains(id)
    }

    pub fn contains(&self, id: &AssetId) -> bool {
        self.node_map.contains_key(id)
    }

    /// Structural references of an asset, direct only or transitive.
    ///
    /// The transitive set holds everything reachable through one or more
    /// edges; the asset itself only appears when it sits on a cycle.
    /// Unknown assets yield an empty set.
    pub fn dependencies(&self, id: &AssetId, transitive: bool) -> HashSet<AssetId> {
        let Some(&start) = self.node_map.get(id) else {
            return HashSet::new();
        };

        if !transitive {
            return self.direct(start).cloned().collect();
        }

        let mut seen: HashSet<NodeIndex> = HashSet::new();
        let mut stack: Vec<NodeIndex> = self
            .inner
            .neighbors_directed(start, Direction::Outgoing)
            .collect();
        while let Some(node) = stack.pop() {
            if !seen.insert(node) {
                continue;
            }
            stack.extend(self.inner.neighbors_directed(node, Direction::Outgoing));
        }

        seen.into_iter()
            .filter_map(|idx| self.inner.node_weight(idx).cloned())
            .collect()
    }

    /// The asset together with everything it transitively references
    pub fn closure(&self, id: &AssetId) -> HashSet<AssetId> {
        let mut result = HashSet::new();
        result.insert(id.clone());

        let Some(&start) = self.node_map.get(id) else {
            return result;
        };

        let mut dfs = Dfs::new(&self.inner, start);
        while let Some(node_idx) = dfs.next(&self.inner) {
            if let Some(node_id) = self.inner.node_weight(node_idx) {
                result.insert(node_id.clone());
            }
        }
        result
    }

    fn direct(&self, idx: NodeIndex) -> impl Iterator<Item = &AssetId> {
        self.inner
            .edges_directed(idx, Direction::Outgoing)
            .filter_map(|edge| self.inner.node_weight(edge.target()))
    }

    /// Direct references as an iterator, empty for unknown assets
    pub fn direct_dependencies(&self, id: &AssetId) -> Vec<&AssetId> {
        match self.node_map.get(id) {
            Some(&idx) => self.direct(idx).collect(),
            None => Vec::new(),
        }
    }

    /// Whether the asset has any inbound or outbound edge
    pub fn has_edges(&self, id: &AssetId) -> bool {
        let Some(&idx) = self.node_map.get(id) else {
            return false;
        };

        self.inner
            .edges_directed(idx, Direction::Outgoing)
            .next()
            .is_some()
            || self
                .inner
                .edges_directed(idx, Direction::Incoming)
                .next()
                .is_some()
    }

    pub fn asset_count(&self) -> usize {
        self.inner.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.inner.edge_count()
    }
}
