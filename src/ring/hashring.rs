use std::collections::{BTreeMap, BTreeSet};

use super::types::{NodeAddr, ReplicaSet, RingPosition, VirtualNode};

pub const DEFAULT_VIRTUAL_NODES: u32 = 3;

/// Consistent-hash ring with virtual nodes.
///
/// Positions live in an ordered map so `remove` costs O(V log K) and a lookup
/// is a single range query followed by a clockwise walk. A position shared by
/// several virtual nodes keeps all of them in one bucket, sorted by address.
#[derive(Debug, Clone)]
pub struct HashRing {
    virtual_nodes: u32,
    positions: BTreeMap<RingPosition, Vec<NodeAddr>>,
    nodes: BTreeSet<NodeAddr>,
}

impl HashRing {
    pub fn new(virtual_nodes: u32) -> Self {
        Self {
            virtual_nodes: virtual_nodes.max(1),
            positions: BTreeMap::new(),
            nodes: BTreeSet::new(),
        }
    }

    pub fn virtual_nodes(&self) -> u32 {
        self.virtual_nodes
    }

    fn virtual_nodes_of(&self, node: &NodeAddr) -> Vec<VirtualNode> {
        (0..self.virtual_nodes)
            .map(|index| VirtualNode::new(node.clone(), index))
            .collect()
    }

    /// Places the node's virtual nodes on the ring.
    ///
    /// Returns `false` if the node was already present; the ring is untouched.
    pub fn insert(&mut self, node: &NodeAddr) -> bool {
        if !self.nodes.insert(node.clone()) {
            return false;
        }

        for vnode in self.virtual_nodes_of(node) {
            let bucket = self.positions.entry(vnode.position()).or_default();
            if let Err(slot) = bucket.binary_search(node) {
                bucket.insert(slot, node.clone());
            }
        }

        true
    }

    /// Removes every position owned by the node. Returns `false` if absent.
    pub fn remove(&mut self, node: &NodeAddr) -> bool {
        if !self.nodes.remove(node) {
            return false;
        }

        for vnode in self.virtual_nodes_of(node) {
            let position = vnode.position();
            if let Some(bucket) = self.positions.get_mut(&position) {
                bucket.retain(|owner| owner != node);
                if bucket.is_empty() {
                    self.positions.remove(&position);
                }
            }
        }

        true
    }

    /// Up to `count` distinct physical nodes for `key`, primary first.
    ///
    /// The walk starts at the first position at or after the key's position
    /// and wraps past the top of the ring. An empty ring yields an empty set.
    pub fn lookup(&self, key: &str, count: usize) -> ReplicaSet {
        let wanted = count.min(self.nodes.len());
        let mut found: Vec<NodeAddr> = Vec::with_capacity(wanted);
        if wanted == 0 {
            return ReplicaSet::new(found);
        }

        let start = RingPosition::of(key);
        let clockwise = self
            .positions
            .range(start..)
            .chain(self.positions.range(..start));

        'walk: for (_, bucket) in clockwise {
            for owner in bucket {
                if !found.contains(owner) {
                    found.push(owner.clone());
                    if found.len() == wanted {
                        break 'walk;
                    }
                }
            }
        }

        ReplicaSet::new(found)
    }

    pub fn contains(&self, node: &NodeAddr) -> bool {
        self.nodes.contains(node)
    }

    /// Physical nodes in address order.
    pub fn nodes(&self) -> Vec<NodeAddr> {
        self.nodes.iter().cloned().collect()
    }

    /// Every occupied `(position, owner)` pair in ring order.
    pub fn positions(&self) -> Vec<(RingPosition, NodeAddr)> {
        self.positions
            .iter()
            .flat_map(|(position, bucket)| bucket.iter().map(move |owner| (*position, owner.clone())))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

impl Default for HashRing {
    fn default() -> Self {
        Self::new(DEFAULT_VIRTUAL_NODES)
    }
}
