use bevy::prelude::*;
use std::collections::HashMap;

use crate::network::NodeId;

/// Receives a notification whenever something cached per node (lane
/// connections, path-graph views) has to be rebuilt.
pub trait NodeObserver {
    fn notify(&mut self, node: NodeId);
}

/// Records notified nodes in order.
impl NodeObserver for Vec<NodeId> {
    fn notify(&mut self, node: NodeId) {
        self.push(node);
    }
}

/// Per-node change generations.
///
/// Consumers remember the generation they built against and rebuild when it
/// moves, the same way one-way edits are detected.
#[derive(Resource, Default, Debug)]
pub struct NodeInvalidations {
    nodes: HashMap<NodeId, u32>,
    /// Bumped on every notification, for consumers that watch all nodes.
    pub generation: u32,
}

impl NodeInvalidations {
    pub fn node_generation(&self, node: NodeId) -> u32 {
        self.nodes.get(&node).copied().unwrap_or(0)
    }
}

impl NodeObserver for NodeInvalidations {
    fn notify(&mut self, node: NodeId) {
        let generation = self.nodes.entry(node).or_insert(0);
        *generation = generation.wrapping_add(1);
        self.generation = self.generation.wrapping_add(1);
    }
}
