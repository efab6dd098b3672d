//! Hop-count shortest paths over a [`Topology`].
//!
//! `resolve` is a plain BFS. `next_hop` answers from the per-topology
//! [`RoutingTable`], which is filled once at construction from the same BFS so
//! both always agree.

use std::collections::{HashMap, VecDeque};

use thiserror::Error;

use crate::reading::NodeId;
use crate::topology::Topology;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RoutingError {
    #[error("node {0} is not part of the topology")]
    UnknownNode(NodeId),
    #[error("no path from {from} to {to}")]
    NoPath { from: NodeId, to: NodeId },
    #[error("path from {0} has fewer than two nodes")]
    DegeneratePath(NodeId),
}

/// Stateless resolver; deterministic for a fixed topology.
#[derive(Debug, Clone, Copy, Default)]
pub struct RoutingResolver;

impl RoutingResolver {
    pub fn resolve(&self, topology: &Topology, from: &NodeId, to: &NodeId) -> Result<Vec<NodeId>, RoutingError> {
        let start = topology.position(from).ok_or_else(|| RoutingError::UnknownNode(from.clone()))?;
        let goal = topology.position(to).ok_or_else(|| RoutingError::UnknownNode(to.clone()))?;
        if start == goal { return Ok(vec![from.clone()]); }

        let mut parent: Vec<Option<usize>> = vec![None; topology.nodes().len()];
        let mut visited = vec![false; topology.nodes().len()];
        let mut queue = VecDeque::from([start]);
        visited[start] = true;
        while let Some(cur) = queue.pop_front() {
            if cur == goal { break; }
            for &next in topology.neighbors(cur) {
                if !visited[next] {
                    visited[next] = true;
                    parent[next] = Some(cur);
                    queue.push_back(next);
                }
            }
        }
        if !visited[goal] {
            return Err(RoutingError::NoPath { from: from.clone(), to: to.clone() });
        }

        let mut path = vec![topology.id_at(goal).clone()];
        let mut cur = goal;
        while let Some(p) = parent[cur] {
            path.push(topology.id_at(p).clone());
            cur = p;
        }
        path.reverse();
        Ok(path)
    }

    /// `path[1]` toward the topology's sink.
    pub fn next_hop(&self, topology: &Topology, from: &NodeId) -> Result<NodeId, RoutingError> {
        topology.routes().lookup(from)
    }
}

/// Next-hop map toward the sink, one entry per node.
#[derive(Debug, Default)]
pub struct RoutingTable {
    next: HashMap<NodeId, Result<NodeId, RoutingError>>,
}

impl RoutingTable {
    pub(crate) fn toward_sink(resolver: &RoutingResolver, topology: &Topology) -> Self {
        let sink = topology.sink();
        let next = topology
            .nodes()
            .iter()
            .map(|node| {
                let hop = resolver.resolve(topology, &node.id, sink).and_then(|path| {
                    path.get(1).cloned().ok_or_else(|| RoutingError::DegeneratePath(node.id.clone()))
                });
                (node.id.clone(), hop)
            })
            .collect();
        Self { next }
    }

    pub fn lookup(&self, from: &NodeId) -> Result<NodeId, RoutingError> {
        self.next.get(from).cloned().unwrap_or_else(|| Err(RoutingError::UnknownNode(from.clone())))
    }
}
