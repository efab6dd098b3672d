//! Per-round network graph: named nodes tagged sensor/sink, undirected links.
//!
//! Node and edge insertion order is preserved; routing explores neighbors in
//! that order so equal-length paths always resolve the same way.

use std::collections::HashMap;

use serde::Serialize;
use thiserror::Error;

use crate::reading::NodeId;
use crate::routing::{RoutingResolver, RoutingTable};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Sensor,
    Sink,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub id: NodeId,
    pub role: Role,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TopologyError {
    #[error("duplicate node id {0}")]
    DuplicateNode(NodeId),
    #[error("edge references unknown node {0}")]
    UnknownEndpoint(NodeId),
    #[error("self loop on {0}")]
    SelfLoop(NodeId),
    #[error("topology has no sink node")]
    MissingSink,
    #[error("topology has more than one sink: {0} and {1}")]
    MultipleSinks(NodeId, NodeId),
}

#[derive(Debug, Default)]
pub struct TopologyBuilder {
    nodes: Vec<Node>,
    edges: Vec<(NodeId, NodeId)>,
}

impl TopologyBuilder {
    pub fn new() -> Self { Self::default() }

    pub fn sensor(mut self, id: impl Into<NodeId>) -> Self {
        self.nodes.push(Node { id: id.into(), role: Role::Sensor });
        self
    }

    pub fn sink(mut self, id: impl Into<NodeId>) -> Self {
        self.nodes.push(Node { id: id.into(), role: Role::Sink });
        self
    }

    pub fn link(mut self, a: impl Into<NodeId>, b: impl Into<NodeId>) -> Self {
        self.edges.push((a.into(), b.into()));
        self
    }

    pub fn build(self) -> Result<Topology, TopologyError> {
        let mut index = HashMap::with_capacity(self.nodes.len());
        let mut sink: Option<usize> = None;
        for (i, node) in self.nodes.iter().enumerate() {
            if index.insert(node.id.clone(), i).is_some() {
                return Err(TopologyError::DuplicateNode(node.id.clone()));
            }
            if node.role == Role::Sink {
                if let Some(prev) = sink {
                    return Err(TopologyError::MultipleSinks(self.nodes[prev].id.clone(), node.id.clone()));
                }
                sink = Some(i);
            }
        }
        let sink = sink.ok_or(TopologyError::MissingSink)?;

        let mut adjacency = vec![Vec::new(); self.nodes.len()];
        let mut edges = Vec::with_capacity(self.edges.len());
        for (a, b) in self.edges {
            let ia = *index.get(&a).ok_or_else(|| TopologyError::UnknownEndpoint(a.clone()))?;
            let ib = *index.get(&b).ok_or_else(|| TopologyError::UnknownEndpoint(b.clone()))?;
            if ia == ib { return Err(TopologyError::SelfLoop(a)); }
            // undirected set semantics: a repeated pair is the same link
            if adjacency[ia].contains(&ib) { continue; }
            adjacency[ia].push(ib);
            adjacency[ib].push(ia);
            edges.push((ia, ib));
        }

        let mut topology = Topology { nodes: self.nodes, index, adjacency, edges, sink, routes: RoutingTable::default() };
        topology.routes = RoutingTable::toward_sink(&RoutingResolver, &topology);
        Ok(topology)
    }
}

#[derive(Debug)]
pub struct Topology {
    nodes: Vec<Node>,
    index: HashMap<NodeId, usize>,
    adjacency: Vec<Vec<usize>>,
    edges: Vec<(usize, usize)>,
    sink: usize,
    routes: RoutingTable,
}

impl Topology {
    /// `sensor-0 — sensor-1 — … — sensor-(n-1) — sink`
    pub fn linear(sensor_count: usize) -> Result<Self, TopologyError> {
        let mut builder = TopologyBuilder::new();
        for i in 0..sensor_count {
            builder = builder.sensor(format!("sensor-{i}"));
        }
        builder = builder.sink("sink");
        for i in 1..sensor_count {
            builder = builder.link(format!("sensor-{}", i - 1), format!("sensor-{i}"));
        }
        if sensor_count > 0 {
            builder = builder.link(format!("sensor-{}", sensor_count - 1), "sink");
        }
        builder.build()
    }

    pub fn nodes(&self) -> &[Node] { &self.nodes }

    pub fn sensors(&self) -> impl Iterator<Item = &Node> + '_ {
        self.nodes.iter().filter(|n| n.role == Role::Sensor)
    }

    pub fn sink(&self) -> &NodeId { &self.nodes[self.sink].id }

    pub fn node(&self, id: &NodeId) -> Option<&Node> { self.index.get(id).map(|&i| &self.nodes[i]) }

    pub fn role(&self, id: &NodeId) -> Option<Role> { self.node(id).map(|n| n.role) }

    pub fn edges(&self) -> impl Iterator<Item = (&NodeId, &NodeId)> + '_ {
        self.edges.iter().map(|&(a, b)| (&self.nodes[a].id, &self.nodes[b].id))
    }

    pub fn routes(&self) -> &RoutingTable { &self.routes }

    pub(crate) fn position(&self, id: &NodeId) -> Option<usize> { self.index.get(id).copied() }

    pub(crate) fn neighbors(&self, i: usize) -> &[usize] { &self.adjacency[i] }

    pub(crate) fn id_at(&self, i: usize) -> &NodeId { &self.nodes[i].id }
}
