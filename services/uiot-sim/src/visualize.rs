//! Visualization collaborator boundary plus the bundled rolling-history recorder.
//!
//! The recorder keeps the last `capacity` `(timestamp, value)` points across
//! rounds and, when given a directory, writes one JSON artifact per update:
//! `sensor_data_round{N}.json` and `network_topology_round{N}.json`.

use std::collections::VecDeque;
use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use parking_lot::Mutex;
use serde::Serialize;
use tracing::info;

use crate::reading::Batch;
use crate::topology::{Role, Topology};

pub trait Visualizer: Send + Sync {
    fn on_batch_flushed(&self, batch: &Batch, round_id: u64) -> Result<()>;
    fn on_topology_snapshot(&self, topology: &Topology, round_id: u64) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Point {
    pub timestamp: u64,
    pub value: f64,
}

#[derive(Serialize)]
struct ScatterArtifact<'a> {
    round_id: u64,
    points: &'a [Point],
}

#[derive(Serialize)]
struct NodeView<'a> {
    id: &'a str,
    role: Role,
    highlight: bool,
}

#[derive(Serialize)]
struct TopologyArtifact<'a> {
    round_id: u64,
    nodes: Vec<NodeView<'a>>,
    edges: Vec<[&'a str; 2]>,
}

pub struct RollingHistory {
    capacity: usize,
    points: Mutex<VecDeque<Point>>,
    artifacts_dir: Option<PathBuf>,
}

impl RollingHistory {
    pub fn new(capacity: usize) -> Self {
        Self { capacity: capacity.max(1), points: Mutex::new(VecDeque::with_capacity(capacity)), artifacts_dir: None }
    }

    pub fn with_artifacts_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.artifacts_dir = Some(dir.into());
        self
    }

    /// Oldest first.
    pub fn points(&self) -> Vec<Point> { self.points.lock().iter().copied().collect() }

    pub fn len(&self) -> usize { self.points.lock().len() }

    pub fn is_empty(&self) -> bool { self.points.lock().is_empty() }

    fn write_artifact<T: Serialize>(&self, name: String, body: &T) -> Result<()> {
        let Some(dir) = &self.artifacts_dir else { return Ok(()) };
        fs::create_dir_all(dir).with_context(|| format!("create artifacts dir {}", dir.display()))?;
        let path = dir.join(name);
        fs::write(&path, serde_json::to_vec_pretty(body)?).with_context(|| format!("write {}", path.display()))?;
        info!(path = %path.display(), "artifact_saved");
        Ok(())
    }
}

impl Visualizer for RollingHistory {
    fn on_batch_flushed(&self, batch: &Batch, round_id: u64) -> Result<()> {
        let snapshot: Vec<Point> = {
            let mut points = self.points.lock();
            for r in batch.readings() {
                points.push_back(Point { timestamp: r.timestamp, value: r.value });
            }
            while points.len() > self.capacity {
                points.pop_front();
            }
            points.iter().copied().collect()
        };
        info!(round_id, window = snapshot.len(), "history_updated");
        self.write_artifact(format!("sensor_data_round{round_id}.json"), &ScatterArtifact { round_id, points: &snapshot })
    }

    fn on_topology_snapshot(&self, topology: &Topology, round_id: u64) -> Result<()> {
        let nodes = topology
            .nodes()
            .iter()
            .map(|n| NodeView { id: n.id.as_str(), role: n.role, highlight: n.role == Role::Sink })
            .collect();
        let edges = topology.edges().map(|(a, b)| [a.as_str(), b.as_str()]).collect();
        info!(round_id, nodes = topology.nodes().len(), "topology_snapshot");
        self.write_artifact(format!("network_topology_round{round_id}.json"), &TopologyArtifact { round_id, nodes, edges })
    }
}
