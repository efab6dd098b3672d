//! Round lifecycle: wire a fresh network, run every sensor to completion, tear down.

use std::sync::Arc;

use anyhow::Result;
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{info, warn};
use uiot_core::{SimConfig, TeardownPolicy};

use crate::agents::{Mesh, SensorAgent, SensorParams};
use crate::collector::CollectorSink;
use crate::events::{EventBus, RoundStats, SimEvent};
use crate::fog::FogAggregator;
use crate::rng::SimRng;
use crate::tasks::TaskGroup;
use crate::topology::Topology;
use crate::uplink::UplinkChannel;
use crate::visualize::Visualizer;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoundReport {
    pub round_id: u64,
    pub generated: u64,
    pub emergencies: u64,
    pub normal_delivered: u64,
    pub routing_drops: u64,
    pub channel_losses: u64,
    pub batches_flushed: u64,
    pub batches_collected: u64,
    pub residual_buffer: usize,
    /// No round task was still running when the report was taken.
    pub quiescent: bool,
}

pub struct RoundScheduler {
    config: SimConfig,
    visualizer: Arc<dyn Visualizer>,
    rng: SimRng,
    subscriber: Option<mpsc::UnboundedSender<SimEvent>>,
}

impl RoundScheduler {
    pub fn new(config: SimConfig, visualizer: Arc<dyn Visualizer>) -> Self {
        let rng = SimRng::new(config.seed);
        Self { config, visualizer, rng, subscriber: None }
    }

    /// Mirror every round's events to `tx`.
    pub fn with_event_subscriber(mut self, tx: mpsc::UnboundedSender<SimEvent>) -> Self {
        self.subscriber = Some(tx);
        self
    }

    pub fn config(&self) -> &SimConfig { &self.config }

    pub async fn run_round(&self, round_id: u64) -> Result<RoundReport> {
        let cfg = &self.config;
        info!(round_id, sensors = cfg.sensor_count, cycles = cfg.cycles_per_round, "round_started");

        let topology = Arc::new(Topology::linear(cfg.sensor_count)?);
        let mut events = EventBus::new(round_id);
        if let Some(tx) = &self.subscriber {
            events = events.with_subscriber(tx.clone());
        }
        let tasks = TaskGroup::new();
        let collector = Arc::new(CollectorSink::new(cfg.collector_latency(), self.visualizer.clone(), events.clone()));
        let fog = Arc::new(FogAggregator::new(cfg.batch_capacity, collector, tasks.clone(), events.clone()));
        let uplink = Arc::new(UplinkChannel::new(
            cfg.uplink_latency(),
            cfg.uplink_loss_probability,
            self.rng.clone(),
            fog.clone(),
            topology.sink().clone(),
            events.clone(),
        ));

        if let Err(e) = self.visualizer.on_topology_snapshot(&topology, round_id) {
            warn!(error = ?e, round_id, "visualizer_topology_failed");
        }

        let mesh = Mesh::new(topology.clone(), uplink, cfg.hop_delay(), tasks.clone(), events.clone());
        let params = SensorParams {
            cycles: cfg.cycles_per_round,
            interval: cfg.reading_interval(),
            sample_min: cfg.sample_min,
            sample_max: cfg.sample_max,
            threshold: cfg.emergency_threshold,
        };
        let sensors = topology
            .sensors()
            .map(|node| SensorAgent::new(node.id.clone(), params, self.rng.clone(), mesh.clone()).run());
        futures::future::join_all(sensors).await;
        info!(round_id, in_flight = tasks.in_flight(), "sensors_finished");

        let quiescent = match cfg.teardown {
            TeardownPolicy::Quiesce => tasks.quiesce(cfg.teardown_timeout()).await,
            TeardownPolicy::Grace => {
                tokio::time::sleep(cfg.teardown_timeout()).await;
                tasks.in_flight() == 0
            }
            TeardownPolicy::Detach => tasks.in_flight() == 0,
        };

        let s = events.stats();
        let report = RoundReport {
            round_id,
            generated: RoundStats::get(&s.generated),
            emergencies: RoundStats::get(&s.emergencies),
            normal_delivered: RoundStats::get(&s.normal_delivered),
            routing_drops: RoundStats::get(&s.routing_drops),
            channel_losses: RoundStats::get(&s.channel_losses),
            batches_flushed: RoundStats::get(&s.batches_flushed),
            batches_collected: RoundStats::get(&s.batches_collected),
            residual_buffer: fog.buffer_len(),
            quiescent,
        };
        info!(round_id, ?report, "round_finished");
        Ok(report)
    }

    /// Rounds `1..=n`, one after another, with the configured pause between them.
    pub async fn run_many(&self, n: u64) -> Result<Vec<RoundReport>> {
        let mut reports = Vec::new();
        for round_id in 1..=n {
            reports.push(self.run_round(round_id).await?);
            if round_id < n {
                tokio::time::sleep(self.config.round_pause()).await;
            }
        }
        Ok(reports)
    }
}
