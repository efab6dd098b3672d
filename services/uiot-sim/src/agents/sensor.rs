use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::events::SimEvent;
use crate::reading::{NodeId, Reading};
use crate::rng::SimRng;

use super::Mesh;

#[derive(Debug, Clone, Copy)]
pub struct SensorParams {
    pub cycles: u64,
    pub interval: Duration,
    pub sample_min: f64,
    pub sample_max: f64,
    pub threshold: f64,
}

/// Leaf sampler. One reading per cycle, relayed without waiting.
pub struct SensorAgent {
    id: NodeId,
    params: SensorParams,
    rng: SimRng,
    mesh: Arc<Mesh>,
}

impl SensorAgent {
    pub fn new(id: NodeId, params: SensorParams, rng: SimRng, mesh: Arc<Mesh>) -> Self { Self { id, params, rng, mesh } }

    /// Runs `cycles` readings and returns once the last relay has been launched.
    pub async fn run(self) -> u64 {
        let mut tick = 0;
        while tick < self.params.cycles {
            tokio::time::sleep(self.params.interval).await;
            tick += 1;
            let value = self.rng.sample(self.params.sample_min, self.params.sample_max);
            let reading = Reading::new(tick, self.id.clone(), value, self.params.threshold);
            self.mesh.events().emit(SimEvent::ReadingGenerated(reading.clone()));
            self.mesh.launch_forward(self.id.clone(), reading);
        }
        debug!(node = %self.id, cycles = tick, "sensor_finished");
        tick
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::CollectorSink;
    use crate::events::{EventBus, RoundStats};
    use crate::fog::FogAggregator;
    use crate::tasks::TaskGroup;
    use crate::topology::Topology;
    use crate::uplink::UplinkChannel;
    use crate::visualize::RollingHistory;

    #[tokio::test(start_paused = true)]
    async fn runs_fixed_cycles_without_waiting_for_relay() {
        let (bus, mut rx) = EventBus::channel(1);
        let tasks = TaskGroup::new();
        let collector = Arc::new(CollectorSink::new(Duration::ZERO, Arc::new(RollingHistory::new(4)), bus.clone()));
        let fog = Arc::new(FogAggregator::new(100, collector, tasks.clone(), bus.clone()));
        let topology = Arc::new(Topology::linear(3).unwrap());
        // uplink far slower than the whole sensing loop
        let uplink = Arc::new(UplinkChannel::new(Duration::from_secs(3600), 0.0, SimRng::seeded(1), fog.clone(), "sink".into(), bus.clone()));
        let mesh = Mesh::new(topology, uplink, Duration::from_millis(200), tasks.clone(), bus.clone());
        let params = SensorParams { cycles: 4, interval: Duration::from_secs(5), sample_min: 10.0, sample_max: 120.0, threshold: 80.0 };

        let start = tokio::time::Instant::now();
        let done = SensorAgent::new("sensor-0".into(), params, SimRng::seeded(5), mesh).run().await;
        assert_eq!(done, 4);
        assert!(start.elapsed() < Duration::from_secs(3600));
        assert_eq!(fog.buffer_len(), 0);
        assert_eq!(RoundStats::get(&bus.stats().generated), 4);

        let mut ticks = Vec::new();
        while let Ok(ev) = rx.try_recv() {
            if let SimEvent::ReadingGenerated(r) = ev {
                assert_eq!(r.source.as_str(), "sensor-0");
                assert_eq!(r.is_emergency(), r.value > 80.0);
                ticks.push(r.timestamp);
            }
        }
        assert_eq!(ticks, [1, 2, 3, 4]);
        tasks.abort_all();
    }
}
