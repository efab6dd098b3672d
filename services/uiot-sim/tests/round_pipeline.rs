//! End-to-end rounds on tokio's paused clock: simulated minutes run instantly.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use uiot_core::{SimConfig, TeardownPolicy};
use uiot_sim::{Batch, RoundScheduler, SimEvent, Topology, Visualizer};

#[derive(Default)]
struct Recorder {
    batches: Mutex<Vec<(u64, Batch)>>,
    snapshots: Mutex<Vec<(u64, usize)>>,
}

impl Visualizer for Recorder {
    fn on_batch_flushed(&self, batch: &Batch, round_id: u64) -> anyhow::Result<()> {
        self.batches.lock().push((round_id, batch.clone()));
        Ok(())
    }

    fn on_topology_snapshot(&self, topology: &Topology, round_id: u64) -> anyhow::Result<()> {
        self.snapshots.lock().push((round_id, topology.nodes().len()));
        Ok(())
    }
}

fn lossless(seed: u64) -> SimConfig {
    SimConfig {
        uplink_loss_probability: 0.0,
        seed: Some(seed),
        teardown: TeardownPolicy::Quiesce,
        teardown_timeout_secs: 600.0,
        ..SimConfig::default()
    }
}

#[tokio::test(start_paused = true)]
async fn lossless_round_flushes_floor_of_delivered_over_capacity() {
    let rec = Arc::new(Recorder::default());
    let scheduler = RoundScheduler::new(lossless(42), rec.clone());
    let report = scheduler.run_round(1).await.unwrap();

    assert!(report.quiescent);
    assert_eq!(report.generated, 5 * 30);
    assert_eq!(report.routing_drops, 0);
    assert_eq!(report.channel_losses, 0);
    assert_eq!(report.emergencies + report.normal_delivered, report.generated);
    assert_eq!(report.batches_flushed, report.normal_delivered / 10);
    assert_eq!(report.batches_collected, report.batches_flushed);
    assert_eq!(report.residual_buffer as u64, report.normal_delivered % 10);

    let batches = rec.batches.lock();
    assert_eq!(batches.len() as u64, report.batches_flushed);
    for (_, batch) in batches.iter() {
        assert_eq!(batch.len(), 10);
        assert!(batch.readings().iter().all(|r| !r.is_emergency() && r.value <= 80.0));
    }
    assert_eq!(*rec.snapshots.lock(), vec![(1, 6)]);
}

#[tokio::test(start_paused = true)]
async fn emergencies_never_land_in_a_batch() {
    let rec = Arc::new(Recorder::default());
    let cfg = SimConfig { sample_min: 81.0, sample_max: 120.0, ..lossless(7) };
    let report = RoundScheduler::new(cfg, rec.clone()).run_round(1).await.unwrap();

    assert_eq!(report.emergencies, report.generated);
    assert_eq!(report.normal_delivered, 0);
    assert_eq!(report.batches_flushed, 0);
    assert_eq!(report.residual_buffer, 0);
    assert!(rec.batches.lock().is_empty());
}

#[tokio::test(start_paused = true)]
async fn total_uplink_loss_delivers_nothing() {
    let rec = Arc::new(Recorder::default());
    let cfg = SimConfig { uplink_loss_probability: 1.0, ..lossless(3) };
    let report = RoundScheduler::new(cfg, rec.clone()).run_round(1).await.unwrap();

    assert_eq!(report.channel_losses, report.generated);
    assert_eq!(report.emergencies, 0);
    assert_eq!(report.normal_delivered, 0);
    assert!(rec.batches.lock().is_empty());
}

#[tokio::test(start_paused = true)]
async fn same_seed_generates_same_values() {
    async fn values(seed: u64) -> Vec<f64> {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let cfg = SimConfig { cycles_per_round: 6, ..lossless(seed) };
        RoundScheduler::new(cfg, Arc::new(Recorder::default())).with_event_subscriber(tx).run_round(1).await.unwrap();
        let mut out = Vec::new();
        while let Ok(ev) = rx.try_recv() {
            if let SimEvent::ReadingGenerated(r) = ev { out.push(r.value); }
        }
        out.sort_by(|a, b| a.partial_cmp(b).unwrap());
        out
    }
    let a = values(11).await;
    assert_eq!(a.len(), 30);
    assert_eq!(a, values(11).await);
}

#[tokio::test(start_paused = true)]
async fn run_many_sequences_isolated_rounds() {
    let rec = Arc::new(Recorder::default());
    let cfg = SimConfig { cycles_per_round: 10, sensor_count: 3, ..lossless(5) };
    let scheduler = RoundScheduler::new(cfg, rec.clone());

    let start = tokio::time::Instant::now();
    let reports = scheduler.run_many(3).await.unwrap();
    assert!(start.elapsed() >= Duration::from_secs(3 * 50 + 2 * 2));

    let ids: Vec<u64> = reports.iter().map(|r| r.round_id).collect();
    assert_eq!(ids, [1, 2, 3]);
    for r in &reports {
        assert_eq!(r.generated, 30);
        assert!(r.quiescent);
    }
    assert_eq!(*rec.snapshots.lock(), vec![(1, 4), (2, 4), (3, 4)]);
    // each round's batches carry ids bucketed from tick numbers 1..=10
    assert!(rec.batches.lock().iter().all(|(id, _)| (1..=2).contains(id)));
}

#[tokio::test(start_paused = true)]
async fn detach_leaves_uplink_work_in_flight() {
    let cfg = SimConfig {
        cycles_per_round: 2,
        uplink_latency_secs: 3600.0,
        teardown: TeardownPolicy::Detach,
        ..lossless(1)
    };
    let report = RoundScheduler::new(cfg, Arc::new(Recorder::default())).run_round(1).await.unwrap();
    assert!(!report.quiescent);
    assert_eq!(report.generated, 10);
    assert_eq!(report.normal_delivered + report.emergencies, 0);
}

#[tokio::test(start_paused = true)]
async fn grace_sleeps_the_timeout_then_reports_in_flight_work() {
    let cfg = SimConfig {
        cycles_per_round: 2,
        uplink_latency_secs: 3600.0,
        teardown: TeardownPolicy::Grace,
        teardown_timeout_secs: 10.0,
        ..lossless(2)
    };
    let start = tokio::time::Instant::now();
    let report = RoundScheduler::new(cfg, Arc::new(Recorder::default())).run_round(1).await.unwrap();
    assert!(start.elapsed() >= Duration::from_secs(2 * 5 + 10));
    assert!(!report.quiescent);
    assert_eq!(report.normal_delivered + report.emergencies, 0);

    let cfg = SimConfig { teardown: TeardownPolicy::Grace, teardown_timeout_secs: 60.0, cycles_per_round: 2, ..lossless(2) };
    let report = RoundScheduler::new(cfg, Arc::new(Recorder::default())).run_round(1).await.unwrap();
    assert!(report.quiescent);
    assert_eq!(report.emergencies + report.normal_delivered, report.generated);
    assert_eq!(report.batches_collected, report.batches_flushed);
}

#[tokio::test(start_paused = true)]
async fn run_many_with_unbounded_round_count_keeps_running() {
    let rec = Arc::new(Recorder::default());
    let cfg = SimConfig { cycles_per_round: 1, sensor_count: 1, ..lossless(4) };
    let scheduler = RoundScheduler::new(cfg, rec.clone());

    let res = tokio::time::timeout(Duration::from_secs(60), scheduler.run_many(u64::MAX)).await;
    assert!(res.is_err());
    assert!(rec.snapshots.lock().len() > 1);
}
