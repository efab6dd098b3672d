//! Observability events. Every event is logged, counted in [`RoundStats`], and
//! optionally forwarded to a subscriber channel.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, info, trace, warn};

use crate::reading::{NodeId, Reading};
use crate::routing::RoutingError;

/// Why a reading left the pipeline without reaching a batch.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DropReason {
    #[error("routing failure: {0}")]
    Routing(#[from] RoutingError),
    #[error("uplink channel loss")]
    ChannelLoss,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SimEvent {
    ReadingGenerated(Reading),
    Relayed { reading: Reading, from: NodeId, to: NodeId },
    ReachedSink { reading: Reading, from: NodeId },
    Dropped { reading: Reading, at: NodeId, reason: DropReason },
    EmergencyAlert(Reading),
    /// Readings appended to the fog buffer (emergencies never are).
    Buffered { reading: Reading, buffer_len: usize },
    BatchFlushed { batch_id: u64, len: usize },
    BatchCollected { batch_id: u64, len: usize },
}

#[derive(Debug, Default)]
pub struct RoundStats {
    pub generated: AtomicU64,
    pub relayed_hops: AtomicU64,
    pub reached_sink: AtomicU64,
    pub routing_drops: AtomicU64,
    pub channel_losses: AtomicU64,
    pub emergencies: AtomicU64,
    pub normal_delivered: AtomicU64,
    pub batches_flushed: AtomicU64,
    pub batches_collected: AtomicU64,
}

impl RoundStats {
    fn bump(counter: &AtomicU64) { counter.fetch_add(1, Ordering::Relaxed); }

    pub fn get(counter: &AtomicU64) -> u64 { counter.load(Ordering::Relaxed) }
}

#[derive(Clone)]
pub struct EventBus {
    round_id: u64,
    stats: Arc<RoundStats>,
    tx: Option<mpsc::UnboundedSender<SimEvent>>,
}

impl EventBus {
    pub fn new(round_id: u64) -> Self {
        Self { round_id, stats: Arc::new(RoundStats::default()), tx: None }
    }

    /// Bus plus a receiver that sees every event emitted on it.
    pub fn channel(round_id: u64) -> (Self, mpsc::UnboundedReceiver<SimEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx: Some(tx), ..Self::new(round_id) }, rx)
    }

    pub fn with_subscriber(mut self, tx: mpsc::UnboundedSender<SimEvent>) -> Self {
        self.tx = Some(tx);
        self
    }

    pub fn round_id(&self) -> u64 { self.round_id }

    pub fn stats(&self) -> &Arc<RoundStats> { &self.stats }

    pub fn emit(&self, event: SimEvent) {
        let round_id = self.round_id;
        let s = &self.stats;
        match &event {
            SimEvent::ReadingGenerated(r) => {
                RoundStats::bump(&s.generated);
                info!(round_id, node = %r.source, tick = r.timestamp, value = r.value, class = ?r.classification, "reading_generated");
            }
            SimEvent::Relayed { from, to, reading } => {
                RoundStats::bump(&s.relayed_hops);
                trace!(round_id, %from, %to, source = %reading.source, "relayed");
            }
            SimEvent::ReachedSink { from, reading } => {
                RoundStats::bump(&s.reached_sink);
                debug!(round_id, %from, source = %reading.source, "sink_forwarding_to_uplink");
            }
            SimEvent::Dropped { reading, at, reason } => {
                match reason {
                    DropReason::Routing(_) => {
                        RoundStats::bump(&s.routing_drops);
                        debug!(round_id, %at, source = %reading.source, %reason, "reading_dropped");
                    }
                    DropReason::ChannelLoss => {
                        RoundStats::bump(&s.channel_losses);
                        info!(round_id, %at, source = %reading.source, tick = reading.timestamp, "packet_lost");
                    }
                }
            }
            SimEvent::EmergencyAlert(r) => {
                RoundStats::bump(&s.emergencies);
                warn!(round_id, source = %r.source, value = r.value, tick = r.timestamp, "emergency_alert");
            }
            SimEvent::Buffered { buffer_len, .. } => {
                RoundStats::bump(&s.normal_delivered);
                trace!(round_id, buffer_len, "buffered");
            }
            SimEvent::BatchFlushed { batch_id, len } => {
                RoundStats::bump(&s.batches_flushed);
                info!(round_id, batch_id, len, "batch_flushed");
            }
            SimEvent::BatchCollected { batch_id, len } => {
                RoundStats::bump(&s.batches_collected);
                info!(round_id, batch_id, len, "batch_collected");
            }
        }
        if let Some(tx) = &self.tx {
            // receiver may be gone; events are best-effort
            let _ = tx.send(event);
        }
    }
}
