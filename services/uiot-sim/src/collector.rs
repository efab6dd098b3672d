use std::sync::Arc;
use std::time::Duration;

use tracing::warn;

use crate::events::{EventBus, SimEvent};
use crate::reading::Batch;
use crate::visualize::Visualizer;

/// Terminal consumer of flushed batches. Every call is an independent delivery.
pub struct CollectorSink {
    latency: Duration,
    visualizer: Arc<dyn Visualizer>,
    events: EventBus,
}

impl CollectorSink {
    pub fn new(latency: Duration, visualizer: Arc<dyn Visualizer>, events: EventBus) -> Self {
        Self { latency, visualizer, events }
    }

    pub async fn receive_batch(&self, batch: Batch, round_id: u64) {
        tokio::time::sleep(self.latency).await;
        let len = batch.len();
        if let Err(e) = self.visualizer.on_batch_flushed(&batch, round_id) {
            warn!(error = ?e, round_id, "visualizer_batch_failed");
        }
        self.events.emit(SimEvent::BatchCollected { batch_id: round_id, len });
    }
}
