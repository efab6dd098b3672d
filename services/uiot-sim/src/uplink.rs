//! Long-haul sink → fog link: fixed latency, independent loss draw per send.

use std::sync::Arc;
use std::time::Duration;

use crate::events::{DropReason, EventBus, SimEvent};
use crate::fog::{FogAggregator, ProcessOutcome};
use crate::reading::{NodeId, Reading};
use crate::rng::SimRng;

pub struct UplinkChannel {
    latency: Duration,
    loss_probability: f64,
    rng: SimRng,
    fog: Arc<FogAggregator>,
    sink: NodeId,
    events: EventBus,
}

impl UplinkChannel {
    pub fn new(latency: Duration, loss_probability: f64, rng: SimRng, fog: Arc<FogAggregator>, sink: NodeId, events: EventBus) -> Self {
        Self { latency, loss_probability, rng, fog, sink, events }
    }

    pub fn fog(&self) -> &Arc<FogAggregator> { &self.fog }

    /// Suspends for the uplink latency, then either loses the reading or hands it to the fog tier.
    pub async fn send(&self, reading: Reading) -> Result<ProcessOutcome, DropReason> {
        tokio::time::sleep(self.latency).await;
        if self.rng.chance(self.loss_probability) {
            self.events.emit(SimEvent::Dropped { reading, at: self.sink.clone(), reason: DropReason::ChannelLoss });
            return Err(DropReason::ChannelLoss);
        }
        Ok(self.fog.process(reading))
    }
}
