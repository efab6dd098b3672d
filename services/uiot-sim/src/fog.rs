//! Fog tier: batches normal readings, alerts on emergencies immediately.
//!
//! Append-and-maybe-flush runs under one lock, so the buffer never holds
//! `capacity` readings once `process` returns and two concurrent deliveries at
//! `capacity - 1` cannot both flush or lose an append.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::collector::CollectorSink;
use crate::events::{EventBus, SimEvent};
use crate::reading::{Batch, Reading};
use crate::tasks::TaskGroup;

/// Width, in ticks, of the time bucket a flushed batch is labelled with.
pub const BATCH_BUCKET_TICKS: u64 = 10;

pub fn batch_id_for(timestamp: u64) -> u64 { timestamp / BATCH_BUCKET_TICKS + 1 }

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessOutcome {
    Alerted,
    Buffered { len: usize },
    Flushed { batch_id: u64, len: usize },
}

pub struct FogAggregator {
    capacity: usize,
    buffer: Mutex<Vec<Reading>>,
    collector: Arc<CollectorSink>,
    tasks: TaskGroup,
    events: EventBus,
}

impl FogAggregator {
    pub fn new(capacity: usize, collector: Arc<CollectorSink>, tasks: TaskGroup, events: EventBus) -> Self {
        let capacity = capacity.max(1);
        Self { capacity, buffer: Mutex::new(Vec::with_capacity(capacity)), collector, tasks, events }
    }

    pub fn capacity(&self) -> usize { self.capacity }

    pub fn buffer_len(&self) -> usize { self.buffer.lock().len() }

    /// Alert on an emergency, otherwise buffer and flush at capacity.
    ///
    /// The flush hands the batch to the collector as a task on the current
    /// runtime. Called outside a runtime, the batch is still cut and reported
    /// but never collected.
    pub fn process(&self, reading: Reading) -> ProcessOutcome {
        if reading.is_emergency() {
            self.events.emit(SimEvent::EmergencyAlert(reading));
            return ProcessOutcome::Alerted;
        }

        let batch_id = batch_id_for(reading.timestamp);
        let (len, full) = {
            let mut buffer = self.buffer.lock();
            buffer.push(reading.clone());
            let len = buffer.len();
            let full = if len >= self.capacity { Some(std::mem::replace(&mut *buffer, Vec::with_capacity(self.capacity))) } else { None };
            (len, full)
        };
        self.events.emit(SimEvent::Buffered { reading, buffer_len: len });

        let Some(readings) = full else { return ProcessOutcome::Buffered { len } };
        let batch = Batch::new(readings);
        self.events.emit(SimEvent::BatchFlushed { batch_id, len: batch.len() });
        let collector = self.collector.clone();
        self.tasks.spawn(async move { collector.receive_batch(batch, batch_id).await });
        ProcessOutcome::Flushed { batch_id, len }
    }
}
