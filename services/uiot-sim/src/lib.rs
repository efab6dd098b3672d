//! Layered IoT sensing network simulator.
//!
//! Pipeline per round:
//! - sensors sample and classify readings on a fixed interval
//! - readings relay hop by hop along the shortest path to the sink
//! - the sink pushes each reading onto a lossy, high-latency uplink
//! - the fog aggregator alerts on emergencies and batches the rest
//! - full batches go to the collector and on to the visualizer
//!
//! Every hop, uplink send and flush runs as its own task; nothing upstream waits.

pub mod agents;
pub mod collector;
pub mod events;
pub mod fog;
pub mod reading;
pub mod rng;
pub mod routing;
pub mod scheduler;
pub mod tasks;
pub mod topology;
pub mod uplink;
pub mod visualize;

pub use agents::{Mesh, RelayAgent, SensorAgent, SensorParams, SinkAgent};
pub use collector::CollectorSink;
pub use events::{DropReason, EventBus, RoundStats, SimEvent};
pub use fog::{FogAggregator, ProcessOutcome};
pub use reading::{Batch, Classification, NodeId, Reading};
pub use rng::SimRng;
pub use routing::{RoutingError, RoutingResolver};
pub use scheduler::{RoundReport, RoundScheduler};
pub use tasks::TaskGroup;
pub use topology::{Role, Topology, TopologyBuilder, TopologyError};
pub use uplink::UplinkChannel;
pub use visualize::{RollingHistory, Visualizer};
